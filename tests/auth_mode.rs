//! Authenticated/unauthenticated mode selection and token lifecycle.

mod common;

use alx_incident_harvester::auth::{AuthProvider, Credentials};
use common::ScriptedTransport;
use std::sync::Arc;

fn creds() -> Option<Credentials> {
    Some(Credentials {
        client_id: "cid".into(),
        client_secret: "shh".into(),
    })
}

fn bearer(headers: &[(String, String)]) -> Option<String> {
    headers
        .iter()
        .find(|(k, _)| k == "Authorization")
        .map(|(_, v)| v.clone())
}

#[tokio::test]
async fn without_credentials_only_the_user_agent_is_sent() {
    let t = Arc::new(ScriptedTransport::new());
    let auth = AuthProvider::new(None, "alexandria-eas/1.3", t.clone());

    assert_eq!(auth.base_url(), "https://www.reddit.com");
    let headers = auth.headers().await;
    assert_eq!(
        headers,
        vec![("User-Agent".to_string(), "alexandria-eas/1.3".to_string())]
    );
    assert!(t.post_calls().is_empty());
}

#[tokio::test]
async fn credentials_select_the_oauth_host_and_fetch_a_token_once() {
    let t = Arc::new(ScriptedTransport::new());
    t.push_post(200, r#"{"access_token":"tok-1","expires_in":3600}"#);
    let auth = AuthProvider::new(creds(), "alexandria-eas/1.3", t.clone());

    assert_eq!(auth.base_url(), "https://oauth.reddit.com");
    let first = auth.headers().await;
    assert_eq!(bearer(&first).as_deref(), Some("Bearer tok-1"));

    // Second call reuses the cached token; no further exchange.
    let second = auth.headers().await;
    assert_eq!(bearer(&second).as_deref(), Some("Bearer tok-1"));

    let posts = t.post_calls();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].url, "https://www.reddit.com/api/v1/access_token");
    assert_eq!(posts[0].basic_auth, ("cid".to_string(), "shh".to_string()));
    assert!(posts[0]
        .form
        .iter()
        .any(|(k, v)| k == "grant_type" && v == "client_credentials"));
}

#[tokio::test]
async fn an_expired_token_triggers_a_fresh_exchange() {
    let t = Arc::new(ScriptedTransport::new());
    // expires_in 0 puts the token inside the 30s refresh slack immediately.
    t.push_post(200, r#"{"access_token":"tok-1","expires_in":0}"#);
    t.push_post(200, r#"{"access_token":"tok-2","expires_in":3600}"#);
    let auth = AuthProvider::new(creds(), "alexandria-eas/1.3", t.clone());

    assert_eq!(bearer(&auth.headers().await).as_deref(), Some("Bearer tok-1"));
    assert_eq!(bearer(&auth.headers().await).as_deref(), Some("Bearer tok-2"));
    assert_eq!(t.post_calls().len(), 2);
}

#[tokio::test]
async fn failed_exchange_downgrades_without_changing_the_host() {
    let t = Arc::new(ScriptedTransport::new());
    t.push_post(500, "nope");
    let auth = AuthProvider::new(creds(), "alexandria-eas/1.3", t.clone());

    let headers = auth.headers().await;
    assert!(bearer(&headers).is_none());
    assert!(headers.iter().any(|(k, _)| k == "User-Agent"));
    // Endpoint choice is a pure function of credential presence.
    assert_eq!(auth.base_url(), "https://oauth.reddit.com");
}

#[tokio::test]
async fn a_later_successful_exchange_restores_bearer_auth() {
    let t = Arc::new(ScriptedTransport::new());
    t.push_post_err("dns failure");
    t.push_post(200, r#"{"access_token":"tok-9","expires_in":3600}"#);
    let auth = AuthProvider::new(creds(), "alexandria-eas/1.3", t.clone());

    assert!(bearer(&auth.headers().await).is_none());
    assert_eq!(bearer(&auth.headers().await).as_deref(), Some("Bearer tok-9"));
}

#[tokio::test]
async fn malformed_token_payload_downgrades() {
    let t = Arc::new(ScriptedTransport::new());
    t.push_post(200, "not json at all");
    let auth = AuthProvider::new(creds(), "alexandria-eas/1.3", t.clone());

    assert!(bearer(&auth.headers().await).is_none());
}
