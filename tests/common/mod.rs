//! Scripted transport double shared by the integration suites.

use alx_incident_harvester::fetch::{HttpResponse, Transport};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecordedGet {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub url: String,
    pub form: Vec<(String, String)>,
    pub basic_auth: (String, String),
}

/// Replays queued responses in order and records every call. An exhausted
/// queue answers with an error, which the fetcher treats as transient.
#[derive(Default)]
pub struct ScriptedTransport {
    gets: Mutex<VecDeque<Result<HttpResponse>>>,
    posts: Mutex<VecDeque<Result<HttpResponse>>>,
    get_calls: Mutex<Vec<RecordedGet>>,
    post_calls: Mutex<Vec<RecordedPost>>,
}

#[allow(dead_code)] // each suite uses the subset it needs
impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_get(&self, status: u16, body: &str) {
        self.gets.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn push_get_err(&self, msg: &str) {
        self.gets
            .lock()
            .unwrap()
            .push_back(Err(anyhow::anyhow!(msg.to_string())));
    }

    pub fn push_post(&self, status: u16, body: &str) {
        self.posts.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn push_post_err(&self, msg: &str) {
        self.posts
            .lock()
            .unwrap()
            .push_back(Err(anyhow::anyhow!(msg.to_string())));
    }

    pub fn get_calls(&self) -> Vec<RecordedGet> {
        self.get_calls.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.get_calls.lock().unwrap().len()
    }

    pub fn post_calls(&self) -> Vec<RecordedPost> {
        self.post_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(String, String)],
        _timeout: Duration,
    ) -> Result<HttpResponse> {
        self.get_calls.lock().unwrap().push(RecordedGet {
            url: url.to_string(),
            query: query.to_vec(),
            headers: headers.to_vec(),
        });
        self.gets
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted GET response left")))
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        basic_auth: (&str, &str),
        _headers: &[(String, String)],
        _timeout: Duration,
    ) -> Result<HttpResponse> {
        self.post_calls.lock().unwrap().push(RecordedPost {
            url: url.to_string(),
            form: form.to_vec(),
            basic_auth: (basic_auth.0.to_string(), basic_auth.1.to_string()),
        });
        self.posts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted POST response left")))
    }
}
