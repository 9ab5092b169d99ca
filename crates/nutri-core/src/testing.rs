//! Test doubles for the host capabilities.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::Barrier;

use crate::api::transport::{HttpRequest, HttpResponse, Transport};
use crate::api::ApiError;
use crate::navigation::Navigator;
use crate::session::Notifier;

/// Navigator that records navigations. By default the current path stays
/// put, like a browser that has not finished leaving the page yet.
pub struct RecordingNavigator {
    path: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    follow: bool,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Self {
        Self {
            path: Mutex::new(path.to_string()),
            navigations: Mutex::new(Vec::new()),
            follow: false,
        }
    }

    /// A navigator whose current path changes as soon as it navigates.
    pub fn following(path: &str) -> Self {
        Self {
            follow: true,
            ..Self::at(path)
        }
    }

    /// Move to `path` as if the host loaded another page.
    pub fn visit(&self, path: &str) {
        *self.path.lock().unwrap() = path.to_string();
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn navigation_count(&self) -> usize {
        self.navigations.lock().unwrap().len()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap().clone()
    }

    fn navigate(&self, target: &str) {
        self.navigations.lock().unwrap().push(target.to_string());
        if self.follow {
            *self.path.lock().unwrap() = target.to_string();
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

enum Scripted {
    Response(HttpResponse),
    TransportError(String),
}

/// Transport answering from a queue of scripted responses and recording
/// every request it was given.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
    gate: Mutex<Option<std::sync::Arc<Barrier>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_raw(&self, status: u16, content_type: Option<&str>, body: Vec<u8>) {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(ct).unwrap());
        }
        let response = HttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body,
        };
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Response(response));
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_raw(status, Some("application/json"), body.to_string().into_bytes());
    }

    pub fn push_text(&self, status: u16, body: &str) {
        self.push_raw(status, Some("text/plain"), body.as_bytes().to_vec());
    }

    pub fn push_transport_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::TransportError(message.to_string()));
    }

    /// Hold every request until `n` of them are in flight at once.
    pub fn hold_until_in_flight(&self, n: usize) {
        *self.gate.lock().unwrap() = Some(std::sync::Arc::new(Barrier::new(n)));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::TransportError(message)) => Err(ApiError::Transport(message)),
            None => Err(ApiError::Transport("no scripted response".to_string())),
        }
    }
}
