use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use modpanel_shared::clients::ModerationApi;
use modpanel_shared::errors::{AppError, AppResult};

use crate::notify::Notifier;

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

impl Call {
    pub fn new(method: &str, path: &str, body: Option<Value>) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            body,
        }
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Status(u16),
}

/// In-memory backend that records every call.
///
/// Unconfigured GETs answer 404, unconfigured writes answer `null`. Each call
/// yields once before answering so that joined futures interleave.
#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<HashMap<(String, String), Reply>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, method: &str, path: &str, body: Value) -> Self {
        self.respond(method, path, body);
        self
    }

    /// Replaces the answer for a route on an api already in use.
    pub fn respond(&self, method: &str, path: &str, body: Value) {
        self.set(method, path, Reply::Json(body));
    }

    pub fn fail(&self, method: &str, path: &str, status: u16) {
        self.set(method, path, Reply::Status(status));
    }

    fn set(&self, method: &str, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    async fn handle(&self, method: &str, path: &str, body: Option<&Value>) -> AppResult<Value> {
        self.calls.lock().unwrap().push(Call::new(method, path, body.cloned()));
        tokio::task::yield_now().await;

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned();

        match reply {
            Some(Reply::Json(value)) => Ok(value),
            Some(Reply::Status(status)) => Err(AppError::from_response(status, "")),
            None if method == "GET" => Err(AppError::from_response(404, "")),
            None => Ok(Value::Null),
        }
    }
}

#[async_trait]
impl ModerationApi for FakeApi {
    async fn get(&self, path: &str) -> AppResult<Value> {
        self.handle("GET", path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> AppResult<Value> {
        self.handle("POST", path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> AppResult<Value> {
        self.handle("PUT", path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> AppResult<Value> {
        self.handle("DELETE", path, None).await
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    errors: Mutex<Vec<String>>,
    successes: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show_error(&self, error: &AppError) {
        self.errors.lock().unwrap().push(error.to_string());
    }

    fn show_success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }
}
