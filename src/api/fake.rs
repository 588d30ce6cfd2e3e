//! Scripted in-process transport for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::{LedgerError, Result};

#[derive(Clone)]
enum Outcome {
    Reply(u16, Vec<u8>),
    Fail(String),
    Hang,
}

#[derive(Default)]
pub struct FakeTransport {
    script: Mutex<HashMap<(Method, String), VecDeque<Outcome>>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, outcome: Outcome) {
        self.script
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(outcome);
    }

    /// Queue a JSON reply. The last queued reply for a route repeats.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Outcome::Reply(status, body.to_string().into_bytes()));
    }

    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: &[u8]) {
        self.push(method, path, Outcome::Reply(status, body.to_vec()));
    }

    pub fn fail(&self, method: Method, path: &str, reason: &str) {
        self.push(method, path, Outcome::Fail(reason.to_string()));
    }

    pub fn hang(&self, method: Method, path: &str) {
        self.push(method, path, Outcome::Hang);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let key = (request.method, request.path.clone());
        self.sent.lock().unwrap().push(request);
        let outcome = {
            let mut script = self.script.lock().unwrap();
            match script.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        match outcome {
            Some(Outcome::Reply(status, body)) => Ok(ApiResponse { status, body }),
            Some(Outcome::Fail(reason)) => Err(LedgerError::Network(reason)),
            Some(Outcome::Hang) => std::future::pending().await,
            None => Ok(ApiResponse {
                status: 404,
                body: Vec::new(),
            }),
        }
    }
}
