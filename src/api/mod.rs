//! HTTP+JSON boundary to the bookkeeping service.
//!
//! [`Transport`] owns the wire; [`ApiClient`] owns the conventions layered on
//! top of it: the bare `Authorization: <token>` header, JSON bodies, and the
//! mapping of non-success statuses into [`LedgerError::Status`].

pub mod resource;
pub mod scope;
#[cfg(test)]
pub mod fake;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub token: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Reqwest-backed transport against one API origin.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        }
        .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &request.token {
            builder = builder.header(AUTHORIZATION, token.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(ApiResponse { status, body })
    }
}

/// Pull a human-readable message out of an error body, if the server sent one.
pub fn server_error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    for key in ["error", "non_field_errors", "detail"] {
        match value.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Array(items)) => {
                if let Some(Value::String(s)) = items.first() {
                    return Some(s.clone());
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token: None,
        }
    }

    pub fn with_token(&self, token: &str) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            token: Some(token.to_string()),
        }
    }

    /// Send a request and hand back whatever status the server answered with.
    pub async fn call_unchecked(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        tracing::debug!(method = method.as_str(), path, "request");
        let request = ApiRequest {
            method,
            path: path.to_string(),
            token: self.token.clone(),
            body,
        };
        self.transport.send(request).await.map_err(|e| {
            tracing::warn!(method = method.as_str(), path, error = %e, "transport failure");
            e
        })
    }

    /// Send a request; non-success statuses become `Status` errors carrying
    /// the server's message or `fallback`.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        fallback: &str,
    ) -> Result<ApiResponse> {
        let response = self.call_unchecked(method, path, body).await?;
        if !response.is_success() {
            tracing::warn!(method = method.as_str(), path, status = response.status, "request failed");
            let message =
                server_error_message(&response.body).unwrap_or_else(|| fallback.to_string());
            return Err(LedgerError::Status {
                status: response.status,
                message,
            });
        }
        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T> {
        self.call(Method::Get, path, None, fallback).await?.json()
    }

    pub async fn send_unit(
        &self,
        method: Method,
        path: &str,
        body: Value,
        fallback: &str,
    ) -> Result<()> {
        self.call(method, path, Some(body), fallback).await.map(|_| ())
    }

    pub async fn get_bytes(&self, path: &str, fallback: &str) -> Result<Vec<u8>> {
        Ok(self.call(Method::Get, path, None, fallback).await?.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeTransport;
    use serde_json::json;

    #[test]
    fn test_server_error_message_fields() {
        assert_eq!(
            server_error_message(br#"{"error":"bad group"}"#).as_deref(),
            Some("bad group")
        );
        assert_eq!(
            server_error_message(br#"{"non_field_errors":["taken","other"]}"#).as_deref(),
            Some("taken")
        );
        assert_eq!(
            server_error_message(br#"{"detail":"nope"}"#).as_deref(),
            Some("nope")
        );
        assert!(server_error_message(b"<html>oops</html>").is_none());
        assert!(server_error_message(br#"{"error":""}"#).is_none());
    }

    #[tokio::test]
    async fn test_call_attaches_bare_token() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(Method::Get, "/api/usr/get/", 200, json!([]));
        let client = ApiClient::new(fake.clone()).with_token("Token xyz");
        let _: Vec<Value> = client.get_json("/api/usr/get/", "failed").await.unwrap();
        let sent = fake.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].token.as_deref(), Some("Token xyz"));
    }

    #[tokio::test]
    async fn test_non_success_uses_server_message_or_fallback() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(Method::Post, "/a", 400, json!({"error": "duplicate"}));
        fake.respond(Method::Post, "/b", 500, json!({}));
        let client = ApiClient::new(fake);

        let err = client.send_unit(Method::Post, "/a", json!({}), "generic").await.unwrap_err();
        assert!(matches!(err, LedgerError::Status { status: 400, ref message } if message == "duplicate"));

        let err = client.send_unit(Method::Post, "/b", json!({}), "generic").await.unwrap_err();
        assert!(matches!(err, LedgerError::Status { status: 500, ref message } if message == "generic"));
    }
}
