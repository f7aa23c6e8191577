use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// HTTP verbs the API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request as the session layer sees it: path relative to the server
/// root, optional bearer credential, optional JSON body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            bearer: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post<T: Serialize>(path: impl Into<String>, body: &T) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            bearer: None,
            headers: Vec::new(),
            body: Some(serde_json::to_value(body).unwrap_or(Value::Null)),
        }
    }

    pub fn with_bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Response status plus the parsed JSON body (`Null` when the body was
/// empty or not JSON).
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error` field of an API error body, if the server sent one.
    pub fn error_message(&self) -> Option<String> {
        self.body
            .get("error")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone()).context("Failed to parse response body")
    }
}

/// The seam between the session layer and the network.
///
/// `Err` means the server could not be reached or the response could not
/// be read; HTTP error statuses come back as `Ok` with the status set, so
/// the session layer can distinguish a 401 from a dead server.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed transport used outside of tests.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Arc<str>,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status().as_u16();
        // Error bodies are read fail-soft; an unreadable body is not worth
        // masking the status we already have.
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::get("/api/theme/").with_bearer("tok");
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.bearer.as_deref(), Some("tok"));
        assert!(request.body.is_none());

        let request = ApiRequest::post("/api/login/", &serde_json::json!({"a": 1}))
            .with_header("X-CSRFToken", "csrf");
        assert_eq!(request.headers, vec![("X-CSRFToken".into(), "csrf".into())]);
        assert_eq!(request.body, Some(serde_json::json!({"a": 1})));
    }

    #[test]
    fn test_response_helpers() {
        let response = ApiResponse {
            status: 401,
            body: serde_json::json!({"error": "expired"}),
        };
        assert!(!response.is_success());
        assert_eq!(response.error_message().as_deref(), Some("expired"));

        let empty = ApiResponse {
            status: 204,
            body: Value::Null,
        };
        assert!(empty.is_success());
        assert!(empty.error_message().is_none());
    }
}
