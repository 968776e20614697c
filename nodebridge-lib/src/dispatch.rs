//! HTTP dispatch shared by the REST dialects.
//!
//! Every backend method is a `POST {base}/{method}`. The dialect chooses how
//! the payload is encoded and how the request is authenticated; the response
//! is either the declared success shape or a structured error payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::{NodeBridgeError, Result};

/// How requests authenticate against the backend.
#[derive(Clone, Debug)]
pub enum Auth {
    /// HTTP basic auth with an empty user name.
    Password(String),
    /// `Authorization: Bearer <token>`.
    Bearer(String),
}

/// How request payloads are encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyEncoding {
    /// `application/x-www-form-urlencoded`
    Form,
    /// `application/json`
    Json,
}

/// Error payload returned with a non-success status.
#[derive(Deserialize)]
struct ErrorPayload {
    error: String,
}

/// Issues single logical requests to one backend.
///
/// Holds no per-call state; share it freely across concurrent calls.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    client: reqwest::Client,
    base_url: String,
    auth: Auth,
    encoding: BodyEncoding,
    retry: RetryPolicy,
}

impl Dispatcher {
    /// Create a dispatcher for the backend at `base_url`.
    pub fn new(
        base_url: &str,
        auth: Auth,
        encoding: BodyEncoding,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        if base_url.is_empty() {
            return Err(NodeBridgeError::invalid_config("url", "URL cannot be empty"));
        }
        reqwest::Url::parse(base_url)
            .map_err(|e| NodeBridgeError::invalid_config("url", e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeBridgeError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            encoding,
            retry,
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL for a backend method.
    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Call `method` without a payload.
    pub async fn call_empty<Resp: DeserializeOwned>(&self, method: &str) -> Result<Resp> {
        self.call::<(), Resp>(method, None).await
    }

    /// Call `method`, retrying transport failures, and decode the response.
    pub async fn call<Req, Resp>(&self, method: &str, payload: Option<&Req>) -> Result<Resp>
    where
        Req: Serialize + Sync + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self
            .retry
            .run(method, move || self.send(method, payload))
            .await?;
        Self::decode(method, response).await
    }

    async fn send<Req>(&self, method: &str, payload: Option<&Req>) -> Result<reqwest::Response>
    where
        Req: Serialize + Sync + ?Sized,
    {
        let mut request = self.client.post(self.url(method));

        request = match &self.auth {
            Auth::Password(password) => request.basic_auth("", Some(password)),
            Auth::Bearer(token) => request.bearer_auth(token),
        };

        request = match (payload, self.encoding) {
            (Some(body), BodyEncoding::Form) => request.form(body),
            (Some(body), BodyEncoding::Json) => request.json(body),
            (None, _) => request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(""),
        };

        request
            .send()
            .await
            .map_err(|e| NodeBridgeError::Transport(format!("{} request failed: {}", method, e)))
    }

    async fn decode<Resp: DeserializeOwned>(method: &str, response: reqwest::Response) -> Result<Resp> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NodeBridgeError::Transport(format!("{} response unreadable: {}", method, e)))?;

        if !status.is_success() {
            return Err(backend_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| NodeBridgeError::decode(method, e))
    }
}

/// Turn a non-success response into a backend error, keeping the backend's text.
fn backend_error(status: reqwest::StatusCode, body: &str) -> NodeBridgeError {
    let message = match serde_json::from_str::<ErrorPayload>(body) {
        Ok(payload) => payload.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    NodeBridgeError::Backend {
        status: status.as_u16(),
        message,
    }
}
