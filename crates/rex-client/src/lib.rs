//! Client side of the rex call protocol.
//!
//! Each call opens its own HTTP/2 connection, sends one request with the call
//! in the `payload` header, reads the streamed body to the end and drops the
//! connection. There is no pooling and no retry.

use futures_util::StreamExt;
use reqwest::header::HeaderValue;
use rex_protocol::{CALL_PATH, DEFAULT_PORT, PAYLOAD_HEADER, ProtocolError, Request, STATUS_OK};
use thiserror::Error;

pub fn default_url() -> String {
    format!("http://127.0.0.1:{DEFAULT_PORT}")
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("payload is not a valid header value: {0}")]
    InvalidHeader(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("reply is not json: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Status and raw body text of one call.
///
/// A protocol failure arrives as status 500 with body `false`; it is still a
/// completed exchange, not a [`ClientError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Parse the body as JSON. An empty body (a command with no value) is
    /// `None`.
    pub fn json(&self) -> Result<Option<serde_json::Value>, ClientError> {
        if self.body.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&self.body)
            .map(Some)
            .map_err(ClientError::Decode)
    }
}

#[derive(Debug, Clone)]
pub struct CommandClient {
    base_url: String,
}

impl Default for CommandClient {
    fn default() -> Self {
        Self::new(default_url())
    }
}

impl CommandClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn call(&self, method: &str, args: &[String]) -> Result<Reply, ClientError> {
        self.send(&Request::new(method, args.to_vec())).await
    }

    pub async fn send(&self, request: &Request) -> Result<Reply, ClientError> {
        let payload = request.to_header_json()?;
        // Raw bytes so non-ASCII arguments pass through unchanged.
        let header = HeaderValue::from_bytes(payload.as_bytes())
            .map_err(|e| ClientError::InvalidHeader(e.to_string()))?;

        // A client per call: its connection closes when it is dropped below.
        let http = reqwest::Client::builder()
            .http2_prior_knowledge()
            .pool_max_idle_per_host(0)
            .build()?;
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), CALL_PATH);
        tracing::debug!(method = %request.method, %url, "call");

        let response = http.get(&url).header(PAYLOAD_HEADER, header).send().await?;
        let status = response.status().as_u16();
        let mut stream = response.bytes_stream();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }
        drop(http);

        Ok(Reply {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_json_handles_empty_body() {
        let reply = Reply {
            status: 200,
            body: String::new(),
        };
        assert!(reply.is_success());
        assert_eq!(reply.json().unwrap(), None);
    }

    #[test]
    fn reply_json_parses_values() {
        let reply = Reply {
            status: 500,
            body: "false".into(),
        };
        assert!(!reply.is_success());
        assert_eq!(reply.json().unwrap(), Some(json!(false)));
        let bad = Reply {
            status: 200,
            body: "{".into(),
        };
        assert!(matches!(bad.json(), Err(ClientError::Decode(_))));
    }

    #[test]
    fn default_url_targets_loopback() {
        assert_eq!(CommandClient::default().base_url(), "http://127.0.0.1:8080");
    }
}
