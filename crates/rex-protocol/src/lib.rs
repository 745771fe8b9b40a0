//! Wire types shared by the rex host and client.
//!
//! One call travels as one request stream. The call itself is carried in the
//! `payload` header as JSON `{"method": ..., "args": [...]}`; the body of the
//! request is unused. The reply is a status code plus a JSON body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header that carries the JSON-encoded [`Request`].
pub const PAYLOAD_HEADER: &str = "payload";

/// Path every call is issued against.
pub const CALL_PATH: &str = "/";

pub const DEFAULT_PORT: u16 = 8080;

pub const CONTENT_TYPE_JSON: &str = "application/json";

pub const STATUS_OK: u16 = 200;
pub const STATUS_FAILED: u16 = 500;

/// Body sent with every protocol-level failure.
pub const FAILURE_BODY: &[u8] = b"false";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Request {
    pub fn new(method: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    pub fn to_header_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn from_header_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(bytes).map_err(ProtocolError::Decode)
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("decode request payload: {0}")]
    Decode(serde_json::Error),
    #[error("encode json: {0}")]
    Encode(serde_json::Error),
    #[error("result is not representable as json: {0}")]
    NotRepresentable(String),
}

/// Status and body of one reply.
///
/// Success carries the encoded handler result (empty when the handler produced
/// no value). Failure is always `500` with body `false`, whatever went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Envelope {
    pub fn success(body: Vec<u8>) -> Self {
        Self {
            status: STATUS_OK,
            body,
        }
    }

    pub fn failure() -> Self {
        Self {
            status: STATUS_FAILED,
            body: FAILURE_BODY.to_vec(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Encode a handler result as a reply body. `None` encodes to an empty body.
pub fn encode_result(result: Option<&serde_json::Value>) -> Result<Vec<u8>, ProtocolError> {
    match result {
        Some(value) => serde_json::to_vec(value).map_err(ProtocolError::Encode),
        None => Ok(Vec::new()),
    }
}

/// Convert a float into a JSON number, preferring the integer form when the
/// value is integral (`5` rather than `5.0`).
pub fn number_value(n: f64) -> Result<serde_json::Value, ProtocolError> {
    if !n.is_finite() {
        return Err(ProtocolError::NotRepresentable(n.to_string()));
    }
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Ok(serde_json::Value::from(n as i64));
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .ok_or_else(|| ProtocolError::NotRepresentable(n.to_string()))
}
