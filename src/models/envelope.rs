//! Uniform result envelope returned by every dispatched operation.
//!
//! Serialized shape:
//! - `{"status": "success", "data": <operation-specific payload>}`
//! - `{"status": "error", "detail": <message>}`
//!
//! Both constructors are total; a payload that fails to serialize degrades to
//! an error envelope instead of panicking or escaping.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Success { data: Value },
    Error { detail: String },
}

impl Envelope {
    pub fn success<T: Serialize>(data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Envelope::Success { data },
            Err(e) => Envelope::Error {
                detail: format!("failed to serialize payload: {}", e),
            },
        }
    }

    pub fn error(detail: impl std::fmt::Display) -> Self {
        Envelope::Error {
            detail: detail.to_string(),
        }
    }

    pub fn from_result<T: Serialize>(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::error(e),
        }
    }
}
