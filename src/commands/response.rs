use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, StoreResult};

/// Uniform command envelope. Check `success` before reading `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn failure(message: impl Into<String>, kind: Option<ErrorKind>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_kind: kind,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn from_result(result: StoreResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                log::warn!("Command failed ({:?}): {}", e.kind(), e);
                Self::failure(e.to_string(), Some(e.kind()))
            }
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self.error.unwrap_or_else(|| "missing response data".to_string())),
        }
    }
}
