/// Data models for image-service
///
/// This module defines structures for:
/// - UploadAction: mode selected in the upload form
/// - RestoreRequest / RestoreResponse: restore invocation wire payloads
use serde::{Deserialize, Serialize};

/// Action selected in the upload form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadAction {
    Resize,
    Restore,
}

impl UploadAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Restore => "restore",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "resize" => Some(Self::Resize),
            "restore" => Some(Self::Restore),
            _ => None,
        }
    }
}

/// Request payload of the restore invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreRequest {
    pub file_name: String,
}

/// Response payload of the restore invocation
///
/// Carries either the transport-encoded original bytes (status 200) or a
/// human-readable failure message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_bytes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RestoreResponse {
    pub fn ok(image_bytes: String) -> Self {
        Self {
            status_code: 200,
            image_bytes: Some(image_bytes),
            message: None,
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            image_bytes: None,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }
}
