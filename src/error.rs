use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::processing::Stage;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Uploaded file is empty")]
    EmptyInput,

    #[error("Failed to read image. The file may be corrupted or in an unsupported format: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid file type '{0}'. Please upload JPG or PNG.")]
    UnsupportedFormat(String),

    #[error("File is too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("File is too large (max {max} bytes)")]
    RequestTooLarge { max: usize },

    #[error("Stage '{stage}' failed: {reason}")]
    StageFailure { stage: Stage, reason: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode '{name}': {reason}")]
    Encode { name: String, reason: String },

    #[error("Failed to build archive: {0}")]
    Archive(String),

    #[error("No file provided")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid run identifier: {0}")]
    InvalidRunId(String),

    #[error("No outputs found for run {0}")]
    RunNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProcessingError {
    /// True for failures caused by the submitted payload rather than the server
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::Decode(_)
                | Self::InvalidDimensions { .. }
                | Self::UnsupportedFormat(_)
                | Self::ImageTooLarge { .. }
                | Self::RequestTooLarge { .. }
        )
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl IntoResponse for ProcessingError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ProcessingError::EmptyInput => (StatusCode::BAD_REQUEST, "EMPTY_INPUT"),
            ProcessingError::Decode(_) => (StatusCode::BAD_REQUEST, "DECODE_ERROR"),
            ProcessingError::InvalidDimensions { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_DIMENSIONS")
            }
            ProcessingError::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT"),
            ProcessingError::ImageTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE")
            }
            ProcessingError::RequestTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE")
            }
            ProcessingError::StageFailure { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STAGE_FAILURE")
            }
            ProcessingError::Persistence { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
            ProcessingError::Encode { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "ENCODE_ERROR"),
            ProcessingError::Archive(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ARCHIVE_ERROR"),
            ProcessingError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ProcessingError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ProcessingError::InvalidRunId(_) => (StatusCode::BAD_REQUEST, "INVALID_RUN_ID"),
            ProcessingError::RunNotFound(_) => (StatusCode::NOT_FOUND, "RUN_NOT_FOUND"),
            ProcessingError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ProcessingError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else if self.is_input_error() {
            tracing::warn!("Rejected upload: {}", self);
        }

        let body = Json(ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
