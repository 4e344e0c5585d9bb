use crate::error::ProcessingError;
use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

const PREFIX: &str = "medical";

/// Distinguishes runs started within the same millisecond
static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Identifier shared by every file one run writes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// A fresh identifier: `medical_<date>_<time>_<millis>_<sequence>`
    pub fn generate() -> Self {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}_{}_{:04}", PREFIX, timestamp, sequence))
    }

    /// Validate an identifier received from a client.
    /// Only ASCII alphanumerics, `_` and `-` are accepted, so the value is
    /// always safe to splice into a file name.
    pub fn parse(value: &str) -> Result<Self, ProcessingError> {
        let valid = !value.is_empty()
            && value.len() <= 128
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ProcessingError::InvalidRunId(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
