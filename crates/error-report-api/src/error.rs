//! Error types for loading capture configuration

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureConfigError {
    #[error("Invalid capture configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid masked header name: {name}")]
    InvalidHeaderName { name: String },

    #[error("Mask value must not be empty")]
    EmptyMaskValue,
}
