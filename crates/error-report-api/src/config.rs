//! Settings controlling what request capture records and what it masks

use crate::error::CaptureConfigError;
use http::HeaderName;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_MASK_VALUE: &str = "X-MASKED-X";

/// Capture settings. Every field has a default, so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub capture_headers: bool,
    pub capture_cookies: bool,
    pub capture_query_string: bool,
    pub capture_raw_body: bool,

    /// Replace every cookie value, not only those named in `masked_fields`
    pub mask_cookies: bool,
    pub mask_value: String,

    /// Header names whose values are replaced (case-insensitive)
    pub masked_headers: Vec<String>,
    /// Cookie, query and form keys whose values are replaced (case-insensitive)
    pub masked_fields: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_headers: true,
            capture_cookies: true,
            capture_query_string: true,
            capture_raw_body: true,
            mask_cookies: true,
            mask_value: DEFAULT_MASK_VALUE.to_string(),
            masked_headers: vec![
                "authorization".to_string(),
                "proxy-authorization".to_string(),
                "cookie".to_string(),
                "set-cookie".to_string(),
                "x-api-key".to_string(),
            ],
            masked_fields: vec![
                "password".to_string(),
                "passwd".to_string(),
                "secret".to_string(),
                "token".to_string(),
                "api_key".to_string(),
            ],
        }
    }
}

impl CaptureConfig {
    /// Create settings from a JSON value, using defaults if it does not parse or validate
    pub fn from_json(value: serde_json::Value) -> Self {
        let config = serde_json::from_value::<Self>(value)
            .map_err(CaptureConfigError::from)
            .and_then(|config| config.validate().map(|()| config));

        match config {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid capture configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Parse and validate settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, CaptureConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }

    pub fn validate(&self) -> Result<(), CaptureConfigError> {
        if self.mask_value.is_empty() {
            return Err(CaptureConfigError::EmptyMaskValue);
        }

        for name in &self.masked_headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(CaptureConfigError::InvalidHeaderName { name: name.clone() });
            }
        }

        Ok(())
    }

    pub fn is_masked_header(&self, name: &str) -> bool {
        self.masked_headers
            .iter()
            .any(|masked| masked.eq_ignore_ascii_case(name))
    }

    pub fn is_masked_field(&self, name: &str) -> bool {
        self.masked_fields
            .iter()
            .any(|masked| masked.eq_ignore_ascii_case(name))
    }
}
