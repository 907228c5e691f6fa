//! Web request details attached to error reports

pub mod capture;
pub mod config;
pub mod error;
pub mod extractor;
pub mod web_request_detail;

pub use capture::RequestCapture;
pub use config::{CaptureConfig, DEFAULT_MASK_VALUE};
pub use error::CaptureConfigError;
pub use extractor::CapturedRequest;
pub use web_request_detail::{StringMap, WebRequestDetail, WebRequestDetailBuilder};
