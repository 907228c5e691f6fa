//! axum extractor that captures the current request for error reports
//!
//! Usage:
//! ```ignore
//! let app = Router::new()
//!     .route("/checkout", post(checkout))
//!     .layer(Extension(RequestCapture::new(config)));
//!
//! async fn checkout(CapturedRequest(detail): CapturedRequest) -> impl IntoResponse {
//!     let detail = detail
//!         .mvc_controller("cart")
//!         .mvc_action("checkout")
//!         .build();
//!     // attach `detail` to the error report
//! }
//! ```

use crate::capture::RequestCapture;
use crate::web_request_detail::WebRequestDetailBuilder;
use axum::extract::FromRequestParts;
use http::request::Parts;
use std::convert::Infallible;

/// Builder pre-filled from the request head.
///
/// Uses the [`RequestCapture`] found in the request extensions, or the
/// default one when none was installed.
#[derive(Debug, Clone)]
pub struct CapturedRequest(pub WebRequestDetailBuilder);

impl CapturedRequest {
    pub fn into_inner(self) -> WebRequestDetailBuilder {
        self.0
    }
}

impl<S> FromRequestParts<S> for CapturedRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let builder = match parts.extensions.get::<RequestCapture>() {
            Some(capture) => capture.capture_parts(parts),
            None => RequestCapture::default().capture_parts(parts),
        };

        Ok(CapturedRequest(builder))
    }
}
