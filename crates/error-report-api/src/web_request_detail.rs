//! Details about the web request associated with an error report
//!
//! A [`WebRequestDetail`] is an immutable snapshot of the request that was
//! being served when the error happened. It is only built through
//! [`WebRequestDetailBuilder`]:
//!
//! ```
//! use error_report_api::WebRequestDetail;
//!
//! let detail = WebRequestDetail::builder()
//!     .user_ip_address("127.0.0.1")
//!     .http_method("GET")
//!     .request_protocol("HTTPS")
//!     .build();
//!
//! assert_eq!(detail.http_method(), Some("GET"));
//! assert_eq!(detail.cookies(), None);
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared string map used for headers, cookies, query string, form and session data.
///
/// Building clones the handle, not the map.
pub type StringMap = Arc<HashMap<String, String>>;

/// Contains details about the web request associated with the error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebRequestDetail {
    /// User IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    user_ip_address: Option<String>,
    /// HTTP method
    #[serde(skip_serializing_if = "Option::is_none")]
    http_method: Option<String>,
    /// Request protocol
    #[serde(skip_serializing_if = "Option::is_none")]
    request_protocol: Option<String>,
    /// Request URL
    #[serde(skip_serializing_if = "Option::is_none")]
    request_url: Option<String>,
    /// Request URL root
    #[serde(skip_serializing_if = "Option::is_none")]
    request_url_root: Option<String>,
    /// Referral URL
    #[serde(skip_serializing_if = "Option::is_none")]
    referral_url: Option<String>,
    /// Headers
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<StringMap>,
    /// Cookies
    #[serde(skip_serializing_if = "Option::is_none")]
    cookies: Option<StringMap>,
    /// Query string parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    query_string: Option<StringMap>,
    /// Form post data
    #[serde(skip_serializing_if = "Option::is_none")]
    post_data: Option<StringMap>,
    /// Session data
    #[serde(skip_serializing_if = "Option::is_none")]
    session_data: Option<StringMap>,
    /// Raw post data
    #[serde(skip_serializing_if = "Option::is_none")]
    post_data_raw: Option<String>,
    /// MVC action
    #[serde(skip_serializing_if = "Option::is_none")]
    mvc_action: Option<String>,
    /// MVC controller
    #[serde(skip_serializing_if = "Option::is_none")]
    mvc_controller: Option<String>,
    /// MVC area
    #[serde(skip_serializing_if = "Option::is_none")]
    mvc_area: Option<String>,
}

impl WebRequestDetail {
    pub fn builder() -> WebRequestDetailBuilder {
        WebRequestDetailBuilder::default()
    }

    pub fn user_ip_address(&self) -> Option<&str> {
        self.user_ip_address.as_deref()
    }

    pub fn http_method(&self) -> Option<&str> {
        self.http_method.as_deref()
    }

    pub fn request_protocol(&self) -> Option<&str> {
        self.request_protocol.as_deref()
    }

    pub fn request_url(&self) -> Option<&str> {
        self.request_url.as_deref()
    }

    pub fn request_url_root(&self) -> Option<&str> {
        self.request_url_root.as_deref()
    }

    pub fn referral_url(&self) -> Option<&str> {
        self.referral_url.as_deref()
    }

    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        self.headers.as_deref()
    }

    pub fn cookies(&self) -> Option<&HashMap<String, String>> {
        self.cookies.as_deref()
    }

    pub fn query_string(&self) -> Option<&HashMap<String, String>> {
        self.query_string.as_deref()
    }

    pub fn post_data(&self) -> Option<&HashMap<String, String>> {
        self.post_data.as_deref()
    }

    pub fn session_data(&self) -> Option<&HashMap<String, String>> {
        self.session_data.as_deref()
    }

    pub fn post_data_raw(&self) -> Option<&str> {
        self.post_data_raw.as_deref()
    }

    pub fn mvc_action(&self) -> Option<&str> {
        self.mvc_action.as_deref()
    }

    pub fn mvc_controller(&self) -> Option<&str> {
        self.mvc_controller.as_deref()
    }

    pub fn mvc_area(&self) -> Option<&str> {
        self.mvc_area.as_deref()
    }
}

/// Stages field values for a [`WebRequestDetail`]
///
/// Setters only assign, the last write wins. [`build`](Self::build) borrows the
/// builder, so it can keep producing snapshots after further changes.
#[derive(Debug, Clone, Default)]
pub struct WebRequestDetailBuilder {
    user_ip_address: Option<String>,
    http_method: Option<String>,
    request_protocol: Option<String>,
    request_url: Option<String>,
    request_url_root: Option<String>,
    referral_url: Option<String>,
    headers: Option<StringMap>,
    cookies: Option<StringMap>,
    query_string: Option<StringMap>,
    post_data: Option<StringMap>,
    session_data: Option<StringMap>,
    post_data_raw: Option<String>,
    mvc_action: Option<String>,
    mvc_controller: Option<String>,
    mvc_area: Option<String>,
}

impl WebRequestDetailBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_ip_address(mut self, user_ip_address: impl Into<String>) -> Self {
        self.user_ip_address = Some(user_ip_address.into());
        self
    }

    pub fn http_method(mut self, http_method: impl Into<String>) -> Self {
        self.http_method = Some(http_method.into());
        self
    }

    pub fn request_protocol(mut self, request_protocol: impl Into<String>) -> Self {
        self.request_protocol = Some(request_protocol.into());
        self
    }

    pub fn request_url(mut self, request_url: impl Into<String>) -> Self {
        self.request_url = Some(request_url.into());
        self
    }

    pub fn request_url_root(mut self, request_url_root: impl Into<String>) -> Self {
        self.request_url_root = Some(request_url_root.into());
        self
    }

    pub fn referral_url(mut self, referral_url: impl Into<String>) -> Self {
        self.referral_url = Some(referral_url.into());
        self
    }

    pub fn headers(mut self, headers: impl Into<StringMap>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    pub fn cookies(mut self, cookies: impl Into<StringMap>) -> Self {
        self.cookies = Some(cookies.into());
        self
    }

    pub fn query_string(mut self, query_string: impl Into<StringMap>) -> Self {
        self.query_string = Some(query_string.into());
        self
    }

    pub fn post_data(mut self, post_data: impl Into<StringMap>) -> Self {
        self.post_data = Some(post_data.into());
        self
    }

    pub fn session_data(mut self, session_data: impl Into<StringMap>) -> Self {
        self.session_data = Some(session_data.into());
        self
    }

    pub fn post_data_raw(mut self, post_data_raw: impl Into<String>) -> Self {
        self.post_data_raw = Some(post_data_raw.into());
        self
    }

    pub fn mvc_action(mut self, mvc_action: impl Into<String>) -> Self {
        self.mvc_action = Some(mvc_action.into());
        self
    }

    pub fn mvc_controller(mut self, mvc_controller: impl Into<String>) -> Self {
        self.mvc_controller = Some(mvc_controller.into());
        self
    }

    pub fn mvc_area(mut self, mvc_area: impl Into<String>) -> Self {
        self.mvc_area = Some(mvc_area.into());
        self
    }

    /// Snapshot the staged values. Map fields share storage with the builder.
    pub fn build(&self) -> WebRequestDetail {
        WebRequestDetail {
            user_ip_address: self.user_ip_address.clone(),
            http_method: self.http_method.clone(),
            request_protocol: self.request_protocol.clone(),
            request_url: self.request_url.clone(),
            request_url_root: self.request_url_root.clone(),
            referral_url: self.referral_url.clone(),
            headers: self.headers.clone(),
            cookies: self.cookies.clone(),
            query_string: self.query_string.clone(),
            post_data: self.post_data.clone(),
            session_data: self.session_data.clone(),
            post_data_raw: self.post_data_raw.clone(),
            mvc_action: self.mvc_action.clone(),
            mvc_controller: self.mvc_controller.clone(),
            mvc_area: self.mvc_area.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_builder() -> WebRequestDetailBuilder {
        WebRequestDetail::builder()
            .user_ip_address("10.1.2.3")
            .http_method("POST")
            .request_protocol("HTTPS")
            .request_url("https://shop.example.com/cart/checkout")
            .request_url_root("https://shop.example.com")
            .referral_url("https://shop.example.com/cart")
            .headers(map(&[("host", "shop.example.com")]))
            .cookies(map(&[("sid", "abc")]))
            .query_string(map(&[("step", "2")]))
            .post_data(map(&[("qty", "3")]))
            .session_data(map(&[("user", "42")]))
            .post_data_raw("qty=3")
            .mvc_action("Checkout")
            .mvc_controller("Cart")
            .mvc_area("Store")
    }

    #[test]
    fn test_every_setter_round_trips() {
        let detail = full_builder().build();

        assert_eq!(detail.user_ip_address(), Some("10.1.2.3"));
        assert_eq!(detail.http_method(), Some("POST"));
        assert_eq!(detail.request_protocol(), Some("HTTPS"));
        assert_eq!(
            detail.request_url(),
            Some("https://shop.example.com/cart/checkout")
        );
        assert_eq!(detail.request_url_root(), Some("https://shop.example.com"));
        assert_eq!(detail.referral_url(), Some("https://shop.example.com/cart"));
        assert_eq!(detail.headers(), Some(&map(&[("host", "shop.example.com")])));
        assert_eq!(detail.cookies(), Some(&map(&[("sid", "abc")])));
        assert_eq!(detail.query_string(), Some(&map(&[("step", "2")])));
        assert_eq!(detail.post_data(), Some(&map(&[("qty", "3")])));
        assert_eq!(detail.session_data(), Some(&map(&[("user", "42")])));
        assert_eq!(detail.post_data_raw(), Some("qty=3"));
        assert_eq!(detail.mvc_action(), Some("Checkout"));
        assert_eq!(detail.mvc_controller(), Some("Cart"));
        assert_eq!(detail.mvc_area(), Some("Store"));
    }

    #[test]
    fn test_empty_builder_yields_all_absent() {
        let detail = WebRequestDetail::builder().build();

        assert_eq!(detail.user_ip_address(), None);
        assert_eq!(detail.http_method(), None);
        assert_eq!(detail.request_protocol(), None);
        assert_eq!(detail.request_url(), None);
        assert_eq!(detail.request_url_root(), None);
        assert_eq!(detail.referral_url(), None);
        assert_eq!(detail.headers(), None);
        assert_eq!(detail.cookies(), None);
        assert_eq!(detail.query_string(), None);
        assert_eq!(detail.post_data(), None);
        assert_eq!(detail.session_data(), None);
        assert_eq!(detail.post_data_raw(), None);
        assert_eq!(detail.mvc_action(), None);
        assert_eq!(detail.mvc_controller(), None);
        assert_eq!(detail.mvc_area(), None);
    }

    #[test]
    fn test_last_write_wins() {
        let detail = WebRequestDetail::builder()
            .http_method("GET")
            .http_method("DELETE")
            .headers(map(&[("a", "1")]))
            .headers(map(&[("b", "2")]))
            .build();

        assert_eq!(detail.http_method(), Some("DELETE"));
        assert_eq!(detail.headers(), Some(&map(&[("b", "2")])));
    }

    #[test]
    fn test_independent_builders_do_not_share_values() {
        let first = WebRequestDetail::builder().http_method("GET").mvc_area("Admin");
        let second = WebRequestDetail::builder().http_method("PUT");

        let a = first.build();
        let b = second.build();

        assert_eq!(a.http_method(), Some("GET"));
        assert_eq!(a.mvc_area(), Some("Admin"));
        assert_eq!(b.http_method(), Some("PUT"));
        assert_eq!(b.mvc_area(), None);
    }

    #[test]
    fn test_method_url_and_headers_only() {
        let detail = WebRequestDetail::builder()
            .http_method("GET")
            .request_url("https://example.com/a?b=1")
            .headers(map(&[("Host", "example.com")]))
            .build();

        assert_eq!(detail.http_method(), Some("GET"));
        assert_eq!(detail.request_url(), Some("https://example.com/a?b=1"));
        assert_eq!(detail.headers(), Some(&map(&[("Host", "example.com")])));

        assert_eq!(detail.user_ip_address(), None);
        assert_eq!(detail.request_protocol(), None);
        assert_eq!(detail.request_url_root(), None);
        assert_eq!(detail.referral_url(), None);
        assert_eq!(detail.cookies(), None);
        assert_eq!(detail.query_string(), None);
        assert_eq!(detail.post_data(), None);
        assert_eq!(detail.session_data(), None);
        assert_eq!(detail.post_data_raw(), None);
        assert_eq!(detail.mvc_controller(), None);
        assert_eq!(detail.mvc_area(), None);
        assert_eq!(detail.mvc_action(), None);
    }

    #[test]
    fn test_rebuild_after_changing_mvc_action() {
        let builder = full_builder().mvc_action("Index");
        let before = builder.build();

        let builder = builder.mvc_action("Details");
        let after = builder.build();

        assert_eq!(before.mvc_action(), Some("Index"));
        assert_eq!(after.mvc_action(), Some("Details"));
        assert_ne!(before, after);

        let aligned = builder.mvc_action("Index").build();
        assert_eq!(before, aligned);
    }

    #[test]
    fn test_rebuild_shares_map_storage() {
        let headers: StringMap = Arc::new(map(&[("host", "example.com")]));
        let builder = WebRequestDetail::builder().headers(Arc::clone(&headers));

        let a = builder.build();
        let b = builder.build();

        let a_headers = a.headers().map(|h| h as *const HashMap<String, String>);
        let b_headers = b.headers().map(|h| h as *const HashMap<String, String>);
        assert_eq!(a_headers, Some(Arc::as_ptr(&headers)));
        assert_eq!(a_headers, b_headers);
    }

    #[test]
    fn test_values_are_accepted_verbatim() {
        let long = "x".repeat(64 * 1024);
        let detail = WebRequestDetail::builder()
            .request_url("http://example.com/\u{0}\n\t")
            .post_data_raw(long.clone())
            .session_data(HashMap::<String, String>::new())
            .build();

        assert_eq!(detail.request_url(), Some("http://example.com/\u{0}\n\t"));
        assert_eq!(detail.post_data_raw(), Some(long.as_str()));
        assert_eq!(detail.session_data(), Some(&HashMap::new()));
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let detail = WebRequestDetail::builder()
            .http_method("GET")
            .query_string(map(&[("page", "2")]))
            .session_data(HashMap::<String, String>::new())
            .build();

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(
            value,
            json!({
                "http_method": "GET",
                "query_string": { "page": "2" },
                "session_data": {}
            })
        );
    }

    #[test]
    fn test_detail_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WebRequestDetail>();
        assert_send_sync::<WebRequestDetailBuilder>();
    }

    #[test]
    fn test_shared_across_threads() {
        let detail = Arc::new(full_builder().build());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let detail = Arc::clone(&detail);
                std::thread::spawn(move || detail.http_method().map(str::to_owned))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().as_deref(), Some("POST"));
        }
    }
}
