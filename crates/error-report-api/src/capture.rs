//! Fills a [`WebRequestDetailBuilder`] from an incoming HTTP request
//!
//! Capture reads the request head (method, URI, headers, extensions) and,
//! when the caller already holds it, the body. Values listed in
//! [`CaptureConfig`] are masked before they reach the builder. Capture never
//! fails: anything that cannot be read as text is skipped.

use crate::config::CaptureConfig;
use crate::web_request_detail::{WebRequestDetail, WebRequestDetailBuilder};
use axum::extract::ConnectInfo;
use cookie::Cookie;
use http::header::{CONTENT_TYPE, COOKIE, HOST, REFERER};
use http::request::Parts;
use http::HeaderMap;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Default)]
pub struct RequestCapture {
    config: Arc<CaptureConfig>,
}

impl RequestCapture {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Capture everything available from the request head.
    ///
    /// Session and MVC fields are left for the caller to set.
    pub fn capture_parts(&self, parts: &Parts) -> WebRequestDetailBuilder {
        let scheme = request_scheme(parts);
        let host = request_host(parts);
        let url_root = format!("{}://{}", scheme, host);
        let url = format!("{}{}", url_root, parts.uri.path());

        let mut builder = WebRequestDetail::builder()
            .http_method(parts.method.as_str())
            .request_protocol(scheme.to_ascii_uppercase())
            .request_url(url)
            .request_url_root(url_root);

        if let Some(referer) = header_str(&parts.headers, REFERER.as_str()) {
            builder = builder.referral_url(self.mask_url_query(referer));
        }

        if let Some(ip) = client_ip(parts) {
            builder = builder.user_ip_address(ip);
        }

        if self.config.capture_headers {
            let headers = self.collect_headers(&parts.headers);
            if !headers.is_empty() {
                builder = builder.headers(headers);
            }
        }

        if self.config.capture_cookies {
            let cookies = self.collect_cookies(&parts.headers);
            if !cookies.is_empty() {
                builder = builder.cookies(cookies);
            }
        }

        if self.config.capture_query_string {
            if let Some(query) = parts.uri.query() {
                let pairs = url::form_urlencoded::parse(query.as_bytes()).into_owned();
                let query_string = self.collect_fields(pairs);
                if !query_string.is_empty() {
                    builder = builder.query_string(query_string);
                }
            }
        }

        trace!(
            method = %parts.method,
            path = parts.uri.path(),
            "Captured web request detail"
        );

        builder
    }

    /// Record a request body the caller has already buffered.
    pub fn capture_body(
        &self,
        mut builder: WebRequestDetailBuilder,
        headers: &HeaderMap,
        body: &[u8],
    ) -> WebRequestDetailBuilder {
        if body.is_empty() {
            return builder;
        }

        if !is_form_content(headers) {
            if self.config.capture_raw_body {
                builder = builder.post_data_raw(String::from_utf8_lossy(body).into_owned());
            }
            return builder;
        }

        // Form bodies are only recorded after masking, raw included
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
            Ok(pairs) => {
                let pairs = self.mask_pairs(pairs);

                if self.config.capture_raw_body {
                    match serde_urlencoded::to_string(&pairs) {
                        Ok(raw) => builder = builder.post_data_raw(raw),
                        Err(e) => debug!("Skipping raw form body: {}", e),
                    }
                }

                let post_data = self.collect_fields(pairs);
                if !post_data.is_empty() {
                    builder = builder.post_data(post_data);
                }
            }
            Err(e) => debug!("Skipping unparseable form body: {}", e),
        }

        builder
    }

    fn collect_headers(&self, headers: &HeaderMap) -> HashMap<String, String> {
        let mut collected: HashMap<String, String> = HashMap::new();

        for (name, value) in headers {
            let name = name.as_str();

            if self.config.is_masked_header(name) {
                collected.insert(name.to_string(), self.config.mask_value.clone());
                continue;
            }

            let Ok(value) = value.to_str() else {
                debug!(header = name, "Skipping header with non-UTF-8 value");
                continue;
            };

            collected
                .entry(name.to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        collected
    }

    fn collect_cookies(&self, headers: &HeaderMap) -> HashMap<String, String> {
        let mut cookies = HashMap::new();

        let cookie_headers = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|cookie_header| cookie_header.to_str().ok());

        for cookie_str in cookie_headers {
            for parsed in Cookie::split_parse(cookie_str) {
                let cookie = match parsed {
                    Ok(cookie) => cookie,
                    Err(e) => {
                        debug!("Skipping unparseable cookie: {}", e);
                        continue;
                    }
                };

                let value = if self.config.mask_cookies || self.config.is_masked_field(cookie.name())
                {
                    self.config.mask_value.clone()
                } else {
                    cookie.value().to_string()
                };
                cookies.insert(cookie.name().to_string(), value);
            }
        }

        cookies
    }

    fn mask_pairs(&self, pairs: Vec<(String, String)>) -> Vec<(String, String)> {
        pairs
            .into_iter()
            .map(|(key, value)| {
                if self.config.is_masked_field(&key) {
                    (key, self.config.mask_value.clone())
                } else {
                    (key, value)
                }
            })
            .collect()
    }

    /// Query string and form pairs: repeated keys are joined with `,`.
    fn collect_fields<I>(&self, pairs: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut fields: HashMap<String, String> = HashMap::new();

        for (key, value) in pairs {
            if self.config.is_masked_field(&key) {
                fields.insert(key, self.config.mask_value.clone());
                continue;
            }

            fields
                .entry(key)
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        fields
    }

    /// Mask `masked_fields` in a URL's query. A URL that does not parse loses its query.
    fn mask_url_query(&self, raw: &str) -> String {
        let Ok(mut url) = Url::parse(raw) else {
            return raw.split('?').next().unwrap_or_default().to_string();
        };

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        if !pairs.iter().any(|(key, _)| self.config.is_masked_field(key)) {
            return raw.to_string();
        }

        let pairs = self.mask_pairs(pairs);
        url.query_pairs_mut().clear().extend_pairs(pairs);
        url.to_string()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// First entry of a comma separated header such as `x-forwarded-for`
fn first_header_entry<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    header_str(headers, name)
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn request_scheme(parts: &Parts) -> String {
    if let Some(scheme) = parts.uri.scheme_str() {
        return scheme.to_ascii_lowercase();
    }

    first_header_entry(&parts.headers, "x-forwarded-proto")
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "http".to_string())
}

fn request_host(parts: &Parts) -> String {
    if let Some(authority) = parts.uri.authority() {
        // Drop any userinfo
        let host = authority.as_str().rsplit('@').next().unwrap_or_default();
        if !host.is_empty() {
            return host.to_string();
        }
    }

    first_header_entry(&parts.headers, "x-forwarded-host")
        .or_else(|| header_str(&parts.headers, HOST.as_str()))
        .unwrap_or("localhost")
        .to_string()
}

fn client_ip(parts: &Parts) -> Option<String> {
    first_header_entry(&parts.headers, "x-forwarded-for")
        .or_else(|| header_str(&parts.headers, "x-real-ip"))
        .map(str::to_string)
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}

fn is_form_content(headers: &HeaderMap) -> bool {
    header_str(headers, CONTENT_TYPE.as_str())
        .and_then(|content_type| content_type.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}
