//! HTTP response builder.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};

/// HTTP response with builder pattern.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Create response with status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// 200 OK
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// 201 Created
    pub fn created() -> Self {
        Self::new(StatusCode::CREATED)
    }

    /// 404 Not Found
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// 405 Method Not Allowed
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED)
    }

    /// 500 Internal Server Error
    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Set header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(n), Ok(v)) = (
            http::HeaderName::try_from(name),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(n, v);
        }
        self
    }

    /// Set body as JSON.
    pub fn json<T: serde::Serialize>(self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(json) => self.header("content-type", "application/json").body(json),
            Err(_) => Self::internal_error()
                .header("content-type", "application/json")
                .body(r#"{"error":"serialization failed"}"#),
        }
    }

    fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Create error response with JSON body.
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::new(status).json(&serde_json::json!({ "error": message }))
    }

    /// Get status code.
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Get headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get body.
    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    /// Build hyper response.
    pub fn into_hyper(self) -> hyper::Response<http_body_util::Full<Bytes>> {
        let mut response = hyper::Response::new(http_body_util::Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
