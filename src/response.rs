//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it. That is the entire
//! job description.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use tracing::error;

/// An outgoing HTTP response.
///
/// ```rust
/// use http::StatusCode;
/// use tudu::Response;
///
/// Response::json(StatusCode::OK, &serde_json::json!({"ok": true}));
/// Response::html("<h1>hi</h1>");
/// Response::status(StatusCode::NOT_FOUND);
/// ```
pub struct Response {
    status: StatusCode,
    content_type: Option<&'static str>,
    body: Bytes,
}

impl Response {
    /// A JSON response with the given status.
    ///
    /// Serialization failure is a programming error in the value being
    /// sent; it degrades to an empty 500 rather than panicking a
    /// connection task.
    pub fn json(status: StatusCode, value: &impl Serialize) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: Some("application/json"),
                body: body.into(),
            },
            Err(e) => {
                error!("response serialization failed: {e}");
                Self::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// `200 OK` — `text/html; charset=utf-8`.
    pub fn html(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some("text/html; charset=utf-8"),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    /// Response with the given status and no body.
    pub fn status(status: StatusCode) -> Self {
        Self { status, content_type: None, body: Bytes::new() }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        if let Some(content_type) = self.content_type {
            builder = builder.header(http::header::CONTENT_TYPE, content_type);
        }
        // The only inputs are a valid status and a valid header value, so
        // this cannot fail.
        builder
            .body(Full::new(self.body))
            .unwrap_or_else(|_| http::Response::new(Full::new(Bytes::new())))
    }
}

/// Conversion into an HTTP [`Response`].
///
/// Implemented for [`Response`] itself and for bare [`StatusCode`]s so a
/// handler can `return StatusCode::NOT_FOUND` directly.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        Response::status(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sets_status_and_content_type() {
        let response = Response::json(StatusCode::CREATED, &serde_json::json!({"a": 1}));
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.body(), br#"{"a":1}"#);
    }

    #[test]
    fn status_only_has_empty_body() {
        let response = Response::status(StatusCode::NOT_FOUND);
        assert!(response.body().is_empty());
    }
}
