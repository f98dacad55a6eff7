// File: src/response.rs
// Purpose: Mutable response surface written by executors, plus the Axum finalizer

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use std::sync::{Mutex, PoisonError};

use crate::error::{MvcError, Result};

/// Body of the response: bytes written so far, or a stream handed to the host.
enum ResponseBody {
    Buffered(BytesMut),
    // Body is Send but not Sync; the mutex keeps ActionContext shareable.
    Streaming(Mutex<Body>),
}

/// Response being produced for one request.
///
/// Status and headers may change freely until the first body write or until
/// a body stream is attached; after that they are frozen and mutations fail
/// with [`MvcError::ResponseStarted`].
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
    has_started: bool,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: ResponseBody::Buffered(BytesMut::new()),
            has_started: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> Result<()> {
        self.ensure_not_started()?;
        self.status = status;
        Ok(())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header_str(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<()> {
        let value = HeaderValue::from_str(value)
            .map_err(|_| MvcError::InvalidHeaderValue(name.to_string()))?;
        self.insert_header(name, value)
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<()> {
        self.ensure_not_started()?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<()> {
        self.ensure_not_started()?;
        self.headers.append(name, value);
        Ok(())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header_str(CONTENT_TYPE)
    }

    pub fn set_content_length(&mut self, length: u64) -> Result<()> {
        self.insert_header(CONTENT_LENGTH, HeaderValue::from(length))
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    /// Append bytes to the body. The first call freezes status and headers.
    ///
    /// Writes after a stream has been attached are dropped.
    pub fn write_body(&mut self, chunk: &[u8]) {
        self.has_started = true;
        match &mut self.body {
            ResponseBody::Buffered(body) => body.extend_from_slice(chunk),
            ResponseBody::Streaming(_) => {
                tracing::warn!("Ignoring {} bytes written after the body stream", chunk.len())
            }
        }
    }

    /// Hand the rest of the body to the host as a stream. Freezes status and headers.
    pub fn stream_body(&mut self, body: Body) -> Result<()> {
        self.ensure_not_started()?;
        self.has_started = true;
        self.body = ResponseBody::Streaming(Mutex::new(body));
        Ok(())
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.body, ResponseBody::Streaming(_))
    }

    /// Bytes written so far; empty when the body is a stream.
    pub fn body(&self) -> &[u8] {
        match &self.body {
            ResponseBody::Buffered(body) => body,
            ResponseBody::Streaming(_) => &[],
        }
    }

    fn ensure_not_started(&self) -> Result<()> {
        if self.has_started {
            return Err(MvcError::ResponseStarted);
        }
        Ok(())
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Body) {
        let body = match self.body {
            ResponseBody::Buffered(body) => Body::from(body.freeze()),
            ResponseBody::Streaming(body) => body.into_inner().unwrap_or_else(PoisonError::into_inner),
        };
        (self.status, self.headers, body)
    }

    /// Drain the body, streamed or buffered, into memory.
    pub async fn collect_body(self) -> Result<Bytes> {
        let (_, _, body) = self.into_parts();
        axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|e| MvcError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("has_started", &self.has_started)
            .field("streaming", &self.is_streaming())
            .finish()
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let (status, headers, body) = self.into_parts();
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn test_headers_frozen_after_body_starts() {
        let mut response = HttpResponse::new();
        response.set_header(CONTENT_TYPE, "text/plain").unwrap();
        response.write_body(b"hello");

        assert!(response.has_started());
        assert!(matches!(
            response.set_status(StatusCode::NOT_FOUND),
            Err(MvcError::ResponseStarted)
        ));
        assert!(response.set_header(LOCATION, "/x").is_err());
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let mut response = HttpResponse::new();
        assert!(matches!(
            response.set_header(LOCATION, "/bad\nvalue"),
            Err(MvcError::InvalidHeaderValue(_))
        ));
    }

    #[test]
    fn test_into_response_keeps_status_headers_body() {
        let mut response = HttpResponse::new();
        response.set_status(StatusCode::CREATED).unwrap();
        response.set_header(LOCATION, "/items/1").unwrap();
        response.write_body(b"{}");

        let resp = response.into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/items/1");
    }

    #[tokio::test]
    async fn test_stream_body_freezes_headers() {
        let mut response = HttpResponse::new();
        response.set_header(CONTENT_TYPE, "text/plain").unwrap();
        response.stream_body(Body::from("streamed")).unwrap();

        assert!(response.has_started());
        assert!(response.is_streaming());
        assert!(response.body().is_empty());
        assert!(matches!(
            response.set_status(StatusCode::NOT_FOUND),
            Err(MvcError::ResponseStarted)
        ));
        assert!(matches!(
            response.stream_body(Body::empty()),
            Err(MvcError::ResponseStarted)
        ));
        assert_eq!(response.collect_body().await.unwrap(), Bytes::from("streamed"));
    }
}
