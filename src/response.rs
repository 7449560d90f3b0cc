use bytes::Bytes;

use crate::body::{BoxBody, EofBody, MemoryBody};
use crate::headers::HeaderMap;

/// A response built by a handler or middleware and consumed exactly once
/// by the connection task. Not `Clone`: bodies are single-consumer.
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: BoxBody,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Response {
            status,
            headers: HeaderMap::new(),
            body: Box::pin(EofBody),
        }
    }

    pub fn ok() -> Self {
        Response::new(200)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn body_mut(&mut self) -> &mut BoxBody {
        &mut self.body
    }

    pub fn into_body(self) -> BoxBody {
        self.body
    }

    /// Replace the body with raw bytes, preserving any existing
    /// `Content-Type`.
    pub fn body(mut self, data: impl Into<Bytes>) -> Self {
        self.body = Box::pin(MemoryBody::new(data));
        self
    }

    /// Replace the body with a JSON-serialized value, setting
    /// `Content-Type: application/json`.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        let data = serde_json::to_vec(value)?;
        self.headers.set("content-type", "application/json");
        self.body = Box::pin(MemoryBody::new(data));
        Ok(self)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.headers.set("content-type", "text/plain; charset=utf-8");
        self.body = Box::pin(MemoryBody::new(text.into().into_bytes()));
        self
    }

    pub fn not_found() -> Self {
        Response::new(404).text("not found")
    }

    pub fn internal_error() -> Self {
        Response::new(500).text("internal server error")
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish()
    }
}
