//! Extractors: types that can be pulled out of an in-flight [`Request`] by
//! a handler's parameter list.

use std::any::Any;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::body::read_to_end;
use crate::headers::HeaderMap;
use crate::path::PathInfo;
use crate::query::QueryMap;
use crate::request::{ConnectionInfo, Request};
use crate::response::Response;

/// Maximum body size read by the built-in body-consuming extractors when
/// the server did not configure a tighter request-body limit.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Extracts `Self` from a request, or produces a response that
/// short-circuits the remaining extractors and the handler call.
#[async_trait::async_trait]
pub trait FromRequest: Sized {
    async fn from_request(req: &mut Request) -> Result<Self, Response>;
}

#[async_trait::async_trait]
impl FromRequest for ConnectionInfo {
    async fn from_request(req: &mut Request) -> Result<Self, Response> {
        Ok(*req.connection_info())
    }
}

#[async_trait::async_trait]
impl FromRequest for PathInfo {
    async fn from_request(req: &mut Request) -> Result<Self, Response> {
        req.path_info()
            .cloned()
            .ok_or_else(|| Response::new(500).text("no path info bound to this route"))
    }
}

#[async_trait::async_trait]
impl FromRequest for QueryMap {
    async fn from_request(req: &mut Request) -> Result<Self, Response> {
        Ok(req.query().clone())
    }
}

#[async_trait::async_trait]
impl FromRequest for HeaderMap {
    async fn from_request(req: &mut Request) -> Result<Self, Response> {
        Ok(req.headers().clone())
    }
}

#[async_trait::async_trait]
impl FromRequest for String {
    async fn from_request(req: &mut Request) -> Result<Self, Response> {
        let bytes = read_to_end(&mut *req.body_mut(), DEFAULT_BODY_LIMIT)
            .await
            .map_err(|_| Response::new(400).text("failed to read request body"))?;
        String::from_utf8(bytes).map_err(|_| Response::new(400).text("body is not valid utf-8"))
    }
}

#[async_trait::async_trait]
impl FromRequest for Vec<u8> {
    async fn from_request(req: &mut Request) -> Result<Self, Response> {
        read_to_end(&mut *req.body_mut(), DEFAULT_BODY_LIMIT)
            .await
            .map_err(|_| Response::new(400).text("failed to read request body"))
    }
}

/// JSON body, parsed into `T` after checking the request carries a
/// `Content-Type` of `application/json`.
pub struct Json<T>(pub T);

#[async_trait::async_trait]
impl<T: DeserializeOwned> FromRequest for Json<T> {
    async fn from_request(req: &mut Request) -> Result<Self, Response> {
        let content_type = req.headers().get("content-type").unwrap_or("");
        if !content_type.starts_with("application/json") {
            return Err(Response::new(415).text("expected application/json"));
        }
        let bytes = read_to_end(&mut *req.body_mut(), DEFAULT_BODY_LIMIT)
            .await
            .map_err(|_| Response::new(400).text("failed to read request body"))?;
        serde_json::from_slice(&bytes)
            .map(Json)
            .map_err(|e| Response::new(400).text(format!("invalid json body: {e}")))
    }
}

/// `application/x-www-form-urlencoded` body, parsed into `T`.
pub struct Form<T>(pub T);

#[async_trait::async_trait]
impl<T: DeserializeOwned> FromRequest for Form<T> {
    async fn from_request(req: &mut Request) -> Result<Self, Response> {
        let content_type = req.headers().get("content-type").unwrap_or("");
        if !content_type.starts_with("application/x-www-form-urlencoded") {
            return Err(Response::new(415).text("expected application/x-www-form-urlencoded"));
        }
        let bytes = read_to_end(&mut *req.body_mut(), DEFAULT_BODY_LIMIT)
            .await
            .map_err(|_| Response::new(400).text("failed to read request body"))?;
        serde_urlencoded::from_bytes(&bytes)
            .map(Form)
            .map_err(|e| Response::new(400).text(format!("invalid form body: {e}")))
    }
}

/// Path parameters bound to the fields of `T` via the matched route's
/// captured names and values.
pub struct PathOf<T>(pub T);

#[async_trait::async_trait]
impl<T: DeserializeOwned> FromRequest for PathOf<T> {
    async fn from_request(req: &mut Request) -> Result<Self, Response> {
        let info = req
            .path_info()
            .ok_or_else(|| Response::new(500).text("no path info bound to this route"))?;
        let encoded = serde_urlencoded::to_string(info.iter().collect::<Vec<_>>())
            .map_err(|e| Response::new(500).text(format!("failed to encode path parameters: {e}")))?;
        let value = serde_urlencoded::from_str(&encoded)
            .map_err(|e| Response::new(400).text(format!("path parameters do not fit target type: {e}")))?;
        Ok(PathOf(value))
    }
}

/// A shared state value of type `T`, looked up in the request's
/// outer-to-inner state list.
pub struct StateOf<T>(pub Arc<T>);

#[async_trait::async_trait]
impl<T: Any + Send + Sync> FromRequest for StateOf<T> {
    async fn from_request(req: &mut Request) -> Result<Self, Response> {
        req.state()
            .get::<T>()
            .map(StateOf)
            .ok_or_else(|| Response::new(500).text("no state of the requested type is available"))
    }
}
