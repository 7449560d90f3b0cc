use std::net::SocketAddr;

use crate::body::{BoxBody, EofBody};
use crate::headers::HeaderMap;
use crate::method::Method;
use crate::path::PathInfo;
use crate::query::QueryMap;
use crate::state::StateList;

/// Per-connection metadata available to every request on that connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionInfo {
    pub peer_addr: SocketAddr,
    pub local_addr: SocketAddr,
}

/// A request as seen by middleware and handlers: method, path info
/// (pattern + captured parameters), query map, header map, streaming
/// body, and the outer-to-inner state list assembled from the matched
/// route's scope chain.
///
/// Owned exclusively by the connection task for the duration of the
/// handler call; not `Clone` because the body is single-consumer.
pub struct Request {
    method: Method,
    target: String,
    version_minor: u8,
    headers: HeaderMap,
    query: QueryMap,
    path_info: Option<PathInfo>,
    state: StateList,
    connection: ConnectionInfo,
    body: BoxBody,
}

impl Request {
    pub fn new(
        method: Method,
        target: String,
        version_minor: u8,
        headers: HeaderMap,
        connection: ConnectionInfo,
    ) -> Self {
        let query = match target.split_once('?') {
            Some((_, q)) => QueryMap::parse(q),
            None => QueryMap::parse(""),
        };
        Request {
            method,
            target,
            version_minor,
            headers,
            query,
            path_info: None,
            state: StateList::new(),
            connection,
            body: Box::pin(EofBody),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The request target's path component, without the query string.
    pub fn path(&self) -> &str {
        match self.target.split_once('?') {
            Some((p, _)) => p,
            None => &self.target,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version_minor(&self) -> u8 {
        self.version_minor
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn query(&self) -> &QueryMap {
        &self.query
    }

    pub fn path_info(&self) -> Option<&PathInfo> {
        self.path_info.as_ref()
    }

    pub fn set_path_info(&mut self, info: PathInfo) {
        self.path_info = Some(info);
    }

    pub fn state(&self) -> &StateList {
        &self.state
    }

    pub fn set_state(&mut self, state: StateList) {
        self.state = state;
    }

    pub fn connection_info(&self) -> &ConnectionInfo {
        &self.connection
    }

    pub fn body_mut(&mut self) -> &mut BoxBody {
        &mut self.body
    }

    pub fn set_body(&mut self, body: BoxBody) {
        self.body = body;
    }

    pub fn into_body(self) -> BoxBody {
        self.body
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("target", &self.target)
            .field("headers", &self.headers)
            .finish()
    }
}
