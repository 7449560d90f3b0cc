//! weft: a composable HTTP/1.x server framework built around a
//! compile-time-validated path router and an async request/response
//! pipeline of layered middleware and typed handlers.
//!
//! ```ignore
//! use weft::{Scope, Response};
//!
//! async fn hello() -> Response {
//!     Response::new(200).text("hello")
//! }
//!
//! let router = Scope::root().get("/hello", hello)?.finish()?;
//! ```

pub mod body;
pub mod compression;
pub mod conn;
pub mod date;
pub mod error;
pub mod extract;
pub mod handler;
pub mod headers;
pub mod method;
pub mod middleware;
pub mod parser;
pub mod path;
pub mod query;
pub mod request;
pub mod response;
pub mod route;
pub mod router;
pub mod scope;
pub mod server;
pub mod service;
pub mod state;
pub mod testing;

pub use body::{AsyncBody, BoxBody};
pub use error::{Error, ExceptionObserver, Result};
pub use extract::{Form, Json, PathOf, StateOf};
pub use handler::Handler;
pub use headers::HeaderMap;
pub use method::Method;
pub use middleware::{from_fn, Middleware, Next};
pub use path::{Pattern, PatternError, PathInfo};
pub use query::QueryMap;
pub use request::{ConnectionInfo, Request};
pub use response::Response;
pub use router::Router;
pub use scope::Scope;
pub use server::{Server, ServerConfig};
pub use service::Service;
pub use state::StateList;
