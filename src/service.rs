//! Type-erased request/response service, the unit middleware composes over.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::Response;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything callable as `request -> response` in the async context.
///
/// Handlers and middleware-wrapped handlers both end up as a `Service`;
/// the router stores one per route as `Arc<dyn Service>` so the same
/// composed chain can be shared across concurrent requests.
pub trait Service: Send + Sync {
    fn call<'a>(&'a self, req: Request) -> BoxFuture<'a, Response>;
}

/// Blanket impl so any `Fn(Request) -> impl Future<Output = Response>` can
/// be used directly as a `Service`, e.g. a bare closure passed to
/// `Middleware::from_fn`.
impl<F, Fut> Service for F
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call<'a>(&'a self, req: Request) -> BoxFuture<'a, Response> {
        Box::pin(self(req))
    }
}

pub type BoxedService = Arc<dyn Service>;
