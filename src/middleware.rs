//! Middleware: higher-order factories that wrap a service with another.

use std::future::Future;
use std::sync::Arc;

use crate::request::Request;
use crate::response::Response;
use crate::service::{BoxFuture, BoxedService, Service};

/// A middleware wraps a `next` service, producing a new service. A route's
/// final service is built by folding `handler` first, then each
/// middleware around the result in turn, so that middleware added at an
/// outer scope ends up outermost: it runs first on the request path and
/// last on the response path.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedService) -> BoxedService;
}

/// `Next` is the remaining service in the chain, callable exactly once.
pub struct Next {
    inner: BoxedService,
}

impl Next {
    pub fn new(inner: BoxedService) -> Self {
        Next { inner }
    }

    pub async fn run(&self, req: Request) -> Response {
        self.inner.call(req).await
    }
}

struct FnMiddleware<F> {
    f: Arc<F>,
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn wrap(&self, next: BoxedService) -> BoxedService {
        let f = self.f.clone();
        Arc::new(FnService { f, next })
    }
}

struct FnService<F> {
    f: Arc<F>,
    next: BoxedService,
}

impl<F, Fut> Service for FnService<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call<'a>(&'a self, req: Request) -> BoxFuture<'a, Response> {
        let next = Next::new(self.next.clone());
        Box::pin((self.f)(req, next))
    }
}

/// Build a [`Middleware`] from an async function of `(Request, Next)`, the
/// common case for one-off middleware that doesn't need its own type.
pub fn from_fn<F, Fut>(f: F) -> impl Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FnMiddleware { f: Arc::new(f) }
}
