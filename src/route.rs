use std::sync::Arc;

use crate::method::Method;
use crate::middleware::Middleware;
use crate::path::Pattern;
use crate::service::{BoxedService, Service};
use crate::state::StateList;

/// A fully-composed route: method (or [`Method::Any`]), compiled path
/// pattern, its scope chain's state list, and the service built by folding
/// the handler through every middleware in the chain.
///
/// Immovable once inserted into the router: construction happens entirely
/// at build time, in [`crate::scope::Scope::finish`].
pub struct Route {
    method: Method,
    pattern: Pattern,
    state: StateList,
    service: BoxedService,
}

impl Route {
    pub fn new(method: Method, pattern: Pattern, state: StateList, service: BoxedService) -> Self {
        Route {
            method,
            pattern,
            state,
            service,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn state(&self) -> &StateList {
        &self.state
    }

    pub fn service(&self) -> &dyn Service {
        &*self.service
    }

    /// A cheaply-cloned, owned handle to the same composed service, for
    /// running the call on an isolated task (panic containment).
    pub fn service_arc(&self) -> BoxedService {
        self.service.clone()
    }
}

/// Fold a handler through a chain of middleware: the handler runs first,
/// then each middleware wraps the accumulated service in turn, so the
/// first middleware in `chain` ends up outermost.
pub fn compose(handler: BoxedService, chain: &[Arc<dyn Middleware>]) -> BoxedService {
    let mut service = handler;
    for mw in chain.iter().rev() {
        service = mw.wrap(service);
    }
    service
}
