//! Scope/route builder tree: prefix concatenation, outer-to-inner state,
//! and middleware composition, flattened into a [`Router`] at build time.

use std::any::Any;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::{Handler, HandlerService};
use crate::method::Method;
use crate::middleware::Middleware;
use crate::path::Pattern;
use crate::route::{self, Route};
use crate::router::{Router, RouterBuilder};
use crate::state::StateList;

enum Node {
    Route {
        method: Method,
        pattern: Pattern,
        service: Arc<dyn crate::service::Service>,
    },
    Scope(Scope),
}

/// A builder for one prefix level: its own state and middleware apply to
/// every route and nested scope registered under it.
pub struct Scope {
    prefix: Pattern,
    state: StateList,
    middleware: Vec<Arc<dyn Middleware>>,
    children: Vec<Node>,
}

impl Scope {
    pub fn new(prefix: &str) -> Result<Self, Error> {
        Ok(Scope {
            prefix: Pattern::parse_scope(prefix)?,
            state: StateList::new(),
            middleware: Vec::new(),
            children: Vec::new(),
        })
    }

    pub fn root() -> Self {
        Scope {
            prefix: Pattern::parse_scope("").expect("empty scope prefix always parses"),
            state: StateList::new(),
            middleware: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Attach a state value visible to this scope and everything nested
    /// under it, shadowing any outer value of the same type.
    pub fn state<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.state.push(value);
        self
    }

    /// Append a middleware; middleware registered earlier at this scope
    /// ends up outside middleware registered later at the same scope, and
    /// outside anything registered in a nested scope.
    pub fn wrap(mut self, mw: impl Middleware) -> Self {
        self.middleware.push(Arc::new(mw));
        self
    }

    pub fn route<M>(
        mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler<M>,
    ) -> Result<Self, Error>
    where
        M: Send + Sync + 'static,
    {
        let pattern = Pattern::parse(pattern)?;
        let service: Arc<dyn crate::service::Service> = Arc::new(HandlerService::new(handler));
        self.children.push(Node::Route {
            method,
            pattern,
            service,
        });
        Ok(self)
    }

    pub fn get<M>(self, pattern: &str, handler: impl Handler<M>) -> Result<Self, Error>
    where
        M: Send + Sync + 'static,
    {
        self.route(Method::Get, pattern, handler)
    }

    pub fn post<M>(self, pattern: &str, handler: impl Handler<M>) -> Result<Self, Error>
    where
        M: Send + Sync + 'static,
    {
        self.route(Method::Post, pattern, handler)
    }

    pub fn put<M>(self, pattern: &str, handler: impl Handler<M>) -> Result<Self, Error>
    where
        M: Send + Sync + 'static,
    {
        self.route(Method::Put, pattern, handler)
    }

    pub fn delete<M>(self, pattern: &str, handler: impl Handler<M>) -> Result<Self, Error>
    where
        M: Send + Sync + 'static,
    {
        self.route(Method::Delete, pattern, handler)
    }

    pub fn any<M>(self, pattern: &str, handler: impl Handler<M>) -> Result<Self, Error>
    where
        M: Send + Sync + 'static,
    {
        self.route(Method::Any, pattern, handler)
    }

    /// Nest a child scope (or route) under this one: the child's prefix is
    /// concatenated onto this scope's, this scope's state precedes the
    /// child's own, and this scope's middleware is prepended to the
    /// child's.
    pub fn serve(mut self, child: Scope) -> Self {
        self.children.push(Node::Scope(child));
        self
    }

    /// Flatten the scope tree into routes and build the router.
    pub fn finish(self) -> Result<Router, Error> {
        let mut builder = RouterBuilder::new();
        flatten(
            &self,
            &Pattern::parse_scope("").expect("empty prefix"),
            &StateList::new(),
            &[],
            &mut builder,
        )?;
        Ok(builder.build())
    }
}

fn flatten(
    scope: &Scope,
    parent_prefix: &Pattern,
    parent_state: &StateList,
    parent_middleware: &[Arc<dyn Middleware>],
    builder: &mut RouterBuilder,
) -> Result<(), Error> {
    let prefix = Pattern::join(parent_prefix, &scope.prefix);

    let mut state = parent_state.clone();
    state.extend(&scope.state);

    let mut middleware = parent_middleware.to_vec();
    middleware.extend(scope.middleware.iter().cloned());

    for child in &scope.children {
        match child {
            Node::Route {
                method,
                pattern,
                service,
            } => {
                let full_pattern = Pattern::join(&prefix, pattern);
                let composed = route::compose(service.clone(), &middleware);
                let route = Route::new(*method, full_pattern, state.clone(), composed);
                builder.insert(route)?;
            }
            Node::Scope(inner) => {
                flatten(inner, &prefix, &state, &middleware, builder)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::response::Response;

    async fn hello() -> Response {
        Response::new(200).text("hello")
    }

    #[test]
    fn builds_and_looks_up_nested_scope() {
        let api = Scope::new("/api").unwrap().get("/hello", hello).unwrap();
        let root = Scope::root().serve(api);
        let router = root.finish().unwrap();
        assert!(router.lookup(Method::Get, "/api/hello").is_some());
        assert!(router.lookup(Method::Get, "/hello").is_none());
    }

    #[tokio::test]
    async fn state_precedence_follows_scope_chain() {
        let inner = Scope::new("/route")
            .unwrap()
            .state("route")
            .get("/", hello)
            .unwrap();
        let sibling = Scope::new("/scope-only").unwrap().get("/", hello).unwrap();
        let api = Scope::new("/api")
            .unwrap()
            .state("scope")
            .serve(inner)
            .serve(sibling);
        let root = Scope::root().state("global").serve(api);
        let router = root.finish().unwrap();

        let matched = router.lookup(Method::Get, "/api/route/").unwrap();
        assert_eq!(*matched.route.state().get::<&str>().unwrap(), "route");

        let matched = router.lookup(Method::Get, "/api/scope-only/").unwrap();
        assert_eq!(*matched.route.state().get::<&str>().unwrap(), "scope");

        let _ = Request::new(
            Method::Get,
            "/".to_string(),
            1,
            crate::headers::HeaderMap::new(),
            crate::request::ConnectionInfo {
                peer_addr: "127.0.0.1:1".parse().unwrap(),
                local_addr: "127.0.0.1:2".parse().unwrap(),
            },
        );
    }
}
