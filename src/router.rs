//! The route trie: method dispatch over compiled path patterns with a
//! deterministic tie-break order.
//!
//! Nodes are keyed by whole path segment rather than arbitrary byte runs:
//! a segment-keyed trie gives the same lookup result as a fully
//! byte-compressed radix trie (no two entries ever share a literal
//! segment, since distinct `HashMap` keys can't collide) while staying
//! simple to build and reorder. The reachable-route-count reordering pass
//! still applies, just at segment granularity.

use std::collections::HashMap;
use std::fmt;

use crate::error::Error;
use crate::method::Method;
use crate::path::Token;
use crate::route::Route;

#[derive(Default)]
struct MethodMap {
    exact: HashMap<Method, Route>,
    any: Option<Route>,
}

impl MethodMap {
    fn insert(&mut self, route: Route) -> Result<(), Error> {
        if route.method() == Method::Any {
            if self.any.is_some() {
                return Err(Error::RouteAlreadyExists {
                    method: "ANY".to_string(),
                    pattern: route.pattern().source().to_string(),
                });
            }
            self.any = Some(route);
        } else {
            if self.exact.contains_key(&route.method()) {
                return Err(Error::RouteAlreadyExists {
                    method: route.method().to_string(),
                    pattern: route.pattern().source().to_string(),
                });
            }
            self.exact.insert(route.method(), route);
        }
        Ok(())
    }

    /// Tie-break: exact-method match beats ANY.
    fn lookup(&self, method: Method) -> Option<&Route> {
        self.exact.get(&method).or(self.any.as_ref())
    }

    fn reachable_count(&self) -> usize {
        self.exact.len() + self.any.is_some() as usize
    }
}

#[derive(Default)]
struct Node {
    static_children: Vec<(String, Node)>,
    param_child: Option<Box<ParamChild>>,
    wildcard: Option<WildcardChild>,
    here: MethodMap,
}

struct ParamChild {
    name: String,
    node: Node,
}

struct WildcardChild {
    name: String,
    methods: MethodMap,
}

impl Node {
    fn insert(&mut self, tokens: &[Token], route: Route) -> Result<(), Error> {
        match tokens.split_first() {
            None => self.here.insert(route),
            Some((Token::Static(seg), rest)) => {
                if let Some((_, child)) = self.static_children.iter_mut().find(|(s, _)| s == seg)
                {
                    return child.insert(rest, route);
                }
                let mut child = Node::default();
                child.insert(rest, route)?;
                self.static_children.push((seg.clone(), child));
                Ok(())
            }
            Some((Token::Param(name), rest)) => {
                if self.param_child.is_none() {
                    self.param_child = Some(Box::new(ParamChild {
                        name: name.clone(),
                        node: Node::default(),
                    }));
                }
                let child = self.param_child.as_mut().expect("just inserted");
                child.node.insert(rest, route)
            }
            Some((Token::Wildcard(name), _rest)) => {
                let entry = self.wildcard.get_or_insert_with(|| WildcardChild {
                    name: name.clone(),
                    methods: MethodMap::default(),
                });
                entry.methods.insert(route)
            }
        }
    }

    /// Walk `segments` against this subtree in tie-break order: static
    /// children first, then the parameter child, then the wildcard.
    fn lookup<'r>(
        &'r self,
        segments: &[&str],
        method: Method,
    ) -> Option<(&'r Route, Vec<(String, String)>)> {
        match segments.split_first() {
            None => self.here.lookup(method).map(|route| (route, Vec::new())),
            Some((seg, rest)) => {
                if let Some((_, child)) = self.static_children.iter().find(|(s, _)| s == seg) {
                    if let Some(hit) = child.lookup(rest, method) {
                        return Some(hit);
                    }
                }
                if let Some(param) = &self.param_child {
                    if !seg.is_empty() {
                        if let Some((route, mut params)) = param.node.lookup(rest, method) {
                            params.insert(0, (param.name.clone(), seg.to_string()));
                            return Some((route, params));
                        }
                    }
                }
                if let Some(wc) = &self.wildcard {
                    if let Some(route) = wc.methods.lookup(method) {
                        let tail = segments.join("/");
                        return Some((route, vec![(wc.name.clone(), tail)]));
                    }
                }
                None
            }
        }
    }

    fn reorder(&mut self) {
        for (_, child) in self.static_children.iter_mut() {
            child.reorder();
        }
        if let Some(p) = &mut self.param_child {
            p.node.reorder();
        }
        self.static_children.sort_by(|a, b| {
            b.1.reachable_count()
                .cmp(&a.1.reachable_count())
                .then_with(|| a.0.cmp(&b.0))
        });
    }

    fn reachable_count(&self) -> usize {
        let mut count = self.here.reachable_count();
        for (_, child) in &self.static_children {
            count += child.reachable_count();
        }
        if let Some(p) = &self.param_child {
            count += p.node.reachable_count();
        }
        if let Some(wc) = &self.wildcard {
            count += wc.methods.reachable_count();
        }
        count
    }
}

/// The immutable, built router. Construction happens through
/// [`RouterBuilder`]; the router itself is cheap to share across
/// connection tasks behind an `Arc`.
pub struct Router {
    root: Node,
}

/// Result of a successful lookup: the matched route and its captured path
/// parameters in pattern order (outer scope parameters precede inner
/// ones, since they were matched first).
pub struct Matched<'r> {
    pub route: &'r Route,
    pub params: Vec<(String, String)>,
}

impl Router {
    pub fn lookup(&self, method: Method, path: &str) -> Option<Matched<'_>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (route, params) = self.root.lookup(&segments, method)?;
        Some(Matched { route, params })
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").finish_non_exhaustive()
    }
}

/// Accumulates routes (inserted with a validated pattern) then builds an
/// immutable [`Router`], running the reachable-route-count reordering
/// pass over static children.
#[derive(Default)]
pub struct RouterBuilder {
    root: Node,
}

impl RouterBuilder {
    pub fn new() -> Self {
        RouterBuilder::default()
    }

    pub fn insert(&mut self, route: Route) -> Result<(), Error> {
        let tokens: Vec<Token> = route.pattern().tokens().to_vec();
        self.root.insert(&tokens, route)
    }

    pub fn build(mut self) -> Router {
        self.root.reorder();
        Router { root: self.root }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Pattern;
    use crate::request::Request;
    use crate::response::Response;
    use crate::service::{BoxFuture, Service};
    use crate::state::StateList;

    struct Stub(u32);

    impl Service for Stub {
        fn call<'a>(&'a self, _req: Request) -> BoxFuture<'a, Response> {
            let id = self.0;
            Box::pin(async move { Response::new(200).text(id.to_string()) })
        }
    }

    fn route(method: Method, pattern: &str, id: u32) -> Route {
        Route::new(
            method,
            Pattern::parse(pattern).unwrap(),
            StateList::new(),
            std::sync::Arc::new(Stub(id)),
        )
    }

    #[test]
    fn static_beats_param_beats_wildcard() {
        let mut b = RouterBuilder::new();
        b.insert(route(Method::Get, "/api/v1/x", 10)).unwrap();
        b.insert(route(Method::Get, "/api/v1/{x}", 12)).unwrap();
        b.insert(route(Method::Get, "/api/v1/x/y", 20)).unwrap();
        b.insert(route(Method::Get, "/api/v1/x/{y}", 21)).unwrap();
        b.insert(route(Method::Get, "/api/v1/{x}/y", 22)).unwrap();
        b.insert(route(Method::Get, "/api/v1/{x}/{y}", 23))
            .unwrap();
        let router = b.build();

        let hit = |p: &str| router.lookup(Method::Get, p).unwrap().route.pattern().source().to_string();
        assert_eq!(hit("/api/v1/x/y"), "/api/v1/x/y");
        assert_eq!(hit("/api/v1/xx/y"), "/api/v1/{x}/y");
        assert_eq!(hit("/api/v1/x/yy"), "/api/v1/x/{y}");
    }

    #[test]
    fn exact_method_beats_any() {
        let mut b = RouterBuilder::new();
        b.insert(route(Method::Any, "/ping", 1)).unwrap();
        b.insert(route(Method::Get, "/ping", 2)).unwrap();
        let router = b.build();
        assert_eq!(router.lookup(Method::Get, "/ping").unwrap().route.method(), Method::Get);
        assert_eq!(router.lookup(Method::Post, "/ping").unwrap().route.method(), Method::Any);
    }

    #[test]
    fn duplicate_route_rejected() {
        let mut b = RouterBuilder::new();
        b.insert(route(Method::Get, "/x", 1)).unwrap();
        let err = b.insert(route(Method::Get, "/x", 2)).unwrap_err();
        assert!(matches!(err, Error::RouteAlreadyExists { .. }));
    }

    #[test]
    fn route_miss_returns_none() {
        let mut b = RouterBuilder::new();
        b.insert(route(Method::Get, "/x", 1)).unwrap();
        let router = b.build();
        assert!(router.lookup(Method::Get, "/y").is_none());
    }
}
