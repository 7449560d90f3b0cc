//! Type-indexed shared state storage, searched outer-to-inner.

use std::any::{Any, TypeId};
use std::sync::Arc;

/// An ordered list of type-erased shared values, outer (framework/server or
/// an enclosing scope) entries first, inner (nested scope or route) entries
/// last. Lookup scans front-to-back and returns the first type match, so an
/// inner `state(...)` call shadows an outer one of the same type.
#[derive(Clone, Default)]
pub struct StateList {
    entries: Vec<Arc<dyn Any + Send + Sync>>,
}

impl StateList {
    pub fn new() -> Self {
        StateList {
            entries: Vec::new(),
        }
    }

    /// Append a new state value, becoming the new outermost entry.
    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.entries.push(Arc::new(value));
    }

    /// Concatenate `self` (outer) before `inner`'s own entries, used when a
    /// scope composes its state list into a child's.
    pub fn extend(&mut self, inner: &StateList) {
        self.entries.extend(inner.entries.iter().cloned());
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let target = TypeId::of::<T>();
        self.entries
            .iter()
            .rev()
            .find(|v| (**v).type_id() == target)
            .and_then(|v| v.clone().downcast::<T>().ok())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for StateList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateList")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);
    #[derive(Debug, PartialEq)]
    struct Name(&'static str);

    #[test]
    fn finds_by_type() {
        let mut s = StateList::new();
        s.push(Counter(1));
        s.push(Name("a"));
        assert_eq!(*s.get::<Counter>().unwrap(), Counter(1));
        assert_eq!(*s.get::<Name>().unwrap(), Name("a"));
    }

    #[test]
    fn inner_shadows_outer_of_same_type() {
        let mut outer = StateList::new();
        outer.push(Counter(1));
        let mut inner = StateList::new();
        inner.push(Counter(2));
        outer.extend(&inner);
        assert_eq!(*outer.get::<Counter>().unwrap(), Counter(2));
    }

    #[test]
    fn missing_type_is_none() {
        let s = StateList::new();
        assert!(s.get::<Counter>().is_none());
    }
}
