//! Routing abstraction layer.
//!
//! A lookup from a key to a registered value. The protocol router keys on
//! [`Scheme`](crate::Scheme); the path router keys on the request path. Both
//! are built once at start-up and only read afterwards.

/// Result of a routing lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResult<'a, V> {
    /// Route matched, contains the value.
    Matched(&'a V),
    /// No matching route found.
    NotFound,
}

impl<'a, V> RouteResult<'a, V> {
    /// Returns true if the route was matched.
    pub fn is_matched(&self) -> bool {
        matches!(self, RouteResult::Matched(_))
    }

    /// Returns the matched value, if any.
    pub fn matched(self) -> Option<&'a V> {
        match self {
            RouteResult::Matched(v) => Some(v),
            RouteResult::NotFound => None,
        }
    }
}

impl<'a, V> From<Option<&'a V>> for RouteResult<'a, V> {
    fn from(value: Option<&'a V>) -> Self {
        match value {
            Some(v) => RouteResult::Matched(v),
            None => RouteResult::NotFound,
        }
    }
}

/// A router that maps keys to values.
pub trait Router<K: ?Sized, V>: Send + Sync + 'static {
    /// Look up a value by key.
    fn lookup(&self, key: &K) -> RouteResult<'_, V>;

    /// Check if a key has a route.
    fn contains(&self, key: &K) -> bool {
        self.lookup(key).is_matched()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_result_helpers() {
        let val = 42;
        let matched = RouteResult::Matched(&val);
        let not_found: RouteResult<i32> = RouteResult::NotFound;

        assert!(matched.is_matched());
        assert!(!not_found.is_matched());

        assert_eq!(matched.matched(), Some(&42));
        assert_eq!(not_found.matched(), None);
    }

    #[test]
    fn test_from_option() {
        let val = "chain";
        assert_eq!(RouteResult::from(Some(&val)), RouteResult::Matched(&val));
        assert_eq!(RouteResult::<&str>::from(None), RouteResult::NotFound);
    }
}
