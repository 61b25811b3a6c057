mod trie;

use crate::config::ConflictPolicy;
use crate::error::RouteError;
use crate::handler::HandlerFunc;
use crate::http::Method;
use std::collections::{HashMap, HashSet};
use trie::Node;

/// A resolved route: the registered pattern and the parameters bound from
/// the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'r> {
    pub pattern: &'r str,
    pub params: HashMap<String, String>,
}

/// Splits a pattern or request path into segments.
///
/// Empty segments are dropped and splitting stops right after the first
/// segment starting with `*`, so `/static/*filepath/x` yields
/// `["static", "*filepath"]`.
pub fn parse_pattern(pattern: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for item in pattern.split('/').filter(|item| !item.is_empty()) {
        parts.push(item);
        if item.starts_with('*') {
            break;
        }
    }
    parts
}

fn validate_pattern(pattern: &str) -> Result<(), RouteError> {
    if !pattern.starts_with('/') {
        return Err(RouteError::invalid(pattern, "pattern must start with `/`"));
    }

    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut names = HashSet::new();
    for (index, segment) in segments.iter().enumerate() {
        if segment.starts_with('*') && index + 1 != segments.len() {
            return Err(RouteError::invalid(
                pattern,
                format!("catch-all `{}` must be the last segment", segment),
            ));
        }
        if *segment == ":" {
            return Err(RouteError::invalid(pattern, "parameter name must not be empty"));
        }
        if trie::is_wild_segment(segment) && segment.len() > 1 && !names.insert(&segment[1..]) {
            return Err(RouteError::invalid(
                pattern,
                format!("duplicate parameter name `{}`", &segment[1..]),
            ));
        }
    }
    Ok(())
}

/// One prefix tree per HTTP method plus the handler table keyed by
/// `(method, pattern)`.
#[derive(Clone, Default)]
pub struct Router {
    roots: HashMap<Method, Node>,
    handlers: HashMap<(Method, String), HandlerFunc>,
    policy: ConflictPolicy,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub(crate) fn set_policy(&mut self, policy: ConflictPolicy) {
        self.policy = policy;
    }

    /// Registers `handler` for `method` and `pattern`.
    ///
    /// Registering the same pattern twice replaces the handler and leaves the
    /// tree as it was. Under [`ConflictPolicy::Strict`] a pattern whose
    /// literal segment would be absorbed by an existing wildcard is rejected
    /// and nothing is changed.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: HandlerFunc,
    ) -> Result<(), RouteError> {
        validate_pattern(pattern)?;
        let parts = parse_pattern(pattern);

        if let Some(absorption) = self.roots.get(&method).and_then(|root| root.find_absorption(&parts)) {
            match self.policy {
                ConflictPolicy::Strict => {
                    return Err(RouteError::Conflict {
                        pattern: pattern.to_string(),
                        existing: absorption.existing,
                        segment: absorption.segment,
                    });
                }
                ConflictPolicy::FirstMatch => {
                    tracing::warn!(
                        %method,
                        pattern,
                        existing = %absorption.existing,
                        segment = %absorption.segment,
                        "literal segment absorbed by an existing wildcard"
                    );
                }
            }
        }

        self.roots
            .entry(method)
            .or_default()
            .insert(pattern, &parts, 0);
        self.handlers.insert((method, pattern.to_string()), handler);
        Ok(())
    }

    /// Resolves `path` against the tree for `method`.
    ///
    /// Parameter names come from the matched pattern, not from the request,
    /// so `/p/:lang/doc` matched by `/p/go/doc` binds `lang = "go"` and
    /// `/static/*filepath` matched by `/static/css/a.css` binds
    /// `filepath = "css/a.css"`.
    pub fn get_route(&self, method: Method, path: &str) -> Option<RouteMatch<'_>> {
        let search_parts = parse_pattern(path);
        let root = self.roots.get(&method)?;
        let node = root.search(&search_parts, 0)?;
        let pattern = node.pattern.as_deref()?;

        let mut params = HashMap::new();
        for (index, part) in parse_pattern(pattern).into_iter().enumerate() {
            if let Some(name) = part.strip_prefix(':') {
                if let Some(value) = search_parts.get(index) {
                    params.insert(name.to_string(), value.to_string());
                }
            } else if let Some(name) = part.strip_prefix('*') {
                if !name.is_empty() {
                    let rest = search_parts.get(index..).unwrap_or_default();
                    params.insert(name.to_string(), rest.join("/"));
                }
            }
        }

        Some(RouteMatch { pattern, params })
    }

    pub fn handler(&self, method: Method, pattern: &str) -> Option<&HandlerFunc> {
        self.handlers.get(&(method, pattern.to_string()))
    }

    /// Registered patterns for `method`, depth-first in insertion order.
    pub fn routes(&self, method: Method) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(root) = self.roots.get(&method) {
            root.patterns(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use std::sync::Arc;

    fn noop() -> HandlerFunc {
        Arc::new(|_c: &mut Context| {})
    }

    fn new_test_router() -> Router {
        let mut r = Router::new();
        r.add_route(Method::GET, "/", noop()).unwrap();
        r.add_route(Method::GET, "/hello/:name", noop()).unwrap();
        r.add_route(Method::GET, "/hello/b/c", noop()).unwrap();
        r.add_route(Method::GET, "/hi/:name", noop()).unwrap();
        r.add_route(Method::GET, "/assets/*filepath", noop()).unwrap();
        r
    }

    #[test]
    fn test_parse_pattern() {
        assert_eq!(parse_pattern("/p/:name"), vec!["p", ":name"]);
        assert_eq!(parse_pattern("/p/*"), vec!["p", "*"]);
        assert_eq!(parse_pattern("/p/*name/*"), vec!["p", "*name"]);
        assert_eq!(parse_pattern("//a///b/"), vec!["a", "b"]);
        assert!(parse_pattern("/").is_empty());
    }

    #[test]
    fn test_get_route_binds_named_param() {
        let r = new_test_router();
        let m = r.get_route(Method::GET, "/hello/geektutu").unwrap();
        assert_eq!(m.pattern, "/hello/:name");
        assert_eq!(m.params.get("name").map(String::as_str), Some("geektutu"));
    }

    #[test]
    fn test_get_route_binds_catch_all() {
        let r = new_test_router();
        let m = r.get_route(Method::GET, "/assets/css/site.css").unwrap();
        assert_eq!(m.pattern, "/assets/*filepath");
        assert_eq!(m.params.get("filepath").map(String::as_str), Some("css/site.css"));
    }

    #[test]
    fn test_param_round_trip() {
        let mut r = Router::new();
        r.add_route(Method::GET, "/p/:lang/doc", noop()).unwrap();
        let m = r.get_route(Method::GET, "/p/go/doc").unwrap();
        let expected: HashMap<String, String> = [("lang".to_string(), "go".to_string())].into();
        assert_eq!(m.params, expected);
    }

    #[test]
    fn test_anonymous_catch_all_binds_nothing() {
        let mut r = Router::new();
        r.add_route(Method::GET, "/files/*", noop()).unwrap();
        let m = r.get_route(Method::GET, "/files/a/b").unwrap();
        assert_eq!(m.pattern, "/files/*");
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_miss_on_unknown_method_or_path() {
        let r = new_test_router();
        assert!(r.get_route(Method::POST, "/").is_none());
        assert!(r.get_route(Method::GET, "/nope").is_none());
        assert!(r.get_route(Method::GET, "/hello").is_none());
        assert!(r.get_route(Method::GET, "/hello/a/b/c").is_none());
    }

    #[test]
    fn test_absorbed_literal_matches_by_pattern() {
        let r = new_test_router();
        let m = r.get_route(Method::GET, "/hello/b/c").unwrap();
        assert_eq!(m.pattern, "/hello/b/c");
        assert!(m.params.is_empty());
        assert!(r.handler(Method::GET, m.pattern).is_some());
    }

    #[test]
    fn test_strict_policy_rejects_absorption() {
        let mut r = Router::with_policy(ConflictPolicy::Strict);
        r.add_route(Method::GET, "/hello/:name", noop()).unwrap();
        let err = r.add_route(Method::GET, "/hello/b/c", noop()).unwrap_err();
        assert_eq!(
            err,
            RouteError::Conflict {
                pattern: "/hello/b/c".to_string(),
                existing: ":name".to_string(),
                segment: "b".to_string(),
            }
        );
        assert!(r.handler(Method::GET, "/hello/b/c").is_none());
        assert_eq!(r.routes(Method::GET), vec!["/hello/:name"]);

        // same wildcard token and other methods are fine
        r.add_route(Method::GET, "/hello/:name/c", noop()).unwrap();
        r.add_route(Method::POST, "/hello/b/c", noop()).unwrap();
    }

    #[test]
    fn test_invalid_patterns() {
        let mut r = Router::new();
        for pattern in ["/a/*rest/b", "no-slash", "/a/:", "/a/:id/:id"] {
            assert!(
                matches!(r.add_route(Method::GET, pattern, noop()), Err(RouteError::InvalidPattern { .. })),
                "{pattern} should be rejected"
            );
        }
        assert!(r.routes(Method::GET).is_empty());
    }

    #[test]
    fn test_reregistration_replaces_handler() {
        let mut r = Router::new();
        let first = noop();
        let second = noop();
        r.add_route(Method::GET, "/p/:lang", first.clone()).unwrap();
        r.add_route(Method::GET, "/p/:lang", second.clone()).unwrap();

        assert_eq!(r.routes(Method::GET), vec!["/p/:lang"]);
        let stored = r.handler(Method::GET, "/p/:lang").unwrap();
        assert!(Arc::ptr_eq(stored, &second));
        assert!(!Arc::ptr_eq(stored, &first));
        assert_eq!(r.get_route(Method::GET, "/p/rust").unwrap().pattern, "/p/:lang");
    }
}
