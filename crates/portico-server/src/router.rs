//! Method + path-template routing.
//!
//! Routes are declared with `{name}` parameter segments, e.g.
//! `/api/tasks/{id}`. Matching is first-registered-wins.

use http::Method;
use portico_core::Param;
use portico_middleware::Chain;
use std::sync::Arc;

/// A segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug)]
struct Route {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    chain: Arc<Chain>,
}

impl Route {
    fn new(method: Method, pattern: &str, chain: Arc<Chain>) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .map_or_else(
                        || Segment::Literal(s.to_string()),
                        |name| Segment::Param(name.to_string()),
                    )
            })
            .collect();
        Self {
            method,
            pattern: pattern.to_string(),
            segments,
            chain,
        }
    }

    fn match_path(&self, path: &str) -> Option<Vec<Param>> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(expected) => {
                    if expected != part {
                        return None;
                    }
                }
                Segment::Param(name) => params.push(Param::new(name.clone(), (*part).to_string())),
            }
        }
        Some(params)
    }
}

/// A matched route: the template it was declared with, the chain to run,
/// and the extracted path parameters.
#[derive(Debug)]
pub struct RouteMatch<'r> {
    pattern: &'r str,
    chain: &'r Arc<Chain>,
    params: Vec<Param>,
}

impl RouteMatch<'_> {
    /// Returns the declared path template.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern
    }

    /// Returns the chain registered for the route.
    #[must_use]
    pub fn chain(&self) -> &Arc<Chain> {
        self.chain
    }

    /// Consumes the match into its extracted parameters.
    #[must_use]
    pub fn into_params(self) -> Vec<Param> {
        self.params
    }
}

/// Maps method + concrete path to the [`Chain`] that should serve it.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a chain under a method and path template.
    pub fn add(&mut self, method: Method, pattern: &str, chain: Arc<Chain>) {
        self.routes.push(Route::new(method, pattern, chain));
    }

    /// Matches a request. The first registered route that fits wins.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.match_path(path).map(|params| RouteMatch {
                    pattern: &route.pattern,
                    chain: &route.chain,
                    params,
                })
            })
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::Ping;

    fn chain() -> Arc<Chain> {
        Arc::new(Chain::new(Ping))
    }

    #[test]
    fn test_literal_match() {
        let mut router = Router::new();
        router.add(Method::GET, "/api/tasks", chain());

        let matched = router.match_route(&Method::GET, "/api/tasks").unwrap();
        assert_eq!(matched.pattern(), "/api/tasks");
        assert!(matched.into_params().is_empty());
    }

    #[test]
    fn test_param_extraction() {
        let mut router = Router::new();
        router.add(Method::GET, "/api/tasks/{id}", chain());

        let matched = router.match_route(&Method::GET, "/api/tasks/42").unwrap();
        let params = matched.into_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].key(), "id");
        assert_eq!(params[0].value(), "42");
    }

    #[test]
    fn test_method_is_part_of_the_key() {
        let mut router = Router::new();
        router.add(Method::GET, "/api/tasks", chain());

        assert!(router.match_route(&Method::POST, "/api/tasks").is_none());
    }

    #[test]
    fn test_segment_count_must_match() {
        let mut router = Router::new();
        router.add(Method::GET, "/api/tasks/{id}", chain());

        assert!(router.match_route(&Method::GET, "/api/tasks").is_none());
        assert!(router
            .match_route(&Method::GET, "/api/tasks/42/extra")
            .is_none());
    }

    #[test]
    fn test_first_registered_route_wins() {
        let mut router = Router::new();
        router.add(Method::GET, "/api/tasks/{id}", chain());
        router.add(Method::GET, "/api/tasks/stats", chain());

        // "/api/tasks/stats" also fits the earlier parameterized route.
        let matched = router.match_route(&Method::GET, "/api/tasks/stats").unwrap();
        assert_eq!(matched.pattern(), "/api/tasks/{id}");
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let mut router = Router::new();
        router.add(Method::GET, "/api/tasks", chain());

        assert!(router.match_route(&Method::GET, "/api/tasks/").is_some());
    }
}
