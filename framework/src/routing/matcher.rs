//! Segment matcher: path in, first matching route plus captured params out

use super::route::{RouteDefinition, Verb};
use crate::container::ServiceKey;

/// Trim one trailing `/`, then the leading `/` if anything is left after it
///
/// `""` and `"/"` both normalize to `""`, a single empty segment. `"//"`
/// keeps one slash and so splits into two empty segments.
pub fn normalize(path: &str) -> &str {
    let path = path.strip_suffix('/').unwrap_or(path);
    match path.strip_prefix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => path,
    }
}

/// Split a request path into the segments patterns are compared against
pub fn segments(path: &str) -> Vec<&str> {
    normalize(path).split('/').collect()
}

/// The route a path matched and the values its placeholders captured
#[derive(Debug, Clone)]
pub struct RouteMatch<'r> {
    route: &'r RouteDefinition,
    params: Vec<String>,
}

impl<'r> RouteMatch<'r> {
    pub fn route(&self) -> &'r RouteDefinition {
        self.route
    }

    pub fn handler_key(&self) -> &'r ServiceKey {
        self.route.handler()
    }

    pub fn method(&self) -> &'r str {
        self.route.method()
    }

    pub fn verb(&self) -> Verb {
        self.route.verb()
    }

    /// Captured values, `params()[i]` being the i-th placeholder left to right
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn into_params(self) -> Vec<String> {
        self.params
    }
}

/// Walk `routes` in order and return the first whose pattern fits `path`
///
/// Segment count is the only candidacy test; there is no specificity ranking,
/// so an earlier `post/{id}` shadows a later `post/new`.
pub fn match_route<'r, I>(routes: I, path: &str) -> Option<RouteMatch<'r>>
where
    I: IntoIterator<Item = &'r RouteDefinition>,
{
    let path = segments(path);
    routes.into_iter().find_map(|route| {
        route
            .pattern()
            .captures(&path)
            .map(|params| RouteMatch { route, params })
    })
}
