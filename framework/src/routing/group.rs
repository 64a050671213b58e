//! Route grouping with a shared pattern prefix

use super::{RouteBuilder, Router};

impl Router {
    /// Register a group of routes under a shared prefix
    ///
    /// Routes keep their relative order and are appended where the group is
    /// declared, so first-match-wins still follows the source order.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// Router::new()
    ///     .group("admin", |r| {
    ///         r.get::<AdminController>("", "dashboard")       // -> admin
    ///          .get::<AdminController>("post/{id}", "edit")   // -> admin/post/{id}
    ///          .post::<AdminController>("post/{id}", "save")
    ///     })
    /// ```
    pub fn group<F, R>(mut self, prefix: &str, builder_fn: F) -> Router
    where
        F: FnOnce(Router) -> R,
        R: Into<Router>,
    {
        let inner: Router = builder_fn(Router::new()).into();
        self.extend(
            inner
                .into_routes()
                .into_iter()
                .map(|route| route.with_prefix(prefix)),
        );
        self
    }
}

// Allow RouteBuilder to chain into groups
impl RouteBuilder {
    /// Create a route group with a shared prefix
    pub fn group<F, R>(self, prefix: &str, builder_fn: F) -> Router
    where
        F: FnOnce(Router) -> R,
        R: Into<Router>,
    {
        self.router.group(prefix, builder_fn)
    }
}

#[cfg(test)]
mod tests {
    use super::super::router::tests::route;
    use super::super::Verb;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_group_prefixes_patterns() {
        let router = Router::new()
            .add(route(Verb::Get, "", "Home", "index"))
            .group("admin", |r| {
                r.add(route(Verb::Get, "", "Admin", "dashboard"))
                    .add(route(Verb::Get, "post/{id}", "Admin", "edit"))
                    .name("admin.edit")
            });

        let patterns: Vec<&str> = router.routes().iter().map(|r| r.pattern().as_str()).collect();
        assert_eq!(patterns, vec!["", "admin", "admin/post/{id}"]);

        let matched = router.match_path("/admin/post/3").unwrap();
        assert_eq!(matched.method(), "edit");
        assert_eq!(matched.params(), ["3".to_string()]);
        assert_eq!(
            router.url("admin.edit", &[("id", "3")]),
            Some("/admin/post/3".to_string())
        );
    }

    #[test]
    fn test_nested_groups() {
        let router = Router::new().group("/api/", |r| {
            r.group("v1", |r| r.add(route(Verb::Get, "posts", "Api", "index")))
        });

        assert_eq!(router.routes()[0].pattern().as_str(), "api/v1/posts");
    }
}
