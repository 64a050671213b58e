use super::matcher::{match_route, RouteMatch};
use super::route::{RouteDefinition, Verb};
use crate::dispatch::{invoke, Controller};
use crate::error::DispatchError;

/// Ordered route table
///
/// Built once at bootstrap and shared read-only afterwards. Matching walks the
/// table in registration order and the first structural match wins, even when
/// a later route is more specific. Register `post/new` before `post/{id}`.
///
/// # Example
///
/// ```rust,ignore
/// Router::new()
///     .get::<HomeController>("", "index").name("home")
///     .get::<PostController>("post/{id}", "show").name("posts.show")
///     .post::<PostController>("post/{id}/comment", "comment")
/// ```
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<RouteDefinition>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a GET route handled by `C::method(params)`
    pub fn get<C: Controller>(self, pattern: &str, method: &str) -> RouteBuilder {
        self.add(RouteDefinition::new(
            Verb::Get,
            pattern,
            C::key(),
            method,
            invoke::<C>,
        ))
    }

    /// Register a POST route handled by `C::method(body, first_param)`
    pub fn post<C: Controller>(self, pattern: &str, method: &str) -> RouteBuilder {
        self.add(RouteDefinition::new(
            Verb::Post,
            pattern,
            C::key(),
            method,
            invoke::<C>,
        ))
    }

    /// Append a prebuilt definition
    pub fn add(mut self, route: RouteDefinition) -> RouteBuilder {
        self.routes.push(route);
        RouteBuilder { router: self }
    }

    pub(crate) fn extend(&mut self, routes: impl IntoIterator<Item = RouteDefinition>) {
        self.routes.extend(routes);
    }

    pub(crate) fn into_routes(self) -> Vec<RouteDefinition> {
        self.routes
    }

    /// Definitions in registration order
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// First route whose segment structure fits `path`, regardless of verb
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        match_route(&self.routes, path)
    }

    /// First route for `verb` whose segment structure fits `path`
    ///
    /// A path that only fits routes declared for the other verb is
    /// `MethodNotSupported`; a path that fits nothing is `RouteNotFound`.
    pub fn match_request(&self, verb: Verb, path: &str) -> Result<RouteMatch<'_>, DispatchError> {
        if let Some(matched) = match_route(self.routes.iter().filter(|r| r.verb() == verb), path) {
            return Ok(matched);
        }

        if self.match_path(path).is_some() {
            Err(DispatchError::MethodNotSupported {
                verb: verb.to_string(),
                path: path.to_string(),
            })
        } else {
            Err(DispatchError::RouteNotFound {
                path: path.to_string(),
            })
        }
    }

    /// The route registered under `name`; a later registration shadows an earlier one
    pub fn named(&self, name: &str) -> Option<&RouteDefinition> {
        self.routes.iter().rev().find(|r| r.name() == Some(name))
    }

    /// Generate a URL for a named route
    ///
    /// # Returns
    /// * `Some(String)` - The URL with every placeholder substituted
    /// * `None` - If the name is unknown or a placeholder has no value
    ///
    /// # Example
    /// ```rust,ignore
    /// let url = router.url("posts.show", &[("id", "42")]);
    /// assert_eq!(url, Some("/post/42".to_string()));
    /// ```
    pub fn url(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        self.named(name)?.pattern().fill(params)
    }
}

/// Builder returned after registering a route, enabling .name() chaining
pub struct RouteBuilder {
    pub(crate) router: Router,
}

impl RouteBuilder {
    /// Name the most recently registered route
    pub fn name(mut self, name: &str) -> Router {
        if let Some(route) = self.router.routes.last_mut() {
            route.set_name(name);
        }
        self.router
    }

    /// Register a GET route (for chaining without .name())
    pub fn get<C: Controller>(self, pattern: &str, method: &str) -> RouteBuilder {
        self.router.get::<C>(pattern, method)
    }

    /// Register a POST route (for chaining without .name())
    pub fn post<C: Controller>(self, pattern: &str, method: &str) -> RouteBuilder {
        self.router.post::<C>(pattern, method)
    }

    pub fn add(self, route: RouteDefinition) -> RouteBuilder {
        self.router.add(route)
    }
}

impl From<RouteBuilder> for Router {
    fn from(builder: RouteBuilder) -> Self {
        builder.router
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::container::{Container, ServiceKey};
    use crate::dispatch::Invoker;
    use crate::http::{HttpResponse, RequestContext, Response};
    use pretty_assertions::assert_eq;

    fn noop(
        _: &mut Container,
        _: &RouteMatch<'_>,
        _: &mut RequestContext,
    ) -> Result<Response, DispatchError> {
        Ok(Ok(HttpResponse::text("ok")))
    }

    pub(crate) fn route(verb: Verb, pattern: &str, handler: &'static str, method: &str) -> RouteDefinition {
        let invoker: Invoker = noop;
        RouteDefinition::new(verb, pattern, ServiceKey::from(handler), method, invoker)
    }

    fn blog() -> Router {
        Router::new()
            .add(route(Verb::Get, "", "Home", "index"))
            .name("home")
            .add(route(Verb::Get, "user/{id}", "User", "show"))
            .name("users.show")
            .add(route(Verb::Post, "user/{id}", "User", "update"))
            .into()
    }

    #[test]
    fn test_matches_user_route_with_param() {
        let router = blog();
        let matched = router.match_path("/user/42").unwrap();

        assert_eq!(matched.handler_key().as_str(), "User");
        assert_eq!(matched.method(), "show");
        assert_eq!(matched.verb(), Verb::Get);
        assert_eq!(matched.params(), ["42".to_string()]);
    }

    #[test]
    fn test_unknown_path_is_no_route() {
        let router = blog();
        assert!(router.match_path("/unknown").is_none());

        let err = router.match_request(Verb::Get, "/unknown").unwrap_err();
        assert!(matches!(err, DispatchError::RouteNotFound { path } if path == "/unknown"));
    }

    #[test]
    fn test_empty_and_slash_match_home_identically() {
        let router = blog();
        let empty = router.match_path("").unwrap();
        let slash = router.match_path("/").unwrap();

        assert_eq!(empty.method(), "index");
        assert_eq!(slash.method(), "index");
        assert!(empty.params().is_empty());
        assert!(slash.params().is_empty());
    }

    #[test]
    fn test_one_trailing_slash_is_ignored() {
        let router = blog();
        assert_eq!(router.match_path("/user/42/").unwrap().params(), ["42".to_string()]);
        assert!(router.match_path("/user/42//").is_none());
        assert!(router.match_path("//").is_none());
    }

    #[test]
    fn test_first_match_wins_over_more_specific() {
        let router: Router = Router::new()
            .add(route(Verb::Get, "post/{id}", "Post", "show"))
            .add(route(Verb::Get, "post/new", "Post", "create"))
            .into();

        let matched = router.match_path("/post/new").unwrap();
        assert_eq!(matched.method(), "show");
        assert_eq!(matched.params(), ["new".to_string()]);
    }

    #[test]
    fn test_params_are_positional() {
        let router: Router = Router::new()
            .add(route(Verb::Get, "{year}/{month}/{slug}", "Archive", "show"))
            .into();

        let matched = router.match_path("/2024/05/hello").unwrap();
        assert_eq!(
            matched.into_params(),
            vec!["2024".to_string(), "05".to_string(), "hello".to_string()]
        );
    }

    #[test]
    fn test_match_request_filters_by_verb() {
        let router = blog();

        let get = router.match_request(Verb::Get, "/user/1").unwrap();
        assert_eq!(get.method(), "show");

        let post = router.match_request(Verb::Post, "/user/1").unwrap();
        assert_eq!(post.method(), "update");

        let err = router.match_request(Verb::Post, "/").unwrap_err();
        assert!(matches!(err, DispatchError::MethodNotSupported { .. }));
    }

    #[test]
    fn test_url_for_named_routes() {
        let router = blog();
        assert_eq!(router.url("home", &[]), Some("/".to_string()));
        assert_eq!(
            router.url("users.show", &[("id", "7")]),
            Some("/user/7".to_string())
        );
        assert_eq!(router.url("users.show", &[]), None);
        assert_eq!(router.url("missing", &[]), None);
    }

    #[test]
    fn test_routes_listed_in_registration_order() {
        let router = blog();
        let listed: Vec<(Verb, &str, &str)> = router
            .routes()
            .iter()
            .map(|r| (r.verb(), r.pattern().as_str(), r.method()))
            .collect();

        assert_eq!(
            listed,
            vec![
                (Verb::Get, "", "index"),
                (Verb::Get, "user/{id}", "show"),
                (Verb::Post, "user/{id}", "update"),
            ]
        );
    }
}
