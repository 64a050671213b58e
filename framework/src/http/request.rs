use super::{FormData, Session};
use crate::error::FrameworkError;
use crate::routing::Router;
use http::HeaderMap;
use std::sync::Arc;

/// Everything a handler may read about the current request
///
/// Built by the server (or a test) and handed to every handler method, so
/// handlers never reach for ambient globals. The session is the only part a
/// handler is expected to mutate.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    verb: String,
    path: String,
    query: FormData,
    body: FormData,
    headers: HeaderMap,
    session: Session,
    router: Option<Arc<Router>>,
}

impl RequestContext {
    pub fn new(verb: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: FormData) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: FormData) -> Self {
        self.body = body;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Attach the route table so handlers can generate URLs
    pub fn with_router(mut self, router: Arc<Router>) -> Self {
        self.router = Some(router);
        self
    }

    /// The request verb as received, e.g. `GET`
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// The raw request path, e.g. `/post/42`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &FormData {
        &self.query
    }

    /// Submitted body data; empty once handed to a POST handler
    pub fn body(&self) -> &FormData {
        &self.body
    }

    pub(crate) fn take_body(&mut self) -> FormData {
        std::mem::take(&mut self.body)
    }

    /// A body field, falling back to the query string
    pub fn input(&self, key: &str) -> Option<&str> {
        self.body.get(key).or_else(|| self.query.get(key))
    }

    /// Get a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub(crate) fn router(&self) -> Option<&Arc<Router>> {
        self.router.as_ref()
    }

    /// URL of a named route, e.g. `ctx.route("posts.show", &[("id", "4")])?`
    pub fn route(&self, name: &str, params: &[(&str, &str)]) -> Result<String, FrameworkError> {
        self.router
            .as_ref()
            .and_then(|router| router.url(name, params))
            .ok_or_else(|| FrameworkError::UnknownRoute(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_input_prefers_body_over_query() {
        let ctx = RequestContext::new("POST", "/search")
            .with_query(FormData::from([("q", "query"), ("page", "2")]))
            .with_body(FormData::from([("q", "body")]));

        assert_eq!(ctx.input("q"), Some("body"));
        assert_eq!(ctx.input("page"), Some("2"));
        assert_eq!(ctx.input("missing"), None);
    }

    #[test]
    fn test_route_without_router_is_unknown() {
        let ctx = RequestContext::new("GET", "/");
        let err = ctx.route("home", &[]).unwrap_err();
        assert!(matches!(err, FrameworkError::UnknownRoute(name) if name == "home"));
    }

    #[test]
    fn test_take_body_leaves_empty_data() {
        let mut ctx = RequestContext::new("POST", "/").with_body(FormData::from([("a", "1")]));
        assert_eq!(ctx.take_body().get("a"), Some("1"));
        assert!(ctx.body().is_empty());
    }
}
