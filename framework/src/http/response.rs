use super::RequestContext;
use crate::error::{AppError, ContainerError, DispatchError, FrameworkError};
use crate::routing::Router;
use bytes::Bytes;
use http_body_util::Full;
use std::sync::Arc;

/// HTTP Response builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
}

/// Response type alias - allows using `?` operator for early returns
pub type Response = Result<HttpResponse, HttpResponse>;

impl HttpResponse {
    pub fn new() -> Self {
        Self {
            status: 200,
            body: String::new(),
            headers: Vec::new(),
        }
    }

    /// Create a response with a string body
    pub fn text(body: impl Into<String>) -> Self {
        Self::new()
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
    }

    /// Create an HTML response
    pub fn html(body: impl Into<String>) -> Self {
        Self::new()
            .header("Content-Type", "text/html; charset=utf-8")
            .body(body)
    }

    /// Create a JSON response from a serde_json::Value
    pub fn json(body: serde_json::Value) -> Self {
        Self::new()
            .header("Content-Type", "application/json")
            .body(body.to_string())
    }

    /// Set the HTTP status code
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a header to the response
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Wrap this response in Ok() for use as Response type
    pub fn ok(self) -> Response {
        Ok(self)
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn body_text(&self) -> &str {
        &self.body
    }

    /// First header value with this name, compared case-insensitively
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert to hyper response
    ///
    /// Invalid status codes or header values degrade to a bare 500.
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let mut builder = hyper::Response::builder().status(self.status);

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "invalid response, sending 500");
                let mut response = hyper::Response::new(Full::new(Bytes::from_static(
                    b"Internal Server Error",
                )));
                *response.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                response
            })
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension trait for Response to enable method chaining
pub trait ResponseExt {
    fn status(self, code: u16) -> Self;
    fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self;
}

impl ResponseExt for Response {
    fn status(self, code: u16) -> Self {
        self.map(|r| r.status(code))
    }

    fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map(|r| r.header(name, value))
    }
}

/// HTTP Redirect response builder
pub struct Redirect {
    location: String,
    query_params: Vec<(String, String)>,
    status: u16,
}

impl Redirect {
    /// Create a redirect to a specific URL/path
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            location: path.into(),
            query_params: Vec::new(),
            status: 302,
        }
    }

    /// Create a redirect to a named route of the current request's router
    pub fn route(ctx: &RequestContext, name: &str) -> RedirectRouteBuilder {
        RedirectRouteBuilder {
            router: ctx.router().cloned(),
            name: name.to_string(),
            params: Vec::new(),
            query_params: Vec::new(),
            status: 302,
        }
    }

    /// Add a query parameter
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query_params.push((key.to_string(), value.into()));
        self
    }

    /// Set status to 301 (Moved Permanently)
    pub fn permanent(mut self) -> Self {
        self.status = 301;
        self
    }
}

/// Auto-convert Redirect to Response
impl From<Redirect> for Response {
    fn from(redirect: Redirect) -> Response {
        Ok(HttpResponse::new()
            .status(redirect.status)
            .header("Location", with_query(redirect.location, &redirect.query_params)))
    }
}

/// Builder for redirects to named routes with parameters
pub struct RedirectRouteBuilder {
    router: Option<Arc<Router>>,
    name: String,
    params: Vec<(String, String)>,
    query_params: Vec<(String, String)>,
    status: u16,
}

impl RedirectRouteBuilder {
    /// Add a route parameter value
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    /// Add a query parameter
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query_params.push((key.to_string(), value.into()));
        self
    }

    /// Set status to 301 (Moved Permanently)
    pub fn permanent(mut self) -> Self {
        self.status = 301;
        self
    }

    fn build_url(&self) -> Option<String> {
        let params: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let url = self.router.as_ref()?.url(&self.name, &params)?;
        Some(with_query(url, &self.query_params))
    }
}

/// Auto-convert RedirectRouteBuilder to Response
impl From<RedirectRouteBuilder> for Response {
    fn from(redirect: RedirectRouteBuilder) -> Response {
        let url = redirect
            .build_url()
            .ok_or_else(|| HttpResponse::from(FrameworkError::UnknownRoute(redirect.name.clone())))?;
        Ok(HttpResponse::new()
            .status(redirect.status)
            .header("Location", url))
    }
}

fn with_query(location: String, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return location;
    }
    match serde_urlencoded::to_string(query) {
        Ok(encoded) => format!("{}?{}", location, encoded),
        Err(_) => location,
    }
}

fn error_body(status: u16, message: String) -> HttpResponse {
    HttpResponse::json(serde_json::json!({ "error": message })).status(status)
}

/// Auto-convert FrameworkError to HttpResponse
///
/// This enables using the `?` operator in controller handlers to propagate
/// framework errors as appropriate HTTP responses.
impl From<FrameworkError> for HttpResponse {
    fn from(err: FrameworkError) -> HttpResponse {
        error_body(err.status_code(), err.to_string())
    }
}

/// Auto-convert AppError to HttpResponse
impl From<AppError> for HttpResponse {
    fn from(err: AppError) -> HttpResponse {
        let framework_err: FrameworkError = err.into();
        framework_err.into()
    }
}

impl From<ContainerError> for HttpResponse {
    fn from(err: ContainerError) -> HttpResponse {
        FrameworkError::from(err).into()
    }
}

/// Routing and resolution failures surface as 404/405/500 responses
impl From<DispatchError> for HttpResponse {
    fn from(err: DispatchError) -> HttpResponse {
        error_body(err.status_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_redirect_with_encoded_query() {
        let response: Response = Redirect::to("/search").query("q", "a b").into();
        let response = response.unwrap();

        assert_eq!(response.status_code(), 302);
        assert_eq!(response.header_value("location"), Some("/search?q=a+b"));
    }

    #[test]
    fn test_route_redirect_without_router_fails() {
        let ctx = RequestContext::new("GET", "/");
        let response: Response = Redirect::route(&ctx, "home").into();
        assert_eq!(response.unwrap_err().status_code(), 500);
    }

    #[test]
    fn test_dispatch_error_maps_status() {
        let response = HttpResponse::from(DispatchError::RouteNotFound {
            path: "/nope".into(),
        });
        assert_eq!(response.status_code(), 404);
        assert_eq!(
            response.body_text(),
            r#"{"error":"no route matches '/nope'"}"#
        );
    }

    #[test]
    fn test_app_error_keeps_status() {
        let response = HttpResponse::from(AppError::unprocessable("Title is required"));
        assert_eq!(response.status_code(), 422);
        assert_eq!(response.header_value("content-type"), Some("application/json"));
    }
}
