mod body;
mod form;
mod request;
mod response;
mod session;

pub use body::{collect_body, parse_form, parse_input, parse_json, parse_query};
pub use form::FormData;
pub use request::RequestContext;
pub use response::{HttpResponse, Redirect, RedirectRouteBuilder, Response, ResponseExt};
pub use session::{session_cookie, Session, SessionStore, SESSION_COOKIE};

/// Create a text response
pub fn text(body: impl Into<String>) -> Response {
    Ok(HttpResponse::text(body))
}

/// Create an HTML response
pub fn html(body: impl Into<String>) -> Response {
    Ok(HttpResponse::html(body))
}

/// Create a JSON response from a serde_json::Value
pub fn json(body: serde_json::Value) -> Response {
    Ok(HttpResponse::json(body))
}
