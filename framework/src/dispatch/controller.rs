//! Handler types and their named action tables

use crate::container::{Container, Injectable};
use crate::error::DispatchError;
use crate::http::{FormData, RequestContext, Response};
use crate::routing::{RouteMatch, Verb};
use std::fmt;
use tracing::debug;

/// GET action: receives the captured route parameters in order
pub type GetAction<C> = fn(&C, &mut RequestContext, &[String]) -> Response;

/// POST action: receives the submitted body and the first captured parameter
pub type PostAction<C> = fn(&C, &mut RequestContext, &FormData, Option<&str>) -> Response;

/// One invocable handler method
pub enum Action<C> {
    Get(GetAction<C>),
    Post(PostAction<C>),
}

impl<C> Action<C> {
    /// The verb whose argument shape this action accepts
    pub fn verb(&self) -> Verb {
        match self {
            Self::Get(_) => Verb::Get,
            Self::Post(_) => Verb::Post,
        }
    }
}

impl<C> Clone for Action<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Action<C> {}

/// A handler's methods, looked up by the name a route declares
pub struct Actions<C> {
    entries: Vec<(&'static str, Action<C>)>,
}

impl<C> Actions<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn get(mut self, name: &'static str, action: GetAction<C>) -> Self {
        self.entries.push((name, Action::Get(action)));
        self
    }

    pub fn post(mut self, name: &'static str, action: PostAction<C>) -> Self {
        self.entries.push((name, Action::Post(action)));
        self
    }

    pub fn find(&self, name: &str) -> Option<Action<C>> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, action)| *action)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }
}

impl<C> Default for Actions<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Actions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// A request handler: a container-built service exposing named actions
///
/// # Example
///
/// ```rust,ignore
/// impl Controller for PostController {
///     fn actions() -> Actions<Self> {
///         Actions::new()
///             .get("show", Self::show)
///             .post("comment", Self::comment)
///     }
/// }
/// ```
pub trait Controller: Injectable {
    fn actions() -> Actions<Self>;
}

/// Resolve the matched handler as `C` and call the route's action on it
///
/// GET actions get every captured parameter; POST actions get the body and
/// the first captured parameter, if any. An action whose shape does not fit
/// the route's verb is `MethodNotSupported`.
pub fn invoke<C: Controller>(
    container: &mut Container,
    matched: &RouteMatch<'_>,
    ctx: &mut RequestContext,
) -> Result<Response, DispatchError> {
    let handler = container.get_as::<C>(matched.handler_key())?;

    let action = C::actions()
        .find(matched.method())
        .ok_or_else(|| DispatchError::HandlerMethodNotFound {
            handler: matched.handler_key().clone(),
            method: matched.method().to_string(),
        })?;

    debug!(
        handler = %matched.handler_key(),
        method = matched.method(),
        params = ?matched.params(),
        "invoking handler"
    );

    match (matched.verb(), action) {
        (Verb::Get, Action::Get(action)) => Ok(action(&handler, ctx, matched.params())),
        (Verb::Post, Action::Post(action)) => {
            let body = ctx.take_body();
            let first = matched.params().first().map(String::as_str);
            Ok(action(&handler, ctx, &body, first))
        }
        (verb, _) => Err(DispatchError::MethodNotSupported {
            verb: verb.to_string(),
            path: ctx.path().to_string(),
        }),
    }
}
