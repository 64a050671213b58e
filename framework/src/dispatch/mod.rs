//! Request dispatch: matched route in, handler response out
//!
//! The [`Dispatcher`] owns the immutable route table and bootstrap binding
//! table. Each request gets a fresh [`Container`] layered over the bindings,
//! so singletons live exactly as long as the request that built them.

mod controller;

pub use controller::{invoke, Action, Actions, Controller, GetAction, PostAction};

use crate::container::{BindingRegistry, Container};
use crate::error::DispatchError;
use crate::http::{FormData, RequestContext, Response};
use crate::routing::{RouteMatch, Router, Verb};
use std::sync::Arc;
use tracing::debug;

/// Type-erased entry point stored on every route, monomorphized per handler
pub type Invoker =
    fn(&mut Container, &RouteMatch<'_>, &mut RequestContext) -> Result<Response, DispatchError>;

/// Call the handler method a route match points at
///
/// Renders nothing: every failure comes back as a [`DispatchError`] for the
/// top-level entry point to turn into a response.
pub fn dispatch(
    container: &mut Container,
    matched: &RouteMatch<'_>,
    ctx: &mut RequestContext,
) -> Result<Response, DispatchError> {
    (matched.route().invoker())(container, matched, ctx)
}

/// Matches requests against the route table and dispatches them
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    bindings: Arc<BindingRegistry>,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>, bindings: Arc<BindingRegistry>) -> Self {
        Self { router, bindings }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn bindings(&self) -> &Arc<BindingRegistry> {
        &self.bindings
    }

    /// A fresh request-scoped container over the bootstrap bindings
    pub fn container(&self) -> Container {
        Container::from_registry(self.bindings.clone())
    }

    /// Route and dispatch a request described by `ctx`
    pub fn handle(&self, ctx: &mut RequestContext) -> Result<Response, DispatchError> {
        let verb = Verb::parse(ctx.verb()).ok_or_else(|| DispatchError::MethodNotSupported {
            verb: ctx.verb().to_string(),
            path: ctx.path().to_string(),
        })?;

        let matched = self.router.match_request(verb, ctx.path())?;
        debug!(
            verb = %verb,
            path = ctx.path(),
            pattern = matched.route().pattern().as_str(),
            handler = %matched.handler_key(),
            "route matched"
        );

        let mut container = self.container();
        dispatch(&mut container, &matched, ctx)
    }

    /// Dispatch from raw inputs: path, verb name and submitted body
    pub fn dispatch_raw(
        &self,
        path: &str,
        verb: &str,
        body: FormData,
    ) -> Result<Response, DispatchError> {
        let mut ctx = RequestContext::new(verb, path)
            .with_body(body)
            .with_router(self.router.clone());
        self.handle(&mut ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Arguments, Dependency, Injectable};
    use crate::error::ContainerError;
    use crate::http::HttpResponse;
    use pretty_assertions::assert_eq;

    struct Greeting {
        word: &'static str,
    }

    impl Injectable for Greeting {
        fn construct(_: &mut Arguments) -> Result<Self, ContainerError> {
            Ok(Self { word: "hello" })
        }
    }

    struct HomeController;

    impl Injectable for HomeController {
        fn construct(_: &mut Arguments) -> Result<Self, ContainerError> {
            Ok(Self)
        }
    }

    impl Controller for HomeController {
        fn actions() -> Actions<Self> {
            Actions::new().get("index", Self::index)
        }
    }

    impl HomeController {
        fn index(&self, _: &mut RequestContext, _: &[String]) -> Response {
            Ok(HttpResponse::text("home"))
        }
    }

    struct UserController {
        greeting: Arc<Greeting>,
    }

    impl Injectable for UserController {
        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::service::<Greeting>("greeting")]
        }

        fn construct(args: &mut Arguments) -> Result<Self, ContainerError> {
            Ok(Self {
                greeting: args.service("greeting")?,
            })
        }
    }

    impl Controller for UserController {
        fn actions() -> Actions<Self> {
            Actions::new()
                .get("show", Self::show)
                .post("update", Self::update)
        }
    }

    impl UserController {
        fn show(&self, _: &mut RequestContext, params: &[String]) -> Response {
            Ok(HttpResponse::text(format!("{} user {}", self.greeting.word, params.join(","))))
        }

        fn update(&self, ctx: &mut RequestContext, form: &FormData, id: Option<&str>) -> Response {
            ctx.session_mut().flash("status", "updated");
            let name = form.required("name")?;
            Ok(HttpResponse::text(format!("{}={}", id.unwrap_or("-"), name)))
        }
    }

    fn dispatcher() -> Dispatcher {
        let router: Router = Router::new()
            .get::<HomeController>("", "index")
            .name("home")
            .get::<UserController>("user/{id}", "show")
            .post::<UserController>("user/{id}", "update")
            .get::<UserController>("user/{id}/edit", "edit")
            .post::<UserController>("user/{id}/show", "show")
            .into();

        let mut bindings = BindingRegistry::new();
        bindings.singleton::<HomeController>().singleton::<UserController>();

        Dispatcher::new(Arc::new(router), Arc::new(bindings))
    }

    fn body(result: Result<Response, DispatchError>) -> String {
        match result.unwrap() {
            Ok(response) | Err(response) => response.body_text().to_string(),
        }
    }

    #[test]
    fn test_get_calls_handler_with_params() {
        let dispatcher = dispatcher();
        let result = dispatcher.dispatch_raw("/user/42", "GET", FormData::new());
        assert_eq!(body(result), "hello user 42");
    }

    #[test]
    fn test_home_for_empty_and_slash() {
        let dispatcher = dispatcher();
        assert_eq!(body(dispatcher.dispatch_raw("", "GET", FormData::new())), "home");
        assert_eq!(body(dispatcher.dispatch_raw("/", "GET", FormData::new())), "home");
    }

    #[test]
    fn test_post_passes_body_and_first_param() {
        let dispatcher = dispatcher();
        let mut ctx = RequestContext::new("POST", "/user/7")
            .with_body(FormData::from([("name", "ann")]));

        let result = dispatcher.handle(&mut ctx);
        assert_eq!(body(result), "7=ann");
        assert!(ctx.body().is_empty());
    }

    #[test]
    fn test_handler_errors_become_responses() {
        let dispatcher = dispatcher();
        let response = dispatcher
            .dispatch_raw("/user/7", "POST", FormData::new())
            .unwrap()
            .unwrap_err();
        assert_eq!(response.status_code(), 400);
    }

    #[test]
    fn test_unknown_route() {
        let err = dispatcher()
            .dispatch_raw("/unknown", "GET", FormData::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::RouteNotFound { .. }));
    }

    #[test]
    fn test_unsupported_verbs() {
        let dispatcher = dispatcher();

        let err = dispatcher
            .dispatch_raw("/user/1", "DELETE", FormData::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::MethodNotSupported { verb, .. } if verb == "DELETE"));

        let err = dispatcher.dispatch_raw("/", "POST", FormData::new()).unwrap_err();
        assert_eq!(err.status_code(), 405);
    }

    #[test]
    fn test_missing_handler_method() {
        let err = dispatcher()
            .dispatch_raw("/user/1/edit", "GET", FormData::new())
            .unwrap_err();

        match err {
            DispatchError::HandlerMethodNotFound { handler, method } => {
                assert_eq!(handler, UserController::key());
                assert_eq!(method, "edit");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_action_shape_must_fit_verb() {
        let err = dispatcher()
            .dispatch_raw("/user/1/show", "POST", FormData::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::MethodNotSupported { .. }));
    }

    #[test]
    fn test_unbound_handler_is_container_error() {
        let router: Router = Router::new().get::<HomeController>("", "index").into();
        let dispatcher = Dispatcher::new(Arc::new(router), Arc::new(BindingRegistry::new()));

        let err = dispatcher.dispatch_raw("/", "GET", FormData::new()).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Container(ContainerError::NotBound { .. })
        ));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_each_request_gets_fresh_container() {
        let dispatcher = dispatcher();
        let mut first = dispatcher.container();
        let mut second = dispatcher.container();

        let a = first.get_as::<UserController>(&UserController::key()).unwrap();
        let b = first.get_as::<UserController>(&UserController::key()).unwrap();
        let c = second.get_as::<UserController>(&UserController::key()).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
