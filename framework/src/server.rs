use crate::config::{Config, ServerConfig};
use crate::dispatch::Dispatcher;
use crate::error::FrameworkError;
use crate::http::{
    collect_body, parse_input, parse_query, session_cookie, HttpResponse, RequestContext,
    SessionStore,
};
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, warn, Instrument};

/// HTTP front end: turns hyper requests into dispatches
///
/// The dispatch core is synchronous; each request task collects the body,
/// then runs matching, resolution and the handler inline.
pub struct Server {
    dispatcher: Dispatcher,
    sessions: SessionStore,
    config: ServerConfig,
    debug: bool,
}

impl Server {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            sessions: SessionStore::new(),
            config: ServerConfig::from_env(),
            debug: false,
        }
    }

    pub fn from_config(dispatcher: Dispatcher, config: &Config) -> Self {
        Self::new(dispatcher)
            .config(config.server.clone())
            .debug(config.app.debug)
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Show internal error messages in 5xx responses
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Accept connections until Ctrl+C
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(self.config.addr()).await?;
        let addr = listener.local_addr()?;
        info!(%addr, routes = self.dispatcher.router().len(), "press server listening");

        let server = Arc::new(self);

        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received");
                    return Ok(());
                }
            };

            let io = TokioIo::new(stream);
            let server = server.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                    let server = server.clone();
                    async move { Ok::<_, Infallible>(server.handle(req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(%peer, error = %err, "error serving connection");
                }
            });
        }
    }

    async fn handle(
        &self,
        req: hyper::Request<hyper::body::Incoming>,
    ) -> hyper::Response<Full<Bytes>> {
        let (parts, body) = req.into_parts();
        let span = info_span!("request", method = %parts.method, path = parts.uri.path());

        async move {
            let started = Instant::now();

            if declared_length(&parts.headers).is_some_and(|len| len > self.config.max_body_size) {
                return self.finish(payload_too_large(), started).into_hyper();
            }

            let response = match collect_body(body).await {
                Ok(bytes) if bytes.len() > self.config.max_body_size => payload_too_large(),
                Ok(bytes) => self.process(&parts.method, &parts.uri, parts.headers, bytes),
                Err(err) => HttpResponse::from(err),
            };
            self.finish(response, started).into_hyper()
        }
        .instrument(span)
        .await
    }

    /// Build the request context, dispatch, and persist the session
    ///
    /// Every failure is rendered here; nothing below this point writes output.
    pub fn process(&self, method: &Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> HttpResponse {
        let content_type = headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let input = parse_query(uri.query())
            .and_then(|query| Ok((query, parse_input(content_type, &body)?)));
        let (query, form) = match input {
            Ok(input) => input,
            Err(err) => return HttpResponse::from(err),
        };

        let cookies = headers
            .get(http::header::COOKIE)
            .and_then(|v| v.to_str().ok());
        let (session_id, session) = self.sessions.load(cookies);

        let mut ctx = RequestContext::new(method.as_str(), uri.path())
            .with_query(query)
            .with_body(form)
            .with_headers(headers)
            .with_session(session)
            .with_router(self.dispatcher.router().clone());

        let response = match self.dispatcher.handle(&mut ctx) {
            Ok(Ok(response)) | Ok(Err(response)) => response,
            Err(err) => {
                if err.status_code() >= 500 {
                    error!(error = %err, "dispatch failed");
                } else {
                    info!(error = %err, "request not dispatched");
                }
                HttpResponse::from(err)
            }
        };

        // Visitors without session state get no cookie and no store entry
        if self.sessions.save(&session_id, ctx.into_session()) {
            response.header("Set-Cookie", session_cookie(&session_id))
        } else {
            response
        }
    }

    fn finish(&self, response: HttpResponse, started: Instant) -> HttpResponse {
        let status = response.status_code();
        info!(
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request finished"
        );

        if status >= 500 && !self.debug {
            return HttpResponse::from(FrameworkError::internal("something went wrong"))
                .status(status);
        }
        response
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn payload_too_large() -> HttpResponse {
    HttpResponse::from(FrameworkError::Domain {
        message: "request body too large".to_string(),
        status_code: 413,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Arguments, BindingRegistry, Injectable};
    use crate::dispatch::{Actions, Controller};
    use crate::error::ContainerError;
    use crate::http::{FormData, Response};
    use crate::routing::Router;
    use crate::http::SESSION_COOKIE;
    use pretty_assertions::assert_eq;

    struct CounterController;

    impl Injectable for CounterController {
        fn construct(_: &mut Arguments) -> Result<Self, ContainerError> {
            Ok(Self)
        }
    }

    impl Controller for CounterController {
        fn actions() -> Actions<Self> {
            Actions::new()
                .get("show", Self::show)
                .post("bump", Self::bump)
        }
    }

    impl CounterController {
        fn show(&self, ctx: &mut RequestContext, _: &[String]) -> Response {
            let count = ctx.session().get("count").unwrap_or("0");
            Ok(HttpResponse::text(count.to_string()))
        }

        fn bump(&self, ctx: &mut RequestContext, form: &FormData, _: Option<&str>) -> Response {
            let by: u32 = form.parse("by")?;
            let current: u32 = ctx.session().get("count").unwrap_or("0").parse().unwrap_or(0);
            ctx.session_mut().put("count", (current + by).to_string());
            Ok(HttpResponse::text("ok"))
        }
    }

    fn server() -> Server {
        let router: Router = Router::new()
            .get::<CounterController>("counter", "show")
            .post::<CounterController>("counter", "bump")
            .get::<CounterController>("broken", "missing")
            .into();
        let mut bindings = BindingRegistry::new();
        bindings.singleton::<CounterController>();

        Server::new(Dispatcher::new(Arc::new(router), Arc::new(bindings)))
    }

    fn cookie_of(response: &HttpResponse) -> String {
        let set_cookie = response.header_value("set-cookie").unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[test]
    fn test_session_survives_between_requests() {
        let server = server();
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded".parse().unwrap(),
        );

        let first = server.process(
            &Method::POST,
            &"/counter".parse().unwrap(),
            headers,
            Bytes::from_static(b"by=3"),
        );
        assert_eq!(first.status_code(), 200);
        let cookie = cookie_of(&first);
        assert!(cookie.starts_with(SESSION_COOKIE));

        let mut headers = HeaderMap::new();
        headers.insert(http::header::COOKIE, cookie.parse().unwrap());
        let second = server.process(&Method::GET, &"/counter".parse().unwrap(), headers, Bytes::new());
        assert_eq!(second.body_text(), "3");
    }

    #[test]
    fn test_cookieless_requests_leave_no_sessions() {
        let server = server();
        for _ in 0..1000 {
            let response = server.process(
                &Method::GET,
                &"/nowhere".parse().unwrap(),
                HeaderMap::new(),
                Bytes::new(),
            );
            assert_eq!(response.status_code(), 404);
            assert_eq!(response.header_value("set-cookie"), None);
        }

        let read = server.process(&Method::GET, &"/counter".parse().unwrap(), HeaderMap::new(), Bytes::new());
        assert_eq!(read.header_value("set-cookie"), None);
        assert_eq!(server.sessions().len(), 0);
    }

    #[test]
    fn test_errors_are_rendered_with_status() {
        let server = server();
        let get = |path: &str, method: Method| {
            server
                .process(&method, &path.parse().unwrap(), HeaderMap::new(), Bytes::new())
                .status_code()
        };

        assert_eq!(get("/nowhere", Method::GET), 404);
        assert_eq!(get("/counter", Method::PUT), 405);
        assert_eq!(get("/broken", Method::GET), 500);
        assert_eq!(get("/counter", Method::POST), 400);
    }

    #[test]
    fn test_malformed_json_is_bad_request() {
        let server = server();
        let mut headers = HeaderMap::new();
        headers.insert(http::header::CONTENT_TYPE, "application/json".parse().unwrap());

        let response = server.process(
            &Method::POST,
            &"/counter".parse().unwrap(),
            headers,
            Bytes::from_static(b"{not json"),
        );
        assert_eq!(response.status_code(), 400);
    }

    #[test]
    fn test_internal_errors_hidden_outside_debug() {
        let server = server();
        let started = Instant::now();
        let detailed = HttpResponse::from(FrameworkError::internal("db password wrong"));

        let hidden = server.finish(detailed.clone(), started);
        assert!(!hidden.body_text().contains("password"));
        assert_eq!(hidden.status_code(), 500);

        let shown = server.debug(true).finish(detailed, started);
        assert!(shown.body_text().contains("password"));
    }
}
