use app::controllers::{AdminController, HomeController, PostController};
use app::services::{MemoryPostStore, PostStore, Renderer, SiteSettings};
use app::{bootstrap, routes};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE};
use http::{HeaderMap, HeaderValue, Method, Uri};
use press::container::ServiceKey;
use press::{instance, Application, BindingRegistry, DispatchError, FormData, HttpResponse, Server};
use pretty_assertions::assert_eq;

/// Registers the controllers by hand so the tests do not depend on link-time discovery
fn controllers(registry: &mut BindingRegistry) {
    registry.singleton::<HomeController>();
    registry.singleton::<PostController>();
    registry.singleton::<AdminController>();
}

/// A browser-like client that keeps the session cookie between requests
struct Client {
    server: Server,
    cookie: Option<String>,
}

impl Client {
    fn new(application: Application) -> Self {
        let dispatcher = application
            .bindings(controllers)
            .without_discovery()
            .dispatcher()
            .expect("bindings are valid");
        Self {
            server: Server::new(dispatcher),
            cookie: None,
        }
    }

    fn blog() -> Self {
        Self::new(app::application())
    }

    fn get(&mut self, path: &str) -> HttpResponse {
        self.send(Method::GET, path, &[])
    }

    fn post(&mut self, path: &str, form: &[(&str, &str)]) -> HttpResponse {
        self.send(Method::POST, path, form)
    }

    fn send(&mut self, method: Method, path: &str, form: &[(&str, &str)]) -> HttpResponse {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &self.cookie {
            headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        let body = if form.is_empty() {
            Bytes::new()
        } else {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
            let encoded: Vec<String> = form.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            Bytes::from(encoded.join("&"))
        };

        let uri: Uri = path.parse().unwrap();
        let response = self.server.process(&method, &uri, headers, body);
        if let Some(set_cookie) = response.header_value("Set-Cookie") {
            self.cookie = set_cookie.split(';').next().map(str::to_string);
        }
        response
    }

    fn login(&mut self) {
        let response = self.post("/admin/login", &[("password", "secret")]);
        assert_eq!(response.header_value("Location"), Some("/admin"));
    }
}

fn assert_redirect(response: &HttpResponse, location: &str) {
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header_value("Location"), Some(location));
}

#[test]
fn test_home_lists_published_posts() {
    let mut client = Client::blog();
    let response = client.get("/");

    assert_eq!(response.status_code(), 200);
    assert!(response.body_text().contains("<title>Home | Press Blog</title>"));
    assert!(response.body_text().contains(r#"<a href="/post/1">Hello, world</a>"#));
    assert!(response.body_text().contains("(0 comments)"));
}

#[test]
fn test_show_post() {
    let mut client = Client::blog();

    let response = client.get("/post/1/");
    assert_eq!(response.status_code(), 200);
    assert!(response.body_text().contains("<h1>Hello, world</h1>"));
    assert!(response.body_text().contains(r#"action="/post/1/comment""#));
}

#[test]
fn test_missing_or_malformed_post() {
    let mut client = Client::blog();

    assert_eq!(client.get("/post/99").status_code(), 404);
    assert_eq!(client.get("/post/abc").status_code(), 400);
}

#[test]
fn test_unknown_path_and_wrong_verb() {
    let mut client = Client::blog();

    assert_eq!(client.get("/nowhere").status_code(), 404);
    assert_eq!(client.get("/post/1/comment").status_code(), 405);
    assert_eq!(client.send(Method::DELETE, "/", &[]).status_code(), 405);
}

#[test]
fn test_comment_flashes_once_after_redirect() {
    let mut client = Client::blog();

    let response = client.post("/post/1/comment", &[("author", "Ada"), ("body", "Lovely+post")]);
    assert_redirect(&response, "/post/1");

    let page = client.get("/post/1");
    assert!(page.body_text().contains("<strong>Ada</strong>: Lovely post"));
    assert!(page.body_text().contains("Comment added"));

    let again = client.get("/post/1");
    assert!(again.body_text().contains("Lovely post"));
    assert!(!again.body_text().contains("Comment added"));

    assert!(client.get("/").body_text().contains("(1 comments)"));
}

#[test]
fn test_comment_requires_author_and_body() {
    let mut client = Client::blog();

    let response = client.post("/post/1/comment", &[("author", "Ada")]);
    assert_eq!(response.status_code(), 422);
    assert!(response.body_text().contains("Name and comment are required"));
}

#[test]
fn test_comment_escapes_markup() {
    let mut client = Client::blog();

    client.post("/post/1/comment", &[("author", "%3Cb%3EEve"), ("body", "hi")]);
    let page = client.get("/post/1");
    assert!(page.body_text().contains("&lt;b&gt;Eve"));
    assert!(!page.body_text().contains("<b>Eve"));
}

#[test]
fn test_admin_requires_login() {
    let mut client = Client::blog();

    assert_redirect(&client.get("/admin"), "/admin/login");
    assert_redirect(&client.get("/admin/post/1"), "/admin/login");
    assert_redirect(
        &client.post("/admin/post", &[("title", "Sneaky")]),
        "/admin/login",
    );
}

#[test]
fn test_wrong_password_is_flashed() {
    let mut client = Client::blog();

    let response = client.post("/admin/login", &[("password", "guess")]);
    assert_redirect(&response, "/admin/login");
    assert!(client.get("/admin/login").body_text().contains("Wrong password"));
    assert_redirect(&client.get("/admin"), "/admin/login");
}

#[test]
fn test_draft_then_publish() {
    let mut client = Client::blog();
    client.login();

    let dashboard = client.get("/admin");
    assert_eq!(dashboard.status_code(), 200);
    assert!(dashboard.body_text().contains("published"));

    let created = client.post("/admin/post", &[("title", "Second+post"), ("body", "More")]);
    assert_redirect(&created, "/admin/post/2");
    assert!(!client.get("/").body_text().contains("Second post"));
    assert_eq!(client.get("/post/2").status_code(), 404);

    let edit = client.get("/admin/post/2");
    assert!(edit.body_text().contains("Draft created"));
    assert!(edit.body_text().contains(">Publish</button>"));

    let saved = client.post("/admin/post/2", &[("title", "Second+post"), ("body", "Edited")]);
    assert_redirect(&saved, "/admin/post/2");

    let published = client.post("/admin/post/2/publish", &[("published", "1")]);
    assert_redirect(&published, "/admin");

    let home = client.get("/").body_text().to_string();
    assert!(home.contains(r#"<a href="/post/2">Second post</a>"#));
    assert!(home.find("/post/2") < home.find("/post/1"));
    assert!(client.get("/post/2").body_text().contains("Edited"));
}

#[test]
fn test_logout_ends_admin_session() {
    let mut client = Client::blog();
    client.login();
    assert_eq!(client.get("/admin").status_code(), 200);

    assert_redirect(&client.post("/admin/logout", &[]), "/");
    assert!(client.get("/").body_text().contains("Logged out"));
    assert_redirect(&client.get("/admin"), "/admin/login");
}

#[test]
fn test_comments_work_without_a_mailer() {
    let application = Application::new()
        .bindings(|registry| {
            instance!(registry, SiteSettings::default());
            instance!(registry, dyn PostStore => MemoryPostStore::seeded());
            registry.singleton::<Renderer>();
        })
        .routes(routes::register);
    let mut client = Client::new(application);

    let response = client.post("/post/1/comment", &[("author", "Ada"), ("body", "Quiet")]);
    assert_redirect(&response, "/post/1");
    assert!(client.get("/post/1").body_text().contains("Quiet"));
}

#[test]
fn test_bindings_validate_in_construction_order() {
    let (mut registry, router) = app::application().without_discovery().build();
    controllers(&mut registry);

    let order = press::app::check(&registry, &router).expect("bindings are valid");
    let position = |key: ServiceKey| order.iter().position(|k| *k == key).expect("key present");

    assert!(position(ServiceKey::of::<SiteSettings>()) < position(ServiceKey::of::<Renderer>()));
    assert!(position(ServiceKey::of::<Renderer>()) < position(ServiceKey::of::<PostController>()));
    assert!(position(ServiceKey::of::<dyn PostStore>()) < position(ServiceKey::of::<HomeController>()));
}

#[test]
fn test_routes_without_controller_bindings_fail_the_check() {
    let mut registry = BindingRegistry::new();
    bootstrap::register(&mut registry);

    let result = press::app::check(&registry, &routes::register());
    assert!(result.is_err());
}

#[test]
fn test_dispatch_without_the_server() {
    let (mut registry, router) = app::application().without_discovery().build();
    controllers(&mut registry);
    let dispatcher = press::Dispatcher::new(router.into(), registry.into());

    let response = dispatcher
        .dispatch_raw("/post/1", "GET", FormData::new())
        .expect("route matches");
    assert_eq!(response.map(|r| r.status_code()), Ok(200));

    let missing = dispatcher.dispatch_raw("/missing/deep/path", "GET", FormData::new());
    assert!(matches!(missing, Err(DispatchError::RouteNotFound { .. })));
}
