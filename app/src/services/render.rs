//! HTML views
//!
//! Templates under `views/` are compiled into the binary and loaded into one
//! `minijinja` environment. Every view ends in `.html`, so values are escaped
//! unless passed through [`safe_url`].

use super::settings::SiteSettings;
use minijinja::{context, Environment, Value};
use press::{
    Arguments, ContainerError, Dependency, FrameworkError, HttpResponse, Injectable, Response,
    ServiceKey,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

const VIEWS: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../views/layout.html")),
    ("home.html", include_str!("../../views/home.html")),
    ("post.html", include_str!("../../views/post.html")),
    ("admin_login.html", include_str!("../../views/admin_login.html")),
    ("admin_dashboard.html", include_str!("../../views/admin_dashboard.html")),
    ("admin_edit.html", include_str!("../../views/admin_edit.html")),
];

pub struct Renderer {
    env: Environment<'static>,
    settings: Arc<SiteSettings>,
}

impl Renderer {
    pub fn new(settings: Arc<SiteSettings>) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in VIEWS {
            env.add_template(name, source)?;
        }
        Ok(Self { env, settings })
    }

    pub fn site_title(&self) -> &str {
        &self.settings.title
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }

    /// Render a page view with the site title and an optional flash message
    pub fn view(&self, name: &str, flash: Option<&str>, ctx: Value) -> Response {
        let ctx = context! {
            site_title => self.site_title(),
            flash => flash,
            ..ctx
        };
        match self.render(name, ctx) {
            Ok(html) => Ok(HttpResponse::html(html)),
            Err(err) => {
                error!(view = name, error = %err, "view failed to render");
                Err(FrameworkError::internal(format!("could not render {}", name)).into())
            }
        }
    }
}

/// A URL generated by the router, inserted into views without escaping
///
/// Route parameters are percent-encoded when the URL is built, so it holds
/// no markup characters.
pub fn safe_url(url: String) -> Value {
    Value::from_safe_string(url)
}

impl Injectable for Renderer {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::keyed("settings", ServiceKey::of::<SiteSettings>())]
    }

    fn construct(args: &mut Arguments) -> Result<Self, ContainerError> {
        let settings = args.service::<SiteSettings>("settings")?;
        Self::new(settings).map_err(|err| ContainerError::construction(Self::key(), err.to_string()))
    }
}
