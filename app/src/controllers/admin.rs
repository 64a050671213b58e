//! Password-guarded console for drafting and publishing posts

use crate::services::{safe_url, PostStore, Renderer, SiteSettings};
use minijinja::context;
use press::{
    injectable, Actions, AppError, Controller, FormData, FrameworkError, HttpResponse, Redirect,
    RequestContext, Response,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Session key set once the admin password was accepted
const ADMIN_FLAG: &str = "admin";

#[injectable(register)]
pub struct AdminController {
    #[inject]
    posts: Arc<dyn PostStore>,
    #[inject]
    views: Arc<Renderer>,
    #[inject(instance)]
    settings: Arc<SiteSettings>,
}

impl Controller for AdminController {
    fn actions() -> Actions<Self> {
        Actions::new()
            .get("login", Self::login)
            .post("authenticate", Self::authenticate)
            .post("logout", Self::logout)
            .get("dashboard", Self::dashboard)
            .post("create", Self::create)
            .get("edit", Self::edit)
            .post("save", Self::save)
            .post("publish", Self::publish)
    }
}

impl AdminController {
    pub fn login(&self, ctx: &mut RequestContext, _params: &[String]) -> Response {
        let action = ctx.route("admin.login", &[])?;
        self.views.view(
            "admin_login.html",
            ctx.session().flashed("status"),
            context! { action => safe_url(action) },
        )
    }

    pub fn authenticate(&self, ctx: &mut RequestContext, form: &FormData, _id: Option<&str>) -> Response {
        if form.get("password") != Some(self.settings.admin_password.as_str()) {
            warn!("rejected admin login");
            ctx.session_mut().flash("status", "Wrong password");
            return Redirect::route(ctx, "admin.login").into();
        }

        ctx.session_mut().put(ADMIN_FLAG, "1");
        info!("admin logged in");
        Redirect::route(ctx, "admin.dashboard").into()
    }

    pub fn logout(&self, ctx: &mut RequestContext, _form: &FormData, _id: Option<&str>) -> Response {
        ctx.session_mut().forget(ADMIN_FLAG);
        ctx.session_mut().flash("status", "Logged out");
        Redirect::route(ctx, "home").into()
    }

    pub fn dashboard(&self, ctx: &mut RequestContext, _params: &[String]) -> Response {
        self.guard(ctx)?;

        let mut rows = Vec::new();
        for post in self.posts.all() {
            let edit_url = ctx.route("admin.edit", &[("id", &post.id.to_string())])?;
            rows.push(context! { post => post, edit_url => safe_url(edit_url) });
        }

        let create_url = ctx.route("admin.create", &[])?;
        let logout_url = ctx.route("admin.logout", &[])?;
        self.views.view(
            "admin_dashboard.html",
            ctx.session().flashed("status"),
            context! {
                rows => rows,
                create_url => safe_url(create_url),
                logout_url => safe_url(logout_url),
            },
        )
    }

    pub fn create(&self, ctx: &mut RequestContext, form: &FormData, _id: Option<&str>) -> Response {
        self.guard(ctx)?;

        let title = form.get("title").map(str::trim).unwrap_or_default();
        if title.is_empty() {
            return Err(AppError::unprocessable("A title is required").into());
        }
        let post = self.posts.create(title, form.get("body").unwrap_or_default());
        info!(post = post.id, "draft created");

        ctx.session_mut().flash("status", "Draft created");
        Redirect::route(ctx, "admin.edit")
            .with("id", post.id.to_string())
            .into()
    }

    pub fn edit(&self, ctx: &mut RequestContext, params: &[String]) -> Response {
        self.guard(ctx)?;

        let id = post_id(params.first().map(String::as_str))?;
        let post = self
            .posts
            .find(id)
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        let id = post.id.to_string();
        let save_url = ctx.route("admin.edit", &[("id", &id)])?;
        let publish_url = ctx.route("admin.publish", &[("id", &id)])?;
        self.views.view(
            "admin_edit.html",
            ctx.session().flashed("status"),
            context! {
                post => post,
                save_url => safe_url(save_url),
                publish_url => safe_url(publish_url),
            },
        )
    }

    pub fn save(&self, ctx: &mut RequestContext, form: &FormData, id: Option<&str>) -> Response {
        self.guard(ctx)?;

        let id = post_id(id)?;
        let title = form.required("title")?.trim();
        if title.is_empty() {
            return Err(AppError::unprocessable("A title is required").into());
        }
        self.posts
            .update(id, title, form.get("body").unwrap_or_default())
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        ctx.session_mut().flash("status", "Saved");
        Redirect::route(ctx, "admin.edit")
            .with("id", id.to_string())
            .into()
    }

    /// Publish when `published` is `1`, otherwise take the post back to draft
    pub fn publish(&self, ctx: &mut RequestContext, form: &FormData, id: Option<&str>) -> Response {
        self.guard(ctx)?;

        let id = post_id(id)?;
        let published = form.get("published") == Some("1");
        self.posts
            .set_published(id, published)
            .ok_or_else(|| AppError::not_found("Post not found"))?;
        info!(post = id, published, "publication changed");

        let status = if published { "Published" } else { "Unpublished" };
        ctx.session_mut().flash("status", status);
        Redirect::route(ctx, "admin.dashboard").into()
    }

    /// Redirect to the login form unless the session is logged in
    fn guard(&self, ctx: &RequestContext) -> Result<(), HttpResponse> {
        if ctx.session().has(ADMIN_FLAG) {
            return Ok(());
        }
        let redirect: Response = Redirect::route(ctx, "admin.login").into();
        match redirect {
            Ok(response) | Err(response) => Err(response),
        }
    }
}

fn post_id(raw: Option<&str>) -> Result<u64, FrameworkError> {
    raw.ok_or_else(|| FrameworkError::param("id"))?
        .parse()
        .map_err(|_| FrameworkError::param_parse("id", "u64"))
}
