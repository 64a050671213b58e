use crate::services::{safe_url, Comment, Mailer, Post, PostStore, Renderer, SiteSettings};
use minijinja::context;
use press::{
    injectable, Actions, AppError, Controller, FormData, FrameworkError, HttpResponse, Redirect,
    RequestContext, Response,
};
use std::sync::Arc;
use tracing::{info, warn};

#[injectable(register)]
pub struct PostController {
    #[inject]
    posts: Arc<dyn PostStore>,
    #[inject]
    views: Arc<Renderer>,
    #[inject(instance)]
    settings: Arc<SiteSettings>,
    #[inject(optional)]
    mailer: Option<Arc<dyn Mailer>>,
}

impl Controller for PostController {
    fn actions() -> Actions<Self> {
        Actions::new()
            .get("show", Self::show)
            .post("comment", Self::comment)
    }
}

impl PostController {
    pub fn show(&self, ctx: &mut RequestContext, params: &[String]) -> Response {
        let post = self.published(params.first().map(String::as_str))?;
        let comment_url = ctx.route("posts.comment", &[("id", &post.id.to_string())])?;

        self.views.view(
            "post.html",
            ctx.session().flashed("status"),
            context! { post => post, comment_url => safe_url(comment_url) },
        )
    }

    /// Add a reader comment and notify the admin when a mailer is bound
    pub fn comment(&self, ctx: &mut RequestContext, form: &FormData, id: Option<&str>) -> Response {
        let post = self.published(id)?;

        let author = form.get("author").map(str::trim).unwrap_or_default();
        let body = form.get("body").map(str::trim).unwrap_or_default();
        if author.is_empty() || body.is_empty() {
            return Err(AppError::unprocessable("Name and comment are required").into());
        }

        self.posts
            .add_comment(
                post.id,
                Comment {
                    author: author.to_string(),
                    body: body.to_string(),
                },
            )
            .ok_or_else(|| AppError::not_found("Post not found"))?;
        info!(post = post.id, author, "comment added");

        if let Some(mailer) = &self.mailer {
            let subject = format!("New comment on \"{}\"", post.title);
            if let Err(err) = mailer.send(&self.settings.admin_email, &subject, body) {
                warn!(error = %err, post = post.id, "comment notification failed");
            }
        }

        ctx.session_mut().flash("status", "Comment added");
        Redirect::route(ctx, "posts.show")
            .with("id", post.id.to_string())
            .into()
    }

    fn published(&self, id: Option<&str>) -> Result<Post, HttpResponse> {
        let id: u64 = id
            .ok_or_else(|| FrameworkError::param("id"))?
            .parse()
            .map_err(|_| FrameworkError::param_parse("id", "u64"))?;
        self.posts
            .find(id)
            .filter(|post| post.published)
            .ok_or_else(|| AppError::not_found("Post not found").into())
    }
}
