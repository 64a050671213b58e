use crate::services::{safe_url, PostStore, Renderer};
use minijinja::context;
use press::{injectable, Actions, Controller, RequestContext, Response};
use std::sync::Arc;

#[injectable(register)]
pub struct HomeController {
    #[inject]
    posts: Arc<dyn PostStore>,
    #[inject]
    views: Arc<Renderer>,
}

impl Controller for HomeController {
    fn actions() -> Actions<Self> {
        Actions::new().get("index", Self::index)
    }
}

impl HomeController {
    /// List published posts, newest first
    pub fn index(&self, ctx: &mut RequestContext, _params: &[String]) -> Response {
        let mut items = Vec::new();
        for post in self.posts.published() {
            let url = ctx.route("posts.show", &[("id", &post.id.to_string())])?;
            items.push(context! { post => post, url => safe_url(url) });
        }

        self.views.view(
            "home.html",
            ctx.session().flashed("status"),
            context! { items => items },
        )
    }
}
