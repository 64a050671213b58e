use crate::controllers::{AdminController, HomeController, PostController};
use press::Router;

pub fn register() -> Router {
    Router::new()
        .get::<HomeController>("", "index")
        .name("home")
        .get::<PostController>("post/{id}", "show")
        .name("posts.show")
        .post::<PostController>("post/{id}/comment", "comment")
        .name("posts.comment")
        .group("admin", |r| {
            r.get::<AdminController>("", "dashboard")
                .name("admin.dashboard")
                .get::<AdminController>("login", "login")
                .name("admin.login")
                .post::<AdminController>("login", "authenticate")
                .post::<AdminController>("logout", "logout")
                .name("admin.logout")
                .post::<AdminController>("post", "create")
                .name("admin.create")
                .get::<AdminController>("post/{id}", "edit")
                .name("admin.edit")
                .post::<AdminController>("post/{id}", "save")
                .post::<AdminController>("post/{id}/publish", "publish")
                .name("admin.publish")
        })
}
