pub mod admin;
pub mod home;
pub mod post;

pub use admin::AdminController;
pub use home::HomeController;
pub use post::PostController;
