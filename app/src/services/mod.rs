pub mod mail;
pub mod posts;
pub mod render;
pub mod settings;

pub use mail::{LogMailer, MailError, Mailer};
pub use posts::{Comment, MemoryPostStore, Post, PostStore};
pub use render::{safe_url, Renderer};
pub use settings::SiteSettings;
