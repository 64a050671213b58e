use press::config::env;

/// Blog-wide settings, bound as a pre-built instance at bootstrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub title: String,
    /// Receives new-comment notifications
    pub admin_email: String,
    /// Shared secret for the admin console
    pub admin_password: String,
}

impl SiteSettings {
    /// Read `BLOG_TITLE`, `ADMIN_EMAIL` and `ADMIN_PASSWORD`
    pub fn from_env() -> Self {
        Self {
            title: env("BLOG_TITLE", "Press Blog".to_string()),
            admin_email: env("ADMIN_EMAIL", "admin@localhost".to_string()),
            admin_password: env("ADMIN_PASSWORD", "secret".to_string()),
        }
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "Press Blog".to_string(),
            admin_email: "admin@localhost".to_string(),
            admin_password: "secret".to_string(),
        }
    }
}
