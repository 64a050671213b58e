//! Configuration loaded once at startup
//!
//! - `.env` file loading with environment-based precedence
//! - Typed [`AppConfig`] and [`ServerConfig`] structs with builders
//!
//! The resulting [`Config`] is passed to the server explicitly; nothing is
//! stored in globals.
//!
//! # Example
//!
//! ```rust,no_run
//! use press::Config;
//!
//! let config = Config::load(std::path::Path::new("."));
//! println!("{} listening on {}", config.app.name, config.server.addr());
//! ```

mod app;
pub mod env;
mod server;

pub use app::{AppConfig, AppConfigBuilder};
pub use env::{env, env_optional, env_required, load_dotenv, ConfigError, Environment};
pub use server::{ServerConfig, ServerConfigBuilder};

use std::path::Path;

/// All framework settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load `.env` files from `project_root`, then read every setting
    pub fn load(project_root: &Path) -> Self {
        load_dotenv(project_root);
        Self::from_env()
    }

    /// Read settings from the process environment only
    pub fn from_env() -> Self {
        Self {
            app: AppConfig::from_env(),
            server: ServerConfig::from_env(),
        }
    }

    pub fn with_app(mut self, app: AppConfig) -> Self {
        self.app = app;
        self
    }

    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.app.environment
    }
}
