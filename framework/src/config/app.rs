use super::env::{env, env_optional, Environment};
use crate::logging::LogFormat;

/// Application-level settings
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Shown in page titles and log lines
    pub name: String,
    pub environment: Environment,
    /// Include error details in responses
    pub debug: bool,
    /// Public base URL
    pub url: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read `APP_NAME`, `APP_ENV`, `APP_DEBUG`, `APP_URL` and `LOG_FORMAT`
    ///
    /// Debug output and pretty logs default on outside production.
    pub fn from_env() -> Self {
        let environment = Environment::detect();
        let production = environment.is_production();
        let log_format = env_optional("LOG_FORMAT").unwrap_or(if production {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        });

        Self {
            name: env("APP_NAME", "Press".to_string()),
            debug: env("APP_DEBUG", !production),
            url: env("APP_URL", "http://localhost:8080".to_string()),
            environment,
            log_format,
        }
    }

    /// Start from the environment and override individual settings
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder {
            config: Self::from_env(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Builder for AppConfig
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.log_format = format;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
