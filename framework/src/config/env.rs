use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// A configuration value that is required but missing or malformed
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(String),

    #[error("environment variable {key} has invalid value '{value}'")]
    Invalid { key: String, value: String },
}

/// Deployment environment, read from `APP_ENV`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Local,
    Development,
    Staging,
    Production,
    Testing,
    Custom(String),
}

impl Environment {
    /// Detect environment from APP_ENV or default to Local
    pub fn detect() -> Self {
        std::env::var("APP_ENV")
            .map(|name| Self::from_name(&name))
            .unwrap_or(Self::Local)
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "" | "local" => Self::Local,
            "development" | "dev" => Self::Development,
            "staging" => Self::Staging,
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Local => "local",
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Testing => "testing",
            Self::Custom(name) => name,
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment (local or development)
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Local | Self::Development)
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `.env` files for `env`, most specific first
pub fn dotenv_files(project_root: &Path, env: &Environment) -> Vec<PathBuf> {
    vec![
        project_root.join(format!(".env.{}.local", env)),
        project_root.join(format!(".env.{}", env)),
        project_root.join(".env.local"),
        project_root.join(".env"),
    ]
}

/// Load environment variables from .env files with proper precedence
///
/// Precedence, highest first:
/// 1. Actual process environment
/// 2. `.env.{environment}.local`
/// 3. `.env.{environment}`
/// 4. `.env.local`
/// 5. `.env`
///
/// dotenvy never overwrites a variable that is already set, so files are
/// loaded most specific first. Missing files are skipped.
pub fn load_dotenv(project_root: &Path) -> Environment {
    let env = Environment::detect();

    for path in dotenv_files(project_root, &env) {
        if dotenvy::from_path(&path).is_ok() {
            debug!(file = %path.display(), "loaded env file");
        }
    }

    // APP_ENV may itself come from a .env file
    Environment::detect()
}

/// Get an environment variable with a default value
///
/// Unset and unparseable values both fall back to `default`.
///
/// # Example
/// ```rust,ignore
/// let port: u16 = env("SERVER_PORT", 8080);
/// ```
pub fn env<T: FromStr>(key: &str, default: T) -> T {
    env_optional(key).unwrap_or(default)
}

/// Get an optional environment variable
pub fn env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Get a required environment variable
///
/// # Example
/// ```rust,ignore
/// let secret: String = env_required("APP_KEY")?;
/// ```
pub fn env_required<T: FromStr>(key: &str) -> Result<T, ConfigError> {
    let raw = std::env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))?;
    raw.parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_environment_names() {
        assert_eq!(Environment::from_name("prod"), Environment::Production);
        assert_eq!(Environment::from_name(""), Environment::Local);
        assert_eq!(
            Environment::from_name("qa"),
            Environment::Custom("qa".to_string())
        );
        assert_eq!(Environment::Development.to_string(), "development");
        assert!(Environment::Local.is_development());
        assert!(!Environment::Staging.is_development());
    }

    #[test]
    fn test_dotenv_files_most_specific_first() {
        let files = dotenv_files(Path::new("/app"), &Environment::Production);
        let names: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "/app/.env.production.local",
                "/app/.env.production",
                "/app/.env.local",
                "/app/.env",
            ]
        );
    }

    #[test]
    fn test_env_helpers() {
        std::env::set_var("PRESS_TEST_PORT", "9001");
        std::env::set_var("PRESS_TEST_BAD_PORT", "nine");

        assert_eq!(env::<u16>("PRESS_TEST_PORT", 1), 9001);
        assert_eq!(env::<u16>("PRESS_TEST_BAD_PORT", 1), 1);
        assert_eq!(env_optional::<u16>("PRESS_TEST_UNSET"), None);
        assert!(matches!(
            env_required::<u16>("PRESS_TEST_BAD_PORT"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            env_required::<String>("PRESS_TEST_UNSET"),
            Err(ConfigError::Missing(_))
        ));
    }
}
