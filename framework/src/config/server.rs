use super::env::env;

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Larger request bodies are rejected with 413
    pub max_body_size: usize,
}

impl ServerConfig {
    /// Read `SERVER_HOST`, `SERVER_PORT` and `SERVER_MAX_BODY_SIZE`
    pub fn from_env() -> Self {
        Self {
            host: env("SERVER_HOST", "127.0.0.1".to_string()),
            port: env("SERVER_PORT", 8080),
            max_body_size: env("SERVER_MAX_BODY_SIZE", 2 * 1024 * 1024),
        }
    }

    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::from_env(),
        }
    }

    /// `host:port` for binding the listener
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Builder for ServerConfig
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = ServerConfig::builder()
            .host("0.0.0.0")
            .port(3000)
            .max_body_size(1024)
            .build();

        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.max_body_size, 1024);
    }
}
