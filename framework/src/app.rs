//! Application builder
//!
//! Collects the bootstrap binding table and route table, validates them, and
//! runs the CLI.
//!
//! # Example
//!
//! ```rust,ignore
//! use press::Application;
//!
//! #[tokio::main]
//! async fn main() {
//!     Application::new()
//!         .bindings(bootstrap::register)
//!         .routes(routes::register)
//!         .run()
//!         .await;
//! }
//! ```

use crate::config::Config;
use crate::container::{BindingRegistry, ServiceKey};
use crate::dispatch::Dispatcher;
use crate::error::ContainerError;
use crate::logging;
use crate::routing::Router;
use crate::server::Server;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// CLI structure for Press applications
#[derive(Parser)]
#[command(name = "press")]
#[command(about = "Press application server and utilities")]
struct Cli {
    /// Directory holding the .env files
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server (default command)
    Serve {
        /// Override SERVER_HOST
        #[arg(long)]
        host: Option<String>,
        /// Override SERVER_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the route table in matching order
    Routes,
    /// Validate the binding graph and print the construction order
    #[command(name = "bindings:check")]
    BindingsCheck,
}

type BindingsFn = Box<dyn FnOnce(&mut BindingRegistry)>;

/// Application builder for Press
pub struct Application {
    config_fn: Option<Box<dyn FnOnce(Config) -> Config>>,
    bindings_fns: Vec<BindingsFn>,
    routes_fn: Option<Box<dyn FnOnce() -> Router>>,
    discover: bool,
}

impl Application {
    pub fn new() -> Self {
        Self {
            config_fn: None,
            bindings_fns: Vec::new(),
            routes_fn: None,
            discover: true,
        }
    }

    /// Adjust the loaded configuration before anything else starts
    pub fn config<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Config) -> Config + 'static,
    {
        self.config_fn = Some(Box::new(f));
        self
    }

    /// Add explicit bindings; called in order, after discovered services
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// Application::new()
    ///     .bindings(|registry| {
    ///         bind!(registry, dyn PostStore => MemoryPostStore);
    ///     })
    /// ```
    pub fn bindings<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut BindingRegistry) + 'static,
    {
        self.bindings_fns.push(Box::new(f));
        self
    }

    /// Skip `#[injectable(register)]` discovery
    pub fn without_discovery(mut self) -> Self {
        self.discover = false;
        self
    }

    /// Register a routes function
    pub fn routes<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> Router + 'static,
    {
        self.routes_fn = Some(Box::new(f));
        self
    }

    /// Build the binding table and route table without validating them
    pub fn build(self) -> (BindingRegistry, Router) {
        let mut registry = BindingRegistry::new();
        if self.discover {
            registry.discover();
        }
        for register in self.bindings_fns {
            register(&mut registry);
        }

        let router = self.routes_fn.map(|routes| routes()).unwrap_or_default();
        (registry, router)
    }

    /// Build and validate, returning a dispatcher ready to serve
    pub fn dispatcher(self) -> Result<Dispatcher, ContainerError> {
        let (registry, router) = self.build();
        check(&registry, &router)?;
        Ok(Dispatcher::new(Arc::new(router), Arc::new(registry)))
    }

    /// Parse CLI arguments and execute the command
    ///
    /// - `serve` (default): validate bindings, then run the web server
    /// - `routes`: print the route table
    /// - `bindings:check`: validate bindings and print the construction order
    pub async fn run(mut self) {
        let cli = Cli::parse();

        let mut config = Config::load(&cli.root);
        if let Some(config_fn) = self.config_fn.take() {
            config = config_fn(config);
        }
        logging::init(config.app.log_format, config.app.debug);
        info!(app = %config.app.name, environment = %config.app.environment, "booting");

        match cli.command {
            None => self.serve(config).await,
            Some(Commands::Serve { host, port }) => {
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                self.serve(config).await
            }
            Some(Commands::Routes) => {
                let (_, router) = self.build();
                print_routes(&router);
            }
            Some(Commands::BindingsCheck) => {
                let (registry, router) = self.build();
                match check(&registry, &router) {
                    Ok(order) => {
                        println!("{} bindings OK, construction order:", order.len());
                        for (i, key) in order.iter().enumerate() {
                            println!("  {:>3}. {}", i + 1, key);
                        }
                    }
                    Err(err) => {
                        eprintln!("binding check failed: {}", err);
                        std::process::exit(1);
                    }
                }
            }
        }
    }

    async fn serve(self, config: Config) {
        let dispatcher = match self.dispatcher() {
            Ok(dispatcher) => dispatcher,
            Err(err) => {
                error!(error = %err, "invalid bindings, refusing to start");
                std::process::exit(1);
            }
        };

        if let Err(err) = Server::from_config(dispatcher, &config).run().await {
            error!(error = %err, "server stopped");
            std::process::exit(1);
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate the binding graph and require a binding for every route handler
pub fn check(registry: &BindingRegistry, router: &Router) -> Result<Vec<ServiceKey>, ContainerError> {
    let order = registry.validate()?;
    for route in router.routes() {
        if !registry.contains(route.handler()) {
            return Err(ContainerError::NotBound {
                key: route.handler().clone(),
            });
        }
    }
    Ok(order)
}

fn print_routes(router: &Router) {
    println!("{:<6} {:<32} {:<40} {}", "VERB", "PATTERN", "HANDLER", "NAME");
    for route in router.routes() {
        let pattern = format!("/{}", route.pattern());
        let handler = format!("{}@{}", short_name(route.handler().as_str()), route.method());
        println!(
            "{:<6} {:<32} {:<40} {}",
            route.verb(),
            pattern,
            handler,
            route.name().unwrap_or("")
        );
    }
}

/// `app::controllers::post::PostController` -> `PostController`
fn short_name(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Arguments, Injectable};
    use crate::dispatch::{Actions, Controller};
    use crate::http::{HttpResponse, RequestContext, Response};

    struct StatusController;

    impl Injectable for StatusController {
        fn construct(_: &mut Arguments) -> Result<Self, ContainerError> {
            Ok(Self)
        }
    }

    impl Controller for StatusController {
        fn actions() -> Actions<Self> {
            Actions::new().get("show", Self::show)
        }
    }

    impl StatusController {
        fn show(&self, _: &mut RequestContext, _: &[String]) -> Response {
            Ok(HttpResponse::text("up"))
        }
    }

    fn routes() -> Router {
        Router::new().get::<StatusController>("status", "show").into()
    }

    #[test]
    fn test_unbound_route_handler_fails_check() {
        let err = Application::new()
            .without_discovery()
            .routes(routes)
            .dispatcher()
            .unwrap_err();
        assert!(matches!(err, ContainerError::NotBound { key } if key == StatusController::key()));
    }

    #[test]
    fn test_bindings_applied_in_order() {
        let dispatcher = Application::new()
            .without_discovery()
            .bindings(|registry| {
                registry.instance(1u32);
            })
            .bindings(|registry| {
                registry.instance(2u32).singleton::<StatusController>();
            })
            .routes(routes)
            .dispatcher()
            .unwrap();

        let mut container = dispatcher.container();
        let value = container.get_as::<u32>(&ServiceKey::of::<u32>()).unwrap();
        assert_eq!(*value, 2);
        assert_eq!(dispatcher.router().len(), 1);
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("app::controllers::PostController"), "PostController");
        assert_eq!(short_name("Home"), "Home");
    }
}
