//! Press: request dispatch for a small MVC blog
//!
//! An incoming path is matched against an ordered route table, the matched
//! handler is built by a request-scoped dependency container, and the
//! declared handler method is invoked with the captured parameters (GET) or
//! the submitted body (POST).
//!
//! ```text
//! path -> Router::match_request -> Dispatcher -> Container::get -> handler method
//! ```

// Lets `#[injectable]` expansions refer to `::press` from inside this crate
extern crate self as press;

pub mod app;
pub mod config;
pub mod container;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod logging;
pub mod routing;
pub mod server;

pub use app::Application;
pub use config::{AppConfig, Config, Environment, ServerConfig};
pub use container::{
    Arguments, Binding, BindingRegistry, Container, Dependency, Injectable, InjectionReport,
    Parameters, Property, ServiceKey,
};
pub use dispatch::{Actions, Controller, Dispatcher};
pub use error::{AppError, ContainerError, DispatchError, FrameworkError};
pub use http::{FormData, HttpResponse, Redirect, RequestContext, Response, ResponseExt};
pub use routing::{RouteDefinition, Router, Verb};
pub use server::Server;

// Used by `#[injectable(register)]` expansions
pub use inventory;

pub use press_macros::injectable;
