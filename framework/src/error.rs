//! Framework-wide error types
//!
//! Three layers of errors flow through a request:
//! - [`ContainerError`] when the container cannot build a service
//! - [`DispatchError`] when a request cannot be routed to a handler method
//! - [`FrameworkError`] / [`AppError`] raised by handlers themselves
//!
//! All of them convert into an [`HttpResponse`](crate::http::HttpResponse) so the
//! top-level entry point can render a failure with `?`.

use crate::container::ServiceKey;
use std::fmt;
use thiserror::Error;

/// Errors raised while resolving services from the container
#[derive(Debug, Clone, Error)]
pub enum ContainerError {
    /// The key has no binding and nothing declared how to build it
    #[error("service '{key}' is not bound in the container")]
    NotBound {
        /// The requested key
        key: ServiceKey,
    },

    /// A constructor parameter has no binding, no default and is not a service
    #[error("cannot resolve parameter '{parameter}' of service '{service}'")]
    UnresolvableDependency {
        /// The service being constructed
        service: ServiceKey,
        /// The constructor parameter that could not be satisfied
        parameter: &'static str,
    },

    /// The key names an interface (trait object) with no concrete or factory binding
    #[error("service '{key}' is not instantiable: bind a concrete type or factory to it")]
    NotInstantiable {
        /// The abstract key
        key: ServiceKey,
    },

    /// A key reappeared on the resolution stack
    #[error("cyclic dependency detected: {cycle}")]
    CyclicDependency {
        /// Keys from the first occurrence back to the repeated key
        cycle: DependencyCycle,
    },

    /// The stored instance is not of the requested type
    #[error("service '{key}' does not hold a value of type {expected}")]
    TypeMismatch {
        /// The resolved key
        key: ServiceKey,
        /// The type the caller asked for
        expected: &'static str,
    },

    /// A resolved argument was requested under a name the descriptor never declared
    #[error("service '{service}' has no resolved argument named '{parameter}'")]
    MissingArgument {
        /// The service being constructed
        service: ServiceKey,
        /// The parameter name that was looked up
        parameter: &'static str,
    },

    /// A factory or constructor reported its own failure
    #[error("failed to build service '{key}': {message}")]
    Construction {
        /// The service being built
        key: ServiceKey,
        /// Description of the failure
        message: String,
    },
}

impl ContainerError {
    /// Create a Construction error, for use inside factories and constructors
    pub fn construction(key: impl Into<ServiceKey>, message: impl Into<String>) -> Self {
        Self::Construction {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether this error means "the type cannot be produced as a service",
    /// in which case a declared parameter default may be used instead.
    pub fn is_unresolvable(&self) -> bool {
        matches!(
            self,
            Self::NotBound { .. } | Self::NotInstantiable { .. } | Self::UnresolvableDependency { .. }
        )
    }
}

/// Ordered list of keys forming a dependency cycle, e.g. `A -> B -> A`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCycle(pub Vec<ServiceKey>);

impl DependencyCycle {
    /// Keys in the cycle, the repeated key appearing first and last
    pub fn keys(&self) -> &[ServiceKey] {
        &self.0
    }
}

impl fmt::Display for DependencyCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(ServiceKey::as_str).collect();
        write!(f, "{}", names.join(" -> "))
    }
}

/// A field that could not be filled during property injection
///
/// Never raised: collected into an [`InjectionReport`](crate::container::InjectionReport)
/// and logged, while the field keeps its zero value.
#[derive(Debug, Clone, Error)]
#[error("property '{field}' of '{service}' left unset: {source}")]
pub struct InjectionFailure {
    /// The service whose field was being injected
    pub service: ServiceKey,
    /// The field name
    pub field: &'static str,
    /// Why the collaborator could not be resolved
    pub source: ContainerError,
}

/// Errors raised while routing a request to a handler method
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// No route table entry has a matching segment structure
    #[error("no route matches '{path}'")]
    RouteNotFound {
        /// The request path as received
        path: String,
    },

    /// The verb is not GET/POST, or no route for this path accepts it
    #[error("method {verb} is not supported for '{path}'")]
    MethodNotSupported {
        /// The request verb
        verb: String,
        /// The request path
        path: String,
    },

    /// The handler resolved for a route lacks the declared method
    #[error("handler '{handler}' has no method '{method}'")]
    HandlerMethodNotFound {
        /// The handler service key
        handler: ServiceKey,
        /// The declared method name
        method: String,
    },

    /// Building the handler or one of its collaborators failed
    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl DispatchError {
    /// HTTP status code the top-level entry point should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RouteNotFound { .. } => 404,
            Self::MethodNotSupported { .. } => 405,
            Self::HandlerMethodNotFound { .. } => 500,
            Self::Container(_) => 500,
        }
    }
}

/// Simple wrapper for creating one-off domain errors in handlers
///
/// # Example
///
/// ```rust,ignore
/// let post = self.posts.find(id).ok_or_else(|| AppError::not_found("Post not found"))?;
/// ```
#[derive(Debug, Clone)]
pub struct AppError {
    message: String,
    status_code: u16,
}

impl AppError {
    /// Create a new AppError with status 500 (Internal Server Error)
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: 500,
        }
    }

    /// Set the HTTP status code
    pub fn status(mut self, code: u16) -> Self {
        self.status_code = code;
        self
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message).status(404)
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message).status(400)
    }

    /// Create a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message).status(403)
    }

    /// Create a 422 Unprocessable Entity error
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(message).status(422)
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<AppError> for FrameworkError {
    fn from(e: AppError) -> Self {
        FrameworkError::Domain {
            message: e.message,
            status_code: e.status_code,
        }
    }
}

/// Errors raised by handlers and request plumbing
#[derive(Debug, Clone, Error)]
pub enum FrameworkError {
    /// A required route parameter or input field is missing
    #[error("Missing required parameter: {param_name}")]
    ParamError {
        /// The name of the missing parameter
        param_name: String,
    },

    /// A parameter could not be parsed to the expected type
    #[error("Invalid parameter '{param}': expected {expected_type}")]
    ParamParse {
        /// The raw value
        param: String,
        /// The expected type (e.g. "u64")
        expected_type: &'static str,
    },

    /// Request body could not be read or decoded
    #[error("Malformed request body: {0}")]
    Body(String),

    /// A named route does not exist
    #[error("Route '{0}' is not defined")]
    UnknownRoute(String),

    /// Resolving a collaborator from inside a handler failed
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Generic internal server error
    #[error("Internal server error: {message}")]
    Internal {
        /// The error message
        message: String,
    },

    /// Domain error with custom status code
    #[error("{message}")]
    Domain {
        /// The error message
        message: String,
        /// HTTP status code
        status_code: u16,
    },
}

impl FrameworkError {
    /// Create a ParamError for a missing parameter
    pub fn param(name: impl Into<String>) -> Self {
        Self::ParamError {
            param_name: name.into(),
        }
    }

    /// Create a ParamParse error (400)
    pub fn param_parse(param: impl Into<String>, expected_type: &'static str) -> Self {
        Self::ParamParse {
            param: param.into(),
            expected_type,
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ParamError { .. } => 400,
            Self::ParamParse { .. } => 400,
            Self::Body(_) => 400,
            Self::UnknownRoute(_) => 500,
            Self::Container(_) => 500,
            Self::Internal { .. } => 500,
            Self::Domain { status_code, .. } => *status_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_joins_keys() {
        let cycle = DependencyCycle(vec![
            ServiceKey::from("A"),
            ServiceKey::from("B"),
            ServiceKey::from("A"),
        ]);
        assert_eq!(cycle.to_string(), "A -> B -> A");
    }

    #[test]
    fn test_unresolvable_classification() {
        assert!(ContainerError::NotBound { key: "X".into() }.is_unresolvable());
        assert!(ContainerError::NotInstantiable { key: "X".into() }.is_unresolvable());
        assert!(!ContainerError::CyclicDependency {
            cycle: DependencyCycle(vec!["X".into(), "X".into()])
        }
        .is_unresolvable());
    }

    #[test]
    fn test_dispatch_status_codes() {
        let not_found = DispatchError::RouteNotFound { path: "/x".into() };
        assert_eq!(not_found.status_code(), 404);

        let verb = DispatchError::MethodNotSupported {
            verb: "PUT".into(),
            path: "/x".into(),
        };
        assert_eq!(verb.status_code(), 405);

        let container: DispatchError = ContainerError::NotBound { key: "X".into() }.into();
        assert_eq!(container.status_code(), 500);
    }

    #[test]
    fn test_app_error_into_framework_error() {
        let err: FrameworkError = AppError::not_found("Post not found").into();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "Post not found");
    }
}
