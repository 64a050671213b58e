//! Declared dependency descriptors
//!
//! A constructible service lists its constructor dependencies as an ordered
//! table of [`Dependency`] entries instead of being introspected at runtime.
//! The container resolves each entry, hands the results to
//! [`Injectable::construct`] as [`Arguments`], then fills the optional
//! collaborators listed by [`Injectable::properties`].
//!
//! Most types get this implementation from `#[injectable]`:
//!
//! ```rust,ignore
//! #[injectable]
//! pub struct PostController {
//!     #[inject]
//!     posts: Arc<dyn PostStore>,
//!     #[inject]
//!     views: Arc<Renderer>,
//!     #[inject(optional)]
//!     mailer: Option<Arc<dyn Mailer>>,
//! }
//! ```

use super::binding::{ClassBinding, Instance, ServiceKey};
use crate::error::ContainerError;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A service the container can construct from a declared dependency table
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Key this type is bound under by default
    fn key() -> ServiceKey {
        ServiceKey::of::<Self>()
    }

    /// Ordered constructor dependencies; empty means "no-argument constructor"
    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }

    /// Build the value from resolved arguments
    fn construct(args: &mut Arguments) -> Result<Self, ContainerError>;

    /// Optional collaborators filled after construction, best-effort
    fn properties() -> Vec<Property<Self>> {
        Vec::new()
    }
}

type DefaultFn = Arc<dyn Fn() -> Instance + Send + Sync>;

/// What a dependency entry points at
#[derive(Clone)]
pub enum DependencyKind {
    /// A concrete service. `class` is the type's own descriptor when the
    /// dependency was declared with a Rust type, used when the key is unbound.
    Service {
        key: ServiceKey,
        class: Option<ClassBinding>,
    },
    /// A trait object; only resolvable through an explicit binding
    Interface { key: ServiceKey },
    /// A plain value: supplied by caller parameters or a default
    Value,
}

/// One constructor parameter in a service's dependency table
#[derive(Clone)]
pub struct Dependency {
    name: &'static str,
    kind: DependencyKind,
    default: Option<DefaultFn>,
}

impl Dependency {
    /// Dependency on a concrete service type
    pub fn service<T: Injectable>(name: &'static str) -> Self {
        Self {
            name,
            kind: DependencyKind::Service {
                key: T::key(),
                class: Some(ClassBinding::of::<T>()),
            },
            default: None,
        }
    }

    /// Dependency on an interface, e.g. `Dependency::interface::<dyn Mailer>("mailer")`
    pub fn interface<I: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            kind: DependencyKind::Interface {
                key: ServiceKey::of::<I>(),
            },
            default: None,
        }
    }

    /// Dependency on an arbitrary key that must be bound explicitly
    pub fn keyed(name: &'static str, key: impl Into<ServiceKey>) -> Self {
        Self {
            name,
            kind: DependencyKind::Service {
                key: key.into(),
                class: None,
            },
            default: None,
        }
    }

    /// Plain value parameter
    pub fn value(name: &'static str) -> Self {
        Self {
            name,
            kind: DependencyKind::Value,
            default: None,
        }
    }

    /// Value used when the parameter cannot be resolved as a service
    pub fn or_default<T, F>(mut self, default: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(move || Arc::new(default()) as Instance));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &DependencyKind {
        &self.kind
    }

    /// The service key this entry resolves through, if any
    pub fn key(&self) -> Option<&ServiceKey> {
        match &self.kind {
            DependencyKind::Service { key, .. } | DependencyKind::Interface { key } => Some(key),
            DependencyKind::Value => None,
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub(crate) fn default_value(&self) -> Option<Instance> {
        self.default.as_ref().map(|default| default())
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("name", &self.name)
            .field("key", &self.key())
            .field("has_default", &self.has_default())
            .finish()
    }
}

/// Resolved constructor arguments, looked up by parameter name
pub struct Arguments {
    service: ServiceKey,
    values: Vec<(&'static str, Instance)>,
}

impl Arguments {
    pub(crate) fn new(service: ServiceKey) -> Self {
        Self {
            service,
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, name: &'static str, value: Instance) {
        self.values.push((name, value));
    }

    /// The service these arguments are being resolved for
    pub fn service_key(&self) -> &ServiceKey {
        &self.service
    }

    fn raw(&self, name: &'static str) -> Result<&Instance, ContainerError> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
            .ok_or_else(|| ContainerError::MissingArgument {
                service: self.service.clone(),
                parameter: name,
            })
    }

    fn mismatch<T: ?Sized>(&self) -> ContainerError {
        ContainerError::TypeMismatch {
            key: self.service.clone(),
            expected: type_name::<T>(),
        }
    }

    /// A concrete service argument
    pub fn service<T: Any + Send + Sync>(&self, name: &'static str) -> Result<Arc<T>, ContainerError> {
        self.raw(name)?
            .clone()
            .downcast::<T>()
            .map_err(|_| self.mismatch::<T>())
    }

    /// An interface argument, e.g. `args.interface::<dyn Mailer>("mailer")`
    pub fn interface<I: ?Sized + Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> Result<Arc<I>, ContainerError> {
        self.raw(name)?
            .downcast_ref::<Arc<I>>()
            .cloned()
            .ok_or_else(|| self.mismatch::<I>())
    }

    /// A plain value argument, cloned out of the resolved slot
    pub fn value<T: Any + Clone>(&self, name: &'static str) -> Result<T, ContainerError> {
        self.raw(name)?
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| self.mismatch::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

type AssignFn<T> = Arc<dyn Fn(&mut T, Instance) -> Result<(), ContainerError> + Send + Sync>;

/// An optional collaborator field filled by property injection
pub struct Property<T> {
    dependency: Dependency,
    assign: AssignFn<T>,
}

impl<T: 'static> Property<T> {
    /// Optional concrete service field
    pub fn service<S, F>(name: &'static str, assign: F) -> Self
    where
        S: Injectable,
        F: Fn(&mut T, Arc<S>) + Send + Sync + 'static,
    {
        Self {
            dependency: Dependency::service::<S>(name),
            assign: Arc::new(move |target: &mut T, value: Instance| {
                let value = value.downcast::<S>().map_err(|_| ContainerError::TypeMismatch {
                    key: S::key(),
                    expected: type_name::<S>(),
                })?;
                assign(target, value);
                Ok(())
            }),
        }
    }

    /// Optional interface field
    pub fn interface<I, F>(name: &'static str, assign: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&mut T, Arc<I>) + Send + Sync + 'static,
    {
        Self {
            dependency: Dependency::interface::<I>(name),
            assign: Arc::new(move |target: &mut T, value: Instance| {
                let value = value
                    .downcast_ref::<Arc<I>>()
                    .cloned()
                    .ok_or_else(|| ContainerError::TypeMismatch {
                        key: ServiceKey::of::<I>(),
                        expected: type_name::<I>(),
                    })?;
                assign(target, value);
                Ok(())
            }),
        }
    }

    /// Field name
    pub fn name(&self) -> &'static str {
        self.dependency.name()
    }

    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    pub(crate) fn assign(&self, target: &mut T, value: Instance) -> Result<(), ContainerError> {
        (self.assign)(target, value)
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("dependency", &self.dependency)
            .finish()
    }
}
