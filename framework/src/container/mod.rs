//! Request-scoped dependency container
//!
//! - Bindings: class descriptors, factories and pre-built instances, keyed by [`ServiceKey`]
//! - Singleton cache: class and instance resolutions memoized per container
//! - Autowiring: class descriptors declare their dependencies, resolved recursively
//! - Property injection: optional collaborators filled best-effort after construction
//!
//! The bootstrap [`BindingRegistry`] is shared read-only; every request gets a
//! fresh [`Container`] over it with its own instance cache and local overrides.
//!
//! # Example
//!
//! ```rust,ignore
//! use press::{bind, singleton, BindingRegistry, Container};
//!
//! let mut registry = BindingRegistry::new();
//! bind!(registry, dyn PostStore => MemoryPostStore);
//! singleton!(registry, PostController);
//!
//! let registry = Arc::new(registry);
//! let mut container = Container::from_registry(registry.clone());
//! let controller: Arc<PostController> = container.resolve()?;
//! ```

pub mod binding;
pub mod injectable;
pub mod provider;

pub use binding::{Binding, BindingRegistry, ClassBinding, FactoryFn, Instance, Parameters, ServiceKey};
pub use injectable::{Arguments, Dependency, DependencyKind, Injectable, Property};

use binding::{GraphWalk, Lookup};

use crate::error::{ContainerError, DependencyCycle, InjectionFailure};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Outcome of a property injection pass
#[derive(Debug, Default)]
pub struct InjectionReport {
    /// Fields that were filled
    pub injected: Vec<&'static str>,
    /// Fields left unset, with the reason
    pub failures: Vec<InjectionFailure>,
}

impl InjectionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Service container for a single request
pub struct Container {
    /// Bootstrap bindings shared by all requests
    shared: Arc<BindingRegistry>,
    /// Bindings registered on this container only; shadow `shared`
    local: HashMap<ServiceKey, Binding>,
    /// Singleton cache
    instances: HashMap<ServiceKey, Instance>,
    /// Keys currently mid-construction, outermost first
    resolving: Vec<ServiceKey>,
    /// Keys cached during the current top-level resolution
    pending: Vec<ServiceKey>,
}

impl Container {
    /// Create an empty container with no bootstrap bindings
    pub fn new() -> Self {
        Self::from_registry(Arc::new(BindingRegistry::new()))
    }

    /// Create a container over a shared bootstrap binding table
    pub fn from_registry(shared: Arc<BindingRegistry>) -> Self {
        Self {
            shared,
            local: HashMap::new(),
            instances: HashMap::new(),
            resolving: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Register a binding on this container, replacing any binding for the key
    ///
    /// A cached instance for the key is dropped so the new binding takes effect.
    pub fn register(&mut self, key: impl Into<ServiceKey>, binding: Binding) -> &mut Self {
        let key = key.into();
        self.instances.remove(&key);
        self.local.insert(key, binding);
        self
    }

    /// Register a concrete type under its own key
    pub fn singleton<T: Injectable>(&mut self) -> &mut Self {
        self.register(T::key(), Binding::Class(ClassBinding::of::<T>()))
    }

    /// Bind an interface key to a concrete implementation
    pub fn bind<I, C>(&mut self, cast: fn(Arc<C>) -> Arc<I>) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
        C: Injectable,
    {
        self.register(
            ServiceKey::of::<I>(),
            Binding::Class(ClassBinding::implementation::<I, C>(cast)),
        )
    }

    /// Register a factory under a key
    pub fn factory<F>(&mut self, key: impl Into<ServiceKey>, factory: F) -> &mut Self
    where
        F: Fn(&mut Container, &Parameters) -> Result<Instance, ContainerError> + Send + Sync + 'static,
    {
        self.register(key, Binding::factory(factory))
    }

    /// Register a pre-built value under its type key
    pub fn instance<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.register(ServiceKey::of::<T>(), Binding::instance(value))
    }

    /// Register a pre-built trait object under the interface key
    pub fn instance_of<I: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<I>) -> &mut Self {
        self.register(ServiceKey::of::<I>(), Binding::Instance(Arc::new(value)))
    }

    /// The binding in effect for a key: local first, then bootstrap
    pub fn binding(&self, key: &ServiceKey) -> Option<Binding> {
        self.local
            .get(key)
            .or_else(|| self.shared.get(key))
            .cloned()
    }

    /// Check whether a key has a binding
    pub fn has(&self, key: &ServiceKey) -> bool {
        self.local.contains_key(key) || self.shared.contains(key)
    }

    /// Check whether a key already has a cached instance
    pub fn is_resolved(&self, key: &ServiceKey) -> bool {
        self.instances.contains_key(key)
    }

    /// Drop the cached instance for a key; the next `get` rebuilds it
    pub fn forget_instance(&mut self, key: &ServiceKey) -> Option<Instance> {
        self.instances.remove(key)
    }

    /// Resolve a key to its instance
    ///
    /// Unbound keys are a configuration error ([`ContainerError::NotBound`]).
    pub fn get(&mut self, key: &ServiceKey) -> Result<Instance, ContainerError> {
        self.get_with(key, &Parameters::default())
    }

    /// Resolve a key, passing parameters to its factory or constructor
    pub fn get_with(&mut self, key: &ServiceKey, parameters: &Parameters) -> Result<Instance, ContainerError> {
        self.top_level(|c| c.resolve_key(key, parameters))
    }

    /// Resolve a key and downcast it to a concrete type
    pub fn get_as<T: Any + Send + Sync>(&mut self, key: &ServiceKey) -> Result<Arc<T>, ContainerError> {
        self.get(key)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                key: key.clone(),
                expected: type_name::<T>(),
            })
    }

    /// Resolve a concrete type
    ///
    /// Uses the binding for `T::key()` when there is one, otherwise builds `T`
    /// from its own descriptor and caches it under that key.
    pub fn resolve<T: Injectable>(&mut self) -> Result<Arc<T>, ContainerError> {
        let key = T::key();
        let instance = self.top_level(|c| c.resolve_service(&key, Some(&ClassBinding::of::<T>())))?;
        instance.downcast::<T>().map_err(|_| ContainerError::TypeMismatch {
            key,
            expected: type_name::<T>(),
        })
    }

    /// Resolve an interface binding, e.g. `container.make::<dyn Mailer>()`
    pub fn make<I: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<I>, ContainerError> {
        let key = ServiceKey::of::<I>();
        let instance = self.top_level(|c| c.resolve_interface(&key))?;
        instance
            .downcast_ref::<Arc<I>>()
            .cloned()
            .ok_or(ContainerError::TypeMismatch {
                key,
                expected: type_name::<I>(),
            })
    }

    /// Fill the optional collaborator fields of an already-constructed value
    ///
    /// Never fails: a field whose service cannot be resolved is logged,
    /// reported and left at its zero value.
    pub fn inject_properties<T: Injectable>(&mut self, target: &mut T) -> InjectionReport {
        let owner = T::key();
        let mut report = InjectionReport::default();

        for property in T::properties() {
            let resolved = self
                .resolve_dependency(&owner, property.dependency())
                .and_then(|value| property.assign(target, value));

            match resolved {
                Ok(()) => report.injected.push(property.name()),
                Err(source) => {
                    warn!(
                        service = %owner,
                        field = property.name(),
                        error = %source,
                        "property injection failed, leaving field unset"
                    );
                    report.failures.push(InjectionFailure {
                        service: owner.clone(),
                        field: property.name(),
                        source,
                    });
                }
            }
        }

        report
    }

    /// Run an outermost resolution; on failure, drop anything it cached
    fn top_level<F>(&mut self, resolve: F) -> Result<Instance, ContainerError>
    where
        F: FnOnce(&mut Self) -> Result<Instance, ContainerError>,
    {
        if !self.resolving.is_empty() {
            return resolve(self);
        }

        self.pending.clear();
        let result = resolve(self);
        if result.is_err() {
            for key in self.pending.drain(..) {
                self.instances.remove(&key);
            }
        }
        self.pending.clear();
        result
    }

    fn resolve_key(&mut self, key: &ServiceKey, parameters: &Parameters) -> Result<Instance, ContainerError> {
        if parameters.is_empty() {
            if let Some(instance) = self.instances.get(key) {
                trace!(service = %key, "resolved from cache");
                return Ok(instance.clone());
            }
        }

        let binding = self
            .binding(key)
            .ok_or_else(|| ContainerError::NotBound { key: key.clone() })?;
        self.resolve_binding(key, binding, parameters)
    }

    fn resolve_binding(
        &mut self,
        key: &ServiceKey,
        binding: Binding,
        parameters: &Parameters,
    ) -> Result<Instance, ContainerError> {
        match binding {
            Binding::Instance(instance) => {
                self.remember(key, instance.clone());
                Ok(instance)
            }
            Binding::Factory(factory) => self.guarded(key, |c| factory(c, parameters)),
            Binding::Class(class) => {
                // Constructors run only once the whole chain is known to resolve
                self.check_buildable(key, &class, parameters)?;
                let instance = self.guarded(key, |c| c.build(key, &class, parameters))?;
                debug!(service = %key, class = class.type_name(), "constructed");
                // Parameterized builds are one-offs and never become the singleton
                if parameters.is_empty() {
                    self.remember(key, instance.clone());
                }
                Ok(instance)
            }
        }
    }

    /// Resolve a concrete service key, falling back to the type's own descriptor
    fn resolve_service(&mut self, key: &ServiceKey, class: Option<&ClassBinding>) -> Result<Instance, ContainerError> {
        if self.is_resolved(key) || self.has(key) {
            return self.resolve_key(key, &Parameters::default());
        }
        match class {
            Some(class) => self.resolve_binding(key, Binding::Class(class.clone()), &Parameters::default()),
            None => Err(ContainerError::NotBound { key: key.clone() }),
        }
    }

    /// Resolve an interface key; without a binding it cannot be instantiated
    fn resolve_interface(&mut self, key: &ServiceKey) -> Result<Instance, ContainerError> {
        if self.is_resolved(key) || self.has(key) {
            return self.resolve_key(key, &Parameters::default());
        }
        Err(ContainerError::NotInstantiable { key: key.clone() })
    }

    fn resolve_dependency(&mut self, owner: &ServiceKey, dependency: &Dependency) -> Result<Instance, ContainerError> {
        let resolved = match dependency.kind() {
            DependencyKind::Service { key, class } => self.resolve_service(key, class.as_ref()),
            DependencyKind::Interface { key } => self.resolve_interface(key),
            DependencyKind::Value => Err(ContainerError::UnresolvableDependency {
                service: owner.clone(),
                parameter: dependency.name(),
            }),
        };

        match resolved {
            Err(e) if e.is_unresolvable() => dependency.default_value().ok_or(e),
            other => other,
        }
    }

    /// Walk `class`'s dependency chain against the bindings and cache in effect
    fn check_buildable(
        &self,
        key: &ServiceKey,
        class: &ClassBinding,
        parameters: &Parameters,
    ) -> Result<(), ContainerError> {
        let lookup = |k: &ServiceKey| {
            if self.instances.contains_key(k) {
                return Lookup::Cached;
            }
            match self.binding(k) {
                Some(binding) => Lookup::Bound(binding),
                None => Lookup::Unbound,
            }
        };
        let supplied = (!parameters.is_empty()).then_some(parameters);
        GraphWalk::new(&lookup).visit_class(key, class, supplied)
    }

    /// Resolve every declared constructor argument, then construct
    fn build(
        &mut self,
        key: &ServiceKey,
        class: &ClassBinding,
        parameters: &Parameters,
    ) -> Result<Instance, ContainerError> {
        let mut args = Arguments::new(key.clone());
        for dependency in class.dependencies() {
            let value = match parameters.get(dependency.name()) {
                Some(value) => value.clone(),
                None => self.resolve_dependency(key, &dependency)?,
            };
            args.push(dependency.name(), value);
        }
        class.build(self, args)
    }

    /// Push `key` on the resolution stack for the duration of `f`
    fn guarded<F>(&mut self, key: &ServiceKey, f: F) -> Result<Instance, ContainerError>
    where
        F: FnOnce(&mut Self) -> Result<Instance, ContainerError>,
    {
        if let Some(pos) = self.resolving.iter().position(|k| k == key) {
            let mut cycle = self.resolving[pos..].to_vec();
            cycle.push(key.clone());
            return Err(ContainerError::CyclicDependency {
                cycle: DependencyCycle(cycle),
            });
        }

        self.resolving.push(key.clone());
        let result = f(self);
        self.resolving.pop();
        result
    }

    fn remember(&mut self, key: &ServiceKey, instance: Instance) {
        if self.instances.insert(key.clone(), instance).is_none() {
            self.pending.push(key.clone());
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

/// Bind an interface to a concrete implementation
///
/// # Example
/// ```rust,ignore
/// bind!(registry, dyn PostStore => MemoryPostStore);
/// ```
#[macro_export]
macro_rules! bind {
    ($target:expr, $trait:ty => $concrete:ty) => {
        $target.bind::<$trait, $concrete>(|concrete| concrete as ::std::sync::Arc<$trait>)
    };
}

/// Register a concrete type under its own key
///
/// # Example
/// ```rust,ignore
/// singleton!(registry, PostController);
/// ```
#[macro_export]
macro_rules! singleton {
    ($target:expr, $ty:ty) => {
        $target.singleton::<$ty>()
    };
}

/// Register a factory closure under a key
///
/// # Example
/// ```rust,ignore
/// factory!(registry, "audit", |container, params| Ok(Arc::new(AuditLog::new()) as Instance));
/// ```
#[macro_export]
macro_rules! factory {
    ($target:expr, $key:expr, $factory:expr) => {
        $target.factory($key, $factory)
    };
}

/// Register a pre-built value, optionally under an interface key
///
/// # Example
/// ```rust,ignore
/// instance!(registry, AppConfig::from_env());
/// instance!(registry, dyn PostStore => MemoryPostStore::seeded());
/// ```
#[macro_export]
macro_rules! instance {
    ($target:expr, dyn $trait:path => $value:expr) => {
        $target.instance_of::<dyn $trait>(::std::sync::Arc::new($value) as ::std::sync::Arc<dyn $trait>)
    };
    ($target:expr, $value:expr) => {
        $target.instance($value)
    };
}
