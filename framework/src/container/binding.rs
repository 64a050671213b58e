//! Service keys, bindings and the bootstrap binding table

use super::injectable::{Arguments, Dependency, DependencyKind, Injectable};
use super::Container;
use crate::error::{ContainerError, DependencyCycle};
use std::any::{type_name, Any};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Type-erased service instance shared between the cache and its consumers
///
/// Concrete services are stored as `Arc<T>`. Interface bindings store the
/// trait object as `Arc<Arc<dyn Trait>>` so it can be recovered with
/// `downcast_ref::<Arc<dyn Trait>>()`.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Factory closure: receives the container and caller parameters
pub type FactoryFn =
    Arc<dyn Fn(&mut Container, &Parameters) -> Result<Instance, ContainerError> + Send + Sync>;

type BuildFn = Arc<dyn Fn(&mut Container, Arguments) -> Result<Instance, ContainerError> + Send + Sync>;

/// Abstract identifier used to request a service
///
/// Typed keys are the type name (`ServiceKey::of::<T>()`); string keys may be
/// used for factories and instances that have no Rust type of their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey(Cow<'static, str>);

impl ServiceKey {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Key for a type, including trait objects (`ServiceKey::of::<dyn Mailer>()`)
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Cow::Borrowed(type_name::<T>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ServiceKey {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for ServiceKey {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&ServiceKey> for ServiceKey {
    fn from(key: &ServiceKey) -> Self {
        key.clone()
    }
}

/// Named values passed alongside a resolution request
///
/// Factories receive them verbatim. Class bindings use a parameter whose name
/// matches a constructor dependency instead of resolving that dependency.
#[derive(Clone, Default)]
pub struct Parameters {
    values: HashMap<String, Instance>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter value
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.values.insert(name.into(), Arc::new(value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    /// Read a parameter as a cloned value of type `T`
    pub fn value<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.values.get(name)?.downcast_ref::<T>().cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// Constructor descriptor for a concrete type: its dependency table and builder
#[derive(Clone)]
pub struct ClassBinding {
    type_name: &'static str,
    dependencies: fn() -> Vec<Dependency>,
    build: BuildFn,
}

impl ClassBinding {
    /// Descriptor built from a type's [`Injectable`] implementation
    ///
    /// After construction the new value goes through property injection
    /// before it is shared.
    pub fn of<T: Injectable>() -> Self {
        Self {
            type_name: type_name::<T>(),
            dependencies: T::dependencies,
            build: Arc::new(|container: &mut Container, mut args: Arguments| {
                let mut value = T::construct(&mut args)?;
                container.inject_properties(&mut value);
                Ok(Arc::new(value) as Instance)
            }),
        }
    }

    /// Descriptor for an interface implemented by concrete `C`
    ///
    /// Declares a single dependency on `C`, so the concrete value is resolved
    /// (and cached) under its own key and shared with the interface key.
    pub fn implementation<I, C>(cast: fn(Arc<C>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        C: Injectable,
    {
        Self {
            type_name: type_name::<C>(),
            dependencies: concrete_dependency::<C>,
            build: Arc::new(move |_: &mut Container, args: Arguments| {
                let concrete = args.service::<C>(IMPLEMENTATION)?;
                Ok(Arc::new(cast(concrete)) as Instance)
            }),
        }
    }

    /// Name of the concrete type this descriptor builds
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The ordered constructor dependency table
    pub fn dependencies(&self) -> Vec<Dependency> {
        (self.dependencies)()
    }

    pub(crate) fn build(&self, container: &mut Container, args: Arguments) -> Result<Instance, ContainerError> {
        (self.build)(container, args)
    }
}

impl fmt::Debug for ClassBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBinding")
            .field("type_name", &self.type_name)
            .finish()
    }
}

const IMPLEMENTATION: &str = "implementation";

fn concrete_dependency<C: Injectable>() -> Vec<Dependency> {
    vec![Dependency::service::<C>(IMPLEMENTATION)]
}

/// How a key produces its instance
#[derive(Clone)]
pub enum Binding {
    /// Concrete type built from its descriptor, cached per container
    Class(ClassBinding),
    /// Closure invoked on every resolution, never cached
    Factory(FactoryFn),
    /// Pre-built value, returned as-is
    Instance(Instance),
}

impl Binding {
    /// Build a factory binding from a closure
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&mut Container, &Parameters) -> Result<Instance, ContainerError> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    /// Build an instance binding from a value
    pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
        Self::Instance(Arc::new(value))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Class(_) => "class",
            Self::Factory(_) => "factory",
            Self::Instance(_) => "instance",
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(class) => f.debug_tuple("Class").field(class).finish(),
            Self::Factory(_) => f.write_str("Factory"),
            Self::Instance(_) => f.write_str("Instance"),
        }
    }
}

/// Bootstrap binding table, built once and shared read-only by every
/// request's [`Container`]
///
/// Re-registering a key replaces the earlier binding; the key keeps its
/// original position in [`keys`](Self::keys).
#[derive(Clone, Default)]
pub struct BindingRegistry {
    bindings: HashMap<ServiceKey, Binding>,
    order: Vec<ServiceKey>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding under a key, replacing any previous binding
    pub fn register(&mut self, key: impl Into<ServiceKey>, binding: Binding) -> &mut Self {
        let key = key.into();
        if self.bindings.insert(key.clone(), binding).is_none() {
            self.order.push(key);
        }
        self
    }

    /// Register a concrete type under its own key
    pub fn singleton<T: Injectable>(&mut self) -> &mut Self {
        self.register(T::key(), Binding::Class(ClassBinding::of::<T>()))
    }

    /// Bind an interface key to a concrete implementation
    ///
    /// # Example
    /// ```rust,ignore
    /// registry.bind::<dyn PostStore, SqlPostStore>(|c| c);
    /// ```
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

    /// Register a pre-built concrete value under its type key
    pub fn instance<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.register(ServiceKey::of::<T>(), Binding::instance(value))
    }

    /// Register a pre-built trait object under the interface key
    pub fn instance_of<I: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<I>) -> &mut Self {
        self.register(ServiceKey::of::<I>(), Binding::Instance(Arc::new(value)))
    }

    pub fn get(&self, key: &ServiceKey) -> Option<&Binding> {
        self.bindings.get(key)
    }

    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.bindings.contains_key(key)
    }

    /// Registered keys in first-registration order
    pub fn keys(&self) -> impl Iterator<Item = &ServiceKey> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Register every type annotated with `#[injectable(register)]`
    pub fn discover(&mut self) -> &mut Self {
        super::provider::register_discovered(self);
        self
    }

    /// Check the binding graph without constructing anything
    ///
    /// Walks every class binding's dependency table and returns the keys in a
    /// construction order where each key follows its dependencies. Fails with
    /// the first unresolvable edge or cycle found. Factories are opaque and
    /// treated as leaves; instances are leaves.
    pub fn validate(&self) -> Result<Vec<ServiceKey>, ContainerError> {
        let lookup = |key: &ServiceKey| match self.get(key) {
            Some(binding) => Lookup::Bound(binding.clone()),
            None => Lookup::Unbound,
        };
        let mut walk = GraphWalk::new(&lookup);
        for key in &self.order {
            walk.visit(key, None)?;
        }
        Ok(walk.order)
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.order.iter().filter_map(|k| Some((k, self.bindings.get(k)?))))
            .finish()
    }
}

/// What a dependency walk sees for a key
pub(crate) enum Lookup {
    /// Already built; nothing below it needs checking
    Cached,
    Bound(Binding),
    Unbound,
}

/// Depth-first walk over dependency tables without constructing anything
///
/// Shared by [`BindingRegistry::validate`] and the container's check before
/// a top-level build. Mirrors resolution: typed service edges fall back to
/// the type's own descriptor, interface edges need a binding, and an
/// unresolvable edge with a declared default is accepted.
pub(crate) struct GraphWalk<'a> {
    lookup: &'a dyn Fn(&ServiceKey) -> Lookup,
    done: HashSet<ServiceKey>,
    stack: Vec<ServiceKey>,
    order: Vec<ServiceKey>,
}

impl<'a> GraphWalk<'a> {
    pub(crate) fn new(lookup: &'a dyn Fn(&ServiceKey) -> Lookup) -> Self {
        Self {
            lookup,
            done: HashSet::new(),
            stack: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Visit a key; `fallback` is the descriptor carried by a typed edge
    pub(crate) fn visit(&mut self, key: &ServiceKey, fallback: Option<&ClassBinding>) -> Result<(), ContainerError> {
        if self.done.contains(key) {
            return Ok(());
        }
        if let Some(pos) = self.stack.iter().position(|k| k == key) {
            let mut cycle = self.stack[pos..].to_vec();
            cycle.push(key.clone());
            return Err(ContainerError::CyclicDependency {
                cycle: DependencyCycle(cycle),
            });
        }

        let class = match (self.lookup)(key) {
            Lookup::Cached => None,
            Lookup::Bound(Binding::Class(class)) => Some(class),
            Lookup::Bound(_) => None,
            Lookup::Unbound => match fallback {
                Some(class) => Some(class.clone()),
                None => return Err(ContainerError::NotBound { key: key.clone() }),
            },
        };

        if let Some(class) = class {
            self.visit_class(key, &class, None)?;
        }

        self.done.insert(key.clone());
        self.order.push(key.clone());
        Ok(())
    }

    /// Walk a class's dependency edges; names in `supplied` are given by the caller
    pub(crate) fn visit_class(
        &mut self,
        key: &ServiceKey,
        class: &ClassBinding,
        supplied: Option<&Parameters>,
    ) -> Result<(), ContainerError> {
        self.stack.push(key.clone());
        let result = self.visit_edges(key, class, supplied);
        self.stack.pop();
        result
    }

    fn visit_edges(
        &mut self,
        key: &ServiceKey,
        class: &ClassBinding,
        supplied: Option<&Parameters>,
    ) -> Result<(), ContainerError> {
        for dependency in class.dependencies() {
            if supplied.is_some_and(|p| p.get(dependency.name()).is_some()) {
                continue;
            }

            let result = match dependency.kind() {
                DependencyKind::Value => Err(ContainerError::UnresolvableDependency {
                    service: key.clone(),
                    parameter: dependency.name(),
                }),
                DependencyKind::Service { key, class } => self.visit(key, class.as_ref()),
                DependencyKind::Interface { key } => match (self.lookup)(key) {
                    Lookup::Unbound => Err(ContainerError::NotInstantiable { key: key.clone() }),
                    _ => self.visit(key, None),
                },
            };

            match result {
                Err(e) if e.is_unresolvable() && dependency.has_default() => {}
                other => other?,
            }
        }
        Ok(())
    }
}
