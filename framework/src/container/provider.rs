//! Service discovery for the bootstrap binding table
//!
//! Types annotated with `#[injectable(register)]` submit a [`ServiceEntry`]
//! at compile time. [`BindingRegistry::discover`] registers all of them, so the
//! bootstrap table can be built without listing every controller by hand.
//!
//! # Example
//!
//! ```rust,ignore
//! use press::injectable;
//!
//! #[injectable(register)]
//! pub struct HomeController {
//!     #[inject]
//!     posts: Arc<dyn PostStore>,
//! }
//!
//! let mut registry = BindingRegistry::new();
//! registry.discover(); // HomeController is now bound under its own key
//! ```

use super::BindingRegistry;
use tracing::debug;

/// Entry for inventory-collected service registrations
///
/// Used internally by `#[injectable(register)]`.
pub struct ServiceEntry {
    /// Function adding the binding to the registry
    pub register: fn(&mut BindingRegistry),
    /// Type name for debugging/logging
    pub name: &'static str,
}

inventory::collect!(ServiceEntry);

/// Register every collected service entry into `registry`
pub fn register_discovered(registry: &mut BindingRegistry) {
    for entry in inventory::iter::<ServiceEntry> {
        debug!(service = entry.name, "registering discovered service");
        (entry.register)(registry);
    }
}

/// Names of all collected service entries
pub fn discovered() -> Vec<&'static str> {
    inventory::iter::<ServiceEntry>
        .into_iter()
        .map(|entry| entry.name)
        .collect()
}
