//! Bindings the controllers depend on
//!
//! Controllers themselves are registered by `#[injectable(register)]`.

use crate::services::{LogMailer, Mailer, MemoryPostStore, PostStore, Renderer, SiteSettings};
use press::{bind, instance, singleton, BindingRegistry};

pub fn register(registry: &mut BindingRegistry) {
    instance!(registry, SiteSettings::from_env());
    instance!(registry, dyn PostStore => MemoryPostStore::seeded());
    singleton!(registry, Renderer);
    mailer(registry);
}

/// Comment notifications; leave unbound to disable them
pub fn mailer(registry: &mut BindingRegistry) {
    bind!(registry, dyn Mailer => LogMailer);
}
