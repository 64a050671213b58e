//! Procedural macros for the Press framework
//!
//! - `#[injectable]`: generate a service's dependency descriptor table from
//!   `#[inject]` field attributes, optionally registering it for discovery

use proc_macro::TokenStream;

mod injectable;

/// Implement `press::Injectable` for a struct from its field attributes
///
/// | Field attribute            | Field type          | Meaning                                  |
/// |----------------------------|---------------------|------------------------------------------|
/// | `#[inject]`                | `Arc<T>`            | constructor dependency on service `T`    |
/// | `#[inject]`                | `Arc<dyn Trait>`    | constructor dependency on a bound trait  |
/// | `#[inject(instance)]`      | `Arc<T>`            | pre-bound value keyed by `T`'s type name |
/// | `#[inject(optional)]`      | `Option<Arc<T>>`    | property injection, left `None` on error |
/// | `#[inject(value)]`         | `T: Clone`          | caller-supplied parameter                |
/// | `#[inject(default = expr)]`| `T: Clone`          | parameter with a default                 |
/// | none                       | `T: Default`        | `Default::default()`                     |
///
/// `#[injectable(register)]` additionally submits the type for
/// `BindingRegistry::discover()`.
///
/// # Example
///
/// ```rust,ignore
/// use press::injectable;
///
/// #[injectable(register)]
/// pub struct PostController {
///     #[inject]
///     posts: Arc<dyn PostStore>,
///     #[inject]
///     views: Arc<Renderer>,
///     #[inject(optional)]
///     mailer: Option<Arc<dyn Mailer>>,
///     #[inject(default = 10)]
///     per_page: usize,
/// }
/// ```
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, input: TokenStream) -> TokenStream {
    injectable::injectable_impl(attr, input)
}
