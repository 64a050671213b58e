mod group;
pub mod matcher;
mod route;
mod router;

pub use matcher::{match_route, normalize, RouteMatch};
pub use route::{RouteDefinition, RoutePattern, Segment, Verb};
pub use router::{RouteBuilder, Router};
