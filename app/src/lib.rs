//! A small blog served by press: public posts with comments plus an admin
//! console for drafting and publishing.

pub mod bootstrap;
pub mod controllers;
pub mod routes;
pub mod services;

use press::Application;

pub fn application() -> Application {
    Application::new()
        .bindings(bootstrap::register)
        .routes(routes::register)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controllers_are_discovered() {
        let names = press::container::provider::discovered();
        for controller in ["HomeController", "PostController", "AdminController"] {
            assert!(names.contains(&controller), "{} was not discovered", controller);
        }
    }

    #[test]
    fn test_application_bindings_are_valid() {
        assert!(application().dispatcher().is_ok());
    }
}
