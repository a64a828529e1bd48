//! Configuration module
//!
//! Loading and validation of game configuration files: services, question
//! bank, choreography timings and analytics settings.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
