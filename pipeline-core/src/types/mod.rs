//! Pipeline data types
//!
//! Attribute values, scene handles and the project configuration.

mod attribute;
mod project;
mod scene;

pub use attribute::*;
pub use project::*;
pub use scene::*;
