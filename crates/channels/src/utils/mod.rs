//! Internal utilities for channel administration.
//!
//! Policy derivation and field validation shared by the services.

pub mod policy;
pub mod validation;

// Re-export utilities
pub use policy::*;
pub use validation::*;
