//! Transport layer (HTTP middleware).
//!
//! Builds the request descriptor and applies the admission outcome before
//! the request reaches any route handler.

pub mod middleware;

pub use middleware::{admission_guard, describe, RoleClaim};
