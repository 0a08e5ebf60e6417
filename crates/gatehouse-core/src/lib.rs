//! Gatehouse core: admission domain types, error types, and environment flags.
//!
//! This crate defines the request descriptor, quota, decision and failure
//! vocabulary shared by the gateway and any evaluator implementation. It
//! carries no transport or runtime dependencies so evaluators can be built
//! against it without pulling in the HTTP stack.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `GatehouseError`/`Result` so a bad
//! config or a misbehaving evaluator never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod decision;
pub mod environment;
pub mod error;
pub mod request;
pub mod role;

/// Shared result type.
pub use error::{Result, GatehouseError};

pub use decision::{Decision, DenialReason, EvaluationFailure, FailureKind};
pub use environment::Environment;
pub use request::RequestDescriptor;
pub use role::{CallerRole, Quota};
