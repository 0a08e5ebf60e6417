//! Gatehouse gateway library entry.
//!
//! This crate wires config, the role quota table, the evaluator adapter, the
//! admission controller and the axum middleware into a request-admission
//! layer. It is intended to be consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod admission;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod policy;
pub mod router;
pub mod transport;
