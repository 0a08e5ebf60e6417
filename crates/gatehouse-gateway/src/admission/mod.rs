//! Admission control (per-request decision + fail-open/fail-closed policy).

pub mod controller;

pub use controller::{AdmissionController, AdmissionOutcome, EnforcementMode, Rejection};
