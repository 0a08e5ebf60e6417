//! Top-level facade crate for Gatehouse.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use gatehouse_core::*;
}

pub mod gateway {
    pub use gatehouse_gateway::*;
}
