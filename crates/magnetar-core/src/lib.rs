//! Magnetar Core - fundamental types for the magnetar placement scheduler
//!
//! This crate provides:
//! - Deterministic fixed-point resource quantities
//! - Resource vectors over predefined and custom dimensions
//! - Node identity and per-node resource views
//! - Error types with miette diagnostics

pub mod error;
pub mod fixed_point;
pub mod node;
pub mod resources;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use fixed_point::FixedPoint;
pub use node::{NodeId, NodeResources};
pub use resources::{PredefinedResource, ResourceVector, PREDEFINED_MAX};
