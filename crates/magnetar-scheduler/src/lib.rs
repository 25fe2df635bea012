//! Magnetar Scheduler - bundle placement over cluster nodes
//!
//! This crate provides:
//! - The four placement policies (pack, strict pack, spread, strict spread)
//! - Least-resource node scoring
//! - Scarcity-first demand ordering
//! - Tentative allocation bookkeeping against the resource manager

pub mod lease;
pub mod ordering;
pub mod score;
pub mod scheduler;
pub mod types;

// Re-export commonly used types
pub use lease::AllocationLedger;
pub use ordering::{restore_input_order, traversal_order};
pub use score::{LeastResourceScorer, NodeScorer};
pub use scheduler::{BundleScheduler, NodeFilter};
pub use types::{PlacementPolicy, SchedulingResult, SchedulingStatus};
