use serde::{Deserialize, Serialize};

use magnetar_core::NodeId;

/// Placement policy for a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementPolicy {
    /// Co-locate the demands on as few nodes as possible
    Pack,
    /// Place every demand on a single node
    StrictPack,
    /// Prefer a fresh node per demand, falling back to already-selected nodes
    Spread,
    /// Place every demand on a distinct node
    StrictSpread,
}

/// Outcome of a scheduling attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingStatus {
    /// A full assignment was produced
    Success,
    /// Current availability did not permit placement; the caller may retry
    Failed,
    /// Structurally impossible regardless of current load
    Infeasible,
}

/// Result of scheduling a bundle
///
/// On success, `assignments[i]` is the node assigned to the i-th demand of
/// the input bundle; otherwise `assignments` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingResult {
    /// Final status of the attempt
    pub status: SchedulingStatus,
    /// Assigned nodes, aligned with the input bundle
    pub assignments: Vec<NodeId>,
}

impl SchedulingResult {
    /// Create a successful result
    pub fn success(assignments: Vec<NodeId>) -> Self {
        Self {
            status: SchedulingStatus::Success,
            assignments,
        }
    }

    /// Create a failed (retryable) result
    pub fn failed() -> Self {
        Self {
            status: SchedulingStatus::Failed,
            assignments: Vec::new(),
        }
    }

    /// Create an infeasible result
    pub fn infeasible() -> Self {
        Self {
            status: SchedulingStatus::Infeasible,
            assignments: Vec::new(),
        }
    }

    /// Whether a full assignment was produced
    pub fn is_success(&self) -> bool {
        self.status == SchedulingStatus::Success
    }
}
