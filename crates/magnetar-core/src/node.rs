use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::resources::ResourceVector;

/// Opaque cluster node identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a node id
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    /// The distinguished nil id, used as an "unassigned" marker
    pub const fn nil() -> Self {
        NodeId(0)
    }

    /// Whether this is the nil id
    pub fn is_nil(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Per-node resource view: total capacity and currently available amounts
///
/// Invariant: `available` never exceeds `total` in any dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResources {
    total: ResourceVector,
    available: ResourceVector,
}

impl NodeResources {
    /// A fresh node with its full capacity available
    pub fn new(total: ResourceVector) -> Self {
        Self {
            available: total.clone(),
            total,
        }
    }

    /// A node with part of its capacity already in use
    pub fn with_available(total: ResourceVector, available: ResourceVector) -> Result<Self> {
        if !total.covers(&available) {
            return Err(CoreError::AvailableExceedsTotal);
        }
        Ok(Self { total, available })
    }

    /// Total capacity of the node
    pub fn total(&self) -> &ResourceVector {
        &self.total
    }

    /// Currently available amounts
    pub fn available(&self) -> &ResourceVector {
        &self.available
    }

    /// Whether `demand` fits into what is currently available
    pub fn covers(&self, demand: &ResourceVector) -> bool {
        self.available.covers(demand)
    }

    /// Deduct `demand` from the available amounts
    ///
    /// Returns false and leaves the view untouched when the demand is not
    /// covered.
    pub fn acquire(&mut self, demand: &ResourceVector) -> bool {
        if !self.covers(demand) {
            return false;
        }
        self.available -= demand;
        true
    }

    /// Return `demand` to the available amounts
    ///
    /// Returns false and leaves the view untouched when the increment would
    /// exceed the node total.
    pub fn release(&mut self, demand: &ResourceVector) -> bool {
        let mut restored = self.available.clone();
        restored += demand;
        if !self.total.covers(&restored) {
            return false;
        }
        self.available = restored;
        true
    }
}
