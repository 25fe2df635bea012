use std::collections::HashMap;

use tracing::debug;

use magnetar_core::{NodeId, NodeResources, ResourceVector};

use crate::error::{ManagerError, Result};

/// Authoritative per-node resource view consumed by the scheduler
///
/// `try_acquire` and `release` on an unknown (or nil) node id return false.
/// A successful `try_acquire` is guaranteed to be reversible by a matching
/// `release` with the same demand.
pub trait ResourceManager {
    /// The full cluster view
    fn cluster_resources(&self) -> &HashMap<NodeId, NodeResources>;

    /// The resource view of a single node
    fn node_resources(&self, node_id: NodeId) -> Option<&NodeResources> {
        self.cluster_resources().get(&node_id)
    }

    /// Decrement a node's available resources by `demand`
    ///
    /// Returns whether the decrement succeeded; the view is unchanged on
    /// failure.
    fn try_acquire(&mut self, node_id: NodeId, demand: &ResourceVector) -> bool;

    /// Increment a node's available resources by `demand`
    ///
    /// Returns whether the increment was valid (true in normal operation).
    fn release(&mut self, node_id: NodeId, demand: &ResourceVector) -> bool;
}

/// In-memory cluster resource manager
///
/// Holds the authoritative `NodeId -> NodeResources` mapping. Membership
/// changes come from the cluster node registry; the scheduler only reads the
/// view and moves resources through `try_acquire` / `release`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterResourceManager {
    nodes: HashMap<NodeId, NodeResources>,
}

impl ClusterResourceManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node with its full capacity available
    pub fn add_node(&mut self, node_id: NodeId, total: ResourceVector) -> Result<()> {
        self.insert_node(node_id, NodeResources::new(total))
    }

    /// Register a node with part of its capacity already in use
    pub fn add_node_with_available(
        &mut self,
        node_id: NodeId,
        total: ResourceVector,
        available: ResourceVector,
    ) -> Result<()> {
        let resources = NodeResources::with_available(total, available)?;
        self.insert_node(node_id, resources)
    }

    /// Remove a node from the view, returning its last known resources
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<NodeResources> {
        let resources = self
            .nodes
            .remove(&node_id)
            .ok_or_else(|| ManagerError::node_not_found(node_id))?;
        debug!("Removed {} from the cluster view", node_id);
        Ok(resources)
    }

    /// Number of registered nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether a node is registered
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    fn insert_node(&mut self, node_id: NodeId, resources: NodeResources) -> Result<()> {
        if node_id.is_nil() {
            return Err(ManagerError::NilNodeId);
        }
        if self.nodes.contains_key(&node_id) {
            return Err(ManagerError::node_already_registered(node_id));
        }
        debug!("Registered {} in the cluster view", node_id);
        self.nodes.insert(node_id, resources);
        Ok(())
    }
}

impl ResourceManager for ClusterResourceManager {
    fn cluster_resources(&self) -> &HashMap<NodeId, NodeResources> {
        &self.nodes
    }

    fn try_acquire(&mut self, node_id: NodeId, demand: &ResourceVector) -> bool {
        match self.nodes.get_mut(&node_id) {
            Some(node) => node.acquire(demand),
            None => false,
        }
    }

    fn release(&mut self, node_id: NodeId, demand: &ResourceVector) -> bool {
        match self.nodes.get_mut(&node_id) {
            Some(node) => node.release(demand),
            None => false,
        }
    }
}
