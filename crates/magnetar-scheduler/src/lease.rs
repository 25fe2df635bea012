use magnetar_core::{NodeId, ResourceVector};
use magnetar_manager::ResourceManager;

/// Ledger of tentative allocations made while planning a placement
///
/// Pack and spread placement consult per-node available capacity while
/// iterating, so they deduct already-placed demands from the live view.
/// Every grant recorded here is returned to the manager before the
/// scheduling call returns; the manager stays authoritative.
#[derive(Default)]
pub struct AllocationLedger {
    granted: Vec<(NodeId, ResourceVector)>,
}

impl AllocationLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Tentatively acquire `demand` on `node_id`, recording the grant
    pub fn try_acquire(
        &mut self,
        manager: &mut dyn ResourceManager,
        node_id: NodeId,
        demand: &ResourceVector,
    ) -> bool {
        if manager.try_acquire(node_id, demand) {
            self.granted.push((node_id, demand.clone()));
            true
        } else {
            false
        }
    }

    /// Number of grants currently recorded
    pub fn len(&self) -> usize {
        self.granted.len()
    }

    /// Whether the ledger holds no grants
    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }

    /// Return every recorded grant to the manager
    ///
    /// A manager refusing to release what it granted means the two sides
    /// disagree about the cluster state; that is fatal.
    pub fn release_all(&mut self, manager: &mut dyn ResourceManager) {
        for (node_id, demand) in self.granted.drain(..) {
            assert!(
                manager.release(node_id, &demand),
                "resource manager refused to release a granted allocation on {}",
                node_id
            );
        }
    }
}
