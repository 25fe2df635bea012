use magnetar_core::{FixedPoint, NodeResources, ResourceVector, PREDEFINED_MAX};

/// Score marking a node as unable to hold a demand
pub const INFEASIBLE: f64 = -1.0;

/// Scoring function trait
pub trait NodeScorer: Send + Sync {
    /// Score a node for the given demand
    ///
    /// A negative value means the demand does not fit; among feasible nodes,
    /// higher is better.
    fn score(&self, demand: &ResourceVector, node: &NodeResources) -> f64;

    /// Name of the scorer
    fn name(&self) -> &str;
}

/// Score by fractional remaining capacity after allocation
///
/// Each dimension contributes `(available - requested) / available`, so a
/// higher sum means more headroom is left behind. Picking the maximum keeps
/// the cluster's large nodes loose for future placements while still
/// admitting the demand.
pub struct LeastResourceScorer;

impl LeastResourceScorer {
    fn dimension_score(requested: FixedPoint, available: FixedPoint) -> f64 {
        if requested > available {
            return INFEASIBLE;
        }
        if available.is_zero() {
            return 0.0;
        }
        (available - requested).as_f64() / available.as_f64()
    }
}

impl NodeScorer for LeastResourceScorer {
    fn score(&self, demand: &ResourceVector, node: &NodeResources) -> f64 {
        let available = node.available();

        let mut node_score = 0.0;
        for i in 0..PREDEFINED_MAX {
            let score = Self::dimension_score(demand.predefined()[i], available.predefined()[i]);
            if score < 0.0 {
                return INFEASIBLE;
            }
            node_score += score;
        }

        for (id, requested) in demand.custom_entries() {
            // Demand entries are never zero, so a zero available amount
            // means the node does not carry this custom resource.
            let score = Self::dimension_score(requested, available.custom_amount(id));
            if score < 0.0 {
                return INFEASIBLE;
            }
            node_score += score;
        }

        node_score
    }

    fn name(&self) -> &str {
        "LeastResourceScorer"
    }
}
