use std::collections::HashSet;

use tracing::debug;

use magnetar_core::{NodeId, ResourceVector};
use magnetar_manager::ResourceManager;

use crate::lease::AllocationLedger;
use crate::ordering::{restore_input_order, traversal_order};
use crate::score::{LeastResourceScorer, NodeScorer};
use crate::types::{PlacementPolicy, SchedulingResult};

/// Node filter predicate supplied by the caller
pub type NodeFilter<'a> = dyn Fn(NodeId) -> bool + 'a;

/// Bundle scheduler
///
/// Places a bundle of resource demands onto cluster nodes under a placement
/// policy. A single `schedule` call is synchronous and leaves the resource
/// manager in the state it found it; the durable acquisition on success is
/// the caller's job.
pub struct BundleScheduler {
    scorer: Box<dyn NodeScorer>,
}

impl Default for BundleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleScheduler {
    /// Create a scheduler with the default least-resource scorer
    pub fn new() -> Self {
        Self {
            scorer: Box::new(LeastResourceScorer),
        }
    }

    /// Create a scheduler with a custom scorer
    pub fn with_scorer(scorer: Box<dyn NodeScorer>) -> Self {
        Self { scorer }
    }

    /// Schedule a bundle of demands under `policy`
    ///
    /// `node_filter` restricts the candidate set; `None` admits every node
    /// in the cluster view. On success the returned assignments are aligned
    /// with the input bundle order.
    pub fn schedule(
        &self,
        manager: &mut dyn ResourceManager,
        bundle: &[ResourceVector],
        policy: PlacementPolicy,
        node_filter: Option<&NodeFilter>,
    ) -> SchedulingResult {
        debug!(
            "Scheduling a bundle of {} demands with {:?} using {}",
            bundle.len(),
            policy,
            self.scorer.name()
        );

        let candidates = filter_candidate_nodes(&*manager, node_filter);
        if candidates.is_empty() {
            debug!("No candidate nodes survive the filter");
            return SchedulingResult::infeasible();
        }

        // Strict pack keeps the input order: every demand lands on the same
        // node anyway.
        if policy == PlacementPolicy::StrictPack {
            return self.strict_pack_schedule(manager, bundle, &candidates);
        }

        // Place scarce resources (such as GPU) first to improve the odds
        // that the remaining demands still fit on surviving capacity.
        let order = traversal_order(bundle);
        let traversed: Vec<ResourceVector> = order.iter().map(|&i| bundle[i].clone()).collect();

        let result = match policy {
            PlacementPolicy::Pack => self.pack_schedule(manager, &traversed, &candidates),
            PlacementPolicy::Spread => self.spread_schedule(manager, &traversed, &candidates),
            PlacementPolicy::StrictSpread => {
                self.strict_spread_schedule(manager, &traversed, &candidates)
            }
            PlacementPolicy::StrictPack => unreachable!("handled before reordering"),
        };

        if result.is_success() {
            SchedulingResult::success(restore_input_order(result.assignments, &order))
        } else {
            result
        }
    }

    /// Place every demand on a distinct node
    ///
    /// Scores against the snapshot only; the resource manager is not
    /// touched.
    fn strict_spread_schedule(
        &self,
        manager: &mut dyn ResourceManager,
        demands: &[ResourceVector],
        candidates: &HashSet<NodeId>,
    ) -> SchedulingResult {
        if demands.len() > candidates.len() {
            debug!(
                "{} demands cannot spread strictly over {} candidate nodes",
                demands.len(),
                candidates.len()
            );
            return SchedulingResult::infeasible();
        }

        let mut remaining = candidates.clone();
        let mut assignments = Vec::with_capacity(demands.len());
        for demand in demands {
            match self.best_node(&*manager, demand, &remaining) {
                Some(node_id) => {
                    remaining.remove(&node_id);
                    assignments.push(node_id);
                }
                None => break,
            }
        }

        if assignments.len() != demands.len() {
            return SchedulingResult::failed();
        }
        SchedulingResult::success(assignments)
    }

    /// Prefer a fresh node per demand, falling back to already-selected
    /// nodes
    ///
    /// Tentatively acquires each placement so later demands see the
    /// capacity consumed by earlier ones; everything is released before
    /// returning.
    fn spread_schedule(
        &self,
        manager: &mut dyn ResourceManager,
        demands: &[ResourceVector],
        candidates: &HashSet<NodeId>,
    ) -> SchedulingResult {
        let mut unused = candidates.clone();
        let mut selected: HashSet<NodeId> = HashSet::new();
        let mut ledger = AllocationLedger::new();
        let mut assignments = Vec::with_capacity(demands.len());

        for demand in demands {
            if let Some(node_id) = self.best_node(&*manager, demand, &unused) {
                let granted = ledger.try_acquire(manager, node_id, demand);
                assert!(granted, "feasible {} refused a tentative acquire", node_id);
                unused.remove(&node_id);
                selected.insert(node_id);
                assignments.push(node_id);
            } else if let Some(node_id) = self.best_node(&*manager, demand, &selected) {
                let granted = ledger.try_acquire(manager, node_id, demand);
                assert!(granted, "feasible {} refused a tentative acquire", node_id);
                assignments.push(node_id);
            } else {
                break;
            }
        }

        ledger.release_all(manager);

        if assignments.len() != demands.len() {
            return SchedulingResult::failed();
        }
        SchedulingResult::success(assignments)
    }

    /// Place every demand on a single node
    ///
    /// The bundle is aggregated into one demand. If no node in the entire
    /// cluster view could hold the aggregate even now, the placement is
    /// infeasible rather than retryable.
    fn strict_pack_schedule(
        &self,
        manager: &mut dyn ResourceManager,
        bundle: &[ResourceVector],
        candidates: &HashSet<NodeId>,
    ) -> SchedulingResult {
        let mut aggregate = ResourceVector::new();
        for demand in bundle {
            aggregate += demand;
        }

        let feasible_somewhere = manager
            .cluster_resources()
            .values()
            .any(|node| node.covers(&aggregate));
        if !feasible_somewhere {
            debug!("Aggregate demand exceeds every node in the cluster");
            return SchedulingResult::infeasible();
        }

        match self.best_node(&*manager, &aggregate, candidates) {
            Some(node_id) => SchedulingResult::success(vec![node_id; bundle.len()]),
            None => SchedulingResult::failed(),
        }
    }

    /// Pick one node, pack as many demands as possible onto it, repeat
    ///
    /// Assignments land at each demand's position in the traversal order;
    /// positions still unplaced when the candidates run out stay nil and
    /// the attempt fails.
    fn pack_schedule(
        &self,
        manager: &mut dyn ResourceManager,
        demands: &[ResourceVector],
        candidates: &HashSet<NodeId>,
    ) -> SchedulingResult {
        let mut assignments = vec![NodeId::nil(); demands.len()];
        let mut remaining = candidates.clone();
        let mut work_list: Vec<(usize, &ResourceVector)> = demands.iter().enumerate().collect();
        let mut ledger = AllocationLedger::new();

        while let Some(&(index, demand)) = work_list.first() {
            let Some(node_id) = self.best_node(&*manager, demand, &remaining) else {
                break;
            };

            let granted = ledger.try_acquire(manager, node_id, demand);
            assert!(granted, "feasible {} refused a tentative acquire", node_id);
            assignments[index] = node_id;
            work_list.remove(0);

            // Pack as many of the remaining demands as fit on the same node.
            work_list.retain(|&(other_index, other_demand)| {
                if ledger.try_acquire(manager, node_id, other_demand) {
                    assignments[other_index] = node_id;
                    false
                } else {
                    true
                }
            });

            remaining.remove(&node_id);
        }

        let all_placed = work_list.is_empty();
        ledger.release_all(manager);

        if !all_placed {
            return SchedulingResult::failed();
        }
        SchedulingResult::success(assignments)
    }

    /// Pick the highest-scoring feasible candidate for `demand`
    ///
    /// Returns `None` when every candidate is infeasible. Ties go to the
    /// first maximal node encountered in set iteration order.
    fn best_node(
        &self,
        manager: &dyn ResourceManager,
        demand: &ResourceVector,
        candidates: &HashSet<NodeId>,
    ) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for &node_id in candidates {
            let node = match manager.node_resources(node_id) {
                Some(node) => node,
                None => panic!("candidate {} missing from the cluster view", node_id),
            };
            let score = self.scorer.score(demand, node);
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((node_id, score)),
            }
        }

        best.filter(|&(_, score)| score >= 0.0)
            .map(|(node_id, _)| node_id)
    }
}

/// Snapshot the candidate node set, honoring the caller's filter
fn filter_candidate_nodes(
    manager: &dyn ResourceManager,
    node_filter: Option<&NodeFilter>,
) -> HashSet<NodeId> {
    manager
        .cluster_resources()
        .keys()
        .copied()
        .filter(|&node_id| node_filter.map_or(true, |filter| filter(node_id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchedulingStatus;
    use magnetar_core::{FixedPoint, PredefinedResource};
    use magnetar_manager::ClusterResourceManager;

    fn units(u: u64) -> FixedPoint {
        FixedPoint::from_units(u)
    }

    fn cpus(cpu: u64) -> ResourceVector {
        ResourceVector::new().with(PredefinedResource::Cpu, units(cpu))
    }

    fn cpu_gpu(cpu: u64, gpu: u64) -> ResourceVector {
        ResourceVector::new()
            .with(PredefinedResource::Cpu, units(cpu))
            .with(PredefinedResource::Gpu, units(gpu))
    }

    fn n(id: u64) -> NodeId {
        NodeId::new(id)
    }

    fn create_test_cluster(nodes: &[(u64, ResourceVector)]) -> ClusterResourceManager {
        let mut manager = ClusterResourceManager::new();
        for (id, total) in nodes {
            manager.add_node(NodeId::new(*id), total.clone()).unwrap();
        }
        manager
    }

    /// Run one schedule call and assert the manager is left untouched.
    fn schedule_checked(
        manager: &mut ClusterResourceManager,
        bundle: &[ResourceVector],
        policy: PlacementPolicy,
        node_filter: Option<&NodeFilter>,
    ) -> SchedulingResult {
        let before = manager.clone();
        let result = BundleScheduler::new().schedule(manager, bundle, policy, node_filter);
        assert_eq!(*manager, before, "manager state changed by {:?}", policy);

        // Length invariant: full on success, empty otherwise.
        if result.is_success() {
            assert_eq!(result.assignments.len(), bundle.len());
        } else {
            assert!(result.assignments.is_empty());
        }
        result
    }

    #[test]
    fn test_strict_spread_success() {
        let mut manager =
            create_test_cluster(&[(1, cpu_gpu(4, 1)), (2, cpu_gpu(4, 1))]);
        let bundle = vec![cpu_gpu(1, 1), cpu_gpu(1, 1)];

        let result =
            schedule_checked(&mut manager, &bundle, PlacementPolicy::StrictSpread, None);

        assert!(result.is_success());
        let mut assigned = result.assignments.clone();
        assigned.sort();
        assert_eq!(assigned, vec![n(1), n(2)]);
    }

    #[test]
    fn test_strict_spread_more_demands_than_nodes_is_infeasible() {
        let mut manager = create_test_cluster(&[(1, cpus(4))]);
        let bundle = vec![cpus(1), cpus(1)];

        let result =
            schedule_checked(&mut manager, &bundle, PlacementPolicy::StrictSpread, None);

        assert_eq!(result.status, SchedulingStatus::Infeasible);
    }

    #[test]
    fn test_strict_spread_resource_shortage_is_retryable() {
        // Two candidates, but only one can hold a demand: FAILED, not
        // INFEASIBLE.
        let mut manager = create_test_cluster(&[(1, cpus(4)), (2, cpus(1))]);
        let bundle = vec![cpus(2), cpus(2)];

        let result =
            schedule_checked(&mut manager, &bundle, PlacementPolicy::StrictSpread, None);

        assert_eq!(result.status, SchedulingStatus::Failed);
    }

    #[test]
    fn test_strict_pack_picks_the_only_fitting_node() {
        let mut manager = create_test_cluster(&[(1, cpus(8)), (2, cpus(2))]);
        let bundle = vec![cpus(3), cpus(3)];

        let result = schedule_checked(&mut manager, &bundle, PlacementPolicy::StrictPack, None);

        assert!(result.is_success());
        assert_eq!(result.assignments, vec![n(1), n(1)]);
    }

    #[test]
    fn test_strict_pack_aggregate_beyond_every_node_is_infeasible() {
        let mut manager = create_test_cluster(&[(1, cpus(4)), (2, cpus(4))]);
        let bundle = vec![cpus(3), cpus(3)];

        let result = schedule_checked(&mut manager, &bundle, PlacementPolicy::StrictPack, None);

        assert_eq!(result.status, SchedulingStatus::Infeasible);
    }

    #[test]
    fn test_strict_pack_feasibility_gate_ignores_the_filter() {
        // The aggregate fits on node 1 only, but the filter admits node 2
        // only: the whole-cluster gate passes, the candidate search fails.
        let mut manager = create_test_cluster(&[(1, cpus(8)), (2, cpus(2))]);
        let bundle = vec![cpus(3), cpus(3)];
        let filter = |node_id: NodeId| node_id == n(2);

        let result = schedule_checked(
            &mut manager,
            &bundle,
            PlacementPolicy::StrictPack,
            Some(&filter),
        );

        assert_eq!(result.status, SchedulingStatus::Failed);
    }

    #[test]
    fn test_pack_fills_one_node_then_another() {
        let mut manager = create_test_cluster(&[(1, cpus(4)), (2, cpus(4))]);
        let bundle = vec![cpus(3), cpus(3), cpus(1)];

        let result = schedule_checked(&mut manager, &bundle, PlacementPolicy::Pack, None);

        assert!(result.is_success());
        let a = &result.assignments;
        // Greedy packing co-locates the first demand with the one-CPU
        // demand; the second three-CPU demand goes elsewhere.
        assert_eq!(a[0], a[2]);
        assert_ne!(a[0], a[1]);
        for node_id in a {
            assert!([n(1), n(2)].contains(node_id));
        }
    }

    #[test]
    fn test_pack_runs_out_of_candidates() {
        let mut manager = create_test_cluster(&[(1, cpus(4)), (2, cpus(4))]);
        let bundle = vec![cpus(3), cpus(3), cpus(3)];

        let result = schedule_checked(&mut manager, &bundle, PlacementPolicy::Pack, None);

        assert_eq!(result.status, SchedulingStatus::Failed);
    }

    #[test]
    fn test_spread_prefers_fresh_nodes_then_falls_back() {
        let mut manager = create_test_cluster(&[(1, cpus(4)), (2, cpus(4))]);
        let bundle = vec![cpus(1), cpus(1), cpus(1)];

        let result = schedule_checked(&mut manager, &bundle, PlacementPolicy::Spread, None);

        assert!(result.is_success());
        let a = &result.assignments;
        assert_ne!(a[0], a[1], "fresh nodes preferred while any remain");
        for node_id in a {
            assert!([n(1), n(2)].contains(node_id));
        }
    }

    #[test]
    fn test_spread_sees_tentative_consumption() {
        // The second demand cannot reuse node 1's capacity consumed by the
        // first within the same call.
        let mut manager = create_test_cluster(&[(1, cpus(4)), (2, cpus(1))]);
        let bundle = vec![cpus(3), cpus(3)];

        let result = schedule_checked(&mut manager, &bundle, PlacementPolicy::Spread, None);

        assert_eq!(result.status, SchedulingStatus::Failed);
    }

    #[test]
    fn test_spread_exhausts_fallback_capacity() {
        let mut manager = create_test_cluster(&[(1, cpus(2)), (2, cpus(2))]);
        let bundle = vec![cpus(2), cpus(2), cpus(2)];

        let result = schedule_checked(&mut manager, &bundle, PlacementPolicy::Spread, None);

        assert_eq!(result.status, SchedulingStatus::Failed);
    }

    #[test]
    fn test_assignments_follow_input_positions_across_reordering() {
        // The GPU demand traverses first but sits second in the bundle; the
        // returned assignments must follow input positions.
        let mut manager = create_test_cluster(&[(1, cpus(4)), (2, cpu_gpu(4, 1))]);
        let bundle = vec![cpus(1), cpu_gpu(1, 1)];

        let result =
            schedule_checked(&mut manager, &bundle, PlacementPolicy::StrictSpread, None);

        assert!(result.is_success());
        assert_eq!(result.assignments, vec![n(1), n(2)]);
    }

    #[test]
    fn test_strict_pack_keeps_input_positions() {
        let mut manager = create_test_cluster(&[(1, cpu_gpu(4, 1))]);
        let bundle = vec![cpus(1), cpu_gpu(1, 1)];

        let result = schedule_checked(&mut manager, &bundle, PlacementPolicy::StrictPack, None);

        assert!(result.is_success());
        assert_eq!(result.assignments, vec![n(1), n(1)]);
    }

    #[test]
    fn test_node_filter_is_honored_by_every_policy() {
        for policy in [
            PlacementPolicy::Pack,
            PlacementPolicy::StrictPack,
            PlacementPolicy::Spread,
            PlacementPolicy::StrictSpread,
        ] {
            let mut manager = create_test_cluster(&[(1, cpus(8)), (2, cpus(8))]);
            let bundle = vec![cpus(1)];
            let filter = |node_id: NodeId| node_id == n(2);

            let result = schedule_checked(&mut manager, &bundle, policy, Some(&filter));

            assert!(result.is_success(), "{:?} failed under filter", policy);
            assert_eq!(result.assignments, vec![n(2)], "{:?} ignored filter", policy);
        }
    }

    #[test]
    fn test_empty_candidate_set_is_infeasible() {
        for policy in [
            PlacementPolicy::Pack,
            PlacementPolicy::StrictPack,
            PlacementPolicy::Spread,
            PlacementPolicy::StrictSpread,
        ] {
            let mut manager = create_test_cluster(&[(1, cpus(8))]);
            let bundle = vec![cpus(1)];
            let filter = |_: NodeId| false;

            let result = schedule_checked(&mut manager, &bundle, policy, Some(&filter));
            assert_eq!(result.status, SchedulingStatus::Infeasible, "{:?}", policy);
        }
    }

    #[test]
    fn test_empty_bundle_succeeds_with_no_assignments() {
        for policy in [
            PlacementPolicy::Pack,
            PlacementPolicy::StrictPack,
            PlacementPolicy::Spread,
            PlacementPolicy::StrictSpread,
        ] {
            let mut manager = create_test_cluster(&[(1, cpus(8))]);

            let result = schedule_checked(&mut manager, &[], policy, None);
            assert!(result.is_success(), "{:?}", policy);
            assert!(result.assignments.is_empty());
        }
    }

    #[test]
    fn test_custom_resource_demands_route_to_carrying_nodes() {
        let accel = ResourceVector::new()
            .with(PredefinedResource::Cpu, units(8))
            .with_custom(42, units(2));
        let mut manager = create_test_cluster(&[(1, cpus(8)), (2, accel)]);
        let bundle = vec![
            ResourceVector::new().with_custom(42, units(1)),
            cpus(1),
        ];

        let result =
            schedule_checked(&mut manager, &bundle, PlacementPolicy::StrictSpread, None);

        assert!(result.is_success());
        assert_eq!(result.assignments[0], n(2));
        assert_eq!(result.assignments[1], n(1));
    }

    #[test]
    fn test_success_assignments_cover_their_demands() {
        // Each assigned node's entry-time view covers the demand placed on
        // it (aggregated per node, since PACK may co-locate).
        let mut manager = create_test_cluster(&[(1, cpus(4)), (2, cpus(4))]);
        let bundle = vec![cpus(2), cpus(2), cpus(2)];

        let result = schedule_checked(&mut manager, &bundle, PlacementPolicy::Pack, None);
        assert!(result.is_success());

        let mut per_node: std::collections::HashMap<NodeId, ResourceVector> =
            std::collections::HashMap::new();
        for (node_id, demand) in result.assignments.iter().zip(&bundle) {
            *per_node.entry(*node_id).or_default() += demand;
        }
        for (node_id, demanded) in &per_node {
            let node = manager.node_resources(*node_id).unwrap();
            assert!(node.covers(demanded), "{} overcommitted", node_id);
        }
    }
}
