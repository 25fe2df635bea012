use std::cmp::Ordering;
use std::collections::BTreeSet;

use magnetar_core::{NodeId, PredefinedResource, ResourceVector};

/// Compute the traversal order for a bundle as an index permutation
///
/// Scarce and lumpy resources place first: GPU demand, then custom
/// resources, then object store memory, memory and CPU. At each level the
/// demand requiring more of the resource ranks earlier; full ties keep
/// their input order.
pub fn traversal_order(bundle: &[ResourceVector]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..bundle.len()).collect();
    order.sort_by(|&i, &j| scarcity_cmp(&bundle[i], &bundle[j]).reverse());
    order
}

/// Compare two demands along the scarcity priority list
///
/// Greater means the demand asks for more of a scarcer resource and should
/// be traversed earlier. Custom resources are compared over the union of
/// both demands' keys in ascending numeric order; a missing key counts as
/// zero.
fn scarcity_cmp(a: &ResourceVector, b: &ResourceVector) -> Ordering {
    let by_gpu = a
        .get(PredefinedResource::Gpu)
        .cmp(&b.get(PredefinedResource::Gpu));
    if by_gpu != Ordering::Equal {
        return by_gpu;
    }

    let custom_keys: BTreeSet<u64> = a.custom_keys().chain(b.custom_keys()).collect();
    for id in custom_keys {
        let by_custom = a.custom_amount(id).cmp(&b.custom_amount(id));
        if by_custom != Ordering::Equal {
            return by_custom;
        }
    }

    for resource in [
        PredefinedResource::ObjectStoreMem,
        PredefinedResource::Mem,
        PredefinedResource::Cpu,
    ] {
        let by_amount = a.get(resource).cmp(&b.get(resource));
        if by_amount != Ordering::Equal {
            return by_amount;
        }
    }

    Ordering::Equal
}

/// Map assignments made in traversal order back to input positions
///
/// `order[k]` is the input index of the k-th traversed demand, so the k-th
/// assignment lands at input position `order[k]`.
pub fn restore_input_order(assignments: Vec<NodeId>, order: &[usize]) -> Vec<NodeId> {
    debug_assert_eq!(assignments.len(), order.len());
    let mut restored = vec![NodeId::nil(); assignments.len()];
    for (k, node_id) in assignments.into_iter().enumerate() {
        restored[order[k]] = node_id;
    }
    restored
}
