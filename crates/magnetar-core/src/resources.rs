use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{AddAssign, SubAssign};

use crate::fixed_point::FixedPoint;

/// Number of predefined resource dimensions
pub const PREDEFINED_MAX: usize = 4;

/// Predefined resource dimensions, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredefinedResource {
    Cpu = 0,
    Mem = 1,
    ObjectStoreMem = 2,
    Gpu = 3,
}

impl PredefinedResource {
    /// All predefined dimensions in canonical order
    pub const ALL: [PredefinedResource; PREDEFINED_MAX] = [
        PredefinedResource::Cpu,
        PredefinedResource::Mem,
        PredefinedResource::ObjectStoreMem,
        PredefinedResource::Gpu,
    ];

    /// Index of this dimension in the predefined sequence
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A vector of resource amounts over the predefined dimensions plus custom
/// dimensions keyed by opaque integer ids
///
/// Used both as a node capacity and as a demand. A custom key that is absent
/// is equivalent to a zero amount; zero-valued custom entries are never
/// stored, so equality is well defined. The custom store is a `BTreeMap` so
/// every iteration over custom resources is in ascending key order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceVector {
    predefined: [FixedPoint; PREDEFINED_MAX],
    custom: BTreeMap<u64, FixedPoint>,
}

impl ResourceVector {
    /// Create an all-zero resource vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for a predefined dimension
    pub fn with(mut self, resource: PredefinedResource, amount: FixedPoint) -> Self {
        self.predefined[resource.index()] = amount;
        self
    }

    /// Builder-style setter for a custom dimension
    ///
    /// Zero amounts are dropped rather than stored.
    pub fn with_custom(mut self, id: u64, amount: FixedPoint) -> Self {
        if amount.is_zero() {
            self.custom.remove(&id);
        } else {
            self.custom.insert(id, amount);
        }
        self
    }

    /// Amount of a predefined resource
    pub fn get(&self, resource: PredefinedResource) -> FixedPoint {
        self.predefined[resource.index()]
    }

    /// The predefined sequence in canonical order
    pub fn predefined(&self) -> &[FixedPoint; PREDEFINED_MAX] {
        &self.predefined
    }

    /// Amount of a custom resource; a missing key means zero
    pub fn custom_amount(&self, id: u64) -> FixedPoint {
        self.custom.get(&id).copied().unwrap_or(FixedPoint::ZERO)
    }

    /// Non-zero custom entries in ascending key order
    pub fn custom_entries(&self) -> impl Iterator<Item = (u64, FixedPoint)> + '_ {
        self.custom.iter().map(|(&id, &amount)| (id, amount))
    }

    /// Custom resource ids in ascending order
    pub fn custom_keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.custom.keys().copied()
    }

    /// Whether every dimension is zero
    pub fn is_empty(&self) -> bool {
        self.predefined.iter().all(|a| a.is_zero()) && self.custom.is_empty()
    }

    /// Whether every dimension of `demand` is at most the amount held here
    pub fn covers(&self, demand: &ResourceVector) -> bool {
        for i in 0..PREDEFINED_MAX {
            if demand.predefined[i] > self.predefined[i] {
                return false;
            }
        }
        demand
            .custom_entries()
            .all(|(id, amount)| amount <= self.custom_amount(id))
    }
}

impl AddAssign<&ResourceVector> for ResourceVector {
    /// Component-wise for predefined, key-wise union for custom
    fn add_assign(&mut self, rhs: &ResourceVector) {
        for i in 0..PREDEFINED_MAX {
            self.predefined[i] += rhs.predefined[i];
        }
        for (id, amount) in rhs.custom_entries() {
            *self.custom.entry(id).or_insert(FixedPoint::ZERO) += amount;
        }
    }
}

impl SubAssign<&ResourceVector> for ResourceVector {
    /// Panics on underflow in any dimension
    fn sub_assign(&mut self, rhs: &ResourceVector) {
        for i in 0..PREDEFINED_MAX {
            self.predefined[i] -= rhs.predefined[i];
        }
        for (id, amount) in rhs.custom_entries() {
            let remaining = self.custom_amount(id) - amount;
            if remaining.is_zero() {
                self.custom.remove(&id);
            } else {
                self.custom.insert(id, remaining);
            }
        }
    }
}
