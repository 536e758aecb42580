//! Resources carried by transactions.
//!
//! The resource behind a transaction is owned by the surrounding simulation
//! (materials with isotopic compositions, generic goods, ...). The routing
//! core only needs to read and rewrite its quantity, compare qualities, and
//! duplicate it when a message is cloned.

use std::fmt;

/// Capability the core requires from any transferable resource.
pub trait Resource: fmt::Debug {
    /// Amount carried, in `units()`.
    fn quantity(&self) -> f64;

    fn set_quantity(&mut self, quantity: f64);

    /// Unit label, e.g. `"kg"`.
    fn units(&self) -> &str;

    /// Quality marker compared by [`check_quality`](Resource::check_quality).
    fn quality(&self) -> &str;

    /// Returns `true` if `other` can satisfy a demand for `self`.
    fn check_quality(&self, other: &dyn Resource) -> bool {
        self.units() == other.units() && self.quality() == other.quality()
    }

    /// Independent copy; changing its quantity leaves `self` untouched.
    fn clone_resource(&self) -> Box<dyn Resource>;
}

impl Clone for Box<dyn Resource> {
    fn clone(&self) -> Self {
        self.clone_resource()
    }
}

/// Resource units handed from a supplier to a requester.
pub type Manifest = Vec<Box<dyn Resource>>;

/// Sum of quantities across a manifest.
pub fn manifest_quantity(manifest: &[Box<dyn Resource>]) -> f64 {
    manifest.iter().fold(0.0, |total, r| total + r.quantity())
}

// ============================================================================
// GenericResource
// ============================================================================

/// Fungible resource identified by units and a quality tag.
///
/// ## Example
///
/// ```
/// use sim_exchange::types::{GenericResource, Resource};
///
/// let ore = GenericResource::new("kg", "uox", 12.5);
/// let other = GenericResource::new("kg", "mox", 3.0);
///
/// assert!(!ore.check_quality(&other));
/// assert!(ore.check_quality(&GenericResource::new("kg", "uox", 1.0)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GenericResource {
    units: String,
    quality: String,
    quantity: f64,
}

impl GenericResource {
    pub fn new(units: impl Into<String>, quality: impl Into<String>, quantity: f64) -> Self {
        Self {
            units: units.into(),
            quality: quality.into(),
            quantity,
        }
    }

    /// Boxed form, as stored in transactions and manifests.
    pub fn boxed(units: impl Into<String>, quality: impl Into<String>, quantity: f64) -> Box<dyn Resource> {
        Box::new(Self::new(units, quality, quantity))
    }
}

impl Resource for GenericResource {
    fn quantity(&self) -> f64 {
        self.quantity
    }

    fn set_quantity(&mut self, quantity: f64) {
        self.quantity = quantity;
    }

    fn units(&self) -> &str {
        &self.units
    }

    fn quality(&self) -> &str {
        &self.quality
    }

    fn clone_resource(&self) -> Box<dyn Resource> {
        Box::new(self.clone())
    }
}
