//! Transaction: the proposed transfer carried by a message.
//!
//! A transaction is filled in once, when its originating message is built,
//! and copied by value into every message derived from it (splits, residual
//! offers). Copies get their own resource, so a market can resize a split
//! order without touching the offer it came from.

use crate::error::MessageError;
use crate::types::{CommId, CommodityId, Resource};

/// A proposed resource transfer between a supplier and a requester.
///
/// ## Example
///
/// ```
/// use sim_exchange::types::{CommodityId, GenericResource, Transaction};
///
/// let offer = Transaction::offer(CommodityId(1), GenericResource::boxed("kg", "uox", 60.0), 2.0);
/// assert!(offer.is_offer);
/// assert_eq!(offer.quantity().unwrap(), 60.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    /// Party giving up the resource. Bound from the sender for offers.
    pub supplier: Option<CommId>,

    /// Party receiving the resource. Bound from the sender for requests,
    /// reassigned by the market when an offer is matched.
    pub requester: Option<CommId>,

    /// `true` for an offer, `false` for a request.
    pub is_offer: bool,

    /// Resource offered or requested; its quantity keys the order book.
    pub resource: Option<Box<dyn Resource>>,

    /// Smallest fraction of the quantity the proposer will accept.
    pub min_fraction: f64,

    /// Unit price proposed.
    pub price: f64,

    pub commodity: CommodityId,
}

impl Transaction {
    /// An offer of `resource` on `commodity`.
    pub fn offer(commodity: CommodityId, resource: Box<dyn Resource>, price: f64) -> Self {
        Self {
            is_offer: true,
            resource: Some(resource),
            price,
            commodity,
            ..Self::default()
        }
    }

    /// A request for `resource` on `commodity`.
    pub fn request(commodity: CommodityId, resource: Box<dyn Resource>, price: f64) -> Self {
        Self {
            is_offer: false,
            resource: Some(resource),
            price,
            commodity,
            ..Self::default()
        }
    }

    pub fn with_min_fraction(mut self, min_fraction: f64) -> Self {
        self.min_fraction = min_fraction;
        self
    }

    pub fn resource(&self) -> Result<&dyn Resource, MessageError> {
        self.resource
            .as_deref()
            .ok_or(MessageError::Uninitialized { field: "resource" })
    }

    pub fn resource_mut(&mut self) -> Result<&mut (dyn Resource + 'static), MessageError> {
        self.resource
            .as_deref_mut()
            .ok_or(MessageError::Uninitialized { field: "resource" })
    }

    /// Quantity of the carried resource.
    pub fn quantity(&self) -> Result<f64, MessageError> {
        Ok(self.resource()?.quantity())
    }
}
