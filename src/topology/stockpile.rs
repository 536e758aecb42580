//! Material held by an endpoint.

use tracing::debug;

use crate::config::EPS_KG;
use crate::error::MessageError;
use crate::message::{Agent, Message};
use crate::types::quantity::{exceeds, is_negligible};
use crate::types::{manifest_quantity, CommId, Manifest, Resource};

/// [`Agent`] that keeps its material as a list of resource items.
///
/// Withdrawals take from the oldest compatible items first and split the
/// last one if needed.
#[derive(Debug, Clone)]
pub struct Stockpile {
    owner: CommId,
    items: Vec<Box<dyn Resource>>,
}

impl Stockpile {
    pub fn new(owner: CommId) -> Self {
        Self {
            owner,
            items: Vec::new(),
        }
    }

    pub fn with_resource(mut self, resource: Box<dyn Resource>) -> Self {
        self.items.push(resource);
        self
    }

}

impl Agent for Stockpile {
    fn remove_resource(&mut self, msg: &Message) -> Result<Manifest, MessageError> {
        let wanted = msg.resource()?;
        let requested = wanted.quantity();
        let available = self.quantity_of(wanted);
        if exceeds(requested, available, EPS_KG) {
            return Err(MessageError::Shortfall {
                agent: self.owner,
                requested,
                available,
            });
        }

        let mut manifest = Manifest::new();
        let mut outstanding = requested;
        for item in self.items.iter_mut() {
            if is_negligible(outstanding, EPS_KG) {
                break;
            }
            if !wanted.check_quality(item.as_ref()) {
                continue;
            }
            let take = item.quantity().min(outstanding);
            let mut part = item.clone_resource();
            part.set_quantity(take);
            item.set_quantity(item.quantity() - take);
            outstanding -= take;
            manifest.push(part);
        }
        self.items.retain(|item| !is_negligible(item.quantity(), EPS_KG));

        debug!(agent = %self.owner, message = %msg.id(), quantity = requested, parts = manifest.len(), "material withdrawn");
        Ok(manifest)
    }

    fn add_resource(&mut self, msg: &Message, manifest: &[Box<dyn Resource>]) -> Result<(), MessageError> {
        self.items.extend(manifest.iter().cloned());
        debug!(agent = %self.owner, message = %msg.id(), quantity = manifest_quantity(manifest), "material received");
        Ok(())
    }

    fn quantity_of(&self, like: &dyn Resource) -> f64 {
        self.items
            .iter()
            .filter(|item| like.check_quality(item.as_ref()))
            .fold(0.0, |total, item| total + item.quantity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Network;
    use crate::types::{CommodityId, GenericResource, MessageId, Transaction};

    fn order(net: &mut Network, quantity: f64) -> MessageId {
        let tx = Transaction::offer(CommodityId(1), GenericResource::boxed("kg", "leu", quantity), 1.0);
        net.new_transaction_message(CommId(0), None, tx)
    }

    #[test]
    fn test_withdraw_spans_and_splits_items() {
        let mut net = Network::new();
        let msg = order(&mut net, 70.0);
        let mut pile = Stockpile::new(CommId(0))
            .with_resource(GenericResource::boxed("kg", "leu", 50.0))
            .with_resource(GenericResource::boxed("kg", "heu", 90.0))
            .with_resource(GenericResource::boxed("kg", "leu", 40.0));

        let manifest = pile.remove_resource(net.message(msg).unwrap()).unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest_quantity(&manifest), 70.0);
        let like = GenericResource::new("kg", "leu", 0.0);
        assert_eq!(pile.quantity_of(&like), 20.0);
        // emptied item is dropped, incompatible one untouched
        assert_eq!(pile.items.len(), 2);
        assert_eq!(manifest_quantity(&pile.items), 110.0);
    }

    #[test]
    fn test_withdraw_more_than_held_fails_without_change() {
        let mut net = Network::new();
        let msg = order(&mut net, 70.0);
        let mut pile = Stockpile::new(CommId(4)).with_resource(GenericResource::boxed("kg", "leu", 50.0));

        assert_eq!(
            pile.remove_resource(net.message(msg).unwrap()).unwrap_err(),
            MessageError::Shortfall { agent: CommId(4), requested: 70.0, available: 50.0 }
        );
        assert_eq!(manifest_quantity(&pile.items), 50.0);
    }

    #[test]
    fn test_empty_pile_reports_zero_available() {
        let mut net = Network::new();
        let msg = order(&mut net, 70.0);
        let mut pile = Stockpile::new(CommId(4)).with_resource(GenericResource::boxed("kg", "heu", 90.0));

        let like = GenericResource::new("kg", "leu", 0.0);
        assert!(pile.quantity_of(&like).is_sign_positive());

        let err = pile.remove_resource(net.message(msg).unwrap()).unwrap_err();
        assert!(matches!(err, MessageError::Shortfall { available, .. } if available.is_sign_positive()));
        assert_eq!(err.to_string(), "agent node#4 holds 0 compatible units, 70 requested");
    }

    #[test]
    fn test_add_resource_keeps_copies() {
        let mut net = Network::new();
        let msg = order(&mut net, 5.0);
        let mut pile = Stockpile::new(CommId(0));
        let manifest = vec![GenericResource::boxed("kg", "leu", 5.0)];

        pile.add_resource(net.message(msg).unwrap(), &manifest).unwrap();
        assert_eq!(manifest_quantity(&pile.items), 5.0);
    }
}
