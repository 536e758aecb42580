//! Leaf endpoint that trades material.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::error::MessageError;
use crate::message::{Communicator, Direction, Network};
use crate::types::{CommId, MessageId, Transaction};

/// Post `transaction` from `sender`, routed first to `first_hop`.
///
/// # Returns
///
/// The message carrying the transaction. It stays alive while it waits in
/// a market book.
///
/// # Example
///
/// ```
/// use sim_exchange::market::GreedyMarket;
/// use sim_exchange::message::{Market, Network};
/// use sim_exchange::topology::{submit, Facility};
/// use sim_exchange::types::{CommodityId, GenericResource, Transaction};
///
/// let mut net = Network::new();
/// let market = net.add_market(|id| GreedyMarket::new(id, CommodityId(1)));
/// let mine = net.add_node(Facility::new);
///
/// let offer = Transaction::offer(CommodityId(1), GenericResource::boxed("kg", "ore", 40.0), 1.0);
/// let msg = submit(&mut net, mine, market, offer).unwrap();
/// assert!(net.market(market).unwrap().offers().contains(msg));
/// ```
pub fn submit(
    net: &mut Network,
    sender: CommId,
    first_hop: CommId,
    transaction: Transaction,
) -> Result<MessageId, MessageError> {
    let msg = net.new_transaction_message(sender, None, transaction);
    net.message_mut(msg)?.set_next_dest(first_hop);
    net.dispatch(msg)?;
    Ok(msg)
}

/// Endpoint node. An order that comes back to it completes a transfer.
#[derive(Debug)]
pub struct Facility {
    id: CommId,
    tracked: BTreeSet<MessageId>,
}

impl Facility {
    pub fn new(id: CommId) -> Self {
        Self {
            id,
            tracked: BTreeSet::new(),
        }
    }
}

impl Communicator for Facility {
    fn id(&self) -> CommId {
        self.id
    }

    fn receive_message(&mut self, net: &mut Network, msg: MessageId) -> Result<(), MessageError> {
        let (direction, terminal) = {
            let m = net.message(msg)?;
            (m.direction(), m.is_terminal())
        };
        match direction {
            Direction::Up => {
                warn!(node = %self.id, message = %msg, "facility has no upstream; message dropped");
                Ok(())
            }
            Direction::Down if terminal => {
                let transaction = net.approve_transfer(msg)?;
                debug!(node = %self.id, message = %msg, transaction, "transfer approved");
                Ok(())
            }
            Direction::Down => net.send_on(msg, self),
        }
    }

    fn track_message(&mut self, msg: MessageId) {
        self.tracked.insert(msg);
    }

    fn untrack_message(&mut self, msg: MessageId) {
        self.tracked.remove(&msg);
    }

    fn is_tracking(&self, msg: MessageId) -> bool {
        self.tracked.contains(&msg)
    }

    fn tracked_count(&self) -> usize {
        self.tracked.len()
    }
}
