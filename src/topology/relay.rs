//! Pass-through node for institutions and regions.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::MessageError;
use crate::message::{Communicator, Direction, Network};
use crate::types::{CommId, MessageId};

/// Where a relay sends upward messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upstream {
    Parent(CommId),
    /// The market registered for the message's commodity.
    Market,
}

/// Node that forwards messages without inspecting them.
#[derive(Debug)]
pub struct Relay {
    id: CommId,
    upstream: Upstream,
    tracked: BTreeSet<MessageId>,
}

impl Relay {
    /// Relay that forwards upward messages to `parent`.
    pub fn new(id: CommId, parent: CommId) -> Self {
        Self {
            id,
            upstream: Upstream::Parent(parent),
            tracked: BTreeSet::new(),
        }
    }

    /// Top-level relay that forwards upward messages to the market clearing
    /// their commodity.
    pub fn to_market(id: CommId) -> Self {
        Self {
            id,
            upstream: Upstream::Market,
            tracked: BTreeSet::new(),
        }
    }

    fn next_hop(&self, net: &Network, msg: MessageId) -> Result<CommId, MessageError> {
        match self.upstream {
            Upstream::Parent(parent) => Ok(parent),
            Upstream::Market => {
                let commodity = net.message(msg)?.transaction().commodity;
                net.market_for(commodity).ok_or(MessageError::NoDestination(msg))
            }
        }
    }
}

impl Communicator for Relay {
    fn id(&self) -> CommId {
        self.id
    }

    fn receive_message(&mut self, net: &mut Network, msg: MessageId) -> Result<(), MessageError> {
        match net.message(msg)?.direction() {
            Direction::Up => {
                let hop = self.next_hop(net, msg)?;
                net.message_mut(msg)?.set_next_dest(hop);
                net.send_on(msg, self)
            }
            Direction::Down => {
                if net.message(msg)?.is_terminal() {
                    debug!(node = %self.id, message = %msg, "message ended at relay");
                    return Ok(());
                }
                net.send_on(msg, self)
            }
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
