//! Capabilities implemented by topology nodes.
//!
//! - [`Communicator`]: every node. Receives messages and tracks the ones
//!   routed through it.
//! - [`Market`]: a communicator that clears its buffered messages once per
//!   tick.
//! - [`Agent`]: resource holder at the end of a transfer. Attached to a node
//!   once, when the topology is built, and looked up by node id afterwards.

use crate::error::MessageError;
use crate::market::{OrderBook, ResolveSummary};
use crate::message::{Message, Network};
use crate::types::{CommId, CommodityId, Manifest, MessageId, Resource};

/// A node that can receive and track messages.
pub trait Communicator {
    /// Handle this node was registered under.
    fn id(&self) -> CommId;

    /// Handle a message delivered to this node.
    ///
    /// Delivery is a direct call: anything this node sends on from here runs
    /// before `receive_message` returns.
    fn receive_message(&mut self, net: &mut Network, msg: MessageId) -> Result<(), MessageError>;

    /// A message is now routed through this node.
    fn track_message(&mut self, msg: MessageId);

    /// A message has left this node, on its way down or retired.
    fn untrack_message(&mut self, msg: MessageId);

    fn is_tracking(&self, msg: MessageId) -> bool;

    /// Number of messages currently tracked.
    fn tracked_count(&self) -> usize;
}

/// A clearing node.
pub trait Market: Communicator {
    fn commodity(&self) -> CommodityId;

    /// Clear every buffered request and send confirmed orders down.
    fn resolve(&mut self, net: &mut Network) -> Result<ResolveSummary, MessageError>;

    /// Offers waiting for a request.
    fn offers(&self) -> &OrderBook;

    /// Requests waiting for the next pass.
    fn requests(&self) -> &OrderBook;
}

/// Endpoint capability used by [`Network::approve_transfer`].
pub trait Agent {
    /// Hand over the resource described by `msg`.
    fn remove_resource(&mut self, msg: &Message) -> Result<Manifest, MessageError>;

    /// Take delivery of `manifest`.
    ///
    /// On `Err` the manifest is handed back to the supplier, so a refusal
    /// loses no material.
    fn add_resource(&mut self, msg: &Message, manifest: &[Box<dyn Resource>]) -> Result<(), MessageError>;

    /// Quantity held that passes `like.check_quality`.
    fn quantity_of(&self, like: &dyn Resource) -> f64;
}

/// Registered node, with its capability fixed at registration.
pub(crate) enum Node {
    Plain(Box<dyn Communicator>),
    Market(Box<dyn Market>),
}

impl Node {
    pub(crate) fn id(&self) -> CommId {
        match self {
            Node::Plain(node) => node.id(),
            Node::Market(market) => market.id(),
        }
    }

    pub(crate) fn receive_message(&mut self, net: &mut Network, msg: MessageId) -> Result<(), MessageError> {
        match self {
            Node::Plain(node) => node.receive_message(net, msg),
            Node::Market(market) => market.receive_message(net, msg),
        }
    }

    pub(crate) fn track_message(&mut self, msg: MessageId) {
        match self {
            Node::Plain(node) => node.track_message(msg),
            Node::Market(market) => market.track_message(msg),
        }
    }

    pub(crate) fn untrack_message(&mut self, msg: MessageId) {
        match self {
            Node::Plain(node) => node.untrack_message(msg),
            Node::Market(market) => market.untrack_message(msg),
        }
    }

    pub(crate) fn is_tracking(&self, msg: MessageId) -> bool {
        match self {
            Node::Plain(node) => node.is_tracking(msg),
            Node::Market(market) => market.is_tracking(msg),
        }
    }

    pub(crate) fn tracked_count(&self) -> usize {
        match self {
            Node::Plain(node) => node.tracked_count(),
            Node::Market(market) => market.tracked_count(),
        }
    }
}
