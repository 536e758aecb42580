//! The network: message arena, node table and delivery.
//!
//! ## Ownership
//!
//! The network owns every message (in a slab) and every node. Nodes and
//! markets refer to messages by [`MessageId`] only, so a message can sit in
//! several tracking sets and an order book at once without any of them
//! owning it. A message is released with [`Network::retire`], which also
//! drops it from the tracking set of every node it climbed through.
//!
//! ## Delivery
//!
//! [`Network::send_on`] is the whole transport: it updates tracking, moves
//! ownership to the next hop and calls that hop's `receive_message`
//! directly. The hop is taken out of the node table for the duration of the
//! call, so delivering to a node that is already further up the call stack
//! fails with [`MessageError::NodeBusy`]. The one exception is the caller
//! itself, which is passed in explicitly so it can untrack a message it is
//! sending down.

use std::collections::HashMap;

use slab::Slab;
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::error::MessageError;
use crate::ledger::TransactionLedger;
use crate::market::ResolveSummary;
use crate::message::communicator::Node;
use crate::message::{Agent, Communicator, Direction, Market, Message};
use crate::types::{CommId, CommodityId, MessageId, Transaction};

/// Routing context shared by every node in one simulation.
pub struct Network {
    /// In-flight messages. Key: slab slot.
    messages: Slab<Message>,

    /// Serial for the next message; starts at 1, never reused.
    next_serial: u64,

    /// Registered nodes. `None` while the node is handling a delivery.
    nodes: Vec<Option<Node>>,

    /// Agent capability, attached once per endpoint node.
    agents: HashMap<CommId, Box<dyn Agent>>,

    /// Commodity to market directory.
    markets: HashMap<CommodityId, CommId>,

    ledger: TransactionLedger,

    /// Id for the next approved transfer; starts at 1.
    next_transaction_id: u64,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        Self::with_config(NetworkConfig::default())
    }

    pub fn with_config(config: NetworkConfig) -> Self {
        Self {
            messages: Slab::with_capacity(config.message_capacity),
            next_serial: 1,
            nodes: Vec::with_capacity(config.node_capacity),
            agents: HashMap::new(),
            markets: HashMap::new(),
            ledger: TransactionLedger::new(),
            next_transaction_id: 1,
        }
    }

    // ========================================================================
    // Topology
    // ========================================================================

    /// Register a node. `build` receives the id the node will answer to.
    ///
    /// # Example
    ///
    /// ```
    /// use sim_exchange::message::Network;
    /// use sim_exchange::topology::Facility;
    ///
    /// let mut net = Network::new();
    /// let id = net.add_node(Facility::new);
    /// assert_eq!(net.node_count(), 1);
    /// assert!(net.is_registered(id));
    /// ```
    pub fn add_node<C, F>(&mut self, build: F) -> CommId
    where
        C: Communicator + 'static,
        F: FnOnce(CommId) -> C,
    {
        let id = CommId(self.nodes.len());
        let node = build(id);
        debug_assert_eq!(node.id(), id, "node must answer to its registered id");
        self.nodes.push(Some(Node::Plain(Box::new(node))));
        debug!(node = %id, "node registered");
        id
    }

    /// Register a market and make it the market for its commodity.
    pub fn add_market<M, F>(&mut self, build: F) -> CommId
    where
        M: Market + 'static,
        F: FnOnce(CommId) -> M,
    {
        let id = CommId(self.nodes.len());
        let market = build(id);
        debug_assert_eq!(market.id(), id, "market must answer to its registered id");
        let commodity = market.commodity();
        if let Some(previous) = self.markets.insert(commodity, id) {
            warn!(commodity = %commodity, previous = %previous, market = %id, "market replaced");
        }
        self.nodes.push(Some(Node::Market(Box::new(market))));
        debug!(node = %id, commodity = %commodity, "market registered");
        id
    }

    /// Give `node` the agent capability used by transfers.
    pub fn attach_agent<A: Agent + 'static>(&mut self, node: CommId, agent: A) -> Result<(), MessageError> {
        if !self.is_registered(node) {
            return Err(MessageError::UnknownNode(node));
        }
        self.agents.insert(node, Box::new(agent));
        Ok(())
    }

    pub fn agent(&self, node: CommId) -> Option<&dyn Agent> {
        self.agents.get(&node).map(|a| a.as_ref())
    }

    /// The market registered as `id`, unless it is mid-delivery.
    pub fn market(&self, id: CommId) -> Option<&dyn Market> {
        match self.nodes.get(id.index()) {
            Some(Some(Node::Market(market))) => Some(market.as_ref()),
            _ => None,
        }
    }

    /// Market clearing `commodity`, if one is registered.
    pub fn market_for(&self, commodity: CommodityId) -> Option<CommId> {
        self.markets.get(&commodity).copied()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_registered(&self, node: CommId) -> bool {
        node.index() < self.nodes.len()
    }

    /// Number of messages `node` tracks; `None` if it is unknown or
    /// mid-delivery.
    pub fn tracked_count(&self, node: CommId) -> Option<usize> {
        self.stored_node(node).map(Node::tracked_count)
    }

    /// Whether `node` tracks `msg`. `false` while `node` is mid-delivery.
    pub fn is_tracked_by(&self, node: CommId, msg: MessageId) -> bool {
        self.stored_node(node).is_some_and(|n| n.is_tracking(msg))
    }

    // ========================================================================
    // Message arena
    // ========================================================================

    /// `new(sender)`: an empty upward message.
    pub fn new_message(&mut self, sender: CommId) -> MessageId {
        let id = self.next_message_id();
        self.store(Message::new(id, sender, None))
    }

    /// `new(sender, recipient)`.
    pub fn new_message_to(&mut self, sender: CommId, recipient: CommId) -> MessageId {
        let id = self.next_message_id();
        self.store(Message::new(id, sender, Some(recipient)))
    }

    /// `new(sender, recipient, transaction)`: binds the sender as supplier of
    /// an offer or requester of a request.
    pub fn new_transaction_message(
        &mut self,
        sender: CommId,
        recipient: Option<CommId>,
        transaction: Transaction,
    ) -> MessageId {
        let id = self.next_message_id();
        self.store(Message::with_transaction(id, sender, recipient, transaction))
    }

    /// Copy a message under a new identity. The copy's resource is its own.
    pub fn clone_message(&mut self, id: MessageId) -> Result<MessageId, MessageError> {
        lookup(&self.messages, id)?;
        let clone_id = self.next_message_id();
        let copy = lookup(&self.messages, id)?.duplicate(clone_id);
        Ok(self.store(copy))
    }

    pub fn message(&self, id: MessageId) -> Result<&Message, MessageError> {
        lookup(&self.messages, id)
    }

    pub fn message_mut(&mut self, id: MessageId) -> Result<&mut Message, MessageError> {
        self.messages
            .get_mut(id.slot())
            .filter(|m| m.id() == id)
            .ok_or(MessageError::UnknownMessage(id))
    }

    #[inline]
    pub fn contains_message(&self, id: MessageId) -> bool {
        lookup(&self.messages, id).is_ok()
    }

    /// Number of messages still held by the arena.
    #[inline]
    pub fn live_messages(&self) -> usize {
        self.messages.len()
    }

    /// Release a message. Handles to it stop resolving.
    ///
    /// Every node above the sender on the message's remaining path untracks
    /// it. A node that is mid-delivery is skipped; it is the caller and
    /// keeps its own set.
    pub fn retire(&mut self, id: MessageId) -> Option<Message> {
        if !self.contains_message(id) {
            return None;
        }
        let msg = self.messages.remove(id.slot());
        for hop in msg.path().iter().skip(1) {
            if let Some(Some(node)) = self.nodes.get_mut(hop.index()) {
                node.untrack_message(id);
            }
        }
        debug!(message = %id, "message retired");
        Some(msg)
    }

    /// Mark a message dead; later sends of it do nothing.
    pub fn kill(&mut self, id: MessageId) -> Result<(), MessageError> {
        self.message_mut(id)?.kill();
        Ok(())
    }

    fn next_message_id(&mut self) -> MessageId {
        let id = MessageId::new(self.messages.vacant_key(), self.next_serial);
        self.next_serial += 1;
        id
    }

    fn store(&mut self, msg: Message) -> MessageId {
        let id = msg.id();
        let slot = self.messages.insert(msg);
        debug_assert_eq!(slot, id.slot());
        id
    }

    // ========================================================================
    // Delivery
    // ========================================================================

    /// Send `id` on from `from`, the node currently handling it.
    pub fn send_on(&mut self, id: MessageId, from: &mut dyn Communicator) -> Result<(), MessageError> {
        self.route(id, Some(from))
    }

    /// Send `id` on from outside any node, e.g. a driver's initial send.
    pub fn dispatch(&mut self, id: MessageId) -> Result<(), MessageError> {
        self.route(id, None)
    }

    fn route(&mut self, id: MessageId, mut caller: Option<&mut dyn Communicator>) -> Result<(), MessageError> {
        let msg = self.message(id)?;
        if msg.is_dead() {
            debug!(message = %id, "dead message not sent");
            return Ok(());
        }
        let next = msg.validate_for_send()?;
        let direction = msg.direction();
        let top = msg.path_top().ok_or(MessageError::NoDestination(id))?;

        // Going down the hop being left untracks; going up the hop being
        // entered tracks.
        match caller.as_mut() {
            Some(node) if node.id() == top => match direction {
                Direction::Down => node.untrack_message(id),
                Direction::Up => node.track_message(id),
            },
            _ => {
                let node = self.stored_node_mut(top)?;
                match direction {
                    Direction::Down => node.untrack_message(id),
                    Direction::Up => node.track_message(id),
                }
            }
        }

        self.message_mut(id)?.advance(next);

        let mut node = self.take_node(next)?;
        debug!(message = %id, node = %next, ?direction, "message going to node");
        let result = node.receive_message(self, id);
        self.restore_node(next, node);
        debug!(message = %id, node = %next, "message returned from node");
        result
    }

    fn stored_node(&self, id: CommId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    fn stored_node_mut(&mut self, id: CommId) -> Result<&mut Node, MessageError> {
        match self.nodes.get_mut(id.index()) {
            None => Err(MessageError::UnknownNode(id)),
            Some(slot) => slot.as_mut().ok_or(MessageError::NodeBusy(id)),
        }
    }

    fn take_node(&mut self, id: CommId) -> Result<Node, MessageError> {
        match self.nodes.get_mut(id.index()) {
            None => Err(MessageError::UnknownNode(id)),
            Some(slot) => slot.take().ok_or(MessageError::NodeBusy(id)),
        }
    }

    fn restore_node(&mut self, id: CommId, node: Node) {
        debug_assert_eq!(node.id(), id);
        if let Some(slot) = self.nodes.get_mut(id.index()) {
            *slot = Some(node);
        }
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Move the resource of a fully resolved message from its supplier to
    /// its requester and record the transfer.
    ///
    /// If the requester refuses the delivery, the manifest goes back to the
    /// supplier and nothing is recorded.
    ///
    /// # Returns
    ///
    /// The ledger id of the transfer (sequential from 1).
    pub fn approve_transfer(&mut self, id: MessageId) -> Result<u64, MessageError> {
        let msg = lookup(&self.messages, id)?;
        let supplier = msg.supplier()?;
        let requester = msg.requester()?;
        if !self.agents.contains_key(&requester) {
            return Err(MessageError::NotAnAgent(requester));
        }

        let manifest = self
            .agents
            .get_mut(&supplier)
            .ok_or(MessageError::NotAnAgent(supplier))?
            .remove_resource(msg)?;
        let delivered = self
            .agents
            .get_mut(&requester)
            .ok_or(MessageError::NotAnAgent(requester))?
            .add_resource(msg, &manifest);
        if let Err(err) = delivered {
            warn!(message = %id, supplier = %supplier, requester = %requester, error = %err, "delivery refused");
            if let Some(agent) = self.agents.get_mut(&supplier) {
                if let Err(restore) = agent.add_resource(msg, &manifest) {
                    warn!(message = %id, supplier = %supplier, error = %restore, "manifest not restored");
                }
            }
            return Err(err);
        }

        let transaction_id = self.next_transaction_id;
        self.next_transaction_id += 1;
        info!(
            transaction = transaction_id,
            supplier = %supplier,
            requester = %requester,
            quantity = msg.quantity().unwrap_or(0.0),
            "material sent"
        );
        self.ledger.register_transaction(transaction_id, msg, manifest);
        Ok(transaction_id)
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    // ========================================================================
    // Clearing
    // ========================================================================

    /// Run one resolution pass on the market registered as `id`.
    pub fn resolve_market(&mut self, id: CommId) -> Result<ResolveSummary, MessageError> {
        let mut node = self.take_node(id)?;
        let result = match &mut node {
            Node::Market(market) => market.resolve(self),
            Node::Plain(_) => Err(MessageError::NotAMarket(id)),
        };
        self.restore_node(id, node);
        result
    }

    /// Run one resolution pass on every market, in registration order.
    pub fn resolve_markets(&mut self) -> Result<Vec<(CommId, ResolveSummary)>, MessageError> {
        let markets: Vec<CommId> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Some(Node::Market(_))))
            .map(|(index, _)| CommId(index))
            .collect();

        markets
            .into_iter()
            .map(|id| Ok((id, self.resolve_market(id)?)))
            .collect()
    }
}

fn lookup(messages: &Slab<Message>, id: MessageId) -> Result<&Message, MessageError> {
    messages
        .get(id.slot())
        .filter(|m| m.id() == id)
        .ok_or(MessageError::UnknownMessage(id))
}

// ============================================================================
// Unit Tests
// ============================================================================
