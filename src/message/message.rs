//! The message envelope.
//!
//! ## Path Stack
//!
//! A message records the nodes it climbs through on the way up:
//!
//! ```text
//! set_next_dest(inst)    path = [facility, inst]
//! set_next_dest(market)  path = [facility, inst, market]
//! ```
//!
//! Going up, the last entry is the next stop and nothing is popped. Once a
//! market reverses the message, the same stack is unwound: each hop pops
//! itself off and delivers to the entry below it, until the original sender
//! is the only entry left.
//!
//! Routing itself (tracking, delivery) lives on
//! [`Network`](crate::message::Network); this type only holds state and
//! enforces the local rules.

use tracing::debug;

use crate::error::MessageError;
use crate::types::{CommId, MessageId, Resource, Transaction};

/// Travel direction along the path stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Toward a market; the path grows.
    #[default]
    Up,
    /// Back toward the sender; the path shrinks.
    Down,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// A transaction proposal in transit.
#[derive(Debug)]
pub struct Message {
    id: MessageId,
    direction: Direction,
    sender: CommId,
    recipient: Option<CommId>,
    current_owner: CommId,
    path: Vec<CommId>,
    transaction: Transaction,
    dead: bool,
}

impl Message {
    pub(crate) fn new(id: MessageId, sender: CommId, recipient: Option<CommId>) -> Self {
        debug!(message = %id, sender = %sender, "message created");
        Self {
            id,
            direction: Direction::Up,
            sender,
            recipient,
            current_owner: sender,
            path: Vec::new(),
            transaction: Transaction::default(),
            dead: false,
        }
    }

    /// Build a message around `transaction`, binding the sender as supplier
    /// of an offer or requester of a request.
    pub(crate) fn with_transaction(
        id: MessageId,
        sender: CommId,
        recipient: Option<CommId>,
        mut transaction: Transaction,
    ) -> Self {
        if transaction.is_offer {
            transaction.supplier = Some(sender);
        } else {
            transaction.requester = Some(sender);
        }
        let mut msg = Self::new(id, sender, recipient);
        msg.transaction = transaction;
        msg
    }

    /// Copy every field under a new identity. The resource is re-bound.
    pub(crate) fn duplicate(&self, id: MessageId) -> Self {
        debug!(message = %self.id, clone = %id, "message cloned");
        Self {
            id,
            direction: self.direction,
            sender: self.sender,
            recipient: self.recipient,
            current_owner: self.current_owner,
            path: self.path.clone(),
            transaction: self.transaction.clone(),
            dead: self.dead,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn id(&self) -> MessageId {
        self.id
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn sender(&self) -> CommId {
        self.sender
    }

    /// Node that most recently received this message.
    #[inline]
    pub fn current_owner(&self) -> CommId {
        self.current_owner
    }

    #[inline]
    pub fn path(&self) -> &[CommId] {
        &self.path
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    #[inline]
    pub fn is_offer(&self) -> bool {
        self.transaction.is_offer
    }

    /// `true` once a downward message has reached the bottom of its path.
    pub fn is_terminal(&self) -> bool {
        self.direction == Direction::Down && self.path.len() <= 1
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn transaction_mut(&mut self) -> &mut Transaction {
        &mut self.transaction
    }

    pub fn recipient(&self) -> Result<CommId, MessageError> {
        self.recipient
            .ok_or(MessageError::Uninitialized { field: "recipient" })
    }

    pub fn supplier(&self) -> Result<CommId, MessageError> {
        self.transaction
            .supplier
            .ok_or(MessageError::Uninitialized { field: "supplier" })
    }

    pub fn requester(&self) -> Result<CommId, MessageError> {
        self.transaction
            .requester
            .ok_or(MessageError::Uninitialized { field: "requester" })
    }

    pub fn set_supplier(&mut self, supplier: CommId) {
        self.transaction.supplier = Some(supplier);
    }

    pub fn set_requester(&mut self, requester: CommId) {
        self.transaction.requester = Some(requester);
    }

    pub fn resource(&self) -> Result<&dyn Resource, MessageError> {
        self.transaction.resource()
    }

    pub fn resource_mut(&mut self) -> Result<&mut (dyn Resource + 'static), MessageError> {
        self.transaction.resource_mut()
    }

    pub fn quantity(&self) -> Result<f64, MessageError> {
        self.transaction.quantity()
    }

    // ========================================================================
    // Routing state
    // ========================================================================

    /// Push `hop` as the next stop. Ignored unless the message is going up;
    /// a returning message reuses the path it built on the way up.
    pub fn set_next_dest(&mut self, hop: CommId) {
        if self.direction != Direction::Up {
            debug!(message = %self.id, hop = %hop, "next-stop ignored on downward message");
            return;
        }
        if self.path.is_empty() {
            self.path.push(self.sender);
        }
        self.path.push(hop);
        debug!(message = %self.id, hop = %hop, "next-stop set");
    }

    pub fn reverse_direction(&mut self) {
        self.direction = self.direction.reversed();
        debug!(message = %self.id, direction = ?self.direction, "direction flipped");
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Permanently silence this message. Idempotent.
    pub fn kill(&mut self) {
        if !self.dead {
            debug!(message = %self.id, "message killed");
        }
        self.dead = true;
    }

    /// Check that a send would reach a node other than the current owner.
    ///
    /// # Returns
    ///
    /// The next hop: the path's last entry going up, the entry below it
    /// going down.
    pub fn validate_for_send(&self) -> Result<CommId, MessageError> {
        let next = match self.direction {
            Direction::Up => self.path.last().copied(),
            Direction::Down if self.path.len() > 1 => Some(self.path[self.path.len() - 2]),
            Direction::Down => None,
        };
        let next = next.ok_or(MessageError::NoDestination(self.id))?;
        if next == self.current_owner {
            return Err(MessageError::SelfDelivery {
                message: self.id,
                node: next,
            });
        }
        Ok(next)
    }

    /// Node whose tracking set changes on the next send: the hop being
    /// entered going up, the hop being left going down.
    pub(crate) fn path_top(&self) -> Option<CommId> {
        self.path.last().copied()
    }

    /// Pop the hop being left (down only) and hand ownership to the next stop.
    pub(crate) fn advance(&mut self, next: CommId) {
        if self.direction == Direction::Down {
            self.path.pop();
        }
        self.current_owner = next;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommodityId, GenericResource};

    fn msg(sender: usize) -> Message {
        Message::new(MessageId::new(0, 1), CommId(sender), None)
    }

    #[test]
    fn test_new_message_defaults() {
        let m = msg(1);
        assert_eq!(m.direction(), Direction::Up);
        assert!(!m.is_dead());
        assert!(m.path().is_empty());
        assert_eq!(m.current_owner(), CommId(1));
        assert_eq!(m.recipient(), Err(MessageError::Uninitialized { field: "recipient" }));
        assert_eq!(m.supplier(), Err(MessageError::Uninitialized { field: "supplier" }));
        assert_eq!(m.requester(), Err(MessageError::Uninitialized { field: "requester" }));
    }

    #[test]
    fn test_transaction_binds_party_from_sender() {
        let offer = Transaction::offer(CommodityId(0), GenericResource::boxed("kg", "a", 1.0), 0.0);
        let m = Message::with_transaction(MessageId::new(0, 1), CommId(7), Some(CommId(9)), offer);
        assert_eq!(m.supplier(), Ok(CommId(7)));
        assert!(m.requester().is_err());
        assert_eq!(m.recipient(), Ok(CommId(9)));

        let request = Transaction::request(CommodityId(0), GenericResource::boxed("kg", "a", 1.0), 0.0);
        let m = Message::with_transaction(MessageId::new(1, 2), CommId(7), None, request);
        assert_eq!(m.requester(), Ok(CommId(7)));
        assert!(m.supplier().is_err());
    }

    #[test]
    fn test_set_next_dest_pushes_sender_first() {
        let mut m = msg(1);
        m.set_next_dest(CommId(2));
        m.set_next_dest(CommId(3));
        assert_eq!(m.path(), &[CommId(1), CommId(2), CommId(3)]);
    }

    #[test]
    fn test_set_next_dest_ignored_going_down() {
        let mut m = msg(1);
        m.set_next_dest(CommId(2));
        m.reverse_direction();
        m.set_next_dest(CommId(5));
        assert_eq!(m.path(), &[CommId(1), CommId(2)]);
    }

    #[test]
    fn test_validate_up_requires_destination() {
        let m = msg(1);
        assert_eq!(m.validate_for_send(), Err(MessageError::NoDestination(m.id())));
    }

    #[test]
    fn test_validate_down_requires_two_entries() {
        let mut m = msg(1);
        m.reverse_direction();
        assert_eq!(m.validate_for_send(), Err(MessageError::NoDestination(m.id())));

        let mut m = msg(1);
        m.set_next_dest(CommId(2));
        m.advance(CommId(2));
        m.reverse_direction();
        assert_eq!(m.validate_for_send(), Ok(CommId(1)));
        m.advance(CommId(1));
        assert_eq!(m.path(), &[CommId(1)]);
        assert!(m.is_terminal());
        assert_eq!(m.validate_for_send(), Err(MessageError::NoDestination(m.id())));
    }

    #[test]
    fn test_validate_rejects_self_delivery() {
        let mut m = msg(1);
        m.set_next_dest(CommId(1));
        assert_eq!(
            m.validate_for_send(),
            Err(MessageError::SelfDelivery { message: m.id(), node: CommId(1) })
        );
    }

    #[test]
    fn test_kill_is_idempotent() {
        let mut m = msg(1);
        m.kill();
        m.kill();
        assert!(m.is_dead());
    }

    #[test]
    fn test_duplicate_is_independent() {
        let offer = Transaction::offer(CommodityId(0), GenericResource::boxed("kg", "a", 50.0), 0.0);
        let mut original = Message::with_transaction(MessageId::new(0, 1), CommId(1), None, offer);
        original.set_next_dest(CommId(2));

        let mut copy = original.duplicate(MessageId::new(1, 2));
        copy.resource_mut().unwrap().set_quantity(10.0);
        copy.set_requester(CommId(4));

        assert_ne!(copy.id(), original.id());
        assert_eq!(copy.path(), original.path());
        assert_eq!(original.quantity(), Ok(50.0));
        assert_eq!(copy.quantity(), Ok(10.0));
        assert!(original.requester().is_err());
    }
}
