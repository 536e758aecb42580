//! Opaque handles for nodes, messages and commodities.
//!
//! ## Message Handles
//!
//! Messages live in a slab owned by the [`Network`](crate::message::Network).
//! Slab slots are reused after removal, so a [`MessageId`] carries the
//! message's serial number as well. A lookup only succeeds when both the slot
//! and the serial match, which turns a stale handle into
//! [`MessageError::UnknownMessage`](crate::error::MessageError::UnknownMessage)
//! instead of silently aliasing a newer message.

use std::fmt;

/// Handle of a topology node (facility, institution, region or market).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommId(pub usize);

impl CommId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CommId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Generational handle of a message in the network's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId {
    slot: usize,
    serial: u64,
}

impl MessageId {
    #[inline]
    pub(crate) fn new(slot: usize, serial: u64) -> Self {
        Self { slot, serial }
    }

    /// Arena slot (reused after the message is retired).
    #[inline]
    pub fn slot(self) -> usize {
        self.slot
    }

    /// Process-unique serial number; never reused within one network.
    #[inline]
    pub fn serial(self) -> u64 {
        self.serial
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg#{}", self.serial)
    }
}

/// Commodity traded on a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CommodityId(pub u32);

impl fmt::Display for CommodityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "commod#{}", self.0)
    }
}
