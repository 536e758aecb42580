//! Entries sharing one quantity key.
//!
//! ## Queue Structure
//!
//! ```text
//! front (oldest) <-> msg2 <-> msg3 <-> back (newest)
//! ```
//!
//! New entries are appended at the back and the book takes from the back,
//! so among equal quantities the most recently inserted message goes first.

use std::collections::VecDeque;

use crate::types::MessageId;

/// Messages whose resource quantity is exactly `quantity`.
#[derive(Debug, Clone)]
pub struct QuantityLevel {
    /// Quantity shared by every entry.
    pub quantity: f64,

    entries: VecDeque<MessageId>,
}

impl QuantityLevel {
    pub fn new(quantity: f64) -> Self {
        Self {
            quantity,
            entries: VecDeque::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push_back(&mut self, msg: MessageId) {
        self.entries.push_back(msg);
    }

    /// Take the newest entry.
    pub fn pop_back(&mut self) -> Option<MessageId> {
        self.entries.pop_back()
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.entries.iter().copied()
    }

    /// Sum of quantities at this level.
    pub fn total_quantity(&self) -> f64 {
        self.quantity * self.entries.len() as f64
    }
}
