//! Quantity-ordered order book.
//!
//! ## Architecture
//!
//! - **BTreeMap**: quantity levels in ascending order, so the largest
//!   quantity is the last key and can be taken in O(log n)
//! - **QuantityLevel**: entries with identical quantity, newest taken first
//!
//! Quantities are `f64`; keys use `f64::total_cmp`, so every value
//! (including NaN, which sorts above all numbers) has a place in the order.
//!
//! ## Example
//!
//! ```
//! use sim_exchange::market::OrderBook;
//! use sim_exchange::message::Network;
//! use sim_exchange::types::CommId;
//!
//! let mut net = Network::new();
//! let small = net.new_message(CommId(0));
//! let large = net.new_message(CommId(0));
//!
//! let mut book = OrderBook::new();
//! book.insert(10.0, small);
//! book.insert(60.0, large);
//!
//! assert_eq!(book.pop_largest(), Some((60.0, large)));
//! assert_eq!(book.len(), 1);
//! assert_eq!(book.total_quantity(), 10.0);
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::market::QuantityLevel;
use crate::types::MessageId;

/// Total-order wrapper for quantity keys.
#[derive(Debug, Clone, Copy)]
struct QuantityKey(f64);

impl PartialEq for QuantityKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QuantityKey {}

impl PartialOrd for QuantityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QuantityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Multimap from resource quantity to message, ascending.
#[derive(Debug, Default)]
pub struct OrderBook {
    levels: BTreeMap<QuantityKey, QuantityLevel>,
    len: usize,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Size
    // ========================================================================

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct quantities.
    #[inline]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn total_quantity(&self) -> f64 {
        self.levels.values().fold(0.0, |total, level| total + level.total_quantity())
    }

    // ========================================================================
    // Entry Management
    // ========================================================================

    /// Add `msg` under `quantity`.
    pub fn insert(&mut self, quantity: f64, msg: MessageId) {
        self.levels
            .entry(QuantityKey(quantity))
            .or_insert_with(|| QuantityLevel::new(quantity))
            .push_back(msg);
        self.len += 1;
    }

    /// Remove and return the entry with the largest quantity.
    pub fn pop_largest(&mut self) -> Option<(f64, MessageId)> {
        let mut last = self.levels.last_entry()?;
        let level = last.get_mut();
        let quantity = level.quantity;
        let msg = level.pop_back()?;
        if level.is_empty() {
            last.remove();
        }
        self.len -= 1;
        Some((quantity, msg))
    }

    pub fn contains(&self, msg: MessageId) -> bool {
        self.levels.values().any(|level| level.iter().any(|m| m == msg))
    }

    /// Entries in ascending quantity order; equal quantities oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (f64, MessageId)> + '_ {
        self.levels
            .values()
            .flat_map(|level| level.iter().map(move |msg| (level.quantity, msg)))
    }

    /// Entries sorted by quantity then message id, for multiset comparison.
    pub fn snapshot(&self) -> Vec<(f64, MessageId)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        entries
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn id(serial: u64) -> MessageId {
        MessageId::new(serial as usize, serial)
    }

    #[test]
    fn test_book_new() {
        let mut book = OrderBook::new();
        assert!(book.is_empty());
        assert_eq!(book.len(), 0);
        assert!(book.pop_largest().is_none());
    }

    #[test]
    fn test_book_pops_largest_first() {
        let mut book = OrderBook::new();
        book.insert(50.0, id(1));
        book.insert(60.0, id(2));
        book.insert(5.0, id(3));

        assert_eq!(book.level_count(), 3);
        assert_eq!(book.total_quantity(), 115.0);
        assert_eq!(book.pop_largest(), Some((60.0, id(2))));
        assert_eq!(book.pop_largest(), Some((50.0, id(1))));
        assert_eq!(book.pop_largest(), Some((5.0, id(3))));
        assert!(book.is_empty());
    }

    #[test]
    fn test_book_equal_quantities_share_level() {
        let mut book = OrderBook::new();
        book.insert(30.0, id(1));
        book.insert(30.0, id(2));

        assert_eq!(book.len(), 2);
        assert_eq!(book.level_count(), 1);
        assert_eq!(book.pop_largest(), Some((30.0, id(2))));
        assert_eq!(book.level_count(), 1);
        assert_eq!(book.pop_largest(), Some((30.0, id(1))));
        assert_eq!(book.level_count(), 0);
    }

    #[test]
    fn test_book_contains_until_popped() {
        let mut book = OrderBook::new();
        book.insert(10.0, id(1));
        book.insert(20.0, id(2));

        assert!(book.contains(id(1)));
        assert_eq!(book.pop_largest(), Some((20.0, id(2))));
        assert!(!book.contains(id(2)));
        assert!(book.contains(id(1)));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_book_iter_ascending() {
        let mut book = OrderBook::new();
        book.insert(3.0, id(3));
        book.insert(1.0, id(1));
        book.insert(2.0, id(2));

        let quantities: Vec<f64> = book.iter().map(|(q, _)| q).collect();
        assert_eq!(quantities, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_book_snapshot_ignores_insertion_order() {
        let mut a = OrderBook::new();
        a.insert(5.0, id(1));
        a.insert(5.0, id(2));

        let mut b = OrderBook::new();
        b.insert(5.0, id(2));
        b.insert(5.0, id(1));

        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_empty_book_totals_zero() {
        let book = OrderBook::new();
        assert_eq!(book.level_count(), 0);
        assert!(book.total_quantity().is_sign_positive());
    }
}
