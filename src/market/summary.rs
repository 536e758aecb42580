//! Outcome of one market resolution pass.

use std::fmt;

/// Counts reported by [`Market::resolve`](crate::message::Market::resolve).
///
/// ## Example
///
/// ```
/// use sim_exchange::market::ResolveSummary;
///
/// let summary = ResolveSummary {
///     requests_accepted: 3,
///     requests_rejected: 1,
///     orders_sent: 5,
///     quantity_cleared: 250.0,
/// };
/// assert_eq!(summary.requests_seen(), 4);
/// assert_eq!(summary.acceptance_rate(), 0.75);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolveSummary {
    /// Requests fully matched and committed.
    pub requests_accepted: u64,

    /// Requests rolled back.
    pub requests_rejected: u64,

    /// Orders reversed and sent down during settlement.
    pub orders_sent: u64,

    /// Sum of the quantities of accepted requests.
    pub quantity_cleared: f64,
}

impl ResolveSummary {
    /// Requests popped from the book in this pass.
    #[inline]
    pub fn requests_seen(&self) -> u64 {
        self.requests_accepted + self.requests_rejected
    }

    /// `true` if the pass had no requests to clear.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.requests_seen() == 0
    }

    /// Share of requests accepted, 0.0 for an empty pass.
    pub fn acceptance_rate(&self) -> f64 {
        match self.requests_seen() {
            0 => 0.0,
            seen => self.requests_accepted as f64 / seen as f64,
        }
    }

    /// Add another pass's counts to this one.
    pub fn absorb(&mut self, other: &ResolveSummary) {
        self.requests_accepted += other.requests_accepted;
        self.requests_rejected += other.requests_rejected;
        self.orders_sent += other.orders_sent;
        self.quantity_cleared += other.quantity_cleared;
    }
}

impl fmt::Display for ResolveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} accepted, {} rejected, {} orders, {} cleared",
            self.requests_accepted, self.requests_rejected, self.orders_sent, self.quantity_cleared
        )
    }
}
