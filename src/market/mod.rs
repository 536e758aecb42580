//! Market clearing.
//!
//! ## Components
//!
//! - [`QuantityLevel`]: messages sharing one quantity, newest taken first
//! - [`OrderBook`]: quantity-ordered levels with take-largest
//! - [`GreedyMarket`]: largest-first matching with per-request rollback
//! - [`ResolveSummary`]: counts reported by one resolution pass

mod book;
mod greedy;
mod level;
mod summary;

pub use book::OrderBook;
pub use greedy::GreedyMarket;
pub use level::QuantityLevel;
pub use summary::ResolveSummary;
