//! # sim-exchange
//!
//! Message routing and greedy market clearing for agent-based resource
//! simulations.
//!
//! ## Architecture
//!
//! - **Types**: ids, resources and the transaction a message carries
//! - **Message**: envelope with a path stack, node capabilities and the
//!   [`Network`] that owns messages and nodes and delivers between them
//! - **Market**: quantity-ordered books and the [`GreedyMarket`] matcher
//! - **Ledger**: record of approved transfers with a SHA-256 digest
//! - **Topology**: relay, facility and stockpile building blocks
//!
//! ## Flow
//!
//! ```text
//! Facility --up--> Relay --up--> GreedyMarket      (offer / request)
//!                                     |
//!                                  resolve
//!                                     |
//! Facility <-down- Relay <-down-------+             (order)
//!    |
//! approve_transfer: supplier Stockpile -> requester Stockpile, ledger entry
//! ```
//!
//! ## Design Principles
//!
//! 1. **Single-threaded**: delivery is a nested call; nothing is queued
//! 2. **Owned context**: all state lives in a [`Network`] passed by reference
//! 3. **Handles, not pointers**: nodes and books refer to messages by id
//! 4. **Local rollback**: a rejected request leaves the offer book as it was

// ============================================================================
// Module declarations
// ============================================================================

/// Tolerances and construction parameters
pub mod config;

/// Protocol, ledger and configuration errors
pub mod error;

/// Core value types: ids, Resource, Transaction
pub mod types;

/// Message envelope, node capabilities and the Network
pub mod message;

/// Order books and the greedy matching engine
pub mod market;

/// Append-only record of approved transfers
pub mod ledger;

/// Relay, Facility and Stockpile nodes
pub mod topology;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::{AcceptanceRule, MarketConfig, NetworkConfig, EPS_KG};
pub use error::{ConfigError, LedgerError, MessageError};
pub use ledger::{TransactionLedger, TransactionRecord};
pub use market::{GreedyMarket, OrderBook, ResolveSummary};
pub use message::{Agent, Communicator, Direction, Market, Message, Network};
pub use types::{CommId, CommodityId, GenericResource, MessageId, Resource, Transaction};
