//! Ready-made nodes for building a trading topology.
//!
//! ```text
//!              GreedyMarket
//!                   ^
//!          Relay::to_market (region)
//!                   ^
//!          Relay::new (institution)
//!             ^            ^
//!        Facility      Facility      <- Stockpile agents attached
//! ```
//!
//! - [`Relay`]: forwards upward messages to a parent, or to the market for
//!   the message's commodity, and passes returning messages down
//! - [`Facility`]: leaf endpoint; approves the transfer of an order that
//!   reaches it
//! - [`Stockpile`]: agent holding the material a facility trades

mod facility;
mod relay;
mod stockpile;

pub use facility::{submit, Facility};
pub use relay::Relay;
pub use stockpile::Stockpile;
