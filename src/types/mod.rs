//! Core value types.
//!
//! ## Types
//!
//! - [`CommId`], [`MessageId`], [`CommodityId`]: opaque handles
//! - [`Transaction`]: a proposed transfer
//! - [`Resource`]: capability of the transferred material
//! - [`GenericResource`]: units + quality tag resource
//! - [`Manifest`]: resource units moved by an approved transfer

mod ids;
mod resource;
mod transaction;
pub mod quantity;

pub use ids::{CommId, CommodityId, MessageId};
pub use resource::{manifest_quantity, GenericResource, Manifest, Resource};
pub use transaction::Transaction;
