//! Messages and their routing.
//!
//! ## Components
//!
//! - [`Message`]: transaction envelope with its path stack
//! - [`Communicator`], [`Market`], [`Agent`]: node capabilities
//! - [`Network`]: owns messages and nodes, delivers and settles

mod communicator;
#[allow(clippy::module_inception)]
mod message;
mod network;

pub use communicator::{Agent, Communicator, Market};
pub use message::{Direction, Message};
pub use network::Network;
