//! Error types.
//!
//! Every variant of [`MessageError`] is a protocol violation: a defect in the
//! calling agent or the topology wiring. A request that cannot be filled is
//! not an error; the market rolls it back and carries on.

use thiserror::Error;

use crate::types::{CommId, MessageId};

/// Protocol violations raised while building, routing or settling messages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MessageError {
    /// Up with an empty path, or Down with nothing below the current hop.
    #[error("can't send message {0}: next destination is unspecified")]
    NoDestination(MessageId),

    /// The next hop is the node that currently owns the message.
    #[error("message {message} receiver and sender are the same node ({node})")]
    SelfDelivery { message: MessageId, node: CommId },

    /// A recipient, supplier, requester or resource was read before being set.
    #[error("uninitialized message {field}")]
    Uninitialized { field: &'static str },

    /// The handle was never issued or the message has been retired.
    #[error("unknown message {0}")]
    UnknownMessage(MessageId),

    #[error("unknown node {0}")]
    UnknownNode(CommId),

    /// The node is already handling a delivery further up the call stack.
    #[error("node {0} is busy handling another delivery")]
    NodeBusy(CommId),

    /// `resolve` was asked of a node registered without market capability.
    #[error("node {0} is not a market")]
    NotAMarket(CommId),

    /// A transfer named a party with no agent capability attached.
    #[error("node {0} has no agent capability")]
    NotAnAgent(CommId),

    /// The supplier does not hold enough compatible material.
    #[error("agent {agent} holds {available} compatible units, {requested} requested")]
    Shortfall {
        agent: CommId,
        requested: f64,
        available: f64,
    },
}

/// Failures producing the ledger digest.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("failed to encode ledger entry {transaction_id}: {reason}")]
    Encoding { transaction_id: u64, reason: String },
}

/// Invalid configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),
}
