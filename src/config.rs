//! Configuration for markets and the message network.
//!
//! Both configs are plain values with sensible defaults. Loading them from
//! input files belongs to the surrounding simulation; this crate only
//! validates what it is handed.

use crate::error::ConfigError;

/// Absolute tolerance (kg) below which a remaining quantity counts as zero.
pub const EPS_KG: f64 = 1e-6;

// ============================================================================
// AcceptanceRule
// ============================================================================

/// How a market decides whether a request was fully matched.
///
/// The matching loop stops once the remaining amount falls within
/// `eps_kg`, but the historical acceptance check compares the remainder to
/// exactly zero. A request whose fills leave a sub-tolerance remainder is
/// therefore rejected under [`AcceptanceRule::ExactZero`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptanceRule {
    /// Accept only when the remaining amount is exactly `0.0`.
    #[default]
    ExactZero,
    /// Accept when the remaining amount is within `eps_kg` of zero.
    WithinTolerance,
}

impl AcceptanceRule {
    /// Returns `true` if a request with `remaining` unmatched quantity is accepted.
    pub fn accepts(self, remaining: f64, eps_kg: f64) -> bool {
        match self {
            AcceptanceRule::ExactZero => remaining == 0.0,
            AcceptanceRule::WithinTolerance => remaining.abs() <= eps_kg,
        }
    }
}

// ============================================================================
// MarketConfig
// ============================================================================

/// Parameters of a greedy clearing market.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketConfig {
    /// Tolerance used for splitting, residuals and the matching loop.
    ///
    /// Default: [`EPS_KG`]. Must be finite and non-negative.
    pub eps_kg: f64,

    /// Acceptance check applied after a request's matching loop.
    pub acceptance: AcceptanceRule,

    /// Pending-order slots to pre-allocate for a resolution pass.
    pub order_capacity: usize,
}

impl MarketConfig {
    /// Default pre-allocated pending-order slots.
    pub const DEFAULT_ORDER_CAPACITY: usize = 64;

    pub fn new() -> Self {
        Self {
            eps_kg: EPS_KG,
            acceptance: AcceptanceRule::default(),
            order_capacity: Self::DEFAULT_ORDER_CAPACITY,
        }
    }

    pub fn with_eps_kg(mut self, eps_kg: f64) -> Self {
        self.eps_kg = eps_kg;
        self
    }

    pub fn with_acceptance(mut self, acceptance: AcceptanceRule) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_order_capacity(mut self, order_capacity: usize) -> Self {
        self.order_capacity = order_capacity;
        self
    }

    /// Check that the tolerance is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.eps_kg.is_finite() || self.eps_kg < 0.0 {
            return Err(ConfigError::InvalidTolerance(self.eps_kg));
        }
        Ok(())
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// NetworkConfig
// ============================================================================

/// Pre-allocation hints for a [`Network`](crate::message::Network).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Message arena slots to pre-allocate.
    pub message_capacity: usize,
    /// Node table slots to pre-allocate.
    pub node_capacity: usize,
}

impl NetworkConfig {
    pub const DEFAULT_MESSAGE_CAPACITY: usize = 1024;
    pub const DEFAULT_NODE_CAPACITY: usize = 32;
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            message_capacity: Self::DEFAULT_MESSAGE_CAPACITY,
            node_capacity: Self::DEFAULT_NODE_CAPACITY,
        }
    }
}
