//! Tolerance helpers for floating-point quantities.
//!
//! Quantities are `f64` kilograms (or whatever unit the resource reports).
//! All comparisons that decide matching outcomes go through an absolute
//! tolerance, normally [`EPS_KG`](crate::config::EPS_KG).
//!
//! ```
//! use sim_exchange::config::EPS_KG;
//! use sim_exchange::types::quantity::{exceeds, is_negligible};
//!
//! assert!(!exceeds(0.1 + 0.2, 0.3, EPS_KG));
//! assert!(is_negligible(1e-9, EPS_KG));
//! ```

/// `true` if `value` is within `tolerance` of zero.
#[inline]
pub fn is_negligible(value: f64, tolerance: f64) -> bool {
    value.abs() <= tolerance
}

/// `true` if `a` exceeds `b` by more than `tolerance`.
#[inline]
pub fn exceeds(a: f64, b: f64, tolerance: f64) -> bool {
    a - b > tolerance
}
