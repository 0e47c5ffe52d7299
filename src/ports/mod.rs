//! Port traits (interfaces)
//!
//! Boundaries between the modem core and facilities it consumes rather than
//! implements. The DSP layer provides a default adapter for each.

pub mod transform;

pub use transform::*;
