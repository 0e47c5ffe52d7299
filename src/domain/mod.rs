//! Core domain types
//!
//! Pure types with no DSP dependencies: errors, configuration and the
//! small value types shared by every mode.

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;
