//! Software modem core
//!
//! Turns bytes into modulated audio and audio back into bytes, one sample
//! at a time, entirely in software.
//!
//! ## Architecture (Hexagonal / Ports & Adapters)
//!
//! - `domain/` - Configuration, errors and shared types, no DSP
//! - `ports/` - Trait definitions for facilities the core consumes
//! - `dsp/` - Oscillators, filters, carrier and timing recovery (no I/O)
//! - `modem/` - Mode contract, AFC, QAM16 and the `Modem` engine
//!
//! Audio capture and playback stay outside the crate: the caller feeds
//! `Modem::receive_audio` and plays what `Modem::transmit_audio` returns.

pub mod domain;
pub mod dsp;
pub mod modem;
pub mod ports;

pub use domain::{ModemConfig, ModemError, ModemResult};
pub use modem::{Mode, Modem};
