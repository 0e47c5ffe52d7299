//! Modem
//!
//! Mode contract, AFC, the QAM16 mode and the engine that drives them

pub mod afc;
pub mod engine;
pub mod mode;
pub mod qam16;

pub use afc::Afc;
pub use engine::Modem;
pub use mode::{Mode, ModeCore};
pub use qam16::{Qam16, Qam16Demodulator, Qam16Modulator};
