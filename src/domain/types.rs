//! Core domain types

use serde::{Deserialize, Serialize};

/// Audio sample type (64-bit float, nominal range -1.0 to 1.0)
pub type Sample = f64;

/// Sample rate of the modem core in Hz. The audio front end may run faster
/// and decimate before handing buffers over.
pub const DEFAULT_SAMPLE_RATE: f64 = 8000.0;

/// Number of bins in a spectrum/magnitude array. Bin `k` corresponds to
/// `k * (sample_rate / 2) / BINS` Hz.
pub const BINS: usize = 1024;

/// Frequency covered by one spectrum bin
pub fn bin_width(sample_rate: f64) -> f64 {
    sample_rate * 0.5 / BINS as f64
}

/// The digital modes this modem knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    /// 16-point differential QAM, V.22bis-style constellation
    #[default]
    Qam16,
}

/// Descriptive properties a mode reports about itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    pub name: String,
    pub description: String,
    pub tooltip: String,
}

/// Current modem status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemStatus {
    pub mode: String,
    pub frequency_hz: f64,
    pub symbol_rate: f64,
    pub afc_enabled: bool,
    /// Carrier frequency the tracking loop currently reports
    pub carrier_hz: f64,
    /// Bytes queued for transmit but not yet consumed
    pub tx_pending: usize,
}
