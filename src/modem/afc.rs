//! Automatic frequency control
//!
//! Compares spectral energy just above and just below the tuned bin and
//! nudges the tuned frequency toward the heavier side. Runs on magnitude
//! spectra, independent of any carrier loop.

use crate::domain::bin_width;

/// Bins summed on each side of the center bin
pub const AFC_SPAN: usize = 15;

/// Fraction of a bin width applied per update at full imbalance
const AFC_GAIN: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct Afc {
    enabled: bool,
    sample_rate: f64,
}

impl Afc {
    pub fn new(enabled: bool, sample_rate: f64) -> Self {
        Self {
            enabled,
            sample_rate,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Correction in Hz for a spectrum tuned at `frequency`.
    ///
    /// Zero when the window holds no energy or the tuned bin lies outside
    /// the spectrum.
    pub fn offset(&self, frequency: f64, spectrum: &[f64]) -> f64 {
        let width = bin_width(self.sample_rate);
        let center = (frequency / width).round();
        // Negative or NaN tuning has no bin
        if center.is_nan() || center < 0.0 || center as usize >= spectrum.len() {
            return 0.0;
        }
        let center = center as usize;

        let lower: f64 = spectrum[center.saturating_sub(AFC_SPAN)..center].iter().sum();
        let upper_end = (center + AFC_SPAN + 1).min(spectrum.len());
        let upper: f64 = spectrum[center + 1..upper_end].iter().sum();

        let total = upper + lower;
        if total == 0.0 {
            return 0.0;
        }
        (upper - lower) / total * AFC_GAIN * width
    }

    /// New tuned frequency, or `None` when disabled or already balanced
    pub fn adjust(&self, frequency: f64, spectrum: &[f64]) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        let offset = self.offset(frequency, spectrum);
        if offset == 0.0 {
            return None;
        }
        log::debug!("afc: {frequency:.2} Hz nudged by {offset:+.3} Hz");
        Some(frequency + offset)
    }
}
