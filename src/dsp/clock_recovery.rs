//! Symbol timing recovery
//!
//! Early-late gate over a ring buffer of smoothed sample power, one slot
//! per sample of a symbol period. Energy in the first half of the window
//! versus the second half steers a fractional bit clock; a symbol is
//! strobed each time the clock wraps.

use super::complex::{self, Complex};

/// Smoothing applied to each ring-buffer slot: `old·0.8 + new·0.2`
const HISTORY_WEIGHT: f64 = 0.8;
const SAMPLE_WEIGHT: f64 = 0.2;

/// Scale of the normalized early-late error
const ERROR_GAIN: f64 = 0.2;

/// Early-late symbol clock recovery
#[derive(Debug, Clone)]
pub struct EarlyLate {
    buffer: Vec<f64>,
    half: usize,
    bit_clock: f64,
}

impl EarlyLate {
    /// Create a gate for `samples_per_symbol` (fractional values allowed)
    pub fn new(samples_per_symbol: f64) -> Self {
        let size = (samples_per_symbol.round() as usize).max(1);
        Self {
            buffer: vec![0.0; size],
            half: (samples_per_symbol * 0.5).floor() as usize,
            bit_clock: 0.0,
        }
    }

    /// Window size in samples
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Fractional position within the window, always in `[0, size)`
    pub fn bit_clock(&self) -> f64 {
        self.bit_clock
    }

    /// Feed one baseband sample. Returns the sample when it is the
    /// symbol decision point.
    pub fn update(&mut self, sample: Complex) -> Option<Complex> {
        let size = self.buffer.len();
        let index = (self.bit_clock.round() as usize) % size;
        self.buffer[index] = HISTORY_WEIGHT * self.buffer[index] + SAMPLE_WEIGHT * complex::mag(sample);

        let error = self.timing_error();
        self.bit_clock += 1.0 - error;

        let size = size as f64;
        if self.bit_clock < 0.0 {
            self.bit_clock += size;
        } else if self.bit_clock >= size {
            self.bit_clock -= size;
            return Some(sample);
        }
        None
    }

    /// `(early − late) / (early + late) · 0.2`, zero on an empty window
    fn timing_error(&self) -> f64 {
        let (early, late) = self.buffer[..self.half]
            .iter()
            .zip(&self.buffer[self.half..2 * self.half])
            .fold((0.0, 0.0), |(e, l), (&a, &b)| (e + a, l + b));
        let total = early + late;
        if total == 0.0 {
            0.0
        } else {
            (early - late) / total * ERROR_GAIN
        }
    }

    /// Clear the energy history and restart the clock
    pub fn reset(&mut self) {
        self.buffer.iter_mut().for_each(|v| *v = 0.0);
        self.bit_clock = 0.0;
    }
}
