//! Biquad (second-order IIR) filters
//!
//! Coefficients come from the RBJ audio-EQ cookbook: `ω = 2π·f/fs`,
//! `α = sin(ω)/(2Q)`, then normalized by `a0` so the leading feedback
//! coefficient is 1. `update` runs direct form I:
//!
//! `y = b0·x + b1·x1 + b2·x2 − a1·y1 − a2·y2`
//!
//! The real and complex paths keep separate delay lines, so one filter can
//! serve either kind of stream but should not be fed both.

use std::f64::consts::PI;

use super::complex::{Complex, ZERO};
use crate::domain::{check_frequency, is_positive, ModemError, ModemResult};

/// Default Q for lowpass/highpass (Butterworth)
pub const DEFAULT_Q: f64 = 0.707;

/// Default Q for bandpass/bandreject
pub const DEFAULT_BAND_Q: f64 = 0.5;

/// Normalized biquad coefficients, `a0 == 1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoefficients {
    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        let a0_inv = 1.0 / a0;
        Self {
            b0: b0 * a0_inv,
            b1: b1 * a0_inv,
            b2: b2 * a0_inv,
            a1: a1 * a0_inv,
            a2: a2 * a0_inv,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Biquad {
    coefficients: BiquadCoefficients,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    cx1: Complex,
    cx2: Complex,
    cy1: Complex,
    cy2: Complex,
}

/// `(sin ω, cos ω)` for a validated design frequency
fn sin_cos(frequency: f64, sample_rate: f64, q: f64) -> ModemResult<(f64, f64)> {
    check_frequency(frequency, sample_rate)?;
    if !is_positive(q) {
        return Err(ModemError::InvalidQ(q));
    }
    Ok((2.0 * PI * frequency / sample_rate).sin_cos())
}

impl Biquad {
    pub fn from_coefficients(coefficients: BiquadCoefficients) -> Self {
        Self {
            coefficients,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            cx1: ZERO,
            cx2: ZERO,
            cy1: ZERO,
            cy2: ZERO,
        }
    }

    /// Second-order lowpass, -3 dB at `frequency` for Q = 0.707
    pub fn low_pass(frequency: f64, sample_rate: f64, q: f64) -> ModemResult<Self> {
        let (sn, cs) = sin_cos(frequency, sample_rate, q)?;
        let alpha = sn / (2.0 * q);
        Ok(Self::from_coefficients(BiquadCoefficients::normalized(
            (1.0 - cs) * 0.5,
            1.0 - cs,
            (1.0 - cs) * 0.5,
            1.0 + alpha,
            -2.0 * cs,
            1.0 - alpha,
        )))
    }

    /// Mirror of `low_pass`: zeros at DC instead of Nyquist
    pub fn high_pass(frequency: f64, sample_rate: f64, q: f64) -> ModemResult<Self> {
        let (sn, cs) = sin_cos(frequency, sample_rate, q)?;
        let alpha = sn / (2.0 * q);
        Ok(Self::from_coefficients(BiquadCoefficients::normalized(
            (1.0 + cs) * 0.5,
            -(1.0 + cs),
            (1.0 + cs) * 0.5,
            1.0 + alpha,
            -2.0 * cs,
            1.0 - alpha,
        )))
    }

    /// Constant skirt gain bandpass, peak gain = Q
    pub fn band_pass(frequency: f64, sample_rate: f64, q: f64) -> ModemResult<Self> {
        let (sn, cs) = sin_cos(frequency, sample_rate, q)?;
        let alpha = sn / (2.0 * q);
        Ok(Self::from_coefficients(BiquadCoefficients::normalized(
            sn * 0.5,
            0.0,
            -sn * 0.5,
            1.0 + alpha,
            -2.0 * cs,
            1.0 - alpha,
        )))
    }

    /// Notch
    pub fn band_reject(frequency: f64, sample_rate: f64, q: f64) -> ModemResult<Self> {
        let (sn, cs) = sin_cos(frequency, sample_rate, q)?;
        let alpha = sn / (2.0 * q);
        Ok(Self::from_coefficients(BiquadCoefficients::normalized(
            1.0,
            -2.0 * cs,
            1.0,
            1.0 + alpha,
            -2.0 * cs,
            1.0 - alpha,
        )))
    }

    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coefficients
    }

    /// Filter one real sample
    #[inline]
    pub fn update(&mut self, x: f64) -> f64 {
        let c = &self.coefficients;
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    /// Filter one complex sample
    #[inline]
    pub fn update_complex(&mut self, x: Complex) -> Complex {
        let c = &self.coefficients;
        let y = x * c.b0 + self.cx1 * c.b1 + self.cx2 * c.b2 - self.cy1 * c.a1 - self.cy2 * c.a2;
        self.cx2 = self.cx1;
        self.cx1 = x;
        self.cy2 = self.cy1;
        self.cy1 = y;
        y
    }
}
