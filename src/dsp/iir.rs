//! Single-pole IIR smoother
//!
//! `y = (1 − |b|)·x + b·y₁` with `|b| = exp(−2π·fc/fs)`. The lowpass has its
//! pole at `+|b|` and unity gain at DC. The highpass is the same filter at
//! `fs/2 − fc` moved to Nyquist: pole at `−|b|`, unity gain at `fs/2`.

use std::f64::consts::TAU;

use crate::domain::{check_frequency, ModemResult};

#[derive(Debug, Clone)]
pub struct Iir {
    a: f64,
    b: f64,
    y1: f64,
}

impl Iir {
    fn with_pole(b: f64) -> Self {
        Self {
            a: 1.0 - b.abs(),
            b,
            y1: 0.0,
        }
    }

    /// One-pole lowpass with its corner at `cutoff`
    pub fn low_pass(cutoff: f64, sample_rate: f64) -> ModemResult<Self> {
        check_frequency(cutoff, sample_rate)?;
        Ok(Self::with_pole((-TAU * cutoff / sample_rate).exp()))
    }

    /// One-pole highpass passing content above `cutoff`
    pub fn high_pass(cutoff: f64, sample_rate: f64) -> ModemResult<Self> {
        check_frequency(cutoff, sample_rate)?;
        Ok(Self::with_pole(-(-TAU * (0.5 - cutoff / sample_rate)).exp()))
    }

    /// Pole position
    pub fn pole(&self) -> f64 {
        self.b
    }

    pub fn update(&mut self, x: f64) -> f64 {
        self.y1 = self.a * x + self.b * self.y1;
        self.y1
    }

    /// Last output
    pub fn value(&self) -> f64 {
        self.y1
    }

    /// Start from a settled output of `value`
    pub fn reset(&mut self, value: f64) {
        self.y1 = value;
    }
}
