//! Costas Loop for carrier phase/frequency tracking
//!
//! Each sample is multiplied by the local oscillator's cos and sin, each
//! arm is low-passed by its own biquad to drop the double-frequency term,
//! and the product of the two arms is the phase error: `I·Q ≈ −e/4` for a
//! unit-amplitude input, zero at lock.
//!
//! Phase and frequency are floating-point radians (per sample). The
//! oscillator values come from the shared NCO table.
//!
//! The loop filter runs in incremental form: its output is the change in
//! frequency for this sample, and `freq −= err` accumulates it. Together
//! that is a PI controller on frequency (a type-2 loop), so a constant
//! carrier offset is tracked with zero steady-state phase error. Frequency
//! is held within `center ± bandwidth/2`.
//!
//! The filter keeps a single integrator because `freq −= err` already
//! supplies the second one; a double-integrator state here would make the
//! phase path third order.

use std::f64::consts::TAU;

use super::biquad::{Biquad, DEFAULT_Q};
use super::complex::Complex;
use super::nco::cossin;
use crate::domain::{below_nyquist, check_frequency, ModemError, ModemResult};

/// Loop gain `K`
const LOOP_GAIN: f64 = 1000.0;

/// Damping factor `ζ`
const DAMPING: f64 = 0.707;

/// Slope of the `I·Q` detector for a unit-amplitude input
const DETECTOR_GAIN: f64 = 0.25;

/// Default loop bandwidth as a fraction of the sample rate (`2π/400` rad/sample)
pub const DEFAULT_BANDWIDTH_RATIO: f64 = 1.0 / 400.0;

/// Second-order loop filter over a 3-tap history of its integrator state
#[derive(Debug, Clone)]
pub struct LoopFilter {
    b0: f64,
    b1: f64,
    b2: f64,
    v0: f64,
    v1: f64,
    v2: f64,
}

impl LoopFilter {
    /// `bandwidth` is the loop's natural frequency in radians per sample
    pub fn new(bandwidth: f64) -> Self {
        let tau1 = LOOP_GAIN / (bandwidth * bandwidth);
        let tau2 = 2.0 * DAMPING / bandwidth;
        let kp = LOOP_GAIN * tau2 / tau1 / DETECTOR_GAIN;
        let ki = LOOP_GAIN / tau1 / DETECTOR_GAIN;
        Self {
            b0: kp + ki,
            b1: -2.0 * kp - ki,
            b2: kp,
            v0: 0.0,
            v1: 0.0,
            v2: 0.0,
        }
    }

    /// Integrate `x` and return this sample's frequency correction
    #[inline]
    pub fn update(&mut self, x: f64) -> f64 {
        self.v2 = self.v1;
        self.v1 = self.v0;
        self.v0 = self.v1 + x;
        self.b0 * self.v0 + self.b1 * self.v1 + self.b2 * self.v2
    }
}

/// Costas loop carrier tracker
#[derive(Debug, Clone)]
pub struct CostasLoop {
    sample_rate: f64,
    /// Phase in radians, kept within [−2π, 2π)
    phase: f64,
    /// Current frequency estimate in radians per sample
    freq: f64,
    center_freq: f64,
    min_freq: f64,
    max_freq: f64,
    bandwidth: f64,
    arm_q: f64,
    cos_lpf: Biquad,
    sin_lpf: Biquad,
    loop_filter: LoopFilter,
}

impl CostasLoop {
    /// Create a loop centered on `frequency` Hz with the default bandwidth
    pub fn new(frequency: f64, sample_rate: f64) -> ModemResult<Self> {
        Self::with_bandwidth(frequency, sample_rate, sample_rate * DEFAULT_BANDWIDTH_RATIO)
    }

    /// Create a loop with an explicit loop bandwidth in Hz
    pub fn with_bandwidth(frequency: f64, sample_rate: f64, bandwidth_hz: f64) -> ModemResult<Self> {
        if !below_nyquist(bandwidth_hz, sample_rate) {
            return Err(ModemError::Config(format!(
                "loop bandwidth {bandwidth_hz} Hz out of range"
            )));
        }
        let bandwidth = TAU * bandwidth_hz / sample_rate;
        let (cos_lpf, sin_lpf) = Self::arm_filters(frequency, sample_rate, DEFAULT_Q)?;
        let center_freq = TAU * frequency / sample_rate;
        Ok(Self {
            sample_rate,
            phase: 0.0,
            freq: center_freq,
            center_freq,
            min_freq: center_freq - bandwidth * 0.5,
            max_freq: center_freq + bandwidth * 0.5,
            bandwidth,
            arm_q: DEFAULT_Q,
            cos_lpf,
            sin_lpf,
            loop_filter: LoopFilter::new(bandwidth),
        })
    }

    /// Rebuild both arm filters with quality factor `q`
    pub fn with_arm_q(mut self, q: f64) -> ModemResult<Self> {
        let (cos_lpf, sin_lpf) = Self::arm_filters(self.center_frequency(), self.sample_rate, q)?;
        self.cos_lpf = cos_lpf;
        self.sin_lpf = sin_lpf;
        self.arm_q = q;
        Ok(self)
    }

    /// Both arms cut off at half the center frequency
    fn arm_filters(frequency: f64, sample_rate: f64, q: f64) -> ModemResult<(Biquad, Biquad)> {
        check_frequency(frequency, sample_rate)?;
        let cutoff = frequency * 0.5;
        Ok((
            Biquad::low_pass(cutoff, sample_rate, q)?,
            Biquad::low_pass(cutoff, sample_rate, q)?,
        ))
    }

    /// Retune the loop center. Resets the arm filters and the loop filter,
    /// keeps the phase.
    pub fn set_frequency(&mut self, frequency: f64) -> ModemResult<()> {
        let (cos_lpf, sin_lpf) = Self::arm_filters(frequency, self.sample_rate, self.arm_q)?;
        self.cos_lpf = cos_lpf;
        self.sin_lpf = sin_lpf;
        self.loop_filter = LoopFilter::new(self.bandwidth);
        self.center_freq = TAU * frequency / self.sample_rate;
        self.freq = self.center_freq;
        self.min_freq = self.center_freq - self.bandwidth * 0.5;
        self.max_freq = self.center_freq + self.bandwidth * 0.5;
        Ok(())
    }

    /// Process one real sample; returns the filtered `(cos, sin)` arms
    pub fn update(&mut self, v: f64) -> Complex {
        let cs = cossin(self.phase);
        let cosxf = self.cos_lpf.update(v * cs.re);
        let sinxf = self.sin_lpf.update(v * cs.im);
        let err = self.loop_filter.update(cosxf * sinxf);

        let mut freq = self.freq - err;
        if freq > self.max_freq {
            log::trace!("costas: clamped at max frequency");
            freq = self.max_freq;
        } else if freq < self.min_freq {
            log::trace!("costas: clamped at min frequency");
            freq = self.min_freq;
        }

        let mut phase = self.phase + freq;
        while phase >= TAU {
            phase -= TAU;
        }
        while phase < -TAU {
            phase += TAU;
        }
        self.freq = freq;
        self.phase = phase;
        Complex::new(cosxf, sinxf)
    }

    /// Tracked frequency in Hz
    pub fn frequency(&self) -> f64 {
        self.freq * self.sample_rate / TAU
    }

    /// Center frequency in Hz
    pub fn center_frequency(&self) -> f64 {
        self.center_freq * self.sample_rate / TAU
    }

    /// Tracking range `(min, max)` in Hz
    pub fn bounds(&self) -> (f64, f64) {
        let scale = self.sample_rate / TAU;
        (self.min_freq * scale, self.max_freq * scale)
    }

    /// Phase in radians
    pub fn phase(&self) -> f64 {
        self.phase
    }
}
