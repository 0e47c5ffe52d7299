//! Numerically Controlled Oscillator
//!
//! A 32-bit phase accumulator indexes a 65,536-entry cos/sin table with
//! its top 16 bits. Phase wraps by integer overflow, so frequency
//! resolution is `sample_rate / 2^32` Hz and the table index sequence is
//! exactly reproducible. Frequencies above Nyquist alias silently.

use std::f64::consts::TAU;
use std::sync::OnceLock;

use super::complex::Complex;

/// Entries in the cos/sin table, one full cycle
pub const TABLE_SIZE: usize = 1 << 16;

/// Width of the phase accumulator, as a float scale
pub const PHASE_SCALE: f64 = 4_294_967_296.0;

/// Right shift that turns a 32-bit phase into a table index
const INDEX_SHIFT: u32 = 16;

static COSSIN_TABLE: OnceLock<Vec<Complex>> = OnceLock::new();

/// The process-wide table: `table[k] = (cos(2πk/65536), sin(2πk/65536))`.
/// Built on first use and never mutated afterwards.
pub fn cossin_table() -> &'static [Complex] {
    COSSIN_TABLE.get_or_init(|| {
        let delta = TAU / TABLE_SIZE as f64;
        (0..TABLE_SIZE)
            .map(|k| {
                let (sin, cos) = (k as f64 * delta).sin_cos();
                Complex::new(cos, sin)
            })
            .collect()
    })
}

/// Table lookup for an angle in radians (any sign, any number of turns)
pub fn cossin(angle: f64) -> Complex {
    let index = (angle / TAU * TABLE_SIZE as f64).floor() as i64;
    cossin_table()[index.rem_euclid(TABLE_SIZE as i64) as usize]
}

/// Numerically Controlled Oscillator for local carriers
#[derive(Debug, Clone)]
pub struct Nco {
    table: &'static [Complex],
    hz_to_int: f64,
    sample_rate: f64,
    frequency: f64,
    freq_word: i32,
    phase: u32,
}

impl Nco {
    /// Create a new NCO with the given frequency and sample rate
    pub fn new(frequency: f64, sample_rate: f64) -> Self {
        let mut nco = Self {
            table: cossin_table(),
            hz_to_int: PHASE_SCALE / sample_rate,
            sample_rate,
            frequency: 0.0,
            freq_word: 0,
            phase: 0,
        };
        nco.set_frequency(frequency);
        nco
    }

    /// Set the oscillator frequency. `freq_word = round(hz * 2^32 / fs)`.
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
        // i64 first, then truncate: anything past Nyquist wraps to its alias
        self.freq_word = (frequency * self.hz_to_int).round() as i64 as i32;
    }

    /// Change the sample rate, keeping the configured frequency
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.hz_to_int = PHASE_SCALE / sample_rate;
        self.set_frequency(self.frequency);
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn freq_word(&self) -> i32 {
        self.freq_word
    }

    /// Raw 32-bit phase accumulator
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Advance one sample and return `(cos, sin)` at the new phase
    #[inline]
    pub fn next(&mut self) -> Complex {
        self.phase = self.phase.wrapping_add(self.freq_word as u32);
        self.table[(self.phase >> INDEX_SHIFT) as usize]
    }

    /// Down-convert one real sample: `v * e^{-jφ}`
    #[inline]
    pub fn mix_real(&mut self, v: f64) -> Complex {
        let cs = self.next();
        Complex::new(v * cs.re, -v * cs.im)
    }

    pub fn mix_real_buffer(&mut self, input: &[f64]) -> Vec<Complex> {
        input.iter().map(|&v| self.mix_real(v)).collect()
    }

    /// Up-convert one baseband sample to real: `Re(s * e^{jφ})`
    #[inline]
    pub fn mix_complex(&mut self, s: Complex) -> f64 {
        let cs = self.next();
        s.re * cs.re - s.im * cs.im
    }

    pub fn mix_complex_buffer(&mut self, input: &[Complex]) -> Vec<f64> {
        input.iter().map(|&s| self.mix_complex(s)).collect()
    }
}

impl Iterator for Nco {
    type Item = Complex;

    fn next(&mut self) -> Option<Complex> {
        Some(Nco::next(self))
    }
}
