//! 16-point differential QAM
//!
//! Points sit at ±1/±3 on each axis, four to a quadrant. Every nibble
//! (high nibble of a byte first) is one symbol: its top two bits pick a
//! quadrant transition from the previous quadrant, its low two bits pick
//! the point within the new quadrant. Each quadrant's points are the
//! previous quadrant's rotated by 90°, so a receiver that is off by a
//! multiple of 90° loses only the first nibble.
//!
//! On air every symbol is a one-period raised-cosine pulse on the carrier,
//! and each transmit block ends with a silent guard symbol. The receiver
//! mixes down, runs the matched filter and lets the early-late gate pick
//! the peaks.

use crate::domain::{ModemConfig, ModemResult, Properties};
use crate::dsp::complex::ZERO;
use crate::dsp::{Complex, EarlyLate, Fir};

use super::mode::{Mode, ModeCore};

/// Constellation, `[quadrant][point]`
pub const QAM16: [[(i8, i8); 4]; 4] = [
    [(1, 1), (3, 1), (1, 3), (3, 3)],
    [(-1, 1), (-1, 3), (-3, 1), (-3, 3)],
    [(-1, -1), (-3, -1), (-1, -3), (-3, -3)],
    [(1, -1), (1, -3), (3, -1), (3, -3)],
];

/// Next quadrant, `[transition bits][current quadrant]`
pub const TRANSITIONS: [[usize; 4]; 4] = [
    [1, 2, 3, 0],
    [0, 1, 2, 3],
    [3, 0, 1, 2],
    [2, 3, 0, 1],
];

/// Bytes pulled from the queue per `transmit` call
const TX_CHUNK: usize = 30;

/// Amplitude scale: the outer points at unit pulse peak stay within [-1, 1]
const TX_GAIN: f64 = 0.2;

/// Silent symbol periods closing every transmit block
const GUARD_SYMBOLS: usize = 1;

/// Strobed power below this is not a symbol. The innermost points have
/// power 2.
const SYMBOL_SQUELCH: f64 = 0.5;

/// Constellation point as a complex value
pub fn point(quadrant: usize, index: usize) -> Complex {
    let (re, im) = QAM16[quadrant & 3][index & 3];
    Complex::new(re as f64, im as f64)
}

/// Nearest constellation point to `symbol`, as `(quadrant, index)`
pub fn slice(symbol: Complex) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_distance = f64::INFINITY;
    for quadrant in 0..4 {
        for index in 0..4 {
            let distance = (symbol - point(quadrant, index)).norm_sqr();
            if distance < best_distance {
                best_distance = distance;
                best = (quadrant, index);
            }
        }
    }
    best
}

/// Nibbles to constellation points, carrying the quadrant between calls
#[derive(Debug, Clone, Default)]
pub struct Qam16Modulator {
    quadrant: usize,
}

impl Qam16Modulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quadrant(&self) -> usize {
        self.quadrant
    }

    pub fn modulate_nibble(&mut self, nibble: u8) -> Complex {
        let transition = ((nibble >> 2) & 3) as usize;
        self.quadrant = TRANSITIONS[transition][self.quadrant];
        point(self.quadrant, (nibble & 3) as usize)
    }

    /// Two symbols per byte, high nibble first
    pub fn modulate(&mut self, bytes: &[u8]) -> Vec<Complex> {
        let mut symbols = Vec::with_capacity(bytes.len() * 2);
        for &b in bytes {
            symbols.push(self.modulate_nibble(b >> 4));
            symbols.push(self.modulate_nibble(b & 0x0f));
        }
        symbols
    }
}

/// Inverse of `Qam16Modulator`
#[derive(Debug, Clone, Default)]
pub struct Qam16Demodulator {
    quadrant: usize,
    high_nibble: Option<u8>,
}

impl Qam16Demodulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quadrant(&self) -> usize {
        self.quadrant
    }

    /// Decide one symbol back to its nibble
    pub fn demodulate_nibble(&mut self, symbol: Complex) -> u8 {
        let (quadrant, index) = slice(symbol);
        // Every column of the table is a permutation, so this always matches
        let transition = TRANSITIONS
            .iter()
            .position(|row| row[self.quadrant] == quadrant)
            .unwrap_or(0);
        self.quadrant = quadrant;
        ((transition as u8) << 2) | index as u8
    }

    /// Returns a byte on every second symbol
    pub fn demodulate_symbol(&mut self, symbol: Complex) -> Option<u8> {
        let nibble = self.demodulate_nibble(symbol);
        match self.high_nibble.take() {
            Some(high) => Some((high << 4) | nibble),
            None => {
                self.high_nibble = Some(nibble);
                None
            }
        }
    }

    pub fn demodulate(&mut self, symbols: &[Complex]) -> Vec<u8> {
        symbols
            .iter()
            .filter_map(|&s| self.demodulate_symbol(s))
            .collect()
    }
}

/// Pulse shaping and matched filters plus the timing gate, all sized to
/// one symbol period
struct SymbolFilters {
    tx: Fir,
    rx: Fir,
    rx_gain: f64,
    timing: EarlyLate,
}

impl SymbolFilters {
    /// Each symbol is one pulse exactly `sps` samples long, so pulses never
    /// overlap. The receive filter is matched to it, which puts the peak of
    /// every symbol on the last sample of its period; a fresh gate strobes
    /// there.
    fn new(sps: usize, rolloff: f64) -> ModemResult<Self> {
        let tx = Fir::cosine_pulse(sps, rolloff)?;
        let rx = tx.matched()?;
        let peak: f64 = tx
            .coefficients()
            .iter()
            .zip(rx.coefficients())
            .map(|(a, b)| a * b)
            .sum();
        // Mixing down halves the amplitude
        let rx_gain = 2.0 / (TX_GAIN * peak);
        Ok(Self {
            tx,
            rx,
            rx_gain,
            timing: EarlyLate::new(sps as f64),
        })
    }
}

/// QAM16 mode: pulse-shaped transmit, matched-filter and timed receive
pub struct Qam16 {
    core: ModeCore,
    modulator: Qam16Modulator,
    demodulator: Qam16Demodulator,
    filters: SymbolFilters,
}

impl Qam16 {
    pub fn new(config: &ModemConfig) -> ModemResult<Self> {
        let core = ModeCore::new(config)?;
        let filters = SymbolFilters::new(core.samples_per_symbol(), core.config().rolloff)?;
        log::info!(
            "qam16: {} Hz carrier, {} baud, {} samples/symbol",
            core.frequency(),
            core.symbol_rate(),
            core.samples_per_symbol()
        );
        Ok(Self {
            core,
            modulator: Qam16Modulator::new(),
            demodulator: Qam16Demodulator::new(),
            filters,
        })
    }

    /// Shape and up-convert one symbol period
    fn push_symbol(&mut self, symbol: Complex, audio: &mut Vec<f64>) {
        for i in 0..self.core.samples_per_symbol() {
            let impulse = if i == 0 { symbol } else { ZERO };
            let shaped = self.filters.tx.update_complex(impulse);
            audio.push(self.core.tx_nco.mix_complex(shaped) * TX_GAIN);
        }
    }
}

impl Mode for Qam16 {
    fn properties(&self) -> Properties {
        Properties {
            name: "QAM16".into(),
            description: "16-point differential QAM".into(),
            tooltip: "Four bits per symbol, V.22bis-style constellation".into(),
        }
    }

    fn core(&self) -> &ModeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModeCore {
        &mut self.core
    }

    fn configure(&mut self, frequency: f64, symbol_rate: f64) -> ModemResult<()> {
        let mut core = self.core.clone();
        core.configure(frequency, symbol_rate)?;
        let filters = SymbolFilters::new(core.samples_per_symbol(), core.config().rolloff)?;
        self.core = core;
        self.filters = filters;
        log::info!("qam16: reconfigured to {frequency} Hz, {symbol_rate} baud");
        Ok(())
    }

    fn receive(&mut self, samples: &[f64]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for &v in samples {
            let baseband = self.core.rx_nco.mix_real(v);
            let matched = self.filters.rx.update_complex(baseband) * self.filters.rx_gain;
            let Some(symbol) = self.filters.timing.update(matched) else {
                continue;
            };
            if symbol.norm_sqr() < SYMBOL_SQUELCH {
                continue;
            }
            if let Some(b) = self.demodulator.demodulate_symbol(symbol) {
                bytes.push(b);
            }
        }
        bytes
    }

    fn transmit(&mut self) -> Option<Vec<f64>> {
        let data = self.core.get_transmit_data(TX_CHUNK)?;
        let sps = self.core.samples_per_symbol();
        let symbols = self.modulator.modulate(&data);
        let mut audio = Vec::with_capacity((symbols.len() + GUARD_SYMBOLS) * sps);
        for symbol in symbols {
            self.push_symbol(symbol, &mut audio);
        }
        for _ in 0..GUARD_SYMBOLS {
            self.push_symbol(ZERO, &mut audio);
        }
        Some(audio)
    }
}
