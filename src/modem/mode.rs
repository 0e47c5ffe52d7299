//! Digital mode contract
//!
//! A `Mode` turns queued bytes into audio and audio back into bytes. The
//! state every mode shares (tuning, transmit queue, oscillators, AFC and
//! carrier tracker) lives in `ModeCore`; a concrete mode owns one and adds
//! its own filters and symbol mapping.

use crate::domain::{below_nyquist, check_frequency, ModemConfig, ModemError, ModemResult, Properties};
use crate::dsp::{CostasLoop, Iir, Nco};

use super::afc::Afc;

/// Shared per-mode state
#[derive(Debug, Clone)]
pub struct ModeCore {
    config: ModemConfig,
    samples_per_symbol: usize,
    tx_queue: Vec<u8>,
    cursor: usize,
    pub afc: Afc,
    pub tx_nco: Nco,
    pub rx_nco: Nco,
    pub carrier: CostasLoop,
    /// Smoothed carrier tracker frequency, for display
    carrier_estimate: Iir,
}

/// Corner of the carrier estimate smoother
const CARRIER_SMOOTHING_HZ: f64 = 5.0;

fn samples_per_symbol(sample_rate: f64, symbol_rate: f64) -> ModemResult<usize> {
    if !below_nyquist(symbol_rate, sample_rate) {
        return Err(ModemError::InvalidSymbolRate {
            symbol_rate,
            sample_rate,
        });
    }
    Ok((sample_rate / symbol_rate).floor() as usize)
}

impl ModeCore {
    pub fn new(config: &ModemConfig) -> ModemResult<Self> {
        config.validate()?;
        let fs = config.sample_rate;
        let mut carrier_estimate = Iir::low_pass(CARRIER_SMOOTHING_HZ, fs)?;
        carrier_estimate.reset(config.frequency);
        Ok(Self {
            samples_per_symbol: samples_per_symbol(fs, config.symbol_rate)?,
            tx_queue: Vec::new(),
            cursor: 0,
            afc: Afc::new(config.afc, fs),
            tx_nco: Nco::new(config.frequency, fs),
            rx_nco: Nco::new(config.frequency, fs),
            carrier: CostasLoop::with_bandwidth(config.frequency, fs, config.loop_bandwidth)?
                .with_arm_q(config.q)?,
            carrier_estimate,
            config: config.clone(),
        })
    }

    /// Apply a new frequency and symbol rate. Nothing changes on error.
    pub fn configure(&mut self, frequency: f64, symbol_rate: f64) -> ModemResult<()> {
        let sps = samples_per_symbol(self.config.sample_rate, symbol_rate)?;
        self.retune(frequency)?;
        self.config.symbol_rate = symbol_rate;
        self.samples_per_symbol = sps;
        Ok(())
    }

    /// Move the carrier without touching symbol timing
    pub fn retune(&mut self, frequency: f64) -> ModemResult<()> {
        check_frequency(frequency, self.config.sample_rate)?;
        self.carrier.set_frequency(frequency)?;
        self.tx_nco.set_frequency(frequency);
        self.rx_nco.set_frequency(frequency);
        self.carrier_estimate.reset(frequency);
        self.config.frequency = frequency;
        Ok(())
    }

    /// Configuration as last applied, including AFC retunes
    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    pub fn frequency(&self) -> f64 {
        self.config.frequency
    }

    pub fn symbol_rate(&self) -> f64 {
        self.config.symbol_rate
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    /// `floor(sample_rate / symbol_rate)`
    pub fn samples_per_symbol(&self) -> usize {
        self.samples_per_symbol
    }

    /// Append to the transmit queue; bytes already handed out stay consumed
    pub fn send_bytes(&mut self, bytes: &[u8]) {
        self.tx_queue.extend_from_slice(bytes);
    }

    pub fn send_text(&mut self, text: &str) {
        self.send_bytes(text.as_bytes());
    }

    /// Up to `amount` queued bytes from the cursor onward.
    ///
    /// Returns `None` once everything queued has been handed out, and
    /// clears the queue at that point.
    pub fn get_transmit_data(&mut self, amount: usize) -> Option<Vec<u8>> {
        if self.cursor >= self.tx_queue.len() {
            if !self.tx_queue.is_empty() {
                log::debug!("transmit queue drained after {} bytes", self.tx_queue.len());
            }
            self.tx_queue.clear();
            self.cursor = 0;
            return None;
        }
        let end = (self.cursor + amount).min(self.tx_queue.len());
        let chunk = self.tx_queue[self.cursor..end].to_vec();
        self.cursor = end;
        Some(chunk)
    }

    /// Bytes queued but not yet handed out
    pub fn pending(&self) -> usize {
        self.tx_queue.len() - self.cursor
    }

    /// Run the carrier tracker over a buffer of received audio
    pub fn track_carrier(&mut self, samples: &[f64]) {
        for &v in samples {
            self.carrier.update(v);
            self.carrier_estimate.update(self.carrier.frequency());
        }
    }

    /// Carrier tracker frequency in Hz, low-passed
    pub fn carrier_hz(&self) -> f64 {
        self.carrier_estimate.value()
    }

    /// Feed a magnitude spectrum to AFC; retunes when it asks for a move.
    /// Returns whether the frequency changed.
    pub fn apply_spectrum(&mut self, spectrum: &[f64]) -> bool {
        let Some(frequency) = self.afc.adjust(self.config.frequency, spectrum) else {
            return false;
        };
        match self.retune(frequency) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("afc: ignoring nudge: {e}");
                false
            }
        }
    }
}

/// A digital mode: configure, receive, transmit
pub trait Mode {
    fn properties(&self) -> Properties;

    fn core(&self) -> &ModeCore;

    fn core_mut(&mut self) -> &mut ModeCore;

    /// Retune and rebuild any rate-dependent filters
    fn configure(&mut self, frequency: f64, symbol_rate: f64) -> ModemResult<()>;

    /// Process received audio, returning any completed bytes
    fn receive(&mut self, samples: &[f64]) -> Vec<u8>;

    /// Next block of transmit audio, or `None` when there is nothing to send
    fn transmit(&mut self) -> Option<Vec<f64>>;

    fn send_text(&mut self, text: &str) {
        self.core_mut().send_text(text);
    }

    fn send_bytes(&mut self, bytes: &[u8]) {
        self.core_mut().send_bytes(bytes);
    }

    fn frequency(&self) -> f64 {
        self.core().frequency()
    }

    fn set_frequency(&mut self, frequency: f64) -> ModemResult<()> {
        let symbol_rate = self.core().symbol_rate();
        self.configure(frequency, symbol_rate)
    }

    /// Spectrum input for AFC
    fn receive_spectrum(&mut self, spectrum: &[f64]) -> bool {
        self.core_mut().apply_spectrum(spectrum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{bin_width, BINS};

    fn core() -> ModeCore {
        ModeCore::new(&ModemConfig::default()).unwrap()
    }

    #[test]
    fn transmit_data_is_chunked_then_exhausted() {
        let mut core = core();
        core.send_text("HELLO WORLD");
        assert_eq!(core.get_transmit_data(5).unwrap(), b"HELLO");
        assert_eq!(core.pending(), 6);
        assert_eq!(core.get_transmit_data(5).unwrap(), b" WORL");
        assert_eq!(core.get_transmit_data(5).unwrap(), b"D");
        assert_eq!(core.get_transmit_data(5), None);
        assert_eq!(core.pending(), 0);
    }

    #[test]
    fn queue_restarts_after_exhaustion() {
        let mut core = core();
        core.send_bytes(&[1, 2]);
        assert!(core.get_transmit_data(8).is_some());
        assert!(core.get_transmit_data(8).is_none());
        core.send_bytes(&[3]);
        assert_eq!(core.get_transmit_data(8).unwrap(), vec![3]);
    }

    #[test]
    fn empty_queue_is_idle_not_error() {
        let mut core = core();
        assert_eq!(core.get_transmit_data(30), None);
        assert_eq!(core.get_transmit_data(30), None);
    }

    #[test]
    fn bytes_appended_mid_transmit_are_kept() {
        let mut core = core();
        core.send_bytes(b"ab");
        assert_eq!(core.get_transmit_data(1).unwrap(), b"a");
        core.send_bytes(b"c");
        assert_eq!(core.get_transmit_data(10).unwrap(), b"bc");
    }

    #[test]
    fn samples_per_symbol_is_floored() {
        let core = core();
        assert_eq!(core.samples_per_symbol(), 13);
    }

    #[test]
    fn bad_configure_changes_nothing() {
        let mut core = core();
        assert!(core.configure(4500.0, 600.0).is_err());
        assert!(core.configure(1000.0, 0.0).is_err());
        assert_eq!(core.frequency(), 1200.0);
        assert_eq!(core.symbol_rate(), 600.0);
        core.configure(1000.0, 500.0).unwrap();
        assert_eq!(core.samples_per_symbol(), 16);
        assert_eq!(core.tx_nco.frequency(), 1000.0);
        assert_eq!(core.rx_nco.frequency(), 1000.0);
    }

    #[test]
    fn afc_retunes_both_oscillators() {
        let config = ModemConfig {
            afc: true,
            ..ModemConfig::default()
        };
        let mut core = ModeCore::new(&config).unwrap();
        let center = (core.frequency() / bin_width(8000.0)).round() as usize;
        let mut spectrum = vec![0.0; BINS];
        spectrum[center + 4] = 1.0;
        assert!(core.apply_spectrum(&spectrum));
        assert!(core.frequency() > 1200.0);
        assert_eq!(core.tx_nco.frequency(), core.frequency());
        assert_eq!(core.rx_nco.frequency(), core.frequency());
        assert_eq!(core.carrier.center_frequency().round(), core.frequency().round());
        assert_eq!(core.carrier_hz(), core.frequency());
    }

    #[test]
    fn carrier_estimate_holds_center_on_silence() {
        let mut core = core();
        assert_eq!(core.carrier_hz(), 1200.0);
        core.track_carrier(&vec![0.0; 4000]);
        assert!((core.carrier_hz() - 1200.0).abs() < 1e-9);
        core.retune(1500.0).unwrap();
        assert_eq!(core.carrier_hz(), 1500.0);
    }

    #[test]
    fn nan_symbol_rate_is_rejected() {
        let mut core = core();
        assert!(matches!(
            core.configure(1200.0, f64::NAN),
            Err(ModemError::InvalidSymbolRate { .. })
        ));
        assert_eq!(core.samples_per_symbol(), 13);
    }
}
