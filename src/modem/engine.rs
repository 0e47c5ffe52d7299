//! Modem engine
//!
//! Owns the selected mode and routes audio, spectra and text to it.
//! Received audio also drives the carrier tracker and, when AFC is on,
//! an internal spectrum that feeds frequency correction.

use crate::domain::{ModeKind, ModemConfig, ModemResult, ModemStatus, Properties, BINS};
use crate::dsp::FftProcessor;

use super::mode::Mode;
use super::qam16::Qam16;

fn build_mode(config: &ModemConfig) -> ModemResult<Box<dyn Mode>> {
    match config.mode {
        ModeKind::Qam16 => Ok(Box::new(Qam16::new(config)?)),
    }
}

pub struct Modem {
    mode: Box<dyn Mode>,
    kind: ModeKind,
    spectrum: FftProcessor,
    /// Audio waiting to fill the next spectrum frame
    spectrum_input: Vec<f64>,
    /// Decoded bytes not yet collected by `receive_text`
    received: Vec<u8>,
}

impl Modem {
    pub fn new(config: ModemConfig) -> ModemResult<Self> {
        config.validate()?;
        let mode = build_mode(&config)?;
        log::info!(
            "modem: {:?} at {} Hz, {} Hz sample rate",
            config.mode,
            config.frequency,
            config.sample_rate
        );
        Ok(Self {
            mode,
            kind: config.mode,
            spectrum: FftProcessor::new(BINS),
            spectrum_input: Vec::new(),
            received: Vec::new(),
        })
    }

    pub fn kind(&self) -> ModeKind {
        self.kind
    }

    pub fn config(&self) -> &ModemConfig {
        self.mode.core().config()
    }

    pub fn properties(&self) -> Properties {
        self.mode.properties()
    }

    pub fn configure(&mut self, frequency: f64, symbol_rate: f64) -> ModemResult<()> {
        self.mode.configure(frequency, symbol_rate)
    }

    pub fn set_frequency(&mut self, frequency: f64) -> ModemResult<()> {
        self.mode.set_frequency(frequency)
    }

    pub fn frequency(&self) -> f64 {
        self.mode.frequency()
    }

    pub fn set_afc(&mut self, enabled: bool) {
        self.mode.core_mut().afc.set_enabled(enabled);
        if !enabled {
            self.spectrum_input.clear();
        }
    }

    pub fn send_text(&mut self, text: &str) {
        self.mode.send_text(text);
    }

    pub fn send_bytes(&mut self, bytes: &[u8]) {
        self.mode.send_bytes(bytes);
    }

    /// Next block of transmit audio; `None` means go idle
    pub fn transmit_audio(&mut self) -> Option<Vec<f64>> {
        self.mode.transmit()
    }

    /// Drain the whole transmit queue into one buffer
    pub fn transmit_all(&mut self) -> Vec<f64> {
        let mut audio = Vec::new();
        while let Some(block) = self.mode.transmit() {
            audio.extend(block);
        }
        audio
    }

    /// Demodulate a buffer of received audio. Returns the bytes completed
    /// by this buffer; they are also kept for `receive_text`.
    pub fn receive_audio(&mut self, samples: &[f64]) -> Vec<u8> {
        self.mode.core_mut().track_carrier(samples);
        if self.mode.core().afc.enabled() {
            self.spectrum_input.extend_from_slice(samples);
            let frame = self.spectrum.fft_size();
            while self.spectrum_input.len() >= frame {
                let magnitudes = self.spectrum.compute(&self.spectrum_input[..frame]);
                self.spectrum_input.drain(..frame);
                self.mode.receive_spectrum(&magnitudes);
            }
        }
        let bytes = self.mode.receive(samples);
        self.received.extend_from_slice(&bytes);
        bytes
    }

    /// Externally computed magnitude spectrum for AFC. Returns whether the
    /// tuned frequency moved.
    pub fn receive_spectrum(&mut self, spectrum: &[f64]) -> bool {
        self.mode.receive_spectrum(spectrum)
    }

    /// Decoded text so far, invalid UTF-8 replaced
    pub fn receive_text(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.received).into_owned();
        self.received.clear();
        text
    }

    pub fn status(&self) -> ModemStatus {
        let core = self.mode.core();
        ModemStatus {
            mode: self.mode.properties().name,
            frequency_hz: core.frequency(),
            symbol_rate: core.symbol_rate(),
            afc_enabled: core.afc.enabled(),
            carrier_hz: core.carrier_hz(),
            tx_pending: core.pending(),
        }
    }
}
