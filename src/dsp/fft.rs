//! FFT processing for spectrum input to AFC

use std::sync::Arc;

use rustfft::{Fft, FftPlanner};

use super::complex::{Complex, ZERO};
use super::window::Window;
use crate::ports::Transform;

/// rustfft-backed real transform with cached forward and inverse plans
pub struct RealFft {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    size: usize,
}

impl RealFft {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
            size,
        }
    }
}

impl Transform for RealFft {
    fn size(&self) -> usize {
        self.size
    }

    fn forward(&mut self, input: &[f64]) -> Vec<Complex> {
        let mut buffer: Vec<Complex> = input
            .iter()
            .take(self.size)
            .map(|&v| Complex::new(v, 0.0))
            .collect();
        buffer.resize(self.size, ZERO);
        self.forward.process(&mut buffer);
        buffer
    }

    fn inverse(&mut self, input: &[Complex]) -> Vec<f64> {
        let mut buffer: Vec<Complex> = input.iter().take(self.size).copied().collect();
        buffer.resize(self.size, ZERO);
        self.inverse.process(&mut buffer);
        buffer.into_iter().map(|c| c.re).collect()
    }
}

/// Windowed magnitude spectrum of `bins` positive-frequency bins.
///
/// The transform is `2·bins` long, so bin `k` sits at `k·fs/(2·bins)` Hz.
pub struct FftProcessor {
    transform: RealFft,
    window: Vec<f64>,
    bins: usize,
}

impl FftProcessor {
    pub fn new(bins: usize) -> Self {
        let fft_size = bins * 2;
        Self {
            transform: RealFft::new(fft_size),
            window: Window::Hann.generate(fft_size),
            bins,
        }
    }

    /// Magnitude of each positive-frequency bin. Input shorter than the
    /// transform is zero-padded.
    pub fn compute(&mut self, samples: &[f64]) -> Vec<f64> {
        let windowed: Vec<f64> = samples
            .iter()
            .zip(&self.window)
            .map(|(&s, &w)| s * w)
            .collect();
        let spectrum = self.transform.forward(&windowed);
        spectrum[..self.bins].iter().map(|c| c.norm()).collect()
    }

    /// Samples consumed per spectrum
    pub fn fft_size(&self) -> usize {
        self.transform.size()
    }

    pub fn bins(&self) -> usize {
        self.bins
    }
}
