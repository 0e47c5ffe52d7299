//! Spectral transform port

use crate::dsp::complex::Complex;

/// Forward/inverse transform over a fixed block size.
///
/// Neither direction normalizes: `inverse(scale_transform(forward(x)))`
/// reproduces `x`.
pub trait Transform {
    /// Block size `N`
    fn size(&self) -> usize;

    /// Real input to `N` complex bins. Short input is zero-padded, long
    /// input truncated.
    fn forward(&mut self, input: &[f64]) -> Vec<Complex>;

    /// `N` complex bins back to `N` real samples (real part only)
    fn inverse(&mut self, input: &[Complex]) -> Vec<f64>;

    /// Apply the `1/N` round-trip scale in place
    fn scale_transform(&self, bins: &mut [Complex]) {
        let scale = 1.0 / self.size() as f64;
        bins.iter_mut().for_each(|b| *b *= scale);
    }
}
