//! FIR filter design and execution
//!
//! Taps are windowed-sinc: `response(i − (size−1)/2) · window[i]`, so every
//! design is symmetric about its center tap. Responses with a DC passband
//! are normalized to unity sum; boxcar keeps raw window weights and the
//! highpass/bandpass designs are left as computed.
//!
//! `update` writes the new sample into a ring buffer and convolves over a
//! full pass, O(size) per sample.

use std::f64::consts::PI;

use super::complex::Complex;
use super::window::Window;
use crate::domain::{below_nyquist, check_frequency, is_positive, ModemError, ModemResult};

/// How close to zero the tap offset must be to take the analytic center value
const CENTER_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Normalize {
    UnitySum,
    None,
}

/// Evaluate `response` at each tap offset, taper by `window`, and optionally
/// scale to unity sum.
fn gen_coefficients(
    size: usize,
    window: Window,
    normalize: Normalize,
    response: impl Fn(f64) -> f64,
) -> ModemResult<Vec<f64>> {
    if size == 0 {
        return Err(ModemError::InvalidFilterSize(size));
    }
    let taper = window.generate(size);
    let center = (size - 1) as f64 * 0.5;
    let mut coefficients: Vec<f64> = taper
        .iter()
        .enumerate()
        .map(|(i, w)| response(i as f64 - center) * w)
        .collect();

    if normalize == Normalize::UnitySum {
        let sum: f64 = coefficients.iter().sum();
        if sum.abs() > f64::EPSILON {
            for c in &mut coefficients {
                *c /= sum;
            }
        }
    }
    Ok(coefficients)
}

fn is_center(n: f64) -> bool {
    n.abs() < CENTER_EPSILON
}

/// Validate a band's edges and return their normalized angular frequencies
fn band_edges(lo: f64, hi: f64, sample_rate: f64) -> ModemResult<(f64, f64)> {
    check_frequency(lo, sample_rate)?;
    check_frequency(hi, sample_rate)?;
    if lo >= hi {
        return Err(ModemError::Config(format!(
            "band edges must be increasing, got {lo} Hz .. {hi} Hz"
        )));
    }
    Ok((2.0 * PI * lo / sample_rate, 2.0 * PI * hi / sample_rate))
}

/// FIR filter over a circular delay line
#[derive(Debug, Clone)]
pub struct Fir {
    coefficients: Vec<f64>,
    delay_re: Vec<f64>,
    delay_im: Vec<f64>,
    write_pointer: usize,
}

impl Fir {
    /// Create a filter from precomputed taps
    pub fn new(coefficients: Vec<f64>) -> ModemResult<Self> {
        let size = coefficients.len();
        if size == 0 {
            return Err(ModemError::InvalidFilterSize(size));
        }
        Ok(Self {
            coefficients,
            delay_re: vec![0.0; size],
            delay_im: vec![0.0; size],
            write_pointer: 0,
        })
    }

    /// Unity-gain moving average
    pub fn average(size: usize, window: Window) -> ModemResult<Self> {
        let omega = 1.0 / size.max(1) as f64;
        Self::new(gen_coefficients(size, window, Normalize::UnitySum, |_| omega)?)
    }

    /// Windowed running sum, unnormalized
    pub fn boxcar(size: usize, window: Window) -> ModemResult<Self> {
        Self::new(gen_coefficients(size, window, Normalize::None, |_| 1.0)?)
    }

    /// Windowed-sinc lowpass, unity gain at DC
    pub fn lowpass(size: usize, cutoff: f64, sample_rate: f64, window: Window) -> ModemResult<Self> {
        check_frequency(cutoff, sample_rate)?;
        let omega = 2.0 * PI * cutoff / sample_rate;
        Self::new(gen_coefficients(size, window, Normalize::UnitySum, |n| {
            if is_center(n) {
                omega / PI
            } else {
                (omega * n).sin() / (PI * n)
            }
        })?)
    }

    /// Spectral inversion of the lowpass sinc
    pub fn highpass(size: usize, cutoff: f64, sample_rate: f64, window: Window) -> ModemResult<Self> {
        check_frequency(cutoff, sample_rate)?;
        let omega = 2.0 * PI * cutoff / sample_rate;
        Self::new(gen_coefficients(size, window, Normalize::None, |n| {
            if is_center(n) {
                1.0 - omega / PI
            } else {
                -(omega * n).sin() / (PI * n)
            }
        })?)
    }

    /// Passes `lo_cutoff..hi_cutoff`: difference of two lowpass sincs
    pub fn bandpass(
        size: usize,
        lo_cutoff: f64,
        hi_cutoff: f64,
        sample_rate: f64,
        window: Window,
    ) -> ModemResult<Self> {
        let (omega_lo, omega_hi) = band_edges(lo_cutoff, hi_cutoff, sample_rate)?;
        Self::new(gen_coefficients(size, window, Normalize::None, |n| {
            if is_center(n) {
                (omega_hi - omega_lo) / PI
            } else {
                ((omega_hi * n).sin() - (omega_lo * n).sin()) / (PI * n)
            }
        })?)
    }

    /// Complement of `bandpass`
    pub fn bandreject(
        size: usize,
        lo_cutoff: f64,
        hi_cutoff: f64,
        sample_rate: f64,
        window: Window,
    ) -> ModemResult<Self> {
        let (omega_lo, omega_hi) = band_edges(lo_cutoff, hi_cutoff, sample_rate)?;
        Self::new(gen_coefficients(size, window, Normalize::UnitySum, |n| {
            if is_center(n) {
                1.0 - (omega_hi - omega_lo) / PI
            } else {
                ((omega_lo * n).sin() - (omega_hi * n).sin()) / (PI * n)
            }
        })?)
    }

    /// Raised-cosine pulse shaping filter. `T = sample_rate / symbol_rate`
    /// samples per symbol; at `|rolloff·n/T| = 0.5` the `0/0` term takes its
    /// limit `π/4`.
    pub fn raised_cosine(
        size: usize,
        rolloff: f64,
        symbol_rate: f64,
        sample_rate: f64,
        window: Window,
    ) -> ModemResult<Self> {
        if !below_nyquist(symbol_rate, sample_rate) {
            return Err(ModemError::InvalidSymbolRate {
                symbol_rate,
                sample_rate,
            });
        }
        let t = sample_rate / symbol_rate;
        let a = rolloff;
        Self::new(gen_coefficients(size, window, Normalize::UnitySum, |n| {
            if is_center(n) {
                return 1.0;
            }
            let nt = n / t;
            let ant = a * nt;
            let sinc = (PI * nt).sin() / (PI * nt);
            if ((ant.abs()) - 0.5).abs() < CENTER_EPSILON {
                sinc * PI / 4.0
            } else {
                sinc * (PI * ant).cos() / (1.0 - 4.0 * ant * ant)
            }
        })?)
    }

    /// Raised-cosine envelope exactly `size` taps long: a unit flat top
    /// with cosine edges over a `rolloff` fraction of the span. `rolloff = 1`
    /// is the Hann window. Used one pulse per symbol, it cannot overlap the
    /// next symbol.
    pub fn cosine_pulse(size: usize, rolloff: f64) -> ModemResult<Self> {
        if !is_positive(rolloff) || rolloff > 1.0 {
            return Err(ModemError::Config(format!(
                "pulse rolloff must be within (0, 1], got {rolloff}"
            )));
        }
        let last = size.saturating_sub(1) as f64;
        let edge = rolloff * last * 0.5;
        Self::new(gen_coefficients(size, Window::Rectangle, Normalize::None, |n| {
            let x = last * 0.5 - n.abs();
            if x < edge {
                0.5 - 0.5 * (PI * x / edge).cos()
            } else {
                1.0
            }
        })?)
    }

    /// Matched filter for these taps: time-reversed, scaled to unity sum,
    /// with an empty delay line
    pub fn matched(&self) -> ModemResult<Self> {
        let sum: f64 = self.coefficients.iter().sum();
        if sum.abs() <= f64::EPSILON {
            return Err(ModemError::Config("matched filter of a zero-sum pulse".to_string()));
        }
        Self::new(self.coefficients.iter().rev().map(|c| c / sum).collect())
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Filter one real sample
    pub fn update(&mut self, x: f64) -> f64 {
        self.delay_re[self.write_pointer] = x;
        self.write_pointer = (self.write_pointer + 1) % self.coefficients.len();
        convolve(&self.coefficients, &self.delay_re, self.write_pointer)
    }

    /// Filter one complex sample
    pub fn update_complex(&mut self, x: Complex) -> Complex {
        self.delay_re[self.write_pointer] = x.re;
        self.delay_im[self.write_pointer] = x.im;
        self.write_pointer = (self.write_pointer + 1) % self.coefficients.len();
        Complex::new(
            convolve(&self.coefficients, &self.delay_re, self.write_pointer),
            convolve(&self.coefficients, &self.delay_im, self.write_pointer),
        )
    }

    /// Zero the delay line
    pub fn reset(&mut self) {
        self.delay_re.fill(0.0);
        self.delay_im.fill(0.0);
        self.write_pointer = 0;
    }
}

/// `Σ c[i] · ring[(start + i) mod len]`: the oldest sample sits at `start`.
#[inline]
fn convolve(coefficients: &[f64], ring: &[f64], start: usize) -> f64 {
    let (newer, older) = ring.split_at(start);
    older
        .iter()
        .chain(newer.iter())
        .zip(coefficients)
        .map(|(x, c)| x * c)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 8000.0;

    /// Steady-state peak amplitude of a sine through the filter
    fn tone_amplitude(filter: &mut Fir, freq: f64) -> f64 {
        let mut peak = 0.0f64;
        for i in 0..4000 {
            let x = (2.0 * PI * freq * i as f64 / FS).sin();
            let y = filter.update(x);
            if i > 1000 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    fn is_symmetric(taps: &[f64]) -> bool {
        let n = taps.len();
        (0..n).all(|i| (taps[i] - taps[n - 1 - i]).abs() < 1e-12)
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            Fir::average(0, Window::Hann),
            Err(ModemError::InvalidFilterSize(0))
        ));
        assert!(Fir::new(Vec::new()).is_err());
    }

    #[test]
    fn cutoff_at_nyquist_is_rejected() {
        assert!(Fir::lowpass(31, 4000.0, FS, Window::Hann).is_err());
        assert!(Fir::bandpass(31, 1200.0, 800.0, FS, Window::Hann).is_err());
    }

    #[test]
    fn designs_are_symmetric() {
        let designs = [
            Fir::lowpass(31, 500.0, FS, Window::Hamming).unwrap(),
            Fir::highpass(33, 500.0, FS, Window::Blackman).unwrap(),
            Fir::bandpass(41, 800.0, 1600.0, FS, Window::Hann).unwrap(),
            Fir::bandreject(41, 800.0, 1600.0, FS, Window::Hann).unwrap(),
            Fir::raised_cosine(53, 0.35, 600.0, FS, Window::Hann).unwrap(),
        ];
        for filter in &designs {
            assert!(is_symmetric(filter.coefficients()));
        }
    }

    #[test]
    fn average_dc_gain_is_unity() {
        let mut filter = Fir::average(13, Window::Rectangle).unwrap();
        let sum: f64 = filter.coefficients().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        let mut y = 0.0;
        for _ in 0..13 {
            y = filter.update(2.0);
        }
        assert!((y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn boxcar_is_a_running_sum() {
        let mut filter = Fir::boxcar(8, Window::Rectangle).unwrap();
        let mut y = 0.0;
        for _ in 0..8 {
            y = filter.update(1.0);
        }
        assert!((y - 8.0).abs() < 1e-12);
    }

    #[test]
    fn lowpass_attenuates_ten_times_cutoff_by_20_db() {
        let mut filter = Fir::lowpass(65, 200.0, FS, Window::Hann).unwrap();
        let amplitude = tone_amplitude(&mut filter, 2000.0);
        assert!(amplitude < 0.1, "amplitude {amplitude}");
        let mut dc = Fir::lowpass(65, 200.0, FS, Window::Hann).unwrap();
        let mut y = 0.0;
        for _ in 0..65 {
            y = dc.update(1.0);
        }
        assert!((y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn highpass_rejects_low_tone() {
        let mut filter = Fir::highpass(65, 1000.0, FS, Window::Blackman).unwrap();
        assert!(tone_amplitude(&mut filter, 100.0) < 0.1);
        let mut filter = Fir::highpass(65, 1000.0, FS, Window::Blackman).unwrap();
        assert!(tone_amplitude(&mut filter, 3000.0) > 0.8);
    }

    #[test]
    fn bandpass_and_bandreject_are_complementary() {
        let mut pass = Fir::bandpass(101, 1000.0, 2000.0, FS, Window::Hann).unwrap();
        assert!(tone_amplitude(&mut pass, 1500.0) > 0.8);
        let mut pass = Fir::bandpass(101, 1000.0, 2000.0, FS, Window::Hann).unwrap();
        assert!(tone_amplitude(&mut pass, 200.0) < 0.1);

        let mut reject = Fir::bandreject(101, 1000.0, 2000.0, FS, Window::Hann).unwrap();
        assert!(tone_amplitude(&mut reject, 1500.0) < 0.1);
        let mut reject = Fir::bandreject(101, 1000.0, 2000.0, FS, Window::Hann).unwrap();
        assert!(tone_amplitude(&mut reject, 200.0) > 0.8);
    }

    #[test]
    fn cosine_pulse_with_full_rolloff_is_hann() {
        let pulse = Fir::cosine_pulse(13, 1.0).unwrap();
        let hann = Window::Hann.generate(13);
        for (a, b) in pulse.coefficients().iter().zip(&hann) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn cosine_pulse_has_flat_top_and_zero_ends() {
        let pulse = Fir::cosine_pulse(13, 0.35).unwrap();
        let taps = pulse.coefficients();
        assert!(is_symmetric(taps));
        assert_eq!(taps[0], 0.0);
        assert_eq!(taps[12], 0.0);
        assert!(taps[3..10].iter().all(|&c| c == 1.0));
        assert!(taps[1] > 0.0 && taps[1] < 1.0);
        assert!(Fir::cosine_pulse(13, 0.0).is_err());
        assert!(Fir::cosine_pulse(13, 1.5).is_err());
        assert!(Fir::cosine_pulse(13, f64::NAN).is_err());
    }

    #[test]
    fn matched_filter_peaks_at_pulse_energy() {
        let mut tx = Fir::cosine_pulse(16, 0.5).unwrap();
        let mut rx = tx.matched().unwrap();
        let sum: f64 = rx.coefficients().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        let energy: f64 = tx.coefficients().iter().map(|c| c * c).sum();
        let total: f64 = tx.coefficients().iter().sum();
        let mut outputs = Vec::new();
        for i in 0..48 {
            let shaped = tx.update(if i == 0 { 1.0 } else { 0.0 });
            outputs.push(rx.update(shaped));
        }
        let (argmax, &peak) = outputs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(argmax, 15);
        assert!((peak - energy / total).abs() < 1e-12);
        // Nothing left once both pulses have passed
        assert!(outputs[31..].iter().all(|v| v.abs() < 1e-15));
    }

    #[test]
    fn raised_cosine_rejects_nan_symbol_rate() {
        assert!(matches!(
            Fir::raised_cosine(33, 0.35, f64::NAN, FS, Window::Hann),
            Err(ModemError::InvalidSymbolRate { .. })
        ));
        assert!(Fir::raised_cosine(33, 0.35, 4000.0, FS, Window::Hann).is_err());
    }

    #[test]
    fn raised_cosine_singularity_is_finite() {
        // T = 8000/1000 = 8 samples, rolloff 0.5: a·n/T = 0.5 at n = ±8
        let filter = Fir::raised_cosine(33, 0.5, 1000.0, FS, Window::Rectangle).unwrap();
        let taps = filter.coefficients();
        assert!(taps.iter().all(|c| c.is_finite()));
        let sum: f64 = taps.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        // Peak at the center tap
        let center = taps[16];
        assert!(taps.iter().all(|&c| c <= center));
    }

    #[test]
    fn update_matches_direct_convolution() {
        let taps = vec![0.1, 0.2, 0.3, 0.4];
        let mut filter = Fir::new(taps.clone()).unwrap();
        let input: Vec<f64> = (0..20).map(|i| (i as f64 * 0.37).sin()).collect();
        for n in 0..input.len() {
            let y = filter.update(input[n]);
            // taps[i] weights the sample that is (len - 1 - i) steps old
            let expected: f64 = (0..taps.len())
                .filter(|&i| n + i + 1 >= taps.len())
                .map(|i| taps[i] * input[n + i + 1 - taps.len()])
                .sum();
            assert!((y - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn complex_update_filters_both_rails() {
        let mut filter = Fir::lowpass(31, 500.0, FS, Window::Hann).unwrap();
        let mut last = Complex::new(0.0, 0.0);
        for _ in 0..31 {
            last = filter.update_complex(Complex::new(1.0, -1.0));
        }
        assert!((last.re - 1.0).abs() < 1e-9);
        assert!((last.im + 1.0).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_state() {
        let mut filter = Fir::lowpass(31, 500.0, FS, Window::Hann).unwrap();
        for _ in 0..100 {
            filter.update(1.0);
        }
        filter.reset();
        assert_eq!(filter.update(0.0), 0.0);
    }
}
