//! Window functions for FIR design
//!
//! Each window produces an amplitude taper of the requested length,
//! symmetric about `(size - 1) / 2`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Window {
    Rectangle,
    Bartlett,
    /// The "exact" Blackman, alpha = 0.16
    Blackman,
    Cosine,
    Gauss,
    Hamming,
    #[default]
    Hann,
}

impl Window {
    /// Generate `size` taper values
    pub fn generate(self, size: usize) -> Vec<f64> {
        // A one-point window would divide by (size - 1) = 0
        if size < 2 {
            return vec![1.0; size];
        }
        let last = (size - 1) as f64;
        (0..size)
            .map(|i| {
                let x = i as f64;
                match self {
                    Window::Rectangle => 1.0,
                    Window::Bartlett => 2.0 / last * (last / 2.0 - (x - last / 2.0).abs()),
                    Window::Blackman => {
                        let alpha = 0.16;
                        let a0 = (1.0 - alpha) / 2.0;
                        let a1 = 0.5;
                        let a2 = alpha * 0.5;
                        a0 - a1 * (2.0 * PI * x / last).cos() + a2 * (4.0 * PI * x / last).cos()
                    }
                    Window::Cosine => (PI * x / last - PI / 2.0).cos(),
                    Window::Gauss => {
                        let alpha = 1.0;
                        let t = (x - last / 2.0) / (alpha * last / 2.0);
                        (-0.5 * t * t).exp()
                    }
                    Window::Hamming => 0.54 - 0.46 * (2.0 * PI * x / last).cos(),
                    Window::Hann => 0.5 - 0.5 * (2.0 * PI * x / last).cos(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Window; 7] = [
        Window::Rectangle,
        Window::Bartlett,
        Window::Blackman,
        Window::Cosine,
        Window::Gauss,
        Window::Hamming,
        Window::Hann,
    ];

    #[test]
    fn windows_are_symmetric_and_peak_in_the_middle() {
        for window in ALL {
            let w = window.generate(33);
            assert_eq!(w.len(), 33);
            for i in 0..33 {
                assert!(
                    (w[i] - w[32 - i]).abs() < 1e-12,
                    "{window:?} not symmetric at {i}"
                );
            }
            assert!((w[16] - 1.0).abs() < 1e-9, "{window:?} center = {}", w[16]);
        }
    }

    #[test]
    fn hann_and_bartlett_taper_to_zero() {
        let hann = Window::Hann.generate(16);
        assert!(hann[0].abs() < 1e-12);
        assert!(hann[15].abs() < 1e-12);
        let bartlett = Window::Bartlett.generate(16);
        assert!(bartlett[0].abs() < 1e-12);
    }

    #[test]
    fn hamming_endpoints() {
        let w = Window::Hamming.generate(21);
        assert!((w[0] - 0.08).abs() < 1e-12);
    }

    #[test]
    fn degenerate_sizes() {
        assert!(Window::Hann.generate(0).is_empty());
        assert_eq!(Window::Blackman.generate(1), vec![1.0]);
    }
}
