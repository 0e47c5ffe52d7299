//! Digital Signal Processing
//!
//! Oscillators, filters, carrier and timing recovery. Pure per-sample state
//! machines with no I/O dependencies.

pub mod biquad;
pub mod clock_recovery;
pub mod complex;
pub mod costas_loop;
pub mod fft;
pub mod fir;
pub mod iir;
pub mod nco;
pub mod window;

// Re-export commonly used items
pub use biquad::Biquad;
pub use clock_recovery::EarlyLate;
pub use complex::Complex;
pub use costas_loop::CostasLoop;
pub use fft::{FftProcessor, RealFft};
pub use fir::Fir;
pub use iir::Iir;
pub use nco::Nco;
pub use window::Window;
