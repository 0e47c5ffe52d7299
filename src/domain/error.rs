//! Domain error types

use std::cmp::Ordering;

use thiserror::Error;

/// Errors that can occur while configuring the modem
///
/// Per-sample processing never fails; everything here is raised at setup
/// time, before the first sample is processed.
#[derive(Error, Debug)]
pub enum ModemError {
    #[error("Invalid frequency: {frequency} Hz must be above 0 and below half the sample rate {sample_rate} Hz")]
    InvalidFrequency { frequency: f64, sample_rate: f64 },

    #[error("Invalid filter Q: {0} (must be positive)")]
    InvalidQ(f64),

    #[error("Invalid filter size: {0}")]
    InvalidFilterSize(usize),

    #[error("Invalid symbol rate: {symbol_rate} baud at sample rate {sample_rate} Hz")]
    InvalidSymbolRate { symbol_rate: f64, sample_rate: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for modem operations
pub type ModemResult<T> = Result<T, ModemError>;

/// Reject frequencies that would put a filter or oscillator design at or
/// beyond Nyquist.
pub(crate) fn check_frequency(frequency: f64, sample_rate: f64) -> ModemResult<()> {
    if !below_nyquist(frequency, sample_rate) {
        return Err(ModemError::InvalidFrequency {
            frequency,
            sample_rate,
        });
    }
    Ok(())
}

/// Strictly greater than zero. NaN is unordered and fails.
pub(crate) fn is_positive(x: f64) -> bool {
    x.partial_cmp(&0.0) == Some(Ordering::Greater)
}

/// `0 < x < sample_rate / 2`, NaN failing both bounds
pub(crate) fn below_nyquist(x: f64, sample_rate: f64) -> bool {
    is_positive(x) && x.partial_cmp(&(sample_rate * 0.5)) == Some(Ordering::Less)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nyquist_is_rejected() {
        let err = check_frequency(4000.0, 8000.0).unwrap_err();
        assert!(matches!(err, ModemError::InvalidFrequency { .. }));
        assert!(err.to_string().contains("4000"));
    }

    #[test]
    fn nan_frequency_is_rejected() {
        assert!(check_frequency(f64::NAN, 8000.0).is_err());
        assert!(check_frequency(0.0, 8000.0).is_err());
        assert!(check_frequency(3999.0, 8000.0).is_ok());
    }

    #[test]
    fn positivity_rejects_nan_and_zero() {
        assert!(is_positive(1e-12));
        assert!(!is_positive(0.0));
        assert!(!is_positive(-0.0));
        assert!(!is_positive(f64::NAN));
        assert!(is_positive(f64::INFINITY));
    }

    #[test]
    fn nyquist_bound_is_open() {
        assert!(below_nyquist(600.0, 8000.0));
        assert!(!below_nyquist(4000.0, 8000.0));
        assert!(!below_nyquist(600.0, f64::NAN));
        assert!(!below_nyquist(f64::INFINITY, 8000.0));
    }
}
