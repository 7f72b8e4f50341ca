//! Error type shared by every public operation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeconvError>;

/// Precondition violations. Operations fail with one of these before any
/// transform work starts; there are no partial results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeconvError {
    /// Two shapes that must be compatible are not (kernel larger than the
    /// image, plans built for another shape, grids of different sizes).
    #[error("dimension mismatch in {context}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// A scalar or size parameter is outside its valid domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> DeconvError {
    DeconvError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

pub(crate) fn mismatch(
    context: &'static str,
    expected: (usize, usize),
    actual: (usize, usize),
) -> DeconvError {
    DeconvError::DimensionMismatch {
        context,
        expected,
        actual,
    }
}

/// Reject non-finite or non-positive scalars.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(name, format!("must be finite and > 0, got {value}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_descriptive() {
        let err = mismatch("frequency_convolve", (4, 4), (5, 3));
        assert_eq!(
            err.to_string(),
            "dimension mismatch in frequency_convolve: expected (4, 4), got (5, 3)"
        );

        let err = invalid("snr", "must be finite and > 0, got -1");
        assert_eq!(
            err.to_string(),
            "invalid parameter `snr`: must be finite and > 0, got -1"
        );
    }

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive("snr", 1.0).is_ok());
        assert!(ensure_positive("snr", 0.0).is_err());
        assert!(ensure_positive("snr", -2.0).is_err());
        assert!(ensure_positive("snr", f64::NAN).is_err());
        assert!(ensure_positive("snr", f64::INFINITY).is_err());
    }
}
