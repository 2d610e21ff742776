//! Error types for the analysis library

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Percentage undefined: {0} has a zero denominator")]
    UndefinedPercentage(&'static str),

    #[error("Invalid analysis window: end {end} is not after start {start}")]
    InvalidWindow { start: String, end: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Parse(err.to_string())
    }
}

/// `numerator / denominator * 100`, refusing zero or non-finite denominators
pub fn percentage(numerator: f64, denominator: f64, what: &'static str) -> Result<f64> {
    if !denominator.is_finite() || denominator.abs() < f64::EPSILON {
        return Err(AnalysisError::UndefinedPercentage(what));
    }
    let value = numerator / denominator * 100.0;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalysisError::UndefinedPercentage(what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_basic() {
        assert!((percentage(1.0, 4.0, "ratio").unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentage_zero_denominator() {
        let err = percentage(1.0, 0.0, "idle ratio").unwrap_err();
        assert!(matches!(err, AnalysisError::UndefinedPercentage("idle ratio")));
    }

    #[test]
    fn test_percentage_nan_denominator() {
        assert!(percentage(1.0, f64::NAN, "x").is_err());
    }
}
