use thiserror::Error;

/// Errors raised by the rating, series and market engines.
///
/// All variants are local and synchronous: they are returned at the point of
/// the invalid call and leave any engine state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Invalid request data (series counts, K-factor values, game ordering)
    #[error("validation error: {0}")]
    Validation(String),
    /// No usable game records to seed a rating computation
    #[error("data error: {0}")]
    Data(String),
    /// Odds or probability outside the domain of a conversion
    #[error("conversion error: {0}")]
    Conversion(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

pub(crate) fn validate_probability(label: &str, prob: f64) -> EngineResult<()> {
    if !prob.is_finite() || !(0.0..=1.0).contains(&prob) {
        return Err(EngineError::Validation(format!(
            "{} must be between 0 and 1, got {}",
            label, prob
        )));
    }
    Ok(())
}
