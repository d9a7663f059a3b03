use thiserror::Error;

/// Errors raised while building or querying tables, distributions and reactions.
#[derive(Debug, Error)]
pub enum TableError {
    /// Invalid input at build time. Never recovered from.
    #[error("invalid table construction: {0}")]
    Construction(String),

    #[error("value {value} is outside of the supported range [{lower}, {upper}]")]
    OutOfRange { value: f64, lower: f64, upper: f64 },

    /// A one-dimensional distribution with no probability or a non-monotonic CDF.
    #[error("degenerate distribution: {0}")]
    DegenerateDistribution(String),

    #[error("numerical inversion did not converge after {iterations} iterations")]
    NoConvergence { iterations: usize },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl TableError {
    pub(crate) fn out_of_range(value: f64, lower: f64, upper: f64) -> Self {
        TableError::OutOfRange {
            value,
            lower,
            upper,
        }
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self, TableError::OutOfRange { .. })
    }

    pub fn is_construction(&self) -> bool {
        matches!(self, TableError::Construction(_))
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, TableError::DegenerateDistribution(_))
    }
}

pub type Result<T> = std::result::Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = TableError::out_of_range(25.0, 1e-5, 20.0);
        assert!(err.is_out_of_range());
        assert!(err.to_string().contains("25"));
        assert!(err.to_string().contains("20"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<Vec<f64>, _> = serde_json::from_str("[1.0,");
        let err: TableError = parse.unwrap_err().into();
        assert!(matches!(err, TableError::Serialization(_)));
    }
}
