// Error taxonomy for peak-window computation
use super::table::FieldRef;
use std::fmt;
use thiserror::Error;

/// Which configuration parameter a field reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Time,
    Group,
    Weight,
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRole::Time => write!(f, "time"),
            FieldRole::Group => write!(f, "grouping"),
            FieldRole::Weight => write!(f, "entity count"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{role} field {field} does not exist in the table")]
    MissingField { role: FieldRole, field: FieldRef },

    #[error("window width must be a positive number of minutes, got {0}")]
    InvalidWindowWidth(i64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("row {row}: time value {value:?} is not numeric")]
    NonNumericTime { row: usize, value: String },

    #[error("row {row}: entity count {value:?} is not numeric")]
    NonNumericWeight { row: usize, value: String },

    #[error("group {group} has no time values")]
    NoTimeValues { group: String },

    #[error("computation would produce {windows} windows, limit is {limit}")]
    WindowLimitExceeded { windows: u64, limit: u64 },

    #[error("time value {minute} is too large to fit a window")]
    TimeOutOfRange { minute: i64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Computation(#[from] ComputationError),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_error_displays_cause() {
        let err = AnalysisError::from(ConfigurationError::MissingField {
            role: FieldRole::Weight,
            field: FieldRef::from("riders"),
        });
        assert_eq!(
            err.to_string(),
            "entity count field 'riders' does not exist in the table"
        );

        let err = AnalysisError::from(ComputationError::TimeOutOfRange { minute: i64::MAX });
        assert_eq!(
            format!("{:#}", anyhow::Error::new(err)),
            format!("time value {} is too large to fit a window", i64::MAX)
        );
    }
}
