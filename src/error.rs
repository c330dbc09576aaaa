use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Domain violations raised by the scalar kernels
// ---------------------------------------------------------------------------

/// Why a single input value cannot feed a formula.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DomainViolation {
    #[error("power must be positive for a logarithm")]
    NonPositivePower,
    #[error("division by zero")]
    ZeroDenominator,
    #[error("value is not finite")]
    NonFinite,
    #[error("uncertainty must be non-negative")]
    NegativeUncertainty,
}

// ---------------------------------------------------------------------------
// AnalysisError – everything a run can fail with
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot read workbook {}: {detail}", path.display())]
    FileAccess { path: PathBuf, detail: String },

    #[error("unsupported workbook extension: .{0}")]
    UnsupportedFormat(String),

    #[error("sheet {sheet} not found in workbook")]
    SheetMissing { sheet: String },

    #[error("sheet {sheet}: missing column '{column}'")]
    MissingColumn { sheet: String, column: String },

    #[error("sheet {sheet}, column '{column}', row {row}: expected a number, found {found}")]
    InvalidCell {
        sheet: String,
        column: String,
        row: usize,
        found: String,
    },

    #[error("channel {channel}: {what} has {actual} values, expected {expected}")]
    ShapeMismatch {
        channel: String,
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("channel {channel}, point {index}: value {value}: {reason}")]
    Domain {
        channel: String,
        index: usize,
        value: f64,
        reason: DomainViolation,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to render plot: {0}")]
    Plot(String),

    #[error("failed to export series: {0}")]
    Export(String),
}

impl AnalysisError {
    /// Process exit status reported for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            AnalysisError::FileAccess { .. } | AnalysisError::UnsupportedFormat(_) => 2,
            AnalysisError::SheetMissing { .. } => 3,
            AnalysisError::MissingColumn { .. }
            | AnalysisError::InvalidCell { .. }
            | AnalysisError::ShapeMismatch { .. } => 4,
            AnalysisError::Domain { .. } => 5,
            AnalysisError::Config(_) | AnalysisError::Plot(_) | AnalysisError::Export(_) => 1,
        }
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for AnalysisError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        AnalysisError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for AnalysisError {
    fn from(value: image::ImageError) -> Self {
        AnalysisError::Plot(value.to_string())
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(value: csv::Error) -> Self {
        AnalysisError::Export(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds_map_to_distinct_exit_codes() {
        let access = AnalysisError::FileAccess {
            path: PathBuf::from("x.xlsx"),
            detail: "not found".into(),
        };
        let shape = AnalysisError::ShapeMismatch {
            channel: "AT1".into(),
            what: "detector series".into(),
            expected: 11,
            actual: 10,
        };
        let domain = AnalysisError::Domain {
            channel: "AT1".into(),
            index: 3,
            value: 0.0,
            reason: DomainViolation::NonPositivePower,
        };
        let missing = AnalysisError::SheetMissing { sheet: "AT3".into() };

        let codes = [
            access.exit_code(),
            missing.exit_code(),
            shape.exit_code(),
            domain.exit_code(),
        ];
        assert_eq!(codes, [2, 3, 4, 5]);
    }

    #[test]
    fn domain_message_names_channel_and_value() {
        let err = AnalysisError::Domain {
            channel: "AT2".into(),
            index: 4,
            value: -1.5,
            reason: DomainViolation::NonPositivePower,
        };
        let msg = err.to_string();
        assert!(msg.contains("AT2"));
        assert!(msg.contains("-1.5"));
    }
}
