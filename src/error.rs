use thiserror::Error;

use crate::compat::ChartKind;
use crate::dataset::{Dimension, Metric};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("{metric} cannot be broken down by {dimension}: {reason}")]
    UnsupportedCombination {
        metric: Metric,
        dimension: Dimension,
        reason: &'static str,
    },

    #[error("{metric} is not available on the {chart} chart")]
    UnsupportedChart { metric: Metric, chart: ChartKind },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Share transform needs a table grouped by year")]
    InvalidShareInput,

    #[error("Invalid extraction input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashboardError {
    /// True for errors the dashboard shows in place of a chart.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            DashboardError::UnsupportedCombination { .. } | DashboardError::UnsupportedChart { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
