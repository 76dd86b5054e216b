use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::{Dimension, Metric, DIMENSIONS, METRICS};
use crate::error::{DashboardError, Result};
use crate::labels;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Bar,
    Line,
    Share,
}

pub const CHART_KINDS: &[ChartKind] = &[ChartKind::Bar, ChartKind::Line, ChartKind::Share];

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChartKind::Bar => write!(f, "Bar"),
            ChartKind::Line => write!(f, "Line"),
            ChartKind::Share => write!(f, "Share"),
        }
    }
}

/// Behaviors that differed between deployments of the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantFlags {
    /// Owner counts may only be grouped or colored by race or W2 status.
    pub strict_owner_pairing: bool,
    /// Offer owner counts on the share chart.
    pub owner_share_chart: bool,
}

pub fn check_dimension(metric: Metric, dim: Dimension, flags: VariantFlags) -> Result<()> {
    let unsupported = |reason| DashboardError::UnsupportedCombination {
        metric,
        dimension: dim,
        reason,
    };

    if labels::column_for(dim, metric.table()).is_none() {
        return Err(unsupported("the owner table has no such column"));
    }
    if metric == Metric::OwnerCount
        && flags.strict_owner_pairing
        && !matches!(dim, Dimension::Race | Dimension::W2)
    {
        return Err(unsupported("owner counts pair only with race or W2 status"));
    }
    Ok(())
}

pub fn check_chart(metric: Metric, chart: ChartKind, flags: VariantFlags) -> Result<()> {
    let allowed = match chart {
        ChartKind::Bar | ChartKind::Line => true,
        ChartKind::Share => match metric {
            Metric::OwnerCount => flags.owner_share_chart,
            _ => metric.is_additive(),
        },
    };
    if allowed {
        Ok(())
    } else {
        Err(DashboardError::UnsupportedChart { metric, chart })
    }
}

pub fn metric_options(chart: ChartKind, flags: VariantFlags) -> Vec<Metric> {
    METRICS
        .iter()
        .copied()
        .filter(|m| check_chart(*m, chart, flags).is_ok())
        .collect()
}

pub fn dimension_options(metric: Metric, flags: VariantFlags) -> Vec<Dimension> {
    DIMENSIONS
        .iter()
        .copied()
        .filter(|d| check_dimension(metric, *d, flags).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_form_rejected_for_owner_counts() {
        let err = check_dimension(Metric::OwnerCount, Dimension::LegalForm, VariantFlags::default())
            .unwrap_err();
        assert!(err.is_unsupported());
        assert!(check_dimension(Metric::FirmCount, Dimension::LegalForm, VariantFlags::default()).is_ok());
    }

    #[test]
    fn test_owner_dimension_options() {
        let options = dimension_options(Metric::OwnerCount, VariantFlags::default());
        assert!(!options.contains(&Dimension::LegalForm));
        assert_eq!(options.len(), DIMENSIONS.len() - 1);
    }

    #[test]
    fn test_strict_owner_pairing() {
        let flags = VariantFlags {
            strict_owner_pairing: true,
            ..VariantFlags::default()
        };
        assert_eq!(
            dimension_options(Metric::OwnerCount, flags),
            vec![Dimension::Race, Dimension::W2]
        );
        // firm metrics are unaffected
        assert_eq!(dimension_options(Metric::Receipts, flags).len(), DIMENSIONS.len());
    }

    #[test]
    fn test_share_metrics() {
        let defaults = metric_options(ChartKind::Share, VariantFlags::default());
        assert_eq!(defaults, vec![Metric::FirmCount, Metric::Receipts]);

        let flags = VariantFlags {
            owner_share_chart: true,
            ..VariantFlags::default()
        };
        assert!(metric_options(ChartKind::Share, flags).contains(&Metric::OwnerCount));
        assert_eq!(metric_options(ChartKind::Bar, VariantFlags::default()).len(), 4);
    }
}
