pub mod app;
pub mod compat;
pub mod config;
pub mod csv_reader;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod labels;
pub mod pipeline;
pub mod share;
pub mod ui;

pub use compat::{ChartKind, VariantFlags};
pub use config::DashboardConfig;
pub use dataset::{Dimension, FirmRecord, Metric, OwnerRecord, Tables};
pub use error::{DashboardError, Result};
pub use labels::ChartLabels;
pub use pipeline::{AggregatedTable, AggregationRequest, IndustryFilter, Pipeline, YearFilter};
pub use share::{share_by_year, ShareTable};
