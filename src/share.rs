use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::compat::{self, ChartKind};
use crate::dataset::{Dimension, Metric};
use crate::error::{DashboardError, Result};
use crate::labels::ChartLabels;
use crate::pipeline::{AggregatedTable, AggregationRequest, IndustryFilter, Pipeline};

#[derive(Debug, Clone, PartialEq)]
pub struct ShareRow {
    pub year: i32,
    pub group: String,
    pub color: Option<String>,
    pub value: f64,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShareTable {
    pub metric: Metric,
    pub group: Dimension,
    pub color: Option<Dimension>,
    pub rows: Vec<ShareRow>,
    pub labels: ChartLabels,
}

impl ShareTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn total_share(&self, year: i32) -> f64 {
        self.rows
            .iter()
            .filter(|r| r.year == year)
            .map(|r| r.share)
            .sum()
    }

    pub fn share(&self, year: i32, group: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.year == year && r.group == group && r.color.is_none())
            .map(|r| r.share)
    }

    pub fn series(&self) -> Vec<(String, Vec<(f64, f64)>)> {
        let mut series: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
        for row in &self.rows {
            let name = match &row.color {
                Some(color) => format!("{} / {}", row.group, color),
                None => row.group.clone(),
            };
            series
                .entry(name)
                .or_default()
                .push((f64::from(row.year), row.share));
        }
        series.into_iter().collect()
    }
}

pub fn share_by_year(table: &AggregatedTable) -> Result<ShareTable> {
    if !table.by_year {
        return Err(DashboardError::InvalidShareInput);
    }

    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for row in &table.rows {
        let year = row.year.ok_or(DashboardError::InvalidShareInput)?;
        *totals.entry(year).or_default() += row.value;
    }

    let mut rows = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let year = row.year.ok_or(DashboardError::InvalidShareInput)?;
        let total = totals.get(&year).copied().unwrap_or_default();
        let share = if total == 0.0 {
            debug!(year, "zero total; shares set to 0");
            0.0
        } else {
            row.value / total * 100.0
        };
        rows.push(ShareRow {
            year,
            group: row.group.clone(),
            color: row.color.clone(),
            value: row.value,
            share,
        });
    }

    Ok(ShareTable {
        metric: table.metric,
        group: table.group,
        color: table.color,
        rows,
        labels: ChartLabels::shares(table.metric, table.group),
    })
}

impl<'a> Pipeline<'a> {
    pub fn shares(&self, metric: Metric, group: Dimension, industry: IndustryFilter) -> Result<ShareTable> {
        compat::check_chart(metric, ChartKind::Share, self.flags())?;
        let request = AggregationRequest::new(metric, group)
            .industry(industry)
            .by_year();
        let table = self.aggregate(&request)?;
        share_by_year(&table)
    }
}
