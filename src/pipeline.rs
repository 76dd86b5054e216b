use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::compat::{self, VariantFlags};
use crate::dataset::{DemographicRecord, Dimension, Metric, TableKind, Tables, ALL_SECTORS, DIMENSIONS};
use crate::error::{DashboardError, Result};
use crate::labels::{self, ChartLabels};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    All,
    Years(Vec<i32>),
}

impl YearFilter {
    pub fn contains(&self, year: i32) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Years(years) => years.contains(&year),
        }
    }
}

impl From<i32> for YearFilter {
    fn from(year: i32) -> Self {
        YearFilter::Years(vec![year])
    }
}

impl From<Vec<i32>> for YearFilter {
    fn from(years: Vec<i32>) -> Self {
        YearFilter::Years(years)
    }
}

impl From<Option<i32>> for YearFilter {
    fn from(year: Option<i32>) -> Self {
        year.map_or(YearFilter::All, YearFilter::from)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IndustryFilter {
    /// The pre-aggregated all-sectors rows.
    #[default]
    All,
    Named(String),
}

impl From<&str> for IndustryFilter {
    fn from(name: &str) -> Self {
        match name {
            "All" => IndustryFilter::All,
            other => IndustryFilter::Named(other.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Mean,
}

impl Aggregation {
    pub fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::AvgReceiptsPerFirm => Aggregation::Mean,
            _ => Aggregation::Sum,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRequest {
    pub metric: Metric,
    pub group: Dimension,
    pub color: Option<Dimension>,
    pub years: YearFilter,
    pub industry: IndustryFilter,
    /// Prepend the year to the grouping key.
    pub by_year: bool,
}

impl AggregationRequest {
    pub fn new(metric: Metric, group: Dimension) -> Self {
        AggregationRequest {
            metric,
            group,
            color: None,
            years: YearFilter::All,
            industry: IndustryFilter::All,
            by_year: false,
        }
    }

    #[must_use]
    pub fn color(mut self, color: Option<Dimension>) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn years(mut self, years: impl Into<YearFilter>) -> Self {
        self.years = years.into();
        self
    }

    #[must_use]
    pub fn industry(mut self, industry: IndustryFilter) -> Self {
        self.industry = industry;
        self
    }

    #[must_use]
    pub fn by_year(mut self) -> Self {
        self.by_year = true;
        self
    }

    pub fn color_dimension(&self) -> Option<Dimension> {
        self.color.filter(|c| *c != self.group)
    }

    pub fn active_dimensions(&self) -> Vec<Dimension> {
        let mut active = vec![self.group];
        active.extend(self.color_dimension());
        active
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub year: Option<i32>,
    pub group: String,
    pub color: Option<String>,
    pub value: f64,
}

impl AggregatedRow {
    pub fn category(&self) -> String {
        match &self.color {
            Some(color) => format!("{} / {}", self.group, color),
            None => self.group.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTable {
    pub metric: Metric,
    pub group: Dimension,
    pub color: Option<Dimension>,
    pub by_year: bool,
    pub rows: Vec<AggregatedRow>,
    pub labels: ChartLabels,
}

impl AggregatedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows
            .iter()
            .filter_map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn value(&self, group: &str, color: Option<&str>) -> Option<f64> {
        let mut cells = self
            .rows
            .iter()
            .filter(|r| r.group == group && r.color.as_deref() == color)
            .peekable();
        cells.peek()?;
        Some(cells.map(|r| r.value).sum())
    }

    pub fn bars(&self) -> Vec<(String, f64)> {
        self.rows.iter().map(|r| (r.category(), r.value)).collect()
    }

    pub fn series(&self) -> Vec<(String, Vec<(f64, f64)>)> {
        let mut series: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
        for row in &self.rows {
            if let Some(year) = row.year {
                series
                    .entry(row.category())
                    .or_default()
                    .push((f64::from(year), row.value));
            }
        }
        series.into_iter().collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'a> {
    tables: &'a Tables,
    flags: VariantFlags,
}

impl<'a> Pipeline<'a> {
    pub fn new(tables: &'a Tables, flags: VariantFlags) -> Self {
        Pipeline { tables, flags }
    }

    pub fn tables(&self) -> &'a Tables {
        self.tables
    }

    pub fn flags(&self) -> VariantFlags {
        self.flags
    }

    pub fn aggregate(&self, request: &AggregationRequest) -> Result<AggregatedTable> {
        for dim in request.active_dimensions() {
            compat::check_dimension(request.metric, dim, self.flags)?;
        }

        let rows = match request.metric.table() {
            TableKind::Firm => aggregate_rows(&self.tables.firm, request)?,
            TableKind::Owner => aggregate_rows(&self.tables.owner, request)?,
        };

        let color = request.color_dimension();
        let labels = if request.by_year {
            ChartLabels::over_time(request.metric, request.group)
        } else {
            ChartLabels::by_group(request.metric, request.group, color)
        };
        info!(
            metric = request.metric.column(),
            group = ?request.group,
            color = ?color,
            rows = rows.len(),
            "aggregated"
        );

        Ok(AggregatedTable {
            metric: request.metric,
            group: request.group,
            color,
            by_year: request.by_year,
            rows,
            labels,
        })
    }
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn finish(&self, aggregation: Aggregation) -> Option<f64> {
        match aggregation {
            Aggregation::Sum => Some(self.sum),
            Aggregation::Mean if self.count == 0 => None,
            Aggregation::Mean => Some(self.sum / self.count as f64),
        }
    }
}

type GroupKey = (Option<i32>, String, Option<String>);

fn aggregate_rows<R: DemographicRecord>(
    rows: &[R],
    request: &AggregationRequest,
) -> Result<Vec<AggregatedRow>> {
    let active = request.active_dimensions();
    for dim in &active {
        if labels::column_for(*dim, R::KIND).is_none() {
            return Err(DashboardError::MissingColumn(
                labels::to_firm_column(*dim).to_string(),
            ));
        }
    }

    let mut view: Vec<&R> = rows
        .iter()
        .filter(|r| !r.is_derived_category())
        .filter(|r| request.years.contains(r.year()))
        .collect();
    debug!(rows = view.len(), "after baseline exclusions and year filter");

    restrict_industry(
        &mut view,
        &request.industry,
        active.contains(&Dimension::Industry),
    );
    debug!(rows = view.len(), "after industry filter");

    collapse_to_total(&mut view, &active);
    debug!(rows = view.len(), "after collapse to total");

    for dim in &active {
        let sentinel = R::KIND.sentinel_for(*dim);
        view.retain(|r| matches!(r.label(*dim), Some(v) if v != sentinel && !v.is_empty()));
    }
    debug!(rows = view.len(), "after removing active totals");

    let group = request.group;
    let color = request.color_dimension();
    let mut groups: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    for record in view {
        let Some(group_value) = record.label(group) else {
            continue;
        };
        let color_value = match color {
            Some(c) => match record.label(c) {
                Some(v) => Some(v.to_string()),
                None => continue,
            },
            None => None,
        };
        let key = (
            request.by_year.then(|| record.year()),
            group_value.to_string(),
            color_value,
        );
        let acc = groups.entry(key).or_default();
        if let Some(value) = record.measure(request.metric) {
            acc.sum += value;
            acc.count += 1;
        }
    }

    let aggregation = Aggregation::for_metric(request.metric);
    let rows = groups
        .into_iter()
        .filter_map(|((year, group, color), acc)| {
            let value = acc.finish(aggregation);
            if value.is_none() {
                debug!(group = %group, "no numeric values; group dropped");
            }
            value.map(|value| AggregatedRow {
                year,
                group,
                color,
                value,
            })
        })
        .collect();
    Ok(rows)
}

fn restrict_industry<R: DemographicRecord>(
    view: &mut Vec<&R>,
    filter: &IndustryFilter,
    industry_active: bool,
) {
    match filter {
        IndustryFilter::Named(name) if name != ALL_SECTORS => {
            view.retain(|r| r.industry() == name.as_str())
        }
        // All and the all-sectors selection are the same slice; grouped by
        // industry, every industry is shown and the all-sectors row goes with
        // the other totals
        _ if industry_active => {}
        _ => {
            if view.iter().any(|r| r.industry() == ALL_SECTORS) {
                view.retain(|r| r.industry() == ALL_SECTORS);
            } else if !view.is_empty() {
                warn!("no '{ALL_SECTORS}' rows in view; industries are summed");
            }
        }
    }
}

/// Holds every inactive dimension at its total so categories are not re-summed.
fn collapse_to_total<R: DemographicRecord>(view: &mut Vec<&R>, active: &[Dimension]) {
    let sentinel = R::KIND.sentinel();
    let inactive = DIMENSIONS.iter().copied().filter(|d| {
        !active.contains(d) && !matches!(d, Dimension::Industry | Dimension::LegalForm)
    });
    for dim in inactive {
        if view.iter().any(|r| r.label(dim) == Some(sentinel)) {
            view.retain(|r| r.label(dim) == Some(sentinel));
        }
    }
}
