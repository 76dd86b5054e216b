use tracing::{debug, error};

use crate::compat::{self, ChartKind, VariantFlags};
use crate::dataset::{Dimension, Metric};
use crate::error::Result;
use crate::pipeline::{AggregatedTable, AggregationRequest, IndustryFilter, Pipeline, YearFilter};
use crate::share::ShareTable;

#[derive(Debug, Clone, PartialEq)]
pub enum ChartView {
    Bars(AggregatedTable),
    Lines(AggregatedTable),
    Shares(ShareTable),
    Message { title: String, text: String },
}

pub struct Dashboard<'a> {
    pipeline: Pipeline<'a>,
    years: Vec<i32>,
    industries: Vec<String>,
    default_year: Option<i32>,
    pub tab: ChartKind,
    pub metric: Metric,
    pub group: Dimension,
    pub color: Dimension,
    pub compare: bool,
    pub year: Option<i32>,
    /// 0 is "All sectors", then the industries in sorted order.
    industry_index: usize,
    pub view: ChartView,
}

pub trait DashboardControls {
    fn select_tab(&mut self, tab: ChartKind);
    fn cycle_metric(&mut self);
    fn cycle_group(&mut self);
    fn cycle_color(&mut self);
    fn toggle_compare(&mut self);
    fn cycle_year(&mut self);
    fn cycle_industry(&mut self);
    fn refresh_data(&mut self);
}

fn next_in<T: Copy + PartialEq>(options: &[T], current: T) -> Option<T> {
    let pos = options.iter().position(|o| *o == current)?;
    options.get((pos + 1) % options.len()).copied()
}

impl<'a> Dashboard<'a> {
    pub fn new(pipeline: Pipeline<'a>, default_year: Option<i32>) -> Self {
        let years = pipeline.tables().years();
        let industries = pipeline.tables().industries();
        let default_year = default_year.or_else(|| years.last().copied());
        let mut dashboard = Dashboard {
            pipeline,
            years,
            industries,
            default_year,
            tab: ChartKind::Bar,
            metric: Metric::FirmCount,
            group: Dimension::Sex,
            color: Dimension::Race,
            compare: false,
            year: default_year,
            industry_index: 0,
            view: ChartView::Message {
                title: String::new(),
                text: String::new(),
            },
        };
        dashboard.refresh_data();
        dashboard
    }

    fn flags(&self) -> VariantFlags {
        self.pipeline.flags()
    }

    pub fn industry(&self) -> IndustryFilter {
        match self.industry_index {
            0 => IndustryFilter::All,
            i => self
                .industries
                .get(i - 1)
                .map_or(IndustryFilter::All, |name| IndustryFilter::Named(name.clone())),
        }
    }

    pub fn industry_label(&self) -> &str {
        match self.industry_index {
            0 => "All Sectors",
            i => self.industries.get(i - 1).map_or("All Sectors", String::as_str),
        }
    }

    pub fn year_label(&self) -> String {
        match (self.tab, self.year) {
            (ChartKind::Bar, Some(year)) => year.to_string(),
            _ => "All years".to_string(),
        }
    }

    pub fn metric_options(&self) -> Vec<Metric> {
        compat::metric_options(self.tab, self.flags())
    }

    pub fn dimension_options(&self) -> Vec<Dimension> {
        compat::dimension_options(self.metric, self.flags())
    }

    pub fn active_color(&self) -> Option<Dimension> {
        (self.tab == ChartKind::Bar && self.compare && self.color != self.group).then_some(self.color)
    }

    // Re-selects the first valid option whenever a selection fell out of the matrix.
    fn normalize_selection(&mut self) {
        let metrics = self.metric_options();
        if !metrics.contains(&self.metric) {
            if let Some(first) = metrics.first() {
                self.metric = *first;
            }
        }
        let dims = self.dimension_options();
        if !dims.contains(&self.group) {
            if let Some(first) = dims.first() {
                self.group = *first;
            }
        }
        if !dims.contains(&self.color) {
            if let Some(first) = dims.iter().find(|d| **d != self.group) {
                self.color = *first;
            }
        }
    }

    fn run(&self) -> Result<ChartView> {
        let view = match self.tab {
            ChartKind::Bar => {
                let request = AggregationRequest::new(self.metric, self.group)
                    .color(self.active_color())
                    .years(YearFilter::from(self.year))
                    .industry(self.industry());
                ChartView::Bars(self.pipeline.aggregate(&request)?)
            }
            ChartKind::Line => {
                let request = AggregationRequest::new(self.metric, self.group)
                    .industry(self.industry())
                    .by_year();
                ChartView::Lines(self.pipeline.aggregate(&request)?)
            }
            ChartKind::Share => {
                ChartView::Shares(self.pipeline.shares(self.metric, self.group, self.industry())?)
            }
        };
        Ok(view)
    }
}

fn is_empty_view(view: &ChartView) -> Option<&str> {
    match view {
        ChartView::Bars(t) | ChartView::Lines(t) if t.is_empty() => Some(t.labels.title.as_str()),
        ChartView::Shares(t) if t.is_empty() => Some(t.labels.title.as_str()),
        _ => None,
    }
}

impl<'a> DashboardControls for Dashboard<'a> {
    fn select_tab(&mut self, tab: ChartKind) {
        self.tab = tab;
        // line and share charts span every year
        self.year = match tab {
            ChartKind::Bar => self.default_year,
            ChartKind::Line | ChartKind::Share => None,
        };
        self.refresh_data()
    }

    fn cycle_metric(&mut self) {
        let options = self.metric_options();
        if let Some(next) = next_in(&options, self.metric).or_else(|| options.first().copied()) {
            self.metric = next;
        }
        self.refresh_data()
    }

    fn cycle_group(&mut self) {
        let options = self.dimension_options();
        if let Some(next) = next_in(&options, self.group).or_else(|| options.first().copied()) {
            self.group = next;
        }
        self.refresh_data()
    }

    fn cycle_color(&mut self) {
        let options: Vec<Dimension> = self
            .dimension_options()
            .into_iter()
            .filter(|d| *d != self.group)
            .collect();
        if let Some(next) = next_in(&options, self.color).or_else(|| options.first().copied()) {
            self.color = next;
        }
        self.refresh_data()
    }

    fn toggle_compare(&mut self) {
        self.compare = !self.compare;
        self.refresh_data()
    }

    fn cycle_year(&mut self) {
        if self.tab != ChartKind::Bar {
            return;
        }
        // each year in turn, then all years
        self.year = match self.year {
            None => self.years.first().copied(),
            Some(year) => {
                let pos = self.years.iter().position(|y| *y == year);
                pos.and_then(|p| self.years.get(p + 1)).copied()
            }
        };
        self.refresh_data()
    }

    fn cycle_industry(&mut self) {
        self.industry_index = (self.industry_index + 1) % (self.industries.len() + 1);
        self.refresh_data()
    }

    fn refresh_data(&mut self) {
        self.normalize_selection();
        self.view = match self.run() {
            Ok(view) => match is_empty_view(&view).map(str::to_string) {
                Some(title) => ChartView::Message {
                    title,
                    text: "No data for this selection".to_string(),
                },
                None => view,
            },
            Err(e) if e.is_unsupported() => ChartView::Message {
                title: "Unsupported selection".to_string(),
                text: e.to_string(),
            },
            Err(e) => {
                error!("pipeline failed: {e}");
                ChartView::Message {
                    title: "Error".to_string(),
                    text: e.to_string(),
                }
            }
        };
        debug!(tab = %self.tab, metric = ?self.metric, group = ?self.group, "refreshed");
    }
}
