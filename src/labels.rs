use crate::dataset::{Dimension, Metric, TableKind};

/// Firm-level demographic column → owner-level counterpart.
const OWNER_COLUMN_MAP: &[(&str, &str)] = &[
    ("SEX_LABEL", "OWNER_SEX_LABEL"),
    ("RACE_GROUP_LABEL", "OWNER_RACE_LABEL"),
    ("ETH_GROUP_LABEL", "OWNER_ETH_LABEL"),
    ("VET_GROUP_LABEL", "OWNER_VET_LABEL"),
    ("FOREIGN_BORN_GROUP_LABEL", "OWNER_FOREIGN_BORN_LABEL"),
    ("W2_GROUP_LABEL", "OWNER_W2_LABEL"),
    ("AGE_LABEL", "OWNER_AGE_LABEL"),
    ("USCITIZEN_LABEL", "OWNER_USCITIZEN_LABEL"),
];

// title-casing mangles these
const LABEL_OVERRIDES: &[(&str, &str)] = &[
    ("Eth", "Ethnicity"),
    ("Vet", "Veteran Status"),
    ("W2", "Wage Work Status"),
    ("Lfo", "LFO"),
    ("Naics2017", "Industry"),
    ("Uscitizen", "US Citizen"),
];

pub fn to_firm_column(dim: Dimension) -> &'static str {
    match dim {
        Dimension::Industry => "NAICS2017_LABEL",
        Dimension::Sex => "SEX_LABEL",
        Dimension::Race => "RACE_GROUP_LABEL",
        Dimension::Ethnicity => "ETH_GROUP_LABEL",
        Dimension::Veteran => "VET_GROUP_LABEL",
        Dimension::ForeignBorn => "FOREIGN_BORN_GROUP_LABEL",
        Dimension::W2 => "W2_GROUP_LABEL",
        Dimension::LegalForm => "LFO_LABEL",
    }
}

/// Owner-table column of `dim`; legal form only exists at firm level.
pub fn to_owner_column(dim: Dimension) -> Option<&'static str> {
    match dim {
        Dimension::LegalForm => None,
        _ => Some(owner_column_for(to_firm_column(dim))),
    }
}

pub fn column_for(dim: Dimension, kind: TableKind) -> Option<&'static str> {
    match kind {
        TableKind::Firm => Some(to_firm_column(dim)),
        TableKind::Owner => to_owner_column(dim),
    }
}

/// Owner counterpart of a firm column name, or the name itself when unmapped.
pub fn owner_column_for(column: &str) -> &str {
    OWNER_COLUMN_MAP
        .iter()
        .find(|(firm, _)| *firm == column)
        .map(|(_, owner)| *owner)
        .unwrap_or(column)
}

/// Turns a column identifier such as `OWNER_ETH_LABEL` into `Ethnicity`.
pub fn pretty_label(column: &str) -> String {
    let base = column
        .replace("OWNER_", "")
        .replace("_GROUP", "")
        .replace("_LABEL", "")
        .replace('_', " ");
    let base = title_case(&base);
    LABEL_OVERRIDES
        .iter()
        .find(|(short, _)| *short == base)
        .map(|(_, long)| long.to_string())
        .unwrap_or(base)
}

// Upper-cases a letter after any non-letter, lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_cased = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }
    out
}

pub fn dimension_label(dim: Dimension, kind: TableKind) -> String {
    pretty_label(column_for(dim, kind).unwrap_or_else(|| to_firm_column(dim)))
}

pub fn metric_label(metric: Metric) -> &'static str {
    match metric {
        Metric::FirmCount => "Firm Counts",
        Metric::OwnerCount => "Owner Counts",
        Metric::Receipts => "Business Receipts ($1000s)",
        Metric::AvgReceiptsPerFirm => "Avg Receipts per Firm ($1000s)",
    }
}

pub fn share_label(metric: Metric) -> &'static str {
    match metric {
        Metric::FirmCount => "Firm Share (%)",
        Metric::OwnerCount => "Owner Share (%)",
        Metric::Receipts => "Business Receipts Share (%)",
        Metric::AvgReceiptsPerFirm => "Share (%)",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChartLabels {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub color_label: Option<String>,
}

impl ChartLabels {
    pub fn by_group(metric: Metric, group: Dimension, color: Option<Dimension>) -> Self {
        let kind = metric.table();
        let y_label = metric_label(metric).to_string();
        let x_label = dimension_label(group, kind);
        let color_label = color.map(|c| dimension_label(c, kind));
        let mut title = format!("{y_label} by {x_label}");
        if let Some(c) = &color_label {
            title.push_str(&format!(" and Colored by {c}"));
        }
        ChartLabels {
            title,
            x_label,
            y_label,
            color_label,
        }
    }

    pub fn over_time(metric: Metric, group: Dimension) -> Self {
        let kind = metric.table();
        let y_label = metric_label(metric).to_string();
        let group_label = dimension_label(group, kind);
        ChartLabels {
            title: format!("{y_label} over Time by {group_label}"),
            x_label: "Year".to_string(),
            y_label,
            color_label: Some(group_label),
        }
    }

    pub fn shares(metric: Metric, group: Dimension) -> Self {
        let kind = metric.table();
        let y_label = share_label(metric).to_string();
        let group_label = dimension_label(group, kind);
        ChartLabels {
            title: format!(
                "{} by {group_label} Over Time",
                y_label.replace(" (%)", "")
            ),
            x_label: "Year".to_string(),
            y_label,
            color_label: Some(group_label),
        }
    }
}
