use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer};

/// Category value meaning "all categories collapsed" in the firm table.
pub const FIRM_SENTINEL: &str = "Total";
/// Category value meaning "all categories collapsed" in the owner table.
pub const OWNER_SENTINEL: &str = "All owners of nonemployer firms";
/// Industry row that already holds the cross-industry total.
pub const ALL_SECTORS: &str = "Total for all sectors";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Industry,
    Sex,
    Race,
    Ethnicity,
    Veteran,
    ForeignBorn,
    W2,
    LegalForm,
}

/// Selector order of the dashboard.
pub const DIMENSIONS: &[Dimension] = &[
    Dimension::Industry,
    Dimension::Sex,
    Dimension::Race,
    Dimension::Ethnicity,
    Dimension::Veteran,
    Dimension::ForeignBorn,
    Dimension::W2,
    Dimension::LegalForm,
];

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Dimension::Industry => write!(f, "Industry"),
            Dimension::Sex => write!(f, "Sex"),
            Dimension::Race => write!(f, "Race"),
            Dimension::Ethnicity => write!(f, "Ethnicity"),
            Dimension::Veteran => write!(f, "Veteran Status"),
            Dimension::ForeignBorn => write!(f, "Foreign Born Status"),
            Dimension::W2 => write!(f, "W2 Status"),
            Dimension::LegalForm => write!(f, "Legal Form of Organization"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    FirmCount,
    OwnerCount,
    Receipts,
    AvgReceiptsPerFirm,
}

pub const METRICS: &[Metric] = &[
    Metric::FirmCount,
    Metric::OwnerCount,
    Metric::Receipts,
    Metric::AvgReceiptsPerFirm,
];

impl Metric {
    pub fn column(self) -> &'static str {
        match self {
            Metric::FirmCount => "FIRMNOPD",
            Metric::OwnerCount => "OWNNOPD",
            Metric::Receipts => "RCPNOPD",
            Metric::AvgReceiptsPerFirm => "AVG_RECEIPTS_PER_FIRM",
        }
    }

    pub fn table(self) -> TableKind {
        match self {
            Metric::OwnerCount => TableKind::Owner,
            _ => TableKind::Firm,
        }
    }

    pub fn is_additive(self) -> bool {
        !matches!(self, Metric::AvgReceiptsPerFirm)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Metric::FirmCount => write!(f, "Firm Counts"),
            Metric::OwnerCount => write!(f, "Owner Counts"),
            Metric::Receipts => write!(f, "Business Receipts"),
            Metric::AvgReceiptsPerFirm => write!(f, "Avg Receipts per Firm"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    Firm,
    Owner,
}

impl TableKind {
    pub fn sentinel(self) -> &'static str {
        match self {
            TableKind::Firm => FIRM_SENTINEL,
            TableKind::Owner => OWNER_SENTINEL,
        }
    }

    /// Sentinel value of `dim` in this table. Industry uses the all-sectors row.
    pub fn sentinel_for(self, dim: Dimension) -> &'static str {
        match dim {
            Dimension::Industry => ALL_SECTORS,
            _ => self.sentinel(),
        }
    }
}

pub trait DemographicRecord {
    const KIND: TableKind;
    /// Columns a table file must carry for the rows to load.
    const REQUIRED_COLUMNS: &'static [&'static str];

    fn year(&self) -> i32;
    fn industry(&self) -> &str;
    /// Category of `dim`, `None` when the table has no such column.
    fn label(&self, dim: Dimension) -> Option<&str>;
    fn measure(&self, metric: Metric) -> Option<f64>;

    /// Overlapping categories that would double count next to the discrete ones.
    fn is_derived_category(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FirmRecord {
    #[serde(rename = "YEAR")]
    pub year: i32,
    #[serde(rename = "NAICS2017_LABEL")]
    pub industry: String,
    #[serde(rename = "SEX_LABEL")]
    pub sex: String,
    #[serde(rename = "RACE_GROUP_LABEL")]
    pub race: String,
    #[serde(rename = "ETH_GROUP_LABEL")]
    pub ethnicity: String,
    #[serde(rename = "FOREIGN_BORN_GROUP_LABEL")]
    pub foreign_born: String,
    #[serde(rename = "LFO_LABEL")]
    pub legal_form: String,
    #[serde(rename = "VET_GROUP_LABEL")]
    pub veteran: String,
    #[serde(rename = "W2_GROUP_LABEL")]
    pub w2: String,
    #[serde(rename = "FIRMNOPD", deserialize_with = "lenient_number")]
    pub firms: Option<f64>,
    #[serde(rename = "RCPNOPD", deserialize_with = "lenient_number")]
    pub receipts: Option<f64>,
    #[serde(
        rename = "AVG_RECEIPTS_PER_FIRM",
        alias = "AVG_REVENUE_PER_FIRM",
        default,
        deserialize_with = "lenient_number"
    )]
    pub avg_receipts_per_firm: Option<f64>,
}

const FIRM_COLUMNS: &[&str] = &[
    "YEAR",
    "NAICS2017_LABEL",
    "SEX_LABEL",
    "RACE_GROUP_LABEL",
    "ETH_GROUP_LABEL",
    "FOREIGN_BORN_GROUP_LABEL",
    "LFO_LABEL",
    "VET_GROUP_LABEL",
    "W2_GROUP_LABEL",
    "FIRMNOPD",
    "RCPNOPD",
];

impl DemographicRecord for FirmRecord {
    const KIND: TableKind = TableKind::Firm;
    const REQUIRED_COLUMNS: &'static [&'static str] = FIRM_COLUMNS;

    fn year(&self) -> i32 {
        self.year
    }

    fn industry(&self) -> &str {
        &self.industry
    }

    fn label(&self, dim: Dimension) -> Option<&str> {
        let value = match dim {
            Dimension::Industry => &self.industry,
            Dimension::Sex => &self.sex,
            Dimension::Race => &self.race,
            Dimension::Ethnicity => &self.ethnicity,
            Dimension::Veteran => &self.veteran,
            Dimension::ForeignBorn => &self.foreign_born,
            Dimension::W2 => &self.w2,
            Dimension::LegalForm => &self.legal_form,
        };
        Some(value.as_str())
    }

    fn measure(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::FirmCount => self.firms,
            Metric::Receipts => self.receipts,
            // older extracts lack the derived column
            Metric::AvgReceiptsPerFirm => self.avg_receipts_per_firm.or_else(|| {
                match (self.receipts, self.firms) {
                    (Some(receipts), Some(firms)) if firms != 0.0 => Some(receipts / firms),
                    _ => None,
                }
            }),
            Metric::OwnerCount => None,
        }
    }

    fn is_derived_category(&self) -> bool {
        let race = self.race.to_lowercase();
        let ethnicity = self.ethnicity.to_lowercase();
        race.contains("minority") || race.contains("equally") || ethnicity.contains("equally")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OwnerRecord {
    #[serde(rename = "YEAR")]
    pub year: i32,
    #[serde(rename = "NAICS2017_LABEL")]
    pub industry: String,
    #[serde(rename = "OWNER_SEX_LABEL")]
    pub sex: String,
    #[serde(rename = "OWNER_RACE_LABEL")]
    pub race: String,
    #[serde(rename = "OWNER_ETH_LABEL")]
    pub ethnicity: String,
    #[serde(rename = "OWNER_VET_LABEL")]
    pub veteran: String,
    #[serde(rename = "OWNER_FOREIGN_BORN_LABEL")]
    pub foreign_born: String,
    #[serde(rename = "OWNER_W2_LABEL")]
    pub w2: String,
    #[serde(rename = "OWNNOPD", deserialize_with = "lenient_number")]
    pub owners: Option<f64>,
}

const OWNER_COLUMNS: &[&str] = &[
    "YEAR",
    "NAICS2017_LABEL",
    "OWNER_SEX_LABEL",
    "OWNER_RACE_LABEL",
    "OWNER_ETH_LABEL",
    "OWNER_VET_LABEL",
    "OWNER_FOREIGN_BORN_LABEL",
    "OWNER_W2_LABEL",
    "OWNNOPD",
];

impl DemographicRecord for OwnerRecord {
    const KIND: TableKind = TableKind::Owner;
    const REQUIRED_COLUMNS: &'static [&'static str] = OWNER_COLUMNS;

    fn year(&self) -> i32 {
        self.year
    }

    fn industry(&self) -> &str {
        &self.industry
    }

    fn label(&self, dim: Dimension) -> Option<&str> {
        let value = match dim {
            Dimension::Industry => &self.industry,
            Dimension::Sex => &self.sex,
            Dimension::Race => &self.race,
            Dimension::Ethnicity => &self.ethnicity,
            Dimension::Veteran => &self.veteran,
            Dimension::ForeignBorn => &self.foreign_born,
            Dimension::W2 => &self.w2,
            Dimension::LegalForm => return None,
        };
        Some(value.as_str())
    }

    fn measure(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::OwnerCount => self.owners,
            _ => None,
        }
    }
}

/// Parses a measure cell, treating suppression flags and blanks as missing.
pub fn parse_measure(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_measure(&raw))
}

/// Both NES-D tables, loaded once and only ever borrowed afterwards.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub firm: Vec<FirmRecord>,
    pub owner: Vec<OwnerRecord>,
}

impl Tables {
    pub fn new(firm: Vec<FirmRecord>, owner: Vec<OwnerRecord>) -> Self {
        Tables { firm, owner }
    }

    pub fn years(&self) -> Vec<i32> {
        self.firm
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn industries(&self) -> Vec<String> {
        self.firm
            .iter()
            .map(|r| r.industry.as_str())
            .filter(|s| !s.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
