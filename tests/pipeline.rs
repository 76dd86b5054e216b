use std::io::Write;

use nesd_dashboard::compat::{self, ChartKind};
use nesd_dashboard::csv_reader::read_records;
use nesd_dashboard::dataset::{
    Dimension, FirmRecord, Metric, OwnerRecord, TableKind, Tables, ALL_SECTORS, DIMENSIONS, METRICS,
};
use nesd_dashboard::{AggregationRequest, DashboardError, IndustryFilter, Pipeline, VariantFlags};
use tempfile::NamedTempFile;

const FIRM_HEADER: &str = "YEAR,NAICS2017_LABEL,SEX_LABEL,RACE_GROUP_LABEL,ETH_GROUP_LABEL,FOREIGN_BORN_GROUP_LABEL,LFO_LABEL,VET_GROUP_LABEL,W2_GROUP_LABEL,FIRMNOPD,RCPNOPD,AVG_RECEIPTS_PER_FIRM";
const OWNER_HEADER: &str = "YEAR,NAICS2017_LABEL,OWNER_SEX_LABEL,OWNER_RACE_LABEL,OWNER_ETH_LABEL,OWNER_VET_LABEL,OWNER_FOREIGN_BORN_LABEL,OWNER_W2_LABEL,OWNER_AGE_LABEL,OWNER_USCITIZEN_LABEL,OWNNOPD";
const ALL_OWNERS: &str = "All owners of nonemployer firms";

// (sex, race, legal form, firms)
const FIRM_CELLS: &[(&str, &str, &str, f64)] = &[
    ("Total", "Total", "Total", 1800.0),
    ("Male", "Total", "Total", 1000.0),
    ("Female", "Total", "Total", 800.0),
    ("Total", "White", "Total", 1400.0),
    ("Total", "Black", "Total", 250.0),
    ("Total", "Asian", "Total", 150.0),
    ("Total", "Minority", "Total", 400.0),
    ("Total", "Equally minority/nonminority", "Total", 20.0),
    ("Male", "White", "Total", 780.0),
    ("Male", "Black", "Total", 140.0),
    ("Male", "Asian", "Total", 80.0),
    ("Female", "White", "Total", 620.0),
    ("Female", "Black", "Total", 110.0),
    ("Female", "Asian", "Total", 70.0),
    ("Total", "Total", "Corporation", 300.0),
    ("Total", "Total", "Sole proprietorship", 1500.0),
];

fn write_temp(contents: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "{}", contents).unwrap();
    tmp
}

fn firm_csv() -> String {
    let mut csv = format!("{FIRM_HEADER}\n");
    for (year, scale) in [(2018, 0.9), (2019, 1.0)] {
        for (industry, share) in [(ALL_SECTORS, 1.0), ("Construction", 0.25), ("Retail trade", 0.75)] {
            for (sex, race, lfo, firms) in FIRM_CELLS {
                let firms = firms * scale * share;
                let receipts = firms * 40.0;
                csv.push_str(&format!(
                    "{year},{industry},{sex},{race},Total,Total,{lfo},Total,Total,{firms},{receipts},40\n"
                ));
            }
        }
    }
    csv
}

fn owner_csv() -> String {
    let mut csv = format!("{OWNER_HEADER}\n");
    let cells = [
        (ALL_OWNERS, ALL_OWNERS, 2100.0),
        ("Male", ALL_OWNERS, 1200.0),
        ("Female", ALL_OWNERS, 900.0),
        (ALL_OWNERS, "White", 1600.0),
        (ALL_OWNERS, "Black", 500.0),
        ("Male", "White", 900.0),
        ("Female", "Black", 200.0),
    ];
    for (sex, race, owners) in cells {
        csv.push_str(&format!(
            "2019,{ALL_SECTORS},{sex},{race},{ALL_OWNERS},{ALL_OWNERS},{ALL_OWNERS},{ALL_OWNERS},{ALL_OWNERS},{ALL_OWNERS},{owners}\n"
        ));
    }
    csv
}

fn make_tables() -> Tables {
    let firm_file = write_temp(&firm_csv());
    let owner_file = write_temp(&owner_csv());
    let firm = read_records::<FirmRecord>(firm_file.path()).unwrap();
    let owner = read_records::<OwnerRecord>(owner_file.path()).unwrap();
    Tables::new(firm, owner)
}

#[test]
fn test_sex_example_from_total_row() {
    let tables = make_tables();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());
    let request = AggregationRequest::new(Metric::FirmCount, Dimension::Sex).years(2019);
    let table = pipeline.aggregate(&request).unwrap();

    assert_eq!(
        table.bars(),
        vec![("Female".to_string(), 800.0), ("Male".to_string(), 1000.0)]
    );
    let total: f64 = table.rows.iter().map(|r| r.value).sum();
    assert_eq!(total, 1800.0);
}

#[test]
fn test_no_sentinel_in_any_result() {
    let tables = make_tables();
    let flags = VariantFlags::default();
    let pipeline = Pipeline::new(&tables, flags);

    for metric in METRICS {
        let sentinel_table = metric.table();
        for group in compat::dimension_options(*metric, flags) {
            for color in compat::dimension_options(*metric, flags) {
                let request = AggregationRequest::new(*metric, group).color(Some(color));
                let table = pipeline.aggregate(&request).unwrap();
                for row in &table.rows {
                    assert_ne!(row.group, sentinel_table.sentinel_for(group));
                    assert_ne!(row.group, sentinel_table.sentinel());
                    if let (Some(value), Some(dim)) = (&row.color, table.color) {
                        assert_ne!(value, sentinel_table.sentinel_for(dim));
                    }
                }
            }
        }
    }
}

#[test]
fn test_race_breakdown_drops_overlapping_categories() {
    let tables = make_tables();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());
    let request = AggregationRequest::new(Metric::FirmCount, Dimension::Race).years(2019);
    let table = pipeline.aggregate(&request).unwrap();

    let groups: Vec<&str> = table.rows.iter().map(|r| r.group.as_str()).collect();
    assert_eq!(groups, vec!["Asian", "Black", "White"]);
    assert_eq!(table.value("White", None), Some(1400.0));
}

#[test]
fn test_all_industries_matches_explicit_total_row() {
    let tables = make_tables();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());
    for metric in [Metric::FirmCount, Metric::Receipts, Metric::AvgReceiptsPerFirm] {
        for group in [Dimension::Sex, Dimension::Industry] {
            let base = AggregationRequest::new(metric, group).color(Some(Dimension::Race));
            let all = pipeline
                .aggregate(&base.clone().industry(IndustryFilter::All))
                .unwrap();
            let explicit = pipeline
                .aggregate(&base.industry(IndustryFilter::from(ALL_SECTORS)))
                .unwrap();
            assert!(!all.is_empty());
            assert_eq!(all.rows, explicit.rows);
        }
    }
}

#[test]
fn test_industry_grouping_excludes_all_sectors_row() {
    let tables = make_tables();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());
    let request = AggregationRequest::new(Metric::FirmCount, Dimension::Industry).years(2019);
    let table = pipeline.aggregate(&request).unwrap();

    let industries: Vec<&str> = table.rows.iter().map(|r| r.group.as_str()).collect();
    assert_eq!(industries, vec!["Construction", "Retail trade"]);
}

#[test]
fn test_legal_form_with_owner_counts_is_unsupported() {
    let tables = make_tables();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());

    let as_group = AggregationRequest::new(Metric::OwnerCount, Dimension::LegalForm);
    let as_color = AggregationRequest::new(Metric::OwnerCount, Dimension::Sex)
        .color(Some(Dimension::LegalForm));
    for request in [as_group, as_color] {
        match pipeline.aggregate(&request) {
            Err(DashboardError::UnsupportedCombination { dimension, .. }) => {
                assert_eq!(dimension, Dimension::LegalForm)
            }
            other => panic!("Expected unsupported combination, got {other:?}"),
        }
    }
}

#[test]
fn test_legal_form_for_firm_counts() {
    let tables = make_tables();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());
    let request = AggregationRequest::new(Metric::FirmCount, Dimension::LegalForm).years(2019);
    let table = pipeline.aggregate(&request).unwrap();
    assert_eq!(table.value("Corporation", None), Some(300.0));
    assert_eq!(table.value("Sole proprietorship", None), Some(1500.0));
    assert_eq!(table.labels.x_label, "LFO");
}

#[test]
fn test_owner_counts() {
    let tables = make_tables();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());
    let request = AggregationRequest::new(Metric::OwnerCount, Dimension::Race).years(2019);
    let table = pipeline.aggregate(&request).unwrap();
    assert_eq!(
        table.bars(),
        vec![("Black".to_string(), 500.0), ("White".to_string(), 1600.0)]
    );
}

#[test]
fn test_owner_breakdowns_hold_other_dimensions_at_all_owners() {
    let tables = make_tables();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());

    let by_sex = AggregationRequest::new(Metric::OwnerCount, Dimension::Sex).years(2019);
    assert_eq!(
        pipeline.aggregate(&by_sex).unwrap().bars(),
        vec![("Female".to_string(), 900.0), ("Male".to_string(), 1200.0)]
    );

    let by_sex_and_race = by_sex.color(Some(Dimension::Race));
    let table = pipeline.aggregate(&by_sex_and_race).unwrap();
    let cells: Vec<(&str, Option<&str>, f64)> = table
        .rows
        .iter()
        .map(|r| (r.group.as_str(), r.color.as_deref(), r.value))
        .collect();
    assert_eq!(
        cells,
        vec![("Female", Some("Black"), 200.0), ("Male", Some("White"), 900.0)]
    );
}

#[test]
fn test_strict_owner_pairing() {
    let tables = make_tables();
    let flags = VariantFlags {
        strict_owner_pairing: true,
        ..VariantFlags::default()
    };
    let pipeline = Pipeline::new(&tables, flags);

    let sex = AggregationRequest::new(Metric::OwnerCount, Dimension::Sex);
    assert!(pipeline.aggregate(&sex).unwrap_err().is_unsupported());
    let race = AggregationRequest::new(Metric::OwnerCount, Dimension::Race);
    assert!(pipeline.aggregate(&race).is_ok());
}

#[test]
fn test_average_receipts_is_mean() {
    let tables = make_tables();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());
    // two years collapse into one group per sex
    let request = AggregationRequest::new(Metric::AvgReceiptsPerFirm, Dimension::Sex);
    let table = pipeline.aggregate(&request).unwrap();
    assert_eq!(table.value("Male", None), Some(40.0));
    assert_eq!(table.labels.y_label, "Avg Receipts per Firm ($1000s)");
}

#[test]
fn test_shares_sum_to_hundred_each_year() {
    let tables = make_tables();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());
    for metric in compat::metric_options(ChartKind::Share, VariantFlags::default()) {
        for group in [Dimension::Sex, Dimension::Race, Dimension::LegalForm] {
            let shares = pipeline.shares(metric, group, IndustryFilter::All).unwrap();
            assert_eq!(shares.years(), vec![2018, 2019]);
            for year in shares.years() {
                let total = shares.total_share(year);
                assert!((total - 100.0).abs() <= 100.0 * 1e-6, "{year}: {total}");
            }
        }
    }
}

#[test]
fn test_share_rejects_average_receipts() {
    let tables = make_tables();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());
    let err = pipeline
        .shares(Metric::AvgReceiptsPerFirm, Dimension::Sex, IndustryFilter::All)
        .unwrap_err();
    assert!(matches!(err, DashboardError::UnsupportedChart { .. }));
}

#[test]
fn test_pipeline_is_pure() {
    let tables = make_tables();
    let before = tables.firm.clone();
    let pipeline = Pipeline::new(&tables, VariantFlags::default());
    let request = AggregationRequest::new(Metric::Receipts, Dimension::Race)
        .color(Some(Dimension::Sex))
        .industry(IndustryFilter::from("Construction"))
        .by_year();

    let first = pipeline.aggregate(&request).unwrap();
    let second = pipeline.aggregate(&request).unwrap();
    assert_eq!(first, second);
    assert_eq!(tables.firm, before);
}

#[test]
fn test_every_dimension_has_a_firm_label() {
    for dim in DIMENSIONS {
        let label = nesd_dashboard::labels::dimension_label(*dim, TableKind::Firm);
        assert!(!label.is_empty());
        assert!(!label.contains('_'));
    }
}
