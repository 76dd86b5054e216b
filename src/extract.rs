use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::dataset::parse_measure;
use crate::error::{DashboardError, Result};

const METADATA_MARKERS: &[&str] = &["meaning", "code"];
const DERIVED_COLUMN: &str = "AVG_RECEIPTS_PER_FIRM";
const RECEIPTS_COLUMN: &str = "RCPNOPD";
const FIRMS_COLUMN: &str = "FIRMNOPD";

/// One year's export of a table, given on the command line as `2019=path.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearInput {
    pub year: i32,
    pub path: PathBuf,
}

impl FromStr for YearInput {
    type Err = DashboardError;

    fn from_str(arg: &str) -> Result<Self> {
        let (year, path) = arg
            .split_once('=')
            .ok_or_else(|| DashboardError::InvalidInput(format!("expected YEAR=PATH, got '{arg}'")))?;
        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|e| DashboardError::InvalidInput(format!("bad year in '{arg}': {e}")))?;
        Ok(YearInput {
            year,
            path: PathBuf::from(path.trim()),
        })
    }
}

fn is_metadata_row(record: &StringRecord) -> bool {
    record.iter().any(|cell| {
        let cell = cell.to_lowercase();
        METADATA_MARKERS.iter().any(|marker| cell.contains(marker))
    })
}

fn is_blank_row(record: &StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

fn average_receipts(receipts: Option<&str>, firms: Option<&str>) -> String {
    match (receipts.and_then(parse_measure), firms.and_then(parse_measure)) {
        (Some(receipts), Some(firms)) if firms != 0.0 => (receipts / firms).to_string(),
        _ => String::new(),
    }
}

/// Writes the year-tagged concatenation of `sources`, returning the data rows written.
///
/// The first source's header fixes the output columns; later sources are
/// matched by column name and missing cells are left blank.
pub fn combine_years<R, W>(sources: Vec<(i32, R)>, writer: W) -> Result<usize>
where
    R: io::Read,
    W: io::Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    let mut output_columns: Option<Vec<String>> = None;
    let mut derive = false;
    let mut written = 0usize;

    for (year, source) in sources {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);
        let headers = rdr.headers()?.clone();

        if output_columns.is_none() {
            let first: Vec<String> = headers.iter().map(str::to_string).collect();
            let has = |name: &str| first.iter().any(|c| c == name);
            derive = has(RECEIPTS_COLUMN) && has(FIRMS_COLUMN) && !has(DERIVED_COLUMN);

            let mut header = vec!["YEAR".to_string()];
            header.extend(first.iter().cloned());
            if derive {
                header.push(DERIVED_COLUMN.to_string());
            }
            wtr.write_record(&header)?;
            output_columns = Some(first);
        }
        let columns = output_columns.as_deref().unwrap_or_default();

        let positions: Vec<Option<usize>> = columns
            .iter()
            .map(|name| headers.iter().position(|h| h == name))
            .collect();
        let receipts_at = headers.iter().position(|h| h == RECEIPTS_COLUMN);
        let firms_at = headers.iter().position(|h| h == FIRMS_COLUMN);

        let mut kept = 0usize;
        let mut dropped = 0usize;
        for result in rdr.records() {
            let record = result?;
            if is_blank_row(&record) || is_metadata_row(&record) {
                dropped += 1;
                continue;
            }

            let mut out = vec![year.to_string()];
            out.extend(
                positions
                    .iter()
                    .map(|p| p.and_then(|i| record.get(i)).unwrap_or("").to_string()),
            );
            if derive {
                out.push(average_receipts(
                    receipts_at.and_then(|i| record.get(i)),
                    firms_at.and_then(|i| record.get(i)),
                ));
            }
            wtr.write_record(&out)?;
            kept += 1;
        }
        debug!(year, kept, dropped, "combined year");
        written += kept;
    }

    wtr.flush()?;
    Ok(written)
}

pub fn extract_table(out_dir: &Path, table: &str, inputs: &[YearInput]) -> Result<Option<PathBuf>> {
    let mut sources = Vec::new();
    for input in inputs {
        if !input.path.exists() {
            warn!(path = %input.path.display(), "input not found; skipped");
            continue;
        }
        sources.push((input.year, File::open(&input.path)?));
    }
    if sources.is_empty() {
        return Ok(None);
    }

    let out_path = out_dir.join(format!("{table}_new.csv"));
    let rows = combine_years(sources, File::create(&out_path)?)?;
    info!(path = %out_path.display(), rows, "saved {table}");
    Ok(Some(out_path))
}
