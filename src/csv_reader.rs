use std::fs::File;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::dataset::{DemographicRecord, FirmRecord, OwnerRecord, Tables};
use crate::error::{DashboardError, Result};

/// Reads one NES-D table, failing on the first missing column or malformed row.
pub fn read_records<R>(path: &Path) -> Result<Vec<R>>
where
    R: DemographicRecord + DeserializeOwned,
{
    let file = File::open(path)?;
    let records = read_records_from::<R, _>(file)?;
    info!(
        path = %path.display(),
        rows = records.len(),
        "loaded {:?} table",
        R::KIND
    );
    Ok(records)
}

pub fn read_records_from<R, Rd>(reader: Rd) -> Result<Vec<R>>
where
    R: DemographicRecord + DeserializeOwned,
    Rd: io::Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in R::REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(DashboardError::MissingColumn(column.to_string()));
        }
    }

    let mut records = Vec::<R>::new();
    for result in rdr.deserialize() {
        let record: R = result?;
        records.push(record);
    }
    debug!(rows = records.len(), "parsed {:?} rows", R::KIND);
    Ok(records)
}

pub fn load_tables(config: &DashboardConfig) -> Result<Tables> {
    let firm = read_records::<FirmRecord>(&config.firm_table)?;
    let owner = read_records::<OwnerRecord>(&config.owner_table)?;
    Ok(Tables::new(firm, owner))
}
