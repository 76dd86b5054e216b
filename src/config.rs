use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compat::VariantFlags;
use crate::error::{DashboardError, Result};

pub const CONFIG_ENV: &str = "NESD_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub firm_table: PathBuf,
    pub owner_table: PathBuf,
    /// Year preselected on the bar chart; the latest year when unset.
    pub default_year: Option<i32>,
    /// Tracing filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    pub log_file: PathBuf,
    pub tick_rate_ms: u64,
    pub variant: VariantFlags,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            firm_table: PathBuf::from("data/table_5_new.csv"),
            owner_table: PathBuf::from("data/table_O1_new.csv"),
            default_year: None,
            log_filter: String::from("info"),
            log_file: PathBuf::from("nesd_dashboard.log"),
            tick_rate_ms: 200,
            variant: VariantFlags::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DashboardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path.or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.tick_rate_ms == 0 {
            return Err(DashboardError::Config(
                "tick_rate_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = DashboardConfig::from_json(
            r#"{"firm_table": "t5.csv", "variant": {"strict_owner_pairing": true}}"#,
        )
        .unwrap();
        assert_eq!(config.firm_table, PathBuf::from("t5.csv"));
        assert_eq!(config.owner_table, DashboardConfig::default().owner_table);
        assert!(config.variant.strict_owner_pairing);
        assert!(!config.variant.owner_share_chart);
        assert_eq!(config.tick_rate(), Duration::from_millis(200));
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let err = DashboardConfig::from_json(r#"{"tick_rate_ms": 0}"#).unwrap_err();
        assert!(matches!(err, DashboardError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, r#"{{"default_year": 2018}}"#).unwrap();
        let config = DashboardConfig::load(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(config.default_year, Some(2018));
    }
}
