use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{advisor::AdvisorConfig, headers::HeaderDetection};

/// Run settings. Every field has a default, so a YAML file only needs the
/// keys it changes; command-line flags are applied on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub header_detection: HeaderDetection,
    pub table_details_sheet: String,
    pub remark_separator: String,
    pub output_sheet_suffix: String,
    pub advisor: AdvisorConfig,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            header_detection: HeaderDetection::default(),
            table_details_sheet: "Table Details".to_string(),
            remark_separator: " | ".to_string(),
            output_sheet_suffix: "_output".to_string(),
            advisor: AdvisorConfig::default(),
        }
    }
}

impl ValidatorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: ValidatorConfig =
            serde_yaml::from_reader(reader).context("Parsing validator config YAML")?;
        Ok(config)
    }
}
