use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::policies::DEFAULT_TOLERANCE;

/// Parties that are never used as a comparison party.
pub const DEFAULT_BANNED_PARTIES: &[&str] = &[
    "independent",
    "speaker",
    "deputy-speaker",
    "independent-conservative",
    "independent-labour",
    "independent-ulster-unionist",
];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Holds policies/*.yml and records.json
    pub data_dir: PathBuf,
    /// Where generated person-policy links are written
    pub output: PathBuf,
    pub chamber: String,
    pub banned_parties: Vec<String>,
    pub validation: ValidationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output: PathBuf::from("data/person_policy_links.json"),
            chamber: "commons".to_string(),
            banned_parties: DEFAULT_BANNED_PARTIES.iter().map(|p| p.to_string()).collect(),
            validation: ValidationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Links checked by `validate` when not checking all
    pub sample_size: usize,
    pub tolerance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            sample_size: 50,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}
