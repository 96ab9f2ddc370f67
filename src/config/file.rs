use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

struct Defaults {}

impl Defaults {
    fn bogon_marker() -> String {
        String::from("BOGON")
    }
}

/// Settings (toml) representation of the `[validate]` table
#[derive(Clone, Debug, Deserialize)]
pub(super) struct ValidateSpec {
    // Case-sensitive text whose presence counts as bogon filtering
    #[serde(default = "Defaults::bogon_marker")]
    pub(super) bogon_marker: String,
}

impl Default for ValidateSpec {
    fn default() -> Self {
        Self {
            bogon_marker: Defaults::bogon_marker(),
        }
    }
}

/// Settings (toml) representation of the `[fix]` table
#[derive(Clone, Debug, Default, Deserialize)]
pub(super) struct FixSpec {
    // Parent directory for timestamped backups (defaults to the temp dir)
    pub(super) backup_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SettingsSpec {
    #[serde(default)]
    pub(super) validate: ValidateSpec,
    #[serde(default)]
    pub(super) fix: FixSpec,
}

impl SettingsSpec {
    pub(super) fn from_file(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).map_err(|err| Error::on_read(path.to_path_buf(), err))?;
        Self::parse(path, &contents)
    }

    pub(super) fn parse(path: &Path, contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|source| Error::Settings {
            path: path.to_path_buf(),
            source,
        })
    }
}
