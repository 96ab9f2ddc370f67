mod file;

use std::env;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;

/// Load tool settings from a TOML file
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let spec = file::SettingsSpec::from_file(path.as_ref())?;
    let settings = Settings::from_spec(spec);
    debug!("Using settings: {:?}", settings);
    Ok(settings)
}

#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub validate: ValidateSettings,
    pub fix: FixSettings,
}

#[derive(Clone, Debug)]
pub struct ValidateSettings {
    pub bogon_marker: String,
}

impl Default for ValidateSettings {
    fn default() -> Self {
        Self::from_spec(file::ValidateSpec::default())
    }
}

#[derive(Clone, Debug, Default)]
pub struct FixSettings {
    pub backup_dir: Option<PathBuf>,
}

impl FixSettings {
    /// Where timestamped backup directories are created
    pub fn backup_root(&self) -> PathBuf {
        self.backup_dir.clone().unwrap_or_else(env::temp_dir)
    }
}

impl Settings {
    fn from_spec(spec: file::SettingsSpec) -> Self {
        Self {
            validate: ValidateSettings::from_spec(spec.validate),
            fix: FixSettings {
                backup_dir: spec.fix.backup_dir,
            },
        }
    }
}

impl ValidateSettings {
    fn from_spec(spec: file::ValidateSpec) -> Self {
        Self {
            bogon_marker: spec.bogon_marker,
        }
    }
}
