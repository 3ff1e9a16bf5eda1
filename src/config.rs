use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults::*;
use crate::error::ConfigError;
use crate::selection::SamplingPolicy;
use crate::species::TypeMap;

fn default_input_dir() -> PathBuf {
    PathBuf::from(INPUT_DIR)
}
fn default_output() -> PathBuf {
    PathBuf::from(OUTPUT_FILE)
}
fn default_name() -> String {
    String::from(DATASET_NAME)
}
fn default_suffix() -> String {
    String::from(DUMP_SUFFIX)
}
fn default_type_column() -> usize {
    TYPE_COLUMN
}
fn default_position_column() -> usize {
    POSITION_COLUMN
}
fn default_force_column() -> usize {
    FORCE_COLUMN
}
fn default_energy_column() -> usize {
    ENERGY_COLUMN
}

/// Which 0-based, whitespace-delimited columns of an ATOMS line hold which quantity.
///
/// The layout is a fixed contract with the dump writer. It is not inferred from the
/// `ITEM: ATOMS` header. Positions and forces occupy three consecutive columns starting at the
/// given index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomLayout {
    #[serde(default = "default_type_column")]
    pub type_column: usize,
    #[serde(default = "default_position_column")]
    pub position_column: usize,
    #[serde(default = "default_force_column")]
    pub force_column: usize,
    #[serde(default = "default_energy_column")]
    pub energy_column: usize,
}

impl AtomLayout {
    /// The minimum number of fields an ATOMS line must have under this layout.
    pub fn min_fields(&self) -> usize {
        [
            self.type_column + 1,
            self.position_column + 3,
            self.force_column + 3,
            self.energy_column + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
    }
}

impl Default for AtomLayout {
    fn default() -> Self {
        Self {
            type_column: TYPE_COLUMN,
            position_column: POSITION_COLUMN,
            force_column: FORCE_COLUMN,
            energy_column: ENERGY_COLUMN,
        }
    }
}

/// What a batch run does when a single file turns out to be malformed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Fail the whole run. Nothing is written.
    #[default]
    Abort,
    /// Report the file and leave its frames out of the output.
    Skip,
}

/// The settings for a run. Resolved once, before any file is read, and shared read-only by all
/// workers afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Value of the `name` key written into every block.
    #[serde(default = "default_name")]
    pub name: String,
    /// Files below `input_dir` ending in this suffix are treated as dumps.
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default)]
    pub on_error: ErrorPolicy,
    /// Number of worker threads. Uses the available parallelism when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    #[serde(default)]
    pub sampling: SamplingPolicy,
    #[serde(default)]
    pub type_map: TypeMap,
    #[serde(default)]
    pub layout: AtomLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output: default_output(),
            name: default_name(),
            suffix: default_suffix(),
            on_error: ErrorPolicy::default(),
            jobs: None,
            sampling: SamplingPolicy::default(),
            type_map: TypeMap::default(),
            layout: AtomLayout::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from toml. Missing keys take their default values.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read the configuration file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Load the configuration.
    ///
    /// An explicitly given file must exist. Otherwise [`CONFIG_FILE_NAME`] in the working
    /// directory is used if it is present, and the defaults if it is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(CONFIG_FILE_NAME);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

/// Parse a `TOKEN=SPECIES` pair as given on the command line.
pub fn parse_type_mapping(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once('=') {
        Some((token, species)) if !token.trim().is_empty() && !species.trim().is_empty() => {
            Ok((token.trim().to_string(), species.trim().to_string()))
        }
        _ => Err(ConfigError::InvalidTypeMapping(s.to_string())),
    }
}
