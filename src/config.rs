//! Configuration for lineage runs
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (lineage.toml)
//! - Environment variables (LINEAGE_*)
//!
//! ## Example config file (lineage.toml):
//! ```toml
//! [repository]
//! url = "https://github.com/example/engine.git"
//! clone_dir = ".lineage-repo"
//! tracked_path = "sdk/types/plan.go"
//! major = 3
//!
//! [generator]
//! program = "./scripts/reflect-schema.sh"
//! args = ["{version}"]
//!
//! [output]
//! dir = "schemas"
//! name = "plan"
//! validate = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LineageConfig {
    /// Source repository settings
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// External generator settings
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Output store settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Source repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Remote URL; omit to use an existing clone at `clone_dir`
    #[serde(default)]
    pub url: Option<String>,

    /// Where the bare clone lives
    #[serde(default = "default_clone_dir")]
    pub clone_dir: PathBuf,

    /// Repository-relative path of the tracked type definition
    #[serde(default)]
    pub tracked_path: Option<PathBuf>,

    /// Major version line to process
    #[serde(default = "default_major")]
    pub major: u64,
}

/// External generator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneratorConfig {
    /// Program to run once per unique version
    #[serde(default)]
    pub program: Option<String>,

    /// Arguments; `{version}` expands to the tag
    #[serde(default)]
    pub args: Vec<String>,
}

/// Output store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Store root directory
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Schema name; artifacts land under `<dir>/<name>/<tag>/`
    #[serde(default = "default_schema_name")]
    pub name: String,

    /// Compile-check flattened documents before storing them
    #[serde(default = "default_true")]
    pub validate: bool,
}

// Default value functions
fn default_clone_dir() -> PathBuf {
    PathBuf::from(".lineage-repo")
}

fn default_major() -> u64 {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_schema_name() -> String {
    "schema".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            url: None,
            clone_dir: default_clone_dir(),
            tracked_path: None,
            major: default_major(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            name: default_schema_name(),
            validate: true,
        }
    }
}

impl LineageConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, optionally forcing a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["lineage.toml", ".lineage.toml", "config/lineage.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "lineage") {
            let xdg_config = config_dir.config_dir().join("lineage.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("LINEAGE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
