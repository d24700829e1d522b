use crate::core::{ConfigProvider, SourceFormat};
use crate::domain::ports::{DEFAULT_BOXES_FILE, DEFAULT_PALLETS_FILE};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ARCHIVE_NAME: &str = "fleet_report.zip";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub r#type: SourceFormat,
    /// JSON file, or directory holding the CSV tables.
    pub path: Option<String>,
    pub pallets_file: Option<String>,
    pub boxes_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub archive_name: Option<String>,
    pub print_console: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses the configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// Checks required fields, paths and file extensions.
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;

        let source_path = validation::validate_required_field("source.path", &self.source.path)?;
        validation::validate_path("source.path", source_path)?;

        match self.source.r#type {
            SourceFormat::Json => {
                validation::validate_file_extension("source.path", source_path, &["json"])?
            }
            SourceFormat::Csv => {
                validation::validate_file_extension("source.pallets_file", self.pallets_file(), &["csv"])?;
                validation::validate_file_extension("source.boxes_file", self.boxes_file(), &["csv"])?;
            }
        }

        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_file_extension("load.archive_name", self.archive_name(), &["zip"])?;

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// Whether `[monitoring] log_level` asks for debug output.
    pub fn verbose_logging(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_level.as_deref())
            .map(|level| level.eq_ignore_ascii_case("debug") || level.eq_ignore_ascii_case("trace"))
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn source_format(&self) -> SourceFormat {
        self.source.r#type
    }

    fn source_path(&self) -> &str {
        self.source.path.as_deref().unwrap_or_default()
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn archive_name(&self) -> &str {
        self.load.archive_name.as_deref().unwrap_or(DEFAULT_ARCHIVE_NAME)
    }

    fn print_console(&self) -> bool {
        self.load.print_console.unwrap_or(true)
    }

    fn pallets_file(&self) -> &str {
        self.source.pallets_file.as_deref().unwrap_or(DEFAULT_PALLETS_FILE)
    }

    fn boxes_file(&self) -> &str {
        self.source.boxes_file.as_deref().unwrap_or(DEFAULT_BOXES_FILE)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
