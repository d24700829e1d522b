use crate::core::{ConfigProvider, SourceFormat};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "warehouse-etl")]
#[command(about = "Rebuilds a valid pallet fleet from stored records and reports it")]
pub struct CliConfig {
    /// JSON file, or directory holding pallets.csv and boxes.csv
    #[arg(long, default_value = "./data/pallets.json")]
    pub source_path: String,

    #[arg(long, default_value = "json")]
    pub source_format: SourceFormat,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "fleet_report.zip")]
    pub archive_name: String,

    #[arg(long, help = "Do not print the reports to stdout")]
    pub quiet: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn source_format(&self) -> SourceFormat {
        self.source_format
    }

    fn source_path(&self) -> &str {
        &self.source_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn archive_name(&self) -> &str {
        &self.archive_name
    }

    fn print_console(&self) -> bool {
        !self.quiet
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("source_path", &self.source_path)?;
        if self.source_format == SourceFormat::Json {
            validation::validate_file_extension("source_path", &self.source_path, &["json"])?;
        }
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_file_extension("archive_name", &self.archive_name, &["zip"])?;
        Ok(())
    }
}
