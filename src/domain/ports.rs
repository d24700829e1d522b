use crate::domain::model::{RawPallet, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Where raw pallet records come from: the persistence collaborator.
pub trait RecordSource: Send + Sync {
    fn fetch_pallets(&self) -> impl std::future::Future<Output = Result<Vec<RawPallet>>> + Send;
}

/// Layout of the persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// One JSON document: an array of pallets with nested boxes.
    #[default]
    Json,
    /// Two CSV tables (`pallets.csv`, `boxes.csv`) joined on `pallet_id`.
    Csv,
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unsupported source format: {} (expected json or csv)", other)),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

pub const DEFAULT_PALLETS_FILE: &str = "pallets.csv";
pub const DEFAULT_BOXES_FILE: &str = "boxes.csv";

pub trait ConfigProvider: Send + Sync {
    fn source_format(&self) -> SourceFormat;
    /// JSON file for [`SourceFormat::Json`], directory holding both tables
    /// for [`SourceFormat::Csv`].
    fn source_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn archive_name(&self) -> &str;
    fn print_console(&self) -> bool;

    fn pallets_file(&self) -> &str {
        DEFAULT_PALLETS_FILE
    }

    fn boxes_file(&self) -> &str {
        DEFAULT_BOXES_FILE
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawPallet>>;
    async fn transform(&self, data: Vec<RawPallet>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
