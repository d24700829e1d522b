pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::TomlConfig;

pub use crate::adapters::{FileRecordSource, LocalStorage};
pub use crate::core::etl::EtlEngine;
pub use crate::core::fleet::{
    Discard, DiscardReason, DiscardReport, DiscardStage, DiscardedRecord, ExpiryGroup, Fleet,
    FleetEntry, FleetReconstructor, Reconstruction,
};
pub use crate::core::pipeline::WarehousePipeline;
pub use crate::domain::error::PackagingError;
pub use crate::domain::model::{RawBox, RawBoxEntry, RawPallet};
pub use crate::domain::packaging::{Dimensions, Package, PackageBox, Pallet};
pub use crate::utils::error::{EtlError, Result};
