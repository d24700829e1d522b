use crate::core::fleet::FleetReconstructor;
use crate::core::report;
use crate::core::{ConfigProvider, Pipeline, RawPallet, RecordSource, Storage, TransformResult};
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const EXPIRY_GROUPS_FILE: &str = "expiry_groups.csv";
pub const FRESHEST_PALLETS_FILE: &str = "freshest_pallets.csv";
pub const DISCARDED_FILE: &str = "discarded.json";

pub struct WarehousePipeline<S: Storage, R: RecordSource, C: ConfigProvider> {
    storage: S,
    source: R,
    config: C,
}

impl<S: Storage, R: RecordSource, C: ConfigProvider> WarehousePipeline<S, R, C> {
    pub fn new(storage: S, source: R, config: C) -> Self {
        Self {
            storage,
            source,
            config,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, R: RecordSource, C: ConfigProvider> Pipeline for WarehousePipeline<S, R, C> {
    async fn extract(&self) -> Result<Vec<RawPallet>> {
        tracing::debug!(
            "Reading {} records from: {}",
            self.config.source_format(),
            self.config.source_path()
        );
        let records = self.source.fetch_pallets().await?;

        if records.is_empty() {
            tracing::warn!("Source returned no pallet records");
        }

        Ok(records)
    }

    async fn transform(&self, data: Vec<RawPallet>) -> Result<TransformResult> {
        let reconstruction = FleetReconstructor::new().reconstruct(&data);
        let fleet = &reconstruction.fleet;

        let groups = fleet.group_by_expiry();
        let freshest = fleet.freshest_by_volume();
        tracing::debug!(
            "Built {} expiry groups and {} freshest pallets",
            groups.len(),
            freshest.len()
        );

        Ok(TransformResult {
            committed_pallets: fleet.len(),
            discarded_records: reconstruction.discards.len(),
            expiry_groups_csv: report::expiry_groups_csv(&groups)?,
            freshest_pallets_csv: report::freshest_pallets_csv(&freshest)?,
            console_report: report::console_report(&groups, &freshest),
            discarded_json: report::discarded_json(&reconstruction.discards)?,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let archive_name = self.config.archive_name();
        let output_path = format!("{}/{}", self.config.output_path(), archive_name);

        if self.config.print_console() {
            println!("{}", result.console_report);
        }

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>(EXPIRY_GROUPS_FILE, FileOptions::default())?;
            zip.write_all(result.expiry_groups_csv.as_bytes())?;

            zip.start_file::<_, ()>(FRESHEST_PALLETS_FILE, FileOptions::default())?;
            zip.write_all(result.freshest_pallets_csv.as_bytes())?;

            if let Some(discarded) = &result.discarded_json {
                zip.start_file::<_, ()>(DISCARDED_FILE, FileOptions::default())?;
                zip.write_all(discarded.as_bytes())?;
            }

            zip.finish()?.into_inner()
        };

        tracing::debug!("Writing report archive ({} bytes) to storage", zip_data.len());
        self.storage.write_file(archive_name, &zip_data).await?;

        Ok(output_path)
    }
}
