//! Record sources reading persisted pallets through a [`Storage`].
//!
//! Decoding is lenient per record: a pallet entry that cannot be decoded is
//! skipped with a warning, and a box entry that cannot be decoded is passed
//! on as [`RawBoxEntry::Undecodable`] under its pallet so the reconstructor
//! reports it. Boxes with no usable pallet id are only logged.

use crate::core::{
    ConfigProvider, RawBox, RawBoxEntry, RawPallet, RecordSource, SourceFormat, Storage,
};
use crate::domain::model::PalletRow;
use crate::utils::error::{EtlError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct JsonPallet {
    id: u32,
    width: f64,
    height: f64,
    depth: f64,
    #[serde(default)]
    boxes: Option<Vec<serde_json::Value>>,
}

/// A JSON array of pallets, each carrying its `boxes`.
#[derive(Debug, Clone)]
pub struct JsonRecordSource<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> JsonRecordSource<S> {
    pub fn new(storage: S, path: String) -> Self {
        Self { storage, path }
    }
}

pub fn decode_json_pallets(data: &[u8]) -> Result<Vec<RawPallet>> {
    let document: serde_json::Value = serde_json::from_slice(data)?;
    let serde_json::Value::Array(items) = document else {
        return Err(EtlError::SourceError {
            message: "expected a JSON array of pallets".to_string(),
        });
    };

    let mut pallets = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let pallet: JsonPallet = match serde_json::from_value(item) {
            Ok(pallet) => pallet,
            Err(e) => {
                tracing::warn!("Skipping undecodable pallet entry #{}: {}", index, e);
                continue;
            }
        };

        let boxes = pallet
            .boxes
            .unwrap_or_default()
            .into_iter()
            .map(|value| decode_json_box(pallet.id, value))
            .collect();

        pallets.push(RawPallet {
            id: pallet.id,
            width: pallet.width,
            height: pallet.height,
            depth: pallet.depth,
            boxes,
        });
    }

    Ok(pallets)
}

fn decode_json_box(pallet_id: u32, value: serde_json::Value) -> RawBoxEntry {
    if value.is_null() {
        return RawBoxEntry::Null;
    }

    let id = value
        .get("id")
        .and_then(serde_json::Value::as_u64)
        .and_then(|id| u32::try_from(id).ok());

    match serde_json::from_value::<RawBox>(value) {
        Ok(mut raw) => {
            raw.pallet_id.get_or_insert(pallet_id);
            RawBoxEntry::Present(raw)
        }
        Err(e) => {
            tracing::warn!("Undecodable box entry {:?} on pallet {}: {}", id, pallet_id, e);
            RawBoxEntry::Undecodable {
                id,
                message: e.to_string(),
            }
        }
    }
}

impl<S: Storage> RecordSource for JsonRecordSource<S> {
    async fn fetch_pallets(&self) -> Result<Vec<RawPallet>> {
        let data = self.storage.read_file(&self.path).await?;
        decode_json_pallets(&data)
    }
}

/// Relational layout: a pallets table and a boxes table keyed by
/// `pallet_id`.
#[derive(Debug, Clone)]
pub struct CsvRecordSource<S: Storage> {
    storage: S,
    pallets_path: String,
    boxes_path: String,
}

impl<S: Storage> CsvRecordSource<S> {
    pub fn new(storage: S, pallets_path: String, boxes_path: String) -> Self {
        Self {
            storage,
            pallets_path,
            boxes_path,
        }
    }
}

fn csv_reader(data: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data)
}

fn read_pallet_rows(data: &[u8]) -> Vec<PalletRow> {
    csv_reader(data)
        .deserialize::<PalletRow>()
        .enumerate()
        .filter_map(|(index, row)| match row {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::warn!("Skipping undecodable row #{} of pallets: {}", index + 1, e);
                None
            }
        })
        .collect()
}

/// Decodes box rows, keeping the `pallet_id` of rows that fail to decode
/// whenever that column alone is readable.
fn read_box_rows(data: &[u8]) -> Vec<(Option<u32>, RawBoxEntry)> {
    let mut reader = csv_reader(data);
    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            tracing::warn!("Skipping boxes table without a readable header: {}", e);
            return Vec::new();
        }
    };
    let column = |name: &str| headers.iter().position(|header| header == name);
    let (id_column, pallet_column) = (column("id"), column("pallet_id"));

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping unreadable row #{} of boxes: {}", index + 1, e);
                continue;
            }
        };

        let row = match record.deserialize::<RawBox>(Some(&headers)) {
            Ok(raw) => (raw.pallet_id, RawBoxEntry::Present(raw)),
            Err(e) => {
                let read_id = |column: Option<usize>| {
                    column
                        .and_then(|c| record.get(c))
                        .and_then(|value| value.parse::<u32>().ok())
                };
                let id = read_id(id_column);
                tracing::warn!("Undecodable box row #{} (id {:?}): {}", index + 1, id, e);
                (
                    read_id(pallet_column),
                    RawBoxEntry::Undecodable {
                        id,
                        message: e.to_string(),
                    },
                )
            }
        };
        rows.push(row);
    }
    rows
}

/// Joins box rows onto pallet rows, keeping table order on both sides.
pub fn join_csv_tables(pallets_csv: &[u8], boxes_csv: &[u8]) -> Vec<RawPallet> {
    let mut pallets: Vec<RawPallet> = read_pallet_rows(pallets_csv)
        .into_iter()
        .map(RawPallet::from)
        .collect();

    let mut positions: HashMap<u32, usize> = HashMap::new();
    for (position, pallet) in pallets.iter().enumerate() {
        if positions.insert(pallet.id, position).is_some() {
            tracing::warn!("Duplicate pallet id {}; boxes attach to the last row", pallet.id);
        }
    }

    for (pallet_id, entry) in read_box_rows(boxes_csv) {
        match pallet_id.and_then(|id| positions.get(&id)) {
            Some(&position) => pallets[position].boxes.push(entry),
            None => tracing::warn!(
                "Ignoring box {:?} with unknown pallet id {:?}",
                entry.id(),
                pallet_id
            ),
        }
    }

    pallets
}

impl<S: Storage> RecordSource for CsvRecordSource<S> {
    async fn fetch_pallets(&self) -> Result<Vec<RawPallet>> {
        let pallets = self.storage.read_file(&self.pallets_path).await?;
        let boxes = self.storage.read_file(&self.boxes_path).await?;
        Ok(join_csv_tables(&pallets, &boxes))
    }
}

/// Source selected by configuration.
#[derive(Debug, Clone)]
pub enum FileRecordSource<S: Storage> {
    Json(JsonRecordSource<S>),
    Csv(CsvRecordSource<S>),
}

impl<S: Storage> FileRecordSource<S> {
    pub fn from_config<C: ConfigProvider>(storage: S, config: &C) -> Self {
        match config.source_format() {
            SourceFormat::Json => {
                Self::Json(JsonRecordSource::new(storage, config.source_path().to_string()))
            }
            SourceFormat::Csv => {
                let dir = Path::new(config.source_path());
                let table = |name: &str| dir.join(name).to_string_lossy().into_owned();
                Self::Csv(CsvRecordSource::new(
                    storage,
                    table(config.pallets_file()),
                    table(config.boxes_file()),
                ))
            }
        }
    }
}

impl<S: Storage> RecordSource for FileRecordSource<S> {
    async fn fetch_pallets(&self) -> Result<Vec<RawPallet>> {
        match self {
            Self::Json(source) => source.fetch_pallets().await,
            Self::Csv(source) => source.fetch_pallets().await,
        }
    }
}
