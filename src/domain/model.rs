use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A pallet row as persisted, with its boxes already joined in.
///
/// Nothing here is validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPallet {
    pub id: u32,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub boxes: Vec<RawBoxEntry>,
}

/// One entry of a pallet's box list as the store returned it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBoxEntry {
    Present(RawBox),
    /// The store returned the entry as null.
    Null,
    /// The entry exists but could not be decoded. `id` is kept when the
    /// id field itself was readable.
    Undecodable { id: Option<u32>, message: String },
}

impl RawBoxEntry {
    pub fn id(&self) -> Option<u32> {
        match self {
            Self::Present(raw) => Some(raw.id),
            Self::Null => None,
            Self::Undecodable { id, .. } => *id,
        }
    }
}

impl From<RawBox> for RawBoxEntry {
    fn from(raw: RawBox) -> Self {
        Self::Present(raw)
    }
}

/// A box row as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
    pub id: u32,
    #[serde(default)]
    pub pallet_id: Option<u32>,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub weight: f64,
    pub production_date: NaiveDateTime,
}

/// Row of the pallets table in the relational CSV layout.
#[derive(Debug, Clone, Deserialize)]
pub struct PalletRow {
    pub id: u32,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl From<PalletRow> for RawPallet {
    fn from(row: PalletRow) -> Self {
        Self {
            id: row.id,
            width: row.width,
            height: row.height,
            depth: row.depth,
            boxes: Vec::new(),
        }
    }
}

/// Output of the transform stage: both query views already rendered, plus
/// the discard diagnostics.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub committed_pallets: usize,
    pub discarded_records: usize,
    pub expiry_groups_csv: String,
    pub freshest_pallets_csv: String,
    pub console_report: String,
    pub discarded_json: Option<String>,
}
