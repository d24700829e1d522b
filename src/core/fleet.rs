//! Rebuilds a fleet of valid pallets from raw persisted records.
//!
//! Invalid input never aborts a load. A pallet record with bad dimensions is
//! dropped together with its boxes, a bad or oversized box is dropped on its
//! own, and a pallet whose weight, volume or expiry cannot be evaluated after
//! assembly is dropped as a whole. Box entries the source could not decode
//! are dropped at their own stage. Every drop is recorded in a
//! [`DiscardReport`].

use crate::domain::error::{PackagingError, PackagingResult};
use crate::domain::model::{RawBox, RawBoxEntry, RawPallet};
use crate::domain::packaging::{Package, PackageBox, Pallet};
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// How many pallets [`Fleet::freshest_by_volume`] returns at most.
pub const FRESHEST_PALLET_COUNT: usize = 3;

/// A committed pallet together with its metrics, evaluated once at commit.
#[derive(Debug, Clone)]
pub struct FleetEntry {
    pallet: Pallet,
    weight: f64,
    volume: f64,
    expire_date: NaiveDateTime,
}

impl FleetEntry {
    fn evaluate(pallet: Pallet) -> PackagingResult<Self> {
        let weight = pallet.weight()?;
        let volume = pallet.volume()?;
        let expire_date = pallet.expire_date()?;

        Ok(Self {
            pallet,
            weight,
            volume,
            expire_date,
        })
    }

    pub fn pallet(&self) -> &Pallet {
        &self.pallet
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn expire_date(&self) -> NaiveDateTime {
        self.expire_date
    }
}

/// Pallets sharing one expiry date, lightest first.
#[derive(Debug, Clone)]
pub struct ExpiryGroup<'a> {
    pub expire_date: NaiveDateTime,
    pub pallets: Vec<&'a FleetEntry>,
}

/// The committed, query-safe pallets of one load, in source order.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    entries: Vec<FleetEntry>,
}

impl Fleet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FleetEntry> {
        self.entries.iter()
    }

    /// Groups pallets by expiry date. Groups are ordered by ascending date,
    /// pallets inside a group by ascending weight.
    pub fn group_by_expiry(&self) -> Vec<ExpiryGroup<'_>> {
        let mut sorted: Vec<&FleetEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| {
            a.expire_date
                .cmp(&b.expire_date)
                .then(a.weight.total_cmp(&b.weight))
        });

        let mut groups: Vec<ExpiryGroup<'_>> = Vec::new();
        for entry in sorted {
            match groups.last_mut() {
                Some(group) if group.expire_date == entry.expire_date => group.pallets.push(entry),
                _ => groups.push(ExpiryGroup {
                    expire_date: entry.expire_date,
                    pallets: vec![entry],
                }),
            }
        }
        groups
    }

    /// The [`FRESHEST_PALLET_COUNT`] pallets expiring last (earlier source
    /// position wins ties), ordered by ascending volume.
    pub fn freshest_by_volume(&self) -> Vec<&FleetEntry> {
        let mut sorted: Vec<&FleetEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.expire_date.cmp(&a.expire_date));
        sorted.truncate(FRESHEST_PALLET_COUNT);
        sorted.sort_by(|a, b| a.volume.total_cmp(&b.volume));
        sorted
    }
}

/// Which record was dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscardedRecord {
    Pallet {
        pallet_id: u32,
    },
    Box {
        pallet_id: u32,
        /// `None` when the stored entry was null or its id unreadable.
        box_id: Option<u32>,
        /// Index of the entry within the pallet's raw box list.
        position: usize,
    },
}

/// Reconstruction step that rejected the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardStage {
    Decoding,
    PalletConstruction,
    BoxConstruction,
    BoxPlacement,
    PalletValidation,
}

/// Why a record was dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiscardReason {
    #[error(transparent)]
    Packaging(#[from] PackagingError),

    #[error("undecodable entry: {0}")]
    Decoding(String),
}

impl DiscardReason {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Packaging(e) => e.kind(),
            Self::Decoding(_) => "decoding",
        }
    }
}

impl PartialEq<PackagingError> for DiscardReason {
    fn eq(&self, other: &PackagingError) -> bool {
        matches!(self, Self::Packaging(e) if e == other)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discard {
    pub record: DiscardedRecord,
    pub stage: DiscardStage,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: DiscardReason,
}

fn serialize_reason<S: Serializer>(reason: &DiscardReason, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&reason.to_string())
}

/// Everything dropped during one reconstruction, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscardReport {
    discards: Vec<Discard>,
}

impl DiscardReport {
    pub fn len(&self) -> usize {
        self.discards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Discard> {
        self.discards.iter()
    }

    pub fn pallets_discarded(&self) -> usize {
        self.discards
            .iter()
            .filter(|d| matches!(d.record, DiscardedRecord::Pallet { .. }))
            .count()
    }

    pub fn boxes_discarded(&self) -> usize {
        self.len() - self.pallets_discarded()
    }

    fn push(&mut self, record: DiscardedRecord, stage: DiscardStage, reason: impl Into<DiscardReason>) {
        let reason = reason.into();
        tracing::debug!(?record, ?stage, "Discarding record: {}", reason);
        self.discards.push(Discard {
            record,
            stage,
            reason,
        });
    }
}

/// Result of one reconstruction.
#[derive(Debug, Clone, Default)]
pub struct Reconstruction {
    pub fleet: Fleet,
    pub discards: DiscardReport,
}

/// Turns raw records into a [`Fleet`]. Create one per load.
#[derive(Debug, Default)]
pub struct FleetReconstructor {
    fleet: Fleet,
    discards: DiscardReport,
}

impl FleetReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconstruct(mut self, records: &[RawPallet]) -> Reconstruction {
        for record in records {
            self.process_pallet(record);
        }

        if self.discards.is_empty() {
            tracing::info!(
                "Reconstructed {} pallets from {} records",
                self.fleet.len(),
                records.len()
            );
        } else {
            tracing::warn!(
                "Reconstructed {} pallets from {} records; discarded {} pallets and {} boxes",
                self.fleet.len(),
                records.len(),
                self.discards.pallets_discarded(),
                self.discards.boxes_discarded()
            );
        }

        Reconstruction {
            fleet: self.fleet,
            discards: self.discards,
        }
    }

    fn process_pallet(&mut self, record: &RawPallet) {
        let mut pallet = match Pallet::try_from(record) {
            Ok(pallet) => pallet,
            Err(e) => {
                self.discards.push(
                    DiscardedRecord::Pallet {
                        pallet_id: record.id,
                    },
                    DiscardStage::PalletConstruction,
                    e,
                );
                return;
            }
        };

        for (position, entry) in record.boxes.iter().enumerate() {
            self.place_box(&mut pallet, record.id, position, entry);
        }

        self.commit_if_valid(pallet, record.id);
    }

    fn place_box(&mut self, pallet: &mut Pallet, pallet_id: u32, position: usize, entry: &RawBoxEntry) {
        let discarded = |box_id| DiscardedRecord::Box {
            pallet_id,
            box_id,
            position,
        };

        let raw: Option<&RawBox> = match entry {
            RawBoxEntry::Present(raw) => Some(raw),
            RawBoxEntry::Null => None,
            RawBoxEntry::Undecodable { id, message } => {
                self.discards.push(
                    discarded(*id),
                    DiscardStage::Decoding,
                    DiscardReason::Decoding(message.clone()),
                );
                return;
            }
        };

        let item = match raw.map(PackageBox::try_from).transpose() {
            Ok(item) => item,
            Err(e) => {
                self.discards.push(
                    discarded(raw.map(|r| r.id)),
                    DiscardStage::BoxConstruction,
                    e,
                );
                return;
            }
        };

        if let Err(e) = pallet.add_optional_box(item) {
            self.discards
                .push(discarded(raw.map(|r| r.id)), DiscardStage::BoxPlacement, e);
        }
    }

    fn commit_if_valid(&mut self, pallet: Pallet, pallet_id: u32) {
        match FleetEntry::evaluate(pallet) {
            Ok(entry) => self.fleet.entries.push(entry),
            Err(e) => self.discards.push(
                DiscardedRecord::Pallet { pallet_id },
                DiscardStage::PalletValidation,
                e,
            ),
        }
    }
}
