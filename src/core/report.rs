//! Renders the fleet query views as CSV tables and as console text.

use crate::core::fleet::{DiscardReport, ExpiryGroup, FleetEntry};
use crate::domain::packaging::Package;
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

const CSV_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const CONSOLE_DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Serialize)]
struct ExpiryGroupRow {
    expire_date: String,
    pallet_id: Option<u32>,
    weight: f64,
    volume: f64,
    box_count: usize,
}

#[derive(Debug, Serialize)]
struct FreshestPalletRow {
    rank: usize,
    pallet_id: Option<u32>,
    expire_date: String,
    volume: f64,
    weight: f64,
}

fn csv_date(date: NaiveDateTime) -> String {
    date.format(CSV_DATE_FORMAT).to_string()
}

fn write_rows<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// One row per pallet, in group order.
pub fn expiry_groups_csv(groups: &[ExpiryGroup<'_>]) -> Result<String> {
    if groups.is_empty() {
        return Ok("expire_date,pallet_id,weight,volume,box_count\n".to_string());
    }

    write_rows(groups.iter().flat_map(|group| {
        group.pallets.iter().map(move |entry| ExpiryGroupRow {
            expire_date: csv_date(group.expire_date),
            pallet_id: entry.pallet().id(),
            weight: entry.weight(),
            volume: entry.volume(),
            box_count: entry.pallet().boxes().len(),
        })
    }))
}

pub fn freshest_pallets_csv(pallets: &[&FleetEntry]) -> Result<String> {
    if pallets.is_empty() {
        return Ok("rank,pallet_id,expire_date,volume,weight\n".to_string());
    }

    write_rows(pallets.iter().enumerate().map(|(i, entry)| FreshestPalletRow {
        rank: i + 1,
        pallet_id: entry.pallet().id(),
        expire_date: csv_date(entry.expire_date()),
        volume: entry.volume(),
        weight: entry.weight(),
    }))
}

/// `None` when nothing was discarded.
pub fn discarded_json(discards: &DiscardReport) -> Result<Option<String>> {
    if discards.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string_pretty(discards)?))
}

/// Console rendering of both views.
struct ConsoleReport<'a> {
    groups: &'a [ExpiryGroup<'a>],
    freshest: &'a [&'a FleetEntry],
}

impl fmt::Display for ConsoleReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pallets grouped by expiry date\n")?;
        for group in self.groups {
            writeln!(f, "Date: {}", group.expire_date.format(CONSOLE_DATE_FORMAT))?;
            for entry in &group.pallets {
                writeln!(f, "\tweight: {}", entry.weight())?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Freshest pallets by volume\n")?;
        for entry in self.freshest {
            writeln!(
                f,
                "date: {} volume: {}",
                entry.expire_date().format(CONSOLE_DATE_FORMAT),
                entry.volume()
            )?;
        }
        Ok(())
    }
}

pub fn console_report(groups: &[ExpiryGroup<'_>], freshest: &[&FleetEntry]) -> String {
    ConsoleReport { groups, freshest }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fleet::FleetReconstructor;
    use crate::domain::model::{RawBox, RawBoxEntry, RawPallet};
    use chrono::NaiveDate;

    fn records() -> Vec<RawPallet> {
        let produced = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        vec![RawPallet {
            id: 4,
            width: 2.0,
            height: 2.0,
            depth: 2.0,
            boxes: vec![RawBoxEntry::Present(RawBox {
                id: 40,
                pallet_id: Some(4),
                width: 1.0,
                height: 1.0,
                depth: 1.0,
                weight: 7.0,
                production_date: produced,
            })],
        }]
    }

    #[test]
    fn test_expiry_groups_csv() {
        let result = FleetReconstructor::new().reconstruct(&records());
        let csv = expiry_groups_csv(&result.fleet.group_by_expiry()).unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "expire_date,pallet_id,weight,volume,box_count");
        assert_eq!(lines[1], "2024-06-23T00:00:00,4,37.0,9.0,1");
    }

    #[test]
    fn test_freshest_pallets_csv() {
        let result = FleetReconstructor::new().reconstruct(&records());
        let csv = freshest_pallets_csv(&result.fleet.freshest_by_volume()).unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "rank,pallet_id,expire_date,volume,weight");
        assert_eq!(lines[1], "1,4,2024-06-23T00:00:00,9.0,37.0");
    }

    #[test]
    fn test_empty_views_keep_headers() {
        assert_eq!(
            expiry_groups_csv(&[]).unwrap(),
            "expire_date,pallet_id,weight,volume,box_count\n"
        );
        assert_eq!(
            freshest_pallets_csv(&[]).unwrap(),
            "rank,pallet_id,expire_date,volume,weight\n"
        );
        assert!(discarded_json(&DiscardReport::default()).unwrap().is_none());
    }

    #[test]
    fn test_console_report() {
        let result = FleetReconstructor::new().reconstruct(&records());
        let groups = result.fleet.group_by_expiry();
        let freshest = result.fleet.freshest_by_volume();

        let text = console_report(&groups, &freshest);

        assert!(text.contains("Date: 23.06.2024"));
        assert!(text.contains("\tweight: 37"));
        assert!(text.contains("date: 23.06.2024 volume: 9"));
    }

    #[test]
    fn test_console_report_layout() {
        let result = FleetReconstructor::new().reconstruct(&records());
        let groups = result.fleet.group_by_expiry();
        let freshest = result.fleet.freshest_by_volume();

        assert_eq!(
            console_report(&groups, &freshest),
            "Pallets grouped by expiry date\n\n\
Date: 23.06.2024\n\
\tweight: 37\n\n\
Freshest pallets by volume\n\n\
date: 23.06.2024 volume: 9\n"
        );
        assert_eq!(
            console_report(&[], &[]),
            "Pallets grouped by expiry date\n\nFreshest pallets by volume\n\n"
        );
    }
}
