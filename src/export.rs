//! Writers for the assignment results.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::ingest::LISTING_SEPARATOR;
use crate::model::{Asset, AssignmentReport, Rejected};

pub const MATCHED_FILE: &str = "matched.csv";
pub const UNMATCHED_FILE: &str = "unmatched.csv";

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Create directory {:?}", parent))?;
    }
    Ok(())
}

fn csv_writer(path: &Path) -> Result<csv::Writer<fs::File>> {
    ensure_parent(path)?;
    csv::WriterBuilder::new()
        .has_headers(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_path(path)
        .with_context(|| format!("Open output CSV {:?}", path))
}

/// One row per matched person.
pub fn write_matched_csv(path: &Path, report: &AssignmentReport) -> Result<()> {
    let mut writer = csv_writer(path)?;
    writer.write_record(["display_name", "external_id", "asset_id", "asset_display_name"])?;
    for pair in &report.matched {
        writer.write_record([
            pair.person.display_name(),
            pair.person.external_id(),
            pair.asset.asset_id(),
            pair.asset.display_name(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Unclaimed photo names and unmatched people, tagged by kind. People rows
/// carry the roster display name next to the id.
pub fn write_unmatched_csv(path: &Path, report: &AssignmentReport) -> Result<()> {
    let mut writer = csv_writer(path)?;
    writer.write_record(["kind", "value", "display_name"])?;
    for name in &report.unmatched_assets {
        writer.write_record(["asset", name.as_str(), ""])?;
    }
    for person in &report.unmatched_roster {
        writer.write_record(["person", person.external_id(), person.display_name()])?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct Counts {
    matched: usize,
    unmatched_people: usize,
    unmatched_assets: usize,
    slots: usize,
    rejected_people: usize,
    rejected_assets: usize,
    match_rate: f64,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    counts: Counts,
    #[serde(flatten)]
    report: &'a AssignmentReport,
    rejected_people: &'a [Rejected],
    rejected_assets: &'a [Rejected],
}

/// Full report as pretty JSON, including records refused at intake.
pub fn write_json_report(
    path: &Path,
    report: &AssignmentReport,
    rejected_people: &[Rejected],
    rejected_assets: &[Rejected],
) -> Result<()> {
    let json = JsonReport {
        generated_at: Utc::now(),
        counts: Counts {
            matched: report.matched_count(),
            unmatched_people: report.unmatched_people_count(),
            unmatched_assets: report.unmatched_asset_count(),
            slots: report.slot_count(),
            rejected_people: rejected_people.len(),
            rejected_assets: rejected_assets.len(),
            match_rate: report.match_rate(),
        },
        report,
        rejected_people,
        rejected_assets,
    };
    ensure_parent(path)?;
    let body = serde_json::to_string_pretty(&json)?;
    fs::write(path, body).with_context(|| format!("Write report {:?}", path))?;
    Ok(())
}

/// Cache assets in the `normalized:::display:::id` listing format.
pub fn write_asset_listing(path: &Path, assets: &[Asset]) -> Result<()> {
    ensure_parent(path)?;
    let mut file = fs::File::create(path).with_context(|| format!("Create listing {:?}", path))?;
    for asset in assets {
        writeln!(
            file,
            "{}{sep}{}{sep}{}",
            asset.normalized_name(),
            asset.display_name(),
            asset.asset_id(),
            sep = LISTING_SEPARATOR
        )?;
    }
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::{assign, MatchConfig};
    use crate::ingest::read_asset_listing;
    use crate::model::{Person, RecordError};

    fn sample_report() -> AssignmentReport {
        let assets = vec![
            Asset::new("Ivanov Ivan.jpg", "f1").unwrap(),
            Asset::new("Stray Photo", "f2").unwrap(),
        ];
        let people = vec![
            Person::new("Ivan Ivanov", "1").unwrap(),
            Person::new("Qqq", "2").unwrap(),
        ];
        let config = MatchConfig {
            previous_name_fallback: false,
            ..MatchConfig::default()
        };
        assign(people, &assets, &config)
    }

    #[test]
    fn writes_matched_and_unmatched_csv() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let matched = dir.path().join("out").join(MATCHED_FILE);
        let unmatched = dir.path().join("out").join(UNMATCHED_FILE);
        write_matched_csv(&matched, &report).unwrap();
        write_unmatched_csv(&unmatched, &report).unwrap();

        assert_eq!(
            fs::read_to_string(&matched).unwrap(),
            "display_name,external_id,asset_id,asset_display_name\nIvan Ivanov,1,f1,Ivanov Ivan.jpg\n"
        );
        assert_eq!(
            fs::read_to_string(&unmatched).unwrap(),
            "kind,value,display_name\nasset,stray photo,\nperson,2,Qqq\n"
        );
    }

    #[test]
    fn json_report_carries_counts_and_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let rejected = vec![Rejected {
            line: 3,
            error: RecordError::EmptyIdentifier,
        }];
        write_json_report(&path, &sample_report(), &rejected, &[]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["counts"]["matched"], 1);
        assert_eq!(value["counts"]["unmatched_people"], 1);
        assert_eq!(value["counts"]["rejected_people"], 1);
        assert_eq!(value["counts"]["match_rate"], 0.5);
        assert_eq!(value["unmatched_assets"][0], "stray photo");
        assert_eq!(value["unmatched_roster"][0]["display_name"], "Qqq");
        assert_eq!(value["matched"][0]["person"]["assigned_asset_id"], "f1");
        assert_eq!(value["rejected_people"][0]["error"]["kind"], "empty_identifier");
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn listing_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.txt");
        let assets = vec![
            Asset::new("Серік Болат.jpg", "id-1").unwrap(),
            Asset::new("Aigerim", "id-2").unwrap(),
        ];
        write_asset_listing(&path, &assets).unwrap();
        let file = fs::File::open(&path).unwrap();
        let intake = read_asset_listing(std::io::BufReader::new(file)).unwrap();
        assert_eq!(intake.accepted, assets);
    }
}
