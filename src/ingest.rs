//! Readers for the roster export and the photo listing.
//!
//! Every reader returns an [`Intake`]: a bad row is rejected with its line
//! number and the rest of the file is still read. Only a source that cannot
//! be opened or has no header is an error.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::model::{Asset, Intake, Person, RecordError};

/// Field separator of the cached photo listing (`normalized:::display:::id`).
pub const LISTING_SEPARATOR: &str = ":::";

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    surname: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    patronymic: Option<String>,
    #[serde(default)]
    external_id: Option<String>,
}

impl RosterRow {
    /// Explicit display name, or `surname given_name patronymic`.
    fn display_name(&self) -> String {
        if let Some(name) = non_empty(&self.display_name) {
            return name.to_string();
        }
        [&self.surname, &self.given_name, &self.patronymic]
            .into_iter()
            .filter_map(non_empty)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Deserialize)]
struct AssetRow {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    asset_id: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Read a roster CSV with either a `display_name` column or
/// `surname`/`given_name`/`patronymic` columns, plus `external_id`.
pub fn read_roster<R: Read>(input: R) -> Result<Intake<Person>> {
    let rows = read_csv_rows::<RosterRow, _>(input)?;
    Ok(Intake::collect(rows.into_iter().map(|(line, row)| {
        let person = row.and_then(|row| {
            Person::new(
                &row.display_name(),
                non_empty(&row.external_id).unwrap_or_default(),
            )
        });
        (line, person)
    })))
}

pub fn read_roster_path(path: &Path) -> Result<Intake<Person>> {
    let file = File::open(path).with_context(|| format!("Open roster {:?}", path))?;
    read_roster(file).with_context(|| format!("Read roster {:?}", path))
}

/// Read a `display_name,asset_id` CSV.
pub fn read_assets_csv<R: Read>(input: R) -> Result<Intake<Asset>> {
    let rows = read_csv_rows::<AssetRow, _>(input)?;
    Ok(Intake::collect(rows.into_iter().map(|(line, row)| {
        let asset = row.and_then(|row| {
            Asset::new(
                non_empty(&row.display_name).unwrap_or_default(),
                non_empty(&row.asset_id).unwrap_or_default(),
            )
        });
        (line, asset)
    })))
}

/// Read the cached listing, one `normalized:::display:::id` per line.
///
/// The stored normalized field is ignored and recomputed from the display
/// name. Blank lines are skipped; a line that is not valid UTF-8 is
/// rejected on its own.
pub fn read_asset_listing<R: BufRead>(input: R) -> Result<Intake<Asset>> {
    let mut rows = Vec::new();
    for (idx, raw) in input.split(b'\n').enumerate() {
        let mut raw = raw.with_context(|| format!("Read listing line {}", idx + 1))?;
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        let parsed = match String::from_utf8(raw) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => parse_listing_line(&line),
            Err(err) => Err(RecordError::MalformedListingLine(
                String::from_utf8_lossy(err.as_bytes()).into_owned(),
            )),
        };
        rows.push((idx + 1, parsed));
    }
    Ok(Intake::collect(rows))
}

fn parse_listing_line(line: &str) -> Result<Asset, RecordError> {
    let parts: Vec<&str> = line.split(LISTING_SEPARATOR).collect();
    match parts.as_slice() {
        [_normalized, display, id] => Asset::new(display, id),
        _ => Err(RecordError::MalformedListingLine(line.to_string())),
    }
}

/// Read assets from `path`: `.csv` files as CSV, anything else as a listing.
pub fn read_assets_path(path: &Path) -> Result<Intake<Asset>> {
    let file = File::open(path).with_context(|| format!("Open assets {:?}", path))?;
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    let intake = if is_csv {
        read_assets_csv(file)
    } else {
        read_asset_listing(BufReader::new(file))
    };
    intake.with_context(|| format!("Read assets {:?}", path))
}

fn read_csv_rows<T, R>(input: R) -> Result<Vec<(usize, Result<T, RecordError>)>>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader.headers().context("Read CSV header")?.clone();
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // Header is line 1.
        let fallback_line = idx + 2;
        let row = match record {
            Ok(record) => {
                let line = record
                    .position()
                    .map(|pos| pos.line() as usize)
                    .unwrap_or(fallback_line);
                let parsed = record
                    .deserialize::<T>(Some(&headers))
                    .map_err(|err| RecordError::Csv(err.to_string()));
                (line, parsed)
            }
            Err(err) => {
                let line = err
                    .position()
                    .map(|pos| pos.line() as usize)
                    .unwrap_or(fallback_line);
                (line, Err(RecordError::Csv(err.to_string())))
            }
        };
        rows.push(row);
    }
    Ok(rows)
}
