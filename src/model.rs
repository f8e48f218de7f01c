//! Roster and photo records, validation errors and the assignment report.

use serde::Serialize;
use thiserror::Error;

use crate::assign::SlotMap;
use crate::normalize::normalize;

/// Why a raw record was refused before matching.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RecordError {
    #[error("display name is empty")]
    EmptyDisplayName,
    #[error("identifier is empty")]
    EmptyIdentifier,
    #[error("display name {0:?} has no content after normalization")]
    EmptyNormalizedName(String),
    #[error("listing line is not `normalized:::display:::id`: {0:?}")]
    MalformedListingLine(String),
    #[error("unreadable row: {0}")]
    Csv(String),
}

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    display_name: String,
    normalized_name: String,
    external_id: String,
    assigned_asset_id: Option<String>,
}

impl Person {
    pub fn new(display_name: &str, external_id: &str) -> Result<Self, RecordError> {
        let (display_name, normalized_name, external_id) =
            validated(display_name, external_id)?;
        Ok(Self {
            display_name,
            normalized_name,
            external_id,
            assigned_asset_id: None,
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn assigned_asset_id(&self) -> Option<&str> {
        self.assigned_asset_id.as_deref()
    }

    /// Only the assignment engine sets this, once per run.
    pub(crate) fn assign(&mut self, asset_id: &str) {
        debug_assert!(self.assigned_asset_id.is_none());
        self.assigned_asset_id = Some(asset_id.to_string());
    }
}

/// A labeled photo in the asset store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    display_name: String,
    normalized_name: String,
    asset_id: String,
}

impl Asset {
    pub fn new(display_name: &str, asset_id: &str) -> Result<Self, RecordError> {
        let (display_name, normalized_name, asset_id) = validated(display_name, asset_id)?;
        Ok(Self {
            display_name,
            normalized_name,
            asset_id,
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }
}

fn validated(display_name: &str, id: &str) -> Result<(String, String, String), RecordError> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(RecordError::EmptyDisplayName);
    }
    let id = id.trim();
    if id.is_empty() {
        return Err(RecordError::EmptyIdentifier);
    }
    let normalized_name = normalize(display_name);
    if normalized_name.is_empty() {
        return Err(RecordError::EmptyNormalizedName(display_name.to_string()));
    }
    Ok((display_name.to_string(), normalized_name, id.to_string()))
}

/// Resolution outcome for one person, as seen by progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult<'a> {
    Matched(&'a Asset),
    /// The best candidate's slot already belonged to an earlier person.
    SlotTaken(&'a Asset),
    NoCandidate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedPair {
    pub person: Person,
    pub asset: Asset,
}

/// Final result of one assignment run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentReport {
    pub matched: Vec<MatchedPair>,
    /// Normalized names of slots nobody claimed, in first-seen order.
    pub unmatched_assets: Vec<String>,
    /// External ids of people left without a photo, in roster order.
    pub unmatched_people: Vec<String>,
    /// Roster records behind `unmatched_people`, same order.
    pub unmatched_roster: Vec<Person>,
    #[serde(skip)]
    pub slots: SlotMap,
}

impl AssignmentReport {
    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    pub fn unmatched_people_count(&self) -> usize {
        self.unmatched_people.len()
    }

    pub fn unmatched_asset_count(&self) -> usize {
        self.unmatched_assets.len()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Share of accepted people that received a photo. Rejected records are
    /// never part of the denominator.
    pub fn match_rate(&self) -> f64 {
        let people = self.matched_count() + self.unmatched_people_count();
        if people == 0 {
            return 0.0;
        }
        self.matched_count() as f64 / people as f64
    }
}

/// A raw record refused at intake, with its 1-based position in the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejected {
    pub line: usize,
    pub error: RecordError,
}

/// Records accepted for matching plus the ones refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intake<T> {
    pub accepted: Vec<T>,
    pub rejected: Vec<Rejected>,
}

impl<T> Default for Intake<T> {
    fn default() -> Self {
        Self {
            accepted: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Intake<T> {
    /// Sort each raw record into accepted or rejected, keeping input order.
    pub fn collect<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (usize, Result<T, RecordError>)>,
    {
        let mut intake = Self::default();
        for (line, record) in records {
            match record {
                Ok(value) => intake.accepted.push(value),
                Err(error) => {
                    log::warn!("rejected record at line {line}: {error}");
                    intake.rejected.push(Rejected { line, error });
                }
            }
        }
        intake
    }
}
