//! Match a roster of people to photo files whose names were typed by hand.
//!
//! Names are normalized ([`normalize`]), scored pairwise ([`similarity`]),
//! resolved to a best candidate per person ([`resolve`]) and finally assigned
//! greedily in roster order so that each photo slot goes to at most one person
//! ([`assign`]). [`ingest`] and [`export`] are the plain-text adapters used by
//! the command-line tool.

pub mod assign;
pub mod export;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod resolve;
pub mod similarity;

pub use assign::{assign, assign_with_progress, MatchConfig, Slot, SlotMap, DEFAULT_THRESHOLD};
pub use model::{
    Asset, AssignmentReport, Intake, MatchResult, MatchedPair, Person, RecordError, Rejected,
};
pub use normalize::normalize;
pub use resolve::resolve;
pub use similarity::{score, Similarity};
