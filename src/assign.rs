//! Greedy, order-dependent assignment of photo slots to people.

use log::{debug, info};
use std::collections::HashMap;

use crate::model::{Asset, AssignmentReport, MatchResult, MatchedPair, Person};
use crate::resolve::resolve;

pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Knobs for candidate resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Ratio under which the previous person's name is tried as well.
    pub acceptance_threshold: f64,
    /// Pass the previously processed person's name to the resolver.
    pub previous_name_fallback: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: DEFAULT_THRESHOLD,
            previous_name_fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub key: String,
    /// External id of the claiming person.
    pub owner: Option<String>,
}

/// Ownership of every matchable slot, keyed by normalized asset name.
///
/// Assets sharing a normalized name share one slot. A slot is claimed at
/// most once; iteration follows first-seen asset order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotMap {
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
}

impl SlotMap {
    pub fn from_assets(assets: &[Asset]) -> Self {
        let mut map = Self::default();
        for asset in assets {
            let key = asset.normalized_name();
            if map.index.contains_key(key) {
                continue;
            }
            map.index.insert(key.to_string(), map.slots.len());
            map.slots.push(Slot {
                key: key.to_string(),
                owner: None,
            });
        }
        map
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn owner(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .and_then(|&idx| self.slots[idx].owner.as_deref())
    }

    /// Claim `key` for `person_id`. Returns false when the slot is unknown or
    /// already owned; an owned slot is never overwritten.
    pub fn claim(&mut self, key: &str, person_id: &str) -> bool {
        let Some(&idx) = self.index.get(key) else {
            return false;
        };
        let slot = &mut self.slots[idx];
        if slot.owner.is_some() {
            return false;
        }
        slot.owner = Some(person_id.to_string());
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub fn unclaimed(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|slot| slot.owner.is_none())
            .map(|slot| slot.key.as_str())
    }
}

/// Assign assets to people with fresh slots built from `assets`.
pub fn assign(people: Vec<Person>, assets: &[Asset], config: &MatchConfig) -> AssignmentReport {
    let slots = SlotMap::from_assets(assets);
    assign_with_progress(people, assets, slots, config, |_, _| {})
}

/// Assign assets to people in roster order, starting from `slots`.
///
/// Each person sees the whole asset list. The first person whose best
/// candidate lands on an unclaimed slot takes it; later people resolving to
/// the same slot stay unmatched. `on_person` is called once per person after
/// its claim is settled.
pub fn assign_with_progress<F>(
    people: Vec<Person>,
    assets: &[Asset],
    mut slots: SlotMap,
    config: &MatchConfig,
    mut on_person: F,
) -> AssignmentReport
where
    F: FnMut(&Person, MatchResult<'_>),
{
    info!(
        "matching {} people against {} assets ({} unique names)",
        people.len(),
        assets.len(),
        slots.len()
    );

    let mut matched = Vec::new();
    let mut unmatched_roster = Vec::new();
    let mut previous_name: Option<String> = None;

    for mut person in people {
        let previous = if config.previous_name_fallback {
            previous_name.as_deref()
        } else {
            None
        };
        let outcome = match resolve(&person, assets, previous, config) {
            Some(asset) if slots.claim(asset.normalized_name(), person.external_id()) => {
                person.assign(asset.asset_id());
                MatchResult::Matched(asset)
            }
            Some(asset) => {
                debug!(
                    "{}: slot {:?} already taken by {:?}",
                    person.external_id(),
                    asset.normalized_name(),
                    slots.owner(asset.normalized_name())
                );
                MatchResult::SlotTaken(asset)
            }
            None => MatchResult::NoCandidate,
        };
        on_person(&person, outcome);

        previous_name = Some(person.normalized_name().to_string());
        match outcome {
            MatchResult::Matched(asset) => matched.push(MatchedPair {
                person,
                asset: asset.clone(),
            }),
            MatchResult::SlotTaken(_) | MatchResult::NoCandidate => unmatched_roster.push(person),
        }
    }

    let unmatched_assets: Vec<String> = slots.unclaimed().map(str::to_string).collect();
    let unmatched_people: Vec<String> = unmatched_roster
        .iter()
        .map(|person| person.external_id().to_string())
        .collect();
    info!(
        "matched {}, people without photo {}, photos without person {}",
        matched.len(),
        unmatched_people.len(),
        unmatched_assets.len()
    );

    AssignmentReport {
        matched,
        unmatched_assets,
        unmatched_people,
        unmatched_roster,
        slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, id: &str) -> Asset {
        Asset::new(name, id).unwrap()
    }

    fn person(name: &str, id: &str) -> Person {
        Person::new(name, id).unwrap()
    }

    #[test]
    fn duplicate_labels_share_one_slot() {
        let assets = vec![
            asset("Serik Bolat.jpg", "f1"),
            asset("serik bolat", "f2"),
            asset("Aigerim", "f3"),
        ];
        let slots = SlotMap::from_assets(&assets);
        assert_eq!(slots.len(), 2);
        let keys: Vec<_> = slots.iter().map(|slot| slot.key.as_str()).collect();
        assert_eq!(keys, ["serik bolat", "aigerim"]);
    }

    #[test]
    fn claim_is_at_most_once() {
        let mut slots = SlotMap::from_assets(&[asset("aigerim", "f1")]);
        assert!(slots.claim("aigerim", "p1"));
        assert!(!slots.claim("aigerim", "p2"));
        assert!(!slots.claim("unknown", "p2"));
        assert_eq!(slots.owner("aigerim"), Some("p1"));
        assert_eq!(slots.unclaimed().count(), 0);
    }

    #[test]
    fn second_person_on_same_slot_stays_unmatched() {
        let assets = vec![asset("aigerim", "f1"), asset("bolat", "f2")];
        let people = vec![person("Aigerim", "1"), person("Aigerim", "2")];
        let report = assign(people, &assets, &MatchConfig::default());
        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.matched[0].person.external_id(), "1");
        assert_eq!(report.matched[0].person.assigned_asset_id(), Some("f1"));
        assert_eq!(report.unmatched_people, ["2"]);
        assert_eq!(report.unmatched_roster[0].display_name(), "Aigerim");
        assert_eq!(report.unmatched_assets, ["bolat"]);
    }

    #[test]
    fn preclaimed_slots_are_respected() {
        let assets = vec![asset("aigerim", "f1")];
        let mut slots = SlotMap::from_assets(&assets);
        slots.claim("aigerim", "earlier-run");
        let report = assign_with_progress(
            vec![person("aigerim", "1")],
            &assets,
            slots,
            &MatchConfig::default(),
            |_, _| {},
        );
        assert!(report.matched.is_empty());
        assert_eq!(report.unmatched_people, ["1"]);
        assert_eq!(report.slots.owner("aigerim"), Some("earlier-run"));
    }

    #[test]
    fn progress_sees_every_person_in_order() {
        let assets = vec![asset("aigerim", "f1")];
        let people = vec![
            person("aigerim", "1"),
            person("aigerim", "2"),
            person("zzz", "3"),
        ];
        let mut seen = Vec::new();
        assign_with_progress(
            people,
            &assets,
            SlotMap::from_assets(&assets),
            &MatchConfig::default(),
            |person, outcome| {
                let tag = match outcome {
                    MatchResult::Matched(_) => "matched",
                    MatchResult::SlotTaken(_) => "taken",
                    MatchResult::NoCandidate => "none",
                };
                seen.push((person.external_id().to_string(), tag));
            },
        );
        assert_eq!(
            seen,
            vec![
                ("1".to_string(), "matched"),
                ("2".to_string(), "taken"),
                ("3".to_string(), "none"),
            ]
        );
    }

    #[test]
    fn fallback_can_be_switched_off() {
        let assets = vec![asset("zhaksylyk family", "f1")];
        let people = vec![person("zhaksylyk family", "1"), person("qwe", "2")];
        let config = MatchConfig {
            previous_name_fallback: false,
            ..MatchConfig::default()
        };
        let mut outcomes = Vec::new();
        assign_with_progress(
            people.clone(),
            &assets,
            SlotMap::from_assets(&assets),
            &config,
            |_, outcome| outcomes.push(matches!(outcome, MatchResult::NoCandidate)),
        );
        assert_eq!(outcomes, [false, true]);

        let mut outcomes = Vec::new();
        assign_with_progress(
            people,
            &assets,
            SlotMap::from_assets(&assets),
            &MatchConfig::default(),
            |_, outcome| outcomes.push(matches!(outcome, MatchResult::SlotTaken(_))),
        );
        assert_eq!(outcomes, [false, true]);
    }
}
