//! Best-candidate selection for a single person.

use log::debug;

use crate::assign::MatchConfig;
use crate::model::{Asset, Person};
use crate::similarity::{score, sequence_ratio};

/// Pick the best asset for `person` out of the full asset list.
///
/// Tiers, in order: the first exact normalized-name match; the first asset
/// whose tokens are a reordering of the person's (at least two tokens);
/// otherwise the highest ratio, earliest asset on ties. When that ratio stays
/// under `config.acceptance_threshold` and `previous_name` is given, assets
/// are rescored against the previous person's name and may replace the
/// candidate. Claim state is not consulted here.
pub fn resolve<'a>(
    person: &Person,
    assets: &'a [Asset],
    previous_name: Option<&str>,
    config: &MatchConfig,
) -> Option<&'a Asset> {
    let name = person.normalized_name();

    if let Some(asset) = assets.iter().find(|asset| asset.normalized_name() == name) {
        debug!("{}: exact match {}", person.external_id(), asset.asset_id());
        return Some(asset);
    }

    let mut best: Option<&Asset> = None;
    let mut best_score = 0.0;
    for asset in assets {
        let similarity = score(name, asset.normalized_name());
        if similarity.token_overlap_strong {
            debug!(
                "{}: token overlap match {}",
                person.external_id(),
                asset.asset_id()
            );
            return Some(asset);
        }
        if similarity.ratio > best_score {
            best = Some(asset);
            best_score = similarity.ratio;
        }
    }

    if best_score < config.acceptance_threshold {
        if let Some(previous) = previous_name {
            for asset in assets {
                let ratio = sequence_ratio(asset.normalized_name(), previous);
                if ratio > best_score {
                    best = Some(asset);
                    best_score = ratio;
                }
            }
            if let Some(asset) = best {
                debug!(
                    "{}: after previous-name fallback best is {} ({best_score:.2})",
                    person.external_id(),
                    asset.asset_id()
                );
            }
            return best;
        }
    }

    if let Some(asset) = best {
        debug!(
            "{}: best ratio {} ({best_score:.2})",
            person.external_id(),
            asset.asset_id()
        );
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str) -> Person {
        Person::new(name, "p").unwrap()
    }

    fn assets(names: &[&str]) -> Vec<Asset> {
        names
            .iter()
            .enumerate()
            .map(|(idx, name)| Asset::new(name, &format!("a{idx}")).unwrap())
            .collect()
    }

    fn ids(found: Option<&Asset>) -> Option<&str> {
        found.map(Asset::asset_id)
    }

    #[test]
    fn empty_asset_list_yields_nothing() {
        let config = MatchConfig::default();
        assert_eq!(resolve(&person("ivan"), &[], Some("petr"), &config), None);
    }

    #[test]
    fn exact_beats_earlier_overlap() {
        let config = MatchConfig::default();
        let list = assets(&["ivanov ivan", "ivan ivanov"]);
        let found = resolve(&person("Ivan Ivanov"), &list, None, &config);
        assert_eq!(ids(found), Some("a1"));
    }

    #[test]
    fn first_exact_duplicate_wins() {
        let config = MatchConfig::default();
        let list = assets(&["serik", "serik.jpg", "serik"]);
        let found = resolve(&person("serik"), &list, None, &config);
        assert_eq!(ids(found), Some("a0"));
    }

    #[test]
    fn overlap_short_circuits_higher_ratio() {
        let config = MatchConfig::default();
        // a0 shares more characters in order, a1 is a pure reordering.
        let list = assets(&["ivan ivanovv", "ivanov ivan"]);
        let found = resolve(&person("ivan ivanov"), &list, None, &config);
        assert_eq!(ids(found), Some("a1"));
    }

    #[test]
    fn best_ratio_with_earliest_tie() {
        let config = MatchConfig::default();
        let list = assets(&["xxxx", "ivan petrof", "ivan petrov ich"]);
        let found = resolve(&person("ivan petrov"), &list, None, &config);
        assert_eq!(ids(found), Some("a1"));

        let ties = assets(&["abcx", "abcy"]);
        let found = resolve(&person("abcz"), &ties, None, &config);
        assert_eq!(ids(found), Some("a0"));
    }

    #[test]
    fn all_zero_scores_yield_nothing() {
        let config = MatchConfig::default();
        let list = assets(&["xyz", "qqq"]);
        assert_eq!(resolve(&person("abc"), &list, None, &config), None);
    }

    #[test]
    fn previous_name_rescues_weak_match() {
        let config = MatchConfig::default();
        let list = assets(&["zzzz", "zhaksylyk family"]);
        let found = resolve(&person("qwe"), &list, Some("zhaksylyk family"), &config);
        assert_eq!(ids(found), Some("a1"));
        assert_eq!(resolve(&person("qwe"), &list, None, &config), None);
    }

    #[test]
    fn previous_name_ignored_above_threshold() {
        let config = MatchConfig::default();
        let list = assets(&["aigerim", "bolat"]);
        let found = resolve(&person("aigerym"), &list, Some("bolat"), &config);
        assert_eq!(ids(found), Some("a0"));
    }
}
