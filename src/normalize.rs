//! Canonical comparison keys for people and photo names.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Placeholder token left in photo names when a name part was unknown.
const NONE_MARKER: &str = "none";

static IMAGE_EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\.(?:jpe?g|png))+$").unwrap());

/// Map a raw display name to the key used for every comparison.
///
/// Lowercases, folds Kazakh-specific letters onto their Russian base
/// letters, composes to NFC, drops image extensions and `none` markers and
/// collapses whitespace. The result is stable under a second application.
pub fn normalize(raw: &str) -> String {
    // Fold on the decomposed form so precomposed and combining spellings of
    // the same letter agree (ї and і + diaeresis both end up as ӥ), then
    // compose: и + breve becomes й.
    let decomposed: String = raw.to_lowercase().nfd().collect();
    let composed: String = fold_locale_letters(&decomposed).nfc().collect();
    strip_noise(&composed)
}

/// Replace each Kazakh-specific letter with the closest Russian letter.
///
/// Characters are mapped one by one, independent of their neighbours.
pub fn fold_locale_letters(value: &str) -> String {
    value.chars().map(base_letter).collect()
}

fn base_letter(ch: char) -> char {
    match ch {
        'Ә' => 'А',
        'ә' => 'а',
        'Ғ' => 'Г',
        'ғ' => 'г',
        'Қ' => 'К',
        'қ' => 'к',
        'Ң' => 'Н',
        'ң' => 'н',
        'Ө' => 'О',
        'ө' => 'о',
        'Ұ' => 'У',
        'ұ' => 'у',
        'Ү' => 'У',
        'ү' => 'у',
        'Һ' => 'Х',
        'һ' => 'х',
        'І' => 'И',
        'і' => 'и',
        other => other,
    }
}

fn strip_noise(value: &str) -> String {
    // Removing an extension can expose a marker token and the reverse, so
    // iterate until nothing changes. Every round either shrinks the string
    // or stops.
    let mut current = collapse_tokens(value);
    loop {
        let without_extension = IMAGE_EXTENSION_RE.replace(&current, "");
        let next = collapse_tokens(&without_extension);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn collapse_tokens(value: &str) -> String {
    value
        .split_whitespace()
        .filter(|token| *token != NONE_MARKER)
        .collect::<Vec<_>>()
        .join(" ")
}
