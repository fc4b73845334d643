//! Per-language stemming used for whole-word occurrence matching.
//!
//! Snowball stemmers come from `rust-stemmers` and are created once per
//! process. Indonesian and Arabic use light affix strippers.

use rust_stemmers::{Algorithm, Stemmer};
use std::sync::OnceLock;

use crate::language::Language;

static ENGLISH: OnceLock<Stemmer> = OnceLock::new();
static GERMAN: OnceLock<Stemmer> = OnceLock::new();
static FRENCH: OnceLock<Stemmer> = OnceLock::new();
static SPANISH: OnceLock<Stemmer> = OnceLock::new();
static PORTUGUESE: OnceLock<Stemmer> = OnceLock::new();
static RUSSIAN: OnceLock<Stemmer> = OnceLock::new();

fn snowball(lang: Language) -> Option<&'static Stemmer> {
    let (cell, algorithm) = match lang {
        Language::English | Language::Generic => (&ENGLISH, Algorithm::English),
        Language::German => (&GERMAN, Algorithm::German),
        Language::French => (&FRENCH, Algorithm::French),
        Language::Spanish => (&SPANISH, Algorithm::Spanish),
        Language::Portuguese => (&PORTUGUESE, Algorithm::Portuguese),
        Language::Russian => (&RUSSIAN, Algorithm::Russian),
        _ => return None,
    };
    Some(cell.get_or_init(|| Stemmer::create(algorithm)))
}

/// Stem a lowercase token.
pub fn stem(token: &str, lang: Language) -> String {
    match lang {
        Language::Indonesian => stem_indonesian(token),
        Language::Arabic => stem_arabic(token),
        Language::Chinese | Language::Japanese | Language::Korean => token.to_string(),
        _ => match snowball(lang) {
            Some(stemmer) => stemmer.stem(token).into_owned(),
            None => token.to_string(),
        },
    }
}

const ID_PARTICLES: [&str; 4] = ["lah", "kah", "tah", "pun"];
const ID_POSSESSIVES: [&str; 3] = ["nya", "ku", "mu"];
const ID_SUFFIXES: [&str; 3] = ["kan", "an", "i"];
const ID_PREFIXES: [&str; 14] = [
    "meng", "meny", "mem", "men", "me", "peng", "peny", "pem", "pen", "pe", "ber", "ter", "di", "ke",
];

/// Light Indonesian stemmer: particles, possessives, derivational suffix, one prefix.
pub fn stem_indonesian(token: &str) -> String {
    let mut word = token.to_string();
    for group in [&ID_PARTICLES[..], &ID_POSSESSIVES[..], &ID_SUFFIXES[..]] {
        if let Some(suffix) = group.iter().find(|s| word.ends_with(*s)) {
            if word.chars().count() - suffix.chars().count() >= 4 {
                word.truncate(word.len() - suffix.len());
            }
        }
    }
    if let Some(prefix) = ID_PREFIXES.iter().find(|p| word.starts_with(*p)) {
        if word.chars().count() - prefix.chars().count() >= 4 {
            word = word[prefix.len()..].to_string();
        }
    }
    word
}

const AR_PREFIXES: [&str; 7] = ["وال", "بال", "كال", "فال", "لل", "ال", "و"];
const AR_SUFFIXES: [&str; 9] = ["ها", "ان", "ات", "ون", "ين", "يه", "ية", "ه", "ي"];

/// Arabic normalization plus light prefix/suffix stripping.
pub fn stem_arabic(token: &str) -> String {
    let mut word = normalize_arabic(token);
    if let Some(prefix) = AR_PREFIXES.iter().find(|p| word.starts_with(*p)) {
        if word.chars().count() - prefix.chars().count() >= 3 {
            word = word[prefix.len()..].to_string();
        }
    }
    if let Some(suffix) = AR_SUFFIXES.iter().find(|s| word.ends_with(*s)) {
        if word.chars().count() - suffix.chars().count() >= 3 {
            word.truncate(word.len() - suffix.len());
        }
    }
    word
}

/// Drop tashkeel and tatweel; unify alef, yeh, and teh marbuta forms.
pub fn normalize_arabic(text: &str) -> String {
    text.chars()
        .filter(|c| !super::script::is_arabic_diacritic(*c) && *c != 'ـ')
        .map(|c| match c {
            'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
            'ى' => 'ي',
            'ة' => 'ه',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_stemming_collapses_inflections() {
        assert_eq!(stem("cities", Language::English), stem("city", Language::English));
        assert_eq!(stem("running", Language::English), "run");
    }

    #[test]
    fn test_german_and_french() {
        assert_eq!(stem("häuser", Language::German), stem("haus", Language::German));
        assert_eq!(stem("chanteuses", Language::French), stem("chanteuse", Language::French));
    }

    #[test]
    fn test_indonesian() {
        assert_eq!(stem_indonesian("membaca"), "baca");
        assert_eq!(stem_indonesian("bukunya"), "buku");
        assert_eq!(stem_indonesian("makan"), "makan");
    }

    #[test]
    fn test_arabic() {
        assert_eq!(stem_arabic("الكتاب"), "كتاب");
        assert_eq!(normalize_arabic("مَدْرَسَة"), "مدرسه");
    }

    #[test]
    fn test_cjk_identity() {
        assert_eq!(stem("東京", Language::Japanese), "東京");
    }
}
