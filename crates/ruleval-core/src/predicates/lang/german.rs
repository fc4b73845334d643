//! German rules: articles, address forms, capitalization, agreement.
//!
//! Agreement is checked against a small noun lexicon and only for an
//! article directly followed by a known noun; anything else is not judged.

use super::{address_verdict, clauses, count_chars, find_chars, word_tokens};
use crate::language::Language;
use crate::predicates::patterns::{DE_MODAL, DE_SUBORDINATE};
use crate::predicates::{exact_count, forbid, range_count, Feature, Input};
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text;
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let de = Language::German;
    builder
        .add("german_article_der", de, ArgShape::Count, article_der)
        .add("german_article_die", de, ArgShape::Count, article_die)
        .add("german_article_das", de, ArgShape::Count, article_das)
        .add("german_article_den", de, ArgShape::Count, article_den)
        .add("german_article_dem", de, ArgShape::Count, article_dem)
        .add("german_article_des", de, ArgShape::Count, article_des)
        .add("german_modal_verbs", de, ArgShape::Range, modal_verbs)
        .add("german_umlaut_count", de, ArgShape::Range, umlaut_count)
        .add("german_subordinate_clause_count", de, ArgShape::Range, subordinate_clause_count)
        .add("german_diminutive_count", de, ArgShape::Range, diminutive_count)
        .add("german_no_eszett", de, ArgShape::None, no_eszett)
        .add("german_formal_address", de, ArgShape::None, formal_address)
        .add("german_informal_address", de, ArgShape::None, informal_address)
        .add("german_noun_capitalization", de, ArgShape::None, noun_capitalization)
        .add("german_article_noun_agreement", de, ArgShape::None, article_noun_agreement);
}

// =============================================================================
// ARTICLES
// =============================================================================

fn article_count(input: &Input<'_>, args: &RuleArgs, article: &'static str) -> Result<Verdict, PredicateError> {
    exact_count(input, args, Feature::new(article, article), |t| {
        text::tokenize(t).iter().filter(|w| *w == article).count()
    })
}

macro_rules! article_rule {
    ($name:ident, $article:literal) => {
        fn $name(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
            article_count(input, args, $article)
        }
    };
}

article_rule!(article_der, "der");
article_rule!(article_die, "die");
article_rule!(article_das, "das");
article_rule!(article_den, "den");
article_rule!(article_dem, "dem");
article_rule!(article_des, "des");

const ARTICLES: [&str; 12] = [
    "der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "einem", "einer", "eines",
];

/// Pronouns that follow a relative or demonstrative `die`/`das`.
const PRONOUNS: [&str; 9] = ["ich", "du", "er", "sie", "es", "wir", "ihr", "man", "mich"];

// =============================================================================
// COUNTS
// =============================================================================

fn modal_verbs(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("情态动词", "modal verbs"), |t| DE_MODAL.find_iter(t).count())
}

fn umlaut_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("变音字母", "umlauts"), |t| {
        count_chars(t, |c| matches!(c, 'ä' | 'ö' | 'ü' | 'Ä' | 'Ö' | 'Ü'))
    })
}

fn subordinate_clause_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("从句", "subordinate clauses"), |t| {
        DE_SUBORDINATE.find_iter(t).count()
    })
}

/// Nouns in -chen/-lein that are not diminutives.
const NOT_DIMINUTIVE: [&str; 12] = [
    "Kuchen", "Zeichen", "Knochen", "Drachen", "Rachen", "Sachen", "Wochen", "Küchen", "Buchen",
    "Eichen", "Kirchen", "Verbrechen",
];

fn diminutives(text: &str) -> Vec<String> {
    word_tokens(text)
        .into_iter()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .filter(|w| w.chars().count() > 5 && (w.ends_with("chen") || w.ends_with("lein")))
        .filter(|w| !NOT_DIMINUTIVE.contains(w))
        .map(String::from)
        .collect()
}

fn diminutive_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("指小词", "diminutives"), |t| diminutives(t).len())
}

fn no_eszett(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("ß", "ß"), |t| find_chars(t, |c| c == 'ß' || c == 'ẞ')))
}

// =============================================================================
// ADDRESS
// =============================================================================

const FORMAL_FORMS: [&str; 8] = ["Sie", "Ihnen", "Ihr", "Ihre", "Ihrem", "Ihren", "Ihrer", "Ihres"];
const INFORMAL_FORMS: [&str; 12] = [
    "du", "dich", "dir", "dein", "deine", "deinem", "deinen", "deiner", "deines", "euch", "euer", "eure",
];

/// Formal pronouns found mid-sentence, where capitalization is unambiguous.
/// `Ihnen` counts anywhere.
fn formal_forms(text: &str) -> Vec<String> {
    clauses(text)
        .iter()
        .flat_map(|clause| {
            word_tokens(clause)
                .into_iter()
                .enumerate()
                .filter(|(i, w)| FORMAL_FORMS.contains(w) && (*i > 0 || *w == "Ihnen"))
                .map(|(_, w)| w.to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

fn informal_forms(text: &str) -> Vec<String> {
    text::tokenize(text)
        .into_iter()
        .filter(|w| INFORMAL_FORMS.contains(&w.as_str()))
        .collect()
}

fn formal_address(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    Ok(address_verdict(formal_forms(&text), informal_forms(&text), "尊称Sie", "formal Sie address"))
}

fn informal_address(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    Ok(address_verdict(informal_forms(&text), formal_forms(&text), "du称呼", "informal du address"))
}

// =============================================================================
// CAPITALIZATION AND AGREEMENT
// =============================================================================

fn starts_upper(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Raw whitespace tokens with their edge punctuation, and the bare word.
fn raw_tokens(text: &str) -> Vec<(&str, &str)> {
    text.split_whitespace()
        .map(|raw| (raw, raw.trim_matches(|c: char| text::is_punctuation(c) || c == '„' || c == '“')))
        .filter(|(_, w)| !w.is_empty())
        .collect()
}

/// The word after an article is a capitalized noun, or a lowercase
/// adjective followed by one.
fn lowercase_nouns(text: &str) -> Vec<String> {
    let tokens = raw_tokens(text);
    let mut found = Vec::new();
    for i in 0..tokens.len().saturating_sub(1) {
        let (raw, word) = tokens[i];
        if !ARTICLES.contains(&word.to_lowercase().as_str()) || raw.ends_with(|c: char| text::is_punctuation(c)) {
            continue;
        }
        // relative pronoun after a comma
        if i > 0 && tokens[i - 1].0.ends_with(',') {
            continue;
        }
        let next = tokens[i + 1].1;
        if starts_upper(next) || PRONOUNS.contains(&next) || !next.chars().all(char::is_alphabetic) {
            continue;
        }
        let adjective_then_noun = tokens.get(i + 2).is_some_and(|(_, w)| starts_upper(w));
        if !adjective_then_noun {
            found.push(format!("{} {}", word, next));
        }
    }
    found
}

fn noun_capitalization(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("未大写的名词", "uncapitalized nouns"), lowercase_nouns))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gender {
    Masculine,
    Feminine,
    Neuter,
}

/// (noun, gender, plural identical to singular)
const NOUNS: &[(&str, Gender, bool)] = &[
    ("Hund", Gender::Masculine, false),
    ("Tisch", Gender::Masculine, false),
    ("Mann", Gender::Masculine, false),
    ("Baum", Gender::Masculine, false),
    ("Tag", Gender::Masculine, false),
    ("Stuhl", Gender::Masculine, false),
    ("Vater", Gender::Masculine, false),
    ("Bruder", Gender::Masculine, false),
    ("Apfel", Gender::Masculine, false),
    ("Computer", Gender::Masculine, true),
    ("Lehrer", Gender::Masculine, true),
    ("Wagen", Gender::Masculine, true),
    ("Garten", Gender::Masculine, false),
    ("Himmel", Gender::Masculine, true),
    ("Mond", Gender::Masculine, false),
    ("Berg", Gender::Masculine, false),
    ("Fluss", Gender::Masculine, false),
    ("Zug", Gender::Masculine, false),
    ("Kaffee", Gender::Masculine, false),
    ("Frau", Gender::Feminine, false),
    ("Katze", Gender::Feminine, false),
    ("Stadt", Gender::Feminine, false),
    ("Blume", Gender::Feminine, false),
    ("Tür", Gender::Feminine, false),
    ("Sonne", Gender::Feminine, false),
    ("Mutter", Gender::Feminine, false),
    ("Schwester", Gender::Feminine, false),
    ("Schule", Gender::Feminine, false),
    ("Straße", Gender::Feminine, false),
    ("Zeit", Gender::Feminine, false),
    ("Welt", Gender::Feminine, false),
    ("Musik", Gender::Feminine, false),
    ("Sprache", Gender::Feminine, false),
    ("Nacht", Gender::Feminine, false),
    ("Hand", Gender::Feminine, false),
    ("Lampe", Gender::Feminine, false),
    ("Uhr", Gender::Feminine, false),
    ("Zeitung", Gender::Feminine, false),
    ("Haus", Gender::Neuter, false),
    ("Kind", Gender::Neuter, false),
    ("Buch", Gender::Neuter, false),
    ("Auto", Gender::Neuter, false),
    ("Jahr", Gender::Neuter, false),
    ("Land", Gender::Neuter, false),
    ("Fenster", Gender::Neuter, true),
    ("Mädchen", Gender::Neuter, true),
    ("Brot", Gender::Neuter, false),
    ("Bett", Gender::Neuter, false),
    ("Zimmer", Gender::Neuter, true),
    ("Tier", Gender::Neuter, false),
    ("Pferd", Gender::Neuter, false),
    ("Wetter", Gender::Neuter, true),
    ("Lied", Gender::Neuter, false),
    ("Spiel", Gender::Neuter, false),
    ("Bild", Gender::Neuter, false),
];

fn lookup(noun: &str) -> Option<(Gender, bool)> {
    NOUNS.iter().find(|(n, _, _)| *n == noun).map(|(_, g, same)| (*g, *same))
}

/// Whether `article` can precede the singular form of a noun.
fn agrees(article: &str, gender: Gender, plural_same: bool) -> bool {
    match article {
        // nominative/accusative neuter only
        "das" => gender == Gender::Neuter,
        // masculine nominative, feminine dative/genitive, genitive plural
        "der" => gender != Gender::Neuter || plural_same,
        // feminine singular, or any plural
        "die" => gender == Gender::Feminine || plural_same,
        _ => true,
    }
}

fn agreement_errors(text: &str) -> Vec<String> {
    let tokens = raw_tokens(text);
    tokens
        .windows(2)
        .filter_map(|pair| {
            let (raw, article) = pair[0];
            if raw.ends_with(|c: char| text::is_punctuation(c)) {
                return None;
            }
            let article = article.to_lowercase();
            let noun = pair[1].1;
            let (gender, plural_same) = lookup(noun)?;
            (!agrees(&article, gender, plural_same)).then(|| format!("{} {}", article, noun))
        })
        .collect()
}

fn article_noun_agreement(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("冠词与名词性别不一致", "article-noun gender mismatches"), agreement_errors))
}
