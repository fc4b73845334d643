//! French rules: accents, verb forms, negation, elision, typography, address.

use super::{address_verdict, clauses, count_chars, find_chars};
use crate::language::Language;
use crate::predicates::patterns::{FR_PARTITIVE, FR_PASSE_COMPOSE, FR_PRONOMINAL, FR_WRONG_AUXILIARY};
use crate::predicates::{bilingual, forbid, preview, range_count, Feature, Input};
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text;
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let fr = Language::French;
    builder
        .add("french_accent_count", fr, ArgShape::Range, accent_count)
        .add("french_passe_compose_count", fr, ArgShape::Range, passe_compose_count)
        .add("french_partitive_count", fr, ArgShape::Range, partitive_count)
        .add("french_pronominal_verb_count", fr, ArgShape::Range, pronominal_count)
        .add("french_no_accent", fr, ArgShape::None, no_accent)
        .add("french_negation_ne", fr, ArgShape::None, negation_ne)
        .add("french_passe_compose_auxiliary", fr, ArgShape::None, passe_compose_auxiliary)
        .add("french_elision", fr, ArgShape::None, elision)
        .add("french_guillemets", fr, ArgShape::None, guillemets)
        .add("french_punctuation_spacing", fr, ArgShape::None, punctuation_spacing)
        .add("french_formal_address", fr, ArgShape::None, formal_address)
        .add("french_informal_address", fr, ArgShape::None, informal_address);
}

fn is_french_accented(c: char) -> bool {
    text::is_accented(c) || matches!(c, 'œ' | 'æ' | 'Œ' | 'Æ')
}

fn accent_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("重音字母", "accented letters"), |t| {
        count_chars(t, is_french_accented)
    })
}

fn passe_compose_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("复合过去时", "passé composé forms"), |t| {
        FR_PASSE_COMPOSE.find_iter(t).count()
    })
}

fn partitive_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("部分冠词", "partitive articles"), |t| {
        FR_PARTITIVE.find_iter(t).count()
    })
}

fn pronominal_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("代词式动词", "pronominal verbs"), |t| {
        FR_PRONOMINAL.find_iter(t).count()
    })
}

fn no_accent(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("重音字母", "accented letters"), |t| find_chars(t, is_french_accented)))
}

// =============================================================================
// NEGATION AND AUXILIARIES
// =============================================================================

const NEGATION_SECOND: [&str; 5] = ["pas", "jamais", "rien", "personne", "guère"];

/// (negations found, negations missing `ne`)
fn negations(text: &str) -> (Vec<String>, Vec<String>) {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for clause in clauses(text) {
        let tokens = text::tokenize(&clause);
        for (j, token) in tokens.iter().enumerate() {
            if !NEGATION_SECOND.contains(&token.as_str()) {
                continue;
            }
            // "une personne", "la personne" are nouns
            if token == "personne" && j > 0 && matches!(tokens[j - 1].as_str(), "une" | "la" | "cette" | "chaque") {
                continue;
            }
            found.push(token.clone());
            if !tokens[..j].iter().any(|t| t == "ne" || t == "n") {
                missing.push(clause.clone());
            }
        }
    }
    (found, missing)
}

/// Every negation carries its `ne`.
fn negation_ne(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let (found, missing) = negations(&input.joined());
    Ok(if found.is_empty() {
        Verdict::fail(bilingual("未发现否定结构", "no negation found"))
    } else if missing.is_empty() {
        Verdict::pass(bilingual(
            format!("{}处否定均使用ne", found.len()),
            format!("all {} negations use ne", found.len()),
        ))
    } else {
        Verdict::fail(bilingual(
            format!("否定缺少ne：{}", preview(&missing)),
            format!("negation without ne: {}", preview(&missing)),
        ))
    })
}

/// Passé composé is used, and movement verbs take être.
fn passe_compose_auxiliary(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    if !FR_PASSE_COMPOSE.is_match(&text) {
        return Ok(Verdict::fail(bilingual("未使用复合过去时", "no passé composé used")));
    }
    Ok(forbid(input, Feature::new("助动词误用", "wrong auxiliaries"), |t| {
        FR_WRONG_AUXILIARY.find_iter(t).map(|m| m.as_str().to_string()).collect()
    }))
}

// =============================================================================
// ELISION
// =============================================================================

const ELIDING: [&str; 10] = ["le", "la", "de", "je", "me", "te", "se", "ne", "que", "ce"];

/// Words starting with an aspirated h, which block elision.
const H_ASPIRE: [&str; 24] = [
    "héros", "haricot", "haricots", "hibou", "hiboux", "hache", "haine", "hasard", "haut", "haute",
    "honte", "hors", "huit", "homard", "hockey", "hall", "hamac", "hamster", "handicap", "hangar",
    "hanche", "harpe", "hérisson", "hollande",
];

/// Vowel-initial words that still take a full article.
const NO_ELISION: [&str; 3] = ["onze", "oui", "ouate"];

fn starts_with_vowel_sound(word: &str) -> bool {
    let Some(first) = word.chars().next() else {
        return false;
    };
    if NO_ELISION.contains(&word) {
        return false;
    }
    match text::base_letter(first) {
        'a' | 'e' | 'i' | 'o' | 'u' => true,
        'h' => !H_ASPIRE.contains(&word),
        _ => false,
    }
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '’'
}

fn elision_errors(text: &str) -> Vec<String> {
    let tokens: Vec<(&str, String)> = text
        .split_whitespace()
        .map(|raw| {
            let bare = raw.trim_matches(|c: char| text::is_punctuation(c) && !is_apostrophe(c) || matches!(c, '«' | '»'));
            (raw, bare.to_lowercase())
        })
        .filter(|(_, w)| !w.is_empty())
        .collect();
    let mut errors = Vec::new();
    for (i, (raw, word)) in tokens.iter().enumerate() {
        // l'héros: elided before an aspirated h
        if let Some((head, rest)) = word.split_once(is_apostrophe) {
            if !head.is_empty() && H_ASPIRE.contains(&rest) {
                errors.push(word.clone());
            }
            continue;
        }
        if !ELIDING.contains(&word.as_str()) || raw.ends_with(|c: char| text::is_punctuation(c)) {
            continue;
        }
        if let Some((_, next)) = tokens.get(i + 1) {
            let next_word: String = next.chars().take_while(|c| c.is_alphabetic()).collect();
            if starts_with_vowel_sound(&next_word) {
                errors.push(format!("{} {}", word, next_word));
            }
        }
    }
    errors
}

fn elision(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("省音错误", "elision errors"), elision_errors))
}

// =============================================================================
// TYPOGRAPHY
// =============================================================================

/// « » are used and no straight or English double quotes.
fn guillemets(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    if !text.contains(['«', '»']) {
        return Ok(Verdict::fail(bilingual("未使用法语引号« »", "no « » guillemets used")));
    }
    Ok(forbid(input, Feature::new("非法语引号", "non-French quotes"), |t| {
        find_chars(t, |c| matches!(c, '"' | '“' | '”'))
    }))
}

fn is_space(c: char) -> bool {
    c.is_whitespace() || c == '\u{00A0}' || c == '\u{202F}'
}

fn is_high_punctuation(c: char) -> bool {
    matches!(c, ';' | ':' | '!' | '?' | '»')
}

/// (spacing sites seen, sites missing their space)
fn spacing_sites(text: &str) -> (usize, Vec<String>) {
    let chars: Vec<char> = text.chars().collect();
    let mut seen = 0;
    let mut missing = Vec::new();
    for (i, &c) in chars.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();
        if is_high_punctuation(c) {
            // 10:30 and http://
            if c == ':' && (prev.is_some_and(|p| p.is_ascii_digit()) && next.is_some_and(|n| n.is_ascii_digit()) || next == Some('/')) {
                continue;
            }
            if prev.is_some_and(is_high_punctuation) {
                continue;
            }
            seen += 1;
            if !prev.is_some_and(is_space) {
                let start = i.saturating_sub(8);
                missing.push(chars[start..=i].iter().collect::<String>().trim().to_string());
            }
        } else if c == '«' {
            seen += 1;
            if !next.is_some_and(is_space) {
                let end = (i + 8).min(chars.len());
                missing.push(chars[i..end].iter().collect::<String>().trim().to_string());
            }
        }
    }
    (seen, missing)
}

/// A space before ; : ! ? » and after «.
fn punctuation_spacing(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let (seen, missing) = spacing_sites(&input.joined());
    Ok(if seen == 0 {
        Verdict::fail(bilingual("未使用需要空格的标点", "no punctuation requiring a space"))
    } else if missing.is_empty() {
        Verdict::pass(bilingual(
            format!("{}处标点空格正确", seen),
            format!("{} punctuation marks correctly spaced", seen),
        ))
    } else {
        Verdict::fail(bilingual(
            format!("标点前后缺少空格：{}", preview(&missing)),
            format!("missing space around punctuation: {}", preview(&missing)),
        ))
    })
}

// =============================================================================
// ADDRESS
// =============================================================================

const VOUS_FORMS: [&str; 4] = ["vous", "votre", "vos", "vôtre"];
const TU_FORMS: [&str; 8] = ["tu", "te", "toi", "ton", "ta", "tes", "tien", "tienne"];

fn forms(text: &str, set: &[&str]) -> Vec<String> {
    super::find_words(text, set)
}

fn formal_address(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    Ok(address_verdict(forms(&text, &VOUS_FORMS), forms(&text, &TU_FORMS), "敬称vous", "formal vous address"))
}

fn informal_address(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    Ok(address_verdict(forms(&text, &TU_FORMS), forms(&text, &VOUS_FORMS), "tu称呼", "informal tu address"))
}
