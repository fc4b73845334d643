//! Surface-form rules: patterns, starts and ends, punctuation, casing,
//! digits, and JSON fragments.

use super::{check_each, patterns, Input};
use crate::language::Language;
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text;
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let g = Language::Generic;
    builder
        .add("regex", g, ArgShape::Pattern, regex)
        .add("non_regex", g, ArgShape::Pattern, non_regex)
        .add("startswith_each", g, ArgShape::Words, startswith_each)
        .add("endswith_each", g, ArgShape::Words, endswith_each)
        .add("startswith", g, ArgShape::Words, startswith)
        .add("endswith", g, ArgShape::Words, endswith)
        .add("lipogram", g, ArgShape::Words, lipogram)
        .add("no_end_with_punctuation", g, ArgShape::None, no_end_with_punctuation)
        .add("end_with_punctuation", g, ArgShape::None, end_with_punctuation)
        .add("all_uppercase", g, ArgShape::None, all_uppercase)
        .add("all_lowercase", g, ArgShape::None, all_lowercase)
        .add("title_case_each", g, ArgShape::None, title_case_each)
        .add("no_digits", g, ArgShape::None, no_digits)
        .add("no_comma", g, ArgShape::None, no_comma)
        .add("json_each", g, ArgShape::None, json_each)
        .add("has_complete_questions", g, ArgShape::Count, has_complete_questions);
}

/// Every part matches the pattern somewhere.
pub fn regex(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let re = args.pattern()?;
    Ok(check_each(input, format!("every part matches /{}/", re.as_str()), |part| {
        (!re.is_match(part)).then(|| "does not match".to_string())
    }))
}

/// No part matches the pattern.
pub fn non_regex(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let re = args.pattern()?;
    Ok(check_each(input, format!("no part matches /{}/", re.as_str()), |part| {
        re.find(part).map(|m| format!("matches '{}'", m.as_str()))
    }))
}

fn normalized_words(args: &RuleArgs) -> Result<Vec<String>, PredicateError> {
    Ok(args.words()?.iter().map(|w| text::normalize_edges(w)).collect())
}

fn starts_with_any(part: &str, words: &[String]) -> bool {
    let part = text::normalize_edges(part);
    words.iter().any(|w| part.starts_with(w.as_str()))
}

fn ends_with_any(part: &str, words: &[String]) -> bool {
    let part = text::normalize_edges(part);
    words.iter().any(|w| part.ends_with(w.as_str()))
}

pub fn startswith_each(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let words = normalized_words(args)?;
    Ok(check_each(
        input,
        format!("every part starts with {}", words.join(" / ")),
        |part| (!starts_with_any(part, &words)).then(|| format!("starts with '{}'", head(part))),
    ))
}

pub fn endswith_each(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let words = normalized_words(args)?;
    Ok(check_each(
        input,
        format!("every part ends with {}", words.join(" / ")),
        |part| (!ends_with_any(part, &words)).then(|| format!("ends with '{}'", tail(part))),
    ))
}

/// The first part starts with one of the words.
pub fn startswith(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let words = normalized_words(args)?;
    let first = input.texts().first().copied().unwrap_or_default();
    Ok(Verdict::new(
        starts_with_any(first, &words),
        format!("text starts with '{}', expected {}", head(first), words.join(" / ")),
    ))
}

/// The last part ends with one of the words.
pub fn endswith(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let words = normalized_words(args)?;
    let last = input.texts().last().copied().unwrap_or_default();
    Ok(Verdict::new(
        ends_with_any(last, &words),
        format!("text ends with '{}', expected {}", tail(last), words.join(" / ")),
    ))
}

fn head(part: &str) -> String {
    text::normalize_edges(part).chars().take(12).collect()
}

fn tail(part: &str) -> String {
    let norm = text::normalize_edges(part);
    let n = norm.chars().count();
    norm.chars().skip(n.saturating_sub(12)).collect()
}

/// None of the listed letters (or strings) appear, case-insensitively.
pub fn lipogram(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let joined = input.joined().to_lowercase();
    let used: Vec<String> = args
        .words()?
        .iter()
        .map(|w| w.to_lowercase())
        .filter(|w| joined.contains(w.as_str()))
        .collect();
    if used.is_empty() {
        Ok(Verdict::pass("no forbidden letters used"))
    } else {
        Ok(Verdict::fail(format!("forbidden letters used: {}", used.join(", "))))
    }
}

fn is_ending_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | '!' | '?' | ':' | ';' | '。' | '，' | '！' | '？' | '：' | '；' | '、' | '…')
}

pub fn no_end_with_punctuation(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(check_each(input, "no part ends with punctuation", |part| {
        part.trim_end()
            .chars()
            .last()
            .filter(|c| is_ending_punctuation(*c))
            .map(|c| format!("ends with '{}'", c))
    }))
}

pub fn end_with_punctuation(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(check_each(input, "every part ends with sentence punctuation", |part| {
        let last = text::trim_decoration(part).chars().last();
        match last {
            Some(c) if text::is_terminal_punctuation(c) => None,
            Some(c) => Some(format!("ends with '{}'", c)),
            None => Some("is empty".to_string()),
        }
    }))
}

pub fn all_uppercase(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let lower: String = input.joined().chars().filter(|c| c.is_lowercase()).take(10).collect();
    Ok(Verdict::new(
        lower.is_empty(),
        if lower.is_empty() {
            "all letters are uppercase".to_string()
        } else {
            format!("lowercase letters found: {}", lower)
        },
    ))
}

pub fn all_lowercase(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let upper: String = input.joined().chars().filter(|c| c.is_uppercase()).take(10).collect();
    Ok(Verdict::new(
        upper.is_empty(),
        if upper.is_empty() {
            "all letters are lowercase".to_string()
        } else {
            format!("uppercase letters found: {}", upper)
        },
    ))
}

/// Words that stay lowercase inside a title.
const TITLE_SMALL_WORDS: [&str; 18] = [
    "a", "an", "the", "and", "but", "or", "nor", "for", "so", "yet", "at", "by", "in", "of", "on",
    "to", "up", "as",
];

/// Every word of every part starts uppercase; small words after the first are exempt.
pub fn title_case_each(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(check_each(input, "every part is in title case", |part| {
        let bad: Vec<&str> = part
            .split_whitespace()
            .enumerate()
            .filter_map(|(i, word)| {
                let core = word.trim_matches(|c: char| !c.is_alphanumeric());
                let first = core.chars().next()?;
                if !first.is_alphabetic() || first.is_uppercase() {
                    return None;
                }
                if i > 0 && TITLE_SMALL_WORDS.contains(&core.to_lowercase().as_str()) {
                    return None;
                }
                Some(core)
            })
            .collect();
        (!bad.is_empty()).then(|| format!("not capitalized: {}", bad.join(", ")))
    }))
}

pub fn no_digits(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let digits: String = input.joined().chars().filter(|c| c.is_numeric()).take(10).collect();
    Ok(Verdict::new(
        digits.is_empty(),
        if digits.is_empty() {
            "no digits".to_string()
        } else {
            format!("digits found: {}", digits)
        },
    ))
}

pub fn no_comma(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let n = input
        .joined()
        .chars()
        .filter(|c| matches!(c, ',' | '，' | '、' | '،'))
        .count();
    Ok(Verdict::new(
        n == 0,
        if n == 0 {
            "no commas".to_string()
        } else {
            format!("{} commas found", n)
        },
    ))
}

/// Every part parses as JSON after stripping a code fence.
pub fn json_each(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(check_each(input, "every part is valid JSON", |part| {
        serde_json::from_str::<serde_json::Value>(patterns::strip_code_fence(part))
            .err()
            .map(|e| format!("invalid JSON: {}", e))
    }))
}

fn is_question_mark(c: char) -> bool {
    matches!(c, '?' | '？' | '؟')
}

/// Exactly N sentences end with a question mark.
pub fn has_complete_questions(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let expected = args.count()? as usize;
    let n: usize = input
        .texts()
        .iter()
        .flat_map(|p| text::sentences(p))
        .filter(|s| {
            s.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '”' | '’' | '»' | ')'))
                .chars()
                .last()
                .is_some_and(is_question_mark)
        })
        .count();
    Ok(Verdict::new(
        n == expected,
        format!("{} complete questions, expected {}", n, expected),
    ))
}
