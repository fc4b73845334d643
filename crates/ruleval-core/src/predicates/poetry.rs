//! Poetic form rules: idiom chaining, acrostics, rhyme proportion, and
//! rhyme schemes.

use std::collections::BTreeMap;

use super::{bilingual, rhyme, Input};
use crate::language::Language;
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text::{self, script};
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    builder
        .add("yayun", Language::Generic, ArgShape::None, yayun)
        .add("rhyme_pattern", Language::Generic, ArgShape::Text, rhyme_pattern)
        .add("jielong", Language::Chinese, ArgShape::None, jielong)
        .add("cangtou", Language::Chinese, ArgShape::Text, cangtou);
}

fn han_chars(part: &str) -> Vec<char> {
    part.chars().filter(|c| script::is_han(*c)).collect()
}

/// Idiom chaining: each part starts with the character the previous part ends with.
pub fn jielong(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let parts: Vec<Vec<char>> = input
        .texts()
        .iter()
        .map(|p| han_chars(p))
        .filter(|chars| !chars.is_empty())
        .collect();
    if parts.len() < 2 {
        return Ok(Verdict::fail(bilingual(
            "接龙至少需要两个成语",
            "chaining needs at least two idioms",
        )));
    }
    let breaks: Vec<String> = parts
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let end = pair[0].last()?;
            let start = pair[1].first()?;
            (end != start).then(|| format!("{}→{} ({}≠{})", i + 1, i + 2, end, start))
        })
        .collect();
    if breaks.is_empty() {
        Ok(Verdict::pass(bilingual(
            format!("{}个成语首尾相接", parts.len()),
            format!("all {} idioms chain", parts.len()),
        )))
    } else {
        Ok(Verdict::fail(bilingual(
            format!("接龙断开：{}", breaks.join("；")),
            format!("chain breaks at {}", breaks.join("; ")),
        )))
    }
}

/// Acrostic: part i starts with the i-th character of the argument.
pub fn cangtou(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let heads: Vec<char> = args.text()?.chars().filter(|c| !c.is_whitespace()).collect();
    if heads.is_empty() {
        return Err(PredicateError::BadArguments("acrostic text is empty".to_string()));
    }
    let parts = input.texts();
    if parts.len() != heads.len() {
        return Ok(Verdict::fail(bilingual(
            format!("句数为{}，藏头字数为{}", parts.len(), heads.len()),
            format!("{} lines for {} acrostic characters", parts.len(), heads.len()),
        )));
    }
    let wrong: Vec<String> = parts
        .iter()
        .zip(&heads)
        .enumerate()
        .filter_map(|(i, (part, head))| {
            let first = text::trim_decoration(part)
                .chars()
                .find(|c| !c.is_whitespace() && !text::is_punctuation(*c));
            (first != Some(*head)).then(|| {
                format!("{}: {}≠{}", i + 1, first.map(String::from).unwrap_or_default(), head)
            })
        })
        .collect();
    if wrong.is_empty() {
        Ok(Verdict::pass(bilingual(
            format!("每句首字依次为「{}」", heads.iter().collect::<String>()),
            "every line starts with its acrostic character",
        )))
    } else {
        Ok(Verdict::fail(bilingual(
            format!("首字不符：{}", wrong.join("；")),
            format!("wrong first characters: {}", wrong.join("; ")),
        )))
    }
}

fn line_keys(input: &Input<'_>) -> Vec<Option<String>> {
    input
        .texts()
        .iter()
        .map(|p| rhyme::line_key(p, input.language))
        .collect()
}

fn show_keys(keys: &[Option<String>]) -> String {
    keys.iter()
        .map(|k| k.as_deref().unwrap_or("?"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The most common rhyme key covers more than half of the lines.
pub fn yayun(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let keys = line_keys(input);
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for key in keys.iter().flatten() {
        *counts.entry(key.as_str()).or_default() += 1;
    }
    let (mode, mass) = counts
        .iter()
        .max_by_key(|(_, n)| **n)
        .map(|(k, n)| (*k, *n))
        .unwrap_or(("?", 0));
    let share = mass as f64 / keys.len().max(1) as f64;
    let explanation = bilingual(
        format!("韵脚「{}」占{}/{}（{}）", mode, mass, keys.len(), show_keys(&keys)),
        format!(
            "rhyme '{}' covers {}/{} lines ({})",
            mode,
            mass,
            keys.len(),
            show_keys(&keys)
        ),
    );
    Ok(Verdict::new(share > 0.5, explanation))
}

/// Lines rhyme according to a capital-letter scheme such as ABAB.
pub fn rhyme_pattern(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let scheme: Vec<char> = args
        .text()?
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if scheme.is_empty() || !scheme.iter().all(|c| c.is_ascii_alphabetic()) {
        return Err(PredicateError::BadArguments(format!(
            "rhyme scheme must be letters, got '{}'",
            args.text()?
        )));
    }
    let scheme_str: String = scheme.iter().collect();
    let keys = line_keys(input);
    if keys.len() != scheme.len() {
        return Ok(Verdict::fail(bilingual(
            format!("诗句数为{}，韵式{}需要{}句", keys.len(), scheme_str, scheme.len()),
            format!("{} lines, scheme {} needs {}", keys.len(), scheme_str, scheme.len()),
        )));
    }
    let mut conflicts = Vec::new();
    for i in 0..keys.len() {
        for j in i + 1..keys.len() {
            let same_letter = scheme[i] == scheme[j];
            let same_key = matches!((&keys[i], &keys[j]), (Some(a), Some(b)) if a == b);
            if same_letter != same_key {
                let relation = if same_letter { "should rhyme" } else { "should not rhyme" };
                conflicts.push(format!("lines {} and {} {}", i + 1, j + 1, relation));
            }
        }
    }
    if conflicts.is_empty() {
        Ok(Verdict::pass(bilingual(
            format!("押韵格式符合{}（{}）", scheme_str, show_keys(&keys)),
            format!("rhyme scheme {} matches ({})", scheme_str, show_keys(&keys)),
        )))
    } else {
        Ok(Verdict::fail(bilingual(
            format!("押韵格式不符合{}（{}）", scheme_str, show_keys(&keys)),
            format!("{} ({})", conflicts.join("; "), show_keys(&keys)),
        )))
    }
}
