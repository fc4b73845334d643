//! Non-repetition rules.

use std::collections::HashSet;

use super::{check_each, Input};
use crate::language::Language;
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text;
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let g = Language::Generic;
    builder
        .add("repeat_each", g, ArgShape::None, repeat_each)
        .add("no_word_repeat", g, ArgShape::None, no_word_repeat)
        .add("no_char_repeat", g, ArgShape::None, no_char_repeat);
}

/// Comparison form of a part: only letters of the working script, lowercased.
fn isolated(part: &str, lang: Language) -> String {
    let iso = text::isolate_script(part, lang);
    if iso.is_empty() {
        text::normalize_edges(part)
    } else {
        iso
    }
}

/// Parts are pairwise distinct after script isolation.
pub fn repeat_each(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let mut seen: Vec<(usize, String)> = Vec::new();
    let mut duplicates = Vec::new();
    for (i, part) in input.indexed() {
        let key = isolated(part, input.language);
        match seen.iter().find(|(_, k)| *k == key) {
            Some((j, _)) => duplicates.push(format!("part {} repeats part {}", i, j)),
            None => seen.push((i, key)),
        }
    }
    if duplicates.is_empty() {
        Ok(Verdict::pass("all parts are distinct"))
    } else {
        Ok(Verdict::fail(duplicates.join("; ")))
    }
}

fn first_repeat<I>(items: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items.into_iter().find(|item| !seen.insert(item.clone()))
}

/// No word occurs twice within a part.
pub fn no_word_repeat(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let lang = input.language;
    Ok(check_each(input, "no word repeats within a part", |part| {
        let words = if lang.is_cjk() {
            text::words(part, lang)
        } else {
            text::tokenize(part)
        };
        first_repeat(words).map(|w| format!("'{}' repeats", w))
    }))
}

/// No character occurs twice within a part, ignoring case, spaces, and punctuation.
pub fn no_char_repeat(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(check_each(input, "no character repeats within a part", |part| {
        let chars = part
            .chars()
            .filter(|c| !c.is_whitespace() && !text::is_punctuation(*c))
            .flat_map(char::to_lowercase)
            .map(String::from);
        first_repeat(chars).map(|c| format!("'{}' repeats", c))
    }))
}
