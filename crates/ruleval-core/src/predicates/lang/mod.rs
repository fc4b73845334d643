//! Language-specific linguistic rules.
//!
//! One module per language group. Rules here are pinned to their language
//! and explain in Chinese and English.
//!
//! Rules that check how a construction is written (negation with `ne`,
//! inverted punctuation, number formats, guillemets) fail when the
//! construction does not appear at all. Rules that check general
//! well-formedness (agreement, capitalization, elision) pass when no
//! violation is found.

pub mod arabic;
pub mod chinese;
pub mod english;
pub mod french;
pub mod german;
pub mod indonesian;
pub mod japanese;
pub mod korean;
pub mod portuguese;
pub mod russian;
pub mod spanish;

use crate::predicates::{bilingual, preview};
use crate::rule::RegistryBuilder;
use crate::text;
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    chinese::register(builder);
    japanese::register(builder);
    korean::register(builder);
    english::register(builder);
    german::register(builder);
    french::register(builder);
    spanish::register(builder);
    portuguese::register(builder);
    russian::register(builder);
    arabic::register(builder);
    indonesian::register(builder);
}

/// Whitespace tokens with surrounding punctuation removed; inner apostrophes
/// and hyphens are kept.
pub(crate) fn word_tokens(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| text::is_punctuation(c) && c != '\'' && c != '’'))
        .map(|t| t.trim_matches(|c: char| c == '\'' || c == '’' || c == '"'))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Sentences split at terminal punctuation and line breaks.
pub(crate) fn clauses(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c == '\n' {
            push_clause(&mut out, &mut current);
            continue;
        }
        current.push(c);
        if text::is_terminal_punctuation(c) {
            push_clause(&mut out, &mut current);
        }
    }
    push_clause(&mut out, &mut current);
    out
}

fn push_clause(out: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    current.clear();
}

/// A clause with trailing punctuation, quotes, and whitespace removed.
pub(crate) fn clause_body(clause: &str) -> &str {
    clause.trim_end_matches(|c: char| c.is_whitespace() || text::is_punctuation(c))
}

/// Lowercase tokens of `text` that are in `set`.
pub(crate) fn find_words(text: &str, set: &[&str]) -> Vec<String> {
    text::tokenize(text)
        .into_iter()
        .filter(|t| set.contains(&t.as_str()))
        .collect()
}

pub(crate) fn count_words(text: &str, set: &[&str]) -> usize {
    find_words(text, set).len()
}

/// Characters of `text` satisfying `pred`, each as a string.
pub(crate) fn find_chars(text: &str, pred: impl Fn(char) -> bool) -> Vec<String> {
    text.chars().filter(|c| pred(*c)).map(String::from).collect()
}

pub(crate) fn count_chars(text: &str, pred: impl Fn(char) -> bool) -> usize {
    text.chars().filter(|c| pred(*c)).count()
}

/// Lowercase tokens ending in one of `suffixes`, at least `min_chars` long,
/// and not in `exclusions`.
pub(crate) fn find_suffixed(
    text: &str,
    suffixes: &[&str],
    min_chars: usize,
    exclusions: &[&str],
) -> Vec<String> {
    text::tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() >= min_chars)
        .filter(|t| suffixes.iter().any(|s| t.ends_with(s)))
        .filter(|t| !exclusions.contains(&t.as_str()))
        .collect()
}

/// Verdict for an address-form rule: `wanted` forms must appear and
/// `unwanted` forms must not.
pub(crate) fn address_verdict(wanted: Vec<String>, unwanted: Vec<String>, zh: &str, en: &str) -> Verdict {
    if wanted.is_empty() {
        Verdict::fail(bilingual(format!("未使用{}", zh), format!("no {} used", en)))
    } else if unwanted.is_empty() {
        Verdict::pass(bilingual(
            format!("使用了{}：{}", zh, preview(&wanted)),
            format!("{} used: {}", en, preview(&wanted)),
        ))
    } else {
        Verdict::fail(bilingual(
            format!("混用了其他称呼：{}", preview(&unwanted)),
            format!("mixed with other address forms: {}", preview(&unwanted)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_tokens_keep_inner_apostrophes() {
        assert_eq!(word_tokens("« l'homme », dit-il."), vec!["l'homme", "dit-il"]);
    }

    #[test]
    fn test_clauses() {
        assert_eq!(clauses("今日は晴れです。明日は雨\nでしょう！"), vec!["今日は晴れです。", "明日は雨", "でしょう！"]);
        assert_eq!(clause_body("ありがとうございます。」"), "ありがとうございます");
    }

    #[test]
    fn test_find_suffixed() {
        let found = find_suffixed("un perrito y un bonito gatito", &["ito"], 5, &["bonito"]);
        assert_eq!(found, vec!["perrito", "gatito"]);
    }
}
