//! Keyword presence and frequency rules.
//!
//! Occurrences are counted in the parts after verbatim prompt copies are
//! removed, so a keyword the model merely echoes from the prompt does not
//! count. Han, kana, and Hangul keywords match as substrings; other
//! keywords match whole stemmed tokens.

use super::{Input, check_each};
use crate::language::Language;
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text;
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let g = Language::Generic;
    builder
        .add("keyword", g, ArgShape::Words, keyword)
        .add("non_keyword", g, ArgShape::Words, non_keyword)
        .add("keyword_each", g, ArgShape::Words, keyword_each)
        .add("keyword_order", g, ArgShape::Words, keyword_order)
        .add("any_keywords", g, ArgShape::CountedWords, any_keywords)
        .add("word_freq", g, ArgShape::CountedWords, word_freq)
        .add("non_word_freq", g, ArgShape::CountedWords, non_word_freq);
}

fn occurrences(text: &str, word: &str, lang: Language) -> usize {
    text::count_occurrences(text, word, lang)
}

/// Every keyword occurs in the parts beyond prompt echoes.
pub fn keyword(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.echo_free();
    let missing: Vec<&str> = args
        .words()?
        .iter()
        .filter(|w| occurrences(&text, w, input.language) == 0)
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        Ok(Verdict::pass("all keywords present"))
    } else {
        Ok(Verdict::fail(format!("missing keywords: {}", missing.join(", "))))
    }
}

/// No keyword occurs in the parts beyond prompt echoes.
pub fn non_keyword(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.echo_free();
    let present: Vec<&str> = args
        .words()?
        .iter()
        .filter(|w| occurrences(&text, w, input.language) > 0)
        .map(String::as_str)
        .collect();
    if present.is_empty() {
        Ok(Verdict::pass("no forbidden keywords present"))
    } else {
        Ok(Verdict::fail(format!(
            "forbidden keywords present: {}",
            present.join(", ")
        )))
    }
}

/// Every part contains every keyword.
pub fn keyword_each(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let words = args.words()?;
    Ok(check_each(input, "every part contains all keywords", |part| {
        let part = text::strip_prompt_echo(part, input.question);
        let missing: Vec<&str> = words
            .iter()
            .filter(|w| occurrences(&part, w, input.language) == 0)
            .map(String::as_str)
            .collect();
        (!missing.is_empty()).then(|| format!("missing {}", missing.join(", ")))
    }))
}

/// Position of the first occurrence: byte offset for substring matches,
/// token index otherwise. Both orders are monotonic in the text.
fn first_position(text: &str, word: &str, lang: Language) -> Option<usize> {
    if text::uses_substring_match(word, lang) {
        return text.to_lowercase().find(&word.trim().to_lowercase());
    }
    let hay = text::stemmed_tokens(text, lang);
    let pattern = text::stemmed_tokens(word, lang);
    if pattern.is_empty() {
        return None;
    }
    hay.windows(pattern.len()).position(|w| w == pattern.as_slice())
}

/// All keywords occur, and their first occurrences follow the listed order.
pub fn keyword_order(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.echo_free();
    let words = args.words()?;
    let mut positions = Vec::with_capacity(words.len());
    for w in words {
        match first_position(&text, w, input.language) {
            Some(p) => positions.push(p),
            None => return Ok(Verdict::fail(format!("missing keyword: {}", w))),
        }
    }
    match positions.windows(2).position(|p| p[0] > p[1]) {
        None => Ok(Verdict::pass("keywords appear in order")),
        Some(i) => Ok(Verdict::fail(format!(
            "'{}' appears before '{}'",
            words[i + 1],
            words[i]
        ))),
    }
}

/// At least N distinct keywords occur.
pub fn any_keywords(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let needed = args.count()? as usize;
    let text = input.echo_free();
    let mut present: Vec<&str> = Vec::new();
    for w in args.words()? {
        if occurrences(&text, w, input.language) > 0 && !present.contains(&w.as_str()) {
            present.push(w);
        }
    }
    let explanation = format!(
        "{} of {} required keywords present ({})",
        present.len(),
        needed,
        if present.is_empty() { "none".to_string() } else { present.join(", ") }
    );
    Ok(Verdict::new(present.len() >= needed, explanation))
}

fn frequencies(input: &Input<'_>, words: &[String]) -> Vec<(String, usize)> {
    let text = input.echo_free();
    words
        .iter()
        .map(|w| (w.clone(), occurrences(&text, w, input.language)))
        .collect()
}

fn describe(freqs: &[(String, usize)]) -> String {
    freqs
        .iter()
        .map(|(w, n)| format!("{}×{}", w, n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every keyword occurs exactly N times.
pub fn word_freq(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let n = args.count()? as usize;
    let freqs = frequencies(input, args.words()?);
    let ok = freqs.iter().all(|(_, c)| *c == n);
    Ok(Verdict::new(
        ok,
        format!("expected each keyword exactly {} times: {}", n, describe(&freqs)),
    ))
}

/// Negation of `word_freq`: not every keyword occurs exactly N times.
pub fn non_word_freq(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let n = args.count()? as usize;
    let freqs = frequencies(input, args.words()?);
    let all_exact = freqs.iter().all(|(_, c)| *c == n);
    Ok(Verdict::new(
        !all_exact,
        format!("keywords must not all occur exactly {} times: {}", n, describe(&freqs)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::testing::eval_with;

    #[test]
    fn test_keyword_pass() {
        let v = eval_with(
            "keyword:[\"Paris\",\"Lyon\"]",
            &["Paris is lovely; Lyon too."],
            "Mention Paris and Lyon.",
            Language::English,
        );
        assert_eq!(v.as_pair(), (1, "all keywords present"));
    }

    #[test]
    fn test_keyword_echo_is_excluded() {
        let v = eval_with(
            "keyword:[\"Paris\",\"Lyon\"]",
            &["Lyon is nice."],
            "Write about Paris and its neighbours.",
            Language::English,
        );
        assert!(!v.passed);
        assert!(v.explanation.contains("Paris"));

        let v = eval_with(
            "keyword:[\"Paris\",\"Lyon\"]",
            &["Write about Paris and its neighbours. Lyon is nice."],
            "Write about Paris and its neighbours.",
            Language::English,
        );
        assert!(!v.passed, "echoed prompt must not supply Paris");
    }

    #[test]
    fn test_keyword_lemmatized() {
        let v = eval_with("keyword:[\"city\"]", &["Many cities grew."], "", Language::English);
        assert!(v.passed);
    }

    #[test]
    fn test_non_keyword() {
        let v = eval_with("non_keyword:[\"bad\"]", &["all good"], "", Language::English);
        assert!(v.passed);
        let v = eval_with("non_keyword:[\"坏\"]", &["这很坏"], "", Language::Chinese);
        assert!(!v.passed);
    }

    #[test]
    fn test_any_keywords() {
        let v = eval_with("any_keywords2:[\"a1\",\"b2\",\"c3\"]", &["a1 and c3"], "", Language::English);
        assert!(v.passed, "{}", v.explanation);
        let v = eval_with("any_keywords3:[\"a1\",\"b2\",\"c3\"]", &["a1 and c3"], "", Language::English);
        assert!(!v.passed);
    }

    #[test]
    fn test_word_freq_and_negation() {
        let parts = ["apple pie and apple juice"];
        assert!(eval_with("word_freq2:[\"apple\"]", &parts, "", Language::English).passed);
        assert!(!eval_with("word_freq1:[\"apple\"]", &parts, "", Language::English).passed);
        assert!(eval_with("non_word_freq1:[\"apple\"]", &parts, "", Language::English).passed);
        assert!(!eval_with("non_word_freq2:[\"apple\"]", &parts, "", Language::English).passed);
    }

    #[test]
    fn test_keyword_each_and_order() {
        let parts = ["red then blue", "red and blue"];
        assert!(eval_with("keyword_each:[\"red\",\"blue\"]", &parts, "", Language::English).passed);
        assert!(eval_with("keyword_order:[\"red\",\"blue\"]", &["red then blue"], "", Language::English).passed);
        assert!(!eval_with("keyword_order:[\"blue\",\"red\"]", &["red then blue"], "", Language::English).passed);
    }

    #[test]
    fn test_language_variant_keyword() {
        let v = eval_with("german_keyword:[\"Haus\"]", &["Die Häuser sind alt"], "", Language::English);
        assert!(v.passed, "{}", v.explanation);
    }
}
