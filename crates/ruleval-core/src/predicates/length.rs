//! Length, count, and language-mix rules.

use super::{check_each, in_range, patterns, Input};
use crate::language::Language;
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text::{self, script};
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let g = Language::Generic;
    builder
        .add("each_length", g, ArgShape::Range, each_length)
        .add("total_length", g, ArgShape::Range, total_length)
        .add("each_char_length", g, ArgShape::Range, each_char_length)
        .add("total_char_length", g, ArgShape::Range, total_char_length)
        .add("item_count", g, ArgShape::Range, item_count)
        .add("sentence_count", g, ArgShape::Range, sentence_count)
        .add("paragraph_count", g, ArgShape::Range, paragraph_count)
        .add("heading_count", g, ArgShape::Range, heading_count)
        .add("bullet_count", g, ArgShape::Range, bullet_count)
        .add("same_length_each", g, ArgShape::None, same_length_each)
        .add("ascending_length", g, ArgShape::None, ascending_length)
        .add("mixed_language_each_length", g, ArgShape::LanguageRange, mixed_language_each_length)
        .add("language_ratio", g, ArgShape::LanguageRange, language_ratio);
}

fn each_measure<F>(input: &Input<'_>, args: &RuleArgs, unit: &str, measure: F) -> Result<Verdict, PredicateError>
where
    F: Fn(&str) -> usize,
{
    let range = args.range()?;
    Ok(check_each(
        input,
        format!("every part has between {} and {} {}", range.0, range.1, unit),
        |part| {
            let n = measure(part) as u64;
            (!in_range(n, range)).then(|| {
                format!("has {} {}, expected [{}, {}]", n, unit, range.0, range.1)
            })
        },
    ))
}

fn total_measure<F>(input: &Input<'_>, args: &RuleArgs, unit: &str, measure: F) -> Result<Verdict, PredicateError>
where
    F: Fn(&str) -> usize,
{
    let range = args.range()?;
    let n: u64 = input.texts().iter().map(|p| measure(p) as u64).sum();
    Ok(Verdict::new(
        in_range(n, range),
        format!("total {} {}, expected [{}, {}]", n, unit, range.0, range.1),
    ))
}

/// Every part's word count lies in `[min, max]`.
pub fn each_length(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let lang = input.language;
    each_measure(input, args, "words", |p| text::word_count(p, lang))
}

/// The summed word count lies in `[min, max]`.
pub fn total_length(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let lang = input.language;
    total_measure(input, args, "words", |p| text::word_count(p, lang))
}

pub fn each_char_length(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    each_measure(input, args, "characters", text::char_count)
}

pub fn total_char_length(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    total_measure(input, args, "characters", text::char_count)
}

/// Number of parts lies in `[min, max]`.
pub fn item_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let range = args.range()?;
    let n = input.parts.len() as u64;
    Ok(Verdict::new(
        in_range(n, range),
        format!("{} items, expected [{}, {}]", n, range.0, range.1),
    ))
}

pub fn sentence_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    each_measure(input, args, "sentences", |p| text::sentences(p).len())
}

pub fn paragraph_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let range = args.range()?;
    let n = text::paragraphs(&input.parts.join("\n\n")).len() as u64;
    Ok(Verdict::new(
        in_range(n, range),
        format!("{} paragraphs, expected [{}, {}]", n, range.0, range.1),
    ))
}

pub fn heading_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    total_measure(input, args, "headings", |p| patterns::HEADING.find_iter(p).count())
}

pub fn bullet_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    total_measure(input, args, "list items", |p| patterns::BULLET.find_iter(p).count())
}

fn word_counts(input: &Input<'_>) -> Vec<usize> {
    input
        .texts()
        .iter()
        .map(|p| text::word_count(p, input.language))
        .collect()
}

/// All parts have the same word count.
pub fn same_length_each(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let counts = word_counts(input);
    let ok = counts.windows(2).all(|w| w[0] == w[1]);
    Ok(Verdict::new(ok, format!("word counts per part: {:?}", counts)))
}

/// Word counts strictly increase from part to part.
pub fn ascending_length(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let counts = word_counts(input);
    let ok = counts.windows(2).all(|w| w[0] < w[1]);
    Ok(Verdict::new(ok, format!("word counts per part: {:?}", counts)))
}

fn han_count(text: &str) -> usize {
    text.chars().filter(|c| script::is_han(*c)).count()
}

/// Chinese characters plus L-language words, per part, within `[min, max]`.
pub fn mixed_language_each_length(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let other = args.language()?;
    let range = args.range()?;
    if range.0 > range.1 {
        return Err(PredicateError::BadArguments(format!(
            "min {} exceeds max {}",
            range.0, range.1
        )));
    }
    Ok(check_each(
        input,
        format!(
            "every part has between {} and {} Chinese characters plus {} words",
            range.0, range.1, other
        ),
        |part| {
            let zh = han_count(part);
            let words = text::word_count(part, other);
            let n = (zh + words) as u64;
            (!in_range(n, range)).then(|| {
                format!(
                    "{} Chinese characters + {} {} words = {}, expected [{}, {}]",
                    zh, words, other, n, range.0, range.1
                )
            })
        },
    ))
}

fn hundredths(x: f64) -> i64 {
    (x * 100.0).round() as i64
}

/// Chinese characters divided by L-language words equals `a / b` at two decimals.
pub fn language_ratio(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let other = args.language()?;
    let (a, b) = args.range()?;
    if b == 0 {
        return Err(PredicateError::BadArguments("ratio denominator is zero".to_string()));
    }
    let joined = input.joined();
    let zh = han_count(&joined);
    let words = text::word_count(&joined, other);
    if words == 0 {
        return Ok(Verdict::fail(format!("no {} words found", other)));
    }
    let actual = zh as f64 / words as f64;
    let expected = a as f64 / b as f64;
    Ok(Verdict::new(
        hundredths(actual) == hundredths(expected),
        format!(
            "{} Chinese characters / {} {} words = {:.2}, expected {:.2}",
            zh, words, other, actual, expected
        ),
    ))
}
