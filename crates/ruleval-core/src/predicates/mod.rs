//! The rule predicate library.
//!
//! Predicates are stateless functions from extracted parts, typed
//! arguments, and item context to a [`Verdict`]. Each language module
//! registers its rules through [`register_all`]; generic rules are also
//! re-registered under `<language>_` prefixes with the language pinned.
//!
//! ## Conventions
//!
//! - Parts are never all blank here: the dispatcher answers
//!   `no candidates found` before a predicate runs.
//! - "each" rules report every failing part by 1-based index.
//! - Language-specific rules explain in Chinese and English, separated by ` | `.

pub mod format;
pub mod keyword;
pub mod lang;
pub mod length;
pub mod patterns;
pub mod poetry;
pub mod repetition;
pub mod rhyme;
pub mod schema_rule;

use serde_json::Value;

use crate::language::Language;
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text;
use crate::types::Verdict;

/// Everything a predicate may read.
#[derive(Debug, Clone, Copy)]
pub struct Input<'a> {
    /// Extracted fragments, the primary input.
    pub parts: &'a [String],
    /// Prompt the model answered, used for echo exclusion.
    pub question: &'a str,
    /// Full model response.
    pub response: &'a str,
    /// Item JSON schema, if any.
    pub schema: Option<&'a Value>,
    /// Working language of this evaluation.
    pub language: Language,
}

impl<'a> Input<'a> {
    /// Parts joined by newlines.
    pub fn joined(&self) -> String {
        self.parts.join("\n")
    }

    /// Joined parts with verbatim prompt copies removed.
    pub fn echo_free(&self) -> String {
        text::strip_prompt_echo(&self.joined(), self.question)
    }

    /// Non-blank parts with 1-based indexes.
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &'a str)> {
        self.parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.trim().is_empty())
            .map(|(i, p)| (i + 1, p.as_str()))
    }

    /// Trimmed non-blank parts.
    pub fn texts(&self) -> Vec<&'a str> {
        self.indexed().map(|(_, p)| p.trim()).collect()
    }
}

/// Bilingual explanation: Chinese first, English second.
pub fn bilingual(zh: impl AsRef<str>, en: impl AsRef<str>) -> String {
    format!("{} | {}", zh.as_ref(), en.as_ref())
}

pub(crate) fn in_range(n: u64, (min, max): (u64, u64)) -> bool {
    min <= n && n <= max
}

/// Run `check` on every non-blank part; a `Some(problem)` fails that part.
pub(crate) fn check_each<F>(input: &Input<'_>, ok: impl Into<String>, check: F) -> Verdict
where
    F: Fn(&str) -> Option<String>,
{
    let failures: Vec<String> = input
        .indexed()
        .filter_map(|(i, part)| check(part).map(|problem| format!("part {}: {}", i, problem)))
        .collect();
    if failures.is_empty() {
        Verdict::pass(ok)
    } else {
        Verdict::fail(failures.join("; "))
    }
}

/// A countable linguistic feature with Chinese and English labels.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Feature {
    pub zh: &'static str,
    pub en: &'static str,
}

impl Feature {
    pub const fn new(zh: &'static str, en: &'static str) -> Self {
        Self { zh, en }
    }
}

/// Count a feature over the joined parts and compare with a `[min, max]` argument.
pub(crate) fn range_count<F>(
    input: &Input<'_>,
    args: &RuleArgs,
    feature: Feature,
    counter: F,
) -> Result<Verdict, PredicateError>
where
    F: Fn(&str) -> usize,
{
    let (min, max) = args.range()?;
    let n = counter(&input.joined()) as u64;
    Ok(Verdict::new(
        in_range(n, (min, max)),
        bilingual(
            format!("{}数量为{}，要求[{}, {}]", feature.zh, n, min, max),
            format!("{} count is {}, required [{}, {}]", feature.en, n, min, max),
        ),
    ))
}

/// Count a feature over the joined parts and require exactly the argument count.
pub(crate) fn exact_count<F>(
    input: &Input<'_>,
    args: &RuleArgs,
    feature: Feature,
    counter: F,
) -> Result<Verdict, PredicateError>
where
    F: Fn(&str) -> usize,
{
    let expected = args.count()?;
    let n = counter(&input.joined()) as u64;
    Ok(Verdict::new(
        n == expected,
        bilingual(
            format!("{}出现{}次，要求{}次", feature.zh, n, expected),
            format!("{} occurs {} times, required {}", feature.en, n, expected),
        ),
    ))
}

/// Pass iff `finder` reports nothing in the joined parts.
pub(crate) fn forbid<F>(input: &Input<'_>, feature: Feature, finder: F) -> Verdict
where
    F: Fn(&str) -> Vec<String>,
{
    let found = finder(&input.joined());
    if found.is_empty() {
        Verdict::pass(bilingual(
            format!("未发现{}", feature.zh),
            format!("no {} found", feature.en),
        ))
    } else {
        let shown = preview(&found);
        Verdict::fail(bilingual(
            format!("发现{}：{}", feature.zh, shown),
            format!("found {}: {}", feature.en, shown),
        ))
    }
}

/// Pass iff `finder` reports at least one hit in the joined parts.
pub(crate) fn require_present<F>(input: &Input<'_>, feature: Feature, finder: F) -> Verdict
where
    F: Fn(&str) -> Vec<String>,
{
    let found = finder(&input.joined());
    if found.is_empty() {
        Verdict::fail(bilingual(
            format!("未使用{}", feature.zh),
            format!("no {} used", feature.en),
        ))
    } else {
        let shown = preview(&found);
        Verdict::pass(bilingual(
            format!("使用了{}：{}", feature.zh, shown),
            format!("{} used: {}", feature.en, shown),
        ))
    }
}

/// First five items joined for explanations.
pub(crate) fn preview(items: &[String]) -> String {
    let mut shown: Vec<&str> = items.iter().take(5).map(String::as_str).collect();
    if items.len() > 5 {
        shown.push("…");
    }
    shown.join(", ")
}

/// Lowercase tokens of a Latin or Cyrillic text, keeping letters only.
pub(crate) fn lower_tokens(text: &str) -> Vec<String> {
    text::tokenize(text)
}

/// Register every built-in rule.
pub fn register_all(builder: &mut RegistryBuilder) {
    keyword::register(builder);
    length::register(builder);
    format::register(builder);
    repetition::register(builder);
    poetry::register(builder);
    schema_rule::register(builder);
    register_language_variants(builder);
    lang::register(builder);
}

/// Generic predicates pinned to each specific language.
fn register_language_variants(builder: &mut RegistryBuilder) {
    for lang in Language::SPECIFIC {
        let prefix = lang.name();
        builder
            .add(format!("{}_each_length", prefix), lang, ArgShape::Range, length::each_length)
            .add(format!("{}_total_length", prefix), lang, ArgShape::Range, length::total_length)
            .add(format!("{}_keyword", prefix), lang, ArgShape::Words, keyword::keyword)
            .add(format!("{}_non_keyword", prefix), lang, ArgShape::Words, keyword::non_keyword)
            .add(format!("{}_yayun", prefix), lang, ArgShape::None, poetry::yayun)
            .add(format!("{}_rhyme_pattern", prefix), lang, ArgShape::Text, poetry::rhyme_pattern);
    }
}
