//! Korean rules.

use super::{clause_body, clauses, find_chars};
use crate::language::Language;
use crate::predicates::{bilingual, forbid, range_count, Feature, Input};
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text::script::{is_han, is_hangul, is_hangul_syllable};
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let ko = Language::Korean;
    builder
        .add("korean_hangul_only", ko, ArgShape::None, hangul_only)
        .add("korean_no_hanja", ko, ArgShape::None, no_hanja)
        .add("korean_honorific", ko, ArgShape::None, honorific)
        .add("korean_plain_form", ko, ArgShape::None, plain_form)
        .add("korean_syllable_count", ko, ArgShape::Range, syllable_count);
}

/// Sentence endings of the 해요체 and 합쇼체 speech levels.
const HONORIFIC_ENDINGS: [&str; 6] = ["요", "니다", "니까", "세요", "십시오", "시오"];

fn is_honorific(clause: &str) -> bool {
    let body = clause_body(clause);
    HONORIFIC_ENDINGS.iter().any(|e| body.ends_with(e))
}

fn speech_levels(input: &Input<'_>) -> (Vec<String>, Vec<String>) {
    clauses(&input.joined())
        .into_iter()
        .filter(|c| c.chars().any(is_hangul))
        .partition(|c| is_honorific(c))
}

fn hangul_only(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("非韩文字母", "non-Hangul letters"), |text| {
        find_chars(text, |c| c.is_alphabetic() && !is_hangul(c))
    }))
}

fn no_hanja(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("汉字", "hanja"), |text| find_chars(text, is_han)))
}

/// Every sentence uses a polite or deferential ending.
fn honorific(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let (polite, plain) = speech_levels(input);
    Ok(Verdict::new(
        !polite.is_empty() && plain.is_empty(),
        bilingual(
            format!("敬语句{}个，非敬语句{}个", polite.len(), plain.len()),
            format!(
                "{} honorific sentences, {} plain sentences{}",
                polite.len(),
                plain.len(),
                plain.first().map(|s| format!(" (e.g. {})", s)).unwrap_or_default()
            ),
        ),
    ))
}

fn plain_form(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let (polite, plain) = speech_levels(input);
    Ok(Verdict::new(
        polite.is_empty() && !plain.is_empty(),
        bilingual(
            format!("非敬语句{}个，敬语句{}个", plain.len(), polite.len()),
            format!(
                "{} plain sentences, {} honorific sentences{}",
                plain.len(),
                polite.len(),
                polite.first().map(|s| format!(" (e.g. {})", s)).unwrap_or_default()
            ),
        ),
    ))
}

fn syllable_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("韩文音节", "Hangul syllables"), |text| {
        text.chars().filter(|c| is_hangul_syllable(*c)).count()
    })
}

#[cfg(test)]
mod tests {
    use crate::predicates::testing::eval;

    #[test]
    fn test_scripts() {
        assert!(eval("korean_hangul_only", &["안녕하세요, 반갑습니다!"]).passed);
        assert!(!eval("korean_hangul_only", &["안녕 hello"]).passed);
        assert!(!eval("korean_no_hanja", &["大韓民國 만세"]).passed);
    }

    #[test]
    fn test_speech_levels() {
        let polite = ["만나서 반갑습니다. 어디에 가요?"];
        assert!(eval("korean_honorific", &polite).passed);
        assert!(!eval("korean_plain_form", &polite).passed);
        let plain = ["나는 학교에 간다. 밥 먹었어?"];
        assert!(eval("korean_plain_form", &plain).passed);
        assert!(!eval("korean_honorific", &["감사합니다. 나는 간다."]).passed);
    }

    #[test]
    fn test_syllable_count() {
        assert!(eval("korean_syllable_count:[5,5]", &["안녕하세요"]).passed);
    }
}
