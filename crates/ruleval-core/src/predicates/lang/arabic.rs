//! Arabic rules: diacritics, the definite article, punctuation, digits.

use super::{count_chars, find_chars};
use crate::language::Language;
use crate::predicates::{bilingual, forbid, preview, range_count, Feature, Input};
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text::script::{is_arabic, is_arabic_diacritic, is_eastern_arabic_digit};
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let ar = Language::Arabic;
    builder
        .add("arabic_diacritics_count", ar, ArgShape::Range, diacritics_count)
        .add("arabic_definite_article_count", ar, ArgShape::Range, definite_article_count)
        .add("arabic_no_diacritics", ar, ArgShape::None, no_diacritics)
        .add("arabic_punctuation", ar, ArgShape::None, punctuation)
        .add("arabic_no_latin", ar, ArgShape::None, no_latin)
        .add("arabic_eastern_digits", ar, ArgShape::None, eastern_digits)
        .add("arabic_western_digits", ar, ArgShape::None, western_digits);
}

fn diacritics_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("元音符号", "diacritics"), |t| count_chars(t, is_arabic_diacritic))
}

/// ال with its common proclitics: و، ب، ف، ك، and the contracted لل.
const ARTICLE_PREFIXES: [&str; 6] = ["وال", "بال", "فال", "كال", "لل", "ال"];

fn definite_articles(text: &str) -> Vec<String> {
    text.split(|c: char| !is_arabic(c) && !is_arabic_diacritic(c))
        .map(|w| w.chars().filter(|c| !is_arabic_diacritic(*c)).collect::<String>())
        .filter(|w| w.chars().count() > 3)
        .filter(|w| ARTICLE_PREFIXES.iter().any(|p| w.starts_with(p)))
        .collect()
}

fn definite_article_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("定冠词", "definite articles"), |t| definite_articles(t).len())
}

fn no_diacritics(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("元音符号", "diacritics"), |t| {
        find_chars(t, is_arabic_diacritic).into_iter().map(|d| format!("\u{25CC}{}", d)).collect()
    }))
}

/// Arabic comma, semicolon, and question mark instead of their Latin forms.
fn punctuation(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    let latin = find_chars(&text, |c| matches!(c, ',' | ';' | '?'));
    if !latin.is_empty() {
        return Ok(Verdict::fail(bilingual(
            format!("使用了西文标点：{}", preview(&latin)),
            format!("Latin punctuation used: {}", preview(&latin)),
        )));
    }
    let arabic = count_chars(&text, |c| matches!(c, '،' | '؛' | '؟'));
    Ok(Verdict::new(
        arabic > 0,
        bilingual(
            format!("阿拉伯标点{}个", arabic),
            format!("{} Arabic punctuation marks", arabic),
        ),
    ))
}

fn no_latin(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("拉丁字母", "Latin letters"), |t| find_chars(t, |c| c.is_ascii_alphabetic())))
}

fn digit_style(input: &Input<'_>, eastern: bool) -> Verdict {
    let text = input.joined();
    let (wanted, unwanted, zh, en) = if eastern {
        (
            count_chars(&text, is_eastern_arabic_digit),
            find_chars(&text, |c| c.is_ascii_digit()),
            "东阿拉伯数字",
            "Eastern Arabic digits",
        )
    } else {
        (
            count_chars(&text, |c| c.is_ascii_digit()),
            find_chars(&text, is_eastern_arabic_digit),
            "西阿拉伯数字",
            "Western digits",
        )
    };
    if wanted == 0 && unwanted.is_empty() {
        Verdict::fail(bilingual("未发现数字", "no digits found"))
    } else if unwanted.is_empty() {
        Verdict::pass(bilingual(format!("数字均为{}", zh), format!("all digits are {}", en)))
    } else {
        Verdict::fail(bilingual(
            format!("混用了其他数字：{}", preview(&unwanted)),
            format!("other digits used: {}", preview(&unwanted)),
        ))
    }
}

fn eastern_digits(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(digit_style(input, true))
}

fn western_digits(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(digit_style(input, false))
}
