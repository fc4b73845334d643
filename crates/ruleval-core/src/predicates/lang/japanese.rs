//! Japanese rules: script restrictions, politeness register, morae.
//!
//! Morae are counted on kana only: every kana is one mora, small
//! ゃゅょぁぃぅぇぉゎ merge into the mora before them, and っ, ー, ん each
//! count. Kanji readings are not derived, so kanji add no morae.

use super::{clause_body, clauses, count_chars, find_chars};
use crate::language::Language;
use crate::predicates::{bilingual, forbid, in_range, range_count, rhyme, Feature, Input};
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text::script::{is_han, is_hiragana, is_kana, is_katakana};
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let ja = Language::Japanese;
    builder
        .add("japanese_hiragana_only", ja, ArgShape::None, hiragana_only)
        .add("japanese_katakana_only", ja, ArgShape::None, katakana_only)
        .add("japanese_no_kanji", ja, ArgShape::None, no_kanji)
        .add("japanese_no_katakana", ja, ArgShape::None, no_katakana)
        .add("japanese_haiku", ja, ArgShape::None, haiku)
        .add("japanese_polite_form", ja, ArgShape::None, polite_form)
        .add("japanese_plain_form", ja, ArgShape::None, plain_form)
        .add("japanese_kanji_ratio", ja, ArgShape::Range, kanji_ratio)
        .add("japanese_mora_count", ja, ArgShape::Range, mora_count);
}

const SMALL_KANA: &str = "ゃゅょぁぃぅぇぉゎ";
const PROLONGED: char = 'ー';

/// Mora count of the kana in `text`.
pub fn morae(text: &str) -> usize {
    text.chars()
        .filter(|c| is_kana(*c) && *c != '・')
        .filter(|c| !SMALL_KANA.contains(rhyme::to_hiragana(*c)))
        .count()
}

fn hiragana_only(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("非平假名字符", "non-hiragana letters"), |text| {
        find_chars(text, |c| c.is_alphabetic() && !is_hiragana(c) && c != PROLONGED)
    }))
}

fn katakana_only(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("非片假名字符", "non-katakana letters"), |text| {
        find_chars(text, |c| c.is_alphabetic() && !is_katakana(c))
    }))
}

fn no_kanji(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("汉字", "kanji"), |text| find_chars(text, is_han)))
}

fn no_katakana(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("片假名", "katakana"), |text| {
        find_chars(text, |c| is_katakana(c) && c != PROLONGED && c != '・')
    }))
}

/// Three lines of 5, 7, and 5 morae.
fn haiku(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let lines = input.texts();
    let counts: Vec<usize> = lines.iter().map(|l| morae(l)).collect();
    Ok(Verdict::new(
        counts == [5, 7, 5],
        bilingual(
            format!("各句音拍数为{:?}，要求[5, 7, 5]", counts),
            format!("morae per line {:?}, required [5, 7, 5]", counts),
        ),
    ))
}

const POLITE_ENDINGS: [&str; 12] = [
    "です", "ます", "でした", "ました", "ません", "ませんでした", "ましょう", "でしょう",
    "ください", "ございます", "ですか", "ますか",
];

fn is_polite(clause: &str) -> bool {
    let body = clause_body(clause);
    let softened = body.trim_end_matches(['ね', 'よ']);
    POLITE_ENDINGS.iter().any(|e| body.ends_with(e) || softened.ends_with(e))
}

fn sentence_forms(input: &Input<'_>) -> (Vec<String>, Vec<String>) {
    clauses(&input.joined())
        .into_iter()
        .filter(|c| c.chars().any(|ch| is_kana(ch) || is_han(ch)))
        .partition(|c| is_polite(c))
}

/// Every sentence ends in the です/ます register.
fn polite_form(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let (polite, plain) = sentence_forms(input);
    let ok = !polite.is_empty() && plain.is_empty();
    Ok(Verdict::new(
        ok,
        bilingual(
            format!("敬体句{}个，简体句{}个", polite.len(), plain.len()),
            format!(
                "{} polite sentences, {} plain sentences{}",
                polite.len(),
                plain.len(),
                plain.first().map(|s| format!(" (e.g. {})", s)).unwrap_or_default()
            ),
        ),
    ))
}

/// No sentence ends in the です/ます register.
fn plain_form(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let (polite, plain) = sentence_forms(input);
    let ok = polite.is_empty() && !plain.is_empty();
    Ok(Verdict::new(
        ok,
        bilingual(
            format!("简体句{}个，敬体句{}个", plain.len(), polite.len()),
            format!(
                "{} plain sentences, {} polite sentences{}",
                plain.len(),
                polite.len(),
                polite.first().map(|s| format!(" (e.g. {})", s)).unwrap_or_default()
            ),
        ),
    ))
}

/// Kanji share of all kanji and kana, in whole percent.
fn kanji_ratio(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let range = args.range()?;
    let text = input.joined();
    let kanji = count_chars(&text, is_han);
    let kana = count_chars(&text, |c| is_kana(c) && c != PROLONGED);
    let total = kanji + kana;
    if total == 0 {
        return Ok(Verdict::fail(bilingual("未发现日文字符", "no Japanese characters found")));
    }
    let percent = ((kanji as f64 / total as f64) * 100.0).round() as u64;
    Ok(Verdict::new(
        in_range(percent, range),
        bilingual(
            format!("汉字占比{}%（{}/{}），要求[{}%, {}%]", percent, kanji, total, range.0, range.1),
            format!(
                "kanji ratio {}% ({}/{}), required [{}%, {}%]",
                percent, kanji, total, range.0, range.1
            ),
        ),
    ))
}

fn mora_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("音拍", "morae"), morae)
}

#[cfg(test)]
mod tests {
    use super::morae;
    use crate::predicates::testing::eval;

    #[test]
    fn test_morae() {
        assert_eq!(morae("きょう"), 2);
        assert_eq!(morae("がっこう"), 4);
        assert_eq!(morae("ラーメン"), 4);
        assert_eq!(morae("ふるいけや"), 5);
    }

    #[test]
    fn test_haiku() {
        let poem = ["ふるいけや", "かわずとびこむ", "みずのおと"];
        assert!(eval("japanese_haiku", &poem).passed);
        assert!(!eval("japanese_haiku", &["ふるいけや", "みずのおと"]).passed);
    }

    #[test]
    fn test_scripts() {
        assert!(eval("japanese_hiragana_only", &["ひらがなだけ"]).passed);
        assert!(!eval("japanese_hiragana_only", &["ひらがなとカタカナ"]).passed);
        assert!(eval("japanese_katakana_only", &["カタカナ・テスト"]).passed);
        assert!(!eval("japanese_no_kanji", &["日本"]).passed);
        assert!(eval("japanese_no_katakana", &["すごーい"]).passed);
    }

    #[test]
    fn test_register() {
        let polite = ["今日は晴れです。明日も行きます。"];
        assert!(eval("japanese_polite_form", &polite).passed);
        assert!(!eval("japanese_plain_form", &polite).passed);
        let plain = ["今日は晴れだ。明日も行く。"];
        assert!(eval("japanese_plain_form", &plain).passed);
        assert!(!eval("japanese_polite_form", &["今日は晴れです。明日も行く。"]).passed);
        assert!(eval("japanese_polite_form", &["いい天気ですね！"]).passed);
    }

    #[test]
    fn test_kanji_ratio() {
        // 日本 (2 kanji) + ご (1 kana) → 67%
        assert!(eval("japanese_kanji_ratio:[60,70]", &["日本ご"]).passed);
        assert!(eval("japanese_mora_count:[4,4]", &["がっこう"]).passed);
    }
}
