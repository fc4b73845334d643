//! Chinese rules. `jielong` and `cangtou` live with the other poetic forms.

use super::{count_chars, find_chars};
use crate::language::Language;
use crate::predicates::{bilingual, check_each, forbid, range_count, rhyme, Feature, Input};
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text::script::is_han;
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let zh = Language::Chinese;
    builder
        .add("chinese_four_character_each", zh, ArgShape::None, four_character_each)
        .add("chinese_couplet", zh, ArgShape::None, couplet)
        .add("chinese_full_width_punctuation", zh, ArgShape::None, full_width_punctuation)
        .add("chinese_no_english", zh, ArgShape::None, no_english)
        .add("chinese_no_arabic_numerals", zh, ArgShape::None, no_arabic_numerals)
        .add("chinese_reduplication_count", zh, ArgShape::Range, reduplication_count);
}

fn han_count(text: &str) -> usize {
    count_chars(text, is_han)
}

/// Every part is exactly four Han characters, punctuation aside.
fn four_character_each(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(check_each(
        input,
        bilingual("每部分均为四字", "every part has four characters"),
        |part| {
            let han = han_count(part);
            let other = part.chars().filter(|c| c.is_alphanumeric() && !is_han(*c)).count();
            (han != 4 || other > 0).then(|| bilingual(format!("{}个汉字", han), format!("{} Han characters", han)))
        },
    ))
}

/// Tone of the last Han character.
fn final_tone(part: &str) -> Option<(char, u8)> {
    let last = part.chars().rev().find(|c| is_han(*c))?;
    Some((last, rhyme::chinese_tone(last)?))
}

/// Two lines of equal length; the first ends on an oblique tone, the second on a level tone.
fn couplet(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let parts = input.texts();
    if parts.len() != 2 {
        return Ok(Verdict::fail(bilingual(
            format!("对联应为上下两联，实际{}部分", parts.len()),
            format!("a couplet has two lines, got {}", parts.len()),
        )));
    }
    let (upper, lower) = (han_count(parts[0]), han_count(parts[1]));
    if upper != lower || upper == 0 {
        return Ok(Verdict::fail(bilingual(
            format!("上下联字数不等：{}与{}", upper, lower),
            format!("line lengths differ: {} and {}", upper, lower),
        )));
    }
    let (Some((c1, t1)), Some((c2, t2))) = (final_tone(parts[0]), final_tone(parts[1])) else {
        return Ok(Verdict::fail(bilingual("无法识别联尾声调", "cannot read the final tones")));
    };
    let oblique = matches!(t1, 3 | 4);
    let level = matches!(t2, 1 | 2);
    Ok(Verdict::new(
        oblique && level,
        bilingual(
            format!("上联尾字「{}」{}声，下联尾字「{}」{}声，要求仄起平收", c1, t1, c2, t2),
            format!(
                "upper line ends on tone {} ({}), lower on tone {} ({}); required oblique then level",
                t1, c1, t2, c2
            ),
        ),
    ))
}

fn is_half_width_punctuation(prev: Option<char>, c: char, next: Option<char>) -> bool {
    match c {
        ',' | '!' | '?' | ';' | '(' | ')' => true,
        // decimal points and times stay half-width
        '.' | ':' => !(prev.is_some_and(|p| p.is_ascii_digit()) && next.is_some_and(|n| n.is_ascii_digit())),
        _ => false,
    }
}

/// No half-width punctuation where Chinese text requires full-width forms.
fn full_width_punctuation(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("半角标点", "half-width punctuation"), |text| {
        let chars: Vec<char> = text.chars().collect();
        (0..chars.len())
            .filter(|&i| {
                let prev = i.checked_sub(1).map(|p| chars[p]);
                is_half_width_punctuation(prev, chars[i], chars.get(i + 1).copied())
            })
            .map(|i| chars[i].to_string())
            .collect()
    }))
}

fn no_english(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("英文字母", "Latin letters"), |text| {
        super::word_tokens(text)
            .into_iter()
            .filter(|t| t.chars().any(|c| c.is_ascii_alphabetic()))
            .map(String::from)
            .collect()
    }))
}

fn no_arabic_numerals(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("阿拉伯数字", "Arabic numerals"), |text| {
        find_chars(text, |c| c.is_ascii_digit() || ('０'..='９').contains(&c))
    }))
}

/// Runs of one Han character written twice in a row (高高, 兴兴).
fn reduplications(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut count = 0;
    let mut i = 0;
    while i + 1 < chars.len() {
        if is_han(chars[i]) && chars[i] == chars[i + 1] {
            count += 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    count
}

fn reduplication_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("叠词", "reduplicated characters"), reduplications)
}

#[cfg(test)]
mod tests {
    use crate::predicates::testing::eval;

    #[test]
    fn test_four_character_each() {
        assert!(eval("chinese_four_character_each", &["画蛇添足", "守株待兔。"]).passed);
        let v = eval("chinese_four_character_each", &["画蛇添足", "一石二鸟啊"]);
        assert!(!v.passed);
        assert!(v.explanation.contains("part 2"));
    }

    #[test]
    fn test_couplet() {
        // 秀 xiu4 ends the upper line, 荣 rong2 the lower
        assert!(eval("chinese_couplet", &["春回大地千山秀", "日照神州万木荣"]).passed);
        assert!(!eval("chinese_couplet", &["日照神州万木荣", "春回大地千山秀"]).passed);
        assert!(!eval("chinese_couplet", &["春风", "秋月夜"]).passed);
        assert!(!eval("chinese_couplet", &["只有一句"]).passed);
    }

    #[test]
    fn test_punctuation_and_scripts() {
        assert!(eval("chinese_full_width_punctuation", &["你好，世界！圆周率是3.14。"]).passed);
        assert!(!eval("chinese_full_width_punctuation", &["你好,世界!"]).passed);
        assert!(eval("chinese_no_english", &["全是中文"]).passed);
        assert!(!eval("chinese_no_english", &["我用iPhone"]).passed);
        assert!(!eval("chinese_no_arabic_numerals", &["三月3日"]).passed);
    }

    #[test]
    fn test_reduplication_count() {
        assert!(eval("chinese_reduplication_count:[2,2]", &["高高兴兴"]).passed);
        assert!(eval("chinese_reduplication_count:[0,0]", &["高兴"]).passed);
    }
}
