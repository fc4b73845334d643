//! English rules.
//!
//! Syllables are estimated from spelling: vowel groups, less a silent
//! final `e` and a silent `-ed`, with a floor of one per word.

use super::word_tokens;
use crate::language::Language;
use crate::predicates::patterns::{EN_CONTRACTION, EN_PASSIVE};
use crate::predicates::{bilingual, check_each, forbid, range_count, Feature, Input};
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text;
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let en = Language::English;
    builder
        .add("english_capitalized_each", en, ArgShape::None, capitalized_each)
        .add("english_no_contractions", en, ArgShape::None, no_contractions)
        .add("english_alliteration", en, ArgShape::None, alliteration)
        .add("english_haiku", en, ArgShape::None, haiku)
        .add("english_pangram", en, ArgShape::None, pangram)
        .add("english_contraction_count", en, ArgShape::Range, contraction_count)
        .add("english_passive_voice_count", en, ArgShape::Range, passive_count)
        .add("english_syllable_count", en, ArgShape::Range, syllable_count)
        .add("english_capital_word_count", en, ArgShape::Range, capital_word_count)
        .add("english_question_count", en, ArgShape::Range, question_count);
}

/// Function words that alliteration ignores.
const SMALL_WORDS: [&str; 24] = [
    "a", "an", "the", "and", "or", "but", "of", "in", "on", "at", "to", "for", "by", "with",
    "from", "as", "is", "are", "was", "it", "its", "his", "her", "their",
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Estimated syllables of one word.
pub fn syllables(word: &str) -> usize {
    let w: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if w.is_empty() {
        return 0;
    }
    let mut groups = 0;
    let mut prev_vowel = false;
    for &c in &w {
        let v = is_vowel(c);
        if v && !prev_vowel {
            groups += 1;
        }
        prev_vowel = v;
    }
    let n = w.len();
    if n > 2 && w[n - 1] == 'e' && !is_vowel(w[n - 2]) && !(w[n - 2] == 'l' && !is_vowel(w[n - 3])) {
        groups -= 1;
    }
    if n > 3 && w[n - 2] == 'e' && w[n - 1] == 'd' && !matches!(w[n - 3], 't' | 'd') && !is_vowel(w[n - 3]) {
        groups -= 1;
    }
    groups.max(1)
}

fn text_syllables(text: &str) -> usize {
    word_tokens(text).iter().map(|w| syllables(w)).sum()
}

fn capitalized_each(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(check_each(
        input,
        bilingual("每部分首字母大写", "every part starts with a capital letter"),
        |part| {
            let first = part.chars().find(|c| c.is_alphabetic())?;
            (!first.is_uppercase()).then(|| bilingual(format!("首字母为「{}」", first), format!("starts with '{}'", first)))
        },
    ))
}

fn no_contractions(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("缩写形式", "contractions"), |text| {
        EN_CONTRACTION.find_iter(text).map(|m| m.as_str().to_string()).collect()
    }))
}

/// The content words of each part share an initial letter.
fn alliteration(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(check_each(
        input,
        bilingual("每部分均押头韵", "every part alliterates"),
        |part| {
            let initials: Vec<char> = text::tokenize(part)
                .iter()
                .filter(|w| !SMALL_WORDS.contains(&w.as_str()))
                .filter_map(|w| w.chars().next())
                .filter(|c| c.is_alphabetic())
                .collect();
            if initials.len() < 2 {
                return Some(bilingual("实词不足两个", "fewer than two content words"));
            }
            let first = initials[0];
            let odd: Vec<String> = initials.iter().filter(|c| **c != first).map(|c| c.to_string()).collect();
            (!odd.is_empty()).then(|| {
                bilingual(
                    format!("首字母不一致：{}与{}", first, odd.join(", ")),
                    format!("initials differ: {} vs {}", first, odd.join(", ")),
                )
            })
        },
    ))
}

/// Three lines of 5, 7, and 5 syllables.
fn haiku(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let counts: Vec<usize> = input.texts().iter().map(|l| text_syllables(l)).collect();
    Ok(Verdict::new(
        counts == [5, 7, 5],
        bilingual(
            format!("各行音节数为{:?}，要求[5, 7, 5]", counts),
            format!("syllables per line {:?}, required [5, 7, 5]", counts),
        ),
    ))
}

/// Every letter a..z appears.
fn pangram(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let lower = input.joined().to_lowercase();
    let missing: String = ('a'..='z').filter(|c| !lower.contains(*c)).collect();
    Ok(if missing.is_empty() {
        Verdict::pass(bilingual("包含全部26个字母", "all 26 letters used"))
    } else {
        Verdict::fail(bilingual(format!("缺少字母：{}", missing), format!("missing letters: {}", missing)))
    })
}

fn contraction_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("缩写形式", "contractions"), |t| EN_CONTRACTION.find_iter(t).count())
}

fn passive_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("被动语态", "passive constructions"), |t| EN_PASSIVE.find_iter(t).count())
}

fn syllable_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("音节", "syllables"), text_syllables)
}

fn capital_word_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("全大写单词", "all-caps words"), |t| {
        word_tokens(t)
            .iter()
            .filter(|w| w.chars().filter(|c| c.is_alphabetic()).count() >= 2)
            .filter(|w| w.chars().all(|c| !c.is_alphabetic() || c.is_uppercase()))
            .count()
    })
}

fn question_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("问句", "questions"), |t| {
        text::sentences(t).iter().filter(|s| s.trim_end().ends_with('?')).count()
    })
}

#[cfg(test)]
mod tests {
    use super::syllables;
    use crate::predicates::testing::eval;

    #[test]
    fn test_syllables() {
        assert_eq!(syllables("pond"), 1);
        assert_eq!(syllables("silent"), 2);
        assert_eq!(syllables("table"), 2);
        assert_eq!(syllables("make"), 1);
        assert_eq!(syllables("jumped"), 1);
        assert_eq!(syllables("wanted"), 2);
        assert_eq!(syllables("the"), 1);
    }

    #[test]
    fn test_haiku() {
        let poem = ["An old silent pond", "A frog jumps into the pond", "Splash! Silence again"];
        assert!(eval("english_haiku", &poem).passed);
        assert!(!eval("english_haiku", &["An old silent pond", "Splash! Silence again"]).passed);
    }

    #[test]
    fn test_alliteration() {
        assert!(eval("english_alliteration", &["Peter picked a peck of pickled peppers"]).passed);
        let v = eval("english_alliteration", &["Sally sells shells", "Big red dog"]);
        assert!(!v.passed);
        assert!(v.explanation.contains("part 2"));
    }

    #[test]
    fn test_pangram_and_contractions() {
        assert!(eval("english_pangram", &["The quick brown fox jumps over the lazy dog"]).passed);
        assert!(!eval("english_pangram", &["Hello world"]).passed);
        assert!(!eval("english_no_contractions", &["I can't go"]).passed);
        assert!(eval("english_contraction_count:[2,2]", &["I can't, you won't"]).passed);
    }

    #[test]
    fn test_counts() {
        assert!(eval("english_passive_voice_count:[1,1]", &["The cake was eaten by the dog."]).passed);
        assert!(eval("english_capital_word_count:[1,1]", &["This is VERY important, I said."]).passed);
        assert!(eval("english_question_count:[2,2]", &["Why? Who knows. How?"]).passed);
        assert!(eval("english_capitalized_each", &["Hello", "World"]).passed);
        assert!(!eval("english_capitalized_each", &["Hello", "world"]).passed);
    }
}
