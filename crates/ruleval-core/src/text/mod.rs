//! Text processing utilities: word counting, tokenization, occurrence
//! matching, sentence splitting, and normalization.
//!
//! ## Word definitions
//!
//! | Language | Word |
//! |---|---|
//! | Chinese | one CJK ideograph |
//! | Japanese | one kanji or kana |
//! | Korean | whitespace token with a Hangul syllable |
//! | Russian | whitespace token with a Cyrillic letter |
//! | Arabic | whitespace token with an Arabic letter |
//! | Latin languages | whitespace token with a letter of the language's alphabet |
//! | Generic | CJK characters count one each, other tokens need a letter |

pub mod script;
pub mod stem;

use std::collections::HashSet;
use std::sync::OnceLock;

use unicode_segmentation::UnicodeSegmentation;

use crate::language::Language;
use script::{is_cjk, is_han, is_kana};

/// Punctuation outside ASCII that the predicates treat like ASCII punctuation.
const EXTRA_PUNCTUATION: &str =
    "，。！？；：、“”‘’（）《》〈〉【】「」『』…—–·～〜・¿¡«»،؛؟„‚‹›";

static PUNCTUATION: OnceLock<HashSet<char>> = OnceLock::new();

fn punctuation_set() -> &'static HashSet<char> {
    PUNCTUATION.get_or_init(|| EXTRA_PUNCTUATION.chars().collect())
}

/// ASCII, CJK, and other script punctuation.
pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || punctuation_set().contains(&c)
}

/// Sentence-ending punctuation in any supported script.
pub fn is_terminal_punctuation(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？' | '…' | '؟')
}

/// Words of `text` under the language's definition (see module docs).
pub fn words(text: &str, lang: Language) -> Vec<String> {
    match lang {
        Language::Chinese => text.chars().filter(|c| is_han(*c)).map(String::from).collect(),
        Language::Japanese => text
            .chars()
            .filter(|c| is_han(*c) || is_kana(*c))
            .map(String::from)
            .collect(),
        Language::Generic => {
            let mut out = Vec::new();
            for token in text.split_whitespace() {
                let mut rest = String::new();
                for c in token.chars() {
                    if is_cjk(c) {
                        out.push(c.to_string());
                    } else {
                        rest.push(c);
                    }
                }
                if rest.chars().any(char::is_alphabetic) {
                    out.push(rest);
                }
            }
            out
        }
        _ => text
            .split_whitespace()
            .filter(|t| t.chars().any(|c| lang.alphabet_contains(c)))
            .map(String::from)
            .collect(),
    }
}

/// Number of words in `text`.
pub fn word_count(text: &str, lang: Language) -> usize {
    words(text, lang).len()
}

/// Count of non-whitespace characters.
pub fn char_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Lowercase tokens split on anything that is not a letter, digit, or CJK character.
///
/// Apostrophes split tokens, so `l'homme` yields `l` and `homme`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Tokenize and stem for whole-word matching.
pub fn stemmed_tokens(text: &str, lang: Language) -> Vec<String> {
    tokenize(text)
        .iter()
        .map(|t| stem::stem(t, lang))
        .collect()
}

/// Whether occurrence matching for `needle` is substring-based.
pub fn uses_substring_match(needle: &str, lang: Language) -> bool {
    lang.is_cjk() || needle.chars().any(is_cjk)
}

/// Count occurrences of `needle` in `haystack`.
///
/// Substring match (case-insensitive, non-overlapping) for CJK languages or
/// CJK needles; otherwise whole-token match of the stemmed token sequence.
pub fn count_occurrences(haystack: &str, needle: &str, lang: Language) -> usize {
    let needle = needle.trim();
    if needle.is_empty() {
        return 0;
    }
    if uses_substring_match(needle, lang) {
        return haystack.to_lowercase().matches(&needle.to_lowercase()).count();
    }
    let hay = stemmed_tokens(haystack, lang);
    let pattern = stemmed_tokens(needle, lang);
    if pattern.is_empty() || pattern.len() > hay.len() {
        return 0;
    }
    let mut count = 0;
    let mut i = 0;
    while i + pattern.len() <= hay.len() {
        if hay[i..i + pattern.len()] == pattern[..] {
            count += 1;
            i += pattern.len();
        } else {
            i += 1;
        }
    }
    count
}

/// Minimum length of a prompt line that is treated as an echo when copied verbatim.
const ECHO_LINE_MIN_CHARS: usize = 8;

/// Remove verbatim copies of the prompt (whole, or line by line) from `text`.
///
/// Keywords that appear only because the answer repeats the prompt must not count.
pub fn strip_prompt_echo(text: &str, prompt: &str) -> String {
    let mut out = text.to_string();
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return out;
    }
    if out.contains(prompt) {
        out = out.replace(prompt, " ");
    }
    for line in prompt.lines().map(str::trim) {
        if line.chars().count() >= ECHO_LINE_MIN_CHARS && out.contains(line) {
            out = out.replace(line, " ");
        }
    }
    out
}

/// Sentences by Unicode sentence boundaries, trimmed, empties dropped.
pub fn sentences(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Paragraphs separated by blank lines.
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                out.push(current.trim().to_string());
            }
            current.clear();
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

/// Lowercase and strip whitespace and punctuation from both ends.
pub fn normalize_edges(text: &str) -> String {
    text.to_lowercase()
        .trim_matches(|c: char| c.is_whitespace() || is_punctuation(c))
        .to_string()
}

/// Trim whitespace and markup decoration (quotes, bullets, markdown emphasis) from both ends.
pub fn trim_decoration(text: &str) -> &str {
    text.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '"' | '\'' | '*' | '_' | '`' | '“' | '”' | '‘' | '’' | '「' | '」' | '-' | '#')
    })
}

/// Replace accented Latin letters with their base letter.
pub fn strip_accents(text: &str) -> String {
    text.chars().map(base_letter).collect()
}

/// Base letter of an accented Latin character; other characters pass through.
pub fn base_letter(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Whether `c` is an accented Latin letter.
pub fn is_accented(c: char) -> bool {
    base_letter(c) != c
}

/// Last word of `text` for rhyme purposes: the final token for spaced
/// scripts, or the final character for Han and kana.
pub fn last_word(text: &str) -> Option<String> {
    let trimmed = text.trim_end_matches(|c: char| c.is_whitespace() || is_punctuation(c) || c.is_ascii_digit());
    let last = trimmed.chars().last()?;
    if is_han(last) || is_kana(last) {
        return Some(last.to_string());
    }
    trimmed
        .split(|c: char| c.is_whitespace() || is_punctuation(c))
        .filter(|t| !t.is_empty())
        .last()
        .map(|t| t.to_lowercase())
}

/// Keep only characters of `lang`'s script; digits and punctuation are removed.
pub fn isolate_script(text: &str, lang: Language) -> String {
    text.chars()
        .filter(|c| lang.alphabet_contains(*c) || (c.is_whitespace() && !lang.is_cjk()))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_per_language() {
        assert_eq!(word_count("one two three", Language::English), 3);
        assert_eq!(word_count("one, two - 3", Language::English), 2);
        assert_eq!(word_count("我爱北京天安门", Language::Chinese), 7);
        assert_eq!(word_count("Привет, мир! 2024", Language::Russian), 2);
        assert_eq!(word_count("مرحبا بالعالم 3", Language::Arabic), 2);
        assert_eq!(word_count("Grüße aus München", Language::German), 3);
    }

    #[test]
    fn test_generic_words_mix_scripts() {
        assert_eq!(word_count("hello 世界", Language::Generic), 3);
    }

    #[test]
    fn test_count_occurrences_stemmed() {
        assert_eq!(count_occurrences("Cities and a city", "city", Language::English), 2);
        assert_eq!(count_occurrences("New York, new york!", "New York", Language::English), 2);
        assert_eq!(count_occurrences("Parisian", "Paris", Language::English), 0);
    }

    #[test]
    fn test_count_occurrences_substring_for_cjk() {
        assert_eq!(count_occurrences("北京是北京", "北京", Language::Chinese), 2);
        assert_eq!(count_occurrences("我在北京", "北京", Language::English), 1);
    }

    #[test]
    fn test_strip_prompt_echo() {
        let prompt = "Mention Paris and Lyon.";
        let echoed = "Mention Paris and Lyon. Lyon is nice.";
        let stripped = strip_prompt_echo(echoed, prompt);
        assert_eq!(count_occurrences(&stripped, "Paris", Language::English), 0);
        assert_eq!(count_occurrences(&stripped, "Lyon", Language::English), 1);
    }

    #[test]
    fn test_sentences_and_paragraphs() {
        assert_eq!(sentences("One. Two! Three?").len(), 3);
        assert_eq!(paragraphs("a\nb\n\n\nc").len(), 2);
    }

    #[test]
    fn test_normalize_edges() {
        assert_eq!(normalize_edges("  «Bonjour!» "), "bonjour");
        assert_eq!(normalize_edges("“你好。”"), "你好");
    }

    #[test]
    fn test_last_word() {
        assert_eq!(last_word("Under the moon,").as_deref(), Some("moon"));
        assert_eq!(last_word("床前明月光。").as_deref(), Some("光"));
        assert_eq!(last_word("...").as_deref(), None);
    }

    #[test]
    fn test_isolate_script() {
        assert_eq!(isolate_script("Hello, 世界 123!", Language::English), "hello");
        assert_eq!(isolate_script("你好, world 1", Language::Chinese), "你好");
    }
}
