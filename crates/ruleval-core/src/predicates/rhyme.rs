//! Rhyme keys: the phonological tail of a line's last word.
//!
//! Two lines rhyme when their keys are equal. How a key is derived depends
//! on the language:
//!
//! - **Chinese**: the pinyin final with the medial glide removed
//!   (光 guang and 霜 shuang share `ang`).
//! - **Japanese**: the vowel of the last mora; kanji without a reading
//!   key on the character itself.
//! - **Korean**: medial vowel and final consonant of the last syllable.
//! - **French**: a small orthography-to-sound mapping (silent endings,
//!   nasal vowels, digraphs), keyed from the last pronounced vowel.
//! - **English**: last vowel group to the end, keeping a silent final `e`
//!   with the vowel before it.
//! - **Arabic**: the final letter (the rawi) after normalization.
//! - **Other alphabets**: last vowel group to the end, accents stripped.

use pinyin::ToPinyin;

use crate::language::Language;
use crate::text::{self, script, stem};

/// Rhyme key of a line, or `None` when it has no usable last word.
pub fn line_key(line: &str, lang: Language) -> Option<String> {
    match lang {
        Language::Japanese => japanese_key(line),
        _ => {
            let word = text::last_word(line)?;
            word_key(&word, lang)
        }
    }
}

/// Rhyme key of a single word.
pub fn word_key(word: &str, lang: Language) -> Option<String> {
    let word = word.trim();
    if word.is_empty() {
        return None;
    }
    match lang {
        Language::Chinese => {
            let last = word.chars().rev().find(|c| script::is_han(*c))?;
            chinese_final(last).or_else(|| Some(last.to_string()))
        }
        Language::Japanese => japanese_key(word),
        Language::Korean => korean_key(word),
        Language::French => french_key(word),
        Language::English => english_key(word),
        Language::Arabic => arabic_key(word),
        Language::Russian => vowel_tail(&word.to_lowercase().replace('ё', "е"), "аеиоуыэюя"),
        Language::Generic => match Language::detect(word) {
            Language::Generic => vowel_tail(&text::strip_accents(&word.to_lowercase()), "aeiouy"),
            detected => word_key(word, detected),
        },
        _ => vowel_tail(&text::strip_accents(&word.to_lowercase()), "aeiou"),
    }
}

/// Suffix of `word` from the start of its last vowel group.
fn vowel_tail(word: &str, vowels: &str) -> Option<String> {
    let chars: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    let last_vowel = chars.iter().rposition(|c| vowels.contains(*c))?;
    let mut start = last_vowel;
    while start > 0 && vowels.contains(chars[start - 1]) {
        start -= 1;
    }
    Some(chars[start..].iter().collect())
}

// =============================================================================
// CHINESE
// =============================================================================

const PINYIN_INITIALS: [&str; 23] = [
    "zh", "ch", "sh", "b", "p", "m", "f", "d", "t", "n", "l", "g", "k", "h", "j", "q", "x", "r",
    "z", "c", "s", "y", "w",
];

/// Toneless pinyin of a Han character.
pub fn pinyin_plain(c: char) -> Option<String> {
    c.to_pinyin().map(|p| p.plain().replace('v', "ü"))
}

/// Tone number 1-4, or 5 for the neutral tone.
pub fn chinese_tone(c: char) -> Option<u8> {
    let numbered = c.to_pinyin()?.with_tone_num_end();
    let tone = numbered
        .chars()
        .last()
        .and_then(|d| d.to_digit(10))
        .map(|d| d as u8)
        .unwrap_or(5);
    Some(tone)
}

/// The rhyming part of a syllable's final: medial glide removed.
pub fn chinese_final(c: char) -> Option<String> {
    let syllable = pinyin_plain(c)?;
    Some(strip_medial(&syllable_final(&syllable)))
}

fn syllable_final(syllable: &str) -> String {
    let initial = PINYIN_INITIALS
        .iter()
        .find(|i| syllable.starts_with(*i) && syllable.len() > i.len())
        .copied()
        .unwrap_or("");
    let rest = &syllable[initial.len()..];
    let fin = match initial {
        "j" | "q" | "x" => match rest.strip_prefix('u') {
            Some(r) => format!("ü{}", r),
            None => rest.to_string(),
        },
        "y" => {
            if let Some(r) = rest.strip_prefix('u') {
                format!("ü{}", r)
            } else if rest.starts_with('i') {
                rest.to_string()
            } else {
                format!("i{}", rest)
            }
        }
        "w" => {
            if rest.starts_with('u') {
                rest.to_string()
            } else {
                format!("u{}", rest)
            }
        }
        _ => rest.to_string(),
    };
    match fin.as_str() {
        "ui" => "uei".to_string(),
        "iu" => "iou".to_string(),
        "un" => "uen".to_string(),
        "ie" | "üe" => "ê".to_string(),
        _ => fin,
    }
}

fn strip_medial(fin: &str) -> String {
    let mut chars = fin.chars();
    match (chars.next(), chars.clone().next()) {
        (Some('i' | 'u' | 'ü'), Some('a' | 'e' | 'o' | 'ê')) => chars.collect(),
        _ => fin.to_string(),
    }
}

// =============================================================================
// JAPANESE
// =============================================================================

const KANA_A: &str = "あかさたなはまやらわがざだばぱぁゃゎ";
const KANA_I: &str = "いきしちにひみりぎじぢびぴぃゐ";
const KANA_U: &str = "うくすつぬふむゆるぐずづぶぷぅゅっゔ";
const KANA_E: &str = "えけせてねへめれげぜでべぺぇゑ";
const KANA_O: &str = "おこそとのほもよろをごぞどぼぽぉょ";

/// Katakana folded onto hiragana; other characters unchanged.
pub fn to_hiragana(c: char) -> char {
    match c {
        '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        _ => c,
    }
}

fn kana_vowel(c: char) -> Option<char> {
    let h = to_hiragana(c);
    if h == 'ん' {
        return Some('n');
    }
    [(KANA_A, 'a'), (KANA_I, 'i'), (KANA_U, 'u'), (KANA_E, 'e'), (KANA_O, 'o')]
        .iter()
        .find(|(row, _)| row.contains(h))
        .map(|(_, v)| *v)
}

fn japanese_key(line: &str) -> Option<String> {
    let chars: Vec<char> = line
        .chars()
        .filter(|c| script::is_kana(*c) || script::is_han(*c))
        .collect();
    let mut i = chars.len();
    while i > 0 {
        i -= 1;
        let c = chars[i];
        if c == 'ー' {
            continue;
        }
        if script::is_han(c) {
            return Some(c.to_string());
        }
        if let Some(v) = kana_vowel(c) {
            return Some(v.to_string());
        }
    }
    None
}

// =============================================================================
// KOREAN
// =============================================================================

fn korean_key(word: &str) -> Option<String> {
    let last = word.chars().rev().find(|c| script::is_hangul_syllable(*c))?;
    let s = last as u32 - 0xAC00;
    let medial = (s % 588) / 28;
    let fin = s % 28;
    let mut key = String::new();
    key.push(char::from_u32(0x1161 + medial)?);
    if fin > 0 {
        key.push(char::from_u32(0x11A7 + fin)?);
    }
    Some(key)
}

// =============================================================================
// ARABIC
// =============================================================================

fn arabic_key(word: &str) -> Option<String> {
    stem::normalize_arabic(word)
        .chars()
        .rev()
        .find(|c| script::is_arabic(*c))
        .map(String::from)
}

// =============================================================================
// ENGLISH
// =============================================================================

fn english_key(word: &str) -> Option<String> {
    let letters: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    // y between consonants or after a consonant acts as the vowel i
    let mut chars = letters.clone();
    for i in 1..chars.len() {
        if chars[i] == 'y' && !"aeiou".contains(letters[i - 1]) {
            chars[i] = 'i';
        }
    }
    let is_vowel = |c: char| "aeiou".contains(c);
    let n = chars.len();
    let silent_e = n >= 3 && chars[n - 1] == 'e' && !is_vowel(chars[n - 2]);
    let search_end = if silent_e { n - 1 } else { n };
    let last_vowel = chars[..search_end]
        .iter()
        .rposition(|c| is_vowel(*c))
        .or_else(|| chars.iter().rposition(|c| is_vowel(*c)))?;
    let mut start = last_vowel;
    while start > 0 && is_vowel(chars[start - 1]) {
        start -= 1;
    }
    Some(chars[start..].iter().collect())
}

// =============================================================================
// FRENCH
// =============================================================================

const FR_VOWELS: &str = "aeiouyéèêëàâîïôûùüœæ";

const FR_ER_EXCEPTIONS: [&str; 7] = ["hiver", "enfer", "hier", "cher", "fier", "amer", "mer"];

fn fr_vowel(c: char) -> bool {
    FR_VOWELS.contains(c)
}

#[derive(Debug, Clone, PartialEq)]
struct Phone {
    sound: &'static str,
    vowel: bool,
}

/// Nasal spellings, longest first: pattern, optional glide, vowel.
const FR_NASALS: [(&str, Option<&str>, &str); 16] = [
    ("ien", Some("j"), "ɛ̃"),
    ("oin", Some("w"), "ɛ̃"),
    ("ain", None, "ɛ̃"),
    ("ein", None, "ɛ̃"),
    ("in", None, "ɛ̃"),
    ("im", None, "ɛ̃"),
    ("yn", None, "ɛ̃"),
    ("ym", None, "ɛ̃"),
    ("un", None, "ɛ̃"),
    ("um", None, "ɛ̃"),
    ("an", None, "ɑ̃"),
    ("am", None, "ɑ̃"),
    ("en", None, "ɑ̃"),
    ("em", None, "ɑ̃"),
    ("on", None, "ɔ̃"),
    ("om", None, "ɔ̃"),
];

/// Multi-letter spellings of one sound: pattern, sound, is vowel.
const FR_DIGRAPHS: [(&str, &str, bool); 9] = [
    ("eau", "o", true),
    ("au", "o", true),
    ("ou", "u", true),
    ("ai", "ɛ", true),
    ("ei", "ɛ", true),
    ("œu", "ø", true),
    ("eu", "ø", true),
    ("ch", "ʃ", false),
    ("gn", "ɲ", false),
];

fn v(sound: &'static str) -> Phone {
    Phone { sound, vowel: true }
}

fn k(sound: &'static str) -> Phone {
    Phone { sound, vowel: false }
}

/// Orthographic tail adjustments before transcription.
fn french_spelling(word: &str) -> Vec<char> {
    let lower = word.to_lowercase();
    let core = lower
        .rsplit(['\'', '’'])
        .next()
        .unwrap_or(&lower)
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect::<String>();
    let mut w: Vec<char> = core.chars().collect();
    if w.len() > 1 && matches!(w.last(), Some('s' | 'x')) {
        w.pop();
    }
    let as_str: String = w.iter().collect();
    if w.len() > 3
        && (as_str.ends_with("er") || as_str.ends_with("ez"))
        && !FR_ER_EXCEPTIONS.contains(&as_str.as_str())
    {
        w.truncate(w.len() - 2);
        w.push('é');
    } else if w.len() > 2 && matches!(w.last(), Some('t' | 'd' | 'p')) {
        w.pop();
    }
    w
}

/// Whether a nasal spelling ending before index `next` is pronounced nasal.
fn nasal_at(w: &[char], next: usize) -> bool {
    match w.get(next) {
        None => true,
        Some(c) => !fr_vowel(*c) && *c != 'n' && *c != 'm',
    }
}

fn starts(w: &[char], i: usize, pat: &str) -> bool {
    let pat: Vec<char> = pat.chars().collect();
    w.len() >= i + pat.len() && w[i..i + pat.len()] == pat[..]
}

fn french_phones(word: &str) -> Vec<Phone> {
    let w = french_spelling(word);
    let mut out = Vec::new();
    let mut i = 0;
    while i < w.len() {
        let c = w[i];
        if let Some((pat, glide, sound)) = FR_NASALS
            .iter()
            .find(|(pat, _, _)| starts(&w, i, pat) && nasal_at(&w, i + pat.chars().count()))
        {
            if let Some(glide) = glide {
                out.push(k(*glide));
            }
            out.push(v(*sound));
            i += pat.chars().count();
            continue;
        }
        if let Some((pat, sound, vowel)) = FR_DIGRAPHS.iter().find(|(pat, _, _)| starts(&w, i, pat)) {
            out.push(Phone {
                sound: *sound,
                vowel: *vowel,
            });
            i += pat.chars().count();
            continue;
        }
        if starts(&w, i, "oi") {
            out.push(k("w"));
            out.push(v("a"));
            i += 2;
            continue;
        }
        if starts(&w, i, "ph") {
            out.push(k("f"));
            i += 2;
            continue;
        }
        if starts(&w, i, "qu") {
            out.push(k("k"));
            i += 2;
            continue;
        }
        let next = w.get(i + 1).copied();
        let phone = match c {
            'a' | 'à' | 'â' => v("a"),
            'é' => v("e"),
            'è' | 'ê' | 'ë' => v("ɛ"),
            'e' => {
                let closed = match (next, w.get(i + 2)) {
                    (Some(n), None) => !fr_vowel(n),
                    (Some(n), Some(m)) => !fr_vowel(n) && !fr_vowel(*m),
                    _ => false,
                };
                if closed {
                    v("ɛ")
                } else {
                    v("ə")
                }
            }
            'i' | 'î' | 'ï' | 'y' => v("i"),
            'o' | 'ô' => v("o"),
            'u' | 'û' | 'ù' | 'ü' => v("y"),
            'œ' => v("ø"),
            'c' if matches!(next, Some('e' | 'i' | 'y' | 'é' | 'è' | 'ê')) => k("s"),
            'c' => k("k"),
            'ç' => k("s"),
            'g' if matches!(next, Some('e' | 'i' | 'y' | 'é' | 'è' | 'ê')) => k("ʒ"),
            'g' => k("g"),
            'j' => k("ʒ"),
            'h' => {
                i += 1;
                continue;
            }
            'x' => k("ks"),
            'b' => k("b"),
            'd' => k("d"),
            'f' => k("f"),
            'k' => k("k"),
            'l' => k("l"),
            'm' => k("m"),
            'n' => k("n"),
            'p' => k("p"),
            'r' => k("r"),
            's' => k("s"),
            't' => k("t"),
            'v' => k("v"),
            'w' => k("w"),
            'z' => k("z"),
            _ => {
                i += 1;
                continue;
            }
        };
        // doubled consonants are pronounced once
        if !phone.vowel && out.last() == Some(&phone) {
            i += 1;
            continue;
        }
        out.push(phone);
        i += 1;
    }
    while out.len() > 1 && out.last().is_some_and(|p| p.sound == "ə") {
        out.pop();
    }
    out
}

fn french_key(word: &str) -> Option<String> {
    let phones = french_phones(word);
    let last_vowel = phones.iter().rposition(|p| p.vowel)?;
    Some(phones[last_vowel..].iter().map(|p| p.sound).collect())
}
