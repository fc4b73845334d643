//! Languages known to the rule registry.
//!
//! Each rule belongs to exactly one language group. `Generic` rules work
//! on any text and pick their working language per item (hint first,
//! detection second).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::text::script::{self, Script};

/// A language group in the rule registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Generic,
    Chinese,
    Japanese,
    Korean,
    English,
    German,
    French,
    Spanish,
    Portuguese,
    Russian,
    Arabic,
    Indonesian,
}

impl Language {
    /// Every language with its own predicates, in registry order.
    pub const SPECIFIC: [Language; 11] = [
        Language::Chinese,
        Language::Japanese,
        Language::Korean,
        Language::English,
        Language::German,
        Language::French,
        Language::Spanish,
        Language::Portuguese,
        Language::Russian,
        Language::Arabic,
        Language::Indonesian,
    ];

    /// Lowercase English name, also the rule-name prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Generic => "generic",
            Language::Chinese => "chinese",
            Language::Japanese => "japanese",
            Language::Korean => "korean",
            Language::English => "english",
            Language::German => "german",
            Language::French => "french",
            Language::Spanish => "spanish",
            Language::Portuguese => "portuguese",
            Language::Russian => "russian",
            Language::Arabic => "arabic",
            Language::Indonesian => "indonesian",
        }
    }

    /// Chinese display name used in bilingual explanations.
    pub fn chinese_name(&self) -> &'static str {
        match self {
            Language::Generic => "通用",
            Language::Chinese => "中文",
            Language::Japanese => "日语",
            Language::Korean => "韩语",
            Language::English => "英语",
            Language::German => "德语",
            Language::French => "法语",
            Language::Spanish => "西班牙语",
            Language::Portuguese => "葡萄牙语",
            Language::Russian => "俄语",
            Language::Arabic => "阿拉伯语",
            Language::Indonesian => "印尼语",
        }
    }

    /// Parse an English name, ISO 639-1 code, or Chinese name.
    pub fn from_name(name: &str) -> Option<Language> {
        let lowered = name.trim().to_lowercase();
        let lang = match lowered.as_str() {
            "generic" | "any" | "通用" => Language::Generic,
            "chinese" | "zh" | "zh-cn" | "cn" | "中文" | "汉语" => Language::Chinese,
            "japanese" | "ja" | "jp" | "日语" | "日文" => Language::Japanese,
            "korean" | "ko" | "kr" | "韩语" | "韩文" => Language::Korean,
            "english" | "en" | "英语" | "英文" => Language::English,
            "german" | "de" | "deutsch" | "德语" => Language::German,
            "french" | "fr" | "français" | "法语" => Language::French,
            "spanish" | "es" | "español" | "西班牙语" => Language::Spanish,
            "portuguese" | "pt" | "pt-br" | "português" | "葡萄牙语" => Language::Portuguese,
            "russian" | "ru" | "русский" | "俄语" => Language::Russian,
            "arabic" | "ar" | "العربية" | "阿拉伯语" => Language::Arabic,
            "indonesian" | "id" | "bahasa" | "印尼语" | "印度尼西亚语" => Language::Indonesian,
            _ => return None,
        };
        Some(lang)
    }

    /// Whether keyword occurrence is substring-based for this language.
    pub fn is_cjk(&self) -> bool {
        matches!(
            self,
            Language::Chinese | Language::Japanese | Language::Korean
        )
    }

    /// Whether this language writes with the Latin alphabet.
    pub fn is_latin(&self) -> bool {
        matches!(
            self,
            Language::English
                | Language::German
                | Language::French
                | Language::Spanish
                | Language::Portuguese
                | Language::Indonesian
        )
    }

    /// Whether `c` belongs to this language's alphabet.
    pub fn alphabet_contains(&self, c: char) -> bool {
        let extra: &str = match self {
            Language::English | Language::Indonesian => "",
            Language::German => "äöüßÄÖÜẞ",
            Language::French => "àâæçéèêëîïôœùûüÿÀÂÆÇÉÈÊËÎÏÔŒÙÛÜŸ",
            Language::Spanish => "áéíóúüñÁÉÍÓÚÜÑ",
            Language::Portuguese => "áâãàçéêíóôõúüÁÂÃÀÇÉÊÍÓÔÕÚÜ",
            Language::Russian => return script::is_cyrillic(c),
            Language::Arabic => return script::is_arabic(c),
            Language::Korean => return script::is_hangul(c),
            Language::Japanese => return script::is_kana(c) || script::is_han(c),
            Language::Chinese => return script::is_han(c),
            Language::Generic => return c.is_alphabetic(),
        };
        c.is_ascii_alphabetic() || extra.contains(c)
    }

    /// Detect the primary language of `text`.
    ///
    /// Non-Latin scripts map directly; Latin text is scored against short
    /// stop-word lists and diacritics. Returns `Generic` when `text` has no letters.
    pub fn detect(text: &str) -> Language {
        let has_kana = text.chars().any(script::is_kana);
        match script::dominant_script(text) {
            None => Language::Generic,
            Some(Script::Hiragana) | Some(Script::Katakana) => Language::Japanese,
            Some(Script::Han) if has_kana => Language::Japanese,
            Some(Script::Han) => Language::Chinese,
            Some(Script::Hangul) => Language::Korean,
            Some(Script::Cyrillic) => Language::Russian,
            Some(Script::Arabic) => Language::Arabic,
            Some(_) => detect_latin(text),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const LATIN_MARKERS: [(Language, &[&str], &str); 6] = [
    (
        Language::English,
        &["the", "and", "is", "are", "of", "to", "with", "this", "that", "you", "it", "was"],
        "",
    ),
    (
        Language::German,
        &["der", "die", "das", "und", "ist", "nicht", "ein", "eine", "ich", "mit", "sie", "auf"],
        "äöüß",
    ),
    (
        Language::French,
        &["le", "la", "les", "et", "est", "une", "des", "du", "je", "vous", "pas", "dans"],
        "çèêàùâîôœ",
    ),
    (
        Language::Spanish,
        &["el", "los", "las", "y", "es", "una", "del", "por", "con", "que", "muy", "pero"],
        "ñ¿¡",
    ),
    (
        Language::Portuguese,
        &["o", "os", "as", "e", "um", "uma", "não", "com", "para", "do", "da", "muito"],
        "ãõ",
    ),
    (
        Language::Indonesian,
        &["dan", "yang", "di", "ini", "itu", "dengan", "untuk", "tidak", "saya", "ke", "dari", "akan"],
        "",
    ),
];

fn detect_latin(text: &str) -> Language {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| !t.is_empty())
        .collect();

    let mut best = (Language::English, 0usize);
    for (lang, stopwords, marks) in LATIN_MARKERS.iter() {
        let words = tokens.iter().filter(|t| stopwords.contains(t)).count();
        let diacritics = lowered.chars().filter(|c| marks.contains(*c)).count();
        let score = words * 2 + diacritics * 3;
        if score > best.1 {
            best = (*lang, score);
        }
    }
    best.0
}
