//! Unicode script classification.
//!
//! Block ranges only; no normalization is applied here.

/// Writing system a character belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Han,
    Hiragana,
    Katakana,
    Hangul,
    Cyrillic,
    Arabic,
    Latin,
    Digit,
    Other,
}

/// CJK unified ideographs (basic block, extension A, compatibility).
pub fn is_han(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}'
        | '\u{3007}'
    )
}

pub fn is_hiragana(c: char) -> bool {
    matches!(c, '\u{3041}'..='\u{309F}')
}

/// Katakana including the prolonged sound mark and half-width forms.
pub fn is_katakana(c: char) -> bool {
    matches!(c, '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}')
}

pub fn is_kana(c: char) -> bool {
    is_hiragana(c) || is_katakana(c)
}

/// Precomposed syllables and conjoining jamo.
pub fn is_hangul(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7A3}'
        | '\u{1100}'..='\u{11FF}'
        | '\u{3130}'..='\u{318F}'
    )
}

pub fn is_hangul_syllable(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}')
}

pub fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}' | '\u{0500}'..='\u{052F}')
}

pub fn is_arabic(c: char) -> bool {
    matches!(c,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{08A0}'..='\u{08FF}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}'
    ) && !is_arabic_punctuation(c)
        && !is_eastern_arabic_digit(c)
}

/// Arabic tashkeel (harakat, tanween, shadda, sukun, dagger alef).
pub fn is_arabic_diacritic(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{0652}' | '\u{0670}')
}

pub fn is_arabic_punctuation(c: char) -> bool {
    matches!(c, '،' | '؛' | '؟' | '٪' | '۔')
}

/// Arabic-Indic digits (٠..٩) and the extended Persian forms.
pub fn is_eastern_arabic_digit(c: char) -> bool {
    matches!(c, '\u{0660}'..='\u{0669}' | '\u{06F0}'..='\u{06F9}')
}

/// Latin letters including accented Latin-1 and Latin Extended-A/B.
pub fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic()
        || (matches!(c, '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}')
            && c != '×'
            && c != '÷')
}

pub fn script_of(c: char) -> Script {
    if is_han(c) {
        Script::Han
    } else if is_hiragana(c) {
        Script::Hiragana
    } else if is_katakana(c) {
        Script::Katakana
    } else if is_hangul(c) {
        Script::Hangul
    } else if is_cyrillic(c) {
        Script::Cyrillic
    } else if is_arabic(c) {
        Script::Arabic
    } else if is_latin(c) {
        Script::Latin
    } else if c.is_numeric() {
        Script::Digit
    } else {
        Script::Other
    }
}

/// Characters for which keyword occurrence is a plain substring match.
pub fn is_cjk(c: char) -> bool {
    is_han(c) || is_kana(c) || is_hangul(c)
}

/// The script with the most letters in `text`, ignoring digits and symbols.
pub fn dominant_script(text: &str) -> Option<Script> {
    let mut counts: Vec<(Script, usize)> = Vec::new();
    for c in text.chars() {
        let script = match script_of(c) {
            Script::Digit | Script::Other => continue,
            // kana and kanji vote together so mixed Japanese is not read as Chinese
            Script::Hiragana | Script::Katakana => Script::Hiragana,
            s => s,
        };
        match counts.iter_mut().find(|(s, _)| *s == script) {
            Some((_, n)) => *n += 1,
            None => counts.push((script, 1)),
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, n)| *n)
        .map(|(s, _)| s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_of() {
        assert_eq!(script_of('中'), Script::Han);
        assert_eq!(script_of('の'), Script::Hiragana);
        assert_eq!(script_of('カ'), Script::Katakana);
        assert_eq!(script_of('한'), Script::Hangul);
        assert_eq!(script_of('ж'), Script::Cyrillic);
        assert_eq!(script_of('ب'), Script::Arabic);
        assert_eq!(script_of('é'), Script::Latin);
        assert_eq!(script_of('7'), Script::Digit);
        assert_eq!(script_of('!'), Script::Other);
    }

    #[test]
    fn test_arabic_punctuation_is_not_a_letter() {
        assert!(!is_arabic('،'));
        assert!(is_arabic_punctuation('؟'));
        assert!(is_eastern_arabic_digit('٣'));
    }

    #[test]
    fn test_dominant_script() {
        assert_eq!(dominant_script("Hello 世界 world"), Some(Script::Latin));
        assert_eq!(dominant_script("你好世界 ok"), Some(Script::Han));
        assert_eq!(dominant_script("123 !!"), None);
    }
}
