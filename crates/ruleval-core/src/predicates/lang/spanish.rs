//! Spanish rules.
//!
//! Numbers follow the Spanish convention: `.` or a space groups thousands
//! and `,` marks decimals. Currency amounts put the symbol or code after
//! the amount, separated by a space.

use super::{address_verdict, clauses, count_chars, find_suffixed, find_words};
use crate::language::Language;
use crate::predicates::patterns::{ES_CURRENCY, ES_CURRENCY_VALID, ES_NUMBER, ES_NUMBER_VALID, ES_ORDINAL};
use crate::predicates::{bilingual, preview, range_count, Feature, Input};
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let es = Language::Spanish;
    builder
        .add("spanish_accent_count", es, ArgShape::Range, accent_count)
        .add("spanish_diminutive_count", es, ArgShape::Range, diminutive_count)
        .add("spanish_ordinal_abbreviation_count", es, ArgShape::Range, ordinal_count)
        .add("spanish_n_tilde_count", es, ArgShape::Range, n_tilde_count)
        .add("spanish_inverted_punctuation", es, ArgShape::None, inverted_punctuation)
        .add("spanish_number_format", es, ArgShape::None, number_format)
        .add("spanish_currency_format", es, ArgShape::None, currency_format)
        .add("spanish_formal_address", es, ArgShape::None, formal_address)
        .add("spanish_informal_address", es, ArgShape::None, informal_address);
}

/// Outcome of checking every occurrence of a construction.
fn construction_verdict(found: usize, bad: &[String], feature: (&str, &str)) -> Verdict {
    let (zh, en) = feature;
    if found == 0 {
        Verdict::fail(bilingual(format!("未发现{}", zh), format!("no {} found", en)))
    } else if bad.is_empty() {
        Verdict::pass(bilingual(
            format!("{}处{}格式正确", found, zh),
            format!("all {} {} correctly written", found, en),
        ))
    } else {
        Verdict::fail(bilingual(
            format!("{}格式错误：{}", zh, preview(bad)),
            format!("malformed {}: {}", en, preview(bad)),
        ))
    }
}

fn accent_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("重音字母", "accented vowels"), |t| {
        count_chars(t, |c| matches!(c, 'á' | 'é' | 'í' | 'ó' | 'ú' | 'Á' | 'É' | 'Í' | 'Ó' | 'Ú'))
    })
}

const DIMINUTIVE_SUFFIXES: [&str; 8] = ["ito", "ita", "itos", "itas", "illo", "illa", "illos", "illas"];

/// Words with a diminutive-looking ending that are not diminutives.
const NOT_DIMINUTIVE: [&str; 36] = [
    "bonito", "bonita", "bonitos", "bonitas", "maldito", "maldita", "infinito", "infinita", "cita",
    "visita", "necesita", "necesito", "favorito", "favorita", "grito", "mito", "rito", "delito",
    "apetito", "requisito", "gratuito", "gratuita", "exquisito", "exquisita", "escrito", "escrita",
    "silla", "sillas", "orilla", "mejilla", "semilla", "ardilla", "pasillo", "cuchillo", "ladrillo",
    "tortilla",
];

fn diminutives(text: &str) -> Vec<String> {
    find_suffixed(text, &DIMINUTIVE_SUFFIXES, 5, &NOT_DIMINUTIVE)
}

fn diminutive_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("指小词", "diminutives"), |t| diminutives(t).len())
}

fn ordinal_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("序数词缩写", "ordinal abbreviations"), |t| {
        ES_ORDINAL.find_iter(t).count()
    })
}

fn n_tilde_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("ñ", "ñ"), |t| count_chars(t, |c| c == 'ñ' || c == 'Ñ'))
}

/// Every question and exclamation opens with ¿ or ¡.
fn inverted_punctuation(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let mut found = 0;
    let mut bad = Vec::new();
    for clause in clauses(&input.joined()) {
        for (close, open) in [('?', '¿'), ('!', '¡')] {
            if clause.ends_with(close) || clause.trim_end_matches(['"', '»', '”']).ends_with(close) {
                found += 1;
                if !clause.contains(open) {
                    bad.push(clause.clone());
                }
            }
        }
    }
    Ok(construction_verdict(found, &bad, ("倒置标点", "questions and exclamations")))
}

/// Numbers with separators follow the Spanish convention.
fn number_format(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    let numbers: Vec<&str> = ES_NUMBER
        .find_iter(&text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ' ', '\u{00A0}']))
        .filter(|n| n.contains(['.', ',', ' ', '\u{00A0}']))
        .collect();
    let bad: Vec<String> = numbers
        .iter()
        .filter(|n| !ES_NUMBER_VALID.is_match(n))
        .map(|n| n.to_string())
        .collect();
    Ok(construction_verdict(numbers.len(), &bad, ("数字", "numbers")))
}

fn currency_format(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    let amounts: Vec<&str> = ES_CURRENCY.find_iter(&text).map(|m| m.as_str().trim()).collect();
    let bad: Vec<String> = amounts
        .iter()
        .filter(|a| !ES_CURRENCY_VALID.is_match(a))
        .map(|a| a.to_string())
        .collect();
    Ok(construction_verdict(amounts.len(), &bad, ("货币金额", "currency amounts")))
}

const USTED_FORMS: [&str; 2] = ["usted", "ustedes"];
const TU_FORMS: [&str; 7] = ["tú", "te", "ti", "contigo", "tu", "tus", "vosotros"];

fn formal_address(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    Ok(address_verdict(
        find_words(&text, &USTED_FORMS),
        find_words(&text, &TU_FORMS),
        "尊称usted",
        "formal usted address",
    ))
}

fn informal_address(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    Ok(address_verdict(
        find_words(&text, &TU_FORMS),
        find_words(&text, &USTED_FORMS),
        "tú称呼",
        "informal tú address",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::testing::eval;

    #[test]
    fn test_counts() {
        assert!(!eval("spanish_accent_count:[2,2]", &["La canción está aquí"]).passed);
        assert!(eval("spanish_accent_count:[3,3]", &["La canción está aquí"]).passed);
        assert!(eval("spanish_n_tilde_count:[2,2]", &["El niño come piña."]).passed);
        assert!(eval("spanish_ordinal_abbreviation_count:[2,2]", &["Vive en el 3.º piso y quedó 1.ª"]).passed);
        assert_eq!(diminutives("un perrito bonito y una casita con tortilla"), vec!["perrito", "casita"]);
    }

    #[test]
    fn test_inverted_punctuation() {
        assert!(eval("spanish_inverted_punctuation", &["¿Cómo estás? ¡Qué bien!"]).passed);
        assert!(!eval("spanish_inverted_punctuation", &["¿Cómo estás? Qué bien!"]).passed);
        assert!(!eval("spanish_inverted_punctuation", &["Estoy bien."]).passed);
    }

    #[test]
    fn test_number_format() {
        assert!(eval("spanish_number_format", &["Hay 1.234.567,89 personas y 3,5 gatos."]).passed);
        let v = eval("spanish_number_format", &["Cuesta 1,234.56 en total."]);
        assert!(!v.passed);
        assert!(v.explanation.contains("1,234.56"));
        assert!(!eval("spanish_number_format", &["Sin cifras."]).passed);
    }

    #[test]
    fn test_currency_format() {
        assert!(eval("spanish_currency_format", &["El precio es 25,50 € por persona."]).passed);
        assert!(!eval("spanish_currency_format", &["El precio es €25.50 por persona."]).passed);
        assert!(!eval("spanish_currency_format", &["Es gratis."]).passed);
    }

    #[test]
    fn test_address() {
        assert!(eval("spanish_formal_address", &["¿Puede usted ayudarme?"]).passed);
        assert!(!eval("spanish_formal_address", &["Usted y tú"]).passed);
        assert!(eval("spanish_informal_address", &["¿Tú vienes con tus amigos?"]).passed);
    }
}
