//! Portuguese counting rules.

use super::{count_chars, find_suffixed};
use crate::language::Language;
use crate::predicates::patterns::{PT_CRASE, PT_MESOCLISIS};
use crate::predicates::{range_count, Feature, Input};
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let pt = Language::Portuguese;
    builder
        .add("portuguese_accent_count", pt, ArgShape::Range, accent_count)
        .add("portuguese_nasal_count", pt, ArgShape::Range, nasal_count)
        .add("portuguese_diminutive_count", pt, ArgShape::Range, diminutive_count)
        .add("portuguese_crase_count", pt, ArgShape::Range, crase_count)
        .add("portuguese_mesoclisis_count", pt, ArgShape::Range, mesoclisis_count);
}

fn is_portuguese_accented(c: char) -> bool {
    matches!(
        c.to_lowercase().next().unwrap_or(c),
        'á' | 'â' | 'ã' | 'à' | 'é' | 'ê' | 'í' | 'ó' | 'ô' | 'õ' | 'ú'
    )
}

fn accent_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("重音字母", "accented letters"), |t| {
        count_chars(t, is_portuguese_accented)
    })
}

fn nasal_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("鼻化元音", "nasal vowels"), |t| {
        count_chars(t, |c| matches!(c, 'ã' | 'õ' | 'Ã' | 'Õ'))
    })
}

const DIMINUTIVE_SUFFIXES: [&str; 8] = ["inho", "inha", "inhos", "inhas", "zinho", "zinha", "zinhos", "zinhas"];

/// Words in -inho/-inha that are not diminutives.
const NOT_DIMINUTIVE: [&str; 24] = [
    "caminho", "caminhos", "vinho", "vinhos", "linha", "linhas", "carinho", "vizinho", "vizinha",
    "vizinhos", "cozinha", "cozinhas", "farinha", "rainha", "galinha", "galinhas", "minha", "minhas",
    "tinha", "tinham", "sozinho", "sozinha", "espinho", "moinho",
];

fn diminutives(text: &str) -> Vec<String> {
    find_suffixed(text, &DIMINUTIVE_SUFFIXES, 6, &NOT_DIMINUTIVE)
}

fn diminutive_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("指小词", "diminutives"), |t| diminutives(t).len())
}

fn crase_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("重读融合", "crase contractions"), |t| PT_CRASE.find_iter(t).count())
}

fn mesoclisis_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("中置代词", "mesoclisis forms"), |t| {
        PT_MESOCLISIS.find_iter(t).count()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::testing::eval;

    #[test]
    fn test_accents() {
        assert!(eval("portuguese_accent_count:[4,4]", &["Não há café à noite"]).passed);
        assert!(eval("portuguese_nasal_count:[2,2]", &["Não, as lições"]).passed);
    }

    #[test]
    fn test_diminutives() {
        assert_eq!(
            diminutives("O gatinho bebeu vinho no caminho com o cãozinho"),
            vec!["gatinho", "cãozinho"]
        );
        assert!(eval("portuguese_diminutive_count:[1,1]", &["Uma casinha na minha rua"]).passed);
    }

    #[test]
    fn test_clitics() {
        assert!(eval("portuguese_crase_count:[2,2]", &["Vou à praia e às lojas."]).passed);
        assert!(eval("portuguese_mesoclisis_count:[1,1]", &["Dir-lhe-ei amanhã."]).passed);
        assert!(eval("portuguese_mesoclisis_count:[0,0]", &["Vou dizer-lhe amanhã."]).passed);
    }
}
