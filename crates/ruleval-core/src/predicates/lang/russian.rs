//! Russian rules.

use super::{address_verdict, count_chars, count_words, find_chars, find_suffixed, find_words};
use crate::language::Language;
use crate::predicates::patterns::RU_REFLEXIVE;
use crate::predicates::{forbid, range_count, Feature, Input};
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let ru = Language::Russian;
    builder
        .add("russian_yo_count", ru, ArgShape::Range, yo_count)
        .add("russian_diminutive_count", ru, ArgShape::Range, diminutive_count)
        .add("russian_reflexive_verb_count", ru, ArgShape::Range, reflexive_verb_count)
        .add("russian_negation_count", ru, ArgShape::Range, negation_count)
        .add("russian_no_latin", ru, ArgShape::None, no_latin)
        .add("russian_formal_address", ru, ArgShape::None, formal_address);
}

fn yo_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("字母ё", "ё letters"), |t| count_chars(t, |c| c == 'ё' || c == 'Ё'))
}

const DIMINUTIVE_SUFFIXES: [&str; 13] = [
    "очка", "ечка", "ушка", "юшка", "онька", "енька", "енький", "ёнок", "онок", "чик", "ишко", "очек", "ечек",
];

/// Words with a diminutive-looking ending that are not diminutives.
const NOT_DIMINUTIVE: [&str; 10] = [
    "девушка", "подушка", "бабушка", "дедушка", "ребёнок", "мальчик", "почка", "точка", "бочка", "ночка",
];

fn diminutives(text: &str) -> Vec<String> {
    find_suffixed(text, &DIMINUTIVE_SUFFIXES, 5, &NOT_DIMINUTIVE)
}

fn diminutive_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("指小表爱词", "diminutives"), |t| diminutives(t).len())
}

fn reflexive_verb_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("反身动词", "reflexive verbs"), |t| RU_REFLEXIVE.find_iter(t).count())
}

const NEGATIONS: [&str; 9] = ["не", "ни", "нет", "никогда", "ничего", "никто", "нигде", "никуда", "ничто"];

fn negation_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("否定词", "negations"), |t| count_words(t, &NEGATIONS))
}

fn no_latin(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    Ok(forbid(input, Feature::new("拉丁字母", "Latin letters"), |t| find_chars(t, |c| c.is_ascii_alphabetic())))
}

const VY_FORMS: [&str; 8] = ["вы", "вас", "вам", "вами", "ваш", "ваша", "ваше", "ваши"];
const TY_FORMS: [&str; 9] = ["ты", "тебя", "тебе", "тобой", "твой", "твоя", "твоё", "твое", "твои"];

fn formal_address(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let text = input.joined();
    Ok(address_verdict(
        find_words(&text, &VY_FORMS),
        find_words(&text, &TY_FORMS),
        "尊称Вы",
        "formal вы address",
    ))
}
