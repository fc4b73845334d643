//! Indonesian rules: affixes, reduplication, particles, and the pantun.

use crate::language::Language;
use crate::predicates::patterns::ID_REDUPLICATION;
use crate::predicates::{bilingual, range_count, rhyme, Feature, Input};
use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
use crate::text;
use crate::types::Verdict;

pub fn register(builder: &mut RegistryBuilder) {
    let id = Language::Indonesian;
    builder
        .add("indonesian_reduplication_count", id, ArgShape::Range, reduplication_count)
        .add("indonesian_me_prefix_count", id, ArgShape::Range, me_prefix_count)
        .add("indonesian_di_prefix_count", id, ArgShape::Range, di_prefix_count)
        .add("indonesian_particle_count", id, ArgShape::Range, particle_count)
        .add("indonesian_pantun", id, ArgShape::None, pantun);
}

/// Last three letters, or `None` for shorter words.
fn tail(word: &str) -> Option<Vec<char>> {
    let chars: Vec<char> = word.chars().collect();
    (chars.len() >= 3).then(|| chars[chars.len() - 3..].to_vec())
}

/// Hyphenated reduplications: full (anak-anak) or rhyming (sayur-mayur).
fn reduplications(text: &str) -> usize {
    ID_REDUPLICATION
        .captures_iter(text)
        .filter(|c| {
            let a = c[1].to_lowercase();
            let b = c[2].to_lowercase();
            a == b || (tail(&a).is_some() && tail(&a) == tail(&b))
        })
        .count()
}

fn reduplication_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("重叠词", "reduplications"), reduplications)
}

const ME_PREFIXES: [&str; 5] = ["meng", "meny", "mem", "men", "me"];
const NOT_ME: [&str; 14] = [
    "meja", "merah", "mereka", "memang", "menit", "mesin", "meter", "media", "menu", "merdeka",
    "mewah", "mentega", "mental", "metode",
];

fn me_words(text: &str) -> Vec<String> {
    text::tokenize(text)
        .into_iter()
        .filter(|w| !NOT_ME.contains(&w.as_str()))
        .filter(|w| {
            ME_PREFIXES
                .iter()
                .find(|p| w.starts_with(*p))
                .is_some_and(|p| w.chars().count() - p.chars().count() >= 3)
        })
        .collect()
}

fn me_prefix_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("me-前缀动词", "me- verbs"), |t| me_words(t).len())
}

const NOT_DI: [&str; 16] = [
    "dia", "diri", "dinding", "dingin", "dinas", "diam", "digital", "diskusi", "dinasti", "dinamis",
    "diet", "dimensi", "diploma", "direktur", "dilema", "dini",
];

fn di_words(text: &str) -> Vec<String> {
    text::tokenize(text)
        .into_iter()
        .filter(|w| w.starts_with("di") && w.chars().count() >= 5)
        .filter(|w| !NOT_DI.contains(&w.as_str()))
        .collect()
}

fn di_prefix_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("di-被动词", "di- passives"), |t| di_words(t).len())
}

const NOT_PARTICLE: [&str; 14] = [
    "sekolah", "masalah", "jumlah", "salah", "kalah", "telah", "langkah", "nikah", "rumah", "sejarah",
    "allah", "ibadah", "daerah", "istilah",
];

fn particles(text: &str) -> usize {
    text::tokenize(text)
        .iter()
        .filter(|w| {
            w.as_str() == "pun"
                || (w.chars().count() > 4
                    && ["lah", "kah", "pun"].iter().any(|p| w.ends_with(p))
                    && !NOT_PARTICLE.contains(&w.as_str()))
        })
        .count()
}

fn particle_count(input: &Input<'_>, args: &RuleArgs) -> Result<Verdict, PredicateError> {
    range_count(input, args, Feature::new("语气小品词", "particles"), particles)
}

/// Four lines rhyming a-b-a-b.
fn pantun(input: &Input<'_>, _args: &RuleArgs) -> Result<Verdict, PredicateError> {
    let lines = input.texts();
    if lines.len() != 4 {
        return Ok(Verdict::fail(bilingual(
            format!("班顿诗应为4行，实际{}行", lines.len()),
            format!("a pantun has 4 lines, got {}", lines.len()),
        )));
    }
    let keys: Vec<String> = lines
        .iter()
        .map(|l| rhyme::line_key(l, Language::Indonesian).unwrap_or_default())
        .collect();
    let ok = !keys[0].is_empty() && !keys[1].is_empty() && keys[0] == keys[2] && keys[1] == keys[3];
    Ok(Verdict::new(
        ok,
        bilingual(
            format!("韵脚为{}，要求ABAB", keys.join("/")),
            format!("rhymes are {}, required ABAB", keys.join("/")),
        ),
    ))
}
