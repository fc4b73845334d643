//! The immutable rule registry.
//!
//! Maps each rule name to its language group, argument shape, and
//! predicate. Rules are added by table entry in the per-language modules
//! under `predicates`; resolution is a single lookup with two legacy
//! fallbacks (trailing-digit counts and bracket-suffixed names).

use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::args::ArgShape;
use super::descriptor::{Descriptor, RawArg};
use super::{DescriptorError, PredicateError, RuleArgs};
use crate::language::Language;
use crate::predicates::{self, Input};
use crate::types::Verdict;

/// A predicate: pure function from input and arguments to a verdict.
pub type PredicateFn = fn(&Input<'_>, &RuleArgs) -> Result<Verdict, PredicateError>;

/// One registered rule.
#[derive(Clone)]
pub struct RuleSpec {
    pub name: String,
    pub language: Language,
    pub shape: ArgShape,
    pub predicate: PredicateFn,
    /// False for rules that read the whole response instead of extracted parts.
    pub reads_parts: bool,
}

impl std::fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSpec")
            .field("name", &self.name)
            .field("language", &self.language)
            .field("shape", &self.shape)
            .field("reads_parts", &self.reads_parts)
            .finish()
    }
}

/// A descriptor resolved to a rule.
#[derive(Debug, Clone)]
pub struct Resolved<'r> {
    pub spec: &'r RuleSpec,
    pub name_count: Option<u64>,
    pub arg: Option<RawArg>,
}

impl Resolved<'_> {
    /// Parse typed arguments for the resolved rule.
    pub fn args(&self) -> Result<RuleArgs, DescriptorError> {
        self.spec.shape.parse(self.name_count, self.arg.as_ref())
    }
}

/// Collects rule entries before freezing them into a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    rules: BTreeMap<String, RuleSpec>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule that reads extracted parts.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        language: Language,
        shape: ArgShape,
        predicate: PredicateFn,
    ) -> &mut Self {
        self.insert(name.into(), language, shape, predicate, true)
    }

    /// Register a rule that reads the whole response.
    pub fn add_whole_response(
        &mut self,
        name: impl Into<String>,
        language: Language,
        shape: ArgShape,
        predicate: PredicateFn,
    ) -> &mut Self {
        self.insert(name.into(), language, shape, predicate, false)
    }

    fn insert(
        &mut self,
        name: String,
        language: Language,
        shape: ArgShape,
        predicate: PredicateFn,
        reads_parts: bool,
    ) -> &mut Self {
        if self.rules.contains_key(&name) {
            tracing::warn!(rule = %name, "Rule registered twice, keeping the later entry");
        }
        self.rules.insert(
            name.clone(),
            RuleSpec {
                name,
                language,
                shape,
                predicate,
                reads_parts,
            },
        );
        self
    }

    pub fn build(self) -> Registry {
        Registry { rules: self.rules }
    }
}

/// Immutable mapping from rule name to [`RuleSpec`].
#[derive(Debug)]
pub struct Registry {
    rules: BTreeMap<String, RuleSpec>,
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// The process-wide registry with every built-in rule.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(|| {
            let mut builder = RegistryBuilder::new();
            predicates::register_all(&mut builder);
            builder.build()
        })
    }

    pub fn get(&self, name: &str) -> Option<&RuleSpec> {
        self.rules.get(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in name order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleSpec> {
        self.rules.values()
    }

    /// Rules of one language group.
    pub fn by_language(&self, language: Language) -> impl Iterator<Item = &RuleSpec> {
        self.rules.values().filter(move |r| r.language == language)
    }

    /// Resolve a descriptor to exactly one rule.
    ///
    /// Order: exact name, then name with trailing digits stripped (count
    /// rules only), then the longest registered name followed by a
    /// non-identifier character (`keyword["a"]`).
    pub fn resolve(&self, descriptor: &Descriptor) -> Result<Option<Resolved<'_>>, DescriptorError> {
        if let Some(spec) = self.rules.get(&descriptor.name) {
            return Ok(Some(Resolved {
                spec,
                name_count: None,
                arg: descriptor.arg.clone(),
            }));
        }

        let (base, count) = descriptor.counted_name()?;
        if let (Some(count), Some(spec)) = (count, self.rules.get(base)) {
            if spec.shape.takes_name_count() {
                return Ok(Some(Resolved {
                    spec,
                    name_count: Some(count),
                    arg: descriptor.arg.clone(),
                }));
            }
        }

        self.resolve_by_prefix(&descriptor.raw)
    }

    fn resolve_by_prefix(&self, raw: &str) -> Result<Option<Resolved<'_>>, DescriptorError> {
        let mut best: Option<&RuleSpec> = None;
        for (name, spec) in self.rules.iter() {
            if !raw.starts_with(name.as_str()) {
                continue;
            }
            let rest = &raw[name.len()..];
            let after_digits = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            let boundary = after_digits
                .chars()
                .next()
                .map(|c| !(c.is_alphanumeric() || c == '_' || c == ':'))
                .unwrap_or(false);
            if boundary && best.map_or(true, |b| b.name.len() < name.len()) {
                best = Some(spec);
            }
        }

        let Some(spec) = best else {
            return Ok(None);
        };
        let rest = &raw[spec.name.len()..];
        let digits_len = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let name_count = if digits_len > 0 {
            Some(super::descriptor::parse_count(&rest[..digits_len])?)
        } else {
            None
        };
        let arg = rest[digits_len..].trim();
        Ok(Some(Resolved {
            spec,
            name_count,
            arg: (!arg.is_empty()).then(|| RawArg::new(arg)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(raw: &str) -> Option<(String, Option<u64>, Option<String>)> {
        let d = Descriptor::parse(raw).unwrap();
        Registry::global()
            .resolve(&d)
            .unwrap()
            .map(|r| (r.spec.name.clone(), r.name_count, r.arg.map(|a| a.text)))
    }

    #[test]
    fn test_exact_resolution() {
        let (name, count, arg) = resolve("each_length:[5,12]").unwrap();
        assert_eq!(name, "each_length");
        assert_eq!(count, None);
        assert_eq!(arg.as_deref(), Some("[5,12]"));
    }

    #[test]
    fn test_counted_resolution() {
        let (name, count, _) = resolve("any_keywords2:[\"a\",\"b\"]").unwrap();
        assert_eq!(name, "any_keywords");
        assert_eq!(count, Some(2));
        let (name, count, _) = resolve("word_freq3:[\"x\"]").unwrap();
        assert_eq!(name, "word_freq");
        assert_eq!(count, Some(3));
    }

    #[test]
    fn test_non_counted_rules_ignore_digits() {
        assert!(resolve("each_length3:[1,2]").is_none());
    }

    #[test]
    fn test_bracket_suffix_resolution() {
        let (name, _, arg) = resolve("keyword[\"Paris\"]").unwrap();
        assert_eq!(name, "keyword");
        assert_eq!(arg.as_deref(), Some("[\"Paris\"]"));
    }

    #[test]
    fn test_prefix_does_not_cross_identifier_boundary() {
        assert!(resolve("keywordz").is_none());
        assert_eq!(resolve("keyword_each:[\"a\"]").unwrap().0, "keyword_each");
    }

    #[test]
    fn test_unknown_rule() {
        assert!(resolve("german_flying_verbs:[1,2]").is_none());
    }

    #[test]
    fn test_every_language_group_is_populated() {
        let registry = Registry::global();
        for lang in Language::SPECIFIC {
            assert!(
                registry.by_language(lang).count() >= 6,
                "language {} has too few rules",
                lang
            );
        }
        assert!(registry.by_language(Language::Generic).count() >= 30);
    }
}
