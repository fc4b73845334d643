//! Typed rule arguments, driven by each rule's declared argument shape.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::descriptor::{json_count, parse_count, RawArg};
use super::{DescriptorError, PredicateError};
use crate::language::Language;

/// What a rule expects after its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgShape {
    /// No argument; any literal is ignored.
    None,
    /// One non-negative integer from the name's trailing digits or the argument.
    Count,
    /// `[min, max]` inclusive; `[n]` means `[n, n]`.
    Range,
    /// List of strings.
    Words,
    /// Count from the name's trailing digits plus a list of strings.
    CountedWords,
    /// Raw regular expression.
    Pattern,
    /// Free text.
    Text,
    /// `language:[min, max]`.
    LanguageRange,
    /// `json_schema` or `list`.
    Schema,
}

impl fmt::Display for ArgShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArgShape::None => "none",
            ArgShape::Count => "count",
            ArgShape::Range => "range",
            ArgShape::Words => "words",
            ArgShape::CountedWords => "counted_words",
            ArgShape::Pattern => "pattern",
            ArgShape::Text => "text",
            ArgShape::LanguageRange => "language_range",
            ArgShape::Schema => "schema",
        };
        f.write_str(s)
    }
}

/// How a `SCHEMA` rule validates the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// Validate against the item's JSON schema and fan out per leaf.
    JsonSchema,
    /// Only check the response parses as a JSON array.
    List,
}

/// Parsed arguments handed to a predicate.
#[derive(Debug, Clone)]
pub enum RuleArgs {
    None,
    Count(u64),
    Range { min: u64, max: u64 },
    Words(Vec<String>),
    CountedWords { count: u64, words: Vec<String> },
    Pattern(Regex),
    Text(String),
    LanguageRange { language: Language, min: u64, max: u64 },
    Schema(SchemaMode),
}

impl ArgShape {
    /// Whether trailing digits in the name carry this shape's count.
    pub fn takes_name_count(&self) -> bool {
        matches!(self, ArgShape::Count | ArgShape::CountedWords)
    }

    /// Build typed arguments from the name count and the raw argument.
    pub fn parse(
        &self,
        name_count: Option<u64>,
        arg: Option<&RawArg>,
    ) -> Result<RuleArgs, DescriptorError> {
        match self {
            ArgShape::None => Ok(RuleArgs::None),
            ArgShape::Count => {
                let count = match arg {
                    Some(a) => parse_single_count(a)?,
                    None => name_count
                        .ok_or_else(|| DescriptorError::MissingArgument("count".to_string()))?,
                };
                Ok(RuleArgs::Count(count))
            }
            ArgShape::Range => {
                let arg = require(arg, "[min, max]")?;
                let (min, max) = parse_range(arg)?;
                Ok(RuleArgs::Range { min, max })
            }
            ArgShape::Words => {
                let arg = require(arg, "word list")?;
                Ok(RuleArgs::Words(parse_words(arg)?))
            }
            ArgShape::CountedWords => {
                let count = name_count
                    .ok_or_else(|| DescriptorError::MissingArgument("count in rule name".to_string()))?;
                let arg = require(arg, "word list")?;
                Ok(RuleArgs::CountedWords {
                    count,
                    words: parse_words(arg)?,
                })
            }
            ArgShape::Pattern => {
                let arg = require(arg, "pattern")?;
                let regex = Regex::new(&arg.text)
                    .map_err(|e| DescriptorError::InvalidPattern(e.to_string()))?;
                Ok(RuleArgs::Pattern(regex))
            }
            ArgShape::Text => {
                let arg = require(arg, "text")?;
                Ok(RuleArgs::Text(parse_text(arg)))
            }
            ArgShape::LanguageRange => {
                let arg = require(arg, "language:[min, max]")?;
                let (name, rest) = arg.text.split_once(':').ok_or_else(|| {
                    DescriptorError::InvalidArgument(format!(
                        "expected language:[min, max], got '{}'",
                        arg.text
                    ))
                })?;
                let language = Language::from_name(name)
                    .ok_or_else(|| DescriptorError::UnknownLanguage(name.trim().to_string()))?;
                // unordered: language_ratio reads the pair as a fraction
                let (min, max) = parse_pair(&RawArg::new(rest))?;
                Ok(RuleArgs::LanguageRange { language, min, max })
            }
            ArgShape::Schema => {
                let mode = match arg.map(|a| a.text.as_str()) {
                    None | Some("") | Some("json_schema") => SchemaMode::JsonSchema,
                    Some("list") => SchemaMode::List,
                    Some(other) => {
                        return Err(DescriptorError::InvalidArgument(format!(
                            "unknown schema mode '{}'",
                            other
                        )))
                    }
                };
                Ok(RuleArgs::Schema(mode))
            }
        }
    }
}

fn require<'a>(arg: Option<&'a RawArg>, what: &str) -> Result<&'a RawArg, DescriptorError> {
    match arg {
        Some(a) if !a.text.is_empty() => Ok(a),
        _ => Err(DescriptorError::MissingArgument(what.to_string())),
    }
}

fn parse_single_count(arg: &RawArg) -> Result<u64, DescriptorError> {
    match &arg.json {
        Some(Value::Array(items)) if items.len() == 1 => json_count(&items[0]),
        Some(Value::Array(items)) => Err(DescriptorError::InvalidArgument(format!(
            "expected one count, got {} values",
            items.len()
        ))),
        Some(other) => json_count(other),
        None => parse_count(arg.text.trim_matches(|c| c == '[' || c == ']')),
    }
}

fn parse_range(arg: &RawArg) -> Result<(u64, u64), DescriptorError> {
    let (min, max) = parse_pair(arg)?;
    if min > max {
        return Err(DescriptorError::InvalidRange(format!(
            "min {} exceeds max {}",
            min, max
        )));
    }
    Ok((min, max))
}

fn parse_pair(arg: &RawArg) -> Result<(u64, u64), DescriptorError> {
    let bounds: Vec<u64> = match &arg.json {
        Some(Value::Array(items)) => items.iter().map(json_count).collect::<Result<_, _>>()?,
        Some(other) => vec![json_count(other)?],
        None => arg
            .text
            .trim_matches(|c| c == '[' || c == ']' || c == '(' || c == ')')
            .split(',')
            .map(parse_count)
            .collect::<Result<_, _>>()?,
    };
    match bounds.as_slice() {
        [n] => Ok((*n, *n)),
        [a, b] => Ok((*a, *b)),
        _ => Err(DescriptorError::InvalidRange(format!(
            "expected [min, max], got '{}'",
            arg.text
        ))),
    }
}

fn json_to_word(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_words(arg: &RawArg) -> Result<Vec<String>, DescriptorError> {
    let words: Vec<String> = match &arg.json {
        Some(Value::Array(items)) => items.iter().filter_map(json_to_word).collect(),
        Some(other) => json_to_word(other).into_iter().collect(),
        None => vec![arg.text.trim_matches('"').to_string()],
    };
    let words: Vec<String> = words
        .into_iter()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return Err(DescriptorError::MissingArgument("non-empty word list".to_string()));
    }
    Ok(words)
}

fn parse_text(arg: &RawArg) -> String {
    match &arg.json {
        Some(Value::Array(items)) => items.iter().filter_map(json_to_word).collect::<String>(),
        Some(Value::String(s)) => s.clone(),
        _ => arg.text.trim_matches('"').to_string(),
    }
}

impl RuleArgs {
    fn mismatch(expected: ArgShape) -> PredicateError {
        PredicateError::BadArguments(format!("expected {} arguments", expected))
    }

    pub fn count(&self) -> Result<u64, PredicateError> {
        match self {
            RuleArgs::Count(n) => Ok(*n),
            RuleArgs::CountedWords { count, .. } => Ok(*count),
            _ => Err(Self::mismatch(ArgShape::Count)),
        }
    }

    pub fn range(&self) -> Result<(u64, u64), PredicateError> {
        match self {
            RuleArgs::Range { min, max } => Ok((*min, *max)),
            RuleArgs::LanguageRange { min, max, .. } => Ok((*min, *max)),
            _ => Err(Self::mismatch(ArgShape::Range)),
        }
    }

    pub fn words(&self) -> Result<&[String], PredicateError> {
        match self {
            RuleArgs::Words(words) => Ok(words),
            RuleArgs::CountedWords { words, .. } => Ok(words),
            _ => Err(Self::mismatch(ArgShape::Words)),
        }
    }

    pub fn pattern(&self) -> Result<&Regex, PredicateError> {
        match self {
            RuleArgs::Pattern(re) => Ok(re),
            _ => Err(Self::mismatch(ArgShape::Pattern)),
        }
    }

    pub fn text(&self) -> Result<&str, PredicateError> {
        match self {
            RuleArgs::Text(t) => Ok(t),
            _ => Err(Self::mismatch(ArgShape::Text)),
        }
    }

    pub fn language(&self) -> Result<Language, PredicateError> {
        match self {
            RuleArgs::LanguageRange { language, .. } => Ok(*language),
            _ => Err(Self::mismatch(ArgShape::LanguageRange)),
        }
    }

    pub fn schema_mode(&self) -> Result<SchemaMode, PredicateError> {
        match self {
            RuleArgs::Schema(mode) => Ok(*mode),
            _ => Err(Self::mismatch(ArgShape::Schema)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(s: &str) -> RawArg {
        RawArg::new(s)
    }

    #[test]
    fn test_range_forms() {
        let args = ArgShape::Range.parse(None, Some(&raw("[5,12]"))).unwrap();
        assert_eq!(args.range().unwrap(), (5, 12));
        let args = ArgShape::Range.parse(None, Some(&raw("[7]"))).unwrap();
        assert_eq!(args.range().unwrap(), (7, 7));
        let args = ArgShape::Range.parse(None, Some(&raw("3,4"))).unwrap();
        assert_eq!(args.range().unwrap(), (3, 4));
    }

    #[test]
    fn test_range_rejects_inverted_and_negative() {
        assert!(matches!(
            ArgShape::Range.parse(None, Some(&raw("[9,2]"))),
            Err(DescriptorError::InvalidRange(_))
        ));
        assert!(matches!(
            ArgShape::Range.parse(None, Some(&raw("[-1,2]"))),
            Err(DescriptorError::NegativeInteger(_))
        ));
    }

    #[test]
    fn test_count_from_name_or_arg() {
        assert_eq!(ArgShape::Count.parse(Some(4), None).unwrap().count().unwrap(), 4);
        assert_eq!(ArgShape::Count.parse(None, Some(&raw("3"))).unwrap().count().unwrap(), 3);
        assert_eq!(ArgShape::Count.parse(None, Some(&raw("[3]"))).unwrap().count().unwrap(), 3);
        assert!(ArgShape::Count.parse(None, None).is_err());
    }

    #[test]
    fn test_words_stringify_numbers() {
        let args = ArgShape::Words.parse(None, Some(&raw("[\"a\", 2]"))).unwrap();
        assert_eq!(args.words().unwrap(), &["a".to_string(), "2".to_string()]);
        let args = ArgShape::Words.parse(None, Some(&raw("Paris"))).unwrap();
        assert_eq!(args.words().unwrap(), &["Paris".to_string()]);
        assert!(ArgShape::Words.parse(None, Some(&raw("[]"))).is_err());
    }

    #[test]
    fn test_counted_words_need_name_count() {
        let args = ArgShape::CountedWords
            .parse(Some(2), Some(&raw("[\"a\",\"b\",\"c\"]")))
            .unwrap();
        assert_eq!(args.count().unwrap(), 2);
        assert_eq!(args.words().unwrap().len(), 3);
        assert!(ArgShape::CountedWords.parse(None, Some(&raw("[\"a\"]"))).is_err());
    }

    #[test]
    fn test_pattern_uses_raw_text() {
        let args = ArgShape::Pattern.parse(None, Some(&raw("[1]"))).unwrap();
        assert_eq!(args.pattern().unwrap().as_str(), "[1]");
        assert!(matches!(
            ArgShape::Pattern.parse(None, Some(&raw("(unclosed"))),
            Err(DescriptorError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_language_range() {
        let args = ArgShape::LanguageRange
            .parse(None, Some(&raw("english:[1,2]")))
            .unwrap();
        assert_eq!(args.language().unwrap(), Language::English);
        assert_eq!(args.range().unwrap(), (1, 2));
        assert!(matches!(
            ArgShape::LanguageRange.parse(None, Some(&raw("elvish:[1,2]"))),
            Err(DescriptorError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_text_joins_lists() {
        let args = ArgShape::Text.parse(None, Some(&raw("[\"春\",\"夏\"]"))).unwrap();
        assert_eq!(args.text().unwrap(), "春夏");
        let args = ArgShape::Text.parse(None, Some(&raw("ABBA"))).unwrap();
        assert_eq!(args.text().unwrap(), "ABBA");
    }

    #[test]
    fn test_schema_modes() {
        assert_eq!(
            ArgShape::Schema.parse(None, Some(&raw("list"))).unwrap().schema_mode().unwrap(),
            SchemaMode::List
        );
        assert_eq!(
            ArgShape::Schema.parse(None, None).unwrap().schema_mode().unwrap(),
            SchemaMode::JsonSchema
        );
    }
}
