//! Rule descriptor grammar.
//!
//! ```text
//! descriptor := NAME [ ":" ARG ]
//! NAME       := IDENT [ DIGITS ]
//! ARG        := JSON_LITERAL | RAW_STRING
//! ```
//!
//! Everything after the first `:` is the argument, so `regex:.*:foo`
//! yields name `regex` and argument `.*:foo`. An argument that starts
//! with `[` or `{` is parsed as JSON when it is valid JSON and kept raw
//! otherwise, which lets patterns such as `[A-Z]+` through untouched.

use serde_json::Value;

use super::DescriptorError;

/// Argument text after the first `:`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArg {
    /// Exactly as written, outer whitespace trimmed.
    pub text: String,
    /// Parsed JSON literal, when the text is one.
    pub json: Option<Value>,
}

impl RawArg {
    pub fn new(text: &str) -> Self {
        let text = text.trim().to_string();
        let json = parse_json_literal(&text);
        Self { text, json }
    }
}

/// A parsed rule descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    /// Full descriptor as written.
    pub raw: String,
    /// Name including any trailing digits.
    pub name: String,
    pub arg: Option<RawArg>,
}

impl Descriptor {
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let raw = descriptor.trim();
        if raw.is_empty() {
            return Err(DescriptorError::Empty);
        }
        let (name, arg) = match raw.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(RawArg::new(arg))),
            None => (raw, None),
        };
        if name.is_empty() {
            return Err(DescriptorError::Empty);
        }
        Ok(Self {
            raw: raw.to_string(),
            name: name.to_string(),
            arg,
        })
    }

    /// Split trailing digits off the name: `any_keywords2` → (`any_keywords`, Some(2)).
    pub fn counted_name(&self) -> Result<(&str, Option<u64>), DescriptorError> {
        let (base, digits) = split_trailing_digits(&self.name);
        match digits {
            Some(d) if !base.is_empty() => Ok((base, Some(parse_count(d)?))),
            _ => Ok((self.name.as_str(), None)),
        }
    }
}

/// Split an identifier into its base and a trailing run of ASCII digits.
pub fn split_trailing_digits(name: &str) -> (&str, Option<&str>) {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if base.len() == name.len() {
        (name, None)
    } else {
        (base, Some(&name[base.len()..]))
    }
}

/// Parse a base-10 non-negative integer.
pub fn parse_count(text: &str) -> Result<u64, DescriptorError> {
    let text = text.trim();
    if text.starts_with('-') {
        return Err(DescriptorError::NegativeInteger(text.to_string()));
    }
    let text = text.strip_prefix('+').unwrap_or(text);
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(DescriptorError::InvalidInteger(text.to_string()));
    }
    text.parse::<u64>()
        .map_err(|_| DescriptorError::InvalidInteger(text.to_string()))
}

/// Convert a JSON value to a non-negative integer.
///
/// Integral floats (`5.0`) and digit strings are accepted.
pub fn json_count(value: &Value) -> Result<u64, DescriptorError> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Ok(v);
            }
            if let Some(v) = n.as_i64() {
                return Err(DescriptorError::NegativeInteger(v.to_string()));
            }
            match n.as_f64() {
                Some(f) if f < 0.0 => Err(DescriptorError::NegativeInteger(n.to_string())),
                Some(f) if f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
                _ => Err(DescriptorError::InvalidInteger(n.to_string())),
            }
        }
        Value::String(s) => parse_count(s),
        other => Err(DescriptorError::InvalidInteger(other.to_string())),
    }
}

/// Parse bracketed JSON, also accepting single-quoted legacy lists.
fn parse_json_literal(text: &str) -> Option<Value> {
    if !(text.starts_with('[') || text.starts_with('{')) {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }
    if text.contains('\'') && !text.contains('"') {
        return serde_json::from_str::<Value>(&text.replace('\'', "\"")).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_at_first_colon() {
        let d = Descriptor::parse("regex:.*:foo").unwrap();
        assert_eq!(d.name, "regex");
        assert_eq!(d.arg.unwrap().text, ".*:foo");
    }

    #[test]
    fn test_json_argument() {
        let d = Descriptor::parse("keyword:[\"Paris\",\"Lyon\"]").unwrap();
        assert_eq!(d.arg.unwrap().json, Some(serde_json::json!(["Paris", "Lyon"])));
    }

    #[test]
    fn test_invalid_json_stays_raw() {
        let d = Descriptor::parse("regex:[A-Z]+").unwrap();
        let arg = d.arg.unwrap();
        assert_eq!(arg.text, "[A-Z]+");
        assert!(arg.json.is_none());
    }

    #[test]
    fn test_single_quoted_list() {
        let d = Descriptor::parse("keyword:['a','b']").unwrap();
        assert_eq!(d.arg.unwrap().json, Some(serde_json::json!(["a", "b"])));
    }

    #[test]
    fn test_counted_name() {
        let d = Descriptor::parse("any_keywords2:[\"a\"]").unwrap();
        assert_eq!(d.counted_name().unwrap(), ("any_keywords", Some(2)));
        let d = Descriptor::parse("jielong").unwrap();
        assert_eq!(d.counted_name().unwrap(), ("jielong", None));
    }

    #[test]
    fn test_negative_integers_rejected() {
        assert!(matches!(parse_count("-3"), Err(DescriptorError::NegativeInteger(_))));
        assert!(matches!(
            json_count(&serde_json::json!(-1)),
            Err(DescriptorError::NegativeInteger(_))
        ));
        assert!(matches!(parse_count("0x10"), Err(DescriptorError::InvalidInteger(_))));
        assert_eq!(json_count(&serde_json::json!(5.0)).unwrap(), 5);
    }

    #[test]
    fn test_empty_descriptor() {
        assert!(matches!(Descriptor::parse("   "), Err(DescriptorError::Empty)));
        assert!(matches!(Descriptor::parse(":x"), Err(DescriptorError::Empty)));
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(s in ".*") {
            let _ = Descriptor::parse(&s);
        }

        #[test]
        fn prop_name_has_no_colon(s in "[a-z_]{1,12}(:.{0,20})?") {
            let d = Descriptor::parse(&s).unwrap();
            prop_assert!(!d.name.contains(':'));
        }
    }
}
