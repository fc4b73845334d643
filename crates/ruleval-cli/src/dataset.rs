//! Dataset loading and language filtering.

use std::path::Path;

use anyhow::{bail, Context, Result};
use ruleval_core::{schema, Item, Language};

/// Load a JSON array of items.
///
/// Fills `og_question` where missing and rejects any item whose
/// `json_schema` does not compile, since every round would fail it the
/// same way.
pub fn load(path: &Path) -> Result<Vec<Item>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let mut items: Vec<Item> = serde_json::from_str(&text)
        .with_context(|| format!("Dataset {} is not a JSON array of items", path.display()))?;

    for (idx, item) in items.iter_mut().enumerate() {
        item.ensure_original_prompt();
        if let Some(json_schema) = &item.json_schema {
            schema::compile(json_schema)
                .with_context(|| format!("Item {} has an invalid json_schema", idx))?;
        }
    }

    tracing::info!(items = items.len(), path = %path.display(), "Dataset loaded");
    Ok(items)
}

/// Keep items in `language`.
///
/// An item's language is its hint when the hint names a known language,
/// otherwise the language detected from its original prompt.
pub fn filter_language(items: Vec<Item>, language: &str) -> Result<Vec<Item>> {
    let Some(wanted) = Language::from_name(language) else {
        bail!("Unknown language filter '{}'", language);
    };

    let before = items.len();
    let kept: Vec<Item> = items
        .into_iter()
        .filter(|item| item_language(item) == wanted)
        .collect();
    tracing::info!(language = %wanted, kept = kept.len(), dropped = before - kept.len(), "Language filter applied");
    Ok(kept)
}

fn item_language(item: &Item) -> Language {
    item.language
        .as_deref()
        .and_then(Language::from_name)
        .unwrap_or_else(|| Language::detect(&item.og_question))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_dataset(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_fills_original_prompt() {
        let file = write_dataset(
            r#"[{"question": "Q1", "sub_questions": [{"point_id": 1, "question": "d", "rule": "no_digits"}], "source": "x"}]"#,
        );
        let items = load(file.path()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].og_question, "Q1");
        assert_eq!(items[0].extra["source"], "x");
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let file = write_dataset(
            r#"[{"question": "Q", "json_schema": {"type": "not-a-type"}, "sub_questions": []}]"#,
        );
        let err = load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid json_schema"));
    }

    #[test]
    fn test_not_an_array() {
        let file = write_dataset(r#"{"question": "Q"}"#);
        assert!(load(file.path()).is_err());
        assert!(load(Path::new("/definitely/missing.json")).is_err());
    }

    #[test]
    fn test_language_filter_uses_hint_then_detection() {
        let mut hinted = Item::new("Write a poem about the sea.");
        hinted.language = Some("德语".to_string());
        let items = vec![
            hinted,
            Item::new("Schreibe ein Gedicht über das Meer und die Berge."),
            Item::new("写一首关于大海的诗。"),
        ];

        let german = filter_language(items.clone(), "de").unwrap();
        assert_eq!(german.len(), 2);

        let chinese = filter_language(items, "chinese").unwrap();
        assert_eq!(chinese.len(), 1);
        assert_eq!(chinese[0].og_question, "写一首关于大海的诗。");

        assert!(filter_language(Vec::new(), "klingon").is_err());
    }
}
