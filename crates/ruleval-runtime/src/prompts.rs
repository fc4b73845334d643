//! Prompt templates for the extraction model and for follow-up rounds.
//!
//! Templates are plain `format!` strings with the dynamic content at the
//! end, so the fixed instruction prefix stays identical across calls.

/// Instructions for the extraction model.
///
/// The model must answer with a JSON array of strings copied verbatim
/// from the response. Anything else is treated as a failed extraction.
pub const EXTRACTION_INSTRUCTIONS: &str = r#"You isolate the parts of a model answer that a single constraint applies to.

Rules:
1. Copy fragments verbatim from the answer. Do not fix, translate, or summarize them.
2. Keep the fragments in the order they appear in the answer.
3. If the constraint applies to the whole answer, return the whole answer as one fragment.
4. If nothing in the answer matches, return an empty array.

Reply with a JSON array of strings and nothing else, for example:
["first fragment", "second fragment"]"#;

/// Build the extraction prompt for one sub-question.
pub fn extraction_prompt(question: &str, response: &str, constraint: &str) -> String {
    format!(
        "{}\n\n## Prompt\n{}\n\n## Answer\n{}\n\n## Constraint\n{}\n\n## Fragments\n",
        EXTRACTION_INSTRUCTIONS, question, response, constraint
    )
}

/// Header of the recap appended to a prompt in rounds after the first.
pub const FAILURE_RECAP_HEADER: &str = "\n\n你之前的回答没有满足以下要求，请重新作答并确保满足所有要求：\n\
Your previous answer did not satisfy the following requirements. Answer again and make sure every requirement is met:\n";

/// Original prompt followed by a bilingual list of failed constraints.
///
/// Blank and repeated descriptions are dropped; order is kept.
pub fn failure_recap<'a>(og_question: &str, failed: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for description in failed {
        let description = description.trim();
        if !description.is_empty() && !seen.contains(&description) {
            seen.push(description);
        }
    }

    if seen.is_empty() {
        return og_question.to_string();
    }

    let mut prompt = String::with_capacity(og_question.len() + FAILURE_RECAP_HEADER.len() + 64);
    prompt.push_str(og_question);
    prompt.push_str(FAILURE_RECAP_HEADER);
    for (idx, description) in seen.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", idx + 1, description));
    }
    prompt
}
