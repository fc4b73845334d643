//! Shared regular expressions for predicates.
//!
//! Compiled once per process and read-only afterwards.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // =========================================================================
    // MARKDOWN STRUCTURE
    // =========================================================================

    /// ATX heading: one to six `#` followed by a space.
    pub static ref HEADING: Regex = Regex::new(r"(?m)^\s{0,3}#{1,6}\s+\S").unwrap();

    /// Bullet or numbered list item.
    pub static ref BULLET: Regex =
        Regex::new(r"(?m)^\s*(?:[-*+•·]|\d+[.)、]|[a-zA-Z][.)])\s+\S").unwrap();

    /// Fenced code block wrapper, capturing the body.
    pub static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^\s*```[a-zA-Z0-9_-]*\s*\n?(.*?)\n?\s*```\s*$").unwrap();

    // =========================================================================
    // ENGLISH
    // =========================================================================

    /// Contractions such as don't, I'm, they're, we've, she'll, I'd.
    pub static ref EN_CONTRACTION: Regex = Regex::new(
        r"(?i)\b[a-z]+(?:n['’]t|['’](?:s|m|re|ve|ll|d))\b"
    ).unwrap();

    /// Passive voice: form of "to be" followed by a past participle.
    pub static ref EN_PASSIVE: Regex = Regex::new(
        r"(?i)\b(?:am|is|are|was|were|be|been|being)\s+(?:\w+ly\s+)?(?:\w+ed|born|built|done|made|given|taken|written|seen|known|shown|found|told|held|kept|left|sold|sent|thought|brought|bought|caught|taught|won|lost|paid|said|driven|eaten|chosen|spoken|broken|stolen|forgotten|hidden)\b"
    ).unwrap();

    // =========================================================================
    // GERMAN
    // =========================================================================

    /// Subordinating conjunctions that open a subordinate clause.
    pub static ref DE_SUBORDINATE: Regex = Regex::new(
        r"(?i)\b(?:dass|weil|obwohl|wenn|als|ob|damit|nachdem|bevor|während|sobald|seitdem|falls|indem|sodass|obgleich)\b"
    ).unwrap();

    /// Modal verbs in all present and preterite forms.
    pub static ref DE_MODAL: Regex = Regex::new(
        r"(?i)\b(?:kann|kannst|können|könnt|konnte|konntest|konnten|konntet|könnte|könnten|muss|musst|müssen|müsst|musste|musstest|mussten|müsste|müssten|darf|darfst|dürfen|dürft|durfte|durften|dürfte|dürften|soll|sollst|sollen|sollt|sollte|solltest|sollten|will|willst|wollen|wollt|wollte|wolltest|wollten|mag|magst|mögen|mögt|mochte|mochten|möchte|möchtest|möchten)\b"
    ).unwrap();

    // =========================================================================
    // FRENCH
    // =========================================================================

    /// Passé composé: conjugated avoir/être followed by a participle.
    pub static ref FR_PASSE_COMPOSE: Regex = Regex::new(
        r"(?i)\b(?:ai|as|a|avons|avez|ont|suis|es|est|sommes|êtes|sont)\s+(?:pas\s+|jamais\s+|déjà\s+|bien\s+)?(?:\w+é(?:e|s|es)?|\w+i(?:e|s|es)?|\w+u(?:e|s|es)?|fait|dit|écrit|mis|pris|ouvert|offert|mort|né|été|eu)\b"
    ).unwrap();

    /// Movement verbs conjugated with avoir where être is required.
    pub static ref FR_WRONG_AUXILIARY: Regex = Regex::new(
        r"(?i)\b(?:ai|as|a|avons|avez|ont)\s+(?:pas\s+|jamais\s+|déjà\s+)?(?:allé|venu|arrivé|parti|né|mort|resté|tombé|devenu|revenu|entré|décédé)(?:e|s|es)?\b"
    ).unwrap();

    /// Partitive articles.
    pub static ref FR_PARTITIVE: Regex =
        Regex::new(r"(?i)\b(?:du|de\s+la|de\s+l['’]|des)\s*\w").unwrap();

    /// Pronominal verbs: reflexive pronoun directly before a verb.
    pub static ref FR_PRONOMINAL: Regex = Regex::new(
        r"(?i)\b(?:je\s+me|tu\s+te|il\s+se|elle\s+se|on\s+se|nous\s+nous|vous\s+vous|ils\s+se|elles\s+se)\s+\w+|\b(?:m|t|s)['’](?:[aeiouéèêh]\w*)"
    ).unwrap();

    // =========================================================================
    // SPANISH
    // =========================================================================

    /// Ordinal abbreviations: 1.º, 2.ª, 3.er, 1º, 2ª.
    pub static ref ES_ORDINAL: Regex = Regex::new(r"\b\d+\.?(?:º|ª|°|er\b)").unwrap();

    /// Any number with a thousands or decimal separator.
    pub static ref ES_NUMBER: Regex = Regex::new(r"\d[\d.,\u{00A0} ]*\d").unwrap();

    /// Spanish number: thousands with "." or space groups, decimal ",".
    pub static ref ES_NUMBER_VALID: Regex =
        Regex::new(r"^(?:\d{1,3}(?:[.\u{00A0} ]\d{3})+|\d+)(?:,\d+)?$").unwrap();

    /// Currency amounts with a symbol or ISO code on either side.
    pub static ref ES_CURRENCY: Regex = Regex::new(
        r"(?:[$€£]\s?\d[\d.,\u{00A0} ]*|\d[\d.,\u{00A0} ]*\s?(?:[$€£]|EUR|USD|MXN|euros?|dólares?|pesos?))"
    ).unwrap();

    /// Spanish currency style: amount then a space then the symbol or code.
    pub static ref ES_CURRENCY_VALID: Regex = Regex::new(
        r"^\d{1,3}(?:[.\u{00A0} ]\d{3})*(?:,\d{2})?\u{00A0}?\s(?:€|\$|£|EUR|USD|MXN|euros?|dólares?|pesos?)$|^\d+(?:,\d{2})?\u{00A0}?\s(?:€|\$|£|EUR|USD|MXN|euros?|dólares?|pesos?)$"
    ).unwrap();

    // =========================================================================
    // PORTUGUESE
    // =========================================================================

    /// Mesoclisis: verb-pronoun-ending, e.g. "dir-lhe-ei", "far-se-á".
    pub static ref PT_MESOCLISIS: Regex = Regex::new(
        r"(?i)\b\w+r-(?:me|te|se|lhe|lhes|nos|vos|o|a|os|as|lo|la|los|las)-(?:ei|ás|á|emos|eis|ão|ia|ias|íamos|íeis|iam)\b"
    ).unwrap();

    /// Crase: "à", "às", "àquele", "àquela", "àquilo".
    pub static ref PT_CRASE: Regex = Regex::new(r"(?i)\bà(?:s|quele|queles|quela|quelas|quilo)?\b").unwrap();

    // =========================================================================
    // RUSSIAN
    // =========================================================================

    /// Reflexive verbs in -ся / -сь.
    pub static ref RU_REFLEXIVE: Regex = Regex::new(
        r"(?i)[а-яё]{2,}(?:ться|тся|лся|лась|лось|лись|ешься|ется|ишься|ится|емся|имся|етесь|итесь|утся|ются|атся|ятся|ясь|вшись)(?:[^а-яё]|$)"
    ).unwrap();

    // =========================================================================
    // INDONESIAN
    // =========================================================================

    /// Full reduplication with a hyphen: anak-anak, buku-buku.
    pub static ref ID_REDUPLICATION: Regex = Regex::new(r"(?i)\b([a-z]{2,})-([a-z]{2,})\b").unwrap();
}

/// Strip a surrounding Markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str(),
        None => text.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_markdown_counts() {
        let text = "# Title\n\nSome text\n## Section\n- one\n- two\n1. three";
        assert_eq!(HEADING.find_iter(text).count(), 2);
        assert_eq!(BULLET.find_iter(text).count(), 3);
    }

    #[test]
    fn test_english_contractions() {
        assert_eq!(EN_CONTRACTION.find_iter("I don't think they're here. It's fine").count(), 3);
        assert_eq!(EN_CONTRACTION.find_iter("Do not go").count(), 0);
    }

    #[test]
    fn test_spanish_numbers() {
        assert!(ES_NUMBER_VALID.is_match("1.234.567,89"));
        assert!(ES_NUMBER_VALID.is_match("1 234"));
        assert!(!ES_NUMBER_VALID.is_match("1,234.56"));
    }
}
