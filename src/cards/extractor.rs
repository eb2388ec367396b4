use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use scraper::Html;

lazy_static! {
    /// `<name> (<set code> <number>)`, the name starting and ending on a letter or digit.
    static ref CARD_RE: Regex = Regex::new(
        r"(?i)([\p{L}\p{N}](?:[\p{L}\p{N} \x{A0}':,\-]*[\p{L}\p{N}])?)\s*\(\s*([a-z0-9\-]+)\s+(#?\s*[a-z0-9]+(?:\s*/\s*[a-z0-9]+)?)\s*\)"
    ).unwrap();
}

/// A card reference found in a notification body, before any cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub raw_name: String,
    pub set_code: String,
    pub number: String,
}

impl Candidate {
    /// Catalog number without `#`, spaces or the printed set size (`119/198` -> `119`).
    pub fn normalized_number(&self) -> String {
        normalize_number(&self.number)
    }
}

pub fn normalize_number(raw: &str) -> String {
    let compact: String = raw
        .trim_start()
        .trim_start_matches('#')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    match compact.split_once('/') {
        Some((number, _set_size)) => number.to_string(),
        None => compact,
    }
}

/// Plain text of a notification body, from which candidates can be read any
/// number of times.
pub struct IdentifierExtractor {
    text: String,
}

impl IdentifierExtractor {
    /// Strips the markup from `body` (plain text passes through unchanged).
    pub fn from_body(body: &str) -> Self {
        let text = strip_markup(body);
        debug!("Extracted {} chars of plain text from a {} byte body", text.len(), body.len());
        IdentifierExtractor { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lazily yields every candidate in document order. Each call starts over.
    pub fn candidates(&self) -> impl Iterator<Item = Candidate> + '_ {
        CARD_RE.captures_iter(&self.text).map(|caps| Candidate {
            raw_name: caps[1].trim().to_string(),
            set_code: caps[2].to_string(),
            number: caps[3].trim().to_string(),
        })
    }
}

/// Concatenates the text nodes of an HTML document without adding separators.
pub fn strip_markup(body: &str) -> String {
    let document = Html::parse_document(body);
    document.root_element().text().collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(body: &str) -> Vec<Candidate> {
        IdentifierExtractor::from_body(body).candidates().collect()
    }

    #[test]
    fn test_single_card_with_set_size() {
        let cards = extract("Hydreigon ex (SVP 119/198)");

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].raw_name, "Hydreigon ex");
        assert_eq!(cards[0].set_code, "SVP");
        assert_eq!(cards[0].number, "119/198");
        assert_eq!(cards[0].normalized_number(), "119");
    }

    #[test]
    fn test_html_body() {
        let body = r#"<html><body>
            <p>Twój przedmiot został sprzedany</p>
            <p>Pikachu (sv3pt5 #25)</p><p>Charizard ex (OBF 125)</p>
        </body></html>"#;
        let cards = extract(body);

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].raw_name, "Pikachu");
        assert_eq!(cards[0].normalized_number(), "25");
        assert_eq!(cards[1].raw_name, "Charizard ex");
        assert_eq!(cards[1].set_code, "OBF");
    }

    #[test]
    fn test_accented_and_punctuated_names() {
        let cards = extract("Flabébé (FLI 83)\nFarfetch'd: Galar (SWSH-P 40)");

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].raw_name, "Flabébé");
        assert_eq!(cards[1].raw_name, "Farfetch'd: Galar");
        assert_eq!(cards[1].set_code, "SWSH-P");
    }

    #[test]
    fn test_case_insensitive_alphanumeric_number() {
        let cards = extract("Umbreon VMAX (evs tg23/TG30)");

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].normalized_number(), "tg23");
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(extract("Dziękujemy za sprzedaż!").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn test_candidates_restart() {
        let extractor = IdentifierExtractor::from_body("Mew (MEW 151)");

        assert_eq!(extractor.candidates().count(), 1);
        assert_eq!(extractor.candidates().count(), 1);
    }

    #[test]
    fn test_normalize_number() {
        assert_eq!(normalize_number("#25"), "25");
        assert_eq!(normalize_number("119 / 198"), "119");
        assert_eq!(normalize_number("# 1 2"), "12");
        assert_eq!(normalize_number("TG23"), "TG23");
    }
}
