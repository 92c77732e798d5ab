//! Interpreting model output as a category summary.
//!
//! Models do not reliably follow the JSON instruction, so the response goes
//! through an ordered list of strategies and the first match wins.

use serde::Deserialize;

use crate::models::CategorySummary;

/// One way of reading a model response.
pub trait ResponseParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when this strategy does not recognise the response.
    fn parse(&self, response: &str) -> Option<CategorySummary>;
}

#[derive(Debug, Deserialize)]
struct RawSummary {
    category: String,
    pain_points: String,
}

fn from_json(text: &str) -> Option<CategorySummary> {
    let raw: RawSummary = serde_json::from_str(text).ok()?;
    CategorySummary::new(raw.category, raw.pain_points)
}

/// The whole response is the requested JSON object.
#[derive(Debug, Default)]
pub struct StrictJson;

impl ResponseParser for StrictJson {
    fn name(&self) -> &'static str {
        "strict_json"
    }

    fn parse(&self, response: &str) -> Option<CategorySummary> {
        from_json(response.trim())
    }
}

/// A JSON object surrounded by code fences or prose.
#[derive(Debug, Default)]
pub struct EmbeddedJson;

impl ResponseParser for EmbeddedJson {
    fn name(&self) -> &'static str {
        "embedded_json"
    }

    fn parse(&self, response: &str) -> Option<CategorySummary> {
        let start = response.find('{')?;
        let end = response.rfind('}')?;
        if end <= start {
            return None;
        }
        from_json(&response[start..=end])
    }
}

/// `Category:` / `Pain points:` lines, with placeholders for whatever is missing.
///
/// Always produces a summary, so it belongs last in the chain.
#[derive(Debug, Default)]
pub struct LinePrefix;

impl LinePrefix {
    fn value_after<'a>(line: &'a str, prefixes: &[&str]) -> Option<&'a str> {
        let lower = line.to_lowercase();
        prefixes
            .iter()
            .find(|prefix| lower.starts_with(**prefix))
            .and_then(|_| line.split_once(':'))
            .map(|(_, rest)| rest.trim())
            .filter(|rest| !rest.is_empty())
    }
}

impl ResponseParser for LinePrefix {
    fn name(&self) -> &'static str {
        "line_prefix"
    }

    fn parse(&self, response: &str) -> Option<CategorySummary> {
        let mut category = None;
        let mut pain_points = None;

        for line in response.lines().map(str::trim) {
            if let Some(value) = Self::value_after(line, &["category:"]) {
                category = Some(value);
            } else if let Some(value) = Self::value_after(line, &["pain points:", "pain_points:"])
            {
                pain_points = Some(value);
            }
        }

        let fallback = CategorySummary::fallback();
        CategorySummary::new(
            category.unwrap_or(fallback.category()),
            pain_points.unwrap_or(fallback.pain_points()),
        )
    }
}

/// Ordered parser strategies.
pub struct ParserChain {
    parsers: Vec<Box<dyn ResponseParser>>,
}

impl Default for ParserChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(StrictJson),
            Box::new(EmbeddedJson),
            Box::new(LinePrefix),
        ])
    }
}

impl ParserChain {
    pub(crate) fn new(parsers: Vec<Box<dyn ResponseParser>>) -> Self {
        Self { parsers }
    }

    /// Run each strategy in order; placeholders if none matches.
    #[must_use]
    pub fn parse(&self, response: &str) -> (CategorySummary, &'static str) {
        for parser in &self.parsers {
            if let Some(summary) = parser.parse(response) {
                return (summary, parser.name());
            }
        }
        (CategorySummary::fallback(), "placeholder")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FALLBACK_CATEGORY, FALLBACK_PAIN_POINTS};

    #[test]
    fn test_strict_json() {
        let (summary, via) = ParserChain::default()
            .parse(r#"{"category": "Slow app", "pain_points": "Users report lag."}"#);
        assert_eq!(via, "strict_json");
        assert_eq!(summary.category(), "Slow app");
        assert_eq!(summary.pain_points(), "Users report lag.");
    }

    #[test]
    fn test_empty_field_is_rejected() {
        let response = r#"{"category": "", "pain_points": "ok"}"#;
        assert!(StrictJson.parse(response).is_none());
        assert!(EmbeddedJson.parse(response).is_none());

        let (summary, via) = ParserChain::default().parse(response);
        assert_eq!(via, "line_prefix");
        assert_eq!(summary.category(), FALLBACK_CATEGORY);
        assert_eq!(summary.pain_points(), FALLBACK_PAIN_POINTS);
    }

    #[test]
    fn test_whitespace_field_is_rejected() {
        assert!(StrictJson
            .parse(r#"{"category": "Billing", "pain_points": "   "}"#)
            .is_none());
    }

    #[test]
    fn test_fenced_json() {
        let response = "Here you go:\n```json\n{\"category\": \"Login\", \"pain_points\": \"2FA codes expire.\"}\n```";
        let (summary, via) = ParserChain::default().parse(response);
        assert_eq!(via, "embedded_json");
        assert_eq!(summary.category(), "Login");
    }

    #[test]
    fn test_line_prefix_case_insensitive() {
        let response = "CATEGORY: Sync failures\nPain Points: Files vanish after syncing.";
        let (summary, via) = ParserChain::default().parse(response);
        assert_eq!(via, "line_prefix");
        assert_eq!(summary.category(), "Sync failures");
        assert_eq!(summary.pain_points(), "Files vanish after syncing.");
    }

    #[test]
    fn test_line_prefix_partial_uses_placeholder() {
        let summary = LinePrefix.parse("category: Pricing\nsomething else").unwrap();
        assert_eq!(summary.category(), "Pricing");
        assert_eq!(summary.pain_points(), FALLBACK_PAIN_POINTS);
    }

    #[test]
    fn test_line_prefix_blank_value_uses_placeholder() {
        let summary = LinePrefix.parse("Category:   \nPain points: Crashes").unwrap();
        assert_eq!(summary.category(), FALLBACK_CATEGORY);
        assert_eq!(summary.pain_points(), "Crashes");
    }

    #[test]
    fn test_empty_chain_gives_placeholder() {
        let (summary, via) = ParserChain::new(vec![]).parse("anything");
        assert_eq!(via, "placeholder");
        assert_eq!(summary.category(), FALLBACK_CATEGORY);
    }
}
