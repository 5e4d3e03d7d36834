//! Payload extraction from free-form model output.
//!
//! Models wrap answers in markdown fences, prepend explanations, or both.
//! Every step that needs SQL or JSON out of a completion goes through
//! `extract_payload`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SQL_FENCE: Regex = Regex::new(r"(?is)```sql\s*(.*?)```").unwrap();
    static ref JSON_FENCE: Regex = Regex::new(r"(?is)```json\s*(.*?)```").unwrap();
    static ref ANY_FENCE: Regex = Regex::new(r"(?s)```\s*(.*?)```").unwrap();
    static ref SELECT_START: Regex = Regex::new(r"(?i)\bSELECT\b").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Sql,
    Json,
}

pub fn extract_payload(text: &str, kind: PayloadKind) -> String {
    match kind {
        PayloadKind::Sql => extract_sql(text),
        PayloadKind::Json => extract_json(text),
    }
}

fn extract_sql(text: &str) -> String {
    if let Some(caps) = SQL_FENCE.captures(text) {
        return caps[1].trim().to_string();
    }
    if let Some(caps) = ANY_FENCE.captures(text) {
        return strip_language_hint(caps[1].trim(), "sql").to_string();
    }
    if let Some(m) = SELECT_START.find(text) {
        return text[m.start()..].trim().to_string();
    }
    text.trim().to_string()
}

fn extract_json(text: &str) -> String {
    if let Some(caps) = JSON_FENCE.captures(text) {
        return caps[1].trim().to_string();
    }
    if let Some(caps) = ANY_FENCE.captures(text) {
        return strip_language_hint(caps[1].trim(), "json").to_string();
    }

    let start = text.find(|c: char| c == '{' || c == '[');
    let end = text.rfind(|c: char| c == '}' || c == ']');
    match (start, end) {
        (Some(s), Some(e)) if e > s => text[s..=e].to_string(),
        _ => text.trim().to_string(),
    }
}

/// Drop a leading `sql`/`json` tag left on the first line of a bare fence
fn strip_language_hint<'a>(body: &'a str, hint: &str) -> &'a str {
    let Some(prefix) = body.get(..hint.len()) else {
        return body;
    };
    if !prefix.eq_ignore_ascii_case(hint) {
        return body;
    }
    let rest = &body[hint.len()..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        rest.trim()
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_fence() {
        let text = "Here you go:\n```sql\nSELECT COUNT(*) FROM customers;\n```\nDone.";
        assert_eq!(extract_payload(text, PayloadKind::Sql), "SELECT COUNT(*) FROM customers;");
    }

    #[test]
    fn test_sql_fence_uppercase_tag() {
        let text = "```SQL\nSELECT 1\n```";
        assert_eq!(extract_payload(text, PayloadKind::Sql), "SELECT 1");
    }

    #[test]
    fn test_generic_fence_with_hint_on_next_token() {
        let text = "```\nsql\nSELECT name FROM products\n```";
        assert_eq!(extract_payload(text, PayloadKind::Sql), "SELECT name FROM products");

        let plain = "```\nSELECT 2\n```";
        assert_eq!(extract_payload(plain, PayloadKind::Sql), "SELECT 2");
    }

    #[test]
    fn test_sql_after_explanation() {
        let text = "The column was misnamed. Fixed query:\nSELECT id FROM orders LIMIT 100";
        assert_eq!(
            extract_payload(text, PayloadKind::Sql),
            "SELECT id FROM orders LIMIT 100"
        );
    }

    #[test]
    fn test_sql_raw_fallback() {
        assert_eq!(extract_payload("  I cannot help  ", PayloadKind::Sql), "I cannot help");
    }

    #[test]
    fn test_json_fences_and_slices() {
        assert_eq!(
            extract_payload("```json\n{\"intent\": \"DATA_QUERY\"}\n```", PayloadKind::Json),
            "{\"intent\": \"DATA_QUERY\"}"
        );
        assert_eq!(
            extract_payload("Sure! [\"orders\", \"customers\"] are needed.", PayloadKind::Json),
            "[\"orders\", \"customers\"]"
        );
        assert_eq!(
            extract_payload("```\n{\"data\": []}\n```", PayloadKind::Json),
            "{\"data\": []}"
        );
        assert_eq!(extract_payload("no json here", PayloadKind::Json), "no json here");
    }
}
