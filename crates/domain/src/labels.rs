//! Parsing of free-form text returned by the text-understanding service.

use responder_core::models::AmbulanceTier;
use responder_core::{ResponderError, ResponderResult};

/// Removes a surrounding markdown code fence (with or without a language tag).
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Reads an ambulance tier out of a classifier reply.
///
/// Accepts a bare label ("ALS", "als.") or a sentence containing exactly one
/// distinct tier label. Anything else is a format error.
pub fn parse_ambulance_tier(raw: &str) -> ResponderResult<AmbulanceTier> {
    let cleaned = strip_code_fence(raw);
    if let Ok(tier) = cleaned.parse::<AmbulanceTier>() {
        return Ok(tier);
    }

    let mut found: Vec<AmbulanceTier> = cleaned
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter_map(|word| match word.to_ascii_uppercase().as_str() {
            "BLS" => Some(AmbulanceTier::Basic),
            "ALS" => Some(AmbulanceTier::Advanced),
            "CCT" => Some(AmbulanceTier::CriticalCareTransport),
            _ => None,
        })
        .collect();
    found.dedup();

    match found.as_slice() {
        [tier] => Ok(*tier),
        [] => Err(ResponderError::classification_format(format!(
            "no ambulance tier label in reply: {cleaned:?}"
        ))),
        _ => Err(ResponderError::classification_format(format!(
            "ambiguous ambulance tier reply: {cleaned:?}"
        ))),
    }
}

/// Extracts the first bracketed list (`["burn", "trauma"]`) from a reply.
/// Returns an empty list when no list is present.
pub fn parse_care_categories(raw: &str) -> Vec<String> {
    let Some(start) = raw.find('[') else {
        return Vec::new();
    };
    let Some(len) = raw[start + 1..].find(']') else {
        return Vec::new();
    };

    raw[start + 1..start + 1 + len]
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"Fire\": \"\"}\n```"), "{\"Fire\": \"\"}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```json {} ```"), "{}");
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_tier_bare_label() {
        assert_eq!(parse_ambulance_tier("ALS").unwrap(), AmbulanceTier::Advanced);
        assert_eq!(parse_ambulance_tier(" cct\n").unwrap(), AmbulanceTier::CriticalCareTransport);
    }

    #[test]
    fn test_parse_tier_in_sentence() {
        assert_eq!(
            parse_ambulance_tier("Classification: BLS (stable, minor injuries)").unwrap(),
            AmbulanceTier::Basic
        );
    }

    #[test]
    fn test_parse_tier_rejects_unknown_and_ambiguous() {
        assert!(matches!(
            parse_ambulance_tier("helicopter"),
            Err(ResponderError::ClassificationFormat(_))
        ));
        assert!(parse_ambulance_tier("either ALS or BLS").is_err());
    }

    #[test]
    fn test_parse_care_categories() {
        assert_eq!(
            parse_care_categories("Needs: [\"burn\", 'trauma', \"ICU\"]"),
            vec!["burn", "trauma", "ICU"]
        );
        assert_eq!(parse_care_categories("[]"), Vec::<String>::new());
        assert!(parse_care_categories("burn, trauma").is_empty());
    }
}
