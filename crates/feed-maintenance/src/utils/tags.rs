//! Tag maps stored as JSON text columns
//!
//! Tags are kept in a `BTreeMap` so that equal maps always serialize to the same
//! text. The extension transaction relies on this to compare-and-swap the column.

use std::collections::BTreeMap;

pub type Tags = BTreeMap<String, String>;

/// Parse a stored tag column; blank or `null` columns are an empty map
pub fn parse_tags(raw: &str) -> Result<Tags, serde_json::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Tags::new());
    }
    serde_json::from_str(trimmed)
}

pub fn serialize_tags(tags: &Tags) -> Result<String, serde_json::Error> {
    serde_json::to_string(tags)
}

/// True when the tag is present with the literal value `"true"`
pub fn tag_is_true(tags: &Tags, key: &str) -> bool {
    tags.get(key).is_some_and(|value| value == "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_columns_parse_to_empty() {
        assert!(parse_tags("").unwrap().is_empty());
        assert!(parse_tags("null").unwrap().is_empty());
        assert!(parse_tags("{}").unwrap().is_empty());
    }

    #[test]
    fn test_serialization_is_key_ordered() {
        let mut a = Tags::new();
        a.insert("zeta".into(), "1".into());
        a.insert("alpha".into(), "2".into());
        assert_eq!(serialize_tags(&a).unwrap(), r#"{"alpha":"2","zeta":"1"}"#);
    }

    #[test]
    fn test_tag_is_true_requires_literal_true() {
        let tags = parse_tags(r#"{"manual_import":"true","other":"yes"}"#).unwrap();
        assert!(tag_is_true(&tags, "manual_import"));
        assert!(!tag_is_true(&tags, "other"));
        assert!(!tag_is_true(&tags, "missing"));
    }

    #[test]
    fn test_non_string_values_are_rejected() {
        assert!(parse_tags(r#"{"manual_import":true}"#).is_err());
    }
}
