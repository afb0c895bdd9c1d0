use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Opaque identifier of a match, passed through verbatim to the bound field.
/// Numbers keep their JSON spelling; any other non-null value is held as text.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum MatchId {
    Number(serde_json::Number),
    Text(String),
    #[default]
    Missing,
}

impl MatchId {
    /// The id as written into a form value.
    pub fn as_value(&self) -> String {
        self.to_string()
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.pad(&n.to_string()),
            Self::Text(s) => f.pad(s),
            Self::Missing => f.pad(""),
        }
    }
}

impl<'de> Deserialize<'de> for MatchId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Self::Missing,
            Value::Number(n) => Self::Number(n),
            other => Self::Text(value_text(other)),
        })
    }
}

impl From<i64> for MatchId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for MatchId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One suggestion returned by a lookup endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchItem {
    #[serde(default, skip_serializing_if = "MatchId::is_missing")]
    pub id: MatchId,
    #[serde(default, deserialize_with = "lenient_label")]
    pub label: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

impl MatchItem {
    pub fn new(id: impl Into<MatchId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Description worth displaying: present and non-empty.
    pub fn visible_description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

/// Text of a JSON value as a page would print it: strings verbatim, other
/// values in their JSON spelling.
fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        other => Some(value_text(other)),
    })
}

fn lenient_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_text_ids_pass_through() {
        let items: Vec<MatchItem> = serde_json::from_str(
            r#"[{"id": 2, "label": "Albert"}, {"id": "u-7", "label": "Uma", "description": "Tutor"}]"#,
        )
        .unwrap();
        assert_eq!(items[0].id.as_value(), "2");
        assert_eq!(items[1].id.as_value(), "u-7");
        assert_eq!(items[1].visible_description(), Some("Tutor"));
    }

    #[test]
    fn test_missing_fields_default() {
        let item: MatchItem = serde_json::from_str(r#"{"label": null}"#).unwrap();
        assert!(item.id.is_missing());
        assert_eq!(item.label, "");
        assert_eq!(item.description, None);
    }

    #[test]
    fn test_mistyped_scalars_become_text() {
        let item: MatchItem =
            serde_json::from_str(r#"{"id": true, "label": 42, "description": 7.5}"#).unwrap();
        assert_eq!(item.id, MatchId::Text("true".to_string()));
        assert_eq!(item.label, "42");
        assert_eq!(item.visible_description(), Some("7.5"));

        let item: MatchItem = serde_json::from_str(r#"{"id": null, "label": false}"#).unwrap();
        assert!(item.id.is_missing());
        assert_eq!(item.label, "false");
    }

    #[test]
    fn test_display_honours_width() {
        assert_eq!(format!("{:<6}|", MatchId::from(42)), "42    |");
        assert_eq!(format!("{:>6}|", MatchId::from("u-7")), "   u-7|");
        assert_eq!(format!("{:<3}|", MatchId::Missing), "   |");
    }

    #[test]
    fn test_empty_description_is_not_visible() {
        let item = MatchItem::new(1, "Alice").with_description("");
        assert_eq!(item.visible_description(), None);
    }
}
