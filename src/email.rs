use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{
    lenient_id, lenient_text, or_placeholder, require, require_if_present, Record, RecordId,
};

/// A reusable email template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "lenient_text::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub template: String,
    /// Fields this version does not know about, kept so a round trip preserves them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Email {
    /// `"<title> (<category>)"`, with `Uncategorized` for a missing category.
    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            self.title,
            or_placeholder(self.category.as_deref(), "Uncategorized")
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewEmail {
    pub title: String,
    pub category: Option<String>,
    pub template: String,
}

impl NewEmail {
    pub fn new(title: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: None,
            template: template.into(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn validate(&self) -> crate::Result<()> {
        require("title", &self.title)?;
        require("template", &self.template)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmailPatch {
    pub title: Option<String>,
    pub category: Option<Option<String>>,
    pub template: Option<String>,
}

impl EmailPatch {
    pub fn validate(&self) -> crate::Result<()> {
        require_if_present("title", self.title.as_deref())?;
        require_if_present("template", self.template.as_deref())
    }
}

impl Record for Email {
    type Draft = NewEmail;
    type Patch = EmailPatch;
    const KEY: &'static str = "emails";
    const KIND: &'static str = "Email";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: NewEmail) -> Self {
        Self {
            id,
            title: draft.title,
            category: draft.category,
            template: draft.template,
            extra: Map::new(),
        }
    }

    fn apply_patch(&mut self, patch: EmailPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(template) = patch.template {
            self.template = template;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_falls_back_to_uncategorized() {
        let mut email = Email::from_draft(1, NewEmail::new("Welcome", "Hi {name}"));
        assert_eq!(email.label(), "Welcome (Uncategorized)");
        email.category = Some(String::new());
        assert_eq!(email.label(), "Welcome (Uncategorized)");
        email.category = Some("Sales".to_string());
        assert_eq!(email.label(), "Welcome (Sales)");
    }

    #[test]
    fn test_presence_checks() {
        assert!(NewEmail::new("t", "body").validate().is_ok());
        assert!(NewEmail::new(" ", "body").validate().is_err());
        assert!(NewEmail::new("t", "").validate().is_err());
        assert!(EmailPatch::default().validate().is_ok());
        let patch = EmailPatch {
            template: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_reads_stored_shape() {
        let email: Email =
            serde_json::from_str(r#"{"title":"T","category":"","template":"X","id":1700000000000}"#)
                .unwrap();
        assert_eq!(email.id, 1_700_000_000_000);
        assert_eq!(email.category.as_deref(), Some(""));

        let json = serde_json::to_value(Email::from_draft(3, NewEmail::new("a", "b"))).unwrap();
        assert_eq!(json, serde_json::json!({"id": 3, "title": "a", "template": "b"}));
    }
}
