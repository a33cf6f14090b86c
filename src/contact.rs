use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{
    lenient_id, lenient_text, or_placeholder, require, require_if_present, Record, RecordId,
};

static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").expect("valid non-digit regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_text::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub address: Option<String>,
    /// Fields this version does not know about, kept so a round trip preserves them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Contact {
    /// Case-insensitive substring match on the name.
    pub fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }

    pub fn formatted_phone(&self) -> String {
        format_phone_number(self.phone.as_deref())
    }

    /// Multi-line summary shown when a linked contact is inspected.
    pub fn card(&self) -> String {
        format!(
            "Name: {}\nPhone: {}\nEmail: {}\nAddress: {}",
            or_placeholder(Some(self.name.as_str()), "No name"),
            self.formatted_phone(),
            or_placeholder(self.email.as_deref(), "No email"),
            or_placeholder(self.address.as_deref(), "No address"),
        )
    }

    /// Inline tag used next to projects and notes.
    pub fn link_label(&self) -> String {
        format!("[{}]", self.name)
    }
}

/// Formats a ten-digit number as `(ddd) ddd-dddd`; anything else is returned as entered.
pub fn format_phone_number(phone: Option<&str>) -> String {
    let phone = match phone {
        Some(p) if !p.is_empty() => p,
        _ => return "No phone".to_string(),
    };
    let digits = NON_DIGIT_RE.replace_all(phone, "");
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..])
    } else {
        phone.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewContact {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        require("name", &self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
}

impl ContactPatch {
    pub fn validate(&self) -> crate::Result<()> {
        require_if_present("name", self.name.as_deref())
    }
}

impl Record for Contact {
    type Draft = NewContact;
    type Patch = ContactPatch;
    const KEY: &'static str = "contacts";
    const KIND: &'static str = "Contact";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: NewContact) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            extra: Map::new(),
        }
    }

    fn apply_patch(&mut self, patch: ContactPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone_number() {
        assert_eq!(format_phone_number(None), "No phone");
        assert_eq!(format_phone_number(Some("")), "No phone");
        assert_eq!(format_phone_number(Some("5551234567")), "(555) 123-4567");
        assert_eq!(format_phone_number(Some("555.123.4567")), "(555) 123-4567");
        assert_eq!(format_phone_number(Some("+1 555 123 4567")), "+1 555 123 4567");
        assert_eq!(format_phone_number(Some("12345")), "12345");
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let contact = Contact::from_draft(1, NewContact::named("Ana Lopez"));
        assert!(contact.matches("ana"));
        assert!(contact.matches("LOP"));
        assert!(contact.matches(""));
        assert!(!contact.matches("bob"));
    }

    #[test]
    fn test_card_uses_placeholders() {
        let mut contact = Contact::from_draft(1, NewContact::named("Ana"));
        contact.phone = Some("(555) 000 1111".to_string());
        assert_eq!(
            contact.card(),
            "Name: Ana\nPhone: (555) 000-1111\nEmail: No email\nAddress: No address"
        );
        assert_eq!(contact.link_label(), "[Ana]");
    }

    #[test]
    fn test_patch_clears_optional_fields() {
        let mut contact = Contact::from_draft(
            1,
            NewContact {
                name: "Ana".to_string(),
                email: Some("ana@example.com".to_string()),
                ..Default::default()
            },
        );
        contact.apply_patch(ContactPatch {
            email: Some(None),
            phone: Some(Some("555".to_string())),
            ..Default::default()
        });
        assert_eq!(contact.name, "Ana");
        assert_eq!(contact.email, None);
        assert_eq!(contact.phone.as_deref(), Some("555"));
        assert!(ContactPatch {
            name: Some(String::new()),
            ..Default::default()
        }
        .validate()
        .is_err());
    }
}
