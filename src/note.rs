use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{lenient_id, lenient_text, require, require_if_present, Record, RecordId};

const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_id::option::deserialize")]
    pub contact_id: Option<RecordId>,
    /// Fields this version does not know about, kept so a round trip preserves them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Note {
    /// First fifty characters of the content, with `...` when truncated.
    pub fn preview(&self) -> String {
        if self.content.chars().count() > PREVIEW_CHARS {
            let head: String = self.content.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.content.clone()
        }
    }

    pub fn summary_line(&self) -> String {
        format!("{} - {}", self.title, self.preview())
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub contact_id: Option<RecordId>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            contact_id: None,
        }
    }

    pub fn linked_to(mut self, contact_id: RecordId) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    pub fn validate(&self) -> crate::Result<()> {
        require("title", &self.title)?;
        require("content", &self.content)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub contact_id: Option<Option<RecordId>>,
}

impl NotePatch {
    pub fn validate(&self) -> crate::Result<()> {
        require_if_present("title", self.title.as_deref())?;
        require_if_present("content", self.content.as_deref())
    }
}

impl Record for Note {
    type Draft = NewNote;
    type Patch = NotePatch;
    const KEY: &'static str = "notes";
    const KIND: &'static str = "Note";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: NewNote) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            contact_id: draft.contact_id,
            extra: Map::new(),
        }
    }

    fn apply_patch(&mut self, patch: NotePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(contact_id) = patch.contact_id {
            self.contact_id = contact_id;
        }
    }
}
