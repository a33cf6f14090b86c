use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::contact::Contact;
use crate::record::{
    lenient_id, lenient_list, lenient_text, or_placeholder, require, require_if_present, Record,
    RecordId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

impl Status {
    pub fn toggled(self) -> Self {
        match self {
            Status::Pending => Status::Completed,
            Status::Completed => Status::Pending,
        }
    }
}

/// Anything other than `Completed` (in any case) reads as `Pending`.
impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) if s.trim().eq_ignore_ascii_case("completed") => Status::Completed,
            _ => Status::Pending,
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => f.write_str("Pending"),
            Status::Completed => f.write_str("Completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub name: String,
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, deserialize_with = "lenient_id::deserialize")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_text::deserialize")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_text::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "lenient_id::option::deserialize")]
    pub contact_id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_list::deserialize")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "lenient_list::deserialize")]
    pub reminders: Vec<Reminder>,
    /// Fields this version does not know about, kept so a round trip preserves them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    pub fn summary_line(&self) -> String {
        format!("{} ({})", self.name, self.status)
    }

    pub fn task(&self, task_id: RecordId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Full view of the project. `contact` is the resolved link, if any.
    pub fn detail(&self, contact: Option<&Contact>) -> String {
        let mut lines = vec![
            self.name.clone(),
            or_placeholder(self.description.as_deref(), "No description").to_string(),
            match self.start_date.as_deref() {
                Some(date) if !date.is_empty() => format!("Start: {}", date),
                _ => "No start date".to_string(),
            },
            format!("Status: {}", self.status),
            match contact {
                Some(c) => format!("Contact: {}", c.name),
                None => "No contact".to_string(),
            },
            "Tasks:".to_string(),
        ];

        if self.tasks.is_empty() {
            lines.push("  No tasks".to_string());
        }
        for task in &self.tasks {
            lines.push(format!("  [{}] {} ({})", task.id, task.name, task.status));
        }

        lines.push("Reminders:".to_string());
        if self.reminders.is_empty() {
            lines.push("  No reminders".to_string());
        }
        for reminder in &self.reminders {
            lines.push(format!("  [{}] {} ({})", reminder.id, reminder.message, reminder.date));
        }

        lines.join("\n")
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub contact_id: Option<RecordId>,
}

impl NewProject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn linked_to(mut self, contact_id: RecordId) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    pub fn validate(&self) -> crate::Result<()> {
        require("name", &self.name)
    }
}

/// Nested `tasks` and `reminders` are replaced as whole lists, never merged.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<Option<String>>,
    pub status: Option<Status>,
    pub contact_id: Option<Option<RecordId>>,
    pub tasks: Option<Vec<Task>>,
    pub reminders: Option<Vec<Reminder>>,
}

impl ProjectPatch {
    pub fn validate(&self) -> crate::Result<()> {
        require_if_present("name", self.name.as_deref())
    }
}

impl Record for Project {
    type Draft = NewProject;
    type Patch = ProjectPatch;
    const KEY: &'static str = "projects";
    const KIND: &'static str = "Project";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: NewProject) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            start_date: draft.start_date,
            status: Status::Pending,
            contact_id: draft.contact_id,
            tasks: Vec::new(),
            reminders: Vec::new(),
            extra: Map::new(),
        }
    }

    fn apply_patch(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(contact_id) = patch.contact_id {
            self.contact_id = contact_id;
        }
        if let Some(tasks) = patch.tasks {
            self.tasks = tasks;
        }
        if let Some(reminders) = patch.reminders {
            self.reminders = reminders;
        }
    }
}
