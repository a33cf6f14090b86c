//! Whole-dataset export and import.
//!
//! The document is a JSON object with the keys `emails`, `contacts`,
//! `projects` and `notes`, each holding that collection's records in order.
//! An import replaces every collection whose key is present and leaves the
//! others alone. Those replacements are independent writes, one per key, not
//! a single transaction. Only a document that is not JSON at all is refused
//! outright; a section that cannot be read is skipped and reported while the
//! other sections still apply.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::contact::Contact;
use crate::email::Email;
use crate::error::ProductivityError;
use crate::note::Note;
use crate::project::Project;
use crate::record::Record;
use crate::workspace::Workspace;

pub const EXPORT_FILE_NAME: &str = "productivity-data.json";
pub const EXPORT_MIME_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub emails: &'a [Email],
    pub contacts: &'a [Contact],
    pub projects: &'a [Project],
    pub notes: &'a [Note],
}

/// Record counts for each collection an import replaced, plus the sections it
/// had to leave untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub emails: Option<usize>,
    pub contacts: Option<usize>,
    pub projects: Option<usize>,
    pub notes: Option<usize>,
    /// `(key, reason)` for each present section that could not be read.
    pub skipped: Vec<(&'static str, String)>,
}

impl ImportSummary {
    /// True when no collection was replaced.
    pub fn is_empty(&self) -> bool {
        self.replaced().is_empty()
    }

    /// `(key, record count)` for every replaced collection.
    pub fn replaced(&self) -> Vec<(&'static str, usize)> {
        [
            (Email::KEY, self.emails),
            (Contact::KEY, self.contacts),
            (Project::KEY, self.projects),
            (Note::KEY, self.notes),
        ]
        .into_iter()
        .filter_map(|(key, count)| count.map(|c| (key, c)))
        .collect()
    }
}

struct ParsedImport {
    emails: Option<Vec<Email>>,
    contacts: Option<Vec<Contact>>,
    projects: Option<Vec<Project>>,
    notes: Option<Vec<Note>>,
    skipped: Vec<(&'static str, String)>,
}

impl ParsedImport {
    /// Fails only when `text` is not a JSON document. Sections are read
    /// independently of each other.
    fn parse(text: &str) -> crate::Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProductivityError::ImportParse(e.to_string()))?;

        let mut doc = match value {
            Value::Object(doc) => doc,
            Value::Null => {
                return Err(ProductivityError::ImportParse("document is null".to_string()));
            }
            other => {
                warn!("Import document is not an object ({}), nothing to import", type_name(&other));
                Map::new()
            }
        };

        let mut skipped = Vec::new();
        Ok(Self {
            emails: take_section(&mut doc, &mut skipped),
            contacts: take_section(&mut doc, &mut skipped),
            projects: take_section(&mut doc, &mut skipped),
            notes: take_section(&mut doc, &mut skipped),
            skipped,
        })
    }
}

fn take_section<T: Record>(
    doc: &mut Map<String, Value>,
    skipped: &mut Vec<(&'static str, String)>,
) -> Option<Vec<T>> {
    match doc.remove(T::KEY) {
        None | Some(Value::Null) => None,
        Some(section) => match serde_json::from_value(section) {
            Ok(records) => Some(records),
            Err(e) => {
                warn!("Skipping unreadable '{}' section: {}", T::KEY, e);
                skipped.push((T::KEY, e.to_string()));
                None
            }
        },
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Workspace {
    pub fn export_document(&self) -> ExportDocument<'_> {
        ExportDocument {
            emails: self.emails.records(),
            contacts: self.contacts.records(),
            projects: self.projects.records(),
            notes: self.notes.records(),
        }
    }

    /// Pretty-printed export document.
    pub fn export_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_document())?)
    }

    /// Replaces each collection named in `text`. Invalid JSON changes nothing.
    pub fn import_json(&mut self, text: &str) -> crate::Result<ImportSummary> {
        let parsed = ParsedImport::parse(text)?;
        let mut summary = ImportSummary {
            skipped: parsed.skipped,
            ..ImportSummary::default()
        };

        if let Some(emails) = parsed.emails {
            summary.emails = Some(emails.len());
            self.emails.replace_all(emails);
        }
        if let Some(contacts) = parsed.contacts {
            summary.contacts = Some(contacts.len());
            self.contacts.replace_all(contacts);
        }
        if let Some(projects) = parsed.projects {
            summary.projects = Some(projects.len());
            self.projects.replace_all(projects);
        }
        if let Some(notes) = parsed.notes {
            summary.notes = Some(notes.len());
            self.notes.replace_all(notes);
        }

        info!("Imported {:?}", summary.replaced());
        Ok(summary)
    }

    pub async fn export_to_path(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        let json = self.export_json()?;
        tokio::fs::write(path, json.as_bytes()).await?;
        info!("Exported data to {}", path.display());
        Ok(())
    }

    pub async fn import_from_path(&mut self, path: impl AsRef<Path>) -> crate::Result<ImportSummary> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        self.import_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::NewContact;
    use crate::email::NewEmail;
    use crate::note::NewNote;
    use crate::project::NewProject;
    use crate::storage::tests::RecordingNotifier;
    use crate::storage::{KeyValueStore, MemoryBackend};
    use tempfile::TempDir;

    fn seeded(store: &KeyValueStore) -> Workspace {
        let mut ws = Workspace::open(store).with_sequential_ids(100);
        ws.add_email(NewEmail::new("Intro", "Hello").with_category("Sales")).unwrap();
        let ana = ws.add_contact(NewContact::named("Ana")).unwrap();
        let project = ws.add_project(NewProject::named("Site").linked_to(ana)).unwrap();
        ws.add_task(project, "Wireframes").unwrap();
        ws.add_reminder(project, "2024-06-01", "Kickoff");
        ws.add_note(NewNote::new("Call", "Discuss scope").linked_to(ana)).unwrap();
        ws
    }

    fn snapshot(ws: &Workspace) -> (Vec<Email>, Vec<Contact>, Vec<Project>, Vec<Note>) {
        (
            ws.emails.records().to_vec(),
            ws.contacts.records().to_vec(),
            ws.projects.records().to_vec(),
            ws.notes.records().to_vec(),
        )
    }

    #[test]
    fn test_export_has_exactly_four_keys() {
        let ws = seeded(&KeyValueStore::in_memory());
        let value: Value = serde_json::from_str(&ws.export_json().unwrap()).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        for key in ["emails", "contacts", "projects", "notes"] {
            assert!(value[key].is_array(), "missing {}", key);
        }
        assert_eq!(value["projects"][0]["contactId"], 100);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let source = seeded(&KeyValueStore::in_memory());
        let json = source.export_json().unwrap();

        let mut target = Workspace::open(&KeyValueStore::in_memory());
        let summary = target.import_json(&json).unwrap();
        assert_eq!(summary.replaced().len(), 4);
        assert_eq!(snapshot(&target), snapshot(&source));
    }

    #[test]
    fn test_partial_import_only_touches_present_keys() {
        let store = KeyValueStore::in_memory();
        let mut ws = seeded(&store);
        let (emails, _, projects, notes) = snapshot(&ws);

        let summary = ws
            .import_json(r#"{"contacts": [{"id": 1, "name": "Zed"}, {"id": 2, "name": "Yan"}]}"#)
            .unwrap();
        assert_eq!(summary.contacts, Some(2));
        assert_eq!(summary.emails, None);

        let (emails_after, contacts_after, projects_after, notes_after) = snapshot(&ws);
        assert_eq!(emails_after, emails);
        assert_eq!(projects_after, projects);
        assert_eq!(notes_after, notes);
        let names: Vec<&str> = contacts_after.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Zed", "Yan"]);

        // The replacement is persisted.
        let reopened = Workspace::open(&store);
        assert_eq!(reopened.contacts.len(), 2);
        assert_eq!(reopened.emails.len(), 1);
    }

    #[test]
    fn test_malformed_json_changes_nothing() {
        let mut ws = seeded(&KeyValueStore::in_memory());
        let before = snapshot(&ws);
        let err = ws.import_json(r#"{"contacts": [ {"name": "Zed"} "#).unwrap_err();
        assert!(matches!(err, ProductivityError::ImportParse(_)));
        assert_eq!(snapshot(&ws), before);
    }

    #[test]
    fn test_null_document_is_a_parse_error() {
        let mut ws = seeded(&KeyValueStore::in_memory());
        let before = snapshot(&ws);
        let err = ws.import_json("null").unwrap_err();
        assert!(matches!(err, ProductivityError::ImportParse(_)));
        assert_eq!(snapshot(&ws), before);
    }

    #[test]
    fn test_unreadable_section_does_not_block_the_others() {
        let mut ws = seeded(&KeyValueStore::in_memory());
        let (emails, _, projects, _) = snapshot(&ws);

        let summary = ws
            .import_json(r#"{"contacts": [{"id": 5, "name": "New"}], "notes": "not a list"}"#)
            .unwrap();
        assert_eq!(summary.contacts, Some(1));
        assert_eq!(summary.notes, None);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].0, "notes");

        assert_eq!(ws.contacts.records()[0].name, "New");
        assert_eq!(ws.notes.len(), 1);
        assert_eq!(ws.emails.records(), emails.as_slice());
        assert_eq!(ws.projects.records(), projects.as_slice());
    }

    #[test]
    fn test_foreign_status_and_null_names_still_import() {
        let mut ws = seeded(&KeyValueStore::in_memory());
        let summary = ws
            .import_json(
                r#"{"contacts": [{"id": 5, "name": "New"}, {"id": 6, "name": null}],
                    "projects": [{"id": 9, "name": "P", "status": "In Progress"}]}"#,
            )
            .unwrap();
        assert!(summary.skipped.is_empty());
        assert_eq!(summary.contacts, Some(2));
        assert_eq!(summary.projects, Some(1));

        let names: Vec<&str> = ws.contacts.records().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["New", ""]);
        let project = ws.projects.get(9).unwrap();
        assert_eq!(project.status, crate::project::Status::Pending);
    }

    #[test]
    fn test_unknown_fields_survive_import_and_export() {
        let mut ws = Workspace::open(&KeyValueStore::in_memory());
        ws.import_json(
            r#"{"contacts": [{"id": 5, "name": "Ana", "company": "Acme", "tags": ["vip"]}],
                "notes": [{"id": 6, "title": "T", "content": "C", "contactId": 5, "pinned": true}]}"#,
        )
        .unwrap();

        let value: Value = serde_json::from_str(&ws.export_json().unwrap()).unwrap();
        assert_eq!(value["contacts"][0]["company"], "Acme");
        assert_eq!(value["contacts"][0]["tags"][0], "vip");
        assert_eq!(value["notes"][0]["pinned"], true);
        assert_eq!(value["notes"][0]["contactId"], 5);
    }

    #[test]
    fn test_import_proceeds_when_storage_writes_fail() {
        let backend = MemoryBackend::default();
        let notifier = RecordingNotifier::default();
        let store = KeyValueStore::new(backend.clone()).with_notifier(notifier.clone());
        let mut ws = seeded(&store);
        let notified_before = notifier.count();

        backend.set_disabled(true);
        let source = seeded(&KeyValueStore::in_memory());
        let mut json: Value = serde_json::from_str(&source.export_json().unwrap()).unwrap();
        json["contacts"] = serde_json::json!([{"id": 1, "name": "Zed"}]);

        let summary = ws.import_json(&json.to_string()).unwrap();
        assert_eq!(summary.replaced().len(), 4);
        assert_eq!(notifier.count() - notified_before, 4);
        assert_eq!(ws.contacts.records()[0].name, "Zed");
        assert_eq!(ws.emails.len(), 1);

        // Nothing reached the backend, so a reopen sees the seeded data.
        backend.set_disabled(false);
        let reopened = Workspace::open(&store);
        assert_eq!(reopened.contacts.records()[0].name, "Ana");
    }

    #[test]
    fn test_null_sections_and_non_objects_are_ignored() {
        let mut ws = seeded(&KeyValueStore::in_memory());
        let before = snapshot(&ws);
        assert!(ws.import_json(r#"{"emails": null}"#).unwrap().is_empty());
        assert!(ws.import_json("[1, 2, 3]").unwrap().is_empty());
        assert_eq!(snapshot(&ws), before);

        let summary = ws.import_json(r#"{"emails": []}"#).unwrap();
        assert_eq!(summary.emails, Some(0));
        assert!(ws.emails.is_empty());
    }

    #[test]
    fn test_import_accepts_legacy_string_references() {
        let mut ws = Workspace::open(&KeyValueStore::in_memory());
        ws.import_json(
            r#"{"contacts":[{"id":1001,"name":"Ana","email":"","phone":"","address":""}],
                "projects":[{"id":2002,"name":"X","description":"","startDate":"","status":"Pending",
                             "contactId":"1001","tasks":[],"reminders":[]}]}"#,
        )
        .unwrap();
        let project = ws.projects.get(2002).unwrap();
        assert_eq!(ws.project_contact(project).unwrap().name, "Ana");
    }

    #[test]
    fn test_file_roundtrip() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join(EXPORT_FILE_NAME);
        let source = seeded(&KeyValueStore::in_memory());
        tokio_test::block_on(source.export_to_path(&path)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"emails\""));

        let mut target = Workspace::open(&KeyValueStore::in_memory());
        tokio_test::block_on(target.import_from_path(&path)).unwrap();
        assert_eq!(snapshot(&target), snapshot(&source));
    }

    #[test]
    fn test_import_missing_file_is_io_error() {
        let tmp_dir = TempDir::new().unwrap();
        let mut ws = Workspace::open(&KeyValueStore::in_memory());
        let err = tokio_test::block_on(ws.import_from_path(tmp_dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, ProductivityError::Io(_)));
    }
}
