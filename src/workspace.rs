use tracing::info;

use crate::collection::Collection;
use crate::contact::{Contact, ContactPatch, NewContact};
use crate::email::{Email, EmailPatch, NewEmail};
use crate::note::{NewNote, Note, NotePatch};
use crate::project::{NewProject, Project, ProjectPatch, Reminder, Status, Task};
use crate::record::{require, RecordId, SequentialIds};
use crate::storage::KeyValueStore;

/// Owns the four collections for the lifetime of the application.
///
/// Contact links held by projects and notes are plain ids. Deleting a contact
/// leaves them dangling; lookups through them resolve to `None`.
pub struct Workspace {
    pub emails: Collection<Email>,
    pub contacts: Collection<Contact>,
    pub projects: Collection<Project>,
    pub notes: Collection<Note>,
}

impl Workspace {
    pub fn open(store: &KeyValueStore) -> Self {
        let workspace = Self {
            emails: Collection::open(store),
            contacts: Collection::open(store),
            projects: Collection::open(store),
            notes: Collection::open(store),
        };
        info!(
            "Workspace loaded: {} email(s), {} contact(s), {} project(s), {} note(s)",
            workspace.emails.len(),
            workspace.contacts.len(),
            workspace.projects.len(),
            workspace.notes.len()
        );
        workspace
    }

    /// Swaps every collection to a counter starting at `first`.
    pub fn with_sequential_ids(self, first: RecordId) -> Self {
        Self {
            emails: self.emails.with_ids(SequentialIds::starting_at(first)),
            contacts: self.contacts.with_ids(SequentialIds::starting_at(first)),
            projects: self.projects.with_ids(SequentialIds::starting_at(first)),
            notes: self.notes.with_ids(SequentialIds::starting_at(first)),
        }
    }

    // Presence-checked adds and edits

    pub fn add_email(&mut self, draft: NewEmail) -> crate::Result<RecordId> {
        draft.validate()?;
        Ok(self.emails.add(draft).id)
    }

    pub fn edit_email(&mut self, id: RecordId, patch: EmailPatch) -> crate::Result<bool> {
        patch.validate()?;
        Ok(self.emails.update(id, patch))
    }

    pub fn add_contact(&mut self, draft: NewContact) -> crate::Result<RecordId> {
        draft.validate()?;
        Ok(self.contacts.add(draft).id)
    }

    pub fn edit_contact(&mut self, id: RecordId, patch: ContactPatch) -> crate::Result<bool> {
        patch.validate()?;
        Ok(self.contacts.update(id, patch))
    }

    pub fn add_project(&mut self, draft: NewProject) -> crate::Result<RecordId> {
        draft.validate()?;
        Ok(self.projects.add(draft).id)
    }

    pub fn edit_project(&mut self, id: RecordId, patch: ProjectPatch) -> crate::Result<bool> {
        patch.validate()?;
        Ok(self.projects.update(id, patch))
    }

    pub fn add_note(&mut self, draft: NewNote) -> crate::Result<RecordId> {
        draft.validate()?;
        Ok(self.notes.add(draft).id)
    }

    pub fn edit_note(&mut self, id: RecordId, patch: NotePatch) -> crate::Result<bool> {
        patch.validate()?;
        Ok(self.notes.update(id, patch))
    }

    // Contact lookups

    /// Resolves an optional contact link. Missing and dangling links give `None`.
    pub fn linked_contact(&self, contact_id: Option<RecordId>) -> Option<&Contact> {
        contact_id.and_then(|id| self.contacts.get(id))
    }

    pub fn project_contact(&self, project: &Project) -> Option<&Contact> {
        self.linked_contact(project.contact_id)
    }

    pub fn note_contact(&self, note: &Note) -> Option<&Contact> {
        self.linked_contact(note.contact_id)
    }

    pub fn search_contacts(&self, query: &str) -> Vec<&Contact> {
        self.contacts
            .records()
            .iter()
            .filter(|c| c.matches(query))
            .collect()
    }

    /// Choices for a contact picker, starting with an explicit "None".
    pub fn contact_options(&self) -> Vec<(Option<RecordId>, String)> {
        std::iter::once((None, "None".to_string()))
            .chain(
                self.contacts
                    .records()
                    .iter()
                    .map(|c| (Some(c.id), c.name.clone())),
            )
            .collect()
    }

    // Project workflow

    /// Flips Pending/Completed and returns the new status.
    pub fn toggle_project_status(&mut self, project_id: RecordId) -> Option<Status> {
        let status = self.projects.get(project_id)?.status.toggled();
        self.projects.update(
            project_id,
            ProjectPatch {
                status: Some(status),
                ..Default::default()
            },
        );
        Some(status)
    }

    /// Appends a pending task. `Ok(None)` when the project does not exist.
    pub fn add_task(&mut self, project_id: RecordId, name: &str) -> crate::Result<Option<RecordId>> {
        require("name", name)?;
        let Some(project) = self.projects.get(project_id) else {
            return Ok(None);
        };
        let mut tasks = project.tasks.clone();
        let id = self.projects.next_id();
        tasks.push(Task {
            id,
            name: name.trim().to_string(),
            status: Status::Pending,
        });
        self.replace_tasks(project_id, tasks);
        Ok(Some(id))
    }

    pub fn set_task_status(&mut self, project_id: RecordId, task_id: RecordId, status: Status) -> bool {
        let Some(project) = self.projects.get(project_id) else {
            return false;
        };
        if project.task(task_id).is_none() {
            return false;
        }
        let tasks = project
            .tasks
            .iter()
            .cloned()
            .map(|mut t| {
                if t.id == task_id {
                    t.status = status;
                }
                t
            })
            .collect();
        self.replace_tasks(project_id, tasks)
    }

    pub fn remove_task(&mut self, project_id: RecordId, task_id: RecordId) -> bool {
        let Some(project) = self.projects.get(project_id) else {
            return false;
        };
        let tasks: Vec<Task> = project.tasks.iter().filter(|t| t.id != task_id).cloned().collect();
        if tasks.len() == project.tasks.len() {
            return false;
        }
        self.replace_tasks(project_id, tasks)
    }

    /// Appends a reminder. `None` when the project does not exist.
    pub fn add_reminder(&mut self, project_id: RecordId, date: &str, message: &str) -> Option<RecordId> {
        let project = self.projects.get(project_id)?;
        let mut reminders = project.reminders.clone();
        let id = self.projects.next_id();
        reminders.push(Reminder {
            id,
            date: date.to_string(),
            message: message.to_string(),
        });
        self.replace_reminders(project_id, reminders);
        Some(id)
    }

    pub fn remove_reminder(&mut self, project_id: RecordId, reminder_id: RecordId) -> bool {
        let Some(project) = self.projects.get(project_id) else {
            return false;
        };
        let reminders: Vec<Reminder> = project
            .reminders
            .iter()
            .filter(|r| r.id != reminder_id)
            .cloned()
            .collect();
        if reminders.len() == project.reminders.len() {
            return false;
        }
        self.replace_reminders(project_id, reminders)
    }

    fn replace_tasks(&mut self, project_id: RecordId, tasks: Vec<Task>) -> bool {
        self.projects.update(
            project_id,
            ProjectPatch {
                tasks: Some(tasks),
                ..Default::default()
            },
        )
    }

    fn replace_reminders(&mut self, project_id: RecordId, reminders: Vec<Reminder>) -> bool {
        self.projects.update(
            project_id,
            ProjectPatch {
                reminders: Some(reminders),
                ..Default::default()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProductivityError;

    fn workspace() -> Workspace {
        Workspace::open(&KeyValueStore::in_memory()).with_sequential_ids(1001)
    }

    #[test]
    fn test_presence_checked_adds() {
        let mut ws = workspace();
        assert!(matches!(
            ws.add_email(NewEmail::new("", "body")),
            Err(ProductivityError::MissingField("title"))
        ));
        assert!(ws.emails.is_empty());
        assert!(ws.add_contact(NewContact::named("  ")).is_err());
        assert!(ws.contacts.is_empty());
        assert!(ws.add_note(NewNote::new("t", "")).is_err());
        assert!(ws.add_project(NewProject::named("")).is_err());

        let id = ws.add_email(NewEmail::new("Hi", "Body")).unwrap();
        assert_eq!(ws.emails.get(id).unwrap().title, "Hi");
        assert!(ws
            .edit_email(
                id,
                EmailPatch {
                    title: Some(String::new()),
                    ..Default::default()
                }
            )
            .is_err());
        assert_eq!(ws.emails.get(id).unwrap().title, "Hi");
    }

    #[test]
    fn test_linked_contact_lookup() {
        let mut ws = workspace();
        let ana = ws.add_contact(NewContact::named("Ana")).unwrap();
        let note_id = ws.add_note(NewNote::new("Call", "About invoice").linked_to(ana)).unwrap();
        let unlinked = ws.add_note(NewNote::new("Solo", "Nothing")).unwrap();

        let note = ws.notes.get(note_id).unwrap();
        assert_eq!(ws.note_contact(note).map(|c| c.name.as_str()), Some("Ana"));
        assert!(ws.note_contact(ws.notes.get(unlinked).unwrap()).is_none());
        assert!(ws.linked_contact(Some(999)).is_none());
    }

    #[test]
    fn test_search_and_options() {
        let mut ws = workspace();
        ws.add_contact(NewContact::named("Ana Lopez")).unwrap();
        ws.add_contact(NewContact::named("Bob")).unwrap();
        ws.add_contact(NewContact::named("Anabel")).unwrap();

        let names: Vec<&str> = ws.search_contacts("ANA").iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ana Lopez", "Anabel"]);
        assert_eq!(ws.search_contacts("").len(), 3);

        let options = ws.contact_options();
        assert_eq!(options.len(), 4);
        assert_eq!(options[0], (None, "None".to_string()));
        assert_eq!(options[2], (Some(1002), "Bob".to_string()));
    }

    #[test]
    fn test_toggle_project_status() {
        let mut ws = workspace();
        let id = ws.add_project(NewProject::named("P")).unwrap();
        assert_eq!(ws.toggle_project_status(id), Some(Status::Completed));
        assert_eq!(ws.projects.get(id).unwrap().status, Status::Completed);
        assert_eq!(ws.toggle_project_status(id), Some(Status::Pending));
        assert_eq!(ws.toggle_project_status(42), None);
    }

    #[test]
    fn test_task_lifecycle() {
        let mut ws = workspace();
        let project = ws.add_project(NewProject::named("P")).unwrap();
        let first = ws.add_task(project, "Draft").unwrap().unwrap();
        let second = ws.add_task(project, " Review ").unwrap().unwrap();
        assert_ne!(first, second);
        assert!(ws.add_task(project, "").is_err());
        assert_eq!(ws.add_task(9999, "x").unwrap(), None);

        assert!(ws.set_task_status(project, first, Status::Completed));
        assert!(!ws.set_task_status(project, 12345, Status::Completed));

        let p = ws.projects.get(project).unwrap();
        assert_eq!(p.tasks.len(), 2);
        assert_eq!(p.tasks[0].status, Status::Completed);
        assert_eq!(p.tasks[1].name, "Review");
        assert_eq!(p.tasks[1].status, Status::Pending);

        assert!(ws.remove_task(project, first));
        assert!(!ws.remove_task(project, first));
        assert_eq!(ws.projects.get(project).unwrap().tasks.len(), 1);
    }

    #[test]
    fn test_reminder_lifecycle() {
        let mut ws = workspace();
        let project = ws.add_project(NewProject::named("P")).unwrap();
        let reminder = ws.add_reminder(project, "2024-07-01", "Renew").unwrap();
        assert_eq!(ws.projects.get(project).unwrap().reminders[0].message, "Renew");
        assert!(ws.add_reminder(4242, "2024-07-01", "x").is_none());
        assert!(ws.remove_reminder(project, reminder));
        assert!(ws.projects.get(project).unwrap().reminders.is_empty());
        assert!(!ws.remove_reminder(project, reminder));
    }
}
