pub mod collection;
pub mod config;
pub mod contact;
pub mod email;
pub mod error;
pub mod note;
pub mod project;
pub mod record;
pub mod storage;
pub mod transfer;
pub mod workspace;

pub use collection::Collection;
pub use config::Config;
pub use contact::{format_phone_number, Contact, ContactPatch, NewContact};
pub use email::{Email, EmailPatch, NewEmail};
pub use error::ProductivityError;
pub use note::{NewNote, Note, NotePatch};
pub use project::{NewProject, Project, ProjectPatch, Reminder, Status, Task};
pub use record::{IdSource, Record, RecordId, SequentialIds, TimestampIds};
pub use storage::{FileBackend, KeyValueStore, MemoryBackend, Notifier, StorageBackend};
pub use transfer::{ExportDocument, ImportSummary, EXPORT_FILE_NAME, EXPORT_MIME_TYPE};
pub use workspace::Workspace;

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, ProductivityError>;
