use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use productivity_manager::{
    record::blank_to_none, Config, ContactPatch, EmailPatch, NewContact, NewEmail, NewNote,
    NewProject, NotePatch, ProductivityError, ProjectPatch, RecordId, Status, Workspace,
};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "productivity")]
#[command(about = "Email templates, contacts, projects and notes, kept on your machine.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the data files (overrides PRODUCTIVITY_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log verbosity: -v for info, -vv for debug
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage email templates
    Email {
        #[command(subcommand)]
        action: EmailCommand,
    },
    /// Manage contacts
    Contact {
        #[command(subcommand)]
        action: ContactCommand,
    },
    /// Manage projects, their tasks and reminders
    Project {
        #[command(subcommand)]
        action: ProjectCommand,
    },
    /// Manage notes
    Note {
        #[command(subcommand)]
        action: NoteCommand,
    },
    /// Export everything to a JSON file
    Export {
        /// Output path (defaults to ./productivity-data.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a JSON file, replacing the collections it contains
    Import {
        /// File to import
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum EmailCommand {
    /// Add an email template
    Add {
        #[arg(short, long)]
        title: String,
        #[arg(short = 'b', long)]
        template: String,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List email templates
    List,
    /// Show one template
    Show { id: RecordId },
    /// Print only the template body
    Copy { id: RecordId },
    /// Edit a template; pass an empty category to clear it
    Edit {
        id: RecordId,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short = 'b', long)]
        template: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Delete a template
    Delete {
        id: RecordId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ContactCommand {
    /// Add a contact
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        phone: Option<String>,
        #[arg(short, long)]
        address: Option<String>,
    },
    /// List contacts, optionally filtered by name
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one contact
    Show { id: RecordId },
    /// Edit a contact; pass an empty value to clear an optional field
    Edit {
        id: RecordId,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        phone: Option<String>,
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Delete a contact. Projects and notes linked to it keep the stale id.
    Delete {
        id: RecordId,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    Completed,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => Status::Pending,
            StatusArg::Completed => Status::Completed,
        }
    }
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Add a project
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        start_date: Option<String>,
        /// Linked contact id
        #[arg(short, long)]
        contact: Option<RecordId>,
    },
    /// List projects
    List,
    /// Show a project with its tasks and reminders
    Show { id: RecordId },
    /// Edit a project
    Edit {
        id: RecordId,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        start_date: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(short, long, conflicts_with = "no_contact")]
        contact: Option<RecordId>,
        /// Remove the contact link
        #[arg(long)]
        no_contact: bool,
    },
    /// Mark complete, or reopen a completed project
    Toggle { id: RecordId },
    /// Delete a project
    Delete {
        id: RecordId,
        #[arg(short, long)]
        yes: bool,
    },
    /// Manage a project's tasks
    Task {
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// Manage a project's reminders
    Reminder {
        #[command(subcommand)]
        action: ReminderCommand,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    Add { project: RecordId, name: String },
    Done { project: RecordId, task: RecordId },
    Reopen { project: RecordId, task: RecordId },
    Remove { project: RecordId, task: RecordId },
}

#[derive(Subcommand)]
enum ReminderCommand {
    Add {
        project: RecordId,
        #[arg(short, long)]
        date: String,
        #[arg(short, long)]
        message: String,
    },
    Remove { project: RecordId, reminder: RecordId },
}

#[derive(Subcommand)]
enum NoteCommand {
    /// Add a note
    Add {
        #[arg(short, long)]
        title: String,
        #[arg(short = 'b', long)]
        content: String,
        #[arg(short, long)]
        contact: Option<RecordId>,
    },
    /// List notes with a short preview
    List,
    /// Show one note
    Show { id: RecordId },
    /// Print only the note content
    Copy { id: RecordId },
    /// Edit a note
    Edit {
        id: RecordId,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short = 'b', long)]
        content: Option<String>,
        #[arg(short, long, conflicts_with = "no_contact")]
        contact: Option<RecordId>,
        #[arg(long)]
        no_contact: bool,
    },
    /// Delete a note
    Delete {
        id: RecordId,
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::resolve(cli.data_dir.clone()).context("Failed to resolve data directory")?;
    info!("📂 Using data directory {}", config.data_dir().display());

    let store = config.open_store();
    let mut workspace = Workspace::open(&store);

    match cli.command {
        Commands::Email { action } => email_command(&mut workspace, action)?,
        Commands::Contact { action } => contact_command(&mut workspace, action)?,
        Commands::Project { action } => project_command(&mut workspace, action)?,
        Commands::Note { action } => note_command(&mut workspace, action)?,
        Commands::Export { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(&config.export_file_name));
            export_data(&workspace, path).await?;
        }
        Commands::Import { path } => import_data(&mut workspace, path).await?,
    }

    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn confirm_delete(label: &str, yes: bool) -> anyhow::Result<bool> {
    if yes {
        return Ok(true);
    }
    print!("Are you sure you want to delete \"{}\"? [y/N] ", label);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn not_found(kind: &str, id: RecordId) {
    println!("❔ {} {} not found", kind, id);
}

/// Optional edit flag: absent leaves the field, blank clears it.
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| blank_to_none(Some(v)))
}

fn contact_link(contact: Option<RecordId>, no_contact: bool) -> Option<Option<RecordId>> {
    if no_contact {
        Some(None)
    } else {
        contact.map(Some)
    }
}

fn warn_if_unknown_contact(workspace: &Workspace, contact: Option<RecordId>) {
    if let Some(id) = contact {
        if workspace.contacts.get(id).is_none() {
            warn!("Linking to unknown contact {}", id);
            println!("⚠️  No contact with ID {}; the link will show as 'No contact'.", id);
        }
    }
}

fn email_command(workspace: &mut Workspace, action: EmailCommand) -> anyhow::Result<()> {
    match action {
        EmailCommand::Add { title, template, category } => {
            let draft = NewEmail {
                title: title.trim().to_string(),
                category: blank_to_none(category),
                template: template.trim().to_string(),
            };
            let id = workspace.add_email(draft)?;
            println!("✅ Added email template {}", id);
        }
        EmailCommand::List => {
            println!("📧 Email templates:");
            println!("{}", "─".repeat(50));
            for email in workspace.emails.records() {
                println!("[{}] {}", email.id, email.label());
            }
        }
        EmailCommand::Show { id } => match workspace.emails.get(id) {
            Some(email) => {
                println!("{}", email.title);
                if let Some(category) = email.category.as_deref().filter(|c| !c.is_empty()) {
                    println!("Category: {}", category);
                }
                println!("{}", "─".repeat(50));
                println!("{}", email.template);
            }
            None => not_found("Email", id),
        },
        EmailCommand::Copy { id } => match workspace.emails.get(id) {
            Some(email) => println!("{}", email.template),
            None => not_found("Email", id),
        },
        EmailCommand::Edit { id, title, template, category } => {
            let patch = EmailPatch {
                title: title.map(|t| t.trim().to_string()),
                category: clearable(category),
                template: template.map(|t| t.trim().to_string()),
            };
            if workspace.edit_email(id, patch)? {
                println!("✅ Updated email template {}", id);
            } else {
                not_found("Email", id);
            }
        }
        EmailCommand::Delete { id, yes } => {
            let Some(email) = workspace.emails.get(id) else {
                not_found("Email", id);
                return Ok(());
            };
            if confirm_delete(&email.title, yes)? {
                workspace.emails.delete(id);
                println!("🗑️  Deleted email template {}", id);
            }
        }
    }
    Ok(())
}

fn contact_command(workspace: &mut Workspace, action: ContactCommand) -> anyhow::Result<()> {
    match action {
        ContactCommand::Add { name, email, phone, address } => {
            let draft = NewContact {
                name: name.trim().to_string(),
                email: blank_to_none(email),
                phone: blank_to_none(phone),
                address: blank_to_none(address),
            };
            let id = workspace.add_contact(draft)?;
            println!("✅ Added contact {}", id);
        }
        ContactCommand::List { search } => {
            println!("👥 Contacts:");
            println!("{}", "─".repeat(50));
            for contact in workspace.search_contacts(search.as_deref().unwrap_or("")) {
                println!(
                    "[{}] {} | {} | {}",
                    contact.id,
                    contact.name,
                    contact.formatted_phone(),
                    contact.email.as_deref().filter(|e| !e.is_empty()).unwrap_or("No email")
                );
            }
        }
        ContactCommand::Show { id } => match workspace.contacts.get(id) {
            Some(contact) => println!("{}", contact.card()),
            None => not_found("Contact", id),
        },
        ContactCommand::Edit { id, name, email, phone, address } => {
            let patch = ContactPatch {
                name: name.map(|n| n.trim().to_string()),
                email: clearable(email),
                phone: clearable(phone),
                address: clearable(address),
            };
            if workspace.edit_contact(id, patch)? {
                println!("✅ Updated contact {}", id);
            } else {
                not_found("Contact", id);
            }
        }
        ContactCommand::Delete { id, yes } => {
            let Some(contact) = workspace.contacts.get(id) else {
                not_found("Contact", id);
                return Ok(());
            };
            if confirm_delete(&contact.name, yes)? {
                workspace.contacts.delete(id);
                println!("🗑️  Deleted contact {}", id);
            }
        }
    }
    Ok(())
}

fn project_command(workspace: &mut Workspace, action: ProjectCommand) -> anyhow::Result<()> {
    match action {
        ProjectCommand::Add { name, description, start_date, contact } => {
            warn_if_unknown_contact(workspace, contact);
            let draft = NewProject {
                name: name.trim().to_string(),
                description: blank_to_none(description),
                start_date: blank_to_none(start_date),
                contact_id: contact,
            };
            let id = workspace.add_project(draft)?;
            println!("✅ Added project {}", id);
        }
        ProjectCommand::List => {
            println!("📁 Projects:");
            println!("{}", "─".repeat(50));
            for project in workspace.projects.records() {
                match workspace.project_contact(project) {
                    Some(contact) => println!("[{}] {} {}", project.id, project.summary_line(), contact.link_label()),
                    None => println!("[{}] {}", project.id, project.summary_line()),
                }
            }
        }
        ProjectCommand::Show { id } => match workspace.projects.get(id) {
            Some(project) => println!("{}", project.detail(workspace.project_contact(project))),
            None => not_found("Project", id),
        },
        ProjectCommand::Edit {
            id,
            name,
            description,
            start_date,
            status,
            contact,
            no_contact,
        } => {
            warn_if_unknown_contact(workspace, contact);
            let patch = ProjectPatch {
                name: name.map(|n| n.trim().to_string()),
                description: clearable(description),
                start_date: clearable(start_date),
                status: status.map(Status::from),
                contact_id: contact_link(contact, no_contact),
                ..Default::default()
            };
            if workspace.edit_project(id, patch)? {
                println!("✅ Updated project {}", id);
            } else {
                not_found("Project", id);
            }
        }
        ProjectCommand::Toggle { id } => match workspace.toggle_project_status(id) {
            Some(status) => println!("✅ Project {} is now {}", id, status),
            None => not_found("Project", id),
        },
        ProjectCommand::Delete { id, yes } => {
            let Some(project) = workspace.projects.get(id) else {
                not_found("Project", id);
                return Ok(());
            };
            if confirm_delete(&project.name, yes)? {
                workspace.projects.delete(id);
                println!("🗑️  Deleted project {}", id);
            }
        }
        ProjectCommand::Task { action } => task_command(workspace, action)?,
        ProjectCommand::Reminder { action } => reminder_command(workspace, action),
    }
    Ok(())
}

fn task_command(workspace: &mut Workspace, action: TaskCommand) -> anyhow::Result<()> {
    let (changed, project, task) = match action {
        TaskCommand::Add { project, name } => {
            match workspace.add_task(project, &name)? {
                Some(task) => println!("✅ Added task {} to project {}", task, project),
                None => not_found("Project", project),
            }
            return Ok(());
        }
        TaskCommand::Done { project, task } => (
            workspace.set_task_status(project, task, Status::Completed),
            project,
            task,
        ),
        TaskCommand::Reopen { project, task } => (
            workspace.set_task_status(project, task, Status::Pending),
            project,
            task,
        ),
        TaskCommand::Remove { project, task } => (workspace.remove_task(project, task), project, task),
    };

    if changed {
        println!("✅ Updated task {} in project {}", task, project);
    } else {
        println!("❔ Task {} not found in project {}", task, project);
    }
    Ok(())
}

fn reminder_command(workspace: &mut Workspace, action: ReminderCommand) {
    match action {
        ReminderCommand::Add { project, date, message } => {
            match workspace.add_reminder(project, date.trim(), message.trim()) {
                Some(reminder) => println!("⏰ Added reminder {} to project {}", reminder, project),
                None => not_found("Project", project),
            }
        }
        ReminderCommand::Remove { project, reminder } => {
            if workspace.remove_reminder(project, reminder) {
                println!("🗑️  Removed reminder {} from project {}", reminder, project);
            } else {
                println!("❔ Reminder {} not found in project {}", reminder, project);
            }
        }
    }
}

fn note_command(workspace: &mut Workspace, action: NoteCommand) -> anyhow::Result<()> {
    match action {
        NoteCommand::Add { title, content, contact } => {
            warn_if_unknown_contact(workspace, contact);
            let draft = NewNote {
                title: title.trim().to_string(),
                content: content.trim().to_string(),
                contact_id: contact,
            };
            let id = workspace.add_note(draft)?;
            println!("✅ Added note {}", id);
        }
        NoteCommand::List => {
            println!("📝 Notes:");
            println!("{}", "─".repeat(50));
            for note in workspace.notes.records() {
                match workspace.note_contact(note) {
                    Some(contact) => println!("[{}] {} {}", note.id, note.summary_line(), contact.link_label()),
                    None => println!("[{}] {}", note.id, note.summary_line()),
                }
            }
        }
        NoteCommand::Show { id } => match workspace.notes.get(id) {
            Some(note) => {
                println!("{}", note.title);
                println!("{}", "─".repeat(50));
                println!("{}", note.content);
                match workspace.note_contact(note) {
                    Some(contact) => println!("Contact: {}", contact.name),
                    None => println!("No contact"),
                }
            }
            None => not_found("Note", id),
        },
        NoteCommand::Copy { id } => match workspace.notes.get(id) {
            Some(note) => println!("{}", note.content),
            None => not_found("Note", id),
        },
        NoteCommand::Edit {
            id,
            title,
            content,
            contact,
            no_contact,
        } => {
            warn_if_unknown_contact(workspace, contact);
            let patch = NotePatch {
                title: title.map(|t| t.trim().to_string()),
                content: content.map(|c| c.trim().to_string()),
                contact_id: contact_link(contact, no_contact),
            };
            if workspace.edit_note(id, patch)? {
                println!("✅ Updated note {}", id);
            } else {
                not_found("Note", id);
            }
        }
        NoteCommand::Delete { id, yes } => {
            let Some(note) = workspace.notes.get(id) else {
                not_found("Note", id);
                return Ok(());
            };
            if confirm_delete(&note.title, yes)? {
                workspace.notes.delete(id);
                println!("🗑️  Deleted note {}", id);
            }
        }
    }
    Ok(())
}

async fn export_data(workspace: &Workspace, path: PathBuf) -> anyhow::Result<()> {
    info!("📦 Exporting data to {}", path.display());
    workspace
        .export_to_path(&path)
        .await
        .with_context(|| format!("Failed to export data to {}", path.display()))?;
    println!("✅ Data exported successfully to {}", path.display());
    Ok(())
}

async fn import_data(workspace: &mut Workspace, path: PathBuf) -> anyhow::Result<()> {
    info!("📥 Importing data from {}", path.display());
    match workspace.import_from_path(&path).await {
        Ok(summary) => {
            for (key, count) in summary.replaced() {
                println!("✅ Replaced {} with {} record(s)", key, count);
            }
            for (key, reason) in &summary.skipped {
                println!("⚠️  Skipped {}: {}", key, reason);
            }
            if summary.is_empty() && summary.skipped.is_empty() {
                println!("ℹ️  Nothing to import in {}", path.display());
            }
            Ok(())
        }
        Err(e @ ProductivityError::ImportParse(_)) => {
            Err(anyhow::Error::new(e).context("Invalid JSON file. Please try again."))
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("Failed to read {}", path.display()))),
    }
}
