use crate::controller::{CounterDraft, ViewController};
use crate::errors::{MutationOutcome, Rejection};
use crate::filter::CategoryFilter;
use crate::gateway::RemoteGateway;
use crate::models::LocalId;
use crate::storage::KeyValueStore;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditField {
    Name,
    Max,
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Quit,
    Login { identifier: String, password: String },
    Register { username: String, email: String, password: String },
    Logout,
    Add(CounterDraft),
    Adjust { row: usize, delta: i64 },
    Edit(usize),
    Set(EditField, String),
    Save,
    Cancel,
    Remove(usize),
    Menu(usize),
    Filter(CategoryFilter),
}

impl Command {
    /// Commands whose remote phase may run in the background.
    pub fn is_background(&self) -> bool {
        matches!(
            self,
            Command::Adjust { .. } | Command::Save | Command::Remove(_)
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("no row {0} on the board")]
    NoSuchRow(usize),
}

pub const HELP: &str = "\
commands:
  login <email> <password>          register <username> <email> <password>
  logout                            list
  add <name>[|<max>[|<category>]]   filter <category|all>
  inc <row>  dec <row>              rm <row>
  edit <row>  set name|max|category <value>  save  cancel
  menu <row>                        quit
";

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match verb.to_ascii_lowercase().as_str() {
        "" | "list" | "ls" => Ok(Command::List),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "logout" => Ok(Command::Logout),
        "save" => Ok(Command::Save),
        "cancel" => Ok(Command::Cancel),
        "login" => match args.as_slice() {
            [identifier, password] => Ok(Command::Login {
                identifier: identifier.to_string(),
                password: password.to_string(),
            }),
            _ => Err(CommandError::Usage("login <email> <password>")),
        },
        "register" => match args.as_slice() {
            [username, email, password] => Ok(Command::Register {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            }),
            _ => Err(CommandError::Usage("register <username> <email> <password>")),
        },
        "add" => {
            let mut parts = rest.splitn(3, '|').map(str::trim);
            let draft = CounterDraft {
                name: parts.next().unwrap_or_default().to_string(),
                max: parts.next().unwrap_or_default().to_string(),
                category: parts.next().unwrap_or_default().to_string(),
            };
            Ok(Command::Add(draft))
        }
        "inc" | "+" => Ok(Command::Adjust {
            row: row_arg(&args, "inc <row>")?,
            delta: 1,
        }),
        "dec" | "-" => Ok(Command::Adjust {
            row: row_arg(&args, "dec <row>")?,
            delta: -1,
        }),
        "edit" => Ok(Command::Edit(row_arg(&args, "edit <row>")?)),
        "rm" | "delete" => Ok(Command::Remove(row_arg(&args, "rm <row>")?)),
        "menu" => Ok(Command::Menu(row_arg(&args, "menu <row>")?)),
        "filter" => Ok(Command::Filter(CategoryFilter::parse(rest))),
        "set" => {
            const USAGE: &str = "set name|max|category <value>";
            let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let field = match field {
                "name" => EditField::Name,
                "max" => EditField::Max,
                "category" => EditField::Category,
                _ => return Err(CommandError::Usage(USAGE)),
            };
            Ok(Command::Set(field, value.trim().to_string()))
        }
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn row_arg(args: &[&str], usage: &'static str) -> Result<usize, CommandError> {
    match args {
        [row] => row
            .parse::<usize>()
            .ok()
            .filter(|row| *row >= 1)
            .ok_or(CommandError::Usage(usage)),
        _ => Err(CommandError::Usage(usage)),
    }
}

/// Maps a 1-based row on the current board to its counter.
pub fn resolve_row<S: KeyValueStore, G: RemoteGateway>(
    view: &ViewController<S, G>,
    row: usize,
) -> Result<LocalId, CommandError> {
    view.visible_counters()
        .get(row.wrapping_sub(1))
        .map(|counter| counter.local_id)
        .ok_or(CommandError::NoSuchRow(row))
}

/// Runs one command to completion and returns a message for the prompt, if any.
pub async fn handle<S: KeyValueStore, G: RemoteGateway>(
    view: Arc<ViewController<S, G>>,
    command: Command,
) -> Result<Option<String>, CommandError> {
    let message = match command {
        Command::Help => Some(HELP.to_string()),
        Command::List | Command::Quit => None,
        Command::Login {
            identifier,
            password,
        } => {
            view.login(&identifier, &password).await;
            None
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            view.register(&username, &email, &password).await;
            None
        }
        Command::Logout => {
            view.logout().await;
            Some("signed out".to_string())
        }
        Command::Add(draft) => {
            view.set_draft(draft);
            describe(view.add_counter().await)
        }
        Command::Adjust { row, delta } => {
            let id = resolve_row(&view, row)?;
            describe(view.adjust(id, delta).await)
        }
        Command::Edit(row) => {
            let id = resolve_row(&view, row)?;
            view.start_edit(id);
            None
        }
        Command::Set(field, value) => {
            let open = match field {
                EditField::Name => view.set_edit_name(&value),
                EditField::Max => view.set_edit_max(&value),
                EditField::Category => view.set_edit_category(&value),
            };
            (!open).then(|| "nothing is being edited".to_string())
        }
        Command::Save => describe(view.save_edit().await),
        Command::Cancel => {
            view.cancel_edit();
            None
        }
        Command::Remove(row) => {
            let id = resolve_row(&view, row)?;
            describe(view.delete(id).await)
        }
        Command::Menu(row) => {
            let id = resolve_row(&view, row)?;
            view.toggle_menu(id);
            None
        }
        Command::Filter(selection) => {
            view.select_category(selection);
            None
        }
    };
    Ok(message)
}

/// Only local rejections are reported; rollbacks stay silent.
fn describe(outcome: MutationOutcome) -> Option<String> {
    match outcome {
        MutationOutcome::Rejected(Rejection::AtBound) => None,
        MutationOutcome::Rejected(rejection) => Some(rejection.to_string()),
        _ => None,
    }
}
