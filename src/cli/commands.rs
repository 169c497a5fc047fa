use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use crate::model::path::TreePath;

#[derive(Parser)]
#[command(name = "ct", about = concat!("[x] checktree v", env!("CARGO_PKG_VERSION"), " - nested task checklists"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a checktree workspace in the current directory
    Init(InitArgs),
    /// List tasks with checklist progress
    List,
    /// Show a task and its checklist
    Show(TaskIdArg),
    /// Show checklist progress for a task
    Progress(TaskIdArg),
    /// Create a task
    New(NewArgs),
    /// Edit a task and its checklist, then save the whole tree at once
    Edit(EditArgs),
    /// Quick-add one subtask without an edit session
    Sub(SubArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct TaskIdArg {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct NewArgs {
    /// Task title
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Baixa, Média, Alta or Crítica (English names also accepted)
    #[arg(long)]
    pub priority: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Top-level checklist item (repeatable)
    #[arg(long = "item")]
    pub items: Vec<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    /// Checklist edits, applied in order: add:PATH:TITLE, rm:PATH,
    /// toggle:PATH, done:PATH, undone:PATH, rename:PATH:TITLE.
    /// PATH is dot-separated indices (0.2.1); use '.' for the top level.
    pub ops: Vec<String>,
    /// New task title
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
    /// Apply the edits and print the result without saving
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct SubArgs {
    /// Task ID
    pub id: String,
    /// Subtask title
    pub title: String,
    /// Stored ID of the parent subtask (default: top level)
    #[arg(long)]
    pub parent: Option<String>,
}

// ---------------------------------------------------------------------------
// Edit operations
// ---------------------------------------------------------------------------

/// One checklist edit from the `ct edit` command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Add { path: TreePath, title: String },
    Remove(TreePath),
    Toggle(TreePath),
    Done(TreePath),
    Undone(TreePath),
    Rename { path: TreePath, title: String },
}

impl FromStr for EditOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let verb = parts.next().unwrap_or("").trim();
        let path_str = parts
            .next()
            .ok_or_else(|| format!("edit '{}' is missing a path", s))?;
        let path: TreePath = path_str.parse().map_err(|e| format!("{}", e))?;
        let title = parts.next();

        let needs_title = |title: Option<&str>| {
            title
                .map(str::to_string)
                .ok_or_else(|| format!("edit '{}' is missing a title", s))
        };
        let no_title = |op: EditOp| match title {
            Some(_) => Err(format!("edit '{}' does not take a title", s)),
            None => Ok(op),
        };

        match verb {
            "add" => Ok(EditOp::Add {
                path,
                title: needs_title(title)?,
            }),
            "rename" => Ok(EditOp::Rename {
                path,
                title: needs_title(title)?,
            }),
            "rm" => no_title(EditOp::Remove(path)),
            "toggle" => no_title(EditOp::Toggle(path)),
            "done" => no_title(EditOp::Done(path)),
            "undone" => no_title(EditOp::Undone(path)),
            _ => Err(format!(
                "unknown edit '{}' (expected add, rm, toggle, done, undone, rename)",
                verb
            )),
        }
    }
}
