mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::codec::tree_codec::decode_payload;
use crate::io::config_io;
use crate::io::store::{JsonFileStore, TaskStore};
use crate::logging;
use crate::model::path::TreePath;
use crate::model::task::{Priority, TaskMeta};
use crate::ops::progress;
use crate::ops::session::EditSession;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let start = start_dir(cli.dir.as_deref())?;
    match cli.command {
        // Init runs before there is a workspace to discover
        Commands::Init(args) => {
            logging::init(cli.verbose, None);
            cmd_init(args, &start)
        }
        command => run_in_workspace(command, &start, cli.json, cli.verbose),
    }
}

fn run_in_workspace(command: Commands, start: &Path, json: bool, verbose: u8) -> CmdResult {
    let workspace = config_io::discover_workspace(start)?;
    let config = config_io::read_config(&workspace)?;
    logging::init(verbose, Some(&config.log.filter));
    debug!(workspace = %workspace.display(), "loaded workspace");

    let mut store = JsonFileStore::open(&workspace, &config.store);

    match command {
        Commands::Init(_) => unreachable!("init is dispatched before workspace discovery"),
        Commands::List => cmd_list(&store, json),
        Commands::Show(args) => cmd_show(&store, args, json),
        Commands::Progress(args) => cmd_progress(&store, args, json),
        Commands::New(args) => cmd_new(&mut store, args, json),
        Commands::Edit(args) => cmd_edit(&mut store, args, json),
        Commands::Sub(args) => cmd_sub(&mut store, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_dir(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_label(s).ok_or_else(|| {
        format!(
            "invalid priority '{}' (expected Baixa, Média, Alta or Crítica)",
            s
        )
    })
}

fn parse_due(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid due date '{}' (expected YYYY-MM-DD)", s))
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

/// Apply one checklist edit to the session
fn apply_op(session: &mut EditSession, op: &EditOp) -> Result<(), Box<dyn std::error::Error>> {
    match op {
        EditOp::Add { path, title } => {
            if session.add_child(path, title)?.is_none() {
                warn!(%path, "ignored add with a blank title");
            }
        }
        EditOp::Remove(path) => {
            let removed = session.remove_at(path)?;
            debug!(%path, removed, "removed subtree");
        }
        EditOp::Toggle(path) => {
            session.toggle_completed(path)?;
        }
        EditOp::Done(path) => session.set_completed(path, true)?,
        EditOp::Undone(path) => session.set_completed(path, false)?,
        EditOp::Rename { path, title } => session.rename(path, title)?,
    }
    Ok(())
}

fn apply_meta(
    meta: &mut TaskMeta,
    title: Option<String>,
    description: Option<String>,
    priority: Option<&str>,
    due: Option<&str>,
) -> Result<(), String> {
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err("task title must not be blank".to_string());
        }
        meta.title = title.trim().to_string();
    }
    if let Some(description) = description {
        meta.description = description;
    }
    if let Some(priority) = priority {
        meta.priority = parse_priority(priority)?;
    }
    if let Some(due) = due {
        meta.due = Some(parse_due(due)?);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(store: &JsonFileStore, json: bool) -> CmdResult {
    let tasks = store.list_tasks()?;
    if json {
        let out: Vec<TaskSummaryJson> = tasks.iter().map(summary_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("no tasks");
    }
    for task in &tasks {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

fn cmd_show(store: &JsonFileStore, args: TaskIdArg, json: bool) -> CmdResult {
    let task = store.get_task(&args.id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stored_to_json(&task))?);
    } else {
        let (meta, tree) = decode_payload(&task.payload);
        print_lines(&format_task_detail(Some(&task.id), &meta, &tree));
    }
    Ok(())
}

fn cmd_progress(store: &JsonFileStore, args: TaskIdArg, json: bool) -> CmdResult {
    let task = store.get_task(&args.id)?;
    let (_, tree) = decode_payload(&task.payload);
    let p = progress::aggregate(&tree);
    if json {
        println!("{}", serde_json::to_string_pretty(&p)?);
    } else {
        println!("{}", format_progress(&p));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_new(store: &mut JsonFileStore, args: NewArgs, json: bool) -> CmdResult {
    if args.title.trim().is_empty() {
        return Err("task title must not be blank".into());
    }
    let mut session = EditSession::new_task(args.title.trim());
    apply_meta(
        &mut session.meta,
        None,
        args.description,
        args.priority.as_deref(),
        args.due.as_deref(),
    )?;
    for item in &args.items {
        if session.add_child(&TreePath::root(), item)?.is_none() {
            warn!("ignored blank --item");
        }
    }

    let stored = session.save(store)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stored_to_json(&stored))?);
    } else {
        println!("{}", stored.id);
    }
    Ok(())
}

fn cmd_edit(store: &mut JsonFileStore, args: EditArgs, json: bool) -> CmdResult {
    // Parse every edit up front so a typo doesn't leave a half-applied session
    let ops = args
        .ops
        .iter()
        .map(|s| s.parse::<EditOp>())
        .collect::<Result<Vec<_>, _>>()?;

    let task = store.get_task(&args.id)?;
    let mut session = EditSession::open(&task);
    apply_meta(
        &mut session.meta,
        args.title,
        args.description,
        args.priority.as_deref(),
        args.due.as_deref(),
    )?;
    if args.clear_due {
        session.meta.due = None;
    }
    for op in &ops {
        apply_op(&mut session, op)?;
    }

    if args.dry_run {
        if json {
            let out = task_to_json(Some(&args.id), &session.meta, session.tree());
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            print_lines(&format_task_detail(
                Some(&args.id),
                &session.meta,
                session.tree(),
            ));
        }
        session.discard();
        return Ok(());
    }

    let saved = session.save(store)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stored_to_json(&saved))?);
    } else {
        println!(
            "saved {} {}",
            saved.id,
            format_progress(&session.progress())
        );
    }
    Ok(())
}

fn cmd_sub(store: &mut JsonFileStore, args: SubArgs, json: bool) -> CmdResult {
    let updated = store.add_subtask(&args.id, &args.title, args.parent.as_deref())?;

    // The new node is the last child of its parent
    let (_, tree) = decode_payload(&updated.payload);
    let parent = match args.parent.as_deref() {
        Some(sub_id) => tree.find_remote(sub_id),
        None => None,
    };
    let new_node = tree
        .children_of(parent)
        .last()
        .and_then(|&id| tree.node(id))
        .ok_or("subtask was not stored")?;
    let new_id = new_node.remote_id().unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&stored_to_json(&updated))?);
    } else {
        println!("{}", new_id);
    }
    Ok(())
}
