use serde::Serialize;

use crate::codec::tree_codec::decode_payload;
use crate::codec::wire::StoredTask;
use crate::model::node::{NodeId, Tree};
use crate::model::task::TaskMeta;
use crate::ops::progress::{self, Progress};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct NodeJson {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeJson>,
}

#[derive(Serialize)]
pub struct TaskJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    pub progress: Progress,
    pub checklist: Vec<NodeJson>,
}

#[derive(Serialize)]
pub struct TaskSummaryJson {
    pub id: String,
    pub title: String,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    pub progress: Progress,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// JSON view of a task being edited or read back. `id` is `None` for a
/// task that was never saved.
pub fn task_to_json(id: Option<&str>, meta: &TaskMeta, tree: &Tree) -> TaskJson {
    TaskJson {
        id: id.map(str::to_string),
        title: meta.title.clone(),
        description: meta.description.clone(),
        priority: meta.priority.label().to_string(),
        due: meta.due.map(|d| d.to_string()),
        progress: progress::aggregate(tree),
        checklist: tree_to_json(tree),
    }
}

pub fn stored_to_json(task: &StoredTask) -> TaskJson {
    let (meta, tree) = decode_payload(&task.payload);
    task_to_json(Some(&task.id), &meta, &tree)
}

pub fn summary_to_json(task: &StoredTask) -> TaskSummaryJson {
    let (meta, tree) = decode_payload(&task.payload);
    TaskSummaryJson {
        id: task.id.clone(),
        title: meta.title,
        priority: meta.priority.label().to_string(),
        due: meta.due.map(|d| d.to_string()),
        progress: progress::aggregate(&tree),
    }
}

pub fn tree_to_json(tree: &Tree) -> Vec<NodeJson> {
    tree.roots()
        .iter()
        .filter_map(|&id| node_to_json(tree, id))
        .collect()
}

fn node_to_json(tree: &Tree, id: NodeId) -> Option<NodeJson> {
    let node = tree.node(id)?;
    Some(NodeJson {
        path: tree.path_of(id)?.to_string(),
        id: node.remote_id().map(str::to_string),
        title: node.title().to_string(),
        completed: node.completed(),
        children: node
            .children()
            .iter()
            .filter_map(|&child| node_to_json(tree, child))
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// `1/2 (50%)`
pub fn format_progress(p: &Progress) -> String {
    format!("{}/{} ({}%)", p.completed, p.total, p.percent)
}

/// One checklist line: `[x] Milk (0.1)`, with a `[c/t]` badge on parents
pub fn format_node_line(tree: &Tree, id: NodeId) -> String {
    let Some(node) = tree.node(id) else {
        return String::new();
    };
    let check = if node.completed() { 'x' } else { ' ' };
    let path = tree.path_of(id).map(|p| p.to_string()).unwrap_or_default();
    let badge = if node.children().is_empty() {
        String::new()
    } else {
        let below = progress::aggregate_under(tree, id);
        format!(" [{}/{}]", below.completed, below.total)
    };
    format!("[{}] {} ({}){}", check, node.title(), path, badge)
}

/// The whole checklist, two spaces of indent per level
pub fn format_outline(tree: &Tree) -> Vec<String> {
    let mut lines = Vec::new();
    for &root in tree.roots() {
        push_outline(tree, root, 0, &mut lines);
    }
    lines
}

fn push_outline(tree: &Tree, id: NodeId, indent: usize, lines: &mut Vec<String>) {
    lines.push(format!("{}{}", "  ".repeat(indent), format_node_line(tree, id)));
    for &child in tree.children_of(Some(id)) {
        push_outline(tree, child, indent + 1, lines);
    }
}

pub fn format_task_detail(id: Option<&str>, meta: &TaskMeta, tree: &Tree) -> Vec<String> {
    let mut lines = Vec::new();
    match id {
        Some(id) => lines.push(format!("{} {}", id, meta.title)),
        None => lines.push(meta.title.clone()),
    }
    lines.push(format!("  priority: {}", meta.priority));
    if let Some(due) = meta.due {
        lines.push(format!("  due: {}", due));
    }
    if !meta.description.is_empty() {
        lines.push("  description:".to_string());
        for line in meta.description.lines() {
            lines.push(format!("    {}", line));
        }
    }
    lines.push(format!(
        "  progress: {}",
        format_progress(&progress::aggregate(tree))
    ));
    if !tree.is_empty() {
        lines.push(String::new());
        lines.extend(format_outline(tree));
    }
    lines
}

pub fn format_task_line(task: &StoredTask) -> String {
    let (_, tree) = decode_payload(&task.payload);
    format!(
        "{} {} [{}] {}",
        task.id,
        task.payload.title,
        task.payload.priority,
        format_progress(&progress::aggregate(&tree))
    )
}
