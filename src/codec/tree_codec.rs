use tracing::warn;

use crate::model::node::{MAX_NODE_DEPTH, NodeId, Tree};
use crate::model::task::TaskMeta;

use super::wire::{TaskNodeWire, TaskPayload};

/// Build an editable tree from the persisted checklist.
///
/// This is a full structural copy: every title and id is cloned into the
/// new arena, so edits to the result can never reach `wire`.
pub fn decode(wire: &[TaskNodeWire]) -> Tree {
    let depth = wire_depth(wire);
    if depth > MAX_NODE_DEPTH {
        warn!(
            depth,
            max = MAX_NODE_DEPTH,
            "persisted checklist is nested deeper than the editor allows"
        );
    }
    let mut tree = Tree::new();
    for node in wire {
        let id = tree.push_root(node.title.clone(), node.completed, node.id.clone());
        decode_children(&mut tree, id, &node.children);
    }
    tree
}

fn decode_children(tree: &mut Tree, parent: NodeId, wire: &[TaskNodeWire]) {
    for node in wire {
        if let Some(id) = tree.push_child(parent, node.title.clone(), node.completed, node.id.clone()) {
            decode_children(tree, id, &node.children);
        }
    }
}

fn wire_depth(wire: &[TaskNodeWire]) -> usize {
    wire.iter()
        .map(|n| 1 + wire_depth(&n.children))
        .max()
        .unwrap_or(0)
}

/// Produce the persisted form of `tree`. Nodes keep the ids they were
/// decoded with; nodes created during the edit go out without one.
pub fn encode(tree: &Tree) -> Vec<TaskNodeWire> {
    encode_children(tree, tree.roots())
}

fn encode_children(tree: &Tree, ids: &[NodeId]) -> Vec<TaskNodeWire> {
    ids.iter()
        .filter_map(|id| tree.node(*id))
        .map(|node| TaskNodeWire {
            id: node.remote_id().map(str::to_string),
            title: node.title().to_string(),
            completed: node.completed(),
            children: encode_children(tree, node.children()),
        })
        .collect()
}

/// Split a task payload into its editable metadata and checklist tree
pub fn decode_payload(payload: &TaskPayload) -> (TaskMeta, Tree) {
    let meta = TaskMeta {
        title: payload.title.clone(),
        description: payload.description.clone(),
        priority: payload.priority,
        due: payload.due,
    };
    (meta, decode(&payload.subtasks))
}

pub fn encode_payload(meta: &TaskMeta, tree: &Tree) -> TaskPayload {
    TaskPayload {
        title: meta.title.clone(),
        description: meta.description.clone(),
        priority: meta.priority,
        due: meta.due,
        subtasks: encode(tree),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::path::TreePath;
    use crate::model::task::Priority;
    use crate::ops::tree_ops::{add_child, remove_at, set_completed};
    use pretty_assertions::assert_eq;

    fn node(id: &str, title: &str, completed: bool, children: Vec<TaskNodeWire>) -> TaskNodeWire {
        TaskNodeWire {
            id: Some(id.to_string()),
            title: title.to_string(),
            completed,
            children,
        }
    }

    fn sample_wire() -> Vec<TaskNodeWire> {
        vec![
            node(
                "n1",
                "Buy groceries",
                false,
                vec![
                    node("n2", "Milk", true, vec![]),
                    node("n3", "Eggs", false, vec![node("n4", "Brown", false, vec![])]),
                ],
            ),
            node("n5", "Chores", true, vec![]),
        ]
    }

    #[test]
    fn test_decode_shape() {
        let tree = decode(&sample_wire());
        assert_eq!(tree.len(), 5);
        let groceries = tree.node(tree.roots()[0]).unwrap();
        assert_eq!(groceries.title(), "Buy groceries");
        assert_eq!(groceries.remote_id(), Some("n1"));
        assert_eq!(groceries.children().len(), 2);
        let chores = tree.node(tree.roots()[1]).unwrap();
        assert!(chores.completed());
    }

    #[test]
    fn test_round_trip_is_identity() {
        let wire = sample_wire();
        assert_eq!(encode(&decode(&wire)), wire);
        assert_eq!(encode(&decode(&[])), Vec::<TaskNodeWire>::new());
    }

    #[test]
    fn test_edits_do_not_reach_original() {
        let wire = sample_wire();
        let snapshot = wire.clone();
        let mut tree = decode(&wire);

        set_completed(&mut tree, &TreePath::from(vec![0]), true).unwrap();
        remove_at(&mut tree, &TreePath::from(vec![1])).unwrap();
        add_child(&mut tree, &TreePath::from(vec![0, 1]), "White").unwrap();

        assert_eq!(wire, snapshot);
    }

    #[test]
    fn test_new_nodes_encode_without_id() {
        let mut tree = decode(&sample_wire());
        add_child(&mut tree, &TreePath::from(vec![0]), "Bread").unwrap();
        let encoded = encode(&tree);
        let bread = &encoded[0].children[2];
        assert_eq!(bread, &TaskNodeWire::leaf("Bread"));
        assert_eq!(encoded[0].children[0].id.as_deref(), Some("n2"));
    }

    #[test]
    fn test_decode_accepts_overdeep_trees() {
        let mut deep = TaskNodeWire::leaf("level 6");
        for level in (1..=5).rev() {
            deep = TaskNodeWire {
                id: None,
                title: format!("level {}", level),
                completed: false,
                children: vec![deep],
            };
        }
        let wire = vec![deep];
        assert_eq!(wire_depth(&wire), 6);
        assert_eq!(encode(&decode(&wire)), wire);
    }

    #[test]
    fn test_payload_round_trip() {
        let payload = TaskPayload {
            title: "Weekly shop".into(),
            description: "before noon".into(),
            priority: Priority::Low,
            due: chrono::NaiveDate::from_ymd_opt(2026, 5, 1),
            subtasks: sample_wire(),
        };
        let (meta, tree) = decode_payload(&payload);
        assert_eq!(meta.title, "Weekly shop");
        assert_eq!(meta.priority, Priority::Low);
        assert_eq!(encode_payload(&meta, &tree), payload);
    }
}
