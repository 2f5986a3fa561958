use crate::tree::*;
use std::collections::HashSet;

/// A structural invariant that a game tree fails to hold.
#[derive(Debug, Clone, PartialEq)]
pub struct InvariantError {
    pub message: String,
    /// The node the violation was found at, if any.
    pub node: Option<NodeId>,
    /// Machine-readable error code.
    pub code: &'static str,
}

fn violation(errors: &mut Vec<InvariantError>, code: &'static str, node: Option<NodeId>, message: String) {
    errors.push(InvariantError {
        message,
        node,
        code,
    });
}

// ── Tree validation ─────────────────────────────────────────────────

/// Check the identity, ordering and branch invariants of a game.
///
/// Returns an empty vec when the tree is consistent.
pub fn validate_tree(game: &Game) -> Vec<InvariantError> {
    let mut errors = Vec::new();

    match game.node(ROOT) {
        Some(root) if root.parent.is_none() && root.number == 0 && root.branch == TRUNK => {}
        _ => violation(
            &mut errors,
            "bad-root",
            Some(ROOT),
            "root must be node 0 at ply 0 on the trunk".to_string(),
        ),
    }
    match game.branch(TRUNK) {
        Some(trunk) if trunk.first_node == ROOT && trunk.parent.is_none() && trunk.depth == 0 => {}
        _ => violation(
            &mut errors,
            "bad-trunk",
            None,
            "trunk must start at the root with depth 0".to_string(),
        ),
    }
    if game.node(game.cursor()).is_none() {
        violation(
            &mut errors,
            "dangling-cursor",
            Some(game.cursor()),
            format!("cursor points at missing node {}", game.cursor()),
        );
    }

    walk_reachable(game, &mut errors);

    for node in game.nodes() {
        check_node(game, node, &mut errors);
    }
    for branch in game.branches() {
        check_branch(game, branch, &mut errors);
    }

    errors
}

/// Every live node must be reachable from the root exactly once.
fn walk_reachable(game: &Game, errors: &mut Vec<InvariantError>) {
    let mut seen = HashSet::new();
    let mut stack = vec![ROOT];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            violation(errors, "duplicate-child", Some(id), format!("node {} is reachable twice", id));
            continue;
        }
        match game.node(id) {
            Some(node) => stack.extend(node.children.iter().copied()),
            None => violation(errors, "dangling-child", Some(id), format!("child {} is missing", id)),
        }
    }
    for node in game.nodes() {
        if !seen.contains(&node.id) {
            violation(
                errors,
                "unreachable-node",
                Some(node.id),
                format!("node {} cannot be reached from the root", node.id),
            );
        }
    }
}

fn check_node(game: &Game, node: &Node, errors: &mut Vec<InvariantError>) {
    let Some(branch) = game.branch(node.branch) else {
        violation(
            errors,
            "dangling-branch",
            Some(node.id),
            format!("node {} belongs to missing branch {}", node.id, node.branch),
        );
        return;
    };

    if let Some(parent_id) = node.parent {
        match game.node(parent_id) {
            Some(parent) => {
                if !parent.children.contains(&node.id) {
                    violation(
                        errors,
                        "orphan-node",
                        Some(node.id),
                        format!("node {} is missing from its parent's children", node.id),
                    );
                }
                if node.number != parent.number + 1 {
                    violation(
                        errors,
                        "wrong-number",
                        Some(node.id),
                        format!("node {} is ply {}, parent is ply {}", node.id, node.number, parent.number),
                    );
                }
            }
            None => violation(
                errors,
                "orphan-node",
                Some(node.id),
                format!("parent {} of node {} is missing", parent_id, node.id),
            ),
        }
    }

    for (index, &child_id) in node.children.iter().enumerate() {
        let Some(child) = game.node(child_id) else {
            continue;
        };
        if child.parent != Some(node.id) {
            violation(
                errors,
                "wrong-parent",
                Some(child_id),
                format!("node {} is listed under {} but points elsewhere", child_id, node.id),
            );
        }
        if index == 0 {
            if child.branch != node.branch {
                violation(
                    errors,
                    "main-line-branch",
                    Some(child_id),
                    format!("main-line child {} left branch {}", child_id, node.branch),
                );
            }
            continue;
        }
        match game.branch(child.branch) {
            Some(variation)
                if variation.first_node == child_id
                    && variation.parent == Some(node.branch)
                    && variation.depth == branch.depth + 1 => {}
            _ => violation(
                errors,
                "variation-branch",
                Some(child_id),
                format!(
                    "variation {} must start its own branch below branch {}",
                    child_id, node.branch
                ),
            ),
        }
    }
}

fn check_branch(game: &Game, branch: &Branch, errors: &mut Vec<InvariantError>) {
    let Some(first) = game.node(branch.first_node) else {
        violation(
            errors,
            "branch-representative",
            None,
            format!("branch {} starts at missing node {}", branch.bid, branch.first_node),
        );
        return;
    };
    let continues_parent = first
        .parent
        .and_then(|p| game.node(p))
        .is_some_and(|p| p.branch == branch.bid);
    if first.branch != branch.bid || continues_parent {
        violation(
            errors,
            "branch-representative",
            Some(first.id),
            format!("node {} is not the earliest node of branch {}", first.id, branch.bid),
        );
    }
}
