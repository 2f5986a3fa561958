use crate::coord::{view_label, Point};
use crate::tree::{BranchId, Color, Game, NodeId};
use serde::Serialize;
use std::collections::HashSet;

/// Move-list view of a game: one row per branch, indented by depth, each
/// listing its nodes along the main line of that branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub cursor: NodeId,
    pub color_to_move: Color,
    pub branches: Vec<BranchView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchView {
    pub bid: BranchId,
    pub parent: Option<BranchId>,
    pub depth: u32,
    pub nodes: Vec<NodeView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub label: String,
    pub color: Option<Color>,
    /// Where the stone is drawn; a swap points at the stone it took over.
    pub point: Option<Point>,
    /// On the path from the root to the cursor.
    pub active: bool,
}

impl Snapshot {
    pub fn of(game: &Game) -> Self {
        let active: HashSet<NodeId> = game.ancestors(game.cursor()).into_iter().collect();
        let branches = game
            .branches()
            .map(|branch| {
                let mut nodes = Vec::new();
                let mut next = Some(branch.first_node);
                while let Some(node) = next.and_then(|id| game.node(id)) {
                    if node.branch != branch.bid {
                        break;
                    }
                    nodes.push(NodeView {
                        id: node.id,
                        label: view_label(node),
                        color: node.color,
                        point: game.effective_point(node.id),
                        active: active.contains(&node.id),
                    });
                    next = node.children.first().copied();
                }
                BranchView {
                    bid: branch.bid,
                    parent: branch.parent,
                    depth: branch.depth,
                    nodes,
                }
            })
            .collect();
        Snapshot {
            cursor: game.cursor(),
            color_to_move: game.color_to_move(),
            branches,
        }
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Serialize to pretty-printed JSON (2-space indent).
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
