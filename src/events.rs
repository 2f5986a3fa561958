use crate::coord::view_label;
use crate::tree::{Branch, BranchId, Node};
use serde::Serialize;

/// Receives notifications from the game model so a view can follow it
/// incrementally.
///
/// Calls arrive synchronously and in model order: parents are created before
/// their children, children are removed before their parents. Every method
/// defaults to a no-op so an adapter only implements what it renders.
/// An adapter must not call back into the model from inside a callback.
pub trait Presenter {
    fn on_node_created(&mut self, _node: &Node) {}
    fn on_node_removed(&mut self, _node: &Node) {}
    fn on_branch_created(&mut self, _branch: &Branch) {}
    fn on_branch_removed(&mut self, _branch: &Branch) {}
    /// A surviving branch got a new parent branch or depth after a promotion.
    fn on_branch_updated(&mut self, _branch: &Branch) {}
    /// A node moved from `old_branch` into `node.branch` after a promotion.
    fn on_node_rebranched(&mut self, _node: &Node, _old_branch: BranchId) {}
    fn on_cursor_moved(&mut self, _from: &Node, _to: &Node) {}
    fn on_node_activated(&mut self, _node: &Node, _active: bool) {}
}

/// Adapter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

/// One recorded adapter notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TreeEvent {
    NodeCreated {
        label: String,
        node: Node,
    },
    NodeRemoved {
        node: Node,
    },
    BranchCreated {
        branch: Branch,
    },
    BranchRemoved {
        branch: Branch,
    },
    BranchUpdated {
        branch: Branch,
    },
    NodeRebranched {
        node: Node,
        #[serde(rename = "oldBranch")]
        old_branch: BranchId,
    },
    CursorMoved {
        from: Node,
        to: Node,
    },
    NodeActivated {
        node: Node,
        active: bool,
    },
}

/// A presenter that records every notification in order.
///
/// Used to buffer events while a record is loaded into a staging game, and
/// by the WASM surface to hand events to the page as JSON.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<TreeEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn take(&mut self) -> Vec<TreeEvent> {
        std::mem::take(&mut self.events)
    }

    /// Forward the recorded events, in order, to another presenter.
    pub fn replay(&self, presenter: &mut dyn Presenter) {
        for event in &self.events {
            match event {
                TreeEvent::NodeCreated { node, .. } => presenter.on_node_created(node),
                TreeEvent::NodeRemoved { node } => presenter.on_node_removed(node),
                TreeEvent::BranchCreated { branch } => presenter.on_branch_created(branch),
                TreeEvent::BranchRemoved { branch } => presenter.on_branch_removed(branch),
                TreeEvent::BranchUpdated { branch } => presenter.on_branch_updated(branch),
                TreeEvent::NodeRebranched { node, old_branch } => {
                    presenter.on_node_rebranched(node, *old_branch)
                }
                TreeEvent::CursorMoved { from, to } => presenter.on_cursor_moved(from, to),
                TreeEvent::NodeActivated { node, active } => {
                    presenter.on_node_activated(node, *active)
                }
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.events).unwrap_or_else(|_| "[]".to_string())
    }
}

impl Presenter for EventLog {
    fn on_node_created(&mut self, node: &Node) {
        self.events.push(TreeEvent::NodeCreated {
            label: view_label(node),
            node: node.clone(),
        });
    }

    fn on_node_removed(&mut self, node: &Node) {
        self.events.push(TreeEvent::NodeRemoved { node: node.clone() });
    }

    fn on_branch_created(&mut self, branch: &Branch) {
        self.events.push(TreeEvent::BranchCreated {
            branch: branch.clone(),
        });
    }

    fn on_branch_removed(&mut self, branch: &Branch) {
        self.events.push(TreeEvent::BranchRemoved {
            branch: branch.clone(),
        });
    }

    fn on_branch_updated(&mut self, branch: &Branch) {
        self.events.push(TreeEvent::BranchUpdated {
            branch: branch.clone(),
        });
    }

    fn on_node_rebranched(&mut self, node: &Node, old_branch: BranchId) {
        self.events.push(TreeEvent::NodeRebranched {
            node: node.clone(),
            old_branch,
        });
    }

    fn on_cursor_moved(&mut self, from: &Node, to: &Node) {
        self.events.push(TreeEvent::CursorMoved {
            from: from.clone(),
            to: to.clone(),
        });
    }

    fn on_node_activated(&mut self, node: &Node, active: bool) {
        self.events.push(TreeEvent::NodeActivated {
            node: node.clone(),
            active,
        });
    }
}
