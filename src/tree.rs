use crate::coord::{self, Point};
use crate::error::{Error, Result};
use crate::events::Presenter;
use crate::record::GameInfo;
use serde::Serialize;
use tracing::debug;

pub type NodeId = usize;
pub type BranchId = usize;

/// Id of the root node of every game.
pub const ROOT: NodeId = 0;
/// Id of the trunk branch, the one the root belongs to.
pub const TRUNK: BranchId = 0;

/// The two sides. `First` moves first and is tagged `W` in records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    First,
    Second,
}

impl Color {
    pub fn flip(self) -> Color {
        match self {
            Color::First => Color::Second,
            Color::Second => Color::First,
        }
    }

    /// Single-letter tag used in records.
    pub fn tag(self) -> &'static str {
        match self {
            Color::First => "W",
            Color::Second => "B",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Color> {
        match tag {
            "W" => Ok(Color::First),
            "B" => Ok(Color::Second),
            _ => Err(Error::InvalidMoveColor {
                tag: tag.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKind {
    Root,
    Normal,
    Swap,
    Resign,
}

/// What a player does on their turn.
///
/// A swap (pie rule) takes over the opponent's stone and has no
/// coordinates of its own; see [`Game::effective_point`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Place(Point),
    Swap,
    Resign,
}

impl Move {
    pub fn kind(self) -> MoveKind {
        match self {
            Move::Place(_) => MoveKind::Normal,
            Move::Swap => MoveKind::Swap,
            Move::Resign => MoveKind::Resign,
        }
    }

    pub fn point(self) -> Option<Point> {
        match self {
            Move::Place(p) => Some(p),
            Move::Swap | Move::Resign => None,
        }
    }
}

/// One ply of the game tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: MoveKind,
    /// Set only for `MoveKind::Normal`.
    pub point: Option<Point>,
    /// Unset only for the root.
    pub color: Option<Color>,
    /// Ply index; the root is 0.
    pub number: u32,
    pub parent: Option<NodeId>,
    /// In the order the moves were first played; index 0 is the main line.
    pub children: Vec<NodeId>,
    pub branch: BranchId,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The move this node records, `None` for the root.
    pub fn as_move(&self) -> Option<Move> {
        match (self.kind, self.point) {
            (MoveKind::Normal, Some(p)) => Some(Move::Place(p)),
            (MoveKind::Swap, _) => Some(Move::Swap),
            (MoveKind::Resign, _) => Some(Move::Resign),
            _ => None,
        }
    }

    fn plays(&self, mv: Move, color: Color) -> bool {
        self.color == Some(color) && self.as_move() == Some(mv)
    }
}

/// A run of nodes forming one variation in the move list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub bid: BranchId,
    pub parent: Option<BranchId>,
    /// The earliest node carrying this branch.
    pub first_node: NodeId,
    pub depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// The game tree, its branches and the navigation cursor.
///
/// Nodes and branches live in arenas indexed by id. Ids are never reused;
/// a removed node or branch leaves an empty slot, so the node arena is also
/// the id-to-node map.
#[derive(Debug, Clone)]
pub struct Game {
    board_size: u8,
    nodes: Vec<Option<Node>>,
    branches: Vec<Option<Branch>>,
    cursor: NodeId,
    pub info: GameInfo,
}

impl Game {
    /// An empty game with just the root. Fails for board sizes the
    /// coordinate alphabet cannot address.
    pub fn new(board_size: u8) -> Result<Self> {
        coord::check_board_size(board_size)?;
        let root = Node {
            id: ROOT,
            kind: MoveKind::Root,
            point: None,
            color: None,
            number: 0,
            parent: None,
            children: Vec::new(),
            branch: TRUNK,
        };
        let trunk = Branch {
            bid: TRUNK,
            parent: None,
            first_node: ROOT,
            depth: 0,
        };
        Ok(Game {
            board_size,
            nodes: vec![Some(root)],
            branches: vec![Some(trunk)],
            cursor: ROOT,
            info: GameInfo::new(board_size),
        })
    }

    // ── Lookup ──────────────────────────────────────────────────────

    pub fn board_size(&self) -> u8 {
        self.board_size
    }

    pub fn root(&self) -> &Node {
        self.at(ROOT)
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    pub fn current(&self) -> &Node {
        self.at(self.cursor)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    pub fn branch(&self, bid: BranchId) -> Option<&Branch> {
        self.branches.get(bid).and_then(Option::as_ref)
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().flatten()
    }

    /// Live branches in id order.
    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    fn at(&self, id: NodeId) -> &Node {
        match self.nodes.get(id) {
            Some(Some(node)) => node,
            _ => unreachable!("dangling node id {}", id),
        }
    }

    fn at_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id) {
            Some(Some(node)) => node,
            _ => unreachable!("dangling node id {}", id),
        }
    }

    fn branch_at(&self, bid: BranchId) -> &Branch {
        match self.branches.get(bid) {
            Some(Some(branch)) => branch,
            _ => unreachable!("dangling branch id {}", bid),
        }
    }

    fn live(&self, id: NodeId) -> Result<&Node> {
        self.node(id)
            .ok_or_else(|| Error::precondition(format!("node {} is not in the game", id)))
    }

    /// The side whose turn it is at the cursor.
    pub fn color_to_move(&self) -> Color {
        match self.current().color {
            Some(color) if !self.current().is_root() => color.flip(),
            _ => Color::First,
        }
    }

    /// Where a node's stone sits: its own point, or for a swap the point of
    /// the stone it took over.
    pub fn effective_point(&self, id: NodeId) -> Option<Point> {
        let node = self.node(id)?;
        match node.kind {
            MoveKind::Normal => node.point,
            MoveKind::Swap => node.parent.and_then(|p| self.effective_point(p)),
            MoveKind::Root | MoveKind::Resign => None,
        }
    }

    pub fn view_label(&self, id: NodeId) -> Option<String> {
        self.node(id).map(coord::view_label)
    }

    /// Ids from the root down to `id`, both included.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut next = self.node(id).map(|n| n.id);
        while let Some(current) = next {
            path.push(current);
            next = self.at(current).parent;
        }
        path.reverse();
        path
    }

    /// Deepest node that is an ancestor of (or equal to) both `a` and `b`.
    pub fn lowest_common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        self.ancestors(a)
            .into_iter()
            .zip(self.ancestors(b))
            .take_while(|(x, y)| x == y)
            .last()
            .map(|(x, _)| x)
            .unwrap_or(ROOT)
    }

    /// Sibling just before or after `id` in its parent's child order.
    pub fn cycle_sibling(&self, id: NodeId, direction: Direction) -> Option<NodeId> {
        let parent = self.at(self.node(id)?.parent?);
        let index = parent.children.iter().position(|&c| c == id)?;
        match direction {
            Direction::Previous => index.checked_sub(1).map(|i| parent.children[i]),
            Direction::Next => parent.children.get(index + 1).copied(),
        }
    }

    // ── Playing ─────────────────────────────────────────────────────

    /// Play `mv` for `color` from the cursor and move the cursor onto it.
    ///
    /// If the cursor already has a child with the same move and color, the
    /// cursor just follows it. Otherwise a new node is appended; it
    /// continues the cursor's branch when it is the first child and opens a
    /// new branch when it is not.
    pub fn play_move(
        &mut self,
        mv: Move,
        color: Color,
        presenter: &mut dyn Presenter,
    ) -> Result<NodeId> {
        if let Move::Place(point) = mv {
            if !point.on_board(self.board_size) {
                return Err(Error::precondition(format!(
                    "({}, {}) is outside a {}x{} board",
                    point.x, point.y, self.board_size, self.board_size
                )));
            }
        }

        let from = self.cursor;
        let existing = self
            .at(from)
            .children
            .iter()
            .copied()
            .find(|&c| self.at(c).plays(mv, color));
        if let Some(existing) = existing {
            debug!(node = existing, "replaying existing move");
            self.cursor = existing;
            presenter.on_node_activated(self.at(existing), true);
            presenter.on_cursor_moved(self.at(from), self.at(existing));
            return Ok(existing);
        }

        let parent = self.at(from);
        let id = self.nodes.len();
        let number = parent.number + 1;
        let parent_branch = parent.branch;
        let branch = if parent.children.is_empty() {
            parent_branch
        } else {
            let bid = self.branches.len();
            let depth = self.branch_at(parent_branch).depth + 1;
            self.branches.push(Some(Branch {
                bid,
                parent: Some(parent_branch),
                first_node: id,
                depth,
            }));
            presenter.on_branch_created(self.branch_at(bid));
            bid
        };

        self.nodes.push(Some(Node {
            id,
            kind: mv.kind(),
            point: mv.point(),
            color: Some(color),
            number,
            parent: Some(from),
            children: Vec::new(),
            branch,
        }));
        self.at_mut(from).children.push(id);
        self.cursor = id;

        presenter.on_node_created(self.at(id));
        presenter.on_node_activated(self.at(id), true);
        presenter.on_cursor_moved(self.at(from), self.at(id));
        Ok(id)
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Move the cursor to `target`, deactivating the nodes between the old
    /// cursor and the common ancestor and activating those down to `target`.
    pub fn jump_to(&mut self, target: NodeId, presenter: &mut dyn Presenter) -> Result<()> {
        self.live(target)?;
        self.walk_to(target, presenter);
        Ok(())
    }

    fn walk_to(&mut self, target: NodeId, presenter: &mut dyn Presenter) {
        let from = self.cursor;
        if from == target {
            return;
        }
        let common = self.lowest_common_ancestor(from, target);

        let mut id = from;
        while id != common {
            let node = self.at(id);
            presenter.on_node_activated(node, false);
            match node.parent {
                Some(parent) => id = parent,
                None => break,
            }
        }

        let mut path = Vec::new();
        let mut id = target;
        while id != common {
            path.push(id);
            match self.at(id).parent {
                Some(parent) => id = parent,
                None => break,
            }
        }
        for &id in path.iter().rev() {
            presenter.on_node_activated(self.at(id), true);
        }

        self.cursor = target;
        presenter.on_cursor_moved(self.at(from), self.at(target));
    }

    /// Back to the parent. Returns false at the root.
    pub fn step_back(&mut self, presenter: &mut dyn Presenter) -> bool {
        match self.current().parent {
            Some(parent) => {
                self.walk_to(parent, presenter);
                true
            }
            None => false,
        }
    }

    /// Forward along the main line. Returns false at a leaf.
    pub fn step_forward(&mut self, presenter: &mut dyn Presenter) -> bool {
        match self.current().children.first().copied() {
            Some(child) => {
                self.walk_to(child, presenter);
                true
            }
            None => false,
        }
    }

    /// Switch the cursor to the neighbouring variation of the current move.
    pub fn cycle_branches(&mut self, direction: Direction, presenter: &mut dyn Presenter) -> bool {
        match self.cycle_sibling(self.cursor, direction) {
            Some(sibling) => {
                self.walk_to(sibling, presenter);
                true
            }
            None => false,
        }
    }

    // ── Pruning ─────────────────────────────────────────────────────

    /// Remove `id` and everything below it. Does nothing for the root or an
    /// unknown id.
    ///
    /// The cursor moves to the parent first. When the removed node was the
    /// main line, the next variation is promoted onto the parent's branch.
    pub fn remove_subtree(&mut self, id: NodeId, presenter: &mut dyn Presenter) {
        let Some(node) = self.node(id) else {
            debug!(node = id, "ignoring removal of unknown node");
            return;
        };
        let Some(parent) = node.parent else {
            debug!("refusing to remove the root");
            return;
        };

        self.walk_to(parent, presenter);

        let index = self.at(parent).children.iter().position(|&c| c == id);
        for doomed in self.subtree(id).into_iter().rev() {
            self.remove_one(doomed, presenter);
        }
        if let Some(index) = index {
            let siblings = &mut self.at_mut(parent).children;
            siblings.remove(index);
            if index == 0 && !siblings.is_empty() {
                self.promote_first_child(parent, presenter);
            }
        }
    }

    /// Ids of `id` and its descendants in preorder.
    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.at(current).children.iter().rev());
        }
        order
    }

    fn remove_one(&mut self, id: NodeId, presenter: &mut dyn Presenter) {
        let Some(node) = self.nodes[id].take() else {
            return;
        };
        let represents = self
            .branch(node.branch)
            .is_some_and(|b| b.first_node == node.id);
        if represents {
            if let Some(branch) = self.branches[node.branch].take() {
                presenter.on_branch_removed(&branch);
            }
        }
        presenter.on_node_removed(&node);
    }

    fn promote_first_child(&mut self, parent: NodeId, presenter: &mut dyn Presenter) {
        let target = self.at(parent).branch;
        let head = self.at(parent).children[0];
        let demoted = self.at(head).branch;
        if demoted == target {
            return;
        }

        let mut next = Some(head);
        while let Some(id) = next {
            let node = self.at_mut(id);
            node.branch = target;
            next = node.children.first().copied();
            presenter.on_node_rebranched(self.at(id), demoted);
        }
        if let Some(branch) = self.branches[demoted].take() {
            presenter.on_branch_removed(&branch);
        }

        for id in self.subtree(head) {
            let owner = self.at(id).branch;
            let depth = self.branch_at(owner).depth + 1;
            let variations: Vec<BranchId> = self
                .at(id)
                .children
                .iter()
                .skip(1)
                .map(|&c| self.at(c).branch)
                .collect();
            for bid in variations {
                let Some(Some(branch)) = self.branches.get_mut(bid) else {
                    continue;
                };
                if branch.parent != Some(owner) || branch.depth != depth {
                    branch.parent = Some(owner);
                    branch.depth = depth;
                    presenter.on_branch_updated(self.branch_at(bid));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventLog, NullPresenter, TreeEvent};

    fn place(x: u8, y: u8) -> Move {
        Move::Place(Point::new(x, y))
    }

    #[test]
    fn new_game_has_root_and_trunk() {
        let game = Game::new(13).unwrap();
        assert_eq!(game.cursor(), ROOT);
        assert_eq!(game.root().kind, MoveKind::Root);
        assert_eq!(game.branch(TRUNK).unwrap().first_node, ROOT);
        assert_eq!(game.color_to_move(), Color::First);
    }

    #[test]
    fn board_size_must_fit_the_alphabet() {
        for size in [0, 27, 30] {
            let err = Game::new(size).unwrap_err();
            assert_eq!(err.code(), "invalid-configuration", "size {}", size);
        }
        assert_eq!(Game::new(26).unwrap().board_size(), 26);
        assert_eq!(Game::new(1).unwrap().board_size(), 1);
    }

    #[test]
    fn color_alternates_after_each_move() {
        let mut game = Game::new(13).unwrap();
        let p = &mut NullPresenter;
        game.play_move(place(0, 0), Color::First, p).unwrap();
        assert_eq!(game.color_to_move(), Color::Second);
        game.play_move(Move::Swap, Color::Second, p).unwrap();
        assert_eq!(game.color_to_move(), Color::First);
    }

    #[test]
    fn off_board_move_is_rejected_without_mutation() {
        let mut game = Game::new(13).unwrap();
        let err = game
            .play_move(place(13, 0), Color::First, &mut NullPresenter)
            .unwrap_err();
        assert_eq!(err.code(), "precondition-violation");
        assert_eq!(game.node_count(), 1);
    }

    #[test]
    fn new_move_emits_branch_then_node_then_cursor() {
        let mut game = Game::new(13).unwrap();
        game.play_move(place(0, 0), Color::First, &mut NullPresenter)
            .unwrap();
        game.jump_to(ROOT, &mut NullPresenter).unwrap();

        let mut log = EventLog::new();
        let id = game.play_move(place(1, 1), Color::First, &mut log).unwrap();
        let kinds: Vec<&str> = log
            .events
            .iter()
            .map(|e| match e {
                TreeEvent::BranchCreated { .. } => "branch",
                TreeEvent::NodeCreated { .. } => "node",
                TreeEvent::NodeActivated { .. } => "activate",
                TreeEvent::CursorMoved { .. } => "cursor",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["branch", "node", "activate", "cursor"]);
        assert_eq!(game.node(id).unwrap().branch, 1);
    }

    #[test]
    fn swap_point_comes_from_parent() {
        let mut game = Game::new(13).unwrap();
        let p = &mut NullPresenter;
        let first = game.play_move(place(4, 7), Color::First, p).unwrap();
        let swap = game.play_move(Move::Swap, Color::Second, p).unwrap();
        assert_eq!(game.node(swap).unwrap().point, None);
        assert_eq!(game.effective_point(swap), game.effective_point(first));
        assert_eq!(game.view_label(swap).unwrap(), "2.swap");
    }

    #[test]
    fn cycle_sibling_stops_at_the_edges() {
        let mut game = Game::new(13).unwrap();
        let p = &mut NullPresenter;
        let a = game.play_move(place(0, 0), Color::First, p).unwrap();
        game.jump_to(ROOT, p).unwrap();
        let b = game.play_move(place(1, 0), Color::First, p).unwrap();
        game.jump_to(ROOT, p).unwrap();
        let c = game.play_move(place(2, 0), Color::First, p).unwrap();

        assert_eq!(game.cycle_sibling(a, Direction::Previous), None);
        assert_eq!(game.cycle_sibling(a, Direction::Next), Some(b));
        assert_eq!(game.cycle_sibling(b, Direction::Next), Some(c));
        assert_eq!(game.cycle_sibling(c, Direction::Next), None);
        assert_eq!(game.cycle_sibling(ROOT, Direction::Next), None);
    }

    #[test]
    fn keyboard_navigation() {
        let mut game = Game::new(13).unwrap();
        let p = &mut NullPresenter;
        let a = game.play_move(place(0, 0), Color::First, p).unwrap();
        let b = game.play_move(place(1, 1), Color::Second, p).unwrap();
        game.jump_to(a, p).unwrap();
        let c = game.play_move(place(2, 2), Color::Second, p).unwrap();

        assert!(game.cycle_branches(Direction::Previous, p));
        assert_eq!(game.cursor(), b);
        assert!(!game.cycle_branches(Direction::Previous, p));
        assert!(game.cycle_branches(Direction::Next, p));
        assert_eq!(game.cursor(), c);
        assert!(game.step_back(p));
        assert!(game.step_forward(p));
        assert_eq!(game.cursor(), b);
        assert!(!game.step_forward(p));
        game.jump_to(ROOT, p).unwrap();
        assert!(!game.step_back(p));
    }

    #[test]
    fn jump_to_removed_node_is_a_precondition_violation() {
        let mut game = Game::new(13).unwrap();
        let p = &mut NullPresenter;
        let a = game.play_move(place(0, 0), Color::First, p).unwrap();
        game.remove_subtree(a, p);
        let err = game.jump_to(a, p).unwrap_err();
        assert!(matches!(err, Error::PreconditionViolation { .. }));
    }
}
