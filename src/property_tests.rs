//! Property-based tests over random edit sequences.
//!
//! **Property 1**: Tree invariants hold after any mix of moves, jumps and removals
//! **Property 2**: A written game loads back into the same tree
//! **Property 3**: Jumps deactivate up to the common ancestor and activate down from it
//! **Property 4**: Arbitrary input either loads cleanly or changes nothing

use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

use crate::config::Config;
use crate::coord::Point;
use crate::events::{EventLog, NullPresenter, TreeEvent};
use crate::tests::shape;
use crate::tree::*;
use crate::{load_record, validate_tree, write_game};

#[derive(Debug, Clone)]
enum Op {
    Play(u8, u8),
    Swap,
    Resign,
    /// Index into the live nodes, wrapped.
    Jump(usize),
    Remove(usize),
    Back,
    Forward,
    Cycle(Direction),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0u8..5, 0u8..5).prop_map(|(x, y)| Op::Play(x, y)),
        1 => Just(Op::Swap),
        1 => Just(Op::Resign),
        3 => any::<usize>().prop_map(Op::Jump),
        2 => any::<usize>().prop_map(Op::Remove),
        1 => Just(Op::Back),
        1 => Just(Op::Forward),
        1 => prop_oneof![Just(Direction::Previous), Just(Direction::Next)].prop_map(Op::Cycle),
    ]
}

fn live_node(game: &Game, index: usize) -> NodeId {
    let ids: Vec<NodeId> = game.nodes().map(|n| n.id).collect();
    ids[index % ids.len()]
}

fn apply(game: &mut Game, op: &Op, presenter: &mut EventLog) {
    let color = game.color_to_move();
    match *op {
        Op::Play(x, y) => {
            game.play_move(Move::Place(Point::new(x, y)), color, presenter)
                .unwrap();
        }
        Op::Swap => {
            game.play_move(Move::Swap, color, presenter).unwrap();
        }
        Op::Resign => {
            game.play_move(Move::Resign, color, presenter).unwrap();
        }
        Op::Jump(i) => {
            let target = live_node(game, i);
            game.jump_to(target, presenter).unwrap();
        }
        Op::Remove(i) => {
            let target = live_node(game, i);
            game.remove_subtree(target, presenter);
        }
        Op::Back => {
            game.step_back(presenter);
        }
        Op::Forward => {
            game.step_forward(presenter);
        }
        Op::Cycle(direction) => {
            game.cycle_branches(direction, presenter);
        }
    }
}

fn build(ops: &[Op]) -> Game {
    let mut game = Game::new(13).unwrap();
    let mut log = EventLog::new();
    for op in ops {
        apply(&mut game, op, &mut log);
    }
    game
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_edits_keep_tree_consistent(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut game = Game::new(13).unwrap();
        let mut log = EventLog::new();
        for op in &ops {
            apply(&mut game, op, &mut log);
            let errors = validate_tree(&game);
            prop_assert!(errors.is_empty(), "after {:?}: {:?}", op, errors);
        }

        // Every node created and not removed is still in the game.
        let mut live = 1;
        for event in &log.events {
            match event {
                TreeEvent::NodeCreated { .. } => live += 1,
                TreeEvent::NodeRemoved { .. } => live -= 1,
                _ => {}
            }
        }
        prop_assert_eq!(live, game.node_count());
    }

    #[test]
    fn prop_written_game_loads_back(ops in prop::collection::vec(arb_op(), 0..40)) {
        let game = build(&ops);
        let written = write_game(&game).unwrap();

        let mut copy = Game::new(13).unwrap();
        load_record(&mut copy, &written, &Config::default(), &mut NullPresenter).unwrap();
        prop_assert_eq!(shape(&copy), shape(&game), "written as {}", written);
        prop_assert!(validate_tree(&copy).is_empty());
    }

    #[test]
    fn prop_jump_walks_through_common_ancestor(
        ops in prop::collection::vec(arb_op(), 1..40),
        from in any::<usize>(),
        to in any::<usize>(),
    ) {
        let mut game = build(&ops);
        let a = live_node(&game, from);
        let b = live_node(&game, to);
        game.jump_to(a, &mut NullPresenter).unwrap();

        let mut log = EventLog::new();
        game.jump_to(b, &mut log).unwrap();
        prop_assert_eq!(game.cursor(), b);
        if a == b {
            prop_assert!(log.is_empty());
            return Ok(());
        }

        let common = game.lowest_common_ancestor(a, b);
        let up = game.ancestors(a);
        let down = game.ancestors(b);
        let split = up.iter().position(|&id| id == common).unwrap() + 1;
        let mut expected: Vec<(NodeId, bool)> =
            up[split..].iter().rev().map(|&id| (id, false)).collect();
        expected.extend(down[split..].iter().map(|&id| (id, true)));

        let actual: Vec<(NodeId, bool)> = log
            .events
            .iter()
            .filter_map(|e| match e {
                TreeEvent::NodeActivated { node, active } => Some((node.id, *active)),
                _ => None,
            })
            .collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_arbitrary_input_is_all_or_nothing(
        ops in prop::collection::vec(arb_op(), 0..20),
        input in r"[();\[\]\\FSZWBab4-9 ]{0,60}",
    ) {
        let mut game = build(&ops);
        let before = shape(&game);
        let cursor = game.cursor();

        let mut log = EventLog::new();
        match load_record(&mut game, &input, &Config::default(), &mut log) {
            Ok(_) => prop_assert!(validate_tree(&game).is_empty()),
            Err(_) => {
                prop_assert_eq!(shape(&game), before);
                prop_assert_eq!(game.cursor(), cursor);
                prop_assert!(log.is_empty());
            }
        }
    }
}
