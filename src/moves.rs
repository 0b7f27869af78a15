use std::collections::HashSet;

use crate::heuristics::move_score;
use crate::model::{Color, Move, PuzzleState};

/// Which pruning rules the generator applies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveRules {
    /// Every legal pour except reverses and no-ops, in bottle order. Used by
    /// the breadth-first solver so its answers stay shortest.
    Exhaustive,
    /// Additionally collapses interchangeable empty targets and duplicate
    /// sources, then orders moves by [`move_score`].
    Informed,
}

/// Pouring a finished bottle into an empty one only relabels it.
fn is_noop_pour(state: &PuzzleState, from: usize, to: usize) -> bool {
    let capacity = state.get_capacity();
    match (state.get_bottle(from), state.get_bottle(to)) {
        (Some(src), Some(dst)) => dst.is_empty() && src.is_complete(capacity),
        _ => false,
    }
}

pub fn generate_moves(state: &PuzzleState, last_move: Option<&Move>, rules: MoveRules) -> Vec<Move> {
    let bottles = state.get_bottles();
    let capacity = state.get_capacity();
    let informed = rules == MoveRules::Informed;

    let empty_count = bottles.iter().filter(|b| b.is_empty()).count();
    let canonical_empty = if informed && empty_count > 1 {
        bottles.iter().position(|b| b.is_empty())
    } else {
        None
    };
    let mut signatures: HashSet<(usize, &[Color])> = HashSet::new();

    let mut moves = Vec::new();
    for (from, src) in bottles.iter().enumerate() {
        if src.is_empty() {
            continue;
        }
        for (to, dst) in bottles.iter().enumerate() {
            if from == to || !src.could_pour_into(dst, capacity) {
                continue;
            }
            let Some((color, run)) = src.get_top_run() else {
                continue;
            };
            let mv = Move {
                from_bottle: from,
                to_bottle: to,
                amount: run.min(dst.get_empty_space(capacity)),
                color,
            };
            if last_move.is_some_and(|previous| mv.is_reverse_of(previous)) {
                continue;
            }
            if is_noop_pour(state, from, to) {
                continue;
            }
            if let Some(target) = canonical_empty
                && dst.is_empty()
                && to != target
            {
                continue;
            }
            // The pour is fully determined by the source contents and the
            // destination, so equal signatures give permuted successors.
            if informed && !signatures.insert((to, src.get_layers())) {
                continue;
            }
            moves.push(mv);
        }
    }

    if informed {
        moves.sort_by_cached_key(|mv| std::cmp::Reverse(move_score(state, mv)));
    }
    moves
}
