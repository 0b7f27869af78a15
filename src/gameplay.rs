use std::fmt::Write;

use crate::error::PuzzleError;
use crate::model::*;

/// Steps a solved move list forward and back over its start state.
pub struct Replay {
    state: PuzzleState,
    starting_state: PuzzleState,
    moves: Vec<Move>,
    undo_stack: Vec<PuzzleState>,
}

impl Replay {
    pub fn new(starting_state: PuzzleState, moves: Vec<Move>) -> Self {
        Self {
            state: starting_state.clone(),
            starting_state,
            moves,
            undo_stack: Vec::new(),
        }
    }

    pub fn get_state(&self) -> &PuzzleState {
        &self.state
    }

    pub fn get_moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of moves applied so far.
    pub fn position(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_finished(&self) -> bool {
        self.position() == self.moves.len()
    }

    pub fn next_move(&self) -> Option<&Move> {
        self.moves.get(self.position())
    }

    /// Apply the next move. `Ok(None)` once every move has been played.
    pub fn step_forward(&mut self) -> Result<Option<Move>, PuzzleError> {
        let Some(&mv) = self.next_move() else {
            return Ok(None);
        };
        let mut next = self.state.clone();
        next.apply_move(&mv)?;
        self.undo_stack.push(std::mem::replace(&mut self.state, next));
        Ok(Some(mv))
    }

    /// Undo the last applied move, returning it.
    pub fn step_back(&mut self) -> Option<Move> {
        let previous_state = self.undo_stack.pop()?;
        self.state = previous_state;
        self.moves.get(self.position()).copied()
    }

    pub fn reset(&mut self) {
        self.state = self.starting_state.clone();
        self.undo_stack.clear();
    }

    pub fn run_to_end(&mut self) -> Result<&PuzzleState, PuzzleError> {
        while self.step_forward()?.is_some() {}
        Ok(&self.state)
    }
}

/// The start state followed by the state after each move.
pub fn replay_states(start: &PuzzleState, moves: &[Move]) -> Result<Vec<PuzzleState>, PuzzleError> {
    let mut states = Vec::with_capacity(moves.len() + 1);
    let mut current = start.clone();
    states.push(current.clone());
    for mv in moves {
        current.apply_move(mv)?;
        states.push(current.clone());
    }
    Ok(states)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Print the bottles after every move.
    pub show_states: bool,
    /// Leave out the amount and colour of each pour.
    pub short_moves: bool,
}

pub fn format_move(index: usize, mv: &Move, palette: &Palette, short: bool) -> String {
    if short {
        format!("{}. {} → {}", index + 1, mv.from_bottle + 1, mv.to_bottle + 1)
    } else {
        format!(
            "{}. {} → {}  (poured {} × {})",
            index + 1,
            mv.from_bottle + 1,
            mv.to_bottle + 1,
            mv.amount,
            palette.label(mv.color)
        )
    }
}

/// Text listing of a solution: the start state, then one line per move.
pub fn format_solution(
    start: &PuzzleState,
    moves: &[Move],
    palette: &Palette,
    options: FormatOptions,
) -> Result<String, PuzzleError> {
    let mut text = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(text, "Initial state (top→bottom):\n{}", start.display(palette));
    let mut current = start.clone();
    for (index, mv) in moves.iter().enumerate() {
        let _ = writeln!(text, "{}", format_move(index, mv, palette, options.short_moves));
        current.apply_move(mv)?;
        if options.show_states {
            let _ = writeln!(text, "{}", current.display(palette));
        }
    }
    Ok(text)
}
