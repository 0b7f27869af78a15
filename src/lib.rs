//! # Water Sort Solver Library
//!
//! Finds a sequence of pours that sorts every bottle of a water sort puzzle
//! into a single colour, or reports that none was found.
//!
//! It is used by the `water_sort` binary, which reads a level from a text
//! file, solves it and prints the moves.
//!
//! ## Modules
//! - `model`: colours, palettes, bottles, puzzle states, moves and the hashable
//!   `StateKey` used to detect repeated states.
//! - `validation`: the checks a level must pass before it is solved.
//! - `moves`: legal, non-redundant pour generation.
//! - `heuristics`: remaining-move estimate and move ordering for A*.
//! - `solver`: breadth-first (shortest) and A* (fast) searches.
//! - `gameplay`: replaying a solution and formatting it as text.
//! - `generator`: the sample level and seeded random levels.

pub mod error;
pub mod gameplay;
pub mod generator;
pub mod heuristics;
pub mod model;
pub mod moves;
pub mod solver;
pub mod validation;

pub use error::{PuzzleError, SolveError};
pub use model::{Bottle, Color, Move, Palette, PuzzleState, StateKey};
pub use solver::{Algorithm, SearchConfig, SearchMode, Solution, solve, solve_with_config};
