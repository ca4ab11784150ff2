//! # Cohesion Solver Library
//!
//! This library provides the board model for the Cohesion puzzle, where colored pieces slide
//! one cell at a time and merge on contact until every color forms a single piece, together
//! with a family of informed search algorithms that solve it.
//!
//! It is used by two binaries:
//! - `ai_solver`: loads a board (file, preset or random), runs one search and prints the
//!   solution path.
//! - `search_evaluator`: runs every algorithm over a batch of seeded random boards and
//!   compares depth, expansions and time.
//!
//! ## Modules
//! - `engine`: colors, directions, pieces and the immutable `BoardState` with merging,
//!   move generation, validation and the win test.
//! - `heuristics`: named board heuristics and their weighted composition.
//! - `solver`: the generic best-first search loop (BFS, DFS, greedy, A*, weighted A*, beam)
//!   and the `TreeNode` arena used for path reconstruction.
//! - `puzzles`: hand-made preset boards.
//! - `utils`: parsing boards from text.
//! - `error`: error types.

pub mod engine;
pub mod error;
pub mod heuristics;
pub mod puzzles;
pub mod solver;
pub mod utils;

// Items from sub-modules should be accessed via their full path,
// e.g. `cohesion_solver::solver::a_star()`. Only the error types are re-exported.
pub use crate::error::{BoardError, HeuristicParseError, InvalidState, SearchError};
