use log::debug;
use thiserror::Error;

use crate::board::{Board, SIZE};

/// Search frames allowed per solve call before giving up. Well-posed puzzles
/// finish in a few thousand frames; this bound only catches pathological
/// input.
pub const DEFAULT_STEP_BUDGET: u64 = 25_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    /// The given cells conflict with each other before any search begins.
    /// Points at an upstream recognition error rather than a hard puzzle.
    #[error("recognized digits already conflict in a row, column or box")]
    InconsistentInput,
    /// Every candidate assignment was exhausted without completing the board.
    #[error("no digit assignment satisfies every row, column and box")]
    Unsolvable,
    /// The search hit its step budget.
    #[error("search gave up after {0} steps")]
    BudgetExhausted(u64),
}

/// True if `digit` can sit at (`row`, `col`) without clashing with the
/// cell's row, column or box. The target cell itself is excluded from the
/// scans, so the answer does not depend on what it currently holds. Never
/// mutates the board.
pub fn can_place(board: &Board, row: usize, col: usize, digit: u8) -> bool {
    for i in 0..SIZE {
        if i != col && board.get(row, i) == digit {
            return false;
        }
        if i != row && board.get(i, col) == digit {
            return false;
        }
    }

    let box_row = (row / 3) * 3;
    let box_col = (col / 3) * 3;

    for i in box_row..box_row + 3 {
        for j in box_col..box_col + 3 {
            if (i, j) != (row, col) && board.get(i, j) == digit {
                return false;
            }
        }
    }

    true
}

/// Solves `board` with the default step budget.
pub fn solve(board: &Board) -> Result<Board, SolveError> {
    solve_with_budget(board, DEFAULT_STEP_BUDGET)
}

/// Completes `board` so every row, column and box holds each digit exactly
/// once, or reports why it cannot.
///
/// The input is never mutated; the search runs on a private copy that is
/// returned on success. Givens that conflict among themselves are rejected
/// up front as [`SolveError::InconsistentInput`].
pub fn solve_with_budget(board: &Board, max_steps: u64) -> Result<Board, SolveError> {
    if !board.is_consistent() {
        debug!("Rejecting board, givens conflict:\n{}", board);
        return Err(SolveError::InconsistentInput);
    }

    let mut working = *board;
    let mut steps = 0u64;

    if search(&mut working, &mut steps, max_steps)? {
        debug!("Solved in {} steps", steps);
        Ok(working)
    } else {
        debug!("Search space exhausted after {} steps", steps);
        Err(SolveError::Unsolvable)
    }
}

// Chronological backtracking: fill the first empty cell (row-major) with the
// lowest digit the regions allow, recurse, undo on a dead end. Depth is
// bounded by the 81 cells.
fn search(board: &mut Board, steps: &mut u64, max_steps: u64) -> Result<bool, SolveError> {
    *steps += 1;
    if *steps > max_steps {
        return Err(SolveError::BudgetExhausted(max_steps));
    }

    let Some((row, col)) = board.first_empty() else {
        return Ok(true);
    };

    for digit in 1..=9 {
        if can_place(board, row, col, digit) {
            board.set(row, col, digit);
            if search(board, steps, max_steps)? {
                return Ok(true);
            }
            board.clear(row, col);
        }
    }

    Ok(false)
}

/// Checks that `candidate` is a complete, consistent board that keeps every
/// given of `puzzle`.
pub fn verify_solution(puzzle: &Board, candidate: &Board) -> bool {
    if !candidate.is_complete() || !candidate.is_consistent() {
        return false;
    }

    for row in 0..SIZE {
        for col in 0..SIZE {
            let given = puzzle.get(row, col);
            if given != 0 && given != candidate.get(row, col) {
                return false;
            }
        }
    }

    true
}
