use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of rows and columns of a board.
pub const SIZE: usize = 9;

// Edge length of one 3x3 box region.
const BOX: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("expected 9 rows, got {0}")]
    RowCount(usize),
    #[error("row {row} has {len} cells, expected 9")]
    RowLength { row: usize, len: usize },
    #[error("cell ({row}, {col}) holds {value}, expected 0-9")]
    DigitRange { row: usize, col: usize, value: u8 },
}

/// A 9x9 Sudoku board. 0 marks an empty cell, 1-9 are fixed digits.
///
/// Serializes as a plain 9x9 array of numbers; deserializing validates
/// dimensions and digit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Board {
    cells: [[u8; SIZE]; SIZE],
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [[0; SIZE]; SIZE],
        }
    }

    /// Builds a board from recognizer output, one symbol per cell.
    ///
    /// Symbols "1" to "9" become digits; everything else (the "0" sentinel,
    /// blanks, OCR misreads) becomes an empty cell. Only the grid shape can
    /// fail, never the symbol content.
    pub fn from_symbols<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self, BoardError> {
        if rows.len() != SIZE {
            return Err(BoardError::RowCount(rows.len()));
        }

        let mut board = Self::empty();

        for (row, symbols) in rows.iter().enumerate() {
            if symbols.len() != SIZE {
                return Err(BoardError::RowLength {
                    row,
                    len: symbols.len(),
                });
            }

            for (col, symbol) in symbols.iter().enumerate() {
                let symbol = symbol.as_ref().trim();
                board.cells[row][col] = match symbol.parse::<u8>() {
                    Ok(digit @ 1..=9) => digit,
                    _ => {
                        if !symbol.is_empty() && symbol != "0" {
                            debug!(
                                "Unrecognized symbol {:?} at ({}, {}), treating as empty",
                                symbol, row, col
                            );
                        }
                        0
                    }
                };
            }
        }

        Ok(board)
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row][col]
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, digit: u8) {
        self.cells[row][col] = digit;
    }

    pub(crate) fn clear(&mut self, row: usize, col: usize) {
        self.cells[row][col] = 0;
    }

    /// First empty cell in row-major order, if any.
    pub fn first_empty(&self) -> Option<(usize, usize)> {
        (0..SIZE).find_map(|row| {
            (0..SIZE).find_map(|col| (self.cells[row][col] == 0).then_some((row, col)))
        })
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|row| row.iter().all(|&cell| cell != 0))
    }

    /// True if no row, column or box contains a digit twice. Empty cells are
    /// ignored, so partially filled boards can be consistent.
    pub fn is_consistent(&self) -> bool {
        for i in 0..SIZE {
            let mut row_seen = [false; SIZE + 1];
            let mut col_seen = [false; SIZE + 1];
            let mut box_seen = [false; SIZE + 1];

            for j in 0..SIZE {
                let row_cell = self.cells[i][j];
                if row_cell != 0 {
                    if row_seen[row_cell as usize] {
                        return false;
                    }
                    row_seen[row_cell as usize] = true;
                }

                let col_cell = self.cells[j][i];
                if col_cell != 0 {
                    if col_seen[col_cell as usize] {
                        return false;
                    }
                    col_seen[col_cell as usize] = true;
                }

                // i walks the boxes, j walks the cells inside box i
                let box_cell = self.cells[BOX * (i / BOX) + j / BOX][BOX * (i % BOX) + j % BOX];
                if box_cell != 0 {
                    if box_seen[box_cell as usize] {
                        return false;
                    }
                    box_seen[box_cell as usize] = true;
                }
            }
        }

        true
    }
}

impl TryFrom<Vec<Vec<u8>>> for Board {
    type Error = BoardError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        if rows.len() != SIZE {
            return Err(BoardError::RowCount(rows.len()));
        }

        let mut board = Self::empty();

        for (row, values) in rows.iter().enumerate() {
            if values.len() != SIZE {
                return Err(BoardError::RowLength {
                    row,
                    len: values.len(),
                });
            }

            for (col, &value) in values.iter().enumerate() {
                if value > 9 {
                    return Err(BoardError::DigitRange { row, col, value });
                }
                board.cells[row][col] = value;
            }
        }

        Ok(board)
    }
}

impl From<Board> for Vec<Vec<u8>> {
    fn from(board: Board) -> Self {
        board.cells.iter().map(|row| row.to_vec()).collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            for (j, &cell) in row.iter().enumerate() {
                match cell {
                    0 => write!(fmt, ".")?,
                    digit => write!(fmt, "{}", digit)?,
                }
                if j == 2 || j == 5 {
                    write!(fmt, "|")?;
                }
            }
            writeln!(fmt)?;
            if i == 2 || i == 5 {
                writeln!(fmt, "---+---+---")?;
            }
        }

        Ok(())
    }
}
