//! Error types shared by the board model, the heuristic parser and the search engine.

/// A broken board invariant, reported with the first offending cell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidState {
    #[error("piece has no cells")]
    EmptyPiece,

    #[error("cell ({x}, {y}) is outside the board")]
    OutOfBounds { x: i32, y: i32 },

    #[error("more than one piece occupies ({x}, {y})")]
    Overlap { x: i32, y: i32 },

    #[error("piece containing ({x}, {y}) is not edge-connected")]
    Disconnected { x: i32, y: i32 },

    #[error("piece containing ({x}, {y}) touches another piece of the same color")]
    NotMaximal { x: i32, y: i32 },
}

/// Errors raised while building a board from untrusted input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoardError {
    #[error("unrecognized character '{ch}' in row {row} col {col}")]
    InvalidCharacter { ch: char, row: usize, col: usize },

    #[error("board text contains no rows")]
    EmptyBoard,

    #[error("invalid generation parameters: {0}")]
    InvalidParameters(String),

    #[error("no preset board named '{0}'")]
    UnknownPreset(String),

    #[error("invalid board state: {0}")]
    InvalidState(#[from] InvalidState),
}

/// Errors raised while parsing a `name:weight` heuristic term list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeuristicParseError {
    #[error("unknown heuristic term '{0}'")]
    UnknownTerm(String),

    #[error("invalid weight '{0}'")]
    InvalidWeight(String),

    #[error("heuristic term list is empty")]
    Empty,
}

/// Rejected search configurations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    #[error("weight must be a finite number >= 1, got {0}")]
    InvalidWeight(f64),

    #[error("beam width must be at least 1")]
    ZeroBeamWidth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_character_display() {
        let err = BoardError::InvalidCharacter {
            ch: 'X',
            row: 1,
            col: 2,
        };
        assert_eq!(err.to_string(), "unrecognized character 'X' in row 1 col 2");
    }

    #[test]
    fn test_invalid_state_wraps_into_board_error() {
        let err: BoardError = InvalidState::Overlap { x: 0, y: 3 }.into();
        assert_eq!(
            err.to_string(),
            "invalid board state: more than one piece occupies (0, 3)"
        );
    }

    #[test]
    fn test_search_error_display() {
        assert_eq!(
            SearchError::InvalidWeight(0.5).to_string(),
            "weight must be a finite number >= 1, got 0.5"
        );
        assert_eq!(
            SearchError::ZeroBeamWidth.to_string(),
            "beam width must be at least 1"
        );
    }
}
