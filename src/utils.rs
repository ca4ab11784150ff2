use crate::engine::{BoardState, Color, Piece};
use crate::error::BoardError;

/// Parses an array of string slices into a `BoardState`.
///
/// Each string slice represents a row, starting from the top (`y = 0`). Rows are trimmed
/// and blank rows are dropped. The board width is the length of the longest remaining row;
/// shorter rows are padded with empty cells.
///
/// Valid characters for cells are:
/// - 'R': `Color::Red`
/// - 'G': `Color::Green`
/// - 'B': `Color::Blue`
/// - 'Y': `Color::Yellow`
/// - '.' or ' ': empty
///
/// Every colored cell starts as its own piece; touching same-colored cells are then merged.
///
/// # Returns
/// * `Ok(BoardState)` if parsing is successful.
/// * `Err(BoardError::InvalidCharacter)` on any other character.
/// * `Err(BoardError::EmptyBoard)` if no non-blank rows remain.
///
/// # Examples
/// ```
/// use cohesion_solver::utils::board_from_str_array;
/// use cohesion_solver::engine::Color;
///
/// let board = board_from_str_array(&[
///     ".B.",
///     "RGR",
///     ".B.",
/// ]).unwrap();
/// assert_eq!(board.width(), 3);
/// assert_eq!(board.height(), 3);
/// assert_eq!(board.num_pieces(), 5);
/// assert_eq!(board.piece_at(1, 1).unwrap().color(), Color::Green);
///
/// assert!(board_from_str_array(&["RXB"]).is_err());
/// ```
pub fn board_from_str_array(s: &[&str]) -> Result<BoardState, BoardError> {
    let rows: Vec<&str> = s
        .iter()
        .map(|row| row.trim())
        .filter(|row| !row.is_empty())
        .collect();

    if rows.is_empty() {
        return Err(BoardError::EmptyBoard);
    }

    let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
    let height = rows.len();

    let mut pieces = Vec::new();
    for (r, row_str) in rows.iter().enumerate() {
        for (c, ch) in row_str.chars().enumerate() {
            if ch == '.' || ch == ' ' {
                continue;
            }
            let color =
                Color::from_char(ch).ok_or(BoardError::InvalidCharacter { ch, row: r, col: c })?;
            pieces.push(Piece::single(color, (c as i32, r as i32)));
        }
    }

    Ok(BoardState::with_merge(width, height, pieces)?)
}

/// Parses a multi-line string into a `BoardState`. See [`board_from_str_array`].
pub fn board_from_text(text: &str) -> Result<BoardState, BoardError> {
    let rows: Vec<&str> = text.lines().collect();
    board_from_str_array(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_from_str_array_valid() {
        let board = board_from_str_array(&["RGYB", "....", "BYGR"]).unwrap();
        assert_eq!(board.width(), 4);
        assert_eq!(board.height(), 3);
        assert_eq!(board.num_pieces(), 8);
        assert_eq!(board.piece_at(0, 0).unwrap().color(), Color::Red);
        assert!(board.piece_at(0, 1).is_none());
    }

    #[test]
    fn test_board_from_str_array_invalid_char() {
        let result = board_from_str_array(&["RGYX"]);
        assert_eq!(
            result.unwrap_err(),
            BoardError::InvalidCharacter {
                ch: 'X',
                row: 0,
                col: 3
            }
        );
    }

    #[test]
    fn test_board_from_str_array_lowercase_is_invalid() {
        assert!(matches!(
            board_from_str_array(&["Rr"]),
            Err(BoardError::InvalidCharacter { ch: 'r', .. })
        ));
    }

    #[test]
    fn test_board_from_str_array_inner_spaces_are_empty() {
        let board = board_from_str_array(&["R G"]).unwrap();
        assert_eq!(board.width(), 3);
        assert_eq!(board.num_pieces(), 2);
        assert!(board.piece_at(1, 0).is_none());
    }

    #[test]
    fn test_board_from_str_array_empty_input() {
        let board_str: [&str; 0] = [];
        assert_eq!(
            board_from_str_array(&board_str).unwrap_err(),
            BoardError::EmptyBoard
        );
        assert_eq!(
            board_from_str_array(&["   ", ""]).unwrap_err(),
            BoardError::EmptyBoard
        );
    }

    #[test]
    fn test_board_from_str_array_pads_short_rows() {
        let board = board_from_str_array(&["RGY", "B"]).unwrap();
        assert_eq!(board.width(), 3);
        assert_eq!(board.height(), 2);
        assert_eq!(board.to_text(), "RGY\nB..");
    }

    #[test]
    fn test_board_from_text_drops_blank_lines_and_indentation() {
        let board = board_from_text(
            "
            .B.
            RGR

            .B.
            ",
        )
        .unwrap();
        assert_eq!(board.height(), 3);
        assert_eq!(board.to_text(), ".B.\nRGR\n.B.");
    }
}
