//! Core board model for the Cohesion puzzle.
//!
//! This module defines the puzzle's fundamental components:
//! - `Color`: the closed set of piece colors.
//! - `Direction`: the four orthogonal moves a piece can make.
//! - `Piece`: a maximal, edge-connected region of one color.
//! - `BoardState`: an immutable set of pieces on a `width` x `height` grid, with merging,
//!   move/successor generation, validity checks and the win test.
use crate::error::{BoardError, InvalidState};
use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// The color of a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Color {
    /// Every color, in the order used by random generation.
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    /// Parses a single-letter color code (`R`, `G`, `B`, `Y`).
    ///
    /// # Examples
    ///
    /// ```
    /// use cohesion_solver::engine::Color;
    /// assert_eq!(Color::from_char('G'), Some(Color::Green));
    /// assert_eq!(Color::from_char('x'), None);
    /// ```
    pub fn from_char(ch: char) -> Option<Color> {
        match ch {
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            'B' => Some(Color::Blue),
            'Y' => Some(Color::Yellow),
            _ => None,
        }
    }

    /// Converts the color to its character representation.
    pub fn to_char(&self) -> char {
        match self {
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Blue => 'B',
            Color::Yellow => 'Y',
        }
    }

    /// Returns the ANSI foreground color code for terminal output.
    fn to_ansi_color_code(&self) -> &'static str {
        match self {
            Color::Red => "31",
            Color::Green => "32",
            Color::Yellow => "33",
            Color::Blue => "34",
        }
    }
}

fn generate_random_color(rng: &mut impl Rng) -> Color {
    Color::ALL[rng.gen_range(0..Color::ALL.len())]
}

/// One of the four orthogonal directions a piece can be moved in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Returns the `(dx, dy)` step for this direction. `y` grows downwards.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// A cell coordinate `(x, y)`. Signed so that translated cells may fall off the board.
pub type Position = (i32, i32);

/// Shifts `pos` by one step in `direction`. No bounds check is made.
pub fn shift_pos(pos: Position, direction: Direction) -> Position {
    let (dx, dy) = direction.delta();
    (pos.0 + dx, pos.1 + dy)
}

/// A single-colored set of cells.
///
/// Inside a `BoardState` every piece is edge-connected and maximal: no cell outside the
/// piece but adjacent to it holds the same color. Positions are kept in a `BTreeSet`, so
/// two pieces with the same color and cells compare and hash identically.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Piece {
    color: Color,
    positions: BTreeSet<Position>,
}

impl Piece {
    pub fn new(color: Color, positions: impl IntoIterator<Item = Position>) -> Self {
        Piece {
            color,
            positions: positions.into_iter().collect(),
        }
    }

    /// Creates a one-cell piece.
    pub fn single(color: Color, pos: Position) -> Self {
        Piece::new(color, [pos])
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn positions(&self) -> &BTreeSet<Position> {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.positions.contains(&pos)
    }

    /// Returns `true` if the two pieces share at least one cell.
    pub fn overlaps(&self, other: &Piece) -> bool {
        self.positions.iter().any(|pos| other.positions.contains(pos))
    }

    /// Cells that are edge-adjacent to the piece but not part of it. May lie off the board.
    pub fn neighbour_positions(&self) -> BTreeSet<Position> {
        self.positions
            .iter()
            .flat_map(|&pos| Direction::ALL.iter().map(move |&d| shift_pos(pos, d)))
            .filter(|pos| !self.positions.contains(pos))
            .collect()
    }

    /// Returns a copy of the piece moved one step in `direction`, without any bounds check.
    pub fn translated(&self, direction: Direction) -> Piece {
        Piece {
            color: self.color,
            positions: self
                .positions
                .iter()
                .map(|&pos| shift_pos(pos, direction))
                .collect(),
        }
    }

    /// Width and height of the axis-aligned bounding box, or `None` for an empty piece.
    pub fn bounding_box(&self) -> Option<(usize, usize)> {
        let min_x = self.positions.iter().map(|p| p.0).min()?;
        let max_x = self.positions.iter().map(|p| p.0).max()?;
        let min_y = self.positions.iter().map(|p| p.1).min()?;
        let max_y = self.positions.iter().map(|p| p.1).max()?;
        Some(((max_x - min_x + 1) as usize, (max_y - min_y + 1) as usize))
    }

    fn is_connected(&self) -> bool {
        let Some(&start) = self.positions.iter().next() else {
            return false;
        };
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(pos) = queue.pop_front() {
            for direction in Direction::ALL {
                let next = shift_pos(pos, direction);
                if self.positions.contains(&next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen.len() == self.positions.len()
    }
}

/// Unions every group of touching same-colored pieces into one maximal piece.
///
/// The input pieces must be pairwise disjoint. Starting from each piece not yet absorbed,
/// a breadth-first flood fill walks same-colored neighbours and collects their cells.
pub fn merge_same_color_pieces(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut owner: HashMap<Position, usize> = HashMap::new();
    for (index, piece) in pieces.iter().enumerate() {
        for &pos in &piece.positions {
            let previous = owner.insert(pos, index);
            debug_assert!(previous.is_none(), "pieces overlap at {:?}", pos);
        }
    }

    let mut absorbed = vec![false; pieces.len()];
    let mut merged = Vec::with_capacity(pieces.len());

    for start in 0..pieces.len() {
        if absorbed[start] {
            continue;
        }
        absorbed[start] = true;
        let color = pieces[start].color;
        let mut positions = BTreeSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            positions.extend(pieces[current].positions.iter().copied());
            for pos in pieces[current].neighbour_positions() {
                if let Some(&other) = owner.get(&pos) {
                    if !absorbed[other] && pieces[other].color == color {
                        absorbed[other] = true;
                        queue.push_back(other);
                    }
                }
            }
        }
        merged.push(Piece { color, positions });
    }
    merged
}

/// Checks bounds, non-emptiness and disjointness. Returns the cell owner map on success.
fn check_layout(
    width: usize,
    height: usize,
    pieces: &[Piece],
) -> Result<HashMap<Position, usize>, InvalidState> {
    let mut owner = HashMap::new();
    for (index, piece) in pieces.iter().enumerate() {
        if piece.is_empty() {
            return Err(InvalidState::EmptyPiece);
        }
        for &(x, y) in &piece.positions {
            if !in_bounds(width, height, x, y) {
                return Err(InvalidState::OutOfBounds { x, y });
            }
            if owner.insert((x, y), index).is_some() {
                return Err(InvalidState::Overlap { x, y });
            }
        }
    }
    Ok(owner)
}

/// Full invariant check: layout, then connectivity, then maximality.
fn check_pieces(width: usize, height: usize, pieces: &[Piece]) -> Result<(), InvalidState> {
    let owner = check_layout(width, height, pieces)?;
    for piece in pieces {
        if !piece.is_connected() {
            let &(x, y) = piece.positions.iter().next().ok_or(InvalidState::EmptyPiece)?;
            return Err(InvalidState::Disconnected { x, y });
        }
    }
    for piece in pieces {
        for &pos in &piece.positions {
            for direction in Direction::ALL {
                let next = shift_pos(pos, direction);
                if piece.contains(next) {
                    continue;
                }
                if let Some(&other) = owner.get(&next) {
                    if pieces[other].color == piece.color {
                        return Err(InvalidState::NotMaximal { x: pos.0, y: pos.1 });
                    }
                }
            }
        }
    }
    Ok(())
}

fn in_bounds(width: usize, height: usize, x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height
}

/// An immutable puzzle state.
///
/// Pieces are stored in sorted order, which makes the derived comparisons independent of
/// the order in which pieces were discovered: two boards are equal (and hash equally)
/// exactly when they hold the same set of pieces. A per-cell index backs `piece_at`.
#[derive(Clone, Debug)]
pub struct BoardState {
    width: usize,
    height: usize,
    pieces: Vec<Piece>,
    cells: Vec<Option<usize>>,
    num_colors: usize,
}

impl BoardState {
    /// Builds a board from hand-made pieces, validating every invariant.
    ///
    /// Pieces are not merged: a fixture with two touching same-colored pieces is rejected
    /// with `InvalidState::NotMaximal`.
    pub fn new(width: usize, height: usize, pieces: Vec<Piece>) -> Result<Self, InvalidState> {
        check_pieces(width, height, &pieces)?;
        Ok(Self::from_trusted(width, height, pieces))
    }

    /// Builds a board from possibly touching pieces (typically singletons), merging them first.
    ///
    /// Bounds and disjointness are checked before the merge; the merged result is then
    /// validated in full.
    pub fn with_merge(
        width: usize,
        height: usize,
        pieces: Vec<Piece>,
    ) -> Result<Self, InvalidState> {
        check_layout(width, height, &pieces)?;
        let merged = merge_same_color_pieces(pieces);
        check_pieces(width, height, &merged)?;
        Ok(Self::from_trusted(width, height, merged))
    }

    /// Parses a board from text. See [`crate::utils::board_from_text`].
    pub fn from_text(text: &str) -> Result<Self, BoardError> {
        crate::utils::board_from_text(text)
    }

    /// Builds a board without re-validating. Callers guarantee the invariants.
    fn from_trusted(width: usize, height: usize, mut pieces: Vec<Piece>) -> Self {
        pieces.sort_unstable();
        let mut cells = vec![None; width * height];
        for (index, piece) in pieces.iter().enumerate() {
            for &(x, y) in &piece.positions {
                debug_assert!(in_bounds(width, height, x, y));
                cells[y as usize * width + x as usize] = Some(index);
            }
        }
        let num_colors = pieces.iter().map(|p| p.color).collect::<HashSet<_>>().len();
        assert!(
            pieces.len() >= num_colors,
            "board has {} pieces but {} colors",
            pieces.len(),
            num_colors
        );
        BoardState {
            width,
            height,
            pieces,
            cells,
            num_colors,
        }
    }

    /// Generates a random board.
    ///
    /// Performs `floor(width * height / divisor)` draws. Each draw picks a uniformly random
    /// cell and, if it is still empty, places a single cell of a uniformly random color there.
    /// Draws landing on occupied cells are wasted, so the filled-cell count is at most the
    /// number of draws. Touching same-colored cells are merged afterwards.
    pub fn generate_random(
        width: usize,
        height: usize,
        divisor: f64,
        rng: &mut impl Rng,
    ) -> Result<Self, BoardError> {
        if width == 0 || height == 0 {
            return Err(BoardError::InvalidParameters(format!(
                "board must be at least 1x1, got {}x{}",
                width, height
            )));
        }
        if width > i32::MAX as usize || height > i32::MAX as usize {
            return Err(BoardError::InvalidParameters(format!(
                "board dimensions must fit in i32, got {}x{}",
                width, height
            )));
        }
        if !divisor.is_finite() || divisor <= 0.0 {
            return Err(BoardError::InvalidParameters(format!(
                "divisor must be a positive number, got {}",
                divisor
            )));
        }

        let draws = ((width * height) as f64 / divisor).floor() as usize;
        let mut occupied = HashSet::new();
        let mut pieces = Vec::new();
        for _ in 0..draws {
            let x = rng.gen_range(0..width) as i32;
            let y = rng.gen_range(0..height) as i32;
            if !occupied.insert((x, y)) {
                continue;
            }
            pieces.push(Piece::single(generate_random_color(rng), (x, y)));
        }
        debug!(
            "generated {}x{} board: {} draws filled {} cells",
            width,
            height,
            draws,
            pieces.len()
        );
        Ok(Self::from_trusted(
            width,
            height,
            merge_same_color_pieces(pieces),
        ))
    }

    /// Generates a reproducible random board from `seed`. See [`BoardState::generate_random`].
    pub fn generate_random_with_seed(
        width: usize,
        height: usize,
        divisor: f64,
        seed: u64,
    ) -> Result<Self, BoardError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self::generate_random(width, height, divisor, &mut rng)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The pieces in canonical (sorted) order. Piece indices refer to this slice.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn num_pieces(&self) -> usize {
        self.pieces.len()
    }

    /// Number of distinct colors present on the board.
    pub fn num_colors(&self) -> usize {
        self.num_colors
    }

    pub fn colors(&self) -> BTreeSet<Color> {
        self.pieces.iter().map(|p| p.color).collect()
    }

    pub fn num_pieces_of_color(&self, color: Color) -> usize {
        self.pieces.iter().filter(|p| p.color == color).count()
    }

    /// Total number of occupied cells.
    pub fn num_piece_cells(&self) -> usize {
        self.pieces.iter().map(Piece::len).sum()
    }

    pub fn is_pos_in_bounds(&self, x: i32, y: i32) -> bool {
        in_bounds(self.width, self.height, x, y)
    }

    /// Index of the piece covering `(x, y)`, if any.
    pub fn piece_index_at(&self, x: i32, y: i32) -> Option<usize> {
        if !self.is_pos_in_bounds(x, y) {
            return None;
        }
        self.cells[y as usize * self.width + x as usize]
    }

    pub fn piece_at(&self, x: i32, y: i32) -> Option<&Piece> {
        self.piece_index_at(x, y).map(|index| &self.pieces[index])
    }

    /// A board is won when every color present forms exactly one piece.
    pub fn is_win(&self) -> bool {
        self.pieces.len() == self.num_colors
    }

    /// Re-checks every invariant and reports the first one that fails.
    pub fn validate(&self) -> Result<(), InvalidState> {
        check_pieces(self.width, self.height, &self.pieces)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Returns `true` if `moved` (the piece at `index` after a translation) stays on the
    /// board and does not cover any other piece.
    fn translation_fits(&self, index: usize, moved: &Piece) -> bool {
        moved.positions.iter().all(|&(x, y)| {
            self.is_pos_in_bounds(x, y)
                && self.piece_index_at(x, y).map_or(true, |other| other == index)
        })
    }

    /// Returns `true` if the piece at `index` has a legal move in `direction`.
    pub fn can_move(&self, index: usize, direction: Direction) -> bool {
        self.pieces
            .get(index)
            .is_some_and(|piece| self.translation_fits(index, &piece.translated(direction)))
    }

    /// Moves the piece at `index` one step in `direction`.
    ///
    /// Returns `None` when the index is unknown, when a cell would leave the board, or when
    /// the moved piece would overlap another piece. On success the moved piece is merged
    /// with any same-colored pieces it now touches.
    pub fn move_piece(&self, index: usize, direction: Direction) -> Option<BoardState> {
        let moved = self.pieces.get(index)?.translated(direction);
        if !self.translation_fits(index, &moved) {
            return None;
        }
        let mut pieces = self.pieces.clone();
        pieces[index] = moved;
        Some(Self::from_trusted(
            self.width,
            self.height,
            merge_same_color_pieces(pieces),
        ))
    }

    /// Every legal successor reachable by moving the piece at `index`.
    pub fn piece_all_moves(&self, index: usize) -> Vec<BoardState> {
        Direction::ALL
            .iter()
            .filter_map(|&direction| self.move_piece(index, direction))
            .collect()
    }

    /// Every legal successor of this board.
    pub fn children(&self) -> Vec<BoardState> {
        self.children_filtered(|_, _| true)
    }

    /// Successors obtained by moving only the pieces for which `predicate(board, index)` holds.
    pub fn children_filtered<P>(&self, predicate: P) -> Vec<BoardState>
    where
        P: Fn(&BoardState, usize) -> bool,
    {
        (0..self.pieces.len())
            .filter(|&index| predicate(self, index))
            .flat_map(|index| self.piece_all_moves(index))
            .collect()
    }

    /// Pruning predicate: a piece is worth moving if its color appears elsewhere on the
    /// board or if it already touches another piece.
    ///
    /// Skipping the other pieces can, on contrived boards, drop the only path to a win.
    pub fn should_move(&self, index: usize) -> bool {
        let Some(piece) = self.pieces.get(index) else {
            return false;
        };
        self.num_pieces_of_color(piece.color) > 1 || self.is_piece_touching_another(index)
    }

    /// Returns `true` if some other piece is edge-adjacent to the piece at `index`.
    pub fn is_piece_touching_another(&self, index: usize) -> bool {
        let Some(piece) = self.pieces.get(index) else {
            return false;
        };
        piece
            .neighbour_positions()
            .into_iter()
            .any(|(x, y)| self.piece_index_at(x, y).is_some_and(|other| other != index))
    }

    /// Number of pieces that cannot move in any direction.
    pub fn num_stuck_pieces(&self) -> usize {
        (0..self.pieces.len())
            .filter(|&index| !Direction::ALL.iter().any(|&d| self.can_move(index, d)))
            .count()
    }

    /// Plain text rendering, one line per row, `.` for empty cells.
    ///
    /// The output parses back into an equal board.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.height);
        for y in 0..self.height as i32 {
            let line: String = (0..self.width as i32)
                .map(|x| self.piece_at(x, y).map_or('.', |p| p.color.to_char()))
                .collect();
            lines.push(line);
        }
        lines.join("\n")
    }
}

impl PartialEq for BoardState {
    fn eq(&self, other: &Self) -> bool {
        self.pieces == other.pieces
    }
}

impl Eq for BoardState {}

impl Hash for BoardState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pieces.hash(state);
    }
}

impl FromStr for BoardState {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::utils::board_from_text(s)
    }
}

impl fmt::Display for BoardState {
    /// Colored grid framed by dashes, followed by a summary line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "-".repeat(self.width))?;
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                match self.piece_at(x, y) {
                    Some(piece) => write!(
                        f,
                        "\x1b[{};1m{}\x1b[0m",
                        piece.color.to_ansi_color_code(),
                        piece.color.to_char()
                    )?,
                    None => write!(f, " ")?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "{}", "-".repeat(self.width))?;

        let cells = self.num_piece_cells();
        let percent_filled = if self.width * self.height == 0 {
            0.0
        } else {
            cells as f64 / (self.width * self.height) as f64 * 100.0
        };
        writeln!(
            f,
            "{} colors, {} pieces, {} cells ({:.2}%)",
            self.num_colors,
            self.pieces.len(),
            cells,
            percent_filled
        )?;
        write!(f, "Win: {}", self.is_win())
    }
}
