//! Board evaluation functions used to order the search frontier.
//!
//! Every named heuristic is a pure function of a `BoardState` returning a non-negative
//! count. They are combined with per-term weights (optionally depth dependent) through
//! [`multi_heuristic`], which yields a [`Heuristic`] the search engine can consume.
use crate::engine::{BoardState, Piece};
use crate::error::HeuristicParseError;
use std::fmt;
use std::str::FromStr;

/// A depth-aware board evaluation. Lower values are better.
pub trait Heuristic {
    fn estimate(&self, board: &BoardState, depth: usize) -> f64;
}

impl<F> Heuristic for F
where
    F: Fn(&BoardState, usize) -> f64,
{
    fn estimate(&self, board: &BoardState, depth: usize) -> f64 {
        self(board, depth)
    }
}

/// Number of pieces that still have to be merged away: `num_pieces - num_colors`.
///
/// Zero exactly at a win. Not admissible: one move can join three or more pieces of a color,
/// so A* with this heuristic alone may return a solution longer than the shortest one.
///
/// # Panics
/// Panics if the board has fewer pieces than colors, which would mean the merge or move
/// logic produced a corrupt board.
pub fn pieces_heuristic(board: &BoardState) -> usize {
    let pieces = board.num_pieces();
    let colors = board.num_colors();
    assert!(
        pieces >= colors,
        "board has {} pieces but {} colors",
        pieces,
        colors
    );
    pieces - colors
}

/// Smallest cell-to-cell Manhattan distance between two pieces, minus one.
///
/// Touching pieces score 0. Never negative.
pub fn manhattan_distance_piece(piece: &Piece, other: &Piece) -> usize {
    let mut best: Option<usize> = None;
    for &(x, y) in piece.positions() {
        for &(ox, oy) in other.positions() {
            let distance = (x.abs_diff(ox) + y.abs_diff(oy)) as usize;
            best = Some(best.map_or(distance, |b| b.min(distance)));
        }
    }
    best.map_or(0, |d| d.saturating_sub(1))
}

/// Sums [`manhattan_distance_piece`] over every ordered pair of distinct pieces that share a
/// color (`same_color = true`) or differ in color (`same_color = false`).
pub fn manhattan_distance(board: &BoardState, same_color: bool) -> usize {
    let pieces = board.pieces();
    let mut total = 0;
    for (i, piece) in pieces.iter().enumerate() {
        for (j, other) in pieces.iter().enumerate() {
            if i == j || (piece.color() == other.color()) != same_color {
                continue;
            }
            total += manhattan_distance_piece(piece, other);
        }
    }
    total
}

/// Returns [`manhattan_distance`] with `same_color` fixed.
///
/// Same-color distance pulls pieces together. Different-color distance is meant to be used
/// with a negative weight, pushing unrelated pieces apart.
pub fn manhattan_distance_heuristic(same_color: bool) -> impl Fn(&BoardState) -> usize {
    move |board| manhattan_distance(board, same_color)
}

/// How far a piece is from filling a square-ish bounding box.
///
/// With `L` the longer and `S` the shorter bounding-box side: if `L - S <= 1` the cost is
/// `0` when the piece has at least `L * L` cells and `L * S - cells` otherwise; for longer
/// boxes it is `L * L - cells`.
pub fn piece_uniformity(piece: &Piece) -> usize {
    let Some((width, height)) = piece.bounding_box() else {
        return 0;
    };
    let largest = width.max(height);
    let smallest = width.min(height);
    let cells = piece.len();

    if largest - smallest <= 1 {
        if cells >= largest * largest {
            return 0;
        }
        return largest * smallest - cells;
    }
    largest * largest - cells
}

/// Sum of [`piece_uniformity`] over every piece. Rewards compact partial merges.
pub fn piece_uniformity_heuristic(board: &BoardState) -> usize {
    board.pieces().iter().map(piece_uniformity).sum()
}

/// Counts ordered cell pairs from two differently colored pieces that lie within
/// Manhattan distance 2 of each other.
pub fn touching_pieces(board: &BoardState) -> usize {
    let pieces = board.pieces();
    let mut result = 0;
    for piece in pieces {
        for other in pieces {
            if piece.color() == other.color() {
                continue;
            }
            for &(x, y) in piece.positions() {
                for &(ox, oy) in other.positions() {
                    if x.abs_diff(ox) + y.abs_diff(oy) <= 2 {
                        result += 1;
                    }
                }
            }
        }
    }
    result
}

/// The weight applied to one term of a [`MultiHeuristic`].
pub enum Weight {
    Constant(f64),
    ByDepth(Box<dyn Fn(usize) -> f64>),
}

impl Weight {
    pub fn by_depth(f: impl Fn(usize) -> f64 + 'static) -> Self {
        Weight::ByDepth(Box::new(f))
    }

    pub fn at(&self, depth: usize) -> f64 {
        match self {
            Weight::Constant(w) => *w,
            Weight::ByDepth(f) => f(depth),
        }
    }
}

impl From<f64> for Weight {
    fn from(w: f64) -> Self {
        Weight::Constant(w)
    }
}

impl fmt::Debug for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Constant(w) => write!(f, "{}", w),
            Weight::ByDepth(_) => write!(f, "<by depth>"),
        }
    }
}

/// A board heuristic paired with its weight.
pub struct Term {
    name: String,
    heuristic: Box<dyn Fn(&BoardState) -> usize>,
    weight: Weight,
}

impl Term {
    pub fn new(
        name: impl Into<String>,
        heuristic: impl Fn(&BoardState) -> usize + 'static,
        weight: impl Into<Weight>,
    ) -> Self {
        Term {
            name: name.into(),
            heuristic: Box::new(heuristic),
            weight: weight.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> &Weight {
        &self.weight
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(x{:?})", self.name, self.weight)
    }
}

/// Weighted sum of heuristic terms: `sum(h_i(board) * w_i(depth))`.
#[derive(Debug, Default)]
pub struct MultiHeuristic {
    terms: Vec<Term>,
}

impl MultiHeuristic {
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn push(&mut self, term: Term) {
        self.terms.push(term);
    }
}

impl Heuristic for MultiHeuristic {
    fn estimate(&self, board: &BoardState, depth: usize) -> f64 {
        self.terms
            .iter()
            .map(|term| (term.heuristic)(board) as f64 * term.weight.at(depth))
            .sum()
    }
}

impl fmt::Display for MultiHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.terms.iter().map(|t| format!("{:?}", t)).collect();
        write!(f, "{}", parts.join(" + "))
    }
}

/// Combines weighted terms into a single depth-parameterized heuristic.
pub fn multi_heuristic(terms: Vec<Term>) -> MultiHeuristic {
    MultiHeuristic { terms }
}

/// The named heuristics available to term-list configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermKind {
    /// [`pieces_heuristic`]
    Pieces,
    /// [`manhattan_distance`] between same-colored pieces.
    Distance,
    /// [`manhattan_distance`] between differently colored pieces.
    Repulsion,
    /// [`piece_uniformity_heuristic`]
    Uniformity,
    /// [`touching_pieces`]
    Touching,
}

impl TermKind {
    pub fn name(&self) -> &'static str {
        match self {
            TermKind::Pieces => "pieces",
            TermKind::Distance => "distance",
            TermKind::Repulsion => "repulsion",
            TermKind::Uniformity => "uniformity",
            TermKind::Touching => "touching",
        }
    }

    /// Builds a constant-weight term for this heuristic.
    pub fn term(self, weight: f64) -> Term {
        match self {
            TermKind::Pieces => Term::new(self.name(), pieces_heuristic, weight),
            TermKind::Distance => Term::new(self.name(), manhattan_distance_heuristic(true), weight),
            TermKind::Repulsion => {
                Term::new(self.name(), manhattan_distance_heuristic(false), weight)
            }
            TermKind::Uniformity => Term::new(self.name(), piece_uniformity_heuristic, weight),
            TermKind::Touching => Term::new(self.name(), touching_pieces, weight),
        }
    }
}

impl FromStr for TermKind {
    type Err = HeuristicParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pieces" => Ok(TermKind::Pieces),
            "distance" => Ok(TermKind::Distance),
            "repulsion" => Ok(TermKind::Repulsion),
            "uniformity" => Ok(TermKind::Uniformity),
            "touching" => Ok(TermKind::Touching),
            other => Err(HeuristicParseError::UnknownTerm(other.to_string())),
        }
    }
}

/// Parses a comma-separated `name:weight` list, e.g. `"pieces:100,distance:1"`.
///
/// A missing weight defaults to `1`. Weights may be negative.
///
/// # Examples
/// ```
/// use cohesion_solver::heuristics::parse_terms;
/// let heuristic = parse_terms("pieces:100, distance").unwrap();
/// assert_eq!(heuristic.terms().len(), 2);
/// assert!(parse_terms("speed:3").is_err());
/// ```
pub fn parse_terms(list: &str) -> Result<MultiHeuristic, HeuristicParseError> {
    let mut heuristic = MultiHeuristic::default();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, weight) = match part.split_once(':') {
            Some((name, weight)) => {
                let weight = weight.trim();
                let parsed: f64 = weight
                    .parse()
                    .map_err(|_| HeuristicParseError::InvalidWeight(weight.to_string()))?;
                if !parsed.is_finite() {
                    return Err(HeuristicParseError::InvalidWeight(weight.to_string()));
                }
                (name, parsed)
            }
            None => (part, 1.0),
        };
        heuristic.push(name.parse::<TermKind>()?.term(weight));
    }
    if heuristic.terms.is_empty() {
        return Err(HeuristicParseError::Empty);
    }
    Ok(heuristic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Color;
    use crate::utils::board_from_str_array;

    #[test]
    fn test_pieces_heuristic() {
        let board = board_from_str_array(&[".B.", "RGR", ".B."]).unwrap();
        assert_eq!(pieces_heuristic(&board), 2);

        let won = board_from_str_array(&["RR", "GB"]).unwrap();
        assert!(won.is_win());
        assert_eq!(pieces_heuristic(&won), 0);
    }

    #[test]
    fn test_manhattan_distance_piece() {
        let a = Piece::single(Color::Red, (0, 0));
        let b = Piece::single(Color::Red, (2, 1));
        assert_eq!(manhattan_distance_piece(&a, &b), 2);

        let touching = Piece::single(Color::Red, (1, 0));
        assert_eq!(manhattan_distance_piece(&a, &touching), 0);

        let long = Piece::new(Color::Blue, [(5, 0), (5, 1), (5, 2)]);
        let near = Piece::single(Color::Blue, (3, 2));
        assert_eq!(manhattan_distance_piece(&long, &near), 1);
    }

    #[test]
    fn test_manhattan_distance_same_and_different_color() {
        let board = board_from_str_array(&["R.R"]).unwrap();
        assert_eq!(manhattan_distance(&board, true), 2);
        assert_eq!(manhattan_distance(&board, false), 0);

        let board = board_from_str_array(&["R.G"]).unwrap();
        assert_eq!(manhattan_distance(&board, true), 0);
        assert_eq!(manhattan_distance_heuristic(false)(&board), 2);

        let single = board_from_str_array(&["RR"]).unwrap();
        assert_eq!(manhattan_distance(&single, true), 0);
    }

    #[test]
    fn test_piece_uniformity() {
        let square = Piece::new(Color::Red, [(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(piece_uniformity(&square), 0);

        let line = Piece::new(Color::Red, [(0, 0), (1, 0), (2, 0)]);
        assert_eq!(piece_uniformity(&line), 6);

        let corner = Piece::new(Color::Red, [(0, 0), (1, 0), (0, 1)]);
        assert_eq!(piece_uniformity(&corner), 1);

        let domino = Piece::new(Color::Red, [(0, 0), (1, 0)]);
        assert_eq!(piece_uniformity(&domino), 0);

        assert_eq!(piece_uniformity(&Piece::single(Color::Red, (4, 4))), 0);
    }

    #[test]
    fn test_piece_uniformity_heuristic_sums_pieces() {
        let board = board_from_str_array(&["RRR", "...", "GGG"]).unwrap();
        assert_eq!(piece_uniformity_heuristic(&board), 12);
    }

    #[test]
    fn test_touching_pieces() {
        let board = board_from_str_array(&["RG"]).unwrap();
        assert_eq!(touching_pieces(&board), 2);

        let board = board_from_str_array(&["R.G"]).unwrap();
        assert_eq!(touching_pieces(&board), 2);

        let board = board_from_str_array(&["R..G"]).unwrap();
        assert_eq!(touching_pieces(&board), 0);

        let board = board_from_str_array(&["R.R"]).unwrap();
        assert_eq!(touching_pieces(&board), 0);
    }

    #[test]
    fn test_multi_heuristic_weighted_sum() {
        let board = board_from_str_array(&["R.R"]).unwrap();
        let heuristic = multi_heuristic(vec![
            TermKind::Pieces.term(100.0),
            TermKind::Distance.term(1.0),
        ]);
        assert_eq!(heuristic.estimate(&board, 0), 102.0);
    }

    #[test]
    fn test_multi_heuristic_depth_weight() {
        let board = board_from_str_array(&["R.R"]).unwrap();
        let heuristic = multi_heuristic(vec![Term::new(
            "pieces",
            pieces_heuristic,
            Weight::by_depth(|depth| depth as f64),
        )]);
        assert_eq!(heuristic.estimate(&board, 0), 0.0);
        assert_eq!(heuristic.estimate(&board, 3), 3.0);
    }

    #[test]
    fn test_negative_weight_repels() {
        let board = board_from_str_array(&["R.G"]).unwrap();
        let heuristic = multi_heuristic(vec![TermKind::Repulsion.term(-0.5)]);
        assert_eq!(heuristic.estimate(&board, 0), -1.0);
    }

    #[test]
    fn test_closure_is_a_heuristic() {
        let board = board_from_str_array(&["R.R"]).unwrap();
        let heuristic = |b: &BoardState, depth: usize| (pieces_heuristic(b) + depth) as f64;
        assert_eq!(heuristic.estimate(&board, 2), 3.0);
    }

    #[test]
    fn test_parse_terms() {
        let heuristic = parse_terms("pieces:100, distance:1,uniformity").unwrap();
        let names: Vec<&str> = heuristic.terms().iter().map(Term::name).collect();
        assert_eq!(names, vec!["pieces", "distance", "uniformity"]);
        assert_eq!(heuristic.terms()[0].weight().at(0), 100.0);
        assert_eq!(heuristic.terms()[2].weight().at(0), 1.0);

        let heuristic = parse_terms("repulsion:-0.2").unwrap();
        assert_eq!(heuristic.terms()[0].weight().at(5), -0.2);
    }

    #[test]
    fn test_parse_terms_errors() {
        assert_eq!(
            parse_terms("speed:3").unwrap_err(),
            HeuristicParseError::UnknownTerm("speed".to_string())
        );
        assert_eq!(
            parse_terms("pieces:lots").unwrap_err(),
            HeuristicParseError::InvalidWeight("lots".to_string())
        );
        assert_eq!(parse_terms(" , ").unwrap_err(), HeuristicParseError::Empty);
    }

    #[test]
    fn test_display_lists_terms() {
        let heuristic = parse_terms("pieces:100,distance:1").unwrap();
        assert_eq!(heuristic.to_string(), "pieces(x100) + distance(x1)");
    }
}
