//! Hand-made puzzle boards, from a 3x3 warm-up to 20x10 boards that need a weighted search.
use crate::engine::BoardState;
use crate::error::BoardError;
use crate::utils::board_from_text;

/// `(name, layout)` pairs for every preset, easiest first.
pub const PRESETS: &[(&str, &str)] = &[
    (
        "easy_1",
        "
        .B.
        RGR
        .B.
        ",
    ),
    (
        "medium_1",
        "
        ....
        GBYB
        BB.G
        .R..
        ",
    ),
    (
        "hard_1",
        "
        BB.G
        RRR.
        RRRB
        .GB.
        ",
    ),
    (
        "hard_2",
        "
        ..YY
        BGRY
        G.G.
        RGB.
        ",
    ),
    (
        "hard_3",
        "
        GB.B
        .R..
        .RR.
        BRBG
        ",
    ),
    (
        "medium_big",
        "
RR  R              .
.  Y            R  .
.   G Y    R G Y   .
.   G           R R.
.Y             G   .
.                 YY
.     B            Y
R      R   R  B R  .
.          R G     .
.   RB    Y        .
",
    ),
    (
        "hard_big_1",
        "
RR  R        Y     .
.  Y            R  .
.   G Y B  R G Y   .
.   G           R R.
.Y             GR  .
.                 YY
.     B   B     R  Y
R      RY  R  B R  .
.          R G     .
.   RBB   Y        .
",
    ),
    (
        "hard_big_2",
        "
B GG  RYRB
R     RBY.
GG YGY...
GBR G....
.RY   G  B
...BBR...
GYY  YBY B
RGRBGG...
.RYR  RR.
B      G R
",
    ),
    (
        "hard_big_3",
        "
BGR   Y R.
BRY     GG
R    G Y .
G   BGRB B
. Y YYYB .
. YR  R  R
.  YR YGYG
.G Y  R  B
.B Y GYG .
Y RYGGB Y.
",
    ),
    (
        "hard_big_4",
        "
G   GR   R
YGYBR BB .
BYRG YG  G
R Y   G R.
GR BG RBYY
B R  B RYB
.G BY  BRG
. GRRB RR.
.GYY R  B.
.G  YRBG Y
",
    ),
];

/// Names of every preset, easiest first.
pub fn names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}

/// Parses the preset called `name`.
pub fn by_name(name: &str) -> Result<BoardState, BoardError> {
    let (_, layout) = PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .ok_or_else(|| BoardError::UnknownPreset(name.to_string()))?;
    board_from_text(layout)
}

/// Parses every preset, in order.
pub fn all() -> Result<Vec<(&'static str, BoardState)>, BoardError> {
    PRESETS
        .iter()
        .map(|(name, layout)| Ok((*name, board_from_text(layout)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_parses_and_is_valid() {
        let presets = all().unwrap();
        assert_eq!(presets.len(), PRESETS.len());
        for (name, board) in presets {
            assert_eq!(board.validate(), Ok(()), "preset {}", name);
            assert!(!board.is_win(), "preset {} is already solved", name);
        }
    }

    #[test]
    fn test_preset_dimensions() {
        let easy = by_name("easy_1").unwrap();
        assert_eq!((easy.width(), easy.height()), (3, 3));
        assert_eq!(easy.num_pieces(), 5);

        let big = by_name("hard_big_1").unwrap();
        assert_eq!((big.width(), big.height()), (20, 10));
    }

    #[test]
    fn test_unknown_preset() {
        assert_eq!(
            by_name("impossible_9").unwrap_err(),
            BoardError::UnknownPreset("impossible_9".to_string())
        );
    }

    #[test]
    fn test_names_are_unique() {
        let mut seen: Vec<&str> = names().collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), PRESETS.len());
    }
}
