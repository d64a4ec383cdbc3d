use std::ops::Deref;

use super::error::{QRError, QRResult};

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub const ALL: [MaskPattern; 8] = [
        MaskPattern(0),
        MaskPattern(1),
        MaskPattern(2),
        MaskPattern(3),
        MaskPattern(4),
        MaskPattern(5),
        MaskPattern(6),
        MaskPattern(7),
    ];

    // Unchecked, the pattern is validated when a symbol is built
    pub fn new(pattern: u8) -> Self {
        Self(pattern)
    }

    pub fn try_new(pattern: u8) -> QRResult<Self> {
        if pattern < 8 {
            Ok(Self(pattern))
        } else {
            Err(QRError::InvalidMaskingPattern(pattern))
        }
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// x is the column, y the row
mod mask_functions {
    pub fn checkerboard(x: i32, y: i32) -> bool {
        (x + y) & 1 == 0
    }

    pub fn horizontal_lines(_: i32, y: i32) -> bool {
        y & 1 == 0
    }

    pub fn vertical_lines(x: i32, _: i32) -> bool {
        x % 3 == 0
    }

    pub fn diagonal_lines(x: i32, y: i32) -> bool {
        (x + y) % 3 == 0
    }

    pub fn large_checkerboard(x: i32, y: i32) -> bool {
        ((y >> 1) + (x / 3)) & 1 == 0
    }

    pub fn fields(x: i32, y: i32) -> bool {
        ((x * y) & 1) + ((x * y) % 3) == 0
    }

    pub fn diamonds(x: i32, y: i32) -> bool {
        (((x * y) & 1) + ((x * y) % 3)) & 1 == 0
    }

    pub fn meadow(x: i32, y: i32) -> bool {
        (((x + y) & 1) + ((x * y) % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_functions(self) -> fn(i32, i32) -> bool {
        match *self {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            0b111 => mask_functions::meadow,
            _ => unreachable!(),
        }
    }

    /// Rendered value of a raw bit at column `x`, row `y` of the core symbol.
    ///
    /// Masking is an involution, so the same call also recovers the raw bit from a
    /// rendered one.
    pub fn apply(self, x: i32, y: i32, bit: bool) -> bool {
        bit ^ (self.mask_functions())(x, y)
    }
}

#[cfg(test)]
mod mask_tests {
    use test_case::test_case;

    use super::MaskPattern;

    // Top-left 6x6 patch of each pattern, '#' where the formula holds
    #[test_case(0, ["#.#.#.", ".#.#.#", "#.#.#.", ".#.#.#", "#.#.#.", ".#.#.#"])]
    #[test_case(1, ["######", "......", "######", "......", "######", "......"])]
    #[test_case(2, ["#..#..", "#..#..", "#..#..", "#..#..", "#..#..", "#..#.."])]
    #[test_case(3, ["#..#..", "..#..#", ".#..#.", "#..#..", "..#..#", ".#..#."])]
    #[test_case(4, ["###...", "###...", "...###", "...###", "###...", "###..."])]
    #[test_case(5, ["######", "#.....", "#..#..", "#.#.#.", "#..#..", "#....."])]
    #[test_case(6, ["######", "###...", "##.##.", "#.#.#.", "#.##.#", "#...##"])]
    #[test_case(7, ["#.#.#.", "...###", "#...##", ".#.#.#", "###...", ".###.."])]
    fn test_mask_functions(pattern: u8, exp: [&str; 6]) {
        let mask_fn = MaskPattern::new(pattern).mask_functions();
        for (y, row) in exp.iter().enumerate() {
            let got: String =
                (0..6).map(|x| if mask_fn(x, y as i32) { '#' } else { '.' }).collect();
            assert_eq!(&got, row, "pattern {pattern}, row {y}");
        }
    }

    #[test]
    fn test_apply_is_involution() {
        for mask in MaskPattern::ALL {
            for (x, y) in [(0, 0), (3, 7), (20, 11), (176, 176)] {
                for bit in [false, true] {
                    assert_eq!(mask.apply(x, y, mask.apply(x, y, bit)), bit);
                }
            }
        }
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(MaskPattern::try_new(8).is_err());
        assert_eq!(*MaskPattern::try_new(7).unwrap(), 7);
    }
}
