use image::{GrayImage, Luma};

use super::overlay::{ge, lt, DotGeometry};
use crate::common::{
    codeword::{codeword_mut, Codeword, CodewordGroup, CodewordKind, CodewordRef},
    error::{QRError, QRResult},
    iter::EncRegionIter,
    mask::MaskPattern,
    metadata::{ECLevel, FormatInfo, Version, FORMAT_INFO_BIT_LEN, VERSION_INFO_BIT_LEN},
};

// Module
//------------------------------------------------------------------------------

/// Codeword bit placed in the encoding region. `bit` is the unmasked value; `r` and `c`
/// are core coordinates, which is what the mask is evaluated on.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Masked {
    pub bit: bool,
    pub r: i16,
    pub c: i16,
    pub owner: CodewordRef,
    // Bit index inside the owning codeword, most significant first
    pub idx: u8,
}

impl Masked {
    pub fn value(&self, mask: MaskPattern) -> bool {
        mask.apply(self.c as i32, self.r as i32, self.bit)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Module {
    Empty,
    Bezel,
    Finder(bool),
    Timing(bool),
    Alignment(bool),
    Dark,
    // Bit m holds the module's value under mask m
    Format(u8),
    Version(bool),
    Message(Masked),
    Stuff(Masked),
    Correction(Masked),
    Remainder,
}

impl Module {
    /// Rendered value, true being dark.
    pub fn value(&self, mask: MaskPattern) -> bool {
        match self {
            Self::Empty | Self::Bezel | Self::Remainder => false,
            Self::Dark => true,
            Self::Finder(v) | Self::Timing(v) | Self::Alignment(v) | Self::Version(v) => *v,
            Self::Format(masks) => (masks >> *mask) & 1 == 1,
            Self::Message(m) | Self::Stuff(m) | Self::Correction(m) => m.value(mask),
        }
    }

    pub fn masked(&self) -> Option<&Masked> {
        match self {
            Self::Message(m) | Self::Stuff(m) | Self::Correction(m) => Some(m),
            _ => None,
        }
    }

    pub fn masked_mut(&mut self) -> Option<&mut Masked> {
        match self {
            Self::Message(m) | Self::Stuff(m) | Self::Correction(m) => Some(m),
            _ => None,
        }
    }
}

// Matrix
//------------------------------------------------------------------------------

/// Module grid of a symbol surrounded by `bezel` rings of decorative modules.
///
/// `get`, `set` and friends take core coordinates, which exclude the bezel and wrap
/// negative values from the far edge. `cell` takes full grid coordinates.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Matrix {
    grid: Vec<Module>,
    w: usize,
    ver: Version,
    bezel: usize,
}

impl Matrix {
    pub fn new(ver: Version) -> Self {
        let w = ver.width();
        Self { grid: vec![Module::Empty; w * w], w, ver, bezel: 0 }
    }

    /// Runs every construction stage and places the codewords in `order`.
    pub fn build(
        ver: Version,
        ecl: ECLevel,
        order: &[CodewordRef],
        groups: &mut [CodewordGroup],
    ) -> QRResult<Self> {
        let mut matrix = Self::new(ver);
        matrix.draw_all_function_patterns();
        matrix.draw_dark_module();
        matrix.draw_format_info(ecl);
        matrix.draw_version_info();
        matrix.draw_codewords(order, groups)?;
        Ok(matrix)
    }

    pub fn grid(&self) -> &[Module] {
        &self.grid
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    // Full width, bezel included
    pub fn width(&self) -> usize {
        self.w
    }

    pub fn core_width(&self) -> usize {
        self.ver.width()
    }

    pub fn bezel(&self) -> usize {
        self.bezel
    }

    pub fn count_dark_modules(&self, mask: MaskPattern) -> usize {
        self.grid.iter().filter(|m| m.value(mask)).count()
    }

    #[cfg(test)]
    pub fn to_debug_str(&self) -> String {
        let w = self.w;
        let mut res = String::with_capacity(w * (w + 1) + 1);
        res.push('\n');
        for i in 0..w {
            for j in 0..w {
                let c = match self.cell(i, j) {
                    Module::Empty => '.',
                    Module::Bezel => '-',
                    Module::Finder(true) => 'f',
                    Module::Finder(false) => 'F',
                    Module::Timing(true) => 't',
                    Module::Timing(false) => 'T',
                    Module::Alignment(true) => 'a',
                    Module::Alignment(false) => 'A',
                    Module::Dark => 'k',
                    // Shown as laid out for mask 0
                    Module::Format(masks) if masks & 1 == 1 => 'm',
                    Module::Format(_) => 'M',
                    Module::Version(true) => 'v',
                    Module::Version(false) => 'V',
                    Module::Message(m) if m.bit => 'd',
                    Module::Message(_) => 'D',
                    Module::Stuff(m) if m.bit => 's',
                    Module::Stuff(_) => 'S',
                    Module::Correction(m) if m.bit => 'e',
                    Module::Correction(_) => 'E',
                    Module::Remainder => 'r',
                };
                res.push(c);
            }
            res.push('\n');
        }
        res
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.core_width() as i16;
        debug_assert!(-w <= r && r < w, "row should be greater than or equal to w");
        debug_assert!(-w <= c && c < w, "column should be greater than or equal to w");

        let r = r.rem_euclid(w) as usize + self.bezel;
        let c = c.rem_euclid(w) as usize + self.bezel;
        r * self.w + c
    }

    pub fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.coord_to_index(r, c)]
    }

    pub fn get_mut(&mut self, r: i16, c: i16) -> &mut Module {
        let index = self.coord_to_index(r, c);
        &mut self.grid[index]
    }

    pub fn set(&mut self, r: i16, c: i16, module: Module) {
        *self.get_mut(r, c) = module;
    }

    pub fn cell(&self, row: usize, col: usize) -> Module {
        debug_assert!(row < self.w && col < self.w, "Cell out of bounds: {row} {col}");
        self.grid[row * self.w + col]
    }

    pub fn value_at(&self, row: usize, col: usize, mask: MaskPattern) -> bool {
        self.cell(row, col).value(mask)
    }
}

#[cfg(test)]
mod matrix_util_tests {
    use super::{Matrix, Module};
    use crate::common::{mask::MaskPattern, metadata::Version};

    #[test]
    fn test_index_wrap() {
        let mut mx = Matrix::new(Version::new(1).unwrap());
        let w = mx.w as i16;
        mx.set(-1, -1, Module::Dark);
        assert_eq!(mx.get(w - 1, w - 1), Module::Dark);
        mx.set(0, 0, Module::Finder(true));
        assert_eq!(mx.get(-w, -w), Module::Finder(true));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_row_out_of_bound() {
        let mx = Matrix::new(Version::new(1).unwrap());
        let w = mx.w as i16;
        mx.get(w, 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_col_index_overwrap() {
        let mx = Matrix::new(Version::new(1).unwrap());
        let w = mx.w as i16;
        mx.get(0, -(w + 1));
    }

    #[test]
    fn test_format_module_value() {
        let m = Module::Format(0b1000_0010);
        assert!(m.value(MaskPattern::new(1)));
        assert!(m.value(MaskPattern::new(7)));
        assert!(!m.value(MaskPattern::new(0)));
    }
}

// Finder pattern
//------------------------------------------------------------------------------

impl Matrix {
    fn draw_finder_patterns(&mut self) {
        self.draw_finder_pattern_at(3, 3);
        self.draw_finder_pattern_at(3, -4);
        self.draw_finder_pattern_at(-4, 3);
    }

    // Includes the separator
    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let (dr_left, dr_right) = if r > 0 { (-3, 4) } else { (-4, 3) };
        let (dc_top, dc_bottom) = if c > 0 { (-3, 4) } else { (-4, 3) };
        for i in dr_left..=dr_right {
            for j in dc_top..=dc_bottom {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (4 | -4, _) | (_, 4 | -4) => Module::Finder(false),
                        (3 | -3, _) | (_, 3 | -3) => Module::Finder(true),
                        (2 | -2, _) | (_, 2 | -2) => Module::Finder(false),
                        _ => Module::Finder(true),
                    },
                );
            }
        }
    }
}


// Timing pattern
//------------------------------------------------------------------------------

impl Matrix {
    fn draw_timing_pattern(&mut self) {
        let w = self.core_width() as i16;
        self.draw_line(6, 8, 6, w - 9);
        self.draw_line(8, 6, w - 9, 6);
    }

    fn draw_line(&mut self, r1: i16, c1: i16, r2: i16, c2: i16) {
        debug_assert!(r1 == r2 || c1 == c2, "Line is neither vertical nor horizontal");

        if r1 == r2 {
            for j in c1..=c2 {
                self.set(r1, j, Module::Timing(j & 1 == 0));
            }
        } else {
            for i in r1..=r2 {
                self.set(i, c1, Module::Timing(i & 1 == 0));
            }
        }
    }
}


// Alignment pattern
//------------------------------------------------------------------------------

impl Matrix {
    fn draw_alignment_patterns(&mut self) {
        let poses = self.ver.alignment_pattern();
        for &r in &poses {
            for &c in &poses {
                self.draw_alignment_pattern_at(r, c)
            }
        }
    }

    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        let w = self.core_width() as i16;
        if (r == 6 && (c == 6 || c - w == -7)) || (r - w == -7 && c == 6) {
            return;
        }
        for i in -2..=2 {
            for j in -2..=2 {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (-2 | 2, _) | (_, -2 | 2) | (0, 0) => Module::Alignment(true),
                        _ => Module::Alignment(false),
                    },
                )
            }
        }
    }
}


// All function patterns
//------------------------------------------------------------------------------

impl Matrix {
    pub fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_pattern();
        self.draw_alignment_patterns();
    }

    fn draw_dark_module(&mut self) {
        self.set(-8, 8, Module::Dark);
    }
}

// Format & version info
//------------------------------------------------------------------------------

impl Matrix {
    fn draw_format_info(&mut self, ecl: ECLevel) {
        let info = FormatInfo::new(ecl);
        for i in 0..FORMAT_INFO_BIT_LEN {
            let module = Module::Format(info.masks(i));
            let (r, c) = FORMAT_INFO_COORDS_MAIN[i];
            self.set(r, c, module);
            let (r, c) = FORMAT_INFO_COORDS_SIDE[i];
            self.set(r, c, module);
        }
    }

    fn draw_version_info(&mut self) {
        if let Some(info) = self.ver.info() {
            self.draw_number(info, VERSION_INFO_BIT_LEN, &VERSION_INFO_COORDS_BL);
            self.draw_number(info, VERSION_INFO_BIT_LEN, &VERSION_INFO_COORDS_TR);
        }
    }

    fn draw_number(&mut self, number: u32, bit_len: usize, coords: &[(i16, i16)]) {
        let mut mask = 1 << (bit_len - 1);
        for &(r, c) in coords {
            self.set(r, c, Module::Version(number & mask != 0));
            mask >>= 1;
        }
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl Matrix {
    /// Places codewords in transmission order along the zigzag walk, skipping every cell
    /// that is already taken, then marks the leftover cells as remainder bits. Each
    /// codeword's `positions` is rewritten with the cells it landed on.
    pub fn draw_codewords(
        &mut self,
        order: &[CodewordRef],
        groups: &mut [CodewordGroup],
    ) -> QRResult<()> {
        let free = EncRegionIter::new(self.ver)
            .filter(|&(r, c)| matches!(self.get(r, c), Module::Empty))
            .collect::<Vec<_>>();
        let capacity = free.len();
        let bit_cnt = order.len() * 8;
        if bit_cnt > capacity {
            return Err(QRError::CodewordOverflow { codewords: order.len(), capacity });
        }
        if capacity - bit_cnt != self.ver.remainder_bits() {
            return Err(QRError::CodewordUnderflow { codewords: order.len(), capacity });
        }

        let mut cells = free.into_iter();
        for &owner in order {
            let cw = codeword_mut(groups, owner);
            cw.positions.clear();
            for (idx, (r, c)) in cells.by_ref().take(8).enumerate() {
                let masked = Masked { bit: cw.bit(idx), r, c, owner, idx: idx as u8 };
                let module = match cw.kind {
                    CodewordKind::Message => Module::Message(masked),
                    CodewordKind::Stuff => Module::Stuff(masked),
                    CodewordKind::Correction => Module::Correction(masked),
                };
                cw.positions.push((r, c));
                self.set(r, c, module);
            }
        }
        for (r, c) in cells {
            self.set(r, c, Module::Remainder);
        }

        debug_assert!(!self.grid.contains(&Module::Empty), "Empty module found after placement");
        Ok(())
    }
}


// Bezel
//------------------------------------------------------------------------------

impl Matrix {
    /// Surrounds the core with `bezel` rings of bezel modules. The grid is rebuilt from the
    /// core each time, so the result only depends on the final width. With a non-empty
    /// bezel, the seams next to the three finder patterns are extended with light finder
    /// modules.
    pub fn set_bezel(&mut self, bezel: usize) {
        if bezel == self.bezel {
            return;
        }

        let cw = self.core_width();
        let w = cw + 2 * bezel;
        let mut grid = vec![Module::Bezel; w * w];
        for r in 0..cw {
            let src = (r + self.bezel) * self.w + self.bezel;
            let dst = (r + bezel) * w + bezel;
            grid[dst..dst + cw].copy_from_slice(&self.grid[src..src + cw]);
        }

        if bezel > 0 {
            let (b, len) = (bezel, w);
            for i in 0..9 {
                for (r, c) in [
                    (b - 1, b - 1 + i),
                    (b - 1 + i, b - 1),
                    (len - b, b - 1 + i),
                    (b - 1 + i, len - b),
                    (b - 1, len - b - i),
                    (len - b - i, b - 1),
                ] {
                    grid[r * w + c] = Module::Finder(false);
                }
            }
        }

        self.grid = grid;
        self.w = w;
        self.bezel = bezel;
    }
}


// Safe areas
//------------------------------------------------------------------------------

impl Matrix {
    /// Whether artwork may be drawn at the point `(x, y)` in full module coordinates,
    /// `x` being the column. Points over stuff, remainder or bezel modules are always
    /// safe. Around finder patterns only the margin beyond the pattern's rendered edge is
    /// safe. Elsewhere only the area outside the module's central dot is safe.
    pub fn is_safe(&self, x: f64, y: f64, geometry: DotGeometry) -> bool {
        let len = self.w as f64;
        if x < 0.0 || y < 0.0 || x >= len || y >= len {
            return true;
        }
        match self.cell(y as usize, x as usize) {
            Module::Bezel | Module::Stuff(_) | Module::Remainder => true,
            Module::Finder(_) => self.is_finder_safe(x, y, geometry),
            _ => geometry.outside_dot(x, y),
        }
    }

    fn is_finder_safe(&self, x: f64, y: f64, geometry: DotGeometry) -> bool {
        let b = self.bezel as f64;
        let len = self.w as f64;
        let dist = 0.5 * geometry.dot_ratio() + 0.5;
        let before = |v: f64| lt(v, b - dist);
        let after_near = |v: f64| ge(v, b + 7.0 + dist) && lt(v, b + 8.0);
        let before_far = |v: f64| ge(v, len - b - 8.0) && lt(v, len - b - 7.0 - dist);
        let after = |v: f64| ge(v, len - b + dist);
        [x, y].into_iter().any(|v| before(v) || after_near(v) || before_far(v) || after(v))
    }
}


// Read back
//------------------------------------------------------------------------------

impl Matrix {
    /// Rendered bits of the main and side format info copies, most significant first.
    pub fn read_format_info(&self, mask: MaskPattern) -> (u32, u32) {
        (
            self.read_number(&FORMAT_INFO_COORDS_MAIN, mask),
            self.read_number(&FORMAT_INFO_COORDS_SIDE, mask),
        )
    }

    /// Rendered bits of the bottom left and top right version info copies.
    pub fn read_version_info(&self, mask: MaskPattern) -> (u32, u32) {
        (
            self.read_number(&VERSION_INFO_COORDS_BL, mask),
            self.read_number(&VERSION_INFO_COORDS_TR, mask),
        )
    }

    fn read_number(&self, coords: &[(i16, i16)], mask: MaskPattern) -> u32 {
        coords.iter().fold(0, |acc, &(r, c)| (acc << 1) | self.get(r, c).value(mask) as u32)
    }

    /// Reads the codeword stream in placement order off the modules rendered with `mask`,
    /// then removes `unmask` from every bit.
    pub fn read_codewords(&self, mask: MaskPattern, unmask: MaskPattern) -> Vec<u8> {
        let bits = EncRegionIter::new(self.ver)
            .filter_map(|(r, c)| {
                let m = self.get(r, c);
                m.masked().map(|_| unmask.apply(c as i32, r as i32, m.value(mask)))
            })
            .collect::<Vec<_>>();
        bits.chunks_exact(8).map(|b| Codeword::from_bits(b.iter().copied())).collect()
    }
}


// Render
//------------------------------------------------------------------------------

const QUIET_ZONE: u32 = 4;

impl Matrix {
    pub fn render(&self, mask: MaskPattern, module_sz: u32) -> GrayImage {
        let qz_sz = QUIET_ZONE * module_sz;
        let qr_sz = self.w as u32 * module_sz;
        let total_sz = qz_sz + qr_sz + qz_sz;

        let mut canvas = GrayImage::new(total_sz, total_sz);
        for i in 0..total_sz {
            for j in 0..total_sz {
                if i < qz_sz || i >= qz_sz + qr_sz || j < qz_sz || j >= qz_sz + qr_sz {
                    canvas.put_pixel(j, i, Luma([255]));
                    continue;
                }
                let r = ((i - qz_sz) / module_sz) as usize;
                let c = ((j - qz_sz) / module_sz) as usize;
                let pixel = if self.value_at(r, c, mask) { Luma([0]) } else { Luma([255]) };
                canvas.put_pixel(j, i, pixel);
            }
        }

        canvas
    }

    pub fn to_str(&self, mask: MaskPattern, module_sz: usize) -> String {
        let qz_sz = QUIET_ZONE as usize * module_sz;
        let qr_sz = self.w * module_sz;
        let total_sz = qz_sz + qr_sz + qz_sz;

        let mut canvas = String::new();
        for i in 0..total_sz {
            for j in 0..total_sz {
                if i < qz_sz || i >= qz_sz + qr_sz || j < qz_sz || j >= qz_sz + qr_sz {
                    canvas.push('█');
                    continue;
                }
                let r = (i - qz_sz) / module_sz;
                let c = (j - qz_sz) / module_sz;
                canvas.push(if self.value_at(r, c, mask) { ' ' } else { '█' });
            }
            canvas.push('\n');
        }

        canvas
    }
}

// Global constants
//------------------------------------------------------------------------------

static FORMAT_INFO_COORDS_MAIN: [(i16, i16); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

static FORMAT_INFO_COORDS_SIDE: [(i16, i16); 15] = [
    (-1, 8),
    (-2, 8),
    (-3, 8),
    (-4, 8),
    (-5, 8),
    (-6, 8),
    (-7, 8),
    (8, -8),
    (8, -7),
    (8, -6),
    (8, -5),
    (8, -4),
    (8, -3),
    (8, -2),
    (8, -1),
];

static VERSION_INFO_COORDS_BL: [(i16, i16); 18] = [
    (-9, 5),
    (-10, 5),
    (-11, 5),
    (-9, 4),
    (-10, 4),
    (-11, 4),
    (-9, 3),
    (-10, 3),
    (-11, 3),
    (-9, 2),
    (-10, 2),
    (-11, 2),
    (-9, 1),
    (-10, 1),
    (-11, 1),
    (-9, 0),
    (-10, 0),
    (-11, 0),
];

static VERSION_INFO_COORDS_TR: [(i16, i16); 18] = [
    (5, -9),
    (5, -10),
    (5, -11),
    (4, -9),
    (4, -10),
    (4, -11),
    (3, -9),
    (3, -10),
    (3, -11),
    (2, -9),
    (2, -10),
    (2, -11),
    (1, -9),
    (1, -10),
    (1, -11),
    (0, -9),
    (0, -10),
    (0, -11),
];
