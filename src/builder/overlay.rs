use std::collections::BTreeSet;
use std::ops::Range;

use log::{trace, warn};

use super::matrix::{Matrix, Module};
use crate::common::{
    codeword::{block_mut, codeword_mut, BlockId, Codeword, CodewordGroup, CodewordRef},
    error::{QRError, QRResult},
    mask::MaskPattern,
};

// Tolerance
//------------------------------------------------------------------------------

const TOLERANCE: f64 = 1e-6;

// Bound on the overlay anchor in sub-cells (2^40)
const ANCHOR_LIMIT: f64 = 1_099_511_627_776.0;

pub(crate) fn eq(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE
}

pub(crate) fn lt(a: f64, b: f64) -> bool {
    !eq(a, b) && a < b
}

pub(crate) fn ge(a: f64, b: f64) -> bool {
    eq(a, b) || a > b
}

// Dot geometry
//------------------------------------------------------------------------------

/// Each module is split into `subdivision × subdivision` sub-cells, one per overlay
/// pixel. The module's value is drawn as the central `dot_size × dot_size` sub-cells.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct DotGeometry {
    subdivision: usize,
    dot_size: usize,
}

impl DotGeometry {
    pub fn new(subdivision: usize, dot_size: usize) -> QRResult<Self> {
        // The dot has to sit on whole sub-cells in the centre
        if dot_size == 0 || dot_size > subdivision || (subdivision - dot_size) % 2 != 0 {
            return Err(QRError::InvalidSubdivision { subdivision, dot_size });
        }
        Ok(Self { subdivision, dot_size })
    }

    pub fn subdivision(&self) -> usize {
        self.subdivision
    }

    pub fn dot_size(&self) -> usize {
        self.dot_size
    }

    pub fn dot_ratio(&self) -> f64 {
        self.dot_size as f64 / self.subdivision as f64
    }

    // Sub-cell range of the dot along either axis
    fn dot_range(&self) -> Range<usize> {
        let min = (self.subdivision - self.dot_size) / 2;
        min..min + self.dot_size
    }

    /// Whether a fractional point lies outside the central dot of its module.
    pub fn outside_dot(&self, x: f64, y: f64) -> bool {
        let size = self.dot_ratio();
        let dist = (1.0 - size) / 2.0;
        let (fx, fy) = (x.fract(), y.fract());
        lt(fx, dist) || lt(fy, dist) || ge(fx, dist + size) || ge(fy, dist + size)
    }
}

impl Default for DotGeometry {
    fn default() -> Self {
        Self { subdivision: 3, dot_size: 1 }
    }
}

#[cfg(test)]
mod dot_geometry_tests {
    use test_case::test_case;

    use super::DotGeometry;
    use crate::common::error::QRError;

    #[test_case(3, 1, true)]
    #[test_case(1, 1, true)]
    #[test_case(4, 2, true)]
    #[test_case(5, 3, true)]
    #[test_case(3, 2, false)]
    #[test_case(2, 3, false)]
    #[test_case(3, 0, false)]
    fn test_new(subdivision: usize, dot_size: usize, valid: bool) {
        let res = DotGeometry::new(subdivision, dot_size);
        if valid {
            assert!(res.is_ok());
        } else {
            assert_eq!(res, Err(QRError::InvalidSubdivision { subdivision, dot_size }));
        }
    }

    #[test]
    fn test_dot_range() {
        assert_eq!(DotGeometry::new(3, 1).unwrap().dot_range(), 1..2);
        assert_eq!(DotGeometry::new(5, 3).unwrap().dot_range(), 1..4);
        assert_eq!(DotGeometry::new(1, 1).unwrap().dot_range(), 0..1);
    }

    #[test]
    fn test_outside_dot() {
        let geom = DotGeometry::new(5, 1).unwrap();
        assert!(!geom.outside_dot(2.5, 7.5));
        assert!(!geom.outside_dot(2.4, 7.4));
        assert!(geom.outside_dot(2.6, 7.5));
        assert!(geom.outside_dot(2.5, 7.39));
        // A full sized dot leaves nothing outside
        let geom = DotGeometry::new(3, 3).unwrap();
        assert!(!geom.outside_dot(0.0, 0.0));
        assert!(!geom.outside_dot(0.99, 0.5));
    }
}

// Overlay
//------------------------------------------------------------------------------

/// Artwork laid over the symbol. Pixels are sub-cells of a module; `None` means the
/// pixel doesn't care. `origin` is the top left corner in full matrix module coordinates
/// (column, row), snapped to the nearest sub-cell when applied.
#[derive(Debug, PartialEq, Clone)]
pub struct Overlay {
    origin: (f64, f64),
    width: usize,
    height: usize,
    pixels: Vec<Option<bool>>,
}

impl Overlay {
    pub fn new(origin: (f64, f64), width: usize, height: usize) -> Self {
        Self { origin, width, height, pixels: vec![None; width * height] }
    }

    /// Builds an overlay from text rows, `#` being dark, `.` light and anything else unset.
    pub fn from_rows(origin: (f64, f64), rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut overlay = Self::new(origin, width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let px = match ch {
                    '#' => Some(true),
                    '.' => Some(false),
                    _ => None,
                };
                overlay.set(x, y, px);
            }
        }
        overlay
    }

    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set(&mut self, x: usize, y: usize, px: Option<bool>) {
        debug_assert!(x < self.width && y < self.height, "Pixel out of bounds: {x} {y}");
        self.pixels[y * self.width + x] = px;
    }

    pub fn get(&self, x: i64, y: i64) -> Option<bool> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        self.pixels[y as usize * self.width + x as usize]
    }

    // Origin in sub-cell units
    fn anchor(&self, sub: usize) -> (i64, i64) {
        let snap = |v: f64| (v * sub as f64).round().clamp(-ANCHOR_LIMIT, ANCHOR_LIMIT) as i64;
        (snap(self.origin.0), snap(self.origin.1))
    }

    // Rows and columns of full matrix modules the overlay reaches
    fn footprint(&self, sub: usize) -> (Range<i64>, Range<i64>) {
        let (ox, oy) = self.anchor(sub);
        let sub = sub as i64;
        let span = |start: i64, len: usize| {
            start.div_euclid(sub)..(start + len as i64 + sub - 1).div_euclid(sub)
        };
        (span(oy, self.height), span(ox, self.width))
    }

    /// Overlay value for the module at full coordinates `(row, col)`, voted over the
    /// sub-cells of its dot. Unset pixels vote for `base`, the module's current rendered
    /// value, and ties go to dark. `None` when no pixel in the dot is set.
    pub fn vote(&self, row: usize, col: usize, geometry: DotGeometry, base: bool) -> Option<bool> {
        let sub = geometry.subdivision();
        let (ox, oy) = self.anchor(sub);
        let (x0, y0) = ((col * sub) as i64 - ox, (row * sub) as i64 - oy);

        let mut score = 0i32;
        let mut touched = false;
        for iy in geometry.dot_range() {
            for ix in geometry.dot_range() {
                let px = self.get(x0 + ix as i64, y0 + iy as i64);
                touched |= px.is_some();
                score += if px.unwrap_or(base) { 1 } else { -1 };
            }
        }
        touched.then_some(score >= 0)
    }
}

// Stuffing recompute
//------------------------------------------------------------------------------

/// Drives the stuffing modules under `overlay` towards the overlay's values, then
/// recomputes the touched stuffing codewords and regenerates the correction codewords of
/// every block they belong to. Returns the regenerated blocks.
pub fn apply_overlay(
    matrix: &mut Matrix,
    groups: &mut [CodewordGroup],
    overlay: &Overlay,
    geometry: DotGeometry,
    mask: MaskPattern,
) -> BTreeSet<BlockId> {
    let bezel = matrix.bezel() as i64;
    let core = matrix.core_width() as i64;
    let (rows, cols) = overlay.footprint(geometry.subdivision());
    let rows = rows.start.max(bezel)..rows.end.min(bezel + core);
    let cols = cols.start.max(bezel)..cols.end.min(bezel + core);

    let mut touched = BTreeSet::new();
    for row in rows {
        for col in cols.clone() {
            let (r, c) = ((row - bezel) as i16, (col - bezel) as i16);
            let Module::Stuff(m) = matrix.get(r, c) else {
                continue;
            };
            let base = m.value(mask);
            let Some(desired) = overlay.vote(row as usize, col as usize, geometry, base) else {
                continue;
            };
            if let Some(m) = matrix.get_mut(r, c).masked_mut() {
                m.bit = mask.apply(c as i32, r as i32, desired);
            }
            touched.insert(m.owner);
        }
    }

    if touched.is_empty() {
        warn!("Overlay touched no stuffing module");
        return BTreeSet::new();
    }

    for &owner in &touched {
        let cw = codeword_mut(groups, owner);
        cw.value = read_codeword(matrix, &cw.positions);
    }

    let blocks = touched.iter().map(|r: &CodewordRef| r.block).collect::<BTreeSet<_>>();
    for &id in &blocks {
        trace!("Regenerating correction codewords of block {id}");
        let blk = block_mut(groups, id);
        blk.regenerate_ecc();
        for cw in &blk.ecc {
            for (i, &(r, c)) in cw.positions.iter().enumerate() {
                if let Some(m) = matrix.get_mut(r, c).masked_mut() {
                    m.bit = cw.bit(i);
                }
            }
        }
    }
    blocks
}

// Raw, unmasked codeword value stored at `positions`
fn read_codeword(matrix: &Matrix, positions: &[(i16, i16)]) -> u8 {
    Codeword::from_bits(
        positions.iter().map(|&(r, c)| matrix.get(r, c).masked().is_some_and(|m| m.bit)),
    )
}

#[cfg(test)]
mod overlay_tests {
    use test_case::test_case;

    use super::{apply_overlay, DotGeometry, Overlay};
    use crate::builder::matrix::{Matrix, Module};
    use crate::common::{
        capacity::EncodingProperty,
        codeword::{codeword, group_codewords, interleave, CodewordGroup, CodewordKind},
        ec,
        mask::MaskPattern,
        metadata::{ECLevel, Version},
    };

    fn hello_world() -> (Matrix, Vec<CodewordGroup>) {
        let prop = EncodingProperty::new([7, 1, 19, 0, 0]);
        let bytes = [
            0x20, 0x5b, 0x0b, 0x78, 0xd1, 0x72, 0xdc, 0x4d, 0x43, 0x40, 0xec, 0x11, 0xec, 0x11,
            0xec, 0x11, 0xec, 0x11, 0xec,
        ];
        let mut groups = group_codewords(&bytes, 10, &prop).unwrap();
        let order = interleave(&groups);
        let mx = Matrix::build(Version::new(1).unwrap(), ECLevel::L, &order, &mut groups).unwrap();
        (mx, groups)
    }

    fn filled(len: usize, ch: char) -> Vec<String> {
        vec![ch.to_string().repeat(len); len]
    }

    #[test]
    fn test_from_rows() {
        let overlay = Overlay::from_rows((1.0, 2.0), &["#.", " #", "."]);
        assert_eq!((overlay.width(), overlay.height()), (2, 3));
        assert_eq!(overlay.get(0, 0), Some(true));
        assert_eq!(overlay.get(1, 0), Some(false));
        assert_eq!(overlay.get(0, 1), None);
        assert_eq!(overlay.get(1, 2), None);
        assert_eq!(overlay.get(-1, 0), None);
        assert_eq!(overlay.get(0, 3), None);
    }

    #[test]
    fn test_vote() {
        let geom = DotGeometry::new(3, 1).unwrap();
        // Covers module (1, 1) and half of module (2, 1)
        let overlay = Overlay::from_rows((1.0, 1.0), &["   ", " # ", "   ", "   ", " . "]);
        assert_eq!(overlay.vote(1, 1, geom, false), Some(true));
        assert_eq!(overlay.vote(2, 1, geom, true), Some(false));
        assert_eq!(overlay.vote(0, 0, geom, true), None);
        assert_eq!(overlay.vote(1, 2, geom, true), None);
    }

    #[test]
    fn test_vote_unset_pixels_follow_base() {
        let geom = DotGeometry::new(4, 2).unwrap();
        // Dot of module (0, 0) is sub-cells 1..3 on both axes
        let overlay = Overlay::from_rows((0.0, 0.0), &["    ", " .  ", "    "]);
        assert_eq!(overlay.vote(0, 0, geom, false), Some(false));
        // Three unset pixels outvote the light one
        assert_eq!(overlay.vote(0, 0, geom, true), Some(true));
        // Tie goes to dark
        let overlay = Overlay::from_rows((0.0, 0.0), &["    ", " ## ", " .. "]);
        assert_eq!(overlay.vote(0, 0, geom, false), Some(true));
    }

    #[test]
    fn test_fractional_origin() {
        let geom = DotGeometry::new(3, 1).unwrap();
        // Origin snaps to sub-cell (1, 0), so pixel (0, 1) is the centre of module (0, 0)
        let overlay = Overlay::from_rows((1.0 / 3.0, 0.0), &["   ", "#  "]);
        assert_eq!(overlay.vote(0, 0, geom, false), Some(true));
    }

    #[test]
    fn test_apply_dark_overlay() {
        let (mut mx, mut groups) = hello_world();
        let mask = MaskPattern::new(2);
        let rows = filled(21 * 3, '#');
        let rows = rows.iter().map(String::as_str).collect::<Vec<_>>();
        let overlay = Overlay::from_rows((0.0, 0.0), &rows);

        let blocks = apply_overlay(&mut mx, &mut groups, &overlay, DotGeometry::default(), mask);
        assert_eq!(blocks.len(), 1);

        let blk = &groups[0].blocks[0];
        assert_eq!(
            &blk.data_values()[..10],
            [0x20, 0x5b, 0x0b, 0x78, 0xd1, 0x72, 0xdc, 0x4d, 0x43, 0x40]
        );
        assert_eq!(blk.ecc_values(), ec::ecc(&blk.data_values(), 7));
        for m in mx.grid() {
            if let Module::Stuff(_) = m {
                assert!(m.value(mask));
            }
        }
        for cw in blk.data.iter().chain(blk.ecc.iter()) {
            for (i, &(r, c)) in cw.positions.iter().enumerate() {
                assert_eq!(mx.get(r, c).masked().unwrap().bit, cw.bit(i));
            }
        }
        assert!(blk
            .data
            .iter()
            .any(|cw| cw.kind == CodewordKind::Stuff && cw.value != 0xec && cw.value != 0x11));
    }

    #[test]
    fn test_apply_twice() {
        let (mut mx, mut groups) = hello_world();
        let mask = MaskPattern::new(5);
        // Checkerboard of modules with every fourth module row left unset
        let rows = (0..63)
            .map(|y| {
                (0..63)
                    .map(|x| match (y / 3 % 4, (x / 3 + y / 3) % 2) {
                        (3, _) => ' ',
                        (_, 0) => '#',
                        _ => '.',
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>();
        let rows = rows.iter().map(String::as_str).collect::<Vec<_>>();
        let overlay = Overlay::from_rows((0.0, 0.0), &rows);
        let blocks = apply_overlay(&mut mx, &mut groups, &overlay, DotGeometry::default(), mask);
        assert_eq!(blocks.len(), 1);
        let (once_mx, once_groups) = (mx.clone(), groups.clone());
        apply_overlay(&mut mx, &mut groups, &overlay, DotGeometry::default(), mask);
        assert_eq!(mx, once_mx);
        assert_eq!(groups, once_groups);
    }

    #[test]
    fn test_apply_without_stuffing() {
        let (mut mx, mut groups) = hello_world();
        let (orig_mx, orig_groups) = (mx.clone(), groups.clone());
        // Only covers the top left finder
        let overlay = Overlay::from_rows((0.0, 0.0), &["#####"; 5]);
        let mask = MaskPattern::new(0);
        let blocks = apply_overlay(&mut mx, &mut groups, &overlay, DotGeometry::default(), mask);
        assert!(blocks.is_empty());
        assert_eq!(mx, orig_mx);
        assert_eq!(groups, orig_groups);
    }

    #[test_case(1e300, 0.0)]
    #[test_case(0.0, -1e300)]
    #[test_case(f64::INFINITY, f64::NEG_INFINITY)]
    #[test_case(-50.0, 3.0)]
    fn test_apply_outside_symbol(x: f64, y: f64) {
        let (mut mx, mut groups) = hello_world();
        let (orig_mx, orig_groups) = (mx.clone(), groups.clone());
        let rows = filled(9, '#');
        let rows = rows.iter().map(String::as_str).collect::<Vec<_>>();
        let overlay = Overlay::from_rows((x, y), &rows);
        let mask = MaskPattern::new(0);
        let blocks = apply_overlay(&mut mx, &mut groups, &overlay, DotGeometry::default(), mask);
        assert!(blocks.is_empty());
        assert_eq!(mx, orig_mx);
        assert_eq!(groups, orig_groups);
    }

    #[test]
    fn test_apply_with_bezel() {
        let (mut mx, mut groups) = hello_world();
        mx.set_bezel(2);
        let mask = MaskPattern::new(0);
        let rows = filled(25 * 3, '.');
        let rows = rows.iter().map(String::as_str).collect::<Vec<_>>();
        let overlay = Overlay::from_rows((0.0, 0.0), &rows);
        apply_overlay(&mut mx, &mut groups, &overlay, DotGeometry::default(), mask);

        let stuff = groups[0].blocks[0].data.iter().filter(|cw| cw.kind == CodewordKind::Stuff);
        for cw in stuff {
            for &(r, c) in &cw.positions {
                assert!(!mx.get(r, c).value(mask));
            }
        }
        let blk = &groups[0].blocks[0];
        assert_eq!(blk.ecc_values(), ec::ecc(&blk.data_values(), 7));
        for &r in &interleave(&groups) {
            let cw = codeword(&groups, r);
            for (i, &(r, c)) in cw.positions.iter().enumerate() {
                assert_eq!(mx.get(r, c).masked().unwrap().bit, cw.bit(i));
            }
        }
    }
}
