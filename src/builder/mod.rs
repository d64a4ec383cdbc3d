mod matrix;
mod overlay;

pub use matrix::{Masked, Matrix, Module};
pub use overlay::{apply_overlay, DotGeometry, Overlay};

use std::collections::BTreeSet;

use image::GrayImage;
use log::{debug, info};

use crate::common::{
    capacity::{CapacityTable, EncodingProperty},
    codec::{encode, stuffing_bytes, Mode},
    codeword::{deinterleave, group_codewords, interleave, BlockId, CodewordGroup, CodewordKind},
    ec::Block,
    error::{QRError, QRResult},
    mask::MaskPattern,
    metadata::{decode_format_info, decode_version_info, format_info, ECLevel, Version},
};

pub struct QRBuilder<'a> {
    message: &'a str,
    mode: Option<Mode>,
    version: Version,
    ec_level: ECLevel,
    mask: MaskPattern,
    bezel: usize,
    subdivision: usize,
    dot_size: usize,
}

impl<'a> QRBuilder<'a> {
    pub fn new(message: &'a str) -> Self {
        Self {
            message,
            mode: None,
            version: Version::MIN,
            ec_level: ECLevel::M,
            mask: MaskPattern::new(0),
            bezel: 0,
            subdivision: 3,
            dot_size: 1,
        }
    }

    pub fn message(&mut self, message: &'a str) -> &mut Self {
        self.message = message;
        self
    }

    pub fn mode(&mut self, mode: Mode) -> &mut Self {
        self.mode = Some(mode);
        self
    }

    // Falls back to the narrowest mode fitting the message
    pub fn unset_mode(&mut self) -> &mut Self {
        self.mode = None;
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = version;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = mask;
        self
    }

    pub fn bezel(&mut self, bezel: usize) -> &mut Self {
        self.bezel = bezel;
        self
    }

    pub fn subdivision(&mut self, subdivision: usize) -> &mut Self {
        self.subdivision = subdivision;
        self
    }

    pub fn dot_size(&mut self, dot_size: usize) -> &mut Self {
        self.dot_size = dot_size;
        self
    }

    pub fn metadata(&self) -> String {
        match self.mode {
            Some(m) => format!(
                "{{ Version: {}, Ec level: {:?}, Mode: {:?}, Mask: {} }}",
                *self.version, self.ec_level, m, *self.mask
            ),
            None => format!(
                "{{ Version: {}, Ec level: {:?}, Mode: Auto, Mask: {} }}",
                *self.version, self.ec_level, *self.mask
            ),
        }
    }
}


impl QRBuilder<'_> {
    /// Generates the symbol. The capacity table is only read during this call.
    pub fn build(&self, table: &CapacityTable) -> QRResult<Project> {
        let geometry = DotGeometry::new(self.subdivision, self.dot_size)?;
        let config = Config {
            message: self.message.to_owned(),
            mode: self.mode,
            version: self.version,
            ec_level: self.ec_level,
            mask: self.mask,
            bezel: self.bezel,
            geometry,
        };
        Project::generate(config, table)
    }
}

// Project
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub message: String,
    // None picks the narrowest mode fitting the message
    pub mode: Option<Mode>,
    pub version: Version,
    pub ec_level: ECLevel,
    pub mask: MaskPattern,
    pub bezel: usize,
    pub geometry: DotGeometry,
}

/// Counts describing a generated symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub message_codewords: usize,
    pub stuffing_codewords: usize,
    pub correction_codewords: usize,
    pub dark_modules: usize,
    pub total_modules: usize,
    // Correctable codewords per block, less those reserved against misdecodes
    pub ec_capacity: usize,
}

/// A generated symbol with everything it was derived from.
///
/// Changing the message, mode, version, ec level or mask regenerates the whole project,
/// which drops any overlay applied so far. Bezel, dot geometry and overlay edits mutate
/// the matrix in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    config: Config,
    mode: Mode,
    prop: EncodingProperty,
    message_len: usize,
    groups: Vec<CodewordGroup>,
    matrix: Matrix,
    format_info: u32,
    version_info: Option<u32>,
}

impl Project {
    fn generate(config: Config, table: &CapacityTable) -> QRResult<Self> {
        let (ver, ecl) = (config.version, config.ec_level);
        let mask = MaskPattern::try_new(*config.mask)?;
        debug!("Generating QR at version {}, ec level {ecl:?}, mask {}...", *ver, *mask);

        let prop = *table.get(ver, ecl)?;
        let mode = config.mode.unwrap_or_else(|| Mode::fitting(&config.message));

        debug!("Encoding data...");
        let mut bytes = encode(&config.message, mode, ver, prop.data_bit_capacity())?.into_bytes();
        let message_len = bytes.len();
        bytes.extend(stuffing_bytes(message_len, prop.data_codewords()));

        debug!("Constructing codewords...");
        let mut groups = group_codewords(&bytes, message_len, &prop)?;
        let order = interleave(&groups);

        debug!("Drawing matrix...");
        let mut matrix = Matrix::build(ver, ecl, &order, &mut groups)?;
        if config.bezel > 0 {
            debug!("Drawing bezel...");
            matrix.set_bezel(config.bezel);
        }

        let project = Self {
            mode,
            prop,
            message_len,
            groups,
            matrix,
            format_info: format_info(ecl, mask),
            version_info: ver.info(),
            config,
        };

        let report = project.report();
        info!(
            "QR generated in {mode:?} mode: {} message, {} stuffing, {} correction codewords",
            report.message_codewords,
            report.stuffing_codewords,
            report.correction_codewords
        );
        Ok(project)
    }

    fn rebuild(&mut self, config: Config, table: &CapacityTable) -> QRResult<()> {
        *self = Self::generate(config, table)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn property(&self) -> &EncodingProperty {
        &self.prop
    }

    pub fn groups(&self) -> &[CodewordGroup] {
        &self.groups
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn format_info(&self) -> u32 {
        self.format_info
    }

    pub fn version_info(&self) -> Option<u32> {
        self.version_info
    }

    // Full width, bezel included
    pub fn width(&self) -> usize {
        self.matrix.width()
    }
}

// Project edits
//------------------------------------------------------------------------------

impl Project {
    pub fn set_message(&mut self, message: &str, table: &CapacityTable) -> QRResult<()> {
        let config = Config { message: message.to_owned(), ..self.config.clone() };
        self.rebuild(config, table)
    }

    pub fn set_mode(&mut self, mode: Option<Mode>, table: &CapacityTable) -> QRResult<()> {
        let config = Config { mode, ..self.config.clone() };
        self.rebuild(config, table)
    }

    pub fn set_version(&mut self, version: Version, table: &CapacityTable) -> QRResult<()> {
        let config = Config { version, ..self.config.clone() };
        self.rebuild(config, table)
    }

    pub fn set_ec_level(&mut self, ec_level: ECLevel, table: &CapacityTable) -> QRResult<()> {
        let config = Config { ec_level, ..self.config.clone() };
        self.rebuild(config, table)
    }

    pub fn set_mask(&mut self, mask: MaskPattern, table: &CapacityTable) -> QRResult<()> {
        let config = Config { mask, ..self.config.clone() };
        self.rebuild(config, table)
    }

    pub fn set_bezel(&mut self, bezel: usize) {
        self.config.bezel = bezel;
        self.matrix.set_bezel(bezel);
    }

    pub fn set_geometry(&mut self, subdivision: usize, dot_size: usize) -> QRResult<()> {
        self.config.geometry = DotGeometry::new(subdivision, dot_size)?;
        Ok(())
    }

    /// Drives the stuffing modules towards `overlay` and returns the blocks whose
    /// correction codewords were regenerated.
    pub fn apply_overlay(&mut self, overlay: &Overlay) -> BTreeSet<BlockId> {
        let Config { geometry, mask, .. } = self.config;
        apply_overlay(&mut self.matrix, &mut self.groups, overlay, geometry, mask)
    }
}

// Queries
//------------------------------------------------------------------------------

impl Project {
    pub fn module(&self, row: usize, col: usize) -> Module {
        self.matrix.cell(row, col)
    }

    /// Rendered value of the module at full coordinates, true being dark.
    pub fn value_at(&self, row: usize, col: usize) -> bool {
        self.matrix.value_at(row, col, self.config.mask)
    }

    pub fn is_safe(&self, x: f64, y: f64) -> bool {
        self.matrix.is_safe(x, y, self.config.geometry)
    }

    pub fn report(&self) -> Report {
        let count = |kind: CodewordKind| {
            self.groups
                .iter()
                .flat_map(|g| &g.blocks)
                .flat_map(|b| b.data.iter().chain(&b.ecc))
                .filter(|cw| cw.kind == kind)
                .count()
        };
        let reserved = self.config.version.misdecode_codewords(self.config.ec_level);
        Report {
            message_codewords: count(CodewordKind::Message),
            stuffing_codewords: count(CodewordKind::Stuff),
            correction_codewords: count(CodewordKind::Correction),
            dark_modules: self.matrix.count_dark_modules(self.config.mask),
            total_modules: self.matrix.width() * self.matrix.width(),
            ec_capacity: self.prop.ecc_per_block.saturating_sub(reserved) / 2,
        }
    }

    pub fn to_image(&self, module_sz: u32) -> GrayImage {
        self.matrix.render(self.config.mask, module_sz)
    }

    pub fn to_str(&self, module_sz: usize) -> String {
        self.matrix.to_str(self.config.mask, module_sz)
    }
}

// Validation
//------------------------------------------------------------------------------

impl Project {
    /// Reads the rendered symbol back and error corrects it. Returns the data codewords of
    /// every block, group 1 first, and fails if the message codewords don't match the ones
    /// that were encoded. Stuffing codewords carry the overlay and are not compared.
    pub fn validate(&self) -> QRResult<Vec<u8>> {
        let mask = self.config.mask;
        let (main, side) = self.matrix.read_format_info(mask);
        let (ecl, read_mask) = decode_format_info(main).or_else(|_| decode_format_info(side))?;
        if ecl != self.config.ec_level {
            return Err(QRError::InvalidFormatInfo);
        }

        let ver = self.config.version;
        if self.version_info.is_some() {
            let (bl, tr) = self.matrix.read_version_info(mask);
            let read_ver = decode_version_info(bl).or_else(|_| decode_version_info(tr))?;
            if read_ver != ver {
                return Err(QRError::InvalidVersionInfo);
            }
        }

        let stream = self.matrix.read_codewords(mask, read_mask);
        let data_lens =
            self.prop.groups().flat_map(|(cnt, len)| std::iter::repeat(len).take(cnt));
        let mut data = Vec::with_capacity(self.prop.data_codewords());
        for (raw, dlen) in deinterleave(&stream, &self.prop).into_iter().zip(data_lens) {
            let mut blk = Block::with_encoded(&raw, dlen);
            data.extend_from_slice(blk.rectify()?);
        }

        let expected = self
            .groups
            .iter()
            .flat_map(|g| &g.blocks)
            .flat_map(|b| &b.data)
            .filter(|cw| cw.kind == CodewordKind::Message)
            .map(|cw| cw.value);
        if !data.iter().copied().take(self.message_len).eq(expected) {
            return Err(QRError::DataMismatch);
        }
        Ok(data)
    }
}
