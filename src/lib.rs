//! # qrcanvas
//!
//! A Rust library for building QR code symbols whose padding codewords double as a canvas
//! for artwork. The padding ("stuffing") codewords carry no message content, so their
//! modules can be driven by an overlay image as long as the correction codewords of every
//! block they belong to are regenerated. Every edit keeps the symbol decodable.
//!
//! ## Features
//!
//! - **QR Code Generation**: Numeric, alphanumeric and byte mode encoding for versions 1 to 40 and all error correction levels
//! - **Artwork Overlay**: Drive stuffing modules from an image with optional pixels and regenerate the affected blocks
//! - **Reed-Solomon Error Correction**: Encoding and syndrome based correction over GF(256)
//! - **Bezel**: Decorative border around the symbol with finder seams extended into it
//! - **Validation**: Read the rendered symbol back and error correct it
//!
//! ## Quick Start
//!
//! ```rust
//! use qrcanvas::{CapacityTable, ECLevel, QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = CapacityTable::standard()?;
//! let project = QRBuilder::new("Hello, World!")
//!     .version(Version::new(2)?)  // Symbol size, defaults to version 1
//!     .ec_level(ECLevel::L)       // Error correction level, defaults to ECLevel::M
//!     .bezel(2)                   // Border width in modules, defaults to 0
//!     .build(&table)?;
//!
//! // 4 pixels per module, with a quiet zone of 4 modules on each side
//! let img = project.to_image(4);
//! assert_eq!(img.width(), (25 + 2 * 2 + 2 * 4) * 4);
//! # Ok(())
//! # }
//! ```
//!
//! ### Drawing over the stuffing codewords
//!
//! ```rust
//! use qrcanvas::{CapacityTable, ECLevel, Overlay, QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = CapacityTable::standard()?;
//! let mut project = QRBuilder::new("HI")
//!     .version(Version::new(3)?)
//!     .ec_level(ECLevel::L)
//!     .build(&table)?;
//!
//! // Each overlay pixel is a third of a module with the default subdivision
//! let art = Overlay::from_rows((10.0, 12.0), &["###...###"; 9]);
//! let regenerated = project.apply_overlay(&art);
//! assert_eq!(regenerated.len(), 1);
//! project.validate()?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::suspicious_arithmetic_impl, clippy::suspicious_op_assign_impl)]

pub mod builder;
pub mod common;

pub use builder::{Overlay, Project, QRBuilder};
pub use common::capacity::CapacityTable;
pub use common::codec::Mode;
pub use common::error::{QRError, QRResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{ECLevel, Version};
