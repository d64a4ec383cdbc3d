pub mod bitstream;
pub mod capacity;
pub mod codec;
pub mod codeword;
pub mod ec;
pub mod error;
pub mod iter;
pub mod mask;
pub mod metadata;

pub use bitstream::*;
pub use capacity::*;
pub use codec::*;
pub use codeword::*;
pub use ec::*;
pub use error::*;
pub use iter::*;
pub use mask::*;
pub use metadata::*;
