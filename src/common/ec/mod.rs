mod block;
mod decoder;
mod encoder;
mod galois;

pub use block::*;
pub use encoder::{ecc, generator_polynomial};
pub use galois::{antilog, log, G};
