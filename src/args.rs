use clap::{Parser, ValueEnum};
use qrcanvas::ECLevel;

#[derive(ValueEnum, Clone, Copy, Debug)]
#[clap(rename_all = "UPPER")]
pub enum EcArg {
    L,
    M,
    Q,
    H,
}

impl From<EcArg> for ECLevel {
    fn from(v: EcArg) -> Self {
        match v {
            EcArg::L => ECLevel::L,
            EcArg::M => ECLevel::M,
            EcArg::Q => ECLevel::Q,
            EcArg::H => ECLevel::H,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "qrcanvas")]
#[command(about = "Print a QR code with diagonal stripes drawn over its stuffing modules")]
pub struct Args {
    /// Text to encode in the QR code
    #[arg(default_value = "Hello, world! 🌏")]
    pub message: String,

    /// Symbol version, 1 to 40
    #[arg(
        short = 'v',
        long,
        default_value = "3",
        value_parser = clap::value_parser!(u8).range(1..=40)
    )]
    pub version: u8,

    /// Error correction level (L, M, Q, H)
    #[arg(short = 'e', long, default_value = "L")]
    pub error_correction: EcArg,

    /// Mask pattern, 0 to 7
    #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u8).range(0..=7))]
    pub mask: u8,

    /// Bezel width in modules
    #[arg(short, long, default_value = "1")]
    pub bezel: usize,

    /// Stripe width in overlay pixels
    #[arg(short, long, default_value = "6")]
    pub stripe: usize,
}
