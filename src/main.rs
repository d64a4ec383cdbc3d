mod args;

use std::error::Error;

use clap::Parser;
use qrcanvas::{CapacityTable, MaskPattern, Overlay, QRBuilder, Version};

use args::Args;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let table = CapacityTable::standard()?;
    let mut project = QRBuilder::new(&args.message)
        .version(Version::new(args.version)?)
        .ec_level(args.error_correction.into())
        .mask(MaskPattern::try_new(args.mask)?)
        .bezel(args.bezel)
        .build(&table)?;

    // Diagonal stripes over the whole symbol, only stuffing modules take them
    let w = project.width() * project.config().geometry.subdivision();
    let stripe = args.stripe.max(1);
    let rows = (0..w)
        .map(|y| (0..w).map(|x| if (x + y) / stripe % 2 == 0 { '#' } else { '.' }).collect())
        .collect::<Vec<String>>();
    let rows = rows.iter().map(String::as_str).collect::<Vec<_>>();
    project.apply_overlay(&Overlay::from_rows((0.0, 0.0), &rows));
    project.validate()?;

    println!("{}", project.to_str(1));
    let report = project.report();
    println!(
        "Message codewords: {}, Stuffing codewords: {}, Correction codewords: {}",
        report.message_codewords, report.stuffing_codewords, report.correction_codewords
    );
    println!(
        "Dark Cells: {}, Light Cells: {}, Balance: {}%",
        report.dark_modules,
        report.total_modules - report.dark_modules,
        report.dark_modules * 100 / report.total_modules
    );

    Ok(())
}
