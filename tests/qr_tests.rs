use image::GrayImage;

use qrcanvas::*;

fn decode(img: &GrayImage) -> (usize, String) {
    let (w, h) = img.dimensions();
    let mut img = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
        img.get_pixel(x as u32, y as u32).0[0]
    });
    let grids = img.detect_grids();
    assert_eq!(grids.len(), 1, "Expected exactly one symbol");
    let (meta, content) = grids[0].decode().expect("Failed to read QR");
    (meta.version.0, content)
}

fn overlay_from_fn(width: usize, f: impl Fn(usize, usize) -> Option<bool>) -> Overlay {
    let mut overlay = Overlay::new((0.0, 0.0), width, width);
    for y in 0..width {
        for x in 0..width {
            overlay.set(x, y, f(x, y));
        }
    }
    overlay
}

#[cfg(test)]
mod qr_tests {
    use test_case::test_case;

    use super::{decode, overlay_from_fn};
    use qrcanvas::*;

    #[test]
    fn test_hello_world() {
        let table = CapacityTable::standard().unwrap();
        let project = QRBuilder::new("HELLO WORLD").ec_level(ECLevel::Q).build(&table).unwrap();
        assert_eq!(project.width(), 21);
        assert_eq!(project.mode(), Mode::Alphanumeric);

        let (ver, content) = decode(&project.to_image(10));
        assert_eq!(ver, 1);
        assert_eq!(content, "HELLO WORLD");
        assert!(project.validate().is_ok());
    }

    #[test_case(0)]
    #[test_case(1)]
    #[test_case(2)]
    #[test_case(3)]
    #[test_case(4)]
    #[test_case(5)]
    #[test_case(6)]
    #[test_case(7)]
    fn test_every_mask(mask: u8) {
        let table = CapacityTable::standard().unwrap();
        let data = "A11111111111111".repeat(11);
        let project = QRBuilder::new(&data)
            .version(Version::new(7).unwrap())
            .mask(MaskPattern::new(mask))
            .build(&table)
            .unwrap();

        let (ver, content) = decode(&project.to_image(6));
        assert_eq!(ver, 7);
        assert_eq!(content, data);
        assert_eq!(project.validate().map(|d| d.len()), Ok(124));
    }

    #[test_case("1234567890".repeat(15), 7, ECLevel::H)]
    #[test_case("aAAAAAAAAA1111111111111111AAAAAAAAAAa".repeat(4), 10, ECLevel::Q)]
    #[test_case("1234567890".repeat(128), 27, ECLevel::H)]
    #[test_case("A111111111111111".repeat(100), 27, ECLevel::M)]
    #[test_case("Hello, world! 🌏".repeat(100), 40, ECLevel::L)]
    #[test_case("1234567890".repeat(305), 40, ECLevel::H)]
    fn test_large_symbols(data: String, version: u8, ec_level: ECLevel) {
        let table = CapacityTable::standard().unwrap();
        let project = QRBuilder::new(&data)
            .version(Version::new(version).unwrap())
            .ec_level(ec_level)
            .build(&table)
            .unwrap();

        let (ver, content) = decode(&project.to_image(4));
        assert_eq!(ver, version as usize);
        assert_eq!(content, data);
    }

    #[test]
    fn test_overlay_with_bezel() {
        let table = CapacityTable::standard().unwrap();
        let mut project = QRBuilder::new("https://example.com")
            .version(Version::new(6).unwrap())
            .ec_level(ECLevel::L)
            .mask(MaskPattern::new(4))
            .bezel(3)
            .build(&table)
            .unwrap();

        // Ring of dark modules around the centre of the symbol
        let w = project.width() * 3;
        let c = w as f64 / 2.0;
        let overlay = overlay_from_fn(w, |x, y| {
            let d = ((x as f64 - c).powi(2) + (y as f64 - c).powi(2)).sqrt();
            (d < c * 0.8).then_some(d > c * 0.4)
        });
        let blocks = project.apply_overlay(&overlay);
        assert!(!blocks.is_empty());

        assert!(project.validate().is_ok());
        let (ver, content) = decode(&project.to_image(8));
        assert_eq!(ver, 6);
        assert_eq!(content, "https://example.com");
    }

    #[test]
    fn test_mask_change_drops_overlay() {
        let table = CapacityTable::standard().unwrap();
        let mut project = QRBuilder::new("HI").version(Version::new(2).unwrap()).build(&table).unwrap();
        let clean = project.clone();
        let overlay = overlay_from_fn(project.width() * 3, |_, _| Some(true));
        project.apply_overlay(&overlay);
        assert_ne!(project, clean);

        project.set_mask(MaskPattern::new(1), &table).unwrap();
        project.set_mask(MaskPattern::new(0), &table).unwrap();
        assert_eq!(project, clean);
    }
}

#[cfg(test)]
mod qr_proptests {
    use proptest::prelude::*;

    use super::{decode, overlay_from_fn};
    use qrcanvas::*;

    pub fn ec_level_strategy() -> BoxedStrategy<ECLevel> {
        prop_oneof![Just(ECLevel::L), Just(ECLevel::M), Just(ECLevel::Q), Just(ECLevel::H)].boxed()
    }

    pub fn pixel_strategy() -> BoxedStrategy<Option<bool>> {
        prop_oneof![Just(None), Just(Some(true)), Just(Some(false))].boxed()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn proptest_alphanumeric(data in "[0-9A-Z $%*+./:-]{1,40}", ecl in ec_level_strategy(), mask in 0u8..8) {
            let table = CapacityTable::standard().unwrap();
            let project = QRBuilder::new(&data)
                .version(Version::new(5).unwrap())
                .ec_level(ecl)
                .mask(MaskPattern::new(mask))
                .build(&table)
                .unwrap();

            let (_, decoded) = decode(&project.to_image(4));
            prop_assert_eq!(data, decoded);
            prop_assert!(project.validate().is_ok());
        }

        #[test]
        fn proptest_stuffing_idempotent(
            pixels in prop::collection::vec(pixel_strategy(), 75 * 75),
            mask in 0u8..8,
        ) {
            let table = CapacityTable::standard().unwrap();
            let mut project = QRBuilder::new("QR")
                .version(Version::new(2).unwrap())
                .mask(MaskPattern::new(mask))
                .build(&table)
                .unwrap();
            let overlay = overlay_from_fn(75, |x, y| pixels[y * 75 + x]);

            project.apply_overlay(&overlay);
            let once = project.clone();
            project.apply_overlay(&overlay);
            prop_assert_eq!(&project, &once);
            prop_assert!(project.validate().is_ok());

            let (_, decoded) = decode(&project.to_image(4));
            prop_assert_eq!(decoded, "QR");
        }

        #[test]
        fn proptest_bezel_idempotent(steps in prop::collection::vec(0usize..6, 1..6)) {
            let table = CapacityTable::standard().unwrap();
            let mut stepped = QRBuilder::new("BEZEL").build(&table).unwrap();
            for &b in &steps {
                stepped.set_bezel(b);
            }
            let last = steps[steps.len() - 1];
            let direct = QRBuilder::new("BEZEL").bezel(last).build(&table).unwrap();
            prop_assert_eq!(&stepped, &direct);

            stepped.set_bezel(last);
            prop_assert_eq!(&stepped, &direct);
        }
    }
}
