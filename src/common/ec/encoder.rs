use super::galois::G;

// Generator polynomial of degree `ecc_count`, (x - α^0)(x - α^1)...(x - α^(ecc_count-1)),
// with coefficients in descending order of degree. The leading coefficient is 1.
pub fn generator_polynomial(ecc_count: usize) -> Vec<G> {
    let mut poly = vec![G(1)];
    for i in 0..ecc_count {
        let root = G::gen_pow(i);
        let mut next = vec![G(0); poly.len() + 1];
        for (j, &c) in poly.iter().enumerate() {
            next[j] += c;
            next[j + 1] += c * root;
        }
        poly = next;
    }
    poly
}

// Performs polynomial long division with data polynomial(num)
// and generator polynomial(den) to compute remainder polynomial,
// the coefficients of which are the ecc
pub fn ecc(block: &[u8], ecc_count: usize) -> Vec<u8> {
    let len = block.len();
    let gen_poly = generator_polynomial(ecc_count);

    let mut res = block.to_vec();
    res.resize(len + ecc_count, 0);

    for i in 0..len {
        let lead_coeff = G(res[i]);
        if lead_coeff.is_zero() {
            continue;
        }

        for (u, &v) in res[i + 1..].iter_mut().zip(gen_poly[1..].iter()) {
            *u ^= (lead_coeff * v).0;
        }
    }

    res.split_off(len)
}

#[cfg(test)]
mod ec_encoder_tests {
    use test_case::test_case;

    use super::{ecc, generator_polynomial};
    use crate::common::ec::log;

    // Generator coefficients as exponents of α
    fn generator_exponents(ecc_count: usize) -> Vec<u8> {
        generator_polynomial(ecc_count).into_iter().map(|g| log(g.0)).collect()
    }

    #[test_case(7, vec![0, 87, 229, 146, 149, 238, 102, 21])]
    #[test_case(10, vec![0, 251, 67, 46, 61, 118, 70, 64, 94, 32, 45])]
    #[test_case(13, vec![0, 74, 152, 176, 100, 86, 100, 106, 104, 130, 218, 206, 140, 78])]
    fn test_generator_polynomial(ecc_count: usize, exp: Vec<u8>) {
        assert_eq!(generator_exponents(ecc_count), exp);
    }

    #[test]
    fn test_poly_mod_1() {
        let res = ecc(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11", 10);
        assert_eq!(&*res, b"\xc4#'w\xeb\xd7\xe7\xe2]\x17");
    }

    #[test]
    fn test_poly_mod_2() {
        let res = ecc(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec", 13);
        assert_eq!(&*res, b"\xa8H\x16R\xd96\x9c\x00.\x0f\xb4z\x10");
    }

    #[test]
    fn test_poly_mod_3() {
        let res = ecc(b"CUF\x86W&U\xc2w2\x06\x12\x06g&", 18);
        assert_eq!(&*res, b"\xd5\xc7\x0b-s\xf7\xf1\xdf\xe5\xf8\x9au\x9aoV\xa1o'");
    }

    #[test]
    fn test_hello_world_ecc() {
        let data = [
            0x20, 0x5b, 0x0b, 0x78, 0xd1, 0x72, 0xdc, 0x4d, 0x43, 0x40, 0xec, 0x11, 0xec, 0x11,
            0xec, 0x11, 0xec, 0x11, 0xec,
        ];
        assert_eq!(ecc(&data, 7), [0xd1, 0xef, 0xc4, 0xcf, 0x4e, 0xc3, 0x6d]);
    }
}
