use super::{
    galois::{eval_poly, G},
    Block,
};
use crate::common::error::{QRError, QRResult};

// Rectifier
//------------------------------------------------------------------------------

impl Block {
    /// Corrects up to `ec_len / 2` erroneous codewords in place and returns the data
    /// codewords.
    pub fn rectify(&mut self) -> QRResult<&[u8]> {
        // Compute syndromes
        let synd = match self.syndromes() {
            None => return Ok(self.data()),
            Some(s) => s,
        };

        // Error locator polynomial
        let sig = berlekamp_massey(&synd);
        let err_cnt = sig.len() - 1;
        if err_cnt == 0 || err_cnt * 2 > self.ec_len() {
            return Err(QRError::TooManyError);
        }
        let err_loc = self.chien_search(&sig);
        if err_loc.len() != err_cnt {
            return Err(QRError::TooManyError);
        }

        // Sigma derivative. Even powers vanish in characteristic 2
        let dsig = sig
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &s)| if i & 1 == 1 { s } else { G(0) })
            .collect::<Vec<_>>();

        // Error evaluator
        let omg = omega(&synd, &sig);

        // Rectify errors by XORing data with magnitude
        for pos in err_loc {
            let x = G::gen_pow(self.len() - 1 - pos);
            let xinv = G(1) / x;
            let den = eval_poly(&dsig, xinv);
            if den.is_zero() {
                return Err(QRError::TooManyError);
            }
            let mag = x * eval_poly(&omg, xinv) / den;
            self.data[pos] = (G(self.data[pos]) + mag).into();
        }

        match self.syndromes() {
            None => Ok(self.data()),
            Some(_) => Err(QRError::TooManyError),
        }
    }

    // S_j = R(α^j) for j in 0..ec_len, None when every syndrome is zero
    fn syndromes(&self) -> Option<Vec<G>> {
        let synd = (0..self.ec_len())
            .map(|j| {
                let x = G::gen_pow(j);
                self.data.iter().fold(G(0), |acc, &b| acc * x + G(b))
            })
            .collect::<Vec<_>>();

        if synd.iter().all(|s| s.is_zero()) {
            None
        } else {
            Some(synd)
        }
    }

    // Codeword positions whose locator X = α^(len - 1 - pos) satisfies sigma(X^-1) = 0
    fn chien_search(&self, sig: &[G]) -> Vec<usize> {
        let len = self.len();
        (0..len)
            .filter(|&pos| eval_poly(sig, G::gen_pow(255 - (len - 1 - pos) % 255)).is_zero())
            .collect()
    }
}

// Sigma polynomial, ascending coefficients trimmed to its degree
fn berlekamp_massey(synd: &[G]) -> Vec<G> {
    let n = synd.len();
    let mut l = 0usize;
    let mut m = 1usize;
    let mut b = G(1);
    let mut cx = vec![G(0); n + 1];
    let mut bx = vec![G(0); n + 1];
    cx[0] = G(1);
    bx[0] = G(1);

    for k in 0..n {
        // Calculate discrepancy
        let mut d = synd[k];
        for i in 1..=l {
            d += cx[i] * synd[k - i];
        }

        if d.is_zero() {
            m += 1;
            continue;
        }

        let tx = cx.clone();
        let scale = d / b;
        for i in 0..=n - m {
            cx[i + m] += scale * bx[i];
        }

        if 2 * l <= k {
            bx = tx;
            l = k + 1 - l;
            b = d;
            m = 1;
        } else {
            m += 1;
        }
    }

    cx.truncate(l + 1);
    cx
}

// Omega(x) = S(x) * sigma(x) mod x^ec_len
fn omega(synd: &[G], sig: &[G]) -> Vec<G> {
    let n = synd.len();
    let mut omg = vec![G(0); n];
    for (i, &s) in synd.iter().enumerate() {
        for (j, &c) in sig.iter().enumerate().take(n - i) {
            omg[i + j] += s * c;
        }
    }
    omg
}
