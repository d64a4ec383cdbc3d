use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Sub};

// Log & antilog tables
//------------------------------------------------------------------------------

// x^8 + x^4 + x^3 + x^2 + 1
const REDUCTION: u16 = 285;

const fn build_tables() -> ([u8; 256], [u8; 256]) {
    let mut exp = [0u8; 256];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x > 255 {
            x ^= REDUCTION;
        }
        i += 1;
    }
    exp[255] = exp[0];
    (exp, log)
}

const TABLES: ([u8; 256], [u8; 256]) = build_tables();

/// `EXP_TABLE[e]` is α^e. Entry 255 wraps back to 1.
pub const EXP_TABLE: [u8; 256] = TABLES.0;

/// `LOG_TABLE[v]` is e such that α^e = v. Entry 0 is meaningless.
pub const LOG_TABLE: [u8; 256] = TABLES.1;

pub fn antilog(e: u8) -> u8 {
    EXP_TABLE[e as usize]
}

pub fn log(v: u8) -> u8 {
    debug_assert!(v != 0, "Log of zero is undefined");
    LOG_TABLE[v as usize]
}

// Galois field element
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct G(pub u8);

impl G {
    pub fn gen_pow(i: usize) -> Self {
        Self(EXP_TABLE[i % 255])
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<G> for u8 {
    fn from(g: G) -> u8 {
        g.0
    }
}

impl Add for G {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl AddAssign for G {
    fn add_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Sub for G {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl Mul for G {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self(0);
        }
        let e = LOG_TABLE[self.0 as usize] as usize + LOG_TABLE[rhs.0 as usize] as usize;
        Self(EXP_TABLE[e % 255])
    }
}

impl MulAssign for G {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Div for G {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        debug_assert!(!rhs.is_zero(), "Division by zero");
        if self.is_zero() {
            return Self(0);
        }
        let e = LOG_TABLE[self.0 as usize] as usize + 255 - LOG_TABLE[rhs.0 as usize] as usize;
        Self(EXP_TABLE[e % 255])
    }
}

// Evaluates a polynomial with coefficients in ascending order of degree
pub fn eval_poly(poly: &[G], x: G) -> G {
    poly.iter().rev().fold(G(0), |acc, &c| acc * x + c)
}
