//! The group SL(2, ℤ_p) for the Mersenne primes p = 2³¹−1 and p = 2⁶¹−1,
//! together with the fixed expander generating set the walk scheme uses.
//!
//! Reduction folds modulo 2^bits − 1 a fixed number of times, so no code path
//! depends on the value being reduced.

use crate::error::MosaicError;
use crate::sampling::uniform_below;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Number of generators in the fixed Cayley generating set.
pub const GENERATOR_COUNT: usize = 4;

/// A 2×2 matrix over ℤ_p with determinant 1. The modulus travels separately
/// (it is fixed by the parameter record).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct Sl2 {
    pub a: u64,
    pub b: u64,
    pub c: u64,
    pub d: u64,
}

#[inline]
fn mersenne_bits(p: u64) -> u32 {
    64 - p.leading_zeros()
}

/// Folds a 128-bit value modulo p = 2^bits − 1. Four folds bring any input
/// below 2^(bits+1); two masked subtractions canonicalize it.
#[inline]
fn mersenne_reduce(x: u128, p: u64, bits: u32) -> u64 {
    let mask = (1u128 << bits) - 1;
    let mut v = x;
    for _ in 0..4 {
        v = (v & mask) + (v >> bits);
    }
    let mut v = v as u64;
    for _ in 0..2 {
        let t = v.wrapping_sub(p);
        let keep = ((t as i64) >> 63) as u64;
        v = t.wrapping_add(p & keep);
    }
    v
}

#[inline]
fn mul_mod_p(a: u64, b: u64, p: u64, bits: u32) -> u64 {
    mersenne_reduce(a as u128 * b as u128, p, bits)
}

#[inline]
fn add_mod_p(a: u64, b: u64, p: u64, bits: u32) -> u64 {
    mersenne_reduce(a as u128 + b as u128, p, bits)
}

#[inline]
fn sub_mod_p(a: u64, b: u64, p: u64) -> u64 {
    let t = a.wrapping_sub(b);
    let keep = ((t as i64) >> 63) as u64;
    t.wrapping_add(p & keep)
}

impl Sl2 {
    pub fn new(a: u64, b: u64, c: u64, d: u64) -> Self {
        Sl2 { a, b, c, d }
    }

    pub fn identity() -> Self {
        Sl2::new(1, 0, 0, 1)
    }

    /// 2×2 matrix product mod p.
    pub fn mul(&self, rhs: &Sl2, p: u64) -> Sl2 {
        let bits = mersenne_bits(p);
        let mm = |x, y| mul_mod_p(x, y, p, bits);
        Sl2 {
            a: add_mod_p(mm(self.a, rhs.a), mm(self.b, rhs.c), p, bits),
            b: add_mod_p(mm(self.a, rhs.b), mm(self.b, rhs.d), p, bits),
            c: add_mod_p(mm(self.c, rhs.a), mm(self.d, rhs.c), p, bits),
            d: add_mod_p(mm(self.c, rhs.b), mm(self.d, rhs.d), p, bits),
        }
    }

    /// (ad − bc) mod p.
    pub fn det(&self, p: u64) -> u64 {
        let bits = mersenne_bits(p);
        sub_mod_p(
            mul_mod_p(self.a, self.d, p, bits),
            mul_mod_p(self.b, self.c, p, bits),
            p,
        )
    }

    /// Entries canonical and determinant 1.
    pub fn is_valid(&self, p: u64) -> bool {
        self.a < p && self.b < p && self.c < p && self.d < p && self.det(p) == 1
    }

    /// For determinant-1 matrices the inverse is the adjugate.
    pub fn inverse(&self, p: u64) -> Sl2 {
        Sl2 {
            a: self.d,
            b: sub_mod_p(0, self.b, p),
            c: sub_mod_p(0, self.c, p),
            d: self.a,
        }
    }

    /// Byte width of one serialized element: four p-bit integers padded to
    /// whole bytes, little-endian, in (a, b, c, d) order.
    pub fn encoded_len(p: u64) -> usize {
        let width = (mersenne_bits(p) as usize + 7) / 8;
        4 * width
    }

    pub fn to_bytes(&self, p: u64) -> Vec<u8> {
        let width = Sl2::encoded_len(p) / 4;
        let mut out = Vec::with_capacity(4 * width);
        for entry in [self.a, self.b, self.c, self.d] {
            out.extend_from_slice(&entry.to_le_bytes()[..width]);
        }
        out
    }

    /// Strict decoding: exact length, entries below p, determinant 1.
    pub fn from_bytes(bytes: &[u8], p: u64) -> Result<Sl2, MosaicError> {
        let width = Sl2::encoded_len(p) / 4;
        if bytes.len() != 4 * width {
            return Err(MosaicError::Serialization("SL2 element length mismatch"));
        }
        let mut entries = [0u64; 4];
        for (slot, chunk) in entries.iter_mut().zip(bytes.chunks_exact(width)) {
            let mut padded = [0u8; 8];
            padded[..width].copy_from_slice(chunk);
            *slot = u64::from_le_bytes(padded);
            if *slot >= p {
                return Err(MosaicError::Serialization("SL2 entry out of range"));
            }
        }
        let m = Sl2::new(entries[0], entries[1], entries[2], entries[3]);
        if m.det(p) != 1 {
            return Err(MosaicError::Serialization("SL2 determinant is not 1"));
        }
        Ok(m)
    }
}

/// The fixed generating set {T, T⁻¹, S, S⁻¹} with T = [[1,2],[0,1]] and
/// S = [[1,0],[2,1]], whose Cayley graph on SL(2, ℤ_p) is a known expander.
pub fn generators(p: u64) -> [Sl2; GENERATOR_COUNT] {
    [
        Sl2::new(1, 2, 0, 1),
        Sl2::new(1, p - 2, 0, 1),
        Sl2::new(1, 0, 2, 1),
        Sl2::new(1, 0, p - 2, 1),
    ]
}

/// Multiplies the generators named by `word` onto `start`, left to right.
pub fn walk(start: &Sl2, word: &[u8], p: u64) -> Sl2 {
    let gens = generators(p);
    let mut acc = *start;
    for &w in word {
        acc = acc.mul(&gens[w as usize], p);
    }
    acc
}

/// Uniform element of SL(2, ℤ_p): sample a ≠ 0, b, c uniformly and solve
/// d = (1 + bc)·a⁻¹ so the determinant is 1.
pub fn random_element<R: RngCore + CryptoRng>(rng: &mut R, p: u64) -> Sl2 {
    let bits = mersenne_bits(p);
    let a = loop {
        let candidate = uniform_below(rng, p);
        if candidate != 0 {
            break candidate;
        }
    };
    let b = uniform_below(rng, p);
    let c = uniform_below(rng, p);
    let a_inv = crate::algebra::zq::inv_mod(a, p);
    let d = mul_mod_p(add_mod_p(1, mul_mod_p(b, c, p, bits), p, bits), a_inv, p, bits);
    Sl2::new(a, b, c, d)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::thread_rng;

    const P31: u64 = (1 << 31) - 1;
    const P61: u64 = (1 << 61) - 1;

    #[test]
    fn reduction_handles_extremes() {
        for p in [P31, P61] {
            let bits = mersenne_bits(p);
            assert_eq!(mersenne_reduce(0, p, bits), 0);
            assert_eq!(mersenne_reduce(p as u128, p, bits), 0);
            assert_eq!(mersenne_reduce(p as u128 + 1, p, bits), 1);
            assert_eq!(mersenne_reduce(u128::MAX, p, bits), (u128::MAX % p as u128) as u64);
            assert_eq!(
                mersenne_reduce((p as u128) * (p as u128), p, bits),
                0
            );
        }
    }

    #[test]
    fn generators_have_determinant_one() {
        for p in [P31, P61] {
            for g in generators(p) {
                assert!(g.is_valid(p));
            }
        }
    }

    #[test]
    fn group_laws_hold() {
        let mut rng = thread_rng();
        for p in [P31, P61] {
            let x = random_element(&mut rng, p);
            let y = random_element(&mut rng, p);
            let z = random_element(&mut rng, p);

            assert!(x.is_valid(p));
            // Determinant is multiplicative, so products stay in the group.
            assert!(x.mul(&y, p).is_valid(p));
            // Associativity.
            assert_eq!(x.mul(&y, p).mul(&z, p), x.mul(&y.mul(&z, p), p));
            // Identity and inverse.
            assert_eq!(x.mul(&Sl2::identity(), p), x);
            assert_eq!(x.mul(&x.inverse(p), p), Sl2::identity());
        }
    }

    #[test]
    fn walks_compose() {
        let mut rng = thread_rng();
        for p in [P31, P61] {
            let start = random_element(&mut rng, p);
            let a = walk(&start, &[0, 1, 2, 3, 2], p);
            let b = walk(&walk(&start, &[0, 1], p), &[2, 3, 2], p);
            assert_eq!(a, b);

            // T followed by T⁻¹ cancels.
            assert_eq!(walk(&start, &[0, 1], p), start);
        }
    }

    #[test]
    fn canonical_encoding_round_trips() {
        let mut rng = thread_rng();
        for p in [P31, P61] {
            let x = random_element(&mut rng, p);
            let bytes = x.to_bytes(p);
            assert_eq!(bytes.len(), Sl2::encoded_len(p));
            assert_eq!(Sl2::from_bytes(&bytes, p).unwrap(), x);
        }
        assert_eq!(Sl2::encoded_len(P31), 16);
        assert_eq!(Sl2::encoded_len(P61), 32);
    }

    #[test]
    fn invalid_encodings_are_rejected() {
        // Wrong length.
        assert!(Sl2::from_bytes(&[0u8; 15], P31).is_err());

        // Entry ≥ p.
        let mut bytes = Sl2::identity().to_bytes(P31);
        bytes[..4].copy_from_slice(&(P31 as u32).to_le_bytes());
        assert!(Sl2::from_bytes(&bytes, P31).is_err());

        // Determinant ≠ 1.
        let bad = Sl2::new(2, 0, 0, 2);
        assert!(Sl2::from_bytes(&bad.to_bytes(P31), P31).is_err());
    }
}
