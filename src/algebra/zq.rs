//! Scalar arithmetic in ℤ_q for the small prime moduli of the lattice and
//! tensor schemes. Residues are canonical `u32` values in `[0, q)`.
//!
//! Reductions on secret values use arithmetic masks, never a data-dependent
//! branch; the one `%` is a straight-line u64 remainder.

use more_asserts::debug_assert_lt;
use subtle::{Choice, ConditionallySelectable, ConstantTimeLess};

/// (a + b) mod q via masked conditional subtraction.
#[inline]
pub fn add_mod(a: u32, b: u32, q: u32) -> u32 {
    debug_assert_lt!(a, q);
    debug_assert_lt!(b, q);
    let r = a + b;
    let t = r.wrapping_sub(q);
    // Sign bit of t selects whether the subtraction underflowed.
    let mask = ((t as i32) >> 31) as u32;
    t.wrapping_add(q & mask)
}

/// (a − b) mod q via masked conditional addition.
#[inline]
pub fn sub_mod(a: u32, b: u32, q: u32) -> u32 {
    debug_assert_lt!(a, q);
    debug_assert_lt!(b, q);
    let t = a.wrapping_sub(b);
    let mask = ((t as i32) >> 31) as u32;
    t.wrapping_add(q & mask)
}

/// (−a) mod q.
#[inline]
pub fn neg_mod(a: u32, q: u32) -> u32 {
    sub_mod(0, a, q)
}

/// (a · b) mod q. Operands stay below 2¹⁴, so the product fits comfortably
/// in the widened type and a single remainder reduces it.
#[inline]
pub fn mul_mod(a: u32, b: u32, q: u32) -> u32 {
    debug_assert_lt!(a, q);
    debug_assert_lt!(b, q);
    ((a as u64 * b as u64) % q as u64) as u32
}

/// Lifts a possibly negative integer into its canonical residue in `[0, q)`.
#[inline]
pub fn lift(x: i64, q: u32) -> u32 {
    let q = q as i64;
    (((x % q) + q) % q) as u32
}

/// Centered representative in `(−q/2, q/2]`, branch-free.
#[inline]
pub fn center(x: u32, q: u32) -> i64 {
    let x = x as i64;
    let q = q as i64;
    // 1 iff x > q/2.
    let above = ((q / 2 - x) >> 63) & 1;
    x - q * above
}

/// `min(x, q − x)`: the magnitude of the centered representative.
#[inline]
pub fn abs_center(x: u32, q: u32) -> u32 {
    debug_assert_lt!(x, q);
    let wrapped = q - x;
    u32::conditional_select(&wrapped, &x, x.ct_lt(&wrapped))
}

/// Constant-time `d1 < d0` over centered distances; used by the threshold
/// decoders.
#[inline]
pub fn ct_lt(a: u32, b: u32) -> Choice {
    a.ct_lt(&b)
}

/// base^exp mod modulus by square-and-multiply, u128 intermediates.
pub fn pow_mod(base: u64, exp: u64, modulus: u64) -> u64 {
    let mut acc: u128 = 1;
    let mut base = base as u128 % modulus as u128;
    let mut exp = exp;
    let m = modulus as u128;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc * base % m;
        }
        base = base * base % m;
        exp >>= 1;
    }
    acc as u64
}

/// Modular inverse for prime moduli (Fermat).
pub fn inv_mod(a: u64, p: u64) -> u64 {
    pow_mod(a, p - 2, p)
}

/// Element-wise `(a − b) mod q` with every result in `[0, q)`.
pub fn vec_sub(a: &[u32], b: &[u32], q: u32) -> Vec<u32> {
    assert_eq!(a.len(), b.len(), "vector size mismatch in vec_sub");
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| sub_mod(x, y, q))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    const Q: u32 = 7681;

    #[test]
    fn add_sub_are_inverses() {
        for a in [0, 1, 17, Q / 2, Q - 1] {
            for b in [0, 1, 19, Q / 2, Q - 1] {
                let s = add_mod(a, b, Q);
                assert_eq!(sub_mod(s, b, Q), a);
            }
        }
    }

    #[test]
    fn mul_matches_naive() {
        for a in [0u32, 1, 2, 4095, Q - 1] {
            for b in [0u32, 1, 3, 4096, Q - 1] {
                assert_eq!(mul_mod(a, b, Q), ((a as u64 * b as u64) % Q as u64) as u32);
            }
        }
    }

    #[test]
    fn lift_and_center_are_inverses() {
        for x in [-(Q as i64), -5, -1, 0, 1, 5, (Q as i64) / 2, Q as i64 - 1] {
            let r = lift(x, Q);
            assert_eq!(lift(center(r, Q), Q), r);
        }
        assert_eq!(center(Q - 1, Q), -1);
        assert_eq!(center(Q / 2, Q), (Q / 2) as i64);
        assert_eq!(center(Q / 2 + 1, Q), (Q / 2) as i64 + 1 - Q as i64);
    }

    #[test]
    fn abs_center_folds_both_halves() {
        assert_eq!(abs_center(0, 100), 0);
        assert_eq!(abs_center(5, 100), 5);
        assert_eq!(abs_center(95, 100), 5);
        assert_eq!(abs_center(50, 100), 50);
    }

    #[test]
    fn pow_mod_and_inverse() {
        let p: u64 = (1 << 31) - 1;
        for a in [2u64, 3, 65537, p - 1] {
            let inv = inv_mod(a, p);
            assert_eq!((a as u128 * inv as u128 % p as u128) as u64, 1);
        }
        assert_eq!(pow_mod(2, 10, 1_000_003), 1024);
    }

    #[test]
    fn vec_sub_stays_canonical() {
        // The documented law: vecSub([5,10,15], [2,12,5], 20) = [3, 18, 10].
        assert_eq!(vec_sub(&[5, 10, 15], &[2, 12, 5], 20), vec![3, 18, 10]);
    }

    #[test]
    #[should_panic(expected = "vector size mismatch")]
    fn vec_sub_panics_on_size_mismatch() {
        vec_sub(&[1, 2], &[1], 20);
    }
}
