//! Samplers shared by the three problem schemes. Every function is generic
//! over `R: RngCore + CryptoRng`, so the same code runs off the system RNG
//! and off a [`Shake256Rng`] during deterministic re-encryption.
//!
//! Secrets produced here are returned in ℤ_q form (canonical residues), so
//! downstream arithmetic never handles signed representations.

use crate::algebra::zq::lift;
use crate::params::GAUSSIAN_SIGMA;
use more_asserts::assert_le;
use once_cell::sync::Lazy;
use rand_core::{CryptoRng, RngCore};

mod xof;

pub use xof::Shake256Rng;

/// Support cut of the Gaussian sampler: 6σ.
const GAUSSIAN_TAIL: i64 = 18;

const GAUSSIAN_SUPPORT: usize = (2 * GAUSSIAN_TAIL + 1) as usize;

/// 63-bit cumulative thresholds of the centered discrete Gaussian over
/// [−6σ, 6σ]. Only the first 2·6σ boundaries are stored: a draw above all of
/// them decodes to +6σ. The tail mass beyond the cut is below 2⁻⁶³ per draw,
/// and every threshold stays strictly below 2⁶³ so the sampler's signed
/// comparison is exact.
static GAUSSIAN_CDT: Lazy<[u64; GAUSSIAN_SUPPORT - 1]> = Lazy::new(|| {
    let mut weights = [0f64; GAUSSIAN_SUPPORT];
    for (i, w) in weights.iter_mut().enumerate() {
        let x = i as f64 - GAUSSIAN_TAIL as f64;
        *w = (-(x * x) / (2.0 * GAUSSIAN_SIGMA * GAUSSIAN_SIGMA)).exp();
    }
    let total: f64 = weights.iter().sum();

    let scale = (1u64 << 63) as f64;
    let mut table = [0u64; GAUSSIAN_SUPPORT - 1];
    let mut cumulative = 0f64;
    for (slot, w) in table.iter_mut().zip(weights.iter()) {
        cumulative += w / total;
        *slot = (cumulative * scale).round() as u64;
    }
    table
});

/// Centered discrete Gaussian over ℤ with σ = 3.0, by CDT inversion. The
/// walk always visits the whole table.
pub fn gaussian<R: RngCore + CryptoRng>(rng: &mut R) -> i32 {
    let r = rng.next_u64() >> 1;
    let mut count: i64 = 0;
    for &threshold in GAUSSIAN_CDT.iter() {
        // 1 iff threshold ≤ r, without branching on the draw; both sides are
        // below 2⁶³, so the subtraction cannot wrap.
        count += (((threshold as i64) - (r as i64) - 1) >> 63) & 1;
    }
    (count - GAUSSIAN_TAIL) as i32
}

/// Gaussian sample lifted into ℤ_q form.
pub fn gaussian_zq<R: RngCore + CryptoRng>(rng: &mut R, q: u32) -> u32 {
    lift(gaussian(rng) as i64, q)
}

/// Rejection-samples a uniform value in `[0, bound)` from the smallest
/// power-of-two window covering it.
pub fn uniform_below<R: RngCore + CryptoRng>(rng: &mut R, bound: u64) -> u64 {
    debug_assert!(bound > 0);
    if bound == 1 {
        return 0;
    }
    let bits = 64 - (bound - 1).leading_zeros();
    let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
    loop {
        let candidate = rng.next_u64() & mask;
        if candidate < bound {
            return candidate;
        }
    }
}

/// Uniform ℤ_q scalar.
pub fn uniform_zq<R: RngCore + CryptoRng>(rng: &mut R, q: u32) -> u32 {
    uniform_below(rng, q as u64) as u32
}

/// Uniform vector over ℤ_q.
pub fn uniform_zq_vec<R: RngCore + CryptoRng>(rng: &mut R, n: usize, q: u32) -> Vec<u32> {
    (0..n).map(|_| uniform_zq(rng, q)).collect()
}

/// Uniform value in `[−bound, bound]`, returned in ℤ_q form. Used for the
/// signing blinds.
pub fn uniform_centered<R: RngCore + CryptoRng>(rng: &mut R, bound: u32, q: u32) -> u32 {
    let spread = 2 * bound as u64 + 1;
    let v = uniform_below(rng, spread) as i64 - bound as i64;
    lift(v, q)
}

/// Sparse ternary vector: exactly `w` entries in {−1, +1} at uniform
/// positions, everything else zero. Returned in ℤ_q form.
pub fn sparse_ternary<R: RngCore + CryptoRng>(rng: &mut R, n: usize, w: usize, q: u32) -> Vec<u32> {
    assert_le!(w, n, "sparse weight exceeds dimension");
    // Partial Fisher–Yates: the first w slots of the permutation are the
    // support.
    let mut indices: Vec<u32> = (0..n as u32).collect();
    for i in 0..w {
        let j = i + uniform_below(rng, (n - i) as u64) as usize;
        indices.swap(i, j);
    }

    let mut v = vec![0u32; n];
    for &idx in &indices[..w] {
        let sign = rng.next_u32() & 1;
        // sign = 1 → +1, sign = 0 → q−1 (i.e. −1).
        v[idx as usize] = 1 + (1 - sign) * (q - 2);
    }
    v
}

/// Dense ternary vector: i.i.d. uniform over {−1, 0, +1}, ℤ_q form.
pub fn dense_ternary<R: RngCore + CryptoRng>(rng: &mut R, n: usize, q: u32) -> Vec<u32> {
    (0..n)
        .map(|_| {
            let t = uniform_below(rng, 3) as u32;
            // 0 → 0, 1 → 1, 2 → q−1, without a lookup.
            (t & 1) + (t >> 1) * (q - 1)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algebra::zq::center;
    use rand::thread_rng;

    const Q: u32 = 7681;

    #[test]
    fn gaussian_is_bounded_and_roughly_centered() {
        let mut rng = thread_rng();
        let mut sum: i64 = 0;
        let mut sum_sq: i64 = 0;
        let samples = 20_000;
        for _ in 0..samples {
            let x = gaussian(&mut rng) as i64;
            assert!(x.abs() <= GAUSSIAN_TAIL);
            sum += x;
            sum_sq += x * x;
        }
        // Mean within 0 ± 5σ/√N and variance in a generous window around σ².
        let mean = sum as f64 / samples as f64;
        let var = sum_sq as f64 / samples as f64 - mean * mean;
        assert!(mean.abs() < 0.15, "mean {mean}");
        assert!((6.0..12.0).contains(&var), "variance {var}");
    }

    #[test]
    fn uniform_below_stays_below() {
        let mut rng = thread_rng();
        for bound in [1u64, 2, 3, 5, 4096, Q as u64, (1 << 61) - 1] {
            for _ in 0..200 {
                assert!(uniform_below(&mut rng, bound) < bound);
            }
        }
    }

    #[test]
    fn sparse_ternary_has_exact_weight() {
        let mut rng = thread_rng();
        for (n, w) in [(512usize, 64usize), (1024, 96), (16, 16), (8, 0)] {
            let v = sparse_ternary(&mut rng, n, w, Q);
            assert_eq!(v.len(), n);
            let nonzero = v.iter().filter(|&&x| x != 0).count();
            assert_eq!(nonzero, w);
            assert!(v.iter().all(|&x| x == 0 || x == 1 || x == Q - 1));
        }
    }

    #[test]
    fn dense_ternary_is_ternary() {
        let mut rng = thread_rng();
        let v = dense_ternary(&mut rng, 4096, Q);
        assert!(v.iter().all(|&x| x == 0 || x == 1 || x == Q - 1));
        // All three values should show up in 4096 draws.
        for target in [0, 1, Q - 1] {
            assert!(v.contains(&target));
        }
    }

    #[test]
    fn uniform_centered_respects_its_window() {
        let mut rng = thread_rng();
        for bound in [1u32, 135, 1080] {
            for _ in 0..500 {
                let x = uniform_centered(&mut rng, bound, Q);
                assert!(center(x, Q).unsigned_abs() <= bound as u64);
            }
        }
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let mut a = Shake256Rng::from_seed(b"test", b"seed");
        let mut b = Shake256Rng::from_seed(b"test", b"seed");
        assert_eq!(
            sparse_ternary(&mut a, 512, 64, Q),
            sparse_ternary(&mut b, 512, 64, Q)
        );
        assert_eq!(gaussian(&mut a), gaussian(&mut b));
        assert_eq!(uniform_zq_vec(&mut a, 32, Q), uniform_zq_vec(&mut b, 32, Q));
    }
}
