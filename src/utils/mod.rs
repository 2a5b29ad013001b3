use crate::constants::{DIGEST_NUM_BYTES, MAX_SEED_PERIOD, MIN_DISTINCT_SEED_BYTES, SEED_NUM_BYTES};
use crate::error::MosaicError;
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Digest, Sha3_256, Shake256};

pub mod constant_time;
pub(crate) mod serialization;

/// SHA3-256 over the concatenation of `parts`.
pub fn sha3_256(parts: &[&[u8]]) -> [u8; DIGEST_NUM_BYTES] {
    let mut hasher = Sha3_256::new();
    for part in parts {
        Digest::update(&mut hasher, part);
    }
    hasher.finalize().into()
}

/// SHAKE256 over the concatenation of `parts`, squeezed to `out_len` bytes.
pub fn shake256(parts: &[&[u8]], out_len: usize) -> Vec<u8> {
    let mut hasher = Shake256::default();
    for part in parts {
        Update::update(&mut hasher, part);
    }
    let mut out = vec![0u8; out_len];
    hasher.finalize_xof().read(&mut out);
    out
}

/// Rejects seed material that is visibly structured: shorter than 32 bytes,
/// a single repeated byte, a stride-1 ascending or descending run, a
/// repetition with period at most 4, or fewer than 8 distinct byte values.
///
/// This is a cheap sanity net against broken randomness sources, not an
/// entropy estimator.
pub fn validate_seed_entropy(seed: &[u8]) -> Result<(), MosaicError> {
    if seed.len() < SEED_NUM_BYTES {
        return Err(MosaicError::InsufficientEntropy);
    }

    let mut seen = [false; 256];
    let mut distinct = 0usize;
    for &b in seed {
        if !seen[b as usize] {
            seen[b as usize] = true;
            distinct += 1;
        }
    }
    if distinct < MIN_DISTINCT_SEED_BYTES {
        return Err(MosaicError::InsufficientEntropy);
    }

    let ascending = seed
        .windows(2)
        .all(|pair| pair[1] == pair[0].wrapping_add(1));
    let descending = seed
        .windows(2)
        .all(|pair| pair[1] == pair[0].wrapping_sub(1));
    if ascending || descending {
        return Err(MosaicError::InsufficientEntropy);
    }

    for period in 1..=MAX_SEED_PERIOD {
        if (period..seed.len()).all(|i| seed[i] == seed[i - period]) {
            return Err(MosaicError::InsufficientEntropy);
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hash_helpers_concatenate() {
        // Split points must not influence the digest.
        assert_eq!(
            sha3_256(&[b"ab", b"cd"]),
            sha3_256(&[b"a", b"bcd"]),
        );
        assert_eq!(shake256(&[b"ab", b"cd"], 64), shake256(&[b"abcd"], 64));

        // A prefix of a longer squeeze is the shorter squeeze.
        let long = shake256(&[b"seed"], 96);
        let short = shake256(&[b"seed"], 32);
        assert_eq!(&long[..32], short.as_slice());
    }

    #[test]
    fn entropy_rejects_short_seeds() {
        assert_eq!(
            validate_seed_entropy(&[0xaa; 31]),
            Err(MosaicError::InsufficientEntropy)
        );
    }

    #[test]
    fn entropy_rejects_structured_seeds() {
        // 32 identical bytes.
        assert!(validate_seed_entropy(&[0x41; 32]).is_err());

        // Ascending and descending stride-1 runs.
        let up: Vec<u8> = (0..32).collect();
        let down: Vec<u8> = (0..32).rev().collect();
        assert!(validate_seed_entropy(&up).is_err());
        assert!(validate_seed_entropy(&down).is_err());

        // Period-4 repetition.
        let mut periodic = [0u8; 32];
        for (i, b) in periodic.iter_mut().enumerate() {
            *b = [0xde, 0xad, 0xbe, 0xef][i % 4];
        }
        assert!(validate_seed_entropy(&periodic).is_err());

        // Fewer than 8 distinct values.
        let mut few = [0u8; 32];
        for (i, b) in few.iter_mut().enumerate() {
            *b = (i % 7) as u8 * 31;
        }
        assert!(validate_seed_entropy(&few).is_err());
    }

    #[test]
    fn entropy_accepts_a_csprng_looking_seed() {
        // SHAKE output stands in for CSPRNG bytes.
        let seed = shake256(&[b"entropy-test"], 32);
        validate_seed_entropy(&seed).unwrap();
    }
}
