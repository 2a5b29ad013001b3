//! The glue that makes three independent schemes one system: 3-of-3 XOR
//! sharing, the binding digest that ties the sub-keys into a composite
//! identity, hash commitments, and the encapsulation-consistency proof.

use crate::constants::{DIGEST_NUM_BYTES, DST_BIND, DST_COMMIT, SEED_NUM_BYTES};
use crate::utils::sha3_256;
use rand_core::{CryptoRng, RngCore};

pub mod nizk;

pub use nizk::ConsistencyProof;

/// Splits a 32-byte master secret into three shares with
/// K₁ ⊕ K₂ ⊕ K₃ = K. All three shares are required to reconstruct; any two
/// are jointly uniform.
pub fn xor_split<R: RngCore + CryptoRng>(
    secret: &[u8; SEED_NUM_BYTES],
    rng: &mut R,
) -> [[u8; SEED_NUM_BYTES]; 3] {
    let mut k1 = [0u8; SEED_NUM_BYTES];
    let mut k2 = [0u8; SEED_NUM_BYTES];
    rng.fill_bytes(&mut k1);
    rng.fill_bytes(&mut k2);

    let mut k3 = [0u8; SEED_NUM_BYTES];
    for i in 0..SEED_NUM_BYTES {
        k3[i] = secret[i] ^ k1[i] ^ k2[i];
    }
    [k1, k2, k3]
}

/// Recombines all three shares.
pub fn xor_combine(shares: &[[u8; SEED_NUM_BYTES]; 3]) -> [u8; SEED_NUM_BYTES] {
    let mut out = [0u8; SEED_NUM_BYTES];
    for i in 0..SEED_NUM_BYTES {
        out[i] = shares[0][i] ^ shares[1][i] ^ shares[2][i];
    }
    out
}

/// The composite-key binding digest. Mixing sub-keys from distinct keypairs
/// changes this value, which every challenge derivation folds in.
pub fn binding_digest(slss: &[u8], tdd: &[u8], egrw: &[u8]) -> [u8; DIGEST_NUM_BYTES] {
    sha3_256(&[DST_BIND, slss, tdd, egrw])
}

/// `commit(m, r) = SHA3-256(DST_COMMIT || r || m)` with 32 bytes of
/// randomness; opening reveals (m, r).
pub fn commit(message: &[u8], randomness: &[u8; SEED_NUM_BYTES]) -> [u8; DIGEST_NUM_BYTES] {
    sha3_256(&[DST_COMMIT, randomness, message])
}
