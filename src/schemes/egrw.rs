//! Expander Graph Random Walk over the Cayley graph of SL(2, ℤ_p).
//!
//! The public key is the endpoint pair of a secret length-k walk; encryption
//! commits to a fresh walk and masks the message with a pad derived from the
//! product of its endpoint with v_end. Decryption realigns the paths by
//! recomputing v_end from the secret walk, so the secret key caches v_start.

use crate::algebra::sl2::{self, Sl2, GENERATOR_COUNT};
use crate::constants::{DST_EGRW_PAD, MSG_NUM_BYTES};
use crate::error::MosaicError;
use crate::params::EgrwParams;
use crate::sampling::uniform_below;
use crate::schemes::traits::ProblemScheme;
use crate::utils::serialization::{FieldReader, FieldWriter};
use crate::utils::shake256;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub struct Egrw;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgrwPublicKey {
    pub(crate) v_start: Sl2,
    pub(crate) v_end: Sl2,
}

#[derive(Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct EgrwSecretKey {
    /// The walk word, one generator index in {0,1,2,3} per step.
    pub(crate) walk: Vec<u8>,
    /// Start vertex, cached so decryption does not need the public key.
    pub(crate) v_start: Sl2,
}

#[cfg(feature = "assert-secret-keys-not-cloneable")]
static_assertions::assert_not_impl_any!(EgrwSecretKey: Clone);

impl fmt::Debug for EgrwSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EgrwSecretKey(<redacted>)")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgrwCiphertext {
    /// Endpoint of the encryptor's fresh walk.
    pub(crate) v_mid: Sl2,
    /// μ ⊕ SHAKE256(DST_EGRW_PAD || canonical(v_mid·v_end)).
    pub(crate) mask: [u8; MSG_NUM_BYTES],
}

/// Positionwise walk combination modulo the generator count:
/// `out[j] = (a[j] + c·b[j]) mod |G|`. The signature's third response is
/// exactly this combination.
pub fn combine_walks(a: &[u8], b: &[u8], c: u8) -> Vec<u8> {
    assert_eq!(a.len(), b.len(), "walk length mismatch");
    let g = GENERATOR_COUNT as u16;
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| ((x as u16 + c as u16 * y as u16) % g) as u8)
        .collect()
}

/// Samples a length-k walk word.
pub(crate) fn random_walk_word<R: RngCore + CryptoRng>(rng: &mut R, k: usize) -> Vec<u8> {
    (0..k)
        .map(|_| uniform_below(rng, GENERATOR_COUNT as u64) as u8)
        .collect()
}

fn pad_from_alignment(aligned: &Sl2, p: u64) -> [u8; MSG_NUM_BYTES] {
    let pad = shake256(&[DST_EGRW_PAD, &aligned.to_bytes(p)], MSG_NUM_BYTES);
    pad.try_into().expect("pad length is MSG_NUM_BYTES")
}

impl ProblemScheme for Egrw {
    type Params = EgrwParams;
    type PublicKey = EgrwPublicKey;
    type SecretKey = EgrwSecretKey;
    type Ciphertext = EgrwCiphertext;

    fn scheme_name() -> String {
        "egrw".to_string()
    }

    fn keygen<R: RngCore + CryptoRng>(pp: &EgrwParams, rng: &mut R) -> (EgrwPublicKey, EgrwSecretKey) {
        let walk = random_walk_word(rng, pp.k);
        let v_start = sl2::random_element(rng, pp.p);
        let v_end = sl2::walk(&v_start, &walk, pp.p);

        (
            EgrwPublicKey { v_start, v_end },
            EgrwSecretKey { walk, v_start },
        )
    }

    fn encrypt<R: RngCore + CryptoRng>(
        pp: &EgrwParams,
        pk: &EgrwPublicKey,
        msg: &[u8; MSG_NUM_BYTES],
        rng: &mut R,
    ) -> EgrwCiphertext {
        let fresh = random_walk_word(rng, pp.k);
        let v_mid = sl2::walk(&pk.v_start, &fresh, pp.p);

        let pad = pad_from_alignment(&v_mid.mul(&pk.v_end, pp.p), pp.p);
        let mut mask = [0u8; MSG_NUM_BYTES];
        for (slot, (&m, &p_byte)) in mask.iter_mut().zip(msg.iter().zip(pad.iter())) {
            *slot = m ^ p_byte;
        }

        EgrwCiphertext { v_mid, mask }
    }

    fn decrypt(pp: &EgrwParams, sk: &EgrwSecretKey, ct: &EgrwCiphertext) -> [u8; MSG_NUM_BYTES] {
        // Path alignment: rebuild v_end by walking the secret word.
        let v_end = sl2::walk(&sk.v_start, &sk.walk, pp.p);
        let pad = pad_from_alignment(&ct.v_mid.mul(&v_end, pp.p), pp.p);

        let mut msg = [0u8; MSG_NUM_BYTES];
        for (slot, (&m, &p_byte)) in msg.iter_mut().zip(ct.mask.iter().zip(pad.iter())) {
            *slot = m ^ p_byte;
        }
        msg
    }

    fn serialize_public_key(pp: &EgrwParams, pk: &EgrwPublicKey) -> Vec<u8> {
        let mut w = FieldWriter::new();
        w.put_block(&pk.v_start.to_bytes(pp.p));
        w.put_block(&pk.v_end.to_bytes(pp.p));
        w.into_bytes()
    }

    fn deserialize_public_key(pp: &EgrwParams, bytes: &[u8]) -> Result<EgrwPublicKey, MosaicError> {
        let mut r = FieldReader::new(bytes);
        let v_start = Sl2::from_bytes(r.next_block()?, pp.p)?;
        let v_end = Sl2::from_bytes(r.next_block()?, pp.p)?;
        r.finish()?;
        Ok(EgrwPublicKey { v_start, v_end })
    }

    fn serialize_ciphertext(pp: &EgrwParams, ct: &EgrwCiphertext) -> Vec<u8> {
        let mut w = FieldWriter::new();
        w.put_block(&ct.v_mid.to_bytes(pp.p));
        w.put_block(&ct.mask);
        w.into_bytes()
    }

    fn deserialize_ciphertext(pp: &EgrwParams, bytes: &[u8]) -> Result<EgrwCiphertext, MosaicError> {
        let mut r = FieldReader::new(bytes);
        let v_mid = Sl2::from_bytes(r.next_block()?, pp.p)?;
        let mask: [u8; MSG_NUM_BYTES] = r
            .next_block()?
            .try_into()
            .map_err(|_| MosaicError::Serialization("mask length mismatch"))?;
        r.finish()?;
        Ok(EgrwCiphertext { v_mid, mask })
    }
}
