//! Sparse Lattice Subset Sum: LWE-style encryption with a sparse ternary
//! secret.
//!
//! The public matrix A is expanded from a 32-byte seed and only the seed
//! travels on the wire; `t = A·s + e` pins the instance. The secret key
//! keeps the error vector `e` alongside `s`: the signature protocol needs it
//! as a second witness to make its verification equation exact.

use crate::algebra::matrix::{dot, vec_add, Matrix};
use crate::algebra::zq::{add_mod, mul_mod, sub_mod};
use crate::constants::{MSG_NUM_BITS, MSG_NUM_BYTES, SEED_NUM_BYTES};
use crate::error::MosaicError;
use crate::params::SlssParams;
use crate::sampling::{gaussian_zq, sparse_ternary};
use crate::schemes::traits::ProblemScheme;
use crate::schemes::{message_bit, threshold_decode};
use crate::utils::serialization::{scalars_from_bytes, scalars_to_bytes, FieldReader, FieldWriter};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub struct Slss;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlssPublicKey {
    /// Seed the matrix A is expanded from.
    pub(crate) seed_a: [u8; SEED_NUM_BYTES],
    /// t = A·s + e mod q.
    pub(crate) t: Vec<u32>,
    /// Expanded A; rebuilt from `seed_a` on deserialization.
    pub(crate) a: Matrix,
}

#[derive(Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct SlssSecretKey {
    /// Sparse ternary secret (ℤ_q form), exactly w nonzero entries.
    pub(crate) s: Vec<u32>,
    /// LWE error of the instance; doubles as a signing witness.
    pub(crate) e: Vec<u32>,
}

#[cfg(feature = "assert-secret-keys-not-cloneable")]
static_assertions::assert_not_impl_any!(SlssSecretKey: Clone);

impl fmt::Debug for SlssSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlssSecretKey(<redacted>)")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlssCiphertext {
    /// u = Aᵀ·r + e₁ mod q.
    pub(crate) u: Vec<u32>,
    /// v_i = ⟨t, r⟩ + e₂ᵢ + ⌊q/2⌋·μᵢ mod q, one entry per message bit.
    pub(crate) v: Vec<u32>,
}

impl ProblemScheme for Slss {
    type Params = SlssParams;
    type PublicKey = SlssPublicKey;
    type SecretKey = SlssSecretKey;
    type Ciphertext = SlssCiphertext;

    fn scheme_name() -> String {
        "slss".to_string()
    }

    fn keygen<R: RngCore + CryptoRng>(pp: &SlssParams, rng: &mut R) -> (SlssPublicKey, SlssSecretKey) {
        let mut seed_a = [0u8; SEED_NUM_BYTES];
        rng.fill_bytes(&mut seed_a);
        let a = Matrix::expand_from_seed(&seed_a, pp.m, pp.n, pp.q);

        let s = sparse_ternary(rng, pp.n, pp.w, pp.q);
        let e: Vec<u32> = (0..pp.m).map(|_| gaussian_zq(rng, pp.q)).collect();
        let t = vec_add(&a.mul_vec(&s, pp.q), &e, pp.q);

        (SlssPublicKey { seed_a, t, a }, SlssSecretKey { s, e })
    }

    fn encrypt<R: RngCore + CryptoRng>(
        pp: &SlssParams,
        pk: &SlssPublicKey,
        msg: &[u8; MSG_NUM_BYTES],
        rng: &mut R,
    ) -> SlssCiphertext {
        let q = pp.q;
        let half = q / 2;

        let r = sparse_ternary(rng, pp.m, pp.w, q);
        let e1: Vec<u32> = (0..pp.n).map(|_| gaussian_zq(rng, q)).collect();
        let u = vec_add(&pk.a.mul_transpose_vec(&r, q), &e1, q);

        // One scalar pad shared across bit positions; fresh Gaussian noise
        // per bit.
        let pad = dot(&pk.t, &r, q);
        let mut v = Vec::with_capacity(MSG_NUM_BITS);
        for i in 0..MSG_NUM_BITS {
            let noisy = add_mod(pad, gaussian_zq(rng, q), q);
            let mask = mul_mod(half, message_bit(msg, i), q);
            v.push(add_mod(noisy, mask, q));
        }

        SlssCiphertext { u, v }
    }

    fn decrypt(pp: &SlssParams, sk: &SlssSecretKey, ct: &SlssCiphertext) -> [u8; MSG_NUM_BYTES] {
        assert_eq!(ct.u.len(), pp.n, "ciphertext dimension mismatch");
        assert_eq!(ct.v.len(), MSG_NUM_BITS, "ciphertext dimension mismatch");

        let inner = dot(&sk.s, &ct.u, pp.q);
        let mut msg = [0u8; MSG_NUM_BYTES];
        for (i, &vi) in ct.v.iter().enumerate() {
            let carrier = sub_mod(vi, inner, pp.q);
            msg[i / 8] |= threshold_decode(carrier, pp.q) << (i % 8);
        }
        msg
    }

    fn serialize_public_key(_pp: &SlssParams, pk: &SlssPublicKey) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(SEED_NUM_BYTES + pk.t.len() * 4 + 16);
        w.put_block(&pk.seed_a);
        w.put_block(&scalars_to_bytes(&pk.t));
        w.into_bytes()
    }

    fn deserialize_public_key(pp: &SlssParams, bytes: &[u8]) -> Result<SlssPublicKey, MosaicError> {
        let mut r = FieldReader::new(bytes);
        let seed_block = r.next_block()?;
        let seed_a: [u8; SEED_NUM_BYTES] = seed_block
            .try_into()
            .map_err(|_| MosaicError::Serialization("matrix seed length mismatch"))?;
        let t = scalars_from_bytes(r.next_block()?, pp.m, pp.q)?;
        r.finish()?;

        let a = Matrix::expand_from_seed(&seed_a, pp.m, pp.n, pp.q);
        Ok(SlssPublicKey { seed_a, t, a })
    }

    fn serialize_ciphertext(_pp: &SlssParams, ct: &SlssCiphertext) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity((ct.u.len() + ct.v.len()) * 4 + 8);
        w.put_block(&scalars_to_bytes(&ct.u));
        w.put_block(&scalars_to_bytes(&ct.v));
        w.into_bytes()
    }

    fn deserialize_ciphertext(pp: &SlssParams, bytes: &[u8]) -> Result<SlssCiphertext, MosaicError> {
        let mut r = FieldReader::new(bytes);
        let u = scalars_from_bytes(r.next_block()?, pp.n, pp.q)?;
        let v = scalars_from_bytes(r.next_block()?, MSG_NUM_BITS, pp.q)?;
        r.finish()?;
        Ok(SlssCiphertext { u, v })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::{Params, SecurityLevel};
    use rand::thread_rng;

    #[test]
    fn encrypt_decrypt_round_trips() {
        let mut rng = thread_rng();
        for level in [SecurityLevel::Mos128, SecurityLevel::Mos256] {
            let pp = Params::new(level).slss;
            let (pk, sk) = Slss::keygen(&pp, &mut rng);

            for msg in [[0u8; 32], [0xff; 32], {
                let mut m = [0u8; 32];
                rng.fill_bytes(&mut m);
                m
            }] {
                let ct = Slss::encrypt(&pp, &pk, &msg, &mut rng);
                assert_eq!(Slss::decrypt(&pp, &sk, &ct), msg);
            }
        }
    }

    #[test]
    fn wrong_key_decrypts_to_garbage() {
        let mut rng = thread_rng();
        let pp = Params::new(SecurityLevel::Mos128).slss;
        let (pk, _sk1) = Slss::keygen(&pp, &mut rng);
        let (_pk2, sk2) = Slss::keygen(&pp, &mut rng);

        let msg = [0x5au8; 32];
        let ct = Slss::encrypt(&pp, &pk, &msg, &mut rng);
        assert_ne!(Slss::decrypt(&pp, &sk2, &ct), msg);
    }

    #[test]
    fn secret_key_has_exact_weight() {
        let mut rng = thread_rng();
        let pp = Params::new(SecurityLevel::Mos128).slss;
        let (_pk, sk) = Slss::keygen(&pp, &mut rng);
        assert_eq!(sk.s.iter().filter(|&&x| x != 0).count(), pp.w);
    }

    #[test]
    fn public_key_and_ciphertext_round_trip_on_the_wire() {
        let mut rng = thread_rng();
        let pp = Params::new(SecurityLevel::Mos128).slss;
        let (pk, _sk) = Slss::keygen(&pp, &mut rng);

        let bytes = Slss::serialize_public_key(&pp, &pk);
        let parsed = Slss::deserialize_public_key(&pp, &bytes).unwrap();
        assert_eq!(parsed, pk);
        assert_eq!(Slss::serialize_public_key(&pp, &parsed), bytes);

        let ct = Slss::encrypt(&pp, &pk, &[7u8; 32], &mut rng);
        let ct_bytes = Slss::serialize_ciphertext(&pp, &ct);
        assert_eq!(
            Slss::deserialize_ciphertext(&pp, &ct_bytes).unwrap(),
            ct
        );

        assert!(Slss::deserialize_ciphertext(&pp, &ct_bytes[..ct_bytes.len() - 2]).is_err());
    }
}
