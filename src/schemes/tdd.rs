//! Tensor Decomposition Distinguishing: the public key is a rank-r tensor
//! buried in Gaussian noise; decryption exploits the low-rank structure to
//! evaluate contractions without touching the noise tensor.
//!
//! The contraction probes x, y and the per-bit vectors u_k are dense ternary:
//! the decryption residual is the noise tensor contracted against them, and
//! it only stays below the q/4 decoding threshold when every probe
//! coefficient is small. The u_k are expanded from a seed carried in the
//! ciphertext.

use crate::algebra::matrix::dot;
use crate::algebra::tensor::Tensor3;
use crate::algebra::zq::{add_mod, mul_mod, sub_mod};
use crate::constants::{DST_TDD_U, MSG_NUM_BITS, MSG_NUM_BYTES, SEED_NUM_BYTES};
use crate::error::MosaicError;
use crate::params::TddParams;
use crate::sampling::{dense_ternary, gaussian_zq, uniform_zq_vec, Shake256Rng};
use crate::schemes::traits::ProblemScheme;
use crate::schemes::{message_bit, threshold_decode};
use crate::utils::serialization::{scalars_from_bytes, scalars_to_bytes, FieldReader, FieldWriter};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub struct Tdd;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TddPublicKey {
    /// T = Σᵢ aᵢ ⊗ bᵢ ⊗ cᵢ + E mod q.
    pub(crate) tensor: Tensor3,
}

#[derive(Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct TddSecretKey {
    /// The r factor triples, each vector of length n (ℤ_q form).
    pub(crate) factors_a: Vec<Vec<u32>>,
    pub(crate) factors_b: Vec<Vec<u32>>,
    pub(crate) factors_c: Vec<Vec<u32>>,
}

#[cfg(feature = "assert-secret-keys-not-cloneable")]
static_assertions::assert_not_impl_any!(TddSecretKey: Clone);

impl fmt::Debug for TddSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TddSecretKey(<redacted>)")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TddCiphertext {
    pub(crate) x: Vec<u32>,
    pub(crate) y: Vec<u32>,
    /// Seed the per-bit vectors u_k are expanded from.
    pub(crate) u_seed: [u8; SEED_NUM_BYTES],
    /// c_k = ⟨d, u_k⟩ + ⌊q/2⌋·μ_k, one entry per message bit.
    pub(crate) c: Vec<u32>,
}

/// Expands the 256 per-bit probe vectors from the ciphertext seed.
fn expand_u_vectors(pp: &TddParams, seed: &[u8; SEED_NUM_BYTES]) -> Vec<Vec<u32>> {
    let mut rng = Shake256Rng::from_seed(DST_TDD_U, seed);
    (0..MSG_NUM_BITS)
        .map(|_| dense_ternary(&mut rng, pp.n, pp.q))
        .collect()
}

impl ProblemScheme for Tdd {
    type Params = TddParams;
    type PublicKey = TddPublicKey;
    type SecretKey = TddSecretKey;
    type Ciphertext = TddCiphertext;

    fn scheme_name() -> String {
        "tdd".to_string()
    }

    fn keygen<R: RngCore + CryptoRng>(pp: &TddParams, rng: &mut R) -> (TddPublicKey, TddSecretKey) {
        let factors_a: Vec<Vec<u32>> = (0..pp.r).map(|_| uniform_zq_vec(rng, pp.n, pp.q)).collect();
        let factors_b: Vec<Vec<u32>> = (0..pp.r).map(|_| uniform_zq_vec(rng, pp.n, pp.q)).collect();
        let factors_c: Vec<Vec<u32>> = (0..pp.r).map(|_| uniform_zq_vec(rng, pp.n, pp.q)).collect();

        let mut tensor = Tensor3::zero(pp.n);
        for i in 0..pp.r {
            tensor.add_outer_product(&factors_a[i], &factors_b[i], &factors_c[i], pp.q);
        }
        // Entry-wise Gaussian noise E.
        for i in 0..pp.n {
            for j in 0..pp.n {
                for l in 0..pp.n {
                    tensor.add_assign_entry(i, j, l, gaussian_zq(rng, pp.q), pp.q);
                }
            }
        }

        (
            TddPublicKey { tensor },
            TddSecretKey {
                factors_a,
                factors_b,
                factors_c,
            },
        )
    }

    fn encrypt<R: RngCore + CryptoRng>(
        pp: &TddParams,
        pk: &TddPublicKey,
        msg: &[u8; MSG_NUM_BYTES],
        rng: &mut R,
    ) -> TddCiphertext {
        let q = pp.q;
        let half = q / 2;

        let x = dense_ternary(rng, pp.n, q);
        let y = dense_ternary(rng, pp.n, q);
        let mut u_seed = [0u8; SEED_NUM_BYTES];
        rng.fill_bytes(&mut u_seed);
        let u_vectors = expand_u_vectors(pp, &u_seed);

        // Contract T against (x, y) once; each bit then costs one dot
        // product with its u_k.
        let d = pk.tensor.contract_xy(&x, &y, q);
        let c = (0..MSG_NUM_BITS)
            .map(|k| {
                let kappa = dot(&d, &u_vectors[k], q);
                add_mod(kappa, mul_mod(half, message_bit(msg, k), q), q)
            })
            .collect();

        TddCiphertext { x, y, u_seed, c }
    }

    fn decrypt(pp: &TddParams, sk: &TddSecretKey, ct: &TddCiphertext) -> [u8; MSG_NUM_BYTES] {
        assert_eq!(ct.x.len(), pp.n, "ciphertext dimension mismatch");
        assert_eq!(ct.y.len(), pp.n, "ciphertext dimension mismatch");
        assert_eq!(ct.c.len(), MSG_NUM_BITS, "ciphertext dimension mismatch");

        let q = pp.q;
        // The rank-r part of the contraction, noise-free:
        // d'[l] = Σᵢ ⟨aᵢ,x⟩·⟨bᵢ,y⟩·cᵢ[l].
        let mut d = vec![0u32; pp.n];
        for i in 0..sk.factors_a.len() {
            let coeff = mul_mod(
                dot(&sk.factors_a[i], &ct.x, q),
                dot(&sk.factors_b[i], &ct.y, q),
                q,
            );
            for (slot, &cl) in d.iter_mut().zip(sk.factors_c[i].iter()) {
                *slot = add_mod(*slot, mul_mod(coeff, cl, q), q);
            }
        }

        let u_vectors = expand_u_vectors(pp, &ct.u_seed);
        let mut msg = [0u8; MSG_NUM_BYTES];
        for (k, &ck) in ct.c.iter().enumerate() {
            let kappa = dot(&d, &u_vectors[k], q);
            let carrier = sub_mod(ck, kappa, q);
            msg[k / 8] |= threshold_decode(carrier, q) << (k % 8);
        }
        msg
    }

    fn serialize_public_key(pp: &TddParams, pk: &TddPublicKey) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(pp.n * pp.n * pp.n * 4 + 8);
        w.put_block(&scalars_to_bytes(pk.tensor.entries()));
        w.into_bytes()
    }

    fn deserialize_public_key(pp: &TddParams, bytes: &[u8]) -> Result<TddPublicKey, MosaicError> {
        let mut r = FieldReader::new(bytes);
        let entries = scalars_from_bytes(r.next_block()?, pp.n * pp.n * pp.n, pp.q)?;
        r.finish()?;
        Ok(TddPublicKey {
            tensor: Tensor3::from_entries(pp.n, entries),
        })
    }

    fn serialize_ciphertext(_pp: &TddParams, ct: &TddCiphertext) -> Vec<u8> {
        let mut w = FieldWriter::new();
        w.put_block(&scalars_to_bytes(&ct.x));
        w.put_block(&scalars_to_bytes(&ct.y));
        w.put_block(&ct.u_seed);
        w.put_block(&scalars_to_bytes(&ct.c));
        w.into_bytes()
    }

    fn deserialize_ciphertext(pp: &TddParams, bytes: &[u8]) -> Result<TddCiphertext, MosaicError> {
        let mut r = FieldReader::new(bytes);
        let x = scalars_from_bytes(r.next_block()?, pp.n, pp.q)?;
        let y = scalars_from_bytes(r.next_block()?, pp.n, pp.q)?;
        let u_seed: [u8; SEED_NUM_BYTES] = r
            .next_block()?
            .try_into()
            .map_err(|_| MosaicError::Serialization("probe seed length mismatch"))?;
        let c = scalars_from_bytes(r.next_block()?, MSG_NUM_BITS, pp.q)?;
        r.finish()?;
        Ok(TddCiphertext { x, y, u_seed, c })
    }
}
