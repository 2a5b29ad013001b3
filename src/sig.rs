//! Multi-witness Fiat–Shamir signature over the three problem keys.
//!
//! The signer walks Init → Commit → Challenge → Response; a norm rejection
//! loops back to Commit with fresh blinds, a retry-budget overrun terminates
//! in Exhaust, and an accepted response terminates in Emit. Each scheme
//! contributes a `{response, commitment, opening}` triple:
//!
//! - SLSS runs the exact linear protocol. The commitment vector is
//!   `W = A·y + y_e`, and the response carries both `z_s = y + c₁·s` and
//!   `z_e = y_e + c₁·e`; verification recomputes `W = A·z_s + z_e − c₁·t`
//!   exactly because the secret key keeps the LWE error as a second witness.
//! - TDD and EGRW have no exact linear identity, so the prover commits to
//!   both candidate responses ahead of the challenge (their probe
//!   fingerprints and walk endpoints respectively) and the opening lets the
//!   verifier check the slot the sub-challenge selects.

use crate::algebra::matrix::{dot, vec_add, vec_scale};
use crate::algebra::sl2::{self, Sl2, GENERATOR_COUNT};
use crate::algebra::zq::{abs_center, add_mod, mul_mod, vec_sub};
use crate::constants::{
    DIGEST_NUM_BYTES, DST_SIG_C, DST_SIG_SUBC, DST_TDD_FP, DST_TDD_PROBE, SCALAR_NUM_BYTES,
    SEED_NUM_BYTES, SIG_ERROR_SLACK,
};
use crate::entangle::commit;
use crate::error::MosaicError;
use crate::kem::{MosaicPublicKey, MosaicSecretKey};
use crate::params::Params;
use crate::sampling::{uniform_centered, uniform_zq_vec, Shake256Rng};
use crate::schemes::egrw::{combine_walks, random_walk_word};
use crate::schemes::tdd::Tdd;
use crate::schemes::ProblemScheme;
use crate::utils::constant_time::ct_eq_bool;
use crate::utils::serialization::{scalars_from_bytes, scalars_to_bytes, FieldReader, FieldWriter};
use crate::utils::{sha3_256, shake256};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use zeroize::Zeroizing;

/// One scheme's share of the signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeResponse {
    #[serde(with = "serde_bytes")]
    pub response: Vec<u8>,
    pub commitment: [u8; DIGEST_NUM_BYTES],
    #[serde(with = "serde_bytes")]
    pub opening: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// SHA3-256(w₁ || w₂ || w₃).
    pub commitment: [u8; DIGEST_NUM_BYTES],
    pub challenge: [u8; DIGEST_NUM_BYTES],
    pub z1: SchemeResponse,
    pub z2: SchemeResponse,
    pub z3: SchemeResponse,
}

/// Accepts iff every coordinate's centered magnitude `min(x, q − x)` is at
/// most `beta`.
pub fn check_norm(v: &[u32], beta: u32, q: u32) -> bool {
    v.iter().all(|&x| abs_center(x, q) <= beta)
}

/// Expands the challenge into the three binary sub-challenges.
fn sub_challenges(challenge: &[u8; DIGEST_NUM_BYTES]) -> (u32, u8, u8) {
    let bytes = shake256(&[DST_SIG_SUBC, challenge], 3);
    ((bytes[0] & 1) as u32, bytes[1] & 1, bytes[2] & 1)
}

/// Probe vectors for the TDD fingerprint, fixed by the public tensor.
struct TddProbes {
    px: Vec<u32>,
    py: Vec<u32>,
    pz: Vec<u32>,
}

fn tdd_probes(pp: &Params, pk: &MosaicPublicKey) -> TddProbes {
    let tensor_bytes = Tdd::serialize_public_key(&pp.tdd, &pk.tdd);
    let seed = sha3_256(&[DST_TDD_PROBE, &tensor_bytes]);
    let mut rng = Shake256Rng::from_seed(DST_TDD_PROBE, &seed);
    TddProbes {
        px: uniform_zq_vec(&mut rng, pp.tdd.n, pp.tdd.q),
        py: uniform_zq_vec(&mut rng, pp.tdd.n, pp.tdd.q),
        pz: uniform_zq_vec(&mut rng, pp.tdd.n, pp.tdd.q),
    }
}

/// κ(F) = Σᵢ ⟨Faᵢ, px⟩·⟨Fbᵢ, py⟩·⟨Fcᵢ, pz⟩ mod q, hashed.
fn tdd_fingerprint(
    probes: &TddProbes,
    fa: &[Vec<u32>],
    fb: &[Vec<u32>],
    fc: &[Vec<u32>],
    q: u32,
) -> [u8; DIGEST_NUM_BYTES] {
    let mut kappa = 0u32;
    for i in 0..fa.len() {
        let term = mul_mod(
            mul_mod(dot(&fa[i], &probes.px, q), dot(&fb[i], &probes.py, q), q),
            dot(&fc[i], &probes.pz, q),
            q,
        );
        kappa = add_mod(kappa, term, q);
    }
    sha3_256(&[DST_TDD_FP, &kappa.to_le_bytes()])
}

/// One pass through the Commit → Challenge → Response states. `Retry` is the
/// norm-rejection edge back to Commit; the driver in [`sign`] turns budget
/// exhaustion into the Exhaust terminal.
enum SignerOutcome {
    Emit(Signature),
    Retry,
}

fn sign_attempt<R: RngCore + CryptoRng>(
    pp: &Params,
    sk: &MosaicSecretKey,
    pk: &MosaicPublicKey,
    msg: &[u8],
    probes: &TddProbes,
    rng: &mut R,
) -> SignerOutcome {
    let q = pp.slss.q;
    let beta = pp.slss.beta;
    let gamma_e = SIG_ERROR_SLACK * beta;
    let p = pp.egrw.p;

    //
    // Commit
    //

    let y: Zeroizing<Vec<u32>> = Zeroizing::new(
        (0..pp.slss.n)
            .map(|_| uniform_centered(rng, beta, q))
            .collect(),
    );
    let y_e: Zeroizing<Vec<u32>> = Zeroizing::new(
        (0..pp.slss.m)
            .map(|_| uniform_centered(rng, gamma_e, q))
            .collect(),
    );
    let w_full = vec_add(&pk.slss.a.mul_vec(&y, q), &y_e, q);

    let mut rho1 = [0u8; SEED_NUM_BYTES];
    let mut rho2 = [0u8; SEED_NUM_BYTES];
    let mut rho3 = [0u8; SEED_NUM_BYTES];
    rng.fill_bytes(&mut rho1);
    rng.fill_bytes(&mut rho2);
    rng.fill_bytes(&mut rho3);

    let w1 = commit(&scalars_to_bytes(&w_full), &rho1);

    // TDD: blinding factors and the shifted candidate, fingerprinted ahead
    // of the challenge.
    let blind_factors = |rng: &mut R| -> Vec<Vec<u32>> {
        (0..pp.tdd.r)
            .map(|_| uniform_zq_vec(rng, pp.tdd.n, pp.tdd.q))
            .collect()
    };
    let y2a = Zeroizing::new(blind_factors(rng));
    let y2b = Zeroizing::new(blind_factors(rng));
    let y2c = Zeroizing::new(blind_factors(rng));
    let shift = |blind: &[Vec<u32>], factors: &[Vec<u32>]| -> Vec<Vec<u32>> {
        blind
            .iter()
            .zip(factors.iter())
            .map(|(b, f)| vec_add(b, f, q))
            .collect()
    };
    let cand_a = Zeroizing::new(shift(&y2a, &sk.tdd.factors_a));
    let cand_b = Zeroizing::new(shift(&y2b, &sk.tdd.factors_b));
    let cand_c = Zeroizing::new(shift(&y2c, &sk.tdd.factors_c));

    let fp0 = tdd_fingerprint(probes, &y2a, &y2b, &y2c, q);
    let fp1 = tdd_fingerprint(probes, &cand_a, &cand_b, &cand_c, q);
    let material2 = [fp0.as_slice(), fp1.as_slice()].concat();
    let w2 = commit(&material2, &rho2);

    // EGRW: both candidate walk endpoints, committed ahead of the challenge.
    let y3 = Zeroizing::new(random_walk_word(rng, pp.egrw.k));
    let endpoint0 = sl2::walk(&pk.egrw.v_start, &y3, p);
    let combined = Zeroizing::new(combine_walks(&y3, &sk.egrw.walk, 1));
    let endpoint1 = sl2::walk(&pk.egrw.v_start, &combined, p);
    let material3 = [endpoint0.to_bytes(p), endpoint1.to_bytes(p)].concat();
    let w3 = commit(&material3, &rho3);

    //
    // Challenge
    //

    let challenge = sha3_256(&[DST_SIG_C, &pk.binding, &w1, &w2, &w3, msg]);
    let (c1, c2, c3) = sub_challenges(&challenge);

    //
    // Response
    //

    let z_s = vec_add(&y, &vec_scale(c1, &sk.slss.s, q), q);
    let z_e = vec_add(&y_e, &vec_scale(c1, &sk.slss.e, q), q);
    if !(check_norm(&z_s, beta, q) && check_norm(&z_e, gamma_e, q)) {
        return SignerOutcome::Retry;
    }

    let mut z1_response = scalars_to_bytes(&z_s);
    z1_response.extend_from_slice(&scalars_to_bytes(&z_e));

    let (ra, rb, rc) = if c2 == 1 {
        (&cand_a, &cand_b, &cand_c)
    } else {
        (&y2a, &y2b, &y2c)
    };
    let mut z2_response = Vec::new();
    for group in [ra.as_slice(), rb.as_slice(), rc.as_slice()] {
        for vector in group {
            z2_response.extend_from_slice(&scalars_to_bytes(vector));
        }
    }

    let z3_response = combine_walks(&y3, &sk.egrw.walk, c3);

    SignerOutcome::Emit(Signature {
        commitment: sha3_256(&[&w1, &w2, &w3]),
        challenge,
        z1: SchemeResponse {
            response: z1_response,
            commitment: w1,
            opening: rho1.to_vec(),
        },
        z2: SchemeResponse {
            response: z2_response,
            commitment: w2,
            opening: [material2.as_slice(), &rho2].concat(),
        },
        z3: SchemeResponse {
            response: z3_response,
            commitment: w3,
            opening: [material3.as_slice(), &rho3].concat(),
        },
    })
}

/// Signs `msg` under all three witnesses. Fails with `SigningExhausted` when
/// the rejection-sampling budget runs out; either way the call's latency is
/// padded up to the configured floor.
pub fn sign<R: RngCore + CryptoRng>(
    pp: &Params,
    sk: &MosaicSecretKey,
    pk: &MosaicPublicKey,
    msg: &[u8],
    rng: &mut R,
) -> Result<Signature, MosaicError> {
    assert_eq!(pp.level, pk.level(), "parameter/key level mismatch");
    assert_eq!(pp.level, sk.level, "parameter/key level mismatch");

    let started = Instant::now();
    let probes = tdd_probes(pp, pk);

    let mut outcome = Err(MosaicError::SigningExhausted);
    for _ in 0..pp.max_rejection_retries {
        if let SignerOutcome::Emit(sig) = sign_attempt(pp, sk, pk, msg, &probes, rng) {
            outcome = Ok(sig);
            break;
        }
    }

    pad_to_floor(started, pp.timing_pad_ms);
    outcome
}

/// Verifies a signature. Total over malformed inputs: structural problems
/// return `false`, they never panic.
pub fn verify(pp: &Params, pk: &MosaicPublicKey, msg: &[u8], sig: &Signature) -> bool {
    assert_eq!(pp.level, pk.level(), "parameter/key level mismatch");

    let q = pp.slss.q;
    let beta = pp.slss.beta;
    let gamma_e = SIG_ERROR_SLACK * beta;
    let p = pp.egrw.p;
    let (c1, c2, c3) = sub_challenges(&sig.challenge);

    // SLSS: recompute W = A·z_s + z_e − c₁·t and its commitment.
    let split = pp.slss.n * SCALAR_NUM_BYTES;
    if sig.z1.response.len() != split + pp.slss.m * SCALAR_NUM_BYTES {
        return false;
    }
    let Ok(z_s) = scalars_from_bytes(&sig.z1.response[..split], pp.slss.n, q) else {
        return false;
    };
    let Ok(z_e) = scalars_from_bytes(&sig.z1.response[split..], pp.slss.m, q) else {
        return false;
    };
    let norm_ok = check_norm(&z_s, beta, q) && check_norm(&z_e, gamma_e, q);

    let w_full = vec_sub(
        &vec_add(&pk.slss.a.mul_vec(&z_s, q), &z_e, q),
        &vec_scale(c1, &pk.slss.t, q),
        q,
    );
    let Ok(rho1) = <[u8; SEED_NUM_BYTES]>::try_from(sig.z1.opening.as_slice()) else {
        return false;
    };
    let w1 = commit(&scalars_to_bytes(&w_full), &rho1);
    if !ct_eq_bool(&w1, &sig.z1.commitment) {
        return false;
    }

    // TDD: the revealed candidate must fingerprint to the committed slot.
    let vec_len = pp.tdd.n * SCALAR_NUM_BYTES;
    if sig.z2.response.len() != 3 * pp.tdd.r * vec_len {
        return false;
    }
    let mut groups: Vec<Vec<Vec<u32>>> = Vec::with_capacity(3);
    for g in 0..3 {
        let mut vectors = Vec::with_capacity(pp.tdd.r);
        for i in 0..pp.tdd.r {
            let offset = (g * pp.tdd.r + i) * vec_len;
            let Ok(v) = scalars_from_bytes(&sig.z2.response[offset..offset + vec_len], pp.tdd.n, q)
            else {
                return false;
            };
            vectors.push(v);
        }
        groups.push(vectors);
    }
    let probes = tdd_probes(pp, pk);
    let fp = tdd_fingerprint(&probes, &groups[0], &groups[1], &groups[2], q);

    if sig.z2.opening.len() != 2 * DIGEST_NUM_BYTES + SEED_NUM_BYTES {
        return false;
    }
    let (material2, rho2_bytes) = sig.z2.opening.split_at(2 * DIGEST_NUM_BYTES);
    let rho2: [u8; SEED_NUM_BYTES] = rho2_bytes.try_into().expect("fixed-width opening");
    let w2 = commit(material2, &rho2);
    if !ct_eq_bool(&w2, &sig.z2.commitment) {
        return false;
    }
    let slot2 = &material2[c2 as usize * DIGEST_NUM_BYTES..(c2 as usize + 1) * DIGEST_NUM_BYTES];
    if !ct_eq_bool(&fp, slot2) {
        return false;
    }

    // EGRW: the response walk must land on the committed endpoint.
    if sig.z3.response.len() != pp.egrw.k
        || sig.z3.response.iter().any(|&s| s >= GENERATOR_COUNT as u8)
    {
        return false;
    }
    let el = Sl2::encoded_len(p);
    if sig.z3.opening.len() != 2 * el + SEED_NUM_BYTES {
        return false;
    }
    let (material3, rho3_bytes) = sig.z3.opening.split_at(2 * el);
    let rho3: [u8; SEED_NUM_BYTES] = rho3_bytes.try_into().expect("fixed-width opening");
    let w3 = commit(material3, &rho3);
    if !ct_eq_bool(&w3, &sig.z3.commitment) {
        return false;
    }
    let endpoint = sl2::walk(&pk.egrw.v_start, &sig.z3.response, p);
    let slot3 = &material3[c3 as usize * el..(c3 as usize + 1) * el];
    if !ct_eq_bool(&endpoint.to_bytes(p), slot3) {
        return false;
    }

    // Challenge and top-level commitment, compared in constant time.
    let challenge = sha3_256(&[DST_SIG_C, &pk.binding, &w1, &w2, &w3, msg]);
    let commitment = sha3_256(&[&w1, &w2, &w3]);
    ct_eq_bool(&challenge, &sig.challenge) && ct_eq_bool(&commitment, &sig.commitment) && norm_ok
}

fn pad_to_floor(started: Instant, floor_ms: u64) {
    let floor = Duration::from_millis(floor_ms);
    let elapsed = started.elapsed();
    if elapsed < floor {
        std::thread::sleep(floor - elapsed);
    }
}

impl Signature {
    /// `LEN(commitment) || commitment || LEN(challenge) || challenge ||
    /// LEN(z1) || z1 || LEN(z2) || z2 || LEN(z3) || z3`, each zᵢ a nested
    /// `(response, commitment, opening)` block triple.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = FieldWriter::new();
        w.put_block(&self.commitment);
        w.put_block(&self.challenge);
        for z in [&self.z1, &self.z2, &self.z3] {
            let mut zw = FieldWriter::new();
            zw.put_block(&z.response);
            zw.put_block(&z.commitment);
            zw.put_block(&z.opening);
            w.put_block(&zw.into_bytes());
        }
        w.into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MosaicError> {
        let mut r = FieldReader::new(bytes);
        let commitment = read_digest(&mut r)?;
        let challenge = read_digest(&mut r)?;
        let z1 = read_scheme_response(&mut r)?;
        let z2 = read_scheme_response(&mut r)?;
        let z3 = read_scheme_response(&mut r)?;
        r.finish()?;
        Ok(Signature {
            commitment,
            challenge,
            z1,
            z2,
            z3,
        })
    }
}

fn read_digest(r: &mut FieldReader<'_>) -> Result<[u8; DIGEST_NUM_BYTES], MosaicError> {
    r.next_block()?
        .try_into()
        .map_err(|_| MosaicError::Serialization("digest length mismatch"))
}

fn read_scheme_response(r: &mut FieldReader<'_>) -> Result<SchemeResponse, MosaicError> {
    let block = r.next_block()?;
    let mut zr = FieldReader::new(block);
    let response = zr.next_block()?.to_vec();
    let commitment = read_digest(&mut zr)?;
    let opening = zr.next_block()?.to_vec();
    zr.finish()?;
    Ok(SchemeResponse {
        response,
        commitment,
        opening,
    })
}
