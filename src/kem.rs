//! The composite MOSAIC KEM: the three problem schemes run side by side on
//! one message block, entangled by the binding digest and the consistency
//! proof, under an FO transform with implicit rejection.
//!
//! Decapsulation is branch-free with respect to validity: every sub-decrypt,
//! the proof check and the re-encryption run unconditionally, failures
//! accumulate in a `subtle::Choice`, and the returned secret is a masked
//! select between the accepting and rejecting candidates.

use crate::constants::{
    DIGEST_NUM_BYTES, DST_DEM, DST_ENC_EGRW, DST_ENC_SLSS, DST_ENC_TDD, DST_KEM_K, DST_KEM_R,
    DST_KEM_REJ, DST_KEYGEN, DST_KEYGEN_EGRW, DST_KEYGEN_SLSS, DST_KEYGEN_TDD, MSG_NUM_BYTES,
    SEED_NUM_BYTES,
};
use crate::entangle::{binding_digest, ConsistencyProof};
use crate::error::MosaicError;
use crate::params::{Params, SecurityLevel};
use crate::sampling::Shake256Rng;
use crate::schemes::egrw::{Egrw, EgrwCiphertext, EgrwPublicKey, EgrwSecretKey};
use crate::schemes::slss::{Slss, SlssCiphertext, SlssPublicKey, SlssSecretKey};
use crate::schemes::tdd::{Tdd, TddCiphertext, TddPublicKey, TddSecretKey};
use crate::schemes::ProblemScheme;
use crate::utils::constant_time::{ct_eq, ct_eq_bool, ct_select};
use crate::utils::serialization::{FieldReader, FieldWriter};
use crate::utils::{shake256, validate_seed_entropy};
use rand_core::{CryptoRng, RngCore};
use std::fmt;
use subtle::Choice;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// The composite public key: the three sub-keys plus the binding digest that
/// ties them into one identity.
#[derive(Clone, Debug, PartialEq)]
pub struct MosaicPublicKey {
    pub(crate) level: SecurityLevel,
    pub(crate) slss: SlssPublicKey,
    pub(crate) tdd: TddPublicKey,
    pub(crate) egrw: EgrwPublicKey,
    pub(crate) binding: [u8; DIGEST_NUM_BYTES],
}

/// The composite secret key. `seed` re-derives the implicit-rejection output
/// and is split into the three scheme seeds at key generation.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MosaicSecretKey {
    #[zeroize(skip)]
    pub(crate) level: SecurityLevel,
    pub(crate) slss: SlssSecretKey,
    pub(crate) tdd: TddSecretKey,
    pub(crate) egrw: EgrwSecretKey,
    pub(crate) seed: [u8; SEED_NUM_BYTES],
}

#[cfg(feature = "assert-secret-keys-not-cloneable")]
static_assertions::assert_not_impl_any!(MosaicSecretKey: Clone);

impl fmt::Debug for MosaicSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MosaicSecretKey({}, <redacted>)", self.level)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ciphertext {
    pub c1: SlssCiphertext,
    pub c2: TddCiphertext,
    pub c3: EgrwCiphertext,
    pub proof: ConsistencyProof,
}

/// A 32-byte shared secret. Compares in constant time and zeroizes on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(pub [u8; MSG_NUM_BYTES]);

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        ct_eq_bool(&self.0, &other.0)
    }
}

impl Eq for SharedSecret {}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret(<redacted>)")
    }
}

impl MosaicPublicKey {
    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    pub fn binding(&self) -> &[u8; DIGEST_NUM_BYTES] {
        &self.binding
    }

    /// `LEN(tag) || tag || LEN(slss) || slss || LEN(tdd) || tdd ||
    /// LEN(egrw) || egrw || binding`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let pp = Params::new(self.level);
        let mut w = FieldWriter::new();
        w.put_block(&[self.level.tag()]);
        w.put_block(&Slss::serialize_public_key(&pp.slss, &self.slss));
        w.put_block(&Tdd::serialize_public_key(&pp.tdd, &self.tdd));
        w.put_block(&Egrw::serialize_public_key(&pp.egrw, &self.egrw));
        w.put_raw(&self.binding);
        w.into_bytes()
    }

    /// Parses and re-derives the binding; a stored binding that disagrees
    /// with the recomputed one is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MosaicError> {
        let mut r = FieldReader::new(bytes);
        let tag = r.next_block()?;
        if tag.len() != 1 {
            return Err(MosaicError::Serialization("level tag length mismatch"));
        }
        let level = SecurityLevel::from_tag(tag[0])?;
        let pp = Params::new(level);

        let slss_bytes = r.next_block()?;
        let tdd_bytes = r.next_block()?;
        let egrw_bytes = r.next_block()?;
        let binding: [u8; DIGEST_NUM_BYTES] = r
            .take_raw(DIGEST_NUM_BYTES)?
            .try_into()
            .expect("fixed-width binding");
        r.finish()?;

        let slss = Slss::deserialize_public_key(&pp.slss, slss_bytes)?;
        let tdd = Tdd::deserialize_public_key(&pp.tdd, tdd_bytes)?;
        let egrw = Egrw::deserialize_public_key(&pp.egrw, egrw_bytes)?;

        let expected = binding_digest(slss_bytes, tdd_bytes, egrw_bytes);
        if !ct_eq_bool(&expected, &binding) {
            return Err(MosaicError::Serialization("public key binding mismatch"));
        }

        Ok(MosaicPublicKey {
            level,
            slss,
            tdd,
            egrw,
            binding,
        })
    }
}

impl Ciphertext {
    /// `LEN(c1) || c1 || LEN(c2) || c2 || LEN(c3) || c3 || LEN(π) || π`.
    pub fn to_bytes(&self, pp: &Params) -> Vec<u8> {
        let mut w = FieldWriter::new();
        w.put_block(&Slss::serialize_ciphertext(&pp.slss, &self.c1));
        w.put_block(&Tdd::serialize_ciphertext(&pp.tdd, &self.c2));
        w.put_block(&Egrw::serialize_ciphertext(&pp.egrw, &self.c3));
        w.put_block(&self.proof.to_bytes());
        w.into_bytes()
    }

    pub fn from_bytes(pp: &Params, bytes: &[u8]) -> Result<Self, MosaicError> {
        let mut r = FieldReader::new(bytes);
        let c1 = Slss::deserialize_ciphertext(&pp.slss, r.next_block()?)?;
        let c2 = Tdd::deserialize_ciphertext(&pp.tdd, r.next_block()?)?;
        let c3 = Egrw::deserialize_ciphertext(&pp.egrw, r.next_block()?)?;
        let proof = ConsistencyProof::from_bytes(r.next_block()?)?;
        r.finish()?;
        Ok(Ciphertext { c1, c2, c3, proof })
    }
}

/// Generates a composite keypair from a fresh 32-byte master seed drawn from
/// `rng`.
pub fn keygen<R: RngCore + CryptoRng>(
    pp: &Params,
    rng: &mut R,
) -> Result<(MosaicPublicKey, MosaicSecretKey), MosaicError> {
    let mut seed = Zeroizing::new([0u8; SEED_NUM_BYTES]);
    rng.fill_bytes(&mut *seed);
    keygen_from_seed(pp, &seed)
}

/// Deterministic key generation from a caller-provided master seed. The seed
/// is split into three scheme seeds via SHAKE256 and kept in the secret key
/// for implicit rejection.
pub fn keygen_from_seed(
    pp: &Params,
    seed: &[u8; SEED_NUM_BYTES],
) -> Result<(MosaicPublicKey, MosaicSecretKey), MosaicError> {
    pp.validate()?;
    validate_seed_entropy(seed)?;

    let split = Zeroizing::new(shake256(&[DST_KEYGEN, seed], 3 * SEED_NUM_BYTES));
    let (slss_pk, slss_sk) = Slss::keygen(
        &pp.slss,
        &mut Shake256Rng::from_seed(DST_KEYGEN_SLSS, &split[..32]),
    );
    let (tdd_pk, tdd_sk) = Tdd::keygen(
        &pp.tdd,
        &mut Shake256Rng::from_seed(DST_KEYGEN_TDD, &split[32..64]),
    );
    let (egrw_pk, egrw_sk) = Egrw::keygen(
        &pp.egrw,
        &mut Shake256Rng::from_seed(DST_KEYGEN_EGRW, &split[64..]),
    );

    let binding = binding_digest(
        &Slss::serialize_public_key(&pp.slss, &slss_pk),
        &Tdd::serialize_public_key(&pp.tdd, &tdd_pk),
        &Egrw::serialize_public_key(&pp.egrw, &egrw_pk),
    );

    Ok((
        MosaicPublicKey {
            level: pp.level,
            slss: slss_pk,
            tdd: tdd_pk,
            egrw: egrw_pk,
            binding,
        },
        MosaicSecretKey {
            level: pp.level,
            slss: slss_sk,
            tdd: tdd_sk,
            egrw: egrw_sk,
            seed: *seed,
        },
    ))
}

/// Encapsulates a fresh shared secret to `pk`.
pub fn encapsulate<R: RngCore + CryptoRng>(
    pp: &Params,
    pk: &MosaicPublicKey,
    rng: &mut R,
) -> Result<(Ciphertext, SharedSecret), MosaicError> {
    let mut msg = Zeroizing::new([0u8; MSG_NUM_BYTES]);
    rng.fill_bytes(&mut *msg);
    validate_seed_entropy(&*msg)?;
    Ok(encapsulate_inner(pp, pk, &msg))
}

/// Fully deterministic encapsulation of a caller-chosen message block; two
/// invocations with the same `(pk, msg)` are bit-identical.
pub fn encapsulate_deterministic(
    pp: &Params,
    pk: &MosaicPublicKey,
    msg: &[u8; MSG_NUM_BYTES],
) -> Result<(Ciphertext, SharedSecret), MosaicError> {
    validate_seed_entropy(msg)?;
    Ok(encapsulate_inner(pp, pk, msg))
}

/// The deterministic core. Skips entropy validation: the decapsulation path
/// re-encrypts attacker-influenced candidates and must not branch on them.
fn encapsulate_inner(
    pp: &Params,
    pk: &MosaicPublicKey,
    msg: &[u8; MSG_NUM_BYTES],
) -> (Ciphertext, SharedSecret) {
    assert_eq!(pp.level, pk.level, "parameter/key level mismatch");

    let expanded = Zeroizing::new(shake256(&[DST_KEM_R, msg, &pk.binding], 3 * SEED_NUM_BYTES));
    let c1 = Slss::encrypt(
        &pp.slss,
        &pk.slss,
        msg,
        &mut Shake256Rng::from_seed(DST_ENC_SLSS, &expanded[..32]),
    );
    let c2 = Tdd::encrypt(
        &pp.tdd,
        &pk.tdd,
        msg,
        &mut Shake256Rng::from_seed(DST_ENC_TDD, &expanded[32..64]),
    );
    let c3 = Egrw::encrypt(
        &pp.egrw,
        &pk.egrw,
        msg,
        &mut Shake256Rng::from_seed(DST_ENC_EGRW, &expanded[64..]),
    );

    let part1 = Slss::serialize_ciphertext(&pp.slss, &c1);
    let part2 = Tdd::serialize_ciphertext(&pp.tdd, &c2);
    let part3 = Egrw::serialize_ciphertext(&pp.egrw, &c3);
    let blind_seed = Zeroizing::new([msg.as_slice(), pk.binding.as_slice()].concat());
    let proof = ConsistencyProof::prove(
        pp.slss.q,
        &pk.binding,
        &[part1.as_slice(), part2.as_slice(), part3.as_slice()],
        msg,
        &blind_seed,
    );

    let ct = Ciphertext { c1, c2, c3, proof };
    let ct_bytes = ct.to_bytes(pp);
    let key: [u8; MSG_NUM_BYTES] = shake256(&[DST_KEM_K, msg, &ct_bytes, &pk.binding], MSG_NUM_BYTES)
        .try_into()
        .expect("fixed-width key");
    (ct, SharedSecret(key))
}

/// Branch-free decapsulation with implicit rejection: any failure — binding
/// mismatch, component disagreement, proof failure, re-encryption mismatch —
/// flips a flag instead of returning early, and the rejecting output is a
/// pseudorandom function of the secret seed and the ciphertext.
pub fn decapsulate(
    pp: &Params,
    ct: &Ciphertext,
    sk: &MosaicSecretKey,
    pk: &MosaicPublicKey,
) -> SharedSecret {
    assert_eq!(pp.level, pk.level, "parameter/key level mismatch");
    assert_eq!(pp.level, sk.level, "parameter/key level mismatch");

    let mut rejected = Choice::from(0);

    // Re-derive the binding from the sub-keys.
    let slss_bytes = Slss::serialize_public_key(&pp.slss, &pk.slss);
    let tdd_bytes = Tdd::serialize_public_key(&pp.tdd, &pk.tdd);
    let egrw_bytes = Egrw::serialize_public_key(&pp.egrw, &pk.egrw);
    let expected_binding = binding_digest(&slss_bytes, &tdd_bytes, &egrw_bytes);
    rejected |= !ct_eq(&expected_binding, &pk.binding);

    // All three decrypts run unconditionally.
    let mu1 = Zeroizing::new(Slss::decrypt(&pp.slss, &sk.slss, &ct.c1));
    let mu2 = Zeroizing::new(Tdd::decrypt(&pp.tdd, &sk.tdd, &ct.c2));
    let mu3 = Zeroizing::new(Egrw::decrypt(&pp.egrw, &sk.egrw, &ct.c3));
    rejected |= !(ct_eq(&*mu1, &*mu2) & ct_eq(&*mu1, &*mu3));

    // Proof check against the candidate message.
    let part1 = Slss::serialize_ciphertext(&pp.slss, &ct.c1);
    let part2 = Tdd::serialize_ciphertext(&pp.tdd, &ct.c2);
    let part3 = Egrw::serialize_ciphertext(&pp.egrw, &ct.c3);
    rejected |= !ct.proof.verify(
        pp.slss.q,
        &pk.binding,
        &[part1.as_slice(), part2.as_slice(), part3.as_slice()],
        &mu1,
    );

    // FO re-encryption: the candidate must reproduce the ciphertext bit for
    // bit, proof included.
    let (reencrypted, _) = encapsulate_inner(pp, pk, &mu1);
    let ct_bytes = ct.to_bytes(pp);
    let reencrypted_bytes = reencrypted.to_bytes(pp);
    rejected |= !ct_eq(&ct_bytes, &reencrypted_bytes);

    // Both candidates are always derived; the flag only drives the select.
    let k_ok: [u8; MSG_NUM_BYTES] =
        shake256(&[DST_KEM_K, &*mu1, &ct_bytes, &pk.binding], MSG_NUM_BYTES)
            .try_into()
            .expect("fixed-width key");
    let k_rej: [u8; MSG_NUM_BYTES] = shake256(&[DST_KEM_REJ, &sk.seed, &ct_bytes], MSG_NUM_BYTES)
        .try_into()
        .expect("fixed-width key");

    SharedSecret(ct_select(rejected, &k_rej, &k_ok))
}

/// Hybrid encryption for arbitrary-length messages: encapsulate, then mask
/// the body with a SHAKE256 stream keyed by the shared secret. The KEM layer
/// carries the CCA claim; the stream layer is malleable on its own.
#[derive(Clone, Debug, PartialEq)]
pub struct HybridCiphertext {
    pub kem: Ciphertext,
    pub body: Vec<u8>,
}

pub fn encrypt<R: RngCore + CryptoRng>(
    pp: &Params,
    pk: &MosaicPublicKey,
    msg: &[u8],
    rng: &mut R,
) -> Result<HybridCiphertext, MosaicError> {
    let (kem, key) = encapsulate(pp, pk, rng)?;
    let pad = shake256(&[DST_DEM, &key.0], msg.len());
    let body = msg.iter().zip(pad.iter()).map(|(m, p)| m ^ p).collect();
    Ok(HybridCiphertext { kem, body })
}

/// Total: a wrong key or tampered ciphertext yields garbage plaintext, not
/// an error, mirroring the KEM's implicit rejection.
pub fn decrypt(
    pp: &Params,
    sk: &MosaicSecretKey,
    pk: &MosaicPublicKey,
    ct: &HybridCiphertext,
) -> Vec<u8> {
    let key = decapsulate(pp, &ct.kem, sk, pk);
    let pad = shake256(&[DST_DEM, &key.0], ct.body.len());
    ct.body.iter().zip(pad.iter()).map(|(m, p)| m ^ p).collect()
}
