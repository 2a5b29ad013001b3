//! Fiat–Shamir proof that the three ciphertext components of an
//! encapsulation were derived from one message.
//!
//! Per scheme the prover commits to a blinding scalar rᵢ bound to that
//! component's bytes, derives the challenge over the binding digest, all
//! three commitments and the ciphertext, and responds with
//! `zᵢ = c̄ + rᵢ·μ̄ mod q`. Verification happens inside decapsulation, where
//! the candidate message is available: it inverts μ̄, recovers every rᵢ,
//! recomputes the commitments and the challenge, and hands back a
//! `subtle::Choice` for the implicit-rejection accumulator.

use crate::algebra::zq::{add_mod, ct_lt, inv_mod, mul_mod, sub_mod};
use crate::constants::{
    DIGEST_NUM_BYTES, DST_COMMIT, DST_NIZK, DST_NIZK_MU, DST_NIZK_R, MSG_NUM_BYTES,
};
use crate::error::MosaicError;
use crate::sampling::{uniform_below, Shake256Rng};
use crate::utils::constant_time::ct_eq;
use crate::utils::serialization::{FieldReader, FieldWriter};
use crate::utils::{sha3_256, shake256};
use serde::{Deserialize, Serialize};
use subtle::Choice;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyProof {
    commits: [[u8; DIGEST_NUM_BYTES]; 3],
    challenge: [u8; DIGEST_NUM_BYTES],
    responses: [u32; 3],
}

/// Challenge digest reduced to a ℤ_q scalar.
fn challenge_scalar(challenge: &[u8; DIGEST_NUM_BYTES], q: u32) -> u32 {
    let word = u64::from_le_bytes(challenge[..8].try_into().expect("8-byte slice"));
    (word % q as u64) as u32
}

/// Maps the message into an invertible scalar in [1, q).
fn message_scalar(msg: &[u8; MSG_NUM_BYTES], q: u32) -> u32 {
    let expanded = shake256(&[DST_NIZK_MU, msg], 8);
    let word = u64::from_le_bytes(expanded.try_into().expect("8-byte expansion"));
    (word % (q as u64 - 1)) as u32 + 1
}

fn blind_commitment(r: u32, component: &[u8]) -> [u8; DIGEST_NUM_BYTES] {
    sha3_256(&[DST_COMMIT, &r.to_le_bytes(), component])
}

fn derive_challenge(
    binding: &[u8; DIGEST_NUM_BYTES],
    commits: &[[u8; DIGEST_NUM_BYTES]; 3],
    components: &[&[u8]; 3],
) -> [u8; DIGEST_NUM_BYTES] {
    sha3_256(&[
        DST_NIZK,
        binding,
        &commits[0],
        &commits[1],
        &commits[2],
        components[0],
        components[1],
        components[2],
    ])
}

impl ConsistencyProof {
    /// Proves over the serialized ciphertext components. `blind_seed` comes
    /// from the deterministic encapsulation randomness, so re-encryption
    /// reproduces the proof bit for bit.
    pub(crate) fn prove(
        q: u32,
        binding: &[u8; DIGEST_NUM_BYTES],
        components: &[&[u8]; 3],
        msg: &[u8; MSG_NUM_BYTES],
        blind_seed: &[u8],
    ) -> Self {
        let mut rng = Shake256Rng::from_seed(DST_NIZK_R, blind_seed);
        // Blinds stay nonzero so the response never degenerates to the bare
        // challenge scalar.
        let mut blind = || uniform_below(&mut rng, q as u64 - 1) as u32 + 1;
        let blinds = [blind(), blind(), blind()];

        let commits = [
            blind_commitment(blinds[0], components[0]),
            blind_commitment(blinds[1], components[1]),
            blind_commitment(blinds[2], components[2]),
        ];
        let challenge = derive_challenge(binding, &commits, components);

        let c_bar = challenge_scalar(&challenge, q);
        let mu_bar = message_scalar(msg, q);
        let mut responses = [0u32; 3];
        for (slot, &r) in responses.iter_mut().zip(blinds.iter()) {
            *slot = add_mod(c_bar, mul_mod(r, mu_bar, q), q);
        }

        ConsistencyProof {
            commits,
            challenge,
            responses,
        }
    }

    /// Branch-free verification against a candidate message. Out-of-range
    /// responses fold into the failure flag instead of erroring.
    pub(crate) fn verify(
        &self,
        q: u32,
        binding: &[u8; DIGEST_NUM_BYTES],
        components: &[&[u8]; 3],
        msg: &[u8; MSG_NUM_BYTES],
    ) -> Choice {
        let c_bar = challenge_scalar(&self.challenge, q);
        let mu_bar = message_scalar(msg, q);
        let mu_inv = inv_mod(mu_bar as u64, q as u64) as u32;

        let mut ok = Choice::from(1);
        let mut commits = [[0u8; DIGEST_NUM_BYTES]; 3];
        for i in 0..3 {
            // Clamp instead of branching on attacker-controlled input.
            let in_range = ct_lt(self.responses[i], q);
            ok &= in_range;
            let z = self.responses[i] % q;

            let r = mul_mod(sub_mod(z, c_bar, q), mu_inv, q);
            commits[i] = blind_commitment(r, components[i]);
            ok &= ct_eq(&commits[i], &self.commits[i]);
        }

        let challenge = derive_challenge(binding, &commits, components);
        ok &= ct_eq(&challenge, &self.challenge);
        ok
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut w = FieldWriter::new();
        for c in &self.commits {
            w.put_block(c);
        }
        w.put_block(&self.challenge);
        for z in &self.responses {
            w.put_block(&z.to_le_bytes());
        }
        w.into_bytes()
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self, MosaicError> {
        let mut r = FieldReader::new(bytes);
        let mut commits = [[0u8; DIGEST_NUM_BYTES]; 3];
        for c in commits.iter_mut() {
            *c = r
                .next_block()?
                .try_into()
                .map_err(|_| MosaicError::Serialization("commitment length mismatch"))?;
        }
        let challenge = r
            .next_block()?
            .try_into()
            .map_err(|_| MosaicError::Serialization("challenge length mismatch"))?;
        let mut responses = [0u32; 3];
        for z in responses.iter_mut() {
            let block: [u8; 4] = r
                .next_block()?
                .try_into()
                .map_err(|_| MosaicError::Serialization("response length mismatch"))?;
            *z = u32::from_le_bytes(block);
        }
        r.finish()?;
        Ok(ConsistencyProof {
            commits,
            challenge,
            responses,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const Q: u32 = 7681;

    fn fixture() -> ([u8; 32], [Vec<u8>; 3], [u8; 32]) {
        let binding = [0x42u8; 32];
        let components = [vec![1u8; 40], vec![2u8; 33], vec![3u8; 17]];
        let msg = [0x99u8; 32];
        (binding, components, msg)
    }

    #[test]
    fn honest_proofs_verify() {
        let (binding, components, msg) = fixture();
        let parts = [&components[0][..], &components[1][..], &components[2][..]];
        let proof = ConsistencyProof::prove(Q, &binding, &parts, &msg, b"blind-seed");
        assert!(bool::from(proof.verify(Q, &binding, &parts, &msg)));
    }

    #[test]
    fn proving_is_deterministic_in_the_seed() {
        let (binding, components, msg) = fixture();
        let parts = [&components[0][..], &components[1][..], &components[2][..]];
        let a = ConsistencyProof::prove(Q, &binding, &parts, &msg, b"seed-a");
        let b = ConsistencyProof::prove(Q, &binding, &parts, &msg, b"seed-a");
        let c = ConsistencyProof::prove(Q, &binding, &parts, &msg, b"seed-b");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn wrong_message_binding_or_component_fails() {
        let (binding, components, msg) = fixture();
        let parts = [&components[0][..], &components[1][..], &components[2][..]];
        let proof = ConsistencyProof::prove(Q, &binding, &parts, &msg, b"blind-seed");

        let mut wrong_msg = msg;
        wrong_msg[0] ^= 1;
        assert!(!bool::from(proof.verify(Q, &binding, &parts, &wrong_msg)));

        let wrong_binding = [0x43u8; 32];
        assert!(!bool::from(proof.verify(Q, &wrong_binding, &parts, &msg)));

        let tweaked = components[1].iter().map(|b| b ^ 1).collect::<Vec<u8>>();
        let wrong_parts = [&components[0][..], &tweaked[..], &components[2][..]];
        assert!(!bool::from(proof.verify(Q, &binding, &wrong_parts, &msg)));
    }

    #[test]
    fn wire_round_trips() {
        let (binding, components, msg) = fixture();
        let parts = [&components[0][..], &components[1][..], &components[2][..]];
        let proof = ConsistencyProof::prove(Q, &binding, &parts, &msg, b"blind-seed");

        let bytes = proof.to_bytes();
        assert_eq!(ConsistencyProof::from_bytes(&bytes).unwrap(), proof);
        assert!(ConsistencyProof::from_bytes(&bytes[1..]).is_err());
    }
}
