//! Signature laws: round trips, negative properties, rejection-budget
//! behavior, the timing floor and the wire format.

use kmosaic::kem;
use kmosaic::params::{Params, SecurityLevel};
use kmosaic::sig::{self, Signature};
use kmosaic::MosaicError;
use rand::thread_rng;
use std::time::Instant;

/// Most tests disable the latency floor; the floor has its own test.
fn fast_params(level: SecurityLevel) -> Params {
    Params::new(level).with_timing_pad_ms(0)
}

#[test]
fn sign_verify_round_trips() {
    let mut rng = thread_rng();
    for level in [SecurityLevel::Mos128, SecurityLevel::Mos256] {
        let pp = fast_params(level);
        let (pk, sk) = kem::keygen(&pp, &mut rng).unwrap();

        let msg = b"Sign this message";
        let sig = sig::sign(&pp, &sk, &pk, msg, &mut rng).unwrap();
        assert!(sig::verify(&pp, &pk, msg, &sig), "{level}");
    }
}

#[test]
fn verification_fails_under_the_wrong_public_key() {
    let mut rng = thread_rng();
    let pp = fast_params(SecurityLevel::Mos128);
    let (pk1, sk1) = kem::keygen(&pp, &mut rng).unwrap();
    let (pk2, _sk2) = kem::keygen(&pp, &mut rng).unwrap();

    let msg = b"Sign this message";
    let sig = sig::sign(&pp, &sk1, &pk1, msg, &mut rng).unwrap();
    assert!(sig::verify(&pp, &pk1, msg, &sig));
    assert!(!sig::verify(&pp, &pk2, msg, &sig));
}

#[test]
fn verification_fails_on_a_different_message() {
    let mut rng = thread_rng();
    let pp = fast_params(SecurityLevel::Mos128);
    let (pk, sk) = kem::keygen(&pp, &mut rng).unwrap();

    let sig = sig::sign(&pp, &sk, &pk, b"original message", &mut rng).unwrap();
    assert!(!sig::verify(&pp, &pk, b"original messagf", &sig));
    assert!(!sig::verify(&pp, &pk, b"", &sig));
}

#[test]
fn signatures_are_randomized_but_all_verify() {
    let mut rng = thread_rng();
    let pp = fast_params(SecurityLevel::Mos128);
    let (pk, sk) = kem::keygen(&pp, &mut rng).unwrap();

    let msg = b"same message, fresh blinds";
    let a = sig::sign(&pp, &sk, &pk, msg, &mut rng).unwrap();
    let b = sig::sign(&pp, &sk, &pk, msg, &mut rng).unwrap();
    assert_ne!(a.to_bytes(), b.to_bytes());
    assert!(sig::verify(&pp, &pk, msg, &a));
    assert!(sig::verify(&pp, &pk, msg, &b));
}

#[test]
fn tampered_signatures_fail() {
    let mut rng = thread_rng();
    let pp = fast_params(SecurityLevel::Mos128);
    let (pk, sk) = kem::keygen(&pp, &mut rng).unwrap();

    let msg = b"tamper target";
    let sig = sig::sign(&pp, &sk, &pk, msg, &mut rng).unwrap();

    // Flip one byte in each field and re-verify.
    let mut challenge_flipped = sig.clone();
    challenge_flipped.challenge[0] ^= 1;
    assert!(!sig::verify(&pp, &pk, msg, &challenge_flipped));

    let mut commitment_flipped = sig.clone();
    commitment_flipped.commitment[31] ^= 0x80;
    assert!(!sig::verify(&pp, &pk, msg, &commitment_flipped));

    let mut response_flipped = sig.clone();
    response_flipped.z1.response[0] ^= 1;
    assert!(!sig::verify(&pp, &pk, msg, &response_flipped));

    let mut walk_flipped = sig.clone();
    walk_flipped.z3.response[0] ^= 1;
    assert!(!sig::verify(&pp, &pk, msg, &walk_flipped));

    // Structural damage must return false rather than panic.
    let mut truncated = sig.clone();
    truncated.z2.response.truncate(8);
    assert!(!sig::verify(&pp, &pk, msg, &truncated));

    let mut bad_walk = sig;
    bad_walk.z3.response[0] = 9;
    assert!(!sig::verify(&pp, &pk, msg, &bad_walk));
}

#[test]
fn signature_wire_round_trips_byte_for_byte() {
    let mut rng = thread_rng();
    let pp = fast_params(SecurityLevel::Mos128);
    let (pk, sk) = kem::keygen(&pp, &mut rng).unwrap();

    let msg = b"wire format";
    let sig = sig::sign(&pp, &sk, &pk, msg, &mut rng).unwrap();

    let bytes = sig.to_bytes();
    let parsed = Signature::from_bytes(&bytes).unwrap();
    assert_eq!(parsed, sig);
    assert_eq!(parsed.to_bytes(), bytes);
    assert!(sig::verify(&pp, &pk, msg, &parsed));

    assert!(Signature::from_bytes(&bytes[..bytes.len() - 3]).is_err());
}

#[test]
fn exhausted_retry_budget_surfaces() {
    let mut rng = thread_rng();
    let pp = fast_params(SecurityLevel::Mos128).with_max_rejection_retries(0);
    let (pk, sk) = kem::keygen(&pp, &mut rng).unwrap();

    assert_eq!(
        sig::sign(&pp, &sk, &pk, b"no budget", &mut rng),
        Err(MosaicError::SigningExhausted)
    );
}

#[test]
fn signing_latency_is_padded_to_the_floor() {
    let mut rng = thread_rng();
    let pp = Params::new(SecurityLevel::Mos128).with_timing_pad_ms(40);
    let (pk, sk) = kem::keygen(&pp, &mut rng).unwrap();

    let started = Instant::now();
    let sig = sig::sign(&pp, &sk, &pk, b"padded", &mut rng).unwrap();
    assert!(started.elapsed().as_millis() >= 40);
    assert!(sig::verify(&pp, &pk, b"padded", &sig));
}
