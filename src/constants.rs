//
// Domain-separation tags. Every hash or XOF call in the library goes through
// exactly one of these; adding a call site means adding a tag.
//

/// Binds the three sub-public-keys into one composite identity.
pub const DST_BIND: &[u8; 11] = b"MOSAIC-BIND";

/// Hash commitments: `commit(m, r) = SHA3-256(DST_COMMIT || r || m)`.
pub const DST_COMMIT: &[u8; 13] = b"MOSAIC-COMMIT";

/// Challenge of the encapsulation-consistency proof.
pub const DST_NIZK: &[u8; 11] = b"MOSAIC-NIZK";

/// Maps the encapsulated message to an invertible scalar for the proof.
pub const DST_NIZK_MU: &[u8; 14] = b"MOSAIC-NIZK-MU";

/// Derives the proof's blinding scalars from the encapsulation randomness.
pub const DST_NIZK_R: &[u8; 13] = b"MOSAIC-NIZK-R";

/// Per-scheme encryption randomness inside the FO transform.
pub const DST_KEM_R: &[u8; 12] = b"MOSAIC-KEM-R";

/// Shared-secret derivation on the accepting path.
pub const DST_KEM_K: &[u8; 12] = b"MOSAIC-KEM-K";

/// Shared-secret derivation on the implicit-rejection path.
pub const DST_KEM_REJ: &[u8; 14] = b"MOSAIC-KEM-REJ";

/// Splits the composite key-generation seed into three scheme seeds.
pub const DST_KEYGEN: &[u8; 13] = b"MOSAIC-KEYGEN";

/// Seed expansion for the SLSS key generator.
pub const DST_KEYGEN_SLSS: &[u8; 14] = b"MOSAIC-KG-SLSS";

/// Seed expansion for the TDD key generator.
pub const DST_KEYGEN_TDD: &[u8; 13] = b"MOSAIC-KG-TDD";

/// Seed expansion for the EGRW key generator.
pub const DST_KEYGEN_EGRW: &[u8; 14] = b"MOSAIC-KG-EGRW";

/// Deterministic expansion of the SLSS public matrix from its seed.
pub const DST_EXPAND_A: &[u8; 15] = b"MOSAIC-EXPAND-A";

/// Seeded SLSS encryption inside the FO transform.
pub const DST_ENC_SLSS: &[u8; 15] = b"MOSAIC-ENC-SLSS";

/// Seeded TDD encryption inside the FO transform.
pub const DST_ENC_TDD: &[u8; 14] = b"MOSAIC-ENC-TDD";

/// Seeded EGRW encryption inside the FO transform.
pub const DST_ENC_EGRW: &[u8; 15] = b"MOSAIC-ENC-EGRW";

/// Expansion of the TDD per-bit probe vectors from the ciphertext seed.
pub const DST_TDD_U: &[u8; 12] = b"MOSAIC-TDD-U";

/// Expansion of the TDD signature probe vectors from the public tensor.
pub const DST_TDD_PROBE: &[u8; 16] = b"MOSAIC-TDD-PROBE";

/// Fingerprint of a TDD factor candidate under the signature probes.
pub const DST_TDD_FP: &[u8; 13] = b"MOSAIC-TDD-FP";

/// Pad derivation for the EGRW walk ciphertext.
pub const DST_EGRW_PAD: &[u8; 15] = b"MOSAIC-EGRW-PAD";

/// Signature challenge.
pub const DST_SIG_C: &[u8; 12] = b"MOSAIC-SIG-C";

/// Expansion of the signature challenge into per-scheme sub-challenges.
pub const DST_SIG_SUBC: &[u8; 15] = b"MOSAIC-SIG-SUBC";

/// Stream pad of the hybrid data-encapsulation layer.
pub const DST_DEM: &[u8; 10] = b"MOSAIC-DEM";

//
// Sizes
//

/// High-entropy seeds (key generation, matrix expansion, commitments).
pub const SEED_NUM_BYTES: usize = 32;

/// SHA3-256 output.
pub const DIGEST_NUM_BYTES: usize = 32;

/// The encapsulated message block and the derived shared secret.
pub const MSG_NUM_BYTES: usize = 32;

/// Bit width of the encapsulated message block.
pub const MSG_NUM_BITS: usize = 8 * MSG_NUM_BYTES;

/// A serialized ℤ_q scalar (32-bit little-endian).
pub const SCALAR_NUM_BYTES: usize = 4;

//
// Heuristics and budgets
//

/// Minimum number of distinct byte values a seed must contain.
pub const MIN_DISTINCT_SEED_BYTES: usize = 8;

/// Longest repetition period the seed entropy heuristic rejects.
pub const MAX_SEED_PERIOD: usize = 4;

/// Default bound on norm-rejection retries during signing.
pub const DEFAULT_MAX_REJECTION_RETRIES: u32 = 16;

/// Slack factor applied to the SLSS norm bound β for the error-witness
/// response: the blind is drawn from [−8β, 8β] so that adding c·e keeps the
/// per-attempt acceptance rate usable.
pub const SIG_ERROR_SLACK: u32 = 8;
