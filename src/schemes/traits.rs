use crate::constants::MSG_NUM_BYTES;
use crate::error::MosaicError;
use rand_core::{CryptoRng, RngCore};

/// A public-key scheme over one of the MOSAIC hard problems.
///
/// The KEM runs three of these side by side on the same message block; the
/// signature reuses their secret keys as independent Fiat–Shamir witnesses.
/// Decryption is total — an invalid ciphertext decrypts to garbage, never to
/// an error — so the FO decapsulation path can stay branch-free.
pub trait ProblemScheme {
    type Params;
    type PublicKey;
    type SecretKey;
    type Ciphertext: PartialEq;

    /// Developer-facing name (bench ids, debugging).
    fn scheme_name() -> String;

    fn keygen<R: RngCore + CryptoRng>(
        pp: &Self::Params,
        rng: &mut R,
    ) -> (Self::PublicKey, Self::SecretKey);

    /// Encrypts one 32-byte message block.
    fn encrypt<R: RngCore + CryptoRng>(
        pp: &Self::Params,
        pk: &Self::PublicKey,
        msg: &[u8; MSG_NUM_BYTES],
        rng: &mut R,
    ) -> Self::Ciphertext;

    fn decrypt(
        pp: &Self::Params,
        sk: &Self::SecretKey,
        ct: &Self::Ciphertext,
    ) -> [u8; MSG_NUM_BYTES];

    fn serialize_public_key(pp: &Self::Params, pk: &Self::PublicKey) -> Vec<u8>;

    fn deserialize_public_key(
        pp: &Self::Params,
        bytes: &[u8],
    ) -> Result<Self::PublicKey, MosaicError>;

    fn serialize_ciphertext(pp: &Self::Params, ct: &Self::Ciphertext) -> Vec<u8>;

    fn deserialize_ciphertext(
        pp: &Self::Params,
        bytes: &[u8],
    ) -> Result<Self::Ciphertext, MosaicError>;
}
