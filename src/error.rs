use thiserror::Error;

/// Errors surfaced by key generation, encapsulation, signing and the wire
/// codecs.
///
/// Two failure classes are deliberately absent:
///
/// - decapsulation never fails: malformed ciphertexts are implicitly rejected
///   by returning a pseudorandom shared secret derived from the secret key's
///   rejection seed, so the caller cannot distinguish them from honest ones;
/// - signature verification failure is a plain `false` from `sig::verify`.
///
/// Dimension mismatches inside the arithmetic kernel are programmer errors
/// and panic instead of returning a variant.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MosaicError {
    /// The parameter record fails a dimension or modulus consistency check.
    #[error("invalid parameters: {0}")]
    InvalidParams(&'static str),

    /// Seed material is too short or fails the entropy heuristic (identical
    /// bytes, stride-1 runs, short periods, too few distinct values).
    #[error("seed material failed the entropy heuristic")]
    InsufficientEntropy,

    /// Malformed length prefix, truncated field or invalid group element.
    #[error("malformed serialized material: {0}")]
    Serialization(&'static str),

    /// Norm rejection sampling exceeded the configured retry budget.
    #[error("signing retry budget exhausted")]
    SigningExhausted,
}
