//! The three sibling problem schemes the KEM and signature compose.

pub mod egrw;
pub mod slss;
pub mod tdd;
pub mod traits;

pub use egrw::Egrw;
pub use slss::Slss;
pub use tdd::Tdd;
pub use traits::ProblemScheme;

use crate::algebra::zq::{abs_center, ct_lt};

/// Decodes a noisy ℤ_q value to the bit it carries: 1 iff the value is
/// closer to ⌊q/2⌋ than to 0 under the centered distance. Branch-free; the
/// value is secret during decryption.
pub(crate) fn threshold_decode(value: u32, q: u32) -> u8 {
    let half = q / 2;
    let diff = value as i64 - half as i64;
    let sign = diff >> 63;
    let dist_half = ((diff ^ sign) - sign) as u32;
    let dist_zero = abs_center(value, q);
    ct_lt(dist_half, dist_zero).unwrap_u8()
}

/// Reads bit `i` of a 32-byte message block (LSB-first within each byte).
#[inline]
pub(crate) fn message_bit(msg: &[u8; 32], i: usize) -> u32 {
    ((msg[i / 8] >> (i % 8)) & 1) as u32
}
