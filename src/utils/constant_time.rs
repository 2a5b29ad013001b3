//! Thin wrappers over `subtle` so the branch-free call sites read as the
//! operations they implement.

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

/// Constant-time byte-slice equality. Slices of unequal length compare as
/// not-equal without inspecting contents; length is considered public.
pub fn ct_eq(a: &[u8], b: &[u8]) -> Choice {
    if a.len() != b.len() {
        return Choice::from(0);
    }
    a.ct_eq(b)
}

/// `bool` facade over [`ct_eq`] for callers outside the branch-free paths.
pub fn ct_eq_bool(a: &[u8], b: &[u8]) -> bool {
    ct_eq(a, b).into()
}

/// Returns `a` when `choice` is set and `b` otherwise, reading both inputs
/// in full either way.
pub fn ct_select(choice: Choice, a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = u8::conditional_select(&b[i], &a[i], choice);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn equal_zero_buffers_compare_equal() {
        let a = [0u8; 64];
        let b = [0u8; 64];
        assert!(ct_eq_bool(&a, &b));
    }

    #[test]
    fn any_single_bit_flip_breaks_equality() {
        let a = [0u8; 32];
        for byte in 0..32 {
            for bit in 0..8 {
                let mut b = [0u8; 32];
                b[byte] ^= 1 << bit;
                assert!(!ct_eq_bool(&a, &b), "flip at byte {byte} bit {bit}");
            }
        }
    }

    #[test]
    fn length_mismatch_is_not_equal() {
        assert!(!ct_eq_bool(&[0u8; 32], &[0u8; 31]));
    }

    #[test]
    fn select_touches_the_chosen_side() {
        let a = [0x11u8; 32];
        let b = [0x22u8; 32];
        assert_eq!(ct_select(Choice::from(1), &a, &b), a);
        assert_eq!(ct_select(Choice::from(0), &a, &b), b);
    }
}
