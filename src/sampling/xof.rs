//! Deterministic seed expansion: a SHAKE256 reader behind the `rand_core`
//! traits, so every sampler in this crate runs identically off the system
//! RNG and off a 32-byte seed.

use rand_core::{CryptoRng, Error, RngCore};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Shake256, Shake256Reader};

pub struct Shake256Rng {
    reader: Shake256Reader,
}

impl Shake256Rng {
    /// Binds the expansion to a domain-separation tag and a seed.
    pub fn from_seed(dst: &[u8], seed: &[u8]) -> Self {
        let mut xof = Shake256::default();
        xof.update(dst);
        xof.update(seed);
        Shake256Rng {
            reader: xof.finalize_xof(),
        }
    }
}

impl RngCore for Shake256Rng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.reader.read(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

// The stream is a keyed XOF; predicting it requires the seed.
impl CryptoRng for Shake256Rng {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Shake256Rng::from_seed(b"dst", b"seed");
        let mut b = Shake256Rng::from_seed(b"dst", b"seed");
        for _ in 0..32 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn tag_and_seed_both_separate_streams() {
        let mut base = Shake256Rng::from_seed(b"dst", b"seed");
        let mut other_tag = Shake256Rng::from_seed(b"dst2", b"seed");
        let mut other_seed = Shake256Rng::from_seed(b"dst", b"seed2");
        let x = base.next_u64();
        assert_ne!(x, other_tag.next_u64());
        assert_ne!(x, other_seed.next_u64());
    }
}
