use crate::constants::DEFAULT_MAX_REJECTION_RETRIES;
use crate::error::MosaicError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

//
// Parameter tables (MOS-128 / MOS-256)
//

const MOS128_SLSS_N: usize = 512;
const MOS128_SLSS_M: usize = 384;
const MOS128_SLSS_Q: u32 = 7681;
const MOS128_SLSS_W: usize = 64;
const MOS128_TDD_N: usize = 16;
const MOS128_TDD_R: usize = 4;
const MOS128_EGRW_P: u64 = (1 << 31) - 1;
const MOS128_EGRW_K: usize = 64;
const MOS128_TIMING_PAD_MS: u64 = 25;

const MOS256_SLSS_N: usize = 1024;
const MOS256_SLSS_M: usize = 768;
const MOS256_SLSS_Q: u32 = 12289;
const MOS256_SLSS_W: usize = 96;
const MOS256_TDD_N: usize = 24;
const MOS256_TDD_R: usize = 6;
const MOS256_EGRW_P: u64 = (1 << 61) - 1;
const MOS256_EGRW_K: usize = 128;
const MOS256_TIMING_PAD_MS: u64 = 50;

/// Width of every discrete Gaussian in the construction. The CDT sampler's
/// table is built for this value, so it is not per-level.
pub const GAUSSIAN_SIGMA: f64 = 3.0;

static_assertions::const_assert!(MOS128_SLSS_W <= MOS128_SLSS_N);
static_assertions::const_assert!(MOS256_SLSS_W <= MOS256_SLSS_N);
static_assertions::const_assert!(MOS128_SLSS_W <= MOS128_SLSS_M);
static_assertions::const_assert!(MOS256_SLSS_W <= MOS256_SLSS_M);

/// The two supported parameter sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityLevel {
    Mos128,
    Mos256,
}

impl SecurityLevel {
    /// One-byte tag used by the wire format.
    pub fn tag(&self) -> u8 {
        match self {
            SecurityLevel::Mos128 => 0x01,
            SecurityLevel::Mos256 => 0x02,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, MosaicError> {
        match tag {
            0x01 => Ok(SecurityLevel::Mos128),
            0x02 => Ok(SecurityLevel::Mos256),
            _ => Err(MosaicError::Serialization("unknown security level tag")),
        }
    }
}

impl Display for SecurityLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityLevel::Mos128 => write!(f, "MOS-128"),
            SecurityLevel::Mos256 => write!(f, "MOS-256"),
        }
    }
}

/// Parameters of the sparse-secret LWE scheme.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlssParams {
    /// Secret dimension (columns of A).
    pub n: usize,
    /// Sample dimension (rows of A).
    pub m: usize,
    /// Prime modulus.
    pub q: u32,
    /// Number of nonzero entries of the ternary secret.
    pub w: usize,
    /// Gaussian width of every error term.
    pub sigma: f64,
    /// Signature norm bound, ⌊2σ√n⌋.
    pub beta: u32,
}

/// Parameters of the rank-r tensor scheme.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TddParams {
    /// Tensor side length.
    pub n: usize,
    /// Prime modulus (shared with SLSS at both levels).
    pub q: u32,
    /// Rank of the hidden decomposition.
    pub r: usize,
    /// Gaussian width of the noise tensor.
    pub sigma: f64,
}

/// Parameters of the Cayley-walk scheme over SL(2, ℤ_p).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EgrwParams {
    /// Mersenne prime modulus of the matrix entries.
    pub p: u64,
    /// Walk length.
    pub k: usize,
}

/// The full parameter record selected by a [`SecurityLevel`], plus the two
/// recognized configuration knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Params {
    pub level: SecurityLevel,
    pub slss: SlssParams,
    pub tdd: TddParams,
    pub egrw: EgrwParams,
    /// Minimum signing latency in milliseconds; the signer sleeps the
    /// remainder. A coarse defense against micro-benchmarking only.
    pub timing_pad_ms: u64,
    /// Bound on norm-rejection retries before `SigningExhausted`.
    pub max_rejection_retries: u32,
}

impl Params {
    pub fn new(level: SecurityLevel) -> Self {
        let (n, m, q, w, tdd_n, tdd_r, p, k, pad) = match level {
            SecurityLevel::Mos128 => (
                MOS128_SLSS_N,
                MOS128_SLSS_M,
                MOS128_SLSS_Q,
                MOS128_SLSS_W,
                MOS128_TDD_N,
                MOS128_TDD_R,
                MOS128_EGRW_P,
                MOS128_EGRW_K,
                MOS128_TIMING_PAD_MS,
            ),
            SecurityLevel::Mos256 => (
                MOS256_SLSS_N,
                MOS256_SLSS_M,
                MOS256_SLSS_Q,
                MOS256_SLSS_W,
                MOS256_TDD_N,
                MOS256_TDD_R,
                MOS256_EGRW_P,
                MOS256_EGRW_K,
                MOS256_TIMING_PAD_MS,
            ),
        };

        Params {
            level,
            slss: SlssParams {
                n,
                m,
                q,
                w,
                sigma: GAUSSIAN_SIGMA,
                beta: (2.0 * GAUSSIAN_SIGMA * (n as f64).sqrt()) as u32,
            },
            tdd: TddParams {
                n: tdd_n,
                q,
                r: tdd_r,
                sigma: GAUSSIAN_SIGMA,
            },
            egrw: EgrwParams { p, k },
            timing_pad_ms: pad,
            max_rejection_retries: DEFAULT_MAX_REJECTION_RETRIES,
        }
    }

    /// Overrides the signing latency floor.
    pub fn with_timing_pad_ms(mut self, ms: u64) -> Self {
        self.timing_pad_ms = ms;
        self
    }

    /// Overrides the norm-rejection retry budget.
    pub fn with_max_rejection_retries(mut self, retries: u32) -> Self {
        self.max_rejection_retries = retries;
        self
    }

    /// Dimension and modulus consistency checks. Custom records built by hand
    /// must pass this before any keys are generated from them.
    pub fn validate(&self) -> Result<(), MosaicError> {
        if self.slss.n == 0 || self.slss.m == 0 || self.tdd.n == 0 || self.egrw.k == 0 {
            return Err(MosaicError::InvalidParams("zero dimension"));
        }
        if self.slss.w == 0 || self.slss.w > self.slss.n || self.slss.w > self.slss.m {
            return Err(MosaicError::InvalidParams("sparse weight out of range"));
        }
        if self.slss.q < 2 || self.slss.beta >= self.slss.q / 2 {
            return Err(MosaicError::InvalidParams("norm bound exceeds q/2"));
        }
        if self.tdd.q != self.slss.q {
            return Err(MosaicError::InvalidParams("scheme moduli disagree"));
        }
        if self.tdd.r == 0 || self.tdd.r > self.tdd.n {
            return Err(MosaicError::InvalidParams("tensor rank out of range"));
        }
        // The SL2 kernel folds modulo 2^bits − 1, so only the two Mersenne
        // primes from the tables are admissible.
        if self.egrw.p != MOS128_EGRW_P && self.egrw.p != MOS256_EGRW_P {
            return Err(MosaicError::InvalidParams("unsupported SL2 modulus"));
        }
        if self.slss.sigma != GAUSSIAN_SIGMA || self.tdd.sigma != GAUSSIAN_SIGMA {
            return Err(MosaicError::InvalidParams("unsupported gaussian width"));
        }
        Ok(())
    }
}

impl Display for Params {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.level)
    }
}
