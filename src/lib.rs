//! kMOSAIC: an experimental post-quantum KEM and signature scheme composing
//! three heterogeneous hard problems — sparse-secret LWE (SLSS), rank-r
//! tensor decomposition (TDD) and Cayley-graph walks over SL(2, ℤ_p)
//! (EGRW) — so that an attacker has to break all three at once.
//!
//! The construction is heuristic: no formal security proof is claimed, and
//! no interoperability with standardized post-quantum schemes exists.

pub use constants::{DIGEST_NUM_BYTES, MSG_NUM_BYTES, SEED_NUM_BYTES};
pub use error::MosaicError;
pub use params::{Params, SecurityLevel};

pub mod algebra;
pub mod constants;
pub mod entangle;
pub mod error;
pub mod kem;
pub mod params;
pub mod sampling;
pub mod schemes;
pub mod sig;
pub mod utils;
