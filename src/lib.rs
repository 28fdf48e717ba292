//! BLS12-381 signatures with aggregation and batch verification.
//!
//! This crate is a thin, allocation-conscious layer over the [`blst`] pairing
//! engine. It provides key generation and EIP-2333 derivation, signing, single
//! and aggregate verification, and batch verification of many
//! (message, public key, signature) sets in a single pairing pass.
//!
//! Points are encoded according to the "ZCash BLS12-381" specification
//! (<https://github.com/supranational/blst/tree/master?tab=readme-ov-file#serialization-format>)
//! and messages are hashed to the curve according to RFC 9380, using the
//! proof-of-possession ciphersuite (`BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_`)
//! with public keys on G1 (48 bytes compressed) and signatures on G2 (96 bytes
//! compressed).
//!
//! # Scratch Arenas
//!
//! Aggregation and batch verification route their inputs through an [`Arena`]:
//! a set of fixed-capacity reference tables and a pairing accumulator that are
//! allocated once and reused across calls, so the hot path performs no
//! allocation. An arena is single-threaded by construction (`!Send`/`!Sync`);
//! give each thread its own.
//!
//! # Example
//!
//! ```rust
//! use bls12381_sig::{ops, Arena, BatchOpts, SignatureSet};
//! use rand::thread_rng;
//!
//! // Generate two keypairs
//! let (private1, public1) = ops::keypair(&mut thread_rng());
//! let (private2, public2) = ops::keypair(&mut thread_rng());
//!
//! // Sign distinct messages
//! let msg1 = [1u8; 32];
//! let msg2 = [2u8; 32];
//! let sig1 = private1.sign(&msg1);
//! let sig2 = private2.sign(&msg2);
//!
//! // Verify both signatures in a single pairing pass
//! let mut arena = Arena::new();
//! let sets = [
//!     SignatureSet { message: &msg1, public_key: &public1, signature: &sig1 },
//!     SignatureSet { message: &msg2, public_key: &public2, signature: &sig2 },
//! ];
//! let valid = ops::batch::verify_multiple_aggregate_signatures(
//!     &mut thread_rng(),
//!     &mut arena,
//!     &sets,
//!     BatchOpts::default(),
//! )
//! .expect("inputs are well-formed");
//! assert!(valid);
//! ```

use thiserror::Error;

pub mod arena;
pub(crate) mod engine;
pub mod group;
pub mod ops;

pub use arena::{Arena, MAX_AGGREGATE_PER_JOB, MAX_SIGNATURE_SETS_PER_JOB};
pub use group::{PublicKey, PublicKeyOpts, SecretKey, Signature, SignatureOpts};
pub use ops::batch::{BatchOpts, SignatureSet};

/// Errors that can occur when working with BLS12-381 signatures.
///
/// The first seven kinds mirror the engine's status taxonomy; the remaining
/// kinds are produced by this crate before any engine call is made.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("invalid encoding")]
    BadEncoding,
    #[error("point not on curve")]
    PointNotOnCurve,
    #[error("point not in group")]
    PointNotInGroup,
    #[error("aggregation type mismatch")]
    AggregationTypeMismatch,
    #[error("verification failed")]
    VerificationFailed,
    #[error("public key is infinity")]
    PublicKeyIsInfinity,
    #[error("invalid scalar")]
    BadScalar,
    #[error("too many items: {count} > {max}")]
    TooManyItems { count: usize, max: usize },
    #[error("inconsistent item length: expected {expected}, got {actual}")]
    InconsistentLength { expected: usize, actual: usize },
    #[error("empty input")]
    EmptyInput,
}
