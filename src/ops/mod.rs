//! Signature operations over BLS12-381.
//!
//! This module provides:
//!
//! - Core operations (keypair generation, single verification, aggregate
//!   verification)
//! - [`aggregate`]: Aggregation of public keys and signatures
//! - [`batch`]: Batch verification ensuring each individual signature is valid
//!
//! # Batch vs Aggregate Verification
//!
//! Use [`batch`] when you need to ensure each individual signature is valid.
//! Use [`aggregate_verify`]/[`fast_aggregate_verify`] when you only need to
//! verify that an aggregate is valid (more efficient, but an attacker could
//! redistribute signature components between signers while keeping the
//! aggregate unchanged). Batch verification applies random scalar weights
//! internally to prevent this attack.

pub mod aggregate;
pub mod batch;

use crate::{
    arena::Arena,
    engine,
    group::{PublicKey, SecretKey, Signature, MIN_IKM_LENGTH},
    Error,
};
use rand::{CryptoRng, RngCore};

/// Options for the verification operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOpts {
    /// Infinity and group check every public key.
    pub pks_validate: bool,
    /// Group check the signature.
    pub sigs_groupcheck: bool,
}

/// Returns a new keypair derived from the provided randomness.
pub fn keypair<R: RngCore + CryptoRng>(rng: &mut R) -> (SecretKey, PublicKey) {
    let mut ikm = [0u8; MIN_IKM_LENGTH];
    rng.fill_bytes(&mut ikm);
    let private = SecretKey::from_keygen(&ikm, None).expect("ikm has the required length");
    let public = private.public_key();
    (private, public)
}

/// Verifies a single signature over a single message.
pub fn verify(
    message: &[u8],
    public_key: &PublicKey,
    signature: &Signature,
    opts: VerifyOpts,
) -> bool {
    if opts.pks_validate && public_key.validate().is_err() {
        return false;
    }
    if opts.sigs_groupcheck && signature.validate(false).is_err() {
        return false;
    }
    engine::verify(public_key.point(), message, signature.point()).is_ok()
}

/// Verifies one aggregate signature over N distinct messages from N public
/// keys, in a single pass over the arena's pairing accumulator.
///
/// Returns `Ok(false)` on cryptographic failure (including an empty or
/// mismatched input, per the engine's convention) and an error only for
/// malformed inputs discovered during the pass.
pub fn aggregate_verify<M: AsRef<[u8]>>(
    arena: &mut Arena,
    messages: &[M],
    public_keys: &[PublicKey],
    signature: &Signature,
    opts: VerifyOpts,
) -> Result<bool, Error> {
    if messages.is_empty() || messages.len() != public_keys.len() {
        return Ok(false);
    }
    let (pairs, pairing) = arena.pack_message_key_pairs(messages, public_keys)?;
    match engine::aggregate_verify(
        pairs,
        signature.point(),
        opts.pks_validate,
        opts.sigs_groupcheck,
        pairing,
    ) {
        Ok(()) => Ok(true),
        Err(Error::VerificationFailed) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Verifies one aggregate signature over a single message from N public keys
/// by aggregating the keys and verifying once.
///
/// # Warning
///
/// Safe only when the caller holds a proof of possession for every public
/// key.
pub fn fast_aggregate_verify(
    arena: &mut Arena,
    message: &[u8],
    public_keys: &[PublicKey],
    signature: &Signature,
    opts: VerifyOpts,
) -> Result<bool, Error> {
    if public_keys.is_empty() {
        return Ok(false);
    }
    let aggregate = aggregate::aggregate_public_keys(
        arena,
        public_keys,
        aggregate::PublicKeyAggOpts {
            validate: opts.pks_validate,
        },
    )?;
    Ok(verify(
        message,
        &aggregate,
        signature,
        VerifyOpts {
            pks_validate: false,
            sigs_groupcheck: opts.sigs_groupcheck,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn verify_correct_signature() {
        let (private, public) = keypair(&mut thread_rng());
        let message = b"hello, world!";
        let signature = private.sign(message);
        assert!(verify(message, &public, &signature, VerifyOpts::default()));
        assert!(verify(
            message,
            &public,
            &signature,
            VerifyOpts {
                pks_validate: true,
                sigs_groupcheck: true,
            }
        ));
    }

    #[test]
    fn verify_rejects_wrong_message_and_key() {
        let (private, public) = keypair(&mut thread_rng());
        let (_, other_public) = keypair(&mut thread_rng());
        let signature = private.sign(b"message");
        assert!(!verify(b"other", &public, &signature, VerifyOpts::default()));
        assert!(!verify(
            b"message",
            &other_public,
            &signature,
            VerifyOpts::default()
        ));
    }

    #[test]
    fn aggregate_verify_distinct_messages() {
        let mut arena = Arena::new();
        let entries: Vec<_> = (0u8..4)
            .map(|i| {
                let (private, public) = keypair(&mut thread_rng());
                let message = [i; 32];
                let signature = private.sign(&message);
                (message, public, signature)
            })
            .collect();

        let messages: Vec<_> = entries.iter().map(|(m, _, _)| *m).collect();
        let public_keys: Vec<_> = entries.iter().map(|(_, p, _)| *p).collect();
        let signatures: Vec<_> = entries.iter().map(|(_, _, s)| *s).collect();
        let signature = aggregate::aggregate_signatures(
            &mut arena,
            &signatures,
            aggregate::SignatureAggOpts::default(),
        )
        .unwrap();

        assert!(aggregate_verify(
            &mut arena,
            &messages,
            &public_keys,
            &signature,
            VerifyOpts::default()
        )
        .unwrap());

        // Swapping two messages breaks the aggregate relation.
        let mut swapped = messages.clone();
        swapped.swap(0, 1);
        assert!(!aggregate_verify(
            &mut arena,
            &swapped,
            &public_keys,
            &signature,
            VerifyOpts::default()
        )
        .unwrap());
    }

    #[test]
    fn aggregate_verify_rejects_empty_and_mismatched_input() {
        let mut arena = Arena::new();
        let (private, public) = keypair(&mut thread_rng());
        let signature = private.sign(b"message");
        let empty: [[u8; 32]; 0] = [];
        assert!(!aggregate_verify(
            &mut arena,
            &empty,
            &[],
            &signature,
            VerifyOpts::default()
        )
        .unwrap());
        assert!(!aggregate_verify(
            &mut arena,
            &[[1u8; 32], [2u8; 32]],
            &[public],
            &signature,
            VerifyOpts::default()
        )
        .unwrap());
    }

    #[test]
    fn fast_aggregate_verify_same_message() {
        let mut arena = Arena::new();
        let message = [9u8; 32];
        let mut public_keys = Vec::new();
        let mut signatures = Vec::new();
        for _ in 0..5 {
            let (private, public) = keypair(&mut thread_rng());
            signatures.push(private.sign(&message));
            public_keys.push(public);
        }
        let signature = aggregate::aggregate_signatures(
            &mut arena,
            &signatures,
            aggregate::SignatureAggOpts::default(),
        )
        .unwrap();

        assert!(fast_aggregate_verify(
            &mut arena,
            &message,
            &public_keys,
            &signature,
            VerifyOpts::default()
        )
        .unwrap());
        assert!(!fast_aggregate_verify(
            &mut arena,
            b"wrong message",
            &public_keys,
            &signature,
            VerifyOpts::default()
        )
        .unwrap());
        assert!(!fast_aggregate_verify(
            &mut arena,
            &message,
            &public_keys[..4],
            &signature,
            VerifyOpts::default()
        )
        .unwrap());
    }
}
