//! Batch verification of independent (message, public key, signature) sets.
//!
//! All sets are verified jointly in a single pairing pass over the arena's
//! accumulator, per the fast multiple-signature verification protocol
//! (<https://ethresear.ch/t/fast-verification-of-multiple-bls-signatures/5407>).
//! Each set is weighted with a fresh random scalar, so a passing batch
//! implies every individual signature is valid.

use crate::{
    arena::Arena,
    engine,
    group::{PublicKey, Signature},
    Error,
};
use rand::{CryptoRng, RngCore};

/// One batch-verification input: a message with the public key and signature
/// to verify it against.
///
/// Borrows its members for the duration of one call. Messages are
/// conventionally 32-byte digests; this layer does not enforce a length.
#[derive(Clone, Copy)]
pub struct SignatureSet<'a> {
    pub message: &'a [u8],
    pub public_key: &'a PublicKey,
    pub signature: &'a Signature,
}

/// Options for batch verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOpts {
    /// Infinity and group check every public key during the pass.
    pub pks_validate: bool,
    /// Group check every signature during the pass.
    pub sigs_groupcheck: bool,
}

/// Verifies that every set's signature is valid for its message under its
/// public key, jointly, in one engine pass.
///
/// The result is all-or-nothing: `Ok(true)` when the joint pairing check
/// passes, `Ok(false)` when it fails (no per-set result is available), and
/// an error only for inputs rejected before or during the pass (capacity
/// violations and malformed points). An empty batch is vacuously `Ok(true)`.
pub fn verify_multiple_aggregate_signatures<R: RngCore + CryptoRng>(
    rng: &mut R,
    arena: &mut Arena,
    sets: &[SignatureSet<'_>],
    opts: BatchOpts,
) -> Result<bool, Error> {
    if sets.is_empty() {
        return Ok(true);
    }
    let (refs, pairing) = arena.pack_signature_sets(sets)?;
    match engine::verify_multiple_aggregate_signatures(
        rng,
        refs,
        opts.pks_validate,
        opts.sigs_groupcheck,
        pairing,
    ) {
        Ok(()) => Ok(true),
        Err(Error::VerificationFailed) => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        group::{PublicKeyOpts, SecretKey, PUBLIC_KEY_LENGTH_COMPRESSED},
        ops::{keypair, verify, VerifyOpts},
    };
    use rand::thread_rng;

    struct Entry {
        message: [u8; 32],
        public: PublicKey,
        signature: Signature,
    }

    fn generate_entries(n: usize) -> Vec<Entry> {
        (0..n)
            .map(|i| {
                let (private, public) = keypair(&mut thread_rng());
                let mut message = [0u8; 32];
                message[0] = i as u8;
                thread_rng().fill_bytes(&mut message[1..]);
                Entry {
                    message,
                    public,
                    signature: private.sign(&message),
                }
            })
            .collect()
    }

    fn sets_of(entries: &[Entry]) -> Vec<SignatureSet<'_>> {
        entries
            .iter()
            .map(|entry| SignatureSet {
                message: &entry.message,
                public_key: &entry.public,
                signature: &entry.signature,
            })
            .collect()
    }

    #[test]
    fn batch_of_valid_sets_verifies() {
        let mut arena = Arena::new();
        let entries = generate_entries(8);
        let sets = sets_of(&entries);
        assert!(verify_multiple_aggregate_signatures(
            &mut thread_rng(),
            &mut arena,
            &sets,
            BatchOpts {
                pks_validate: true,
                sigs_groupcheck: true,
            }
        )
        .unwrap());
    }

    #[test]
    fn corrupted_message_fails_the_whole_batch() {
        let mut arena = Arena::new();
        let mut entries = generate_entries(4);
        entries[2].message[7] ^= 0x01;
        let sets = sets_of(&entries);
        assert!(!verify_multiple_aggregate_signatures(
            &mut thread_rng(),
            &mut arena,
            &sets,
            BatchOpts::default()
        )
        .unwrap());
    }

    #[test]
    fn wrong_public_key_fails_the_whole_batch() {
        let mut arena = Arena::new();
        let mut entries = generate_entries(4);
        entries[0].public = keypair(&mut thread_rng()).1;
        let sets = sets_of(&entries);
        assert!(!verify_multiple_aggregate_signatures(
            &mut thread_rng(),
            &mut arena,
            &sets,
            BatchOpts::default()
        )
        .unwrap());
    }

    #[test]
    fn wrong_signature_fails_the_whole_batch() {
        let mut arena = Arena::new();
        let mut entries = generate_entries(4);
        entries[3].signature = SecretKey::from_keygen(&[42u8; 32], None)
            .unwrap()
            .sign(b"unrelated");
        let sets = sets_of(&entries);
        assert!(!verify_multiple_aggregate_signatures(
            &mut thread_rng(),
            &mut arena,
            &sets,
            BatchOpts::default()
        )
        .unwrap());
    }

    #[test]
    fn single_set_matches_single_verification() {
        let mut arena = Arena::new();
        let entries = generate_entries(1);
        let sets = sets_of(&entries);
        let batched = verify_multiple_aggregate_signatures(
            &mut thread_rng(),
            &mut arena,
            &sets,
            BatchOpts::default(),
        )
        .unwrap();
        let single = verify(
            &entries[0].message,
            &entries[0].public,
            &entries[0].signature,
            VerifyOpts::default(),
        );
        assert!(batched);
        assert_eq!(batched, single);

        // A corrupted triple fails both paths identically.
        let mut message = entries[0].message;
        message[0] ^= 0xff;
        let sets = [SignatureSet {
            message: &message,
            public_key: &entries[0].public,
            signature: &entries[0].signature,
        }];
        let batched = verify_multiple_aggregate_signatures(
            &mut thread_rng(),
            &mut arena,
            &sets,
            BatchOpts::default(),
        )
        .unwrap();
        let single = verify(
            &message,
            &entries[0].public,
            &entries[0].signature,
            VerifyOpts::default(),
        );
        assert!(!batched);
        assert_eq!(batched, single);
    }

    #[test]
    fn empty_batch_is_vacuously_true() {
        let mut arena = Arena::new();
        assert!(verify_multiple_aggregate_signatures(
            &mut thread_rng(),
            &mut arena,
            &[],
            BatchOpts::default()
        )
        .unwrap());
    }

    #[test]
    fn capacity_is_enforced() {
        let mut arena = Arena::with_capacity(8, 2);
        let entries = generate_entries(3);
        let sets = sets_of(&entries);
        assert_eq!(
            verify_multiple_aggregate_signatures(
                &mut thread_rng(),
                &mut arena,
                &sets,
                BatchOpts::default()
            )
            .err(),
            Some(Error::TooManyItems { count: 3, max: 2 })
        );
    }

    #[test]
    fn malformed_key_is_an_error_not_a_false() {
        let mut arena = Arena::new();
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH_COMPRESSED];
        bytes[0] = 0xc0;
        let infinity = PublicKey::from_bytes(&bytes, PublicKeyOpts::default()).unwrap();
        let entries = generate_entries(1);
        let sets = [SignatureSet {
            message: &entries[0].message,
            public_key: &infinity,
            signature: &entries[0].signature,
        }];
        assert_eq!(
            verify_multiple_aggregate_signatures(
                &mut thread_rng(),
                &mut arena,
                &sets,
                BatchOpts {
                    pks_validate: true,
                    sigs_groupcheck: false,
                }
            )
            .err(),
            Some(Error::PublicKeyIsInfinity)
        );
        // The engine rejects infinite public keys even without the group
        // check, so this surfaces as an error rather than a false.
        assert_eq!(
            verify_multiple_aggregate_signatures(
                &mut thread_rng(),
                &mut arena,
                &sets,
                BatchOpts::default()
            )
            .err(),
            Some(Error::PublicKeyIsInfinity)
        );
    }

    #[test]
    fn arena_is_reusable_across_batches() {
        let mut arena = Arena::new();
        for _ in 0..3 {
            let entries = generate_entries(2);
            let sets = sets_of(&entries);
            assert!(verify_multiple_aggregate_signatures(
                &mut thread_rng(),
                &mut arena,
                &sets,
                BatchOpts::default()
            )
            .unwrap());
        }
    }
}
