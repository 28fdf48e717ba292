//! Scratch arenas for batched engine calls.
//!
//! Aggregating or batch-verifying N items requires handing the engine one
//! table referencing all N inputs. An [Arena] owns those tables, along with
//! the pairing accumulator used by batch verification, at a fixed capacity:
//! repeated calls reuse the same memory instead of allocating per call.
//!
//! A packed table borrows both the arena and the source entities: the borrow
//! checker guarantees that no reference outlives its source and that at most
//! one aggregation or verification call is in flight per arena. Table
//! contents are dead the instant a call returns. An arena holds raw pointers
//! and is therefore neither `Send` nor `Sync`; give each thread its own.

use crate::{
    group::{PublicKey, Signature},
    engine, Error,
};
use blst::{blst_p1_affine, blst_p2_affine};
use std::ptr;

/// Maximum number of public keys or signatures accepted by one aggregation
/// call, for arenas built with [Arena::new].
pub const MAX_AGGREGATE_PER_JOB: usize = 128;

/// Maximum number of signature sets accepted by one batch-verification call,
/// for arenas built with [Arena::new].
pub const MAX_SIGNATURE_SETS_PER_JOB: usize = 128;

/// One slot of the batch-verification table: three references describing a
/// (message, public key, signature) set.
///
/// A null `sig` marks a pair used by aggregate verification, where the one
/// signature is carried separately.
#[derive(Clone, Copy)]
pub(crate) struct SetRef {
    pub msg: *const u8,
    pub msg_len: usize,
    pub pk: *const blst_p1_affine,
    pub sig: *const blst_p2_affine,
}

/// Reusable scratch tables for aggregation and batch verification.
pub struct Arena {
    pk_refs: Vec<*const blst_p1_affine>,
    sig_refs: Vec<*const blst_p2_affine>,
    byte_refs: Vec<*const u8>,
    set_refs: Vec<SetRef>,
    pairing: Vec<u64>,
    max_aggregate: usize,
    max_signature_sets: usize,
}

impl Arena {
    /// Creates an arena with the default capacities ([MAX_AGGREGATE_PER_JOB],
    /// [MAX_SIGNATURE_SETS_PER_JOB]).
    pub fn new() -> Self {
        Self::with_capacity(MAX_AGGREGATE_PER_JOB, MAX_SIGNATURE_SETS_PER_JOB)
    }

    /// Creates an arena with custom capacities. All tables are allocated
    /// up front; the pairing accumulator is sized to the engine-reported
    /// context size, queried once here.
    pub fn with_capacity(max_aggregate: usize, max_signature_sets: usize) -> Self {
        Self {
            pk_refs: Vec::with_capacity(max_aggregate),
            sig_refs: Vec::with_capacity(max_aggregate),
            byte_refs: Vec::with_capacity(max_aggregate),
            set_refs: Vec::with_capacity(max_signature_sets),
            pairing: vec![0u64; engine::pairing_sizeof() / 8],
            max_aggregate,
            max_signature_sets,
        }
    }

    /// Maximum number of items accepted by one aggregation call.
    pub fn max_aggregate(&self) -> usize {
        self.max_aggregate
    }

    /// Maximum number of sets accepted by one batch-verification call.
    pub fn max_signature_sets(&self) -> usize {
        self.max_signature_sets
    }

    /// Packs references to the keys' point buffers, in input order.
    pub(crate) fn pack_public_keys<'a>(
        &'a mut self,
        keys: &'a [PublicKey],
    ) -> Result<&'a [*const blst_p1_affine], Error> {
        if keys.len() > self.max_aggregate {
            return Err(Error::TooManyItems {
                count: keys.len(),
                max: self.max_aggregate,
            });
        }
        self.pk_refs.clear();
        for key in keys {
            self.pk_refs.push(key.point() as *const _);
        }
        Ok(&self.pk_refs)
    }

    /// Packs references to the signatures' point buffers, in input order.
    pub(crate) fn pack_signatures<'a>(
        &'a mut self,
        sigs: &'a [Signature],
    ) -> Result<&'a [*const blst_p2_affine], Error> {
        if sigs.len() > self.max_aggregate {
            return Err(Error::TooManyItems {
                count: sigs.len(),
                max: self.max_aggregate,
            });
        }
        self.sig_refs.clear();
        for sig in sigs {
            self.sig_refs.push(sig.point() as *const _);
        }
        Ok(&self.sig_refs)
    }

    /// Packs references to wire-encoded items, which must be non-empty and
    /// share one length (the engine is told a single per-item length).
    /// Returns the table and that length.
    pub(crate) fn pack_serialized<'a, B: AsRef<[u8]>>(
        &'a mut self,
        items: &'a [B],
    ) -> Result<(&'a [*const u8], usize), Error> {
        if items.is_empty() {
            return Err(Error::EmptyInput);
        }
        if items.len() > self.max_aggregate {
            return Err(Error::TooManyItems {
                count: items.len(),
                max: self.max_aggregate,
            });
        }
        let expected = items[0].as_ref().len();
        for item in items {
            let actual = item.as_ref().len();
            if actual != expected {
                return Err(Error::InconsistentLength { expected, actual });
            }
        }
        self.byte_refs.clear();
        for item in items {
            self.byte_refs.push(item.as_ref().as_ptr());
        }
        Ok((&self.byte_refs, expected))
    }

    /// Packs one slot per set (three references each) and hands back the
    /// slot table together with the pairing accumulator.
    pub(crate) fn pack_signature_sets<'a>(
        &'a mut self,
        sets: &'a [crate::ops::batch::SignatureSet<'a>],
    ) -> Result<(&'a [SetRef], &'a mut [u64]), Error> {
        if sets.len() > self.max_signature_sets {
            return Err(Error::TooManyItems {
                count: sets.len(),
                max: self.max_signature_sets,
            });
        }
        self.set_refs.clear();
        for set in sets {
            self.set_refs.push(SetRef {
                msg: set.message.as_ptr(),
                msg_len: set.message.len(),
                pk: set.public_key.point(),
                sig: set.signature.point(),
            });
        }
        Ok((&self.set_refs, &mut self.pairing))
    }

    /// Packs one slot per (message, public key) pair for aggregate
    /// verification, together with the pairing accumulator.
    pub(crate) fn pack_message_key_pairs<'a, M: AsRef<[u8]>>(
        &'a mut self,
        messages: &'a [M],
        keys: &'a [PublicKey],
    ) -> Result<(&'a [SetRef], &'a mut [u64]), Error> {
        if messages.len() > self.max_signature_sets {
            return Err(Error::TooManyItems {
                count: messages.len(),
                max: self.max_signature_sets,
            });
        }
        self.set_refs.clear();
        for (message, key) in messages.iter().zip(keys) {
            let message = message.as_ref();
            self.set_refs.push(SetRef {
                msg: message.as_ptr(),
                msg_len: message.len(),
                pk: key.point(),
                sig: ptr::null(),
            });
        }
        Ok((&self.set_refs, &mut self.pairing))
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use rand::thread_rng;

    #[test]
    fn capacity_is_fixed_at_construction() {
        let arena = Arena::with_capacity(2, 3);
        assert_eq!(arena.max_aggregate(), 2);
        assert_eq!(arena.max_signature_sets(), 3);
    }

    #[test]
    fn packing_rejects_over_capacity() {
        let mut arena = Arena::with_capacity(2, 2);
        let keys: Vec<_> = (0..3)
            .map(|_| ops::keypair(&mut thread_rng()).1)
            .collect();
        assert_eq!(
            arena.pack_public_keys(&keys).err(),
            Some(Error::TooManyItems { count: 3, max: 2 })
        );
    }

    #[test]
    fn packing_rejects_inconsistent_lengths() {
        let mut arena = Arena::new();
        let (_, public) = ops::keypair(&mut thread_rng());
        let items = [public.to_bytes().to_vec(), public.serialize().to_vec()];
        assert_eq!(
            arena.pack_serialized(&items).err(),
            Some(Error::InconsistentLength {
                expected: 48,
                actual: 96
            })
        );
    }

    #[test]
    fn packing_rejects_empty_serialized_input() {
        let mut arena = Arena::new();
        let items: [&[u8]; 0] = [];
        assert_eq!(arena.pack_serialized(&items).err(), Some(Error::EmptyInput));
    }

    #[test]
    fn packing_preserves_input_order() {
        let mut arena = Arena::new();
        let keys: Vec<_> = (0..4)
            .map(|_| ops::keypair(&mut thread_rng()).1)
            .collect();
        let refs = arena.pack_public_keys(&keys).unwrap();
        for (reference, key) in refs.iter().zip(&keys) {
            assert!(std::ptr::eq(*reference, key.point()));
        }
    }
}
