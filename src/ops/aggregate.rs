//! Aggregation of public keys and signatures.
//!
//! Inputs are routed through the arena's reference tables so the engine adds
//! all N points in one pass. Every operation returns a freshly constructed
//! entity; inputs are never modified.
//!
//! # Security Considerations
//!
//! Aggregating public keys is only safe when the caller holds a proof of
//! possession for each key, and aggregate signatures only attest to the
//! aggregate. Use [`batch`](super::batch) when each individual signature
//! must be valid.

use crate::{
    arena::Arena,
    engine,
    group::{PublicKey, Signature},
    Error,
};

/// Options for public key aggregation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicKeyAggOpts {
    /// Infinity and group check every key before aggregation.
    pub validate: bool,
}

/// Options for signature aggregation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureAggOpts {
    /// Group check every signature before aggregation. No infinity check is
    /// performed: a legitimate aggregate may pass through intermediate
    /// points that would be rejected under public-key semantics.
    pub groupcheck: bool,
}

/// Aggregates multiple public keys into a single public key.
///
/// Fails with [Error::TooManyItems] beyond the arena's aggregation capacity
/// and with [Error::EmptyInput] for zero keys, before any engine call.
pub fn aggregate_public_keys(
    arena: &mut Arena,
    keys: &[PublicKey],
    opts: PublicKeyAggOpts,
) -> Result<PublicKey, Error> {
    if keys.is_empty() {
        return Err(Error::EmptyInput);
    }
    let refs = arena.pack_public_keys(keys)?;
    let point = engine::aggregate_public_keys(refs, opts.validate)?;
    Ok(PublicKey::from_point(point))
}

/// Aggregates multiple signatures into a single signature.
///
/// Fails with [Error::TooManyItems] beyond the arena's aggregation capacity
/// and with [Error::EmptyInput] for zero signatures, before any engine call.
pub fn aggregate_signatures(
    arena: &mut Arena,
    sigs: &[Signature],
    opts: SignatureAggOpts,
) -> Result<Signature, Error> {
    if sigs.is_empty() {
        return Err(Error::EmptyInput);
    }
    let refs = arena.pack_signatures(sigs)?;
    let point = engine::aggregate_signatures(refs, opts.groupcheck)?;
    Ok(Signature::from_point(point))
}

/// Aggregates multiple wire-encoded public keys into a single public key,
/// skipping entity construction.
///
/// All items must share one wire form (compressed or serialized): the engine
/// is told a single per-item length, so mixed forms fail with
/// [Error::InconsistentLength] before any engine call.
pub fn aggregate_serialized_public_keys<B: AsRef<[u8]>>(
    arena: &mut Arena,
    items: &[B],
    opts: PublicKeyAggOpts,
) -> Result<PublicKey, Error> {
    let (refs, item_len) = arena.pack_serialized(items)?;
    let point = engine::aggregate_serialized_public_keys(refs, item_len, opts.validate)?;
    Ok(PublicKey::from_point(point))
}

/// Aggregates multiple wire-encoded signatures into a single signature,
/// skipping entity construction.
///
/// All items must share one wire form (compressed or serialized): the engine
/// is told a single per-item length, so mixed forms fail with
/// [Error::InconsistentLength] before any engine call.
pub fn aggregate_serialized_signatures<B: AsRef<[u8]>>(
    arena: &mut Arena,
    items: &[B],
    opts: SignatureAggOpts,
) -> Result<Signature, Error> {
    let (refs, item_len) = arena.pack_serialized(items)?;
    let point = engine::aggregate_serialized_signatures(refs, item_len, opts.groupcheck)?;
    Ok(Signature::from_point(point))
}
