//! Thin binding over the `blst` pairing engine.
//!
//! Every `unsafe` call into the engine lives in this module. Callers hand in
//! fixed-size point buffers or packed reference tables (built by
//! [`crate::arena`]) and the engine performs all curve and pairing
//! arithmetic. Each function here issues one logical engine operation; none
//! of them allocate on the hot path beyond their fixed-size outputs.
//!
//! # Safety
//!
//! Functions taking reference tables (`&[*const _]`, `&[SetRef]`) require
//! every referenced buffer to outlive the call. The packing functions in
//! [`crate::arena`] guarantee this by tying the table's lifetime to borrows
//! of the source entities.

use crate::{
    arena::SetRef,
    group::{
        MIN_IKM_LENGTH, PUBLIC_KEY_LENGTH_COMPRESSED, PUBLIC_KEY_LENGTH_UNCOMPRESSED,
        SECRET_KEY_LENGTH, SIGNATURE_LENGTH_COMPRESSED, SIGNATURE_LENGTH_UNCOMPRESSED,
    },
    Error,
};
use blst::{
    blst_aggregated_in_g2, blst_bendian_from_scalar, blst_core_verify_pk_in_g1,
    blst_derive_child_eip2333, blst_derive_master_eip2333, blst_fp12, blst_hash_to_g2,
    blst_keygen, blst_p1, blst_p1_add_or_double_affine, blst_p1_affine, blst_p1_affine_compress,
    blst_p1_affine_in_g1, blst_p1_affine_is_equal, blst_p1_affine_is_inf,
    blst_p1_affine_serialize, blst_p1_deserialize, blst_p1_to_affine, blst_p1s_add, blst_p2,
    blst_p2_add_or_double_affine, blst_p2_affine, blst_p2_affine_compress, blst_p2_affine_in_g2,
    blst_p2_affine_is_equal, blst_p2_affine_is_inf, blst_p2_affine_serialize,
    blst_p2_deserialize, blst_p2_to_affine, blst_p2s_add, blst_pairing,
    blst_pairing_chk_n_aggr_pk_in_g1, blst_pairing_chk_n_mul_n_aggr_pk_in_g1,
    blst_pairing_commit, blst_pairing_finalverify, blst_pairing_init, blst_pairing_sizeof,
    blst_scalar, blst_scalar_from_bendian, blst_scalar_from_uint64, blst_sign_pk2_in_g1,
    blst_sk_check, blst_sk_to_pk2_in_g1, BLST_ERROR,
};
use rand::{CryptoRng, RngCore};
use std::{ptr, slice};

/// Domain separation tag for hashing a message to G2 under the
/// proof-of-possession ciphersuite.
pub(crate) const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Maps an engine status word onto the crate error taxonomy.
pub(crate) fn status(code: BLST_ERROR) -> Result<(), Error> {
    match code {
        BLST_ERROR::BLST_SUCCESS => Ok(()),
        BLST_ERROR::BLST_BAD_ENCODING => Err(Error::BadEncoding),
        BLST_ERROR::BLST_POINT_NOT_ON_CURVE => Err(Error::PointNotOnCurve),
        BLST_ERROR::BLST_POINT_NOT_IN_GROUP => Err(Error::PointNotInGroup),
        BLST_ERROR::BLST_AGGR_TYPE_MISMATCH => Err(Error::AggregationTypeMismatch),
        BLST_ERROR::BLST_VERIFY_FAIL => Err(Error::VerificationFailed),
        BLST_ERROR::BLST_PK_IS_INFINITY => Err(Error::PublicKeyIsInfinity),
        BLST_ERROR::BLST_BAD_SCALAR => Err(Error::BadScalar),
    }
}

/// Size in bytes of one pairing-accumulator context.
pub(crate) fn pairing_sizeof() -> usize {
    unsafe { blst_pairing_sizeof() }
}

// Secret keys

/// Derives a secret key from the provided key material, which must be at
/// least [MIN_IKM_LENGTH] bytes.
pub(crate) fn keygen(ikm: &[u8], info: &[u8]) -> Result<blst_scalar, Error> {
    if ikm.len() < MIN_IKM_LENGTH {
        return Err(Error::BadEncoding);
    }
    let mut sk = blst_scalar::default();
    unsafe {
        blst_keygen(
            &mut sk,
            ikm.as_ptr(),
            ikm.len(),
            info.as_ptr(),
            info.len(),
        );
    }
    Ok(sk)
}

/// Derives an EIP-2333 master secret key from the provided key material,
/// which must be at least [MIN_IKM_LENGTH] bytes.
pub(crate) fn derive_master_eip2333(ikm: &[u8]) -> Result<blst_scalar, Error> {
    if ikm.len() < MIN_IKM_LENGTH {
        return Err(Error::BadEncoding);
    }
    let mut sk = blst_scalar::default();
    unsafe {
        blst_derive_master_eip2333(&mut sk, ikm.as_ptr(), ikm.len());
    }
    Ok(sk)
}

/// Derives an EIP-2333 child secret key from a parent key.
pub(crate) fn derive_child_eip2333(parent: &blst_scalar, index: u32) -> blst_scalar {
    let mut sk = blst_scalar::default();
    unsafe {
        blst_derive_child_eip2333(&mut sk, parent, index);
    }
    sk
}

/// Deserializes a canonically encoded secret key (32 bytes, big-endian,
/// nonzero, below the group order).
pub(crate) fn secret_key_from_bytes(bytes: &[u8]) -> Result<blst_scalar, Error> {
    if bytes.len() != SECRET_KEY_LENGTH {
        return Err(Error::BadEncoding);
    }
    let mut sk = blst_scalar::default();
    unsafe {
        blst_scalar_from_bendian(&mut sk, bytes.as_ptr());
        if !blst_sk_check(&sk) {
            return Err(Error::BadScalar);
        }
    }
    Ok(sk)
}

pub(crate) fn secret_key_to_bytes(sk: &blst_scalar) -> [u8; SECRET_KEY_LENGTH] {
    let mut bytes = [0u8; SECRET_KEY_LENGTH];
    unsafe {
        blst_bendian_from_scalar(bytes.as_mut_ptr(), sk);
    }
    bytes
}

pub(crate) fn secret_key_to_public_key(sk: &blst_scalar) -> blst_p1_affine {
    let mut pk = blst_p1_affine::default();
    unsafe {
        blst_sk_to_pk2_in_g1(ptr::null_mut(), &mut pk, sk);
    }
    pk
}

/// Hashes the message to G2 and signs it in one engine pass.
pub(crate) fn sign(sk: &blst_scalar, message: &[u8]) -> blst_p2_affine {
    let mut hm = blst_p2::default();
    let mut sig = blst_p2_affine::default();
    unsafe {
        blst_hash_to_g2(
            &mut hm,
            message.as_ptr(),
            message.len(),
            DST.as_ptr(),
            DST.len(),
            ptr::null(),
            0,
        );
        blst_sign_pk2_in_g1(ptr::null_mut(), &mut sig, &hm, sk);
    }
    sig
}

// Public keys

/// Infinity and group check.
pub(crate) fn validate_public_key(pk: &blst_p1_affine) -> Result<(), Error> {
    unsafe {
        if blst_p1_affine_is_inf(pk) {
            return Err(Error::PublicKeyIsInfinity);
        }
        if !blst_p1_affine_in_g1(pk) {
            return Err(Error::PointNotInGroup);
        }
    }
    Ok(())
}

/// Decodes a public key from its compressed (48 byte) or serialized (96 byte)
/// wire form, dispatching on the compression bit.
pub(crate) fn deserialize_public_key(bytes: &[u8]) -> Result<blst_p1_affine, Error> {
    if !((bytes.len() == PUBLIC_KEY_LENGTH_UNCOMPRESSED && (bytes[0] & 0x80) == 0)
        || (bytes.len() == PUBLIC_KEY_LENGTH_COMPRESSED && (bytes[0] & 0x80) != 0))
    {
        return Err(Error::BadEncoding);
    }
    let mut pk = blst_p1_affine::default();
    status(unsafe { blst_p1_deserialize(&mut pk, bytes.as_ptr()) })?;
    Ok(pk)
}

pub(crate) fn serialize_public_key(pk: &blst_p1_affine) -> [u8; PUBLIC_KEY_LENGTH_UNCOMPRESSED] {
    let mut bytes = [0u8; PUBLIC_KEY_LENGTH_UNCOMPRESSED];
    unsafe {
        blst_p1_affine_serialize(bytes.as_mut_ptr(), pk);
    }
    bytes
}

pub(crate) fn compress_public_key(pk: &blst_p1_affine) -> [u8; PUBLIC_KEY_LENGTH_COMPRESSED] {
    let mut bytes = [0u8; PUBLIC_KEY_LENGTH_COMPRESSED];
    unsafe {
        blst_p1_affine_compress(bytes.as_mut_ptr(), pk);
    }
    bytes
}

pub(crate) fn public_key_eq(a: &blst_p1_affine, b: &blst_p1_affine) -> bool {
    unsafe { blst_p1_affine_is_equal(a, b) }
}

// Signatures

/// Group check, with an optional infinity check. The engine reuses the
/// infinity status word for signatures.
pub(crate) fn validate_signature(sig: &blst_p2_affine, infcheck: bool) -> Result<(), Error> {
    unsafe {
        if infcheck && blst_p2_affine_is_inf(sig) {
            return Err(Error::PublicKeyIsInfinity);
        }
        if !blst_p2_affine_in_g2(sig) {
            return Err(Error::PointNotInGroup);
        }
    }
    Ok(())
}

/// Decodes a signature from its compressed (96 byte) or serialized (192 byte)
/// wire form, dispatching on the compression bit.
pub(crate) fn deserialize_signature(bytes: &[u8]) -> Result<blst_p2_affine, Error> {
    if !((bytes.len() == SIGNATURE_LENGTH_UNCOMPRESSED && (bytes[0] & 0x80) == 0)
        || (bytes.len() == SIGNATURE_LENGTH_COMPRESSED && (bytes[0] & 0x80) != 0))
    {
        return Err(Error::BadEncoding);
    }
    let mut sig = blst_p2_affine::default();
    status(unsafe { blst_p2_deserialize(&mut sig, bytes.as_ptr()) })?;
    Ok(sig)
}

pub(crate) fn serialize_signature(sig: &blst_p2_affine) -> [u8; SIGNATURE_LENGTH_UNCOMPRESSED] {
    let mut bytes = [0u8; SIGNATURE_LENGTH_UNCOMPRESSED];
    unsafe {
        blst_p2_affine_serialize(bytes.as_mut_ptr(), sig);
    }
    bytes
}

pub(crate) fn compress_signature(sig: &blst_p2_affine) -> [u8; SIGNATURE_LENGTH_COMPRESSED] {
    let mut bytes = [0u8; SIGNATURE_LENGTH_COMPRESSED];
    unsafe {
        blst_p2_affine_compress(bytes.as_mut_ptr(), sig);
    }
    bytes
}

pub(crate) fn signature_eq(a: &blst_p2_affine, b: &blst_p2_affine) -> bool {
    unsafe { blst_p2_affine_is_equal(a, b) }
}

// Aggregation

/// Adds every public key in the reference table in a single engine pass.
///
/// If `validate`, each key is infinity and group checked before the addition.
pub(crate) fn aggregate_public_keys(
    refs: &[*const blst_p1_affine],
    validate: bool,
) -> Result<blst_p1_affine, Error> {
    if validate {
        for &pk in refs {
            validate_public_key(unsafe { &*pk })?;
        }
    }
    let mut sum = blst_p1::default();
    let mut out = blst_p1_affine::default();
    unsafe {
        blst_p1s_add(&mut sum, refs.as_ptr(), refs.len());
        blst_p1_to_affine(&mut out, &sum);
    }
    Ok(out)
}

/// Adds every signature in the reference table in a single engine pass.
///
/// If `groupcheck`, each signature is group checked (but not infinity
/// checked) before the addition.
pub(crate) fn aggregate_signatures(
    refs: &[*const blst_p2_affine],
    groupcheck: bool,
) -> Result<blst_p2_affine, Error> {
    if groupcheck {
        for &sig in refs {
            validate_signature(unsafe { &*sig }, false)?;
        }
    }
    let mut sum = blst_p2::default();
    let mut out = blst_p2_affine::default();
    unsafe {
        blst_p2s_add(&mut sum, refs.as_ptr(), refs.len());
        blst_p2_to_affine(&mut out, &sum);
    }
    Ok(out)
}

/// Decodes and folds wire-encoded public keys in a single engine pass. Every
/// item in the reference table is `item_len` bytes.
pub(crate) fn aggregate_serialized_public_keys(
    refs: &[*const u8],
    item_len: usize,
    validate: bool,
) -> Result<blst_p1_affine, Error> {
    let mut sum = blst_p1::default();
    let mut out = blst_p1_affine::default();
    for &item in refs {
        let bytes = unsafe { slice::from_raw_parts(item, item_len) };
        let pk = deserialize_public_key(bytes)?;
        if validate {
            validate_public_key(&pk)?;
        }
        unsafe {
            blst_p1_add_or_double_affine(&mut sum, &sum, &pk);
        }
    }
    unsafe {
        blst_p1_to_affine(&mut out, &sum);
    }
    Ok(out)
}

/// Decodes and folds wire-encoded signatures in a single engine pass. Every
/// item in the reference table is `item_len` bytes.
pub(crate) fn aggregate_serialized_signatures(
    refs: &[*const u8],
    item_len: usize,
    groupcheck: bool,
) -> Result<blst_p2_affine, Error> {
    let mut sum = blst_p2::default();
    let mut out = blst_p2_affine::default();
    for &item in refs {
        let bytes = unsafe { slice::from_raw_parts(item, item_len) };
        let sig = deserialize_signature(bytes)?;
        if groupcheck {
            validate_signature(&sig, false)?;
        }
        unsafe {
            blst_p2_add_or_double_affine(&mut sum, &sum, &sig);
        }
    }
    unsafe {
        blst_p2_to_affine(&mut out, &sum);
    }
    Ok(out)
}

// Verification

/// Verifies a single signature over a single message.
pub(crate) fn verify(
    pk: &blst_p1_affine,
    message: &[u8],
    sig: &blst_p2_affine,
) -> Result<(), Error> {
    status(unsafe {
        blst_core_verify_pk_in_g1(
            pk,
            sig,
            true,
            message.as_ptr(),
            message.len(),
            DST.as_ptr(),
            DST.len(),
            ptr::null(),
            0,
        )
    })
}

/// Verifies one aggregate signature against N (message, public key) pairs in
/// a single pass over the caller's pairing accumulator.
///
/// Each pair is accumulated with `e(pk_i, H(m_i))`; the final check compares
/// the committed product against the GT-aggregated signature.
pub(crate) fn aggregate_verify(
    pairs: &[SetRef],
    signature: &blst_p2_affine,
    pks_validate: bool,
    sigs_groupcheck: bool,
    pairing: &mut [u64],
) -> Result<(), Error> {
    if sigs_groupcheck {
        validate_signature(signature, false)?;
    }
    let ctx = pairing.as_mut_ptr() as *mut blst_pairing;
    unsafe {
        blst_pairing_init(ctx, true, DST.as_ptr(), DST.len());
    }
    for pair in pairs {
        status(unsafe {
            blst_pairing_chk_n_aggr_pk_in_g1(
                ctx,
                pair.pk,
                pks_validate,
                ptr::null(),
                false,
                pair.msg,
                pair.msg_len,
                ptr::null(),
                0,
            )
        })?;
    }
    let mut gtsig = blst_fp12::default();
    unsafe {
        blst_pairing_commit(ctx);
        blst_aggregated_in_g2(&mut gtsig, signature);
        if !blst_pairing_finalverify(ctx, &gtsig) {
            return Err(Error::VerificationFailed);
        }
    }
    Ok(())
}

/// Verifies N (message, public key, signature) sets in a single pass over the
/// caller's pairing accumulator, per the fast multiple-signature verification
/// protocol (<https://ethresear.ch/t/fast-verification-of-multiple-bls-signatures/5407>).
///
/// Each set is weighted with a fresh nonzero 64-bit scalar so signature
/// components cannot be redistributed between sets without detection.
pub(crate) fn verify_multiple_aggregate_signatures<R: RngCore + CryptoRng>(
    rng: &mut R,
    sets: &[SetRef],
    pks_validate: bool,
    sigs_groupcheck: bool,
    pairing: &mut [u64],
) -> Result<(), Error> {
    let ctx = pairing.as_mut_ptr() as *mut blst_pairing;
    unsafe {
        blst_pairing_init(ctx, true, DST.as_ptr(), DST.len());
    }
    for set in sets {
        // blst requires a buffer of 4 uint64 values even though only the low
        // 64 bits carry the weight.
        let mut value = [0u64; 4];
        while value[0] == 0 {
            value[0] = rng.next_u64();
        }
        let mut weight = blst_scalar::default();
        unsafe {
            blst_scalar_from_uint64(&mut weight, value.as_ptr());
        }
        status(unsafe {
            blst_pairing_chk_n_mul_n_aggr_pk_in_g1(
                ctx,
                set.pk,
                pks_validate,
                set.sig,
                sigs_groupcheck,
                weight.b.as_ptr(),
                64,
                set.msg,
                set.msg_len,
                ptr::null(),
                0,
            )
        })?;
    }
    unsafe {
        blst_pairing_commit(ctx);
        if !blst_pairing_finalverify(ctx, ptr::null()) {
            return Err(Error::VerificationFailed);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_public_key_is_infinity() {
        let pk = blst_p1_affine::default();
        assert_eq!(validate_public_key(&pk), Err(Error::PublicKeyIsInfinity));
    }

    #[test]
    fn default_signature_is_infinity() {
        let sig = blst_p2_affine::default();
        assert_eq!(
            validate_signature(&sig, true),
            Err(Error::PublicKeyIsInfinity)
        );
        // The point at infinity is in the group, so skipping the infinity
        // check accepts it.
        assert_eq!(validate_signature(&sig, false), Ok(()));
    }

    #[test]
    fn pairing_context_is_nonempty() {
        assert!(pairing_sizeof() > 0);
    }
}
