//! Key and signature entities over the engine's point representation.
//!
//! [SecretKey], [PublicKey], and [Signature] are immutable wrappers around a
//! fixed-size engine point buffer. Each entity owns its buffer exclusively;
//! every operation that produces a new point (signing, aggregation,
//! derivation) constructs a fresh entity.
//!
//! # Warning
//!
//! Deserialization does not group check by default. Points received from
//! untrusted sources must be checked to belong to the correct subgroup
//! (opt in via [PublicKeyOpts]/[SignatureOpts], or call `validate`) to
//! prevent small subgroup attacks.

use crate::{engine, Error};
use blst::{blst_p1_affine, blst_p2_affine, blst_scalar};
use std::fmt;
use zeroize::Zeroize;

/// Canonical secret key encoding length.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Compressed public key wire length.
pub const PUBLIC_KEY_LENGTH_COMPRESSED: usize = 48;

/// Serialized (uncompressed) public key wire length.
pub const PUBLIC_KEY_LENGTH_UNCOMPRESSED: usize = 96;

/// Compressed signature wire length.
pub const SIGNATURE_LENGTH_COMPRESSED: usize = 96;

/// Serialized (uncompressed) signature wire length.
pub const SIGNATURE_LENGTH_UNCOMPRESSED: usize = 192;

/// Minimum length of key material for deterministic key generation.
pub const MIN_IKM_LENGTH: usize = 32;

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn from_hex(value: &str) -> Result<Vec<u8>, Error> {
    hex::decode(value.strip_prefix("0x").unwrap_or(value)).map_err(|_| Error::BadEncoding)
}

/// Options for decoding a public key.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicKeyOpts {
    /// Infinity and group check the decoded point.
    pub validate: bool,
}

/// Options for decoding a signature.
#[derive(Debug, Clone, Copy)]
pub struct SignatureOpts {
    /// Group check the decoded point.
    pub validate: bool,
    /// Also reject the point at infinity during validation. Skipping the
    /// infinity check is always cryptographically safe; rejecting obviously
    /// bogus individual signatures early is an application choice.
    pub infcheck: bool,
}

impl Default for SignatureOpts {
    fn default() -> Self {
        Self {
            validate: false,
            infcheck: true,
        }
    }
}

/// A BLS12-381 secret key (a scalar, 32 bytes canonical encoding).
///
/// Zeroized on drop.
#[derive(Clone)]
pub struct SecretKey {
    scalar: blst_scalar,
}

impl SecretKey {
    /// Derives a secret key deterministically from secret key material `ikm`,
    /// which must be at least [MIN_IKM_LENGTH] bytes.
    ///
    /// Distinct `info` values derive independent keys from the same `ikm`.
    pub fn from_keygen(ikm: &[u8], info: Option<&[u8]>) -> Result<Self, Error> {
        let scalar = engine::keygen(ikm, info.unwrap_or(&[]))?;
        Ok(Self { scalar })
    }

    /// Derives an EIP-2333 master secret key from `ikm`, which must be at
    /// least [MIN_IKM_LENGTH] bytes.
    ///
    /// See <https://eips.ethereum.org/EIPS/eip-2333>.
    pub fn derive_master_eip2333(ikm: &[u8]) -> Result<Self, Error> {
        let scalar = engine::derive_master_eip2333(ikm)?;
        Ok(Self { scalar })
    }

    /// Derives an EIP-2333 child secret key from this key.
    ///
    /// See <https://eips.ethereum.org/EIPS/eip-2333>.
    pub fn derive_child_eip2333(&self, index: u32) -> Self {
        Self {
            scalar: engine::derive_child_eip2333(&self.scalar, index),
        }
    }

    /// Deserializes a canonically encoded secret key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let scalar = engine::secret_key_from_bytes(bytes)?;
        Ok(Self { scalar })
    }

    /// Deserializes a secret key from a hex string (with or without a `0x`
    /// prefix).
    pub fn from_hex(value: &str) -> Result<Self, Error> {
        Self::from_bytes(&from_hex(value)?)
    }

    /// Canonically serializes the secret key.
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        engine::secret_key_to_bytes(&self.scalar)
    }

    /// Serializes the secret key to a `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        to_hex(&self.to_bytes())
    }

    /// Returns the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            point: engine::secret_key_to_public_key(&self.scalar),
        }
    }

    /// Signs the provided message.
    ///
    /// Signatures are deterministic: signing the same message with the same
    /// key always yields the same signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            point: engine::sign(&self.scalar, message),
        }
    }
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.scalar.b.zeroize();
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey").field("scalar", &"[REDACTED]").finish()
    }
}

/// A BLS12-381 public key (a G1 element).
#[derive(Clone, Copy)]
pub struct PublicKey {
    point: blst_p1_affine,
}

impl PublicKey {
    /// Decodes a public key from its compressed (48 byte) or serialized
    /// (96 byte) wire form.
    pub fn from_bytes(bytes: &[u8], opts: PublicKeyOpts) -> Result<Self, Error> {
        let point = engine::deserialize_public_key(bytes)?;
        if opts.validate {
            engine::validate_public_key(&point)?;
        }
        Ok(Self { point })
    }

    /// Decodes a public key from a hex string (with or without a `0x`
    /// prefix).
    pub fn from_hex(value: &str, opts: PublicKeyOpts) -> Result<Self, Error> {
        Self::from_bytes(&from_hex(value)?, opts)
    }

    /// Compresses the public key to its 48 byte wire form.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH_COMPRESSED] {
        engine::compress_public_key(&self.point)
    }

    /// Serializes the public key to its uncompressed 96 byte wire form.
    pub fn serialize(&self) -> [u8; PUBLIC_KEY_LENGTH_UNCOMPRESSED] {
        engine::serialize_public_key(&self.point)
    }

    /// Serializes the compressed public key to a `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        to_hex(&self.to_bytes())
    }

    /// Infinity and group check.
    pub fn validate(&self) -> Result<(), Error> {
        engine::validate_public_key(&self.point)
    }

    pub(crate) fn point(&self) -> &blst_p1_affine {
        &self.point
    }

    pub(crate) fn from_point(point: blst_p1_affine) -> Self {
        Self { point }
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        engine::public_key_eq(&self.point, &other.point)
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", to_hex(&self.to_bytes()[..8]))
    }
}

/// A BLS12-381 signature (a G2 element).
#[derive(Clone, Copy)]
pub struct Signature {
    point: blst_p2_affine,
}

impl Signature {
    /// Decodes a signature from its compressed (96 byte) or serialized
    /// (192 byte) wire form.
    pub fn from_bytes(bytes: &[u8], opts: SignatureOpts) -> Result<Self, Error> {
        let point = engine::deserialize_signature(bytes)?;
        if opts.validate {
            engine::validate_signature(&point, opts.infcheck)?;
        }
        Ok(Self { point })
    }

    /// Decodes a signature from a hex string (with or without a `0x`
    /// prefix).
    pub fn from_hex(value: &str, opts: SignatureOpts) -> Result<Self, Error> {
        Self::from_bytes(&from_hex(value)?, opts)
    }

    /// Compresses the signature to its 96 byte wire form.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH_COMPRESSED] {
        engine::compress_signature(&self.point)
    }

    /// Serializes the signature to its uncompressed 192 byte wire form.
    pub fn serialize(&self) -> [u8; SIGNATURE_LENGTH_UNCOMPRESSED] {
        engine::serialize_signature(&self.point)
    }

    /// Serializes the compressed signature to a `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        to_hex(&self.to_bytes())
    }

    /// Group check, with an optional infinity check.
    pub fn validate(&self, infcheck: bool) -> Result<(), Error> {
        engine::validate_signature(&self.point, infcheck)
    }

    pub(crate) fn point(&self) -> &blst_p2_affine {
        &self.point
    }

    pub(crate) fn from_point(point: blst_p2_affine) -> Self {
        Self { point }
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        engine::signature_eq(&self.point, &other.point)
    }
}

impl Eq for Signature {}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", to_hex(&self.to_bytes()[..8]))
    }
}
