//! Cryptographic primitives for block proofs.
//!
//! Hashing is SHA-256 based. Block proofs are 64-byte Schnorr signatures
//! over secp256k1 made by the federation's aggregate key:
//!
//! - `e = SHA256(r || P || m) mod n`, with `P` the compressed key
//! - valid iff `R = sG - eP` is a finite point, `x(R) == r` and `y(R)`
//!   is a quadratic residue modulo the field prime

use num_bigint::BigUint;
use secp256k1::constants::{CURVE_ORDER, FIELD_SIZE};
use secp256k1::{All, PublicKey, Scalar, Secp256k1, SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;

use crate::error::CoreError;
use crate::types::Hash256;

/// Length of a compressed public key.
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// Length of a Schnorr block proof.
pub const SCHNORR_SIGNATURE_SIZE: usize = 64;

fn context() -> &'static Secp256k1<All> {
    static CONTEXT: OnceLock<Secp256k1<All>> = OnceLock::new();
    CONTEXT.get_or_init(Secp256k1::new)
}

/// Single SHA-256.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice, as used for block hashes.
pub fn double_sha256(data: &[u8]) -> Hash256 {
    Hash256(sha256(&sha256(data)))
}

/// A compressed secp256k1 key the federation signs blocks with.
///
/// Only constructible from bytes that parse as a valid compressed point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregatePublicKey([u8; COMPRESSED_PUBLIC_KEY_SIZE]);

impl AggregatePublicKey {
    /// Parse and check a key.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        match bytes.first().copied() {
            None => return Err(CoreError::EmptyAggregatePublicKey),
            Some(0x04 | 0x06 | 0x07) => {
                return Err(CoreError::UncompressedAggregatePublicKey(hex::encode(bytes)))
            }
            Some(_) => {}
        }
        if bytes.len() != COMPRESSED_PUBLIC_KEY_SIZE || PublicKey::from_slice(bytes).is_err() {
            return Err(CoreError::InvalidAggregatePublicKey(hex::encode(bytes)));
        }
        let mut arr = [0u8; COMPRESSED_PUBLIC_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::DecodingError(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn point(&self) -> Result<PublicKey, CoreError> {
        PublicKey::from_slice(&self.0).map_err(|_| CoreError::InvalidAggregatePublicKey(self.to_hex()))
    }

    /// Check a block proof over `msg` (a signing hash in internal order).
    pub fn verify(&self, msg: &Hash256, sig: &SchnorrSignature) -> Result<(), CoreError> {
        if verify_schnorr(self, msg, sig) {
            Ok(())
        } else {
            Err(CoreError::ProofVerificationFailed)
        }
    }
}

impl fmt::Debug for AggregatePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AggregatePublicKey({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for AggregatePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for AggregatePublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for AggregatePublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AggregatePublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A 64-byte Schnorr signature `(r, s)`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SchnorrSignature(pub [u8; SCHNORR_SIGNATURE_SIZE]);

impl SchnorrSignature {
    pub const fn from_bytes(bytes: [u8; SCHNORR_SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Accepts only slices of exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; SCHNORR_SIGNATURE_SIZE] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub const fn as_bytes(&self) -> &[u8; SCHNORR_SIGNATURE_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    fn s(&self) -> &[u8] {
        &self.0[32..]
    }
}

impl fmt::Debug for SchnorrSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchnorrSig({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for SchnorrSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn field_prime() -> BigUint {
    BigUint::from_bytes_be(&FIELD_SIZE)
}

fn has_square_y(point: &PublicKey) -> bool {
    let ser = point.serialize_uncompressed();
    let p = field_prime();
    let y = BigUint::from_bytes_be(&ser[33..65]);
    let exp = (&p - 1u32) >> 1;
    y.modpow(&exp, &p) == BigUint::from(1u32)
}

fn challenge(r: &[u8], pubkey: &[u8; 33], msg: &Hash256) -> Option<Scalar> {
    let mut hasher = Sha256::new();
    hasher.update(r);
    hasher.update(pubkey);
    hasher.update(msg.as_bytes());
    let digest = hasher.finalize();

    let e = BigUint::from_bytes_be(&digest) % BigUint::from_bytes_be(&CURVE_ORDER);
    let bytes = e.to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Scalar::from_be_bytes(out).ok()
}

/// Verify a Schnorr block proof.
pub fn verify_schnorr(pubkey: &AggregatePublicKey, msg: &Hash256, sig: &SchnorrSignature) -> bool {
    let secp = context();

    let Ok(point) = pubkey.point() else {
        return false;
    };
    // s must be a nonzero scalar below n
    let Ok(s) = SecretKey::from_slice(sig.s()) else {
        return false;
    };
    let Some(e) = challenge(sig.r(), pubkey.as_bytes(), msg) else {
        return false;
    };

    // 1. sG
    let s_g = PublicKey::from_secret_key(secp, &s);
    // 2. -eP (a zero challenge is rejected by the tweak)
    let Ok(e_p) = point.mul_tweak(secp, &e) else {
        return false;
    };
    // 3. R = sG - eP, infinity fails here
    let Ok(r_point) = s_g.combine(&e_p.negate(secp)) else {
        return false;
    };

    let ser = r_point.serialize_uncompressed();
    ser[1..33] == *sig.r() && has_square_y(&r_point)
}

/// A federation signing key.
#[derive(Clone)]
pub struct Keypair {
    secret: SecretKey,
    public: AggregatePublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let (secret, public) = context().generate_keypair(&mut rand::thread_rng());
        Self {
            secret,
            public: AggregatePublicKey(public.serialize()),
        }
    }

    /// Create from 32 secret bytes; fails for zero or out-of-range scalars.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, CoreError> {
        let secret = SecretKey::from_slice(bytes).map_err(|_| CoreError::InvalidSecretKey)?;
        let public = PublicKey::from_secret_key(context(), &secret);
        Ok(Self {
            secret,
            public: AggregatePublicKey(public.serialize()),
        })
    }

    pub fn public_key(&self) -> AggregatePublicKey {
        self.public
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.secret_bytes()
    }

    /// Sign a 32-byte message with a deterministic nonce.
    pub fn sign_schnorr(&self, msg: &Hash256) -> SchnorrSignature {
        let secp = context();
        let mut counter: u32 = 0;
        loop {
            let mut hasher = Sha256::new();
            hasher.update(self.secret.secret_bytes());
            hasher.update(msg.as_bytes());
            hasher.update(counter.to_le_bytes());
            let nonce: [u8; 32] = hasher.finalize().into();
            counter = counter.wrapping_add(1);

            let Ok(mut k) = SecretKey::from_slice(&nonce) else {
                continue;
            };
            let mut r_point = PublicKey::from_secret_key(secp, &k);
            if !has_square_y(&r_point) {
                k = k.negate();
                r_point = r_point.negate(secp);
            }
            let ser = r_point.serialize_uncompressed();
            let r = &ser[1..33];

            let Some(e) = challenge(r, self.public.as_bytes(), msg) else {
                continue;
            };
            let Ok(ex) = self.secret.mul_tweak(&e) else {
                continue;
            };
            let Ok(ex) = Scalar::from_be_bytes(ex.secret_bytes()) else {
                continue;
            };
            let Ok(s) = k.add_tweak(&ex) else {
                continue;
            };

            let mut out = [0u8; SCHNORR_SIGNATURE_SIZE];
            out[..32].copy_from_slice(r);
            out[32..].copy_from_slice(&s.secret_bytes());
            return SchnorrSignature(out);
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public)
    }
}
