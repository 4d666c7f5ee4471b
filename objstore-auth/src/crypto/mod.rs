//! cryptographic operations
//!
//! API keys are macaroons: a chain of HMAC-SHA256 values starting from a
//! project secret. From a tail and a new caveat, anybody can compute the
//! next tail, but nobody can go back to a previous one.
//!
//! Path encryption derives one key per path component with HMAC-SHA512
//! and encrypts components with AES-GCM or XSalsa20-Poly1305.
use crate::error;

use hmac::{Hmac, Mac};
use rand_core::{CryptoRng, RngCore};
use sha2::{Sha256, Sha512};
use std::{convert::TryInto, fmt, ops::Drop};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

mod cipher;

pub use cipher::{decrypt, encrypt, CipherSuite};

/// size of a macaroon head
pub const HEAD_SIZE: usize = 32;
/// size of a macaroon tail
pub const TAIL_SIZE: usize = 32;
/// minimum size of a project secret
pub const MIN_SECRET_SIZE: usize = 32;
/// size of a path encryption key
pub const KEY_SIZE: usize = 32;
/// size of the nonce used by XSalsa20-Poly1305
pub const NONCE_SIZE: usize = 24;
/// size of the nonce used by AES-GCM
pub const AES_GCM_NONCE_SIZE: usize = 12;

/// one link of the macaroon HMAC chain
pub type Tail = [u8; TAIL_SIZE];

/// generates a new random project secret
pub fn new_secret() -> [u8; MIN_SECRET_SIZE] {
    new_secret_with_rng(&mut rand::rngs::OsRng)
}

pub fn new_secret_with_rng<T: RngCore + CryptoRng>(rng: &mut T) -> [u8; MIN_SECRET_SIZE] {
    let mut secret = [0u8; MIN_SECRET_SIZE];
    rng.fill_bytes(&mut secret);
    secret
}

/// computes `HMAC-SHA256(key, message)`
pub fn sign(key: &[u8], message: &[u8]) -> Tail {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any size");
    mac.update(message);

    let mut tail = [0u8; TAIL_SIZE];
    tail.copy_from_slice(&mac.finalize().into_bytes());
    tail
}

/// compares two tails without leaking the position of the first difference
pub fn tails_equal(a: &Tail, b: &Tail) -> bool {
    a[..].ct_eq(&b[..]).into()
}

/// computes `HMAC-SHA512(key, message)`
pub(crate) fn hmac_sha512(key: &[u8], message: &[u8]) -> [u8; 64] {
    let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("HMAC accepts keys of any size");
    mac.update(message);

    let mut digest = [0u8; 64];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    digest
}

/// derives a new key from a parent key and a message
///
/// the result is `HMAC-SHA512(key, message)` truncated to [`KEY_SIZE`] bytes
pub fn derive_key(key: &Key, message: &[u8]) -> Key {
    let mut digest = hmac_sha512(&key.0, message);
    let mut derived = [0u8; KEY_SIZE];
    derived.copy_from_slice(&digest[..KEY_SIZE]);
    digest.zeroize();
    Key(derived)
}

/// a symmetric key used for path encryption
#[derive(Clone)]
pub struct Key(pub(crate) [u8; KEY_SIZE]);

impl Key {
    /// serializes to a byte array
    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// deserializes from a byte slice
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, error::Encryption> {
        let bytes: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| error::Encryption::InvalidKeySize(bytes.len()))?;
        Ok(Key(bytes))
    }

    /// deserializes from an hex-encoded string
    pub fn from_bytes_hex(str: &str) -> Result<Self, error::Encryption> {
        let bytes = hex::decode(str)
            .map_err(|_| error::Encryption::InvalidKeySize(str.len() / 2))?;
        Self::from_bytes(&bytes)
    }

    /// the all-zero key
    pub fn zero() -> Self {
        Key([0u8; KEY_SIZE])
    }
}

impl From<[u8; KEY_SIZE]> for Key {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Key(bytes)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(..)")
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// a nonce large enough for every supported cipher suite
///
/// AES-GCM only uses the first [`AES_GCM_NONCE_SIZE`] bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nonce(pub [u8; NONCE_SIZE]);

impl Nonce {
    /// takes the first [`NONCE_SIZE`] bytes of a digest
    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&digest[..NONCE_SIZE]);
        Nonce(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn hmac_chain() {
        let secret = [0u8; 32];
        let t0 = sign(&secret, b"head");
        let t1 = sign(&t0, b"caveat");

        assert_eq!(t0, sign(&secret, b"head"));
        assert_ne!(t0, t1);
        assert!(tails_equal(&t1, &sign(&t0, b"caveat")));
        assert!(!tails_equal(&t1, &sign(&t0, b"caveat2")));
    }

    #[test]
    fn derivation() {
        let key = Key::zero();
        let a = derive_key(&key, b"path:a");
        let b = derive_key(&key, b"path:b");

        assert_ne!(a, b);
        assert_eq!(a, derive_key(&key, b"path:a"));
        assert_eq!(&a.0[..], &hmac_sha512(&[0u8; 32], b"path:a")[..KEY_SIZE]);
    }

    #[test]
    fn key_parsing() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(0);
        let secret = new_secret_with_rng(&mut rng);
        let key = Key::from_bytes(&secret).unwrap();
        assert_eq!(key, Key::from_bytes_hex(&hex::encode(secret)).unwrap());
        assert_eq!(
            Key::from_bytes(&secret[..10]),
            Err(error::Encryption::InvalidKeySize(10))
        );
        assert_eq!(format!("{:?}", key), "Key(..)");
    }
}
