use super::{Key, Nonce, AES_GCM_NONCE_SIZE, NONCE_SIZE};
use crate::error;

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm,
};
use crypto_secretbox::XSalsa20Poly1305;

/// cipher used to encrypt path components
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CipherSuite {
    /// no encryption, components pass through
    Null,
    /// AES-256-GCM with a 12 bytes nonce
    AesGcm,
    /// XSalsa20-Poly1305 with a 24 bytes nonce
    SecretBox,
    /// no encryption, but components are translated from and to URL safe
    /// base64. Used when bypassing encryption to expose encrypted paths as text
    NullBase64Url,
}

impl CipherSuite {
    /// size of the nonce prepended to each encrypted component
    pub fn nonce_size(&self) -> usize {
        match self {
            CipherSuite::Null | CipherSuite::NullBase64Url => 0,
            CipherSuite::AesGcm => AES_GCM_NONCE_SIZE,
            CipherSuite::SecretBox => NONCE_SIZE,
        }
    }

    /// returns true for the cipher suites that leave data as is
    pub fn is_null(&self) -> bool {
        matches!(self, CipherSuite::Null | CipherSuite::NullBase64Url)
    }
}

/// encrypts `data` with the provided cipher suite
///
/// the null cipher suites return the data unchanged
pub fn encrypt(
    data: &[u8],
    cipher: CipherSuite,
    key: &Key,
    nonce: &Nonce,
) -> Result<Vec<u8>, error::Encryption> {
    match cipher {
        CipherSuite::Null | CipherSuite::NullBase64Url => Ok(data.to_vec()),
        CipherSuite::AesGcm => {
            let aead = Aes256Gcm::new_from_slice(&key.0)
                .map_err(|e| error::Encryption::EncryptFailed(e.to_string()))?;
            aead.encrypt(
                GenericArray::from_slice(&nonce.0[..AES_GCM_NONCE_SIZE]),
                data,
            )
            .map_err(|e| error::Encryption::EncryptFailed(e.to_string()))
        }
        CipherSuite::SecretBox => {
            let aead = XSalsa20Poly1305::new_from_slice(&key.0)
                .map_err(|e| error::Encryption::EncryptFailed(e.to_string()))?;
            aead.encrypt(GenericArray::from_slice(&nonce.0[..]), data)
                .map_err(|e| error::Encryption::EncryptFailed(e.to_string()))
        }
    }
}

/// decrypts `data` with the provided cipher suite
pub fn decrypt(
    data: &[u8],
    cipher: CipherSuite,
    key: &Key,
    nonce: &Nonce,
) -> Result<Vec<u8>, error::Encryption> {
    match cipher {
        CipherSuite::Null | CipherSuite::NullBase64Url => Ok(data.to_vec()),
        CipherSuite::AesGcm => {
            let aead = Aes256Gcm::new_from_slice(&key.0)
                .map_err(|e| error::Encryption::DecryptFailed(e.to_string()))?;
            aead.decrypt(
                GenericArray::from_slice(&nonce.0[..AES_GCM_NONCE_SIZE]),
                data,
            )
            .map_err(|e| error::Encryption::DecryptFailed(e.to_string()))
        }
        CipherSuite::SecretBox => {
            let aead = XSalsa20Poly1305::new_from_slice(&key.0)
                .map_err(|e| error::Encryption::DecryptFailed(e.to_string()))?;
            aead.decrypt(GenericArray::from_slice(&nonce.0[..]), data)
                .map_err(|e| error::Encryption::DecryptFailed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aead_round_trip() {
        let key = Key([1u8; 32]);
        let nonce = Nonce([2u8; NONCE_SIZE]);

        for cipher in [CipherSuite::AesGcm, CipherSuite::SecretBox].iter() {
            let encrypted = encrypt(b"hello", *cipher, &key, &nonce).unwrap();
            assert_ne!(&encrypted[..], b"hello");
            assert_eq!(decrypt(&encrypted, *cipher, &key, &nonce).unwrap(), b"hello");

            // empty plaintexts still carry an authentication tag
            let empty = encrypt(b"", *cipher, &key, &nonce).unwrap();
            assert_eq!(empty.len(), 16);

            let other = Key([3u8; 32]);
            assert!(matches!(
                decrypt(&encrypted, *cipher, &other, &nonce),
                Err(error::Encryption::DecryptFailed(_))
            ));
        }
    }

    #[test]
    fn null_ciphers() {
        let key = Key::zero();
        let nonce = Nonce([0u8; NONCE_SIZE]);
        assert_eq!(encrypt(b"abc", CipherSuite::Null, &key, &nonce).unwrap(), b"abc");
        assert_eq!(
            decrypt(b"abc", CipherSuite::NullBase64Url, &key, &nonce).unwrap(),
            b"abc"
        );
        assert_eq!(CipherSuite::Null.nonce_size(), 0);
        assert_eq!(CipherSuite::AesGcm.nonce_size(), 12);
        assert_eq!(CipherSuite::SecretBox.nonce_size(), 24);
    }
}
