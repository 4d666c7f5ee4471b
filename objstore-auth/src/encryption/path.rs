use super::segment;
use super::store::{Base, Store};
use crate::crypto::{self, CipherSuite, Key, Nonce, NONCE_SIZE};
use crate::error;
use crate::paths::{Encrypted, Unencrypted, SEPARATOR};

use tracing::trace;

/// encryption state of a prefix and of its parent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixInfo {
    pub bucket: String,
    pub cipher: CipherSuite,

    pub path_unenc: Unencrypted,
    pub path_enc: Encrypted,
    pub path_key: Key,

    pub parent_unenc: Unencrypted,
    pub parent_enc: Encrypted,
    pub parent_key: Key,
}

/// encrypts a path with the cipher of its base
pub fn encrypt_path_with_store_cipher(
    bucket: &str,
    path: &Unencrypted,
    store: &Store,
) -> Result<Encrypted, error::Encryption> {
    encrypt(bucket, path, None, store)
}

/// encrypts a path with the given cipher
pub fn encrypt_path(
    bucket: &str,
    path: &Unencrypted,
    cipher: CipherSuite,
    store: &Store,
) -> Result<Encrypted, error::Encryption> {
    encrypt(bucket, path, Some(cipher), store)
}

/// decrypts a path with the cipher of its base
pub fn decrypt_path_with_store_cipher(
    bucket: &str,
    path: &Encrypted,
    store: &Store,
) -> Result<Unencrypted, error::Encryption> {
    decrypt(bucket, path, None, store)
}

/// decrypts a path with the given cipher
pub fn decrypt_path(
    bucket: &str,
    path: &Encrypted,
    cipher: CipherSuite,
    store: &Store,
) -> Result<Unencrypted, error::Encryption> {
    decrypt(bucket, path, Some(cipher), store)
}

/// encrypts a prefix, keeping its trailing separator
pub fn encrypt_prefix(
    bucket: &str,
    prefix: &Unencrypted,
    cipher: CipherSuite,
    store: &Store,
) -> Result<Encrypted, error::Encryption> {
    let encrypted = encrypt_path(bucket, prefix, cipher, store)?;
    if !prefix.raw().ends_with(&[SEPARATOR]) {
        return Ok(encrypted);
    }

    // the last component is the empty one, it is replaced by the separator
    let mut raw = encrypted.into_raw();
    match raw.iter().rposition(|b| *b == SEPARATOR) {
        Some(index) => raw.truncate(index + 1),
        None => raw.push(SEPARATOR),
    }
    Ok(Encrypted::new(raw))
}

/// reverses [`encrypt_prefix`]
pub fn decrypt_prefix(
    bucket: &str,
    prefix: &Encrypted,
    cipher: CipherSuite,
    store: &Store,
) -> Result<Unencrypted, error::Encryption> {
    match prefix.raw().strip_suffix(&[SEPARATOR]) {
        None => decrypt_path(bucket, prefix, cipher, store),
        Some(trimmed) => {
            let decrypted = decrypt_path(bucket, &Encrypted::new(trimmed), cipher, store)?;
            let mut raw = decrypted.into_raw();
            raw.push(SEPARATOR);
            Ok(Unencrypted::new(raw))
        }
    }
}

/// encrypts every component of a path, starting from `key`
pub fn encrypt_path_raw(
    path: &Unencrypted,
    cipher: CipherSuite,
    key: &Key,
) -> Result<Encrypted, error::Encryption> {
    let components = encrypt_components(path.iter(), cipher, key)?;
    Ok(Encrypted::from_components(components))
}

/// decrypts every component of a path, starting from `key`
pub fn decrypt_path_raw(
    path: &Encrypted,
    cipher: CipherSuite,
    key: &Key,
) -> Result<Unencrypted, error::Encryption> {
    let mut key = key.clone();
    let mut components = Vec::new();

    for component in path.iter() {
        let decrypted = decrypt_path_component(component, cipher, &key)?;
        key = derive_path_key_component(&key, &decrypted);
        components.push(decrypted);
    }

    Ok(Unencrypted::from_components(components))
}

/// derives the key of a path
pub fn derive_path_key(
    bucket: &str,
    path: &Unencrypted,
    store: &Store,
) -> Result<Key, error::Encryption> {
    let lookup = store.lookup_unencrypted(bucket, path);
    let base = lookup.base.ok_or_else(|| missing_base(bucket, path.raw()))?;

    let mut key = base_key(bucket, &base);
    for component in lookup.remaining {
        key = derive_path_key_component(&key, component);
    }
    Ok(key)
}

/// derives the key used to encrypt the content of the object at `path`
pub fn derive_content_key(
    bucket: &str,
    path: &Unencrypted,
    store: &Store,
) -> Result<Key, error::Encryption> {
    let key = derive_path_key(bucket, path, store)?;
    Ok(crypto::derive_key(&key, b"content"))
}

/// returns the encryption state of a prefix and of its parent
///
/// the prefix must have at least one component below its base
pub fn get_prefix_info(
    bucket: &str,
    path: &Unencrypted,
    store: &Store,
) -> Result<PrefixInfo, error::Encryption> {
    let lookup = store.lookup_unencrypted(bucket, path);
    let base = lookup.base.ok_or_else(|| missing_base(bucket, path.raw()))?;
    let cipher = resolve_cipher(None, &base, store);

    let remaining: Vec<&[u8]> = lookup.remaining.collect();
    let (last, parents) = remaining.split_last().ok_or_else(|| {
        error::Encryption::MissingDecryptionBase(format!(
            "no parent: {}/{}",
            bucket,
            path.raw().escape_ascii()
        ))
    })?;

    let mut parent_unenc: Vec<Vec<u8>> = base.unencrypted.iter().map(<[u8]>::to_vec).collect();
    let mut parent_enc: Vec<Vec<u8>> = base.encrypted.iter().map(<[u8]>::to_vec).collect();
    let mut parent_key = base_key(bucket, &base);

    for component in parents {
        parent_enc.push(encrypt_path_component(component, cipher, &parent_key)?);
        parent_key = derive_path_key_component(&parent_key, component);
        parent_unenc.push(component.to_vec());
    }

    let last_enc = encrypt_path_component(last, cipher, &parent_key)?;
    let path_key = derive_path_key_component(&parent_key, last);

    let path_unenc = Unencrypted::from_components(parent_unenc.iter().chain(Some(&last.to_vec())));
    let path_enc = Encrypted::from_components(parent_enc.iter().chain(Some(&last_enc)));

    Ok(PrefixInfo {
        bucket: bucket.to_string(),
        cipher,
        path_unenc,
        path_enc,
        path_key,
        parent_unenc: Unencrypted::from_components(parent_unenc),
        parent_enc: Encrypted::from_components(parent_enc),
        parent_key,
    })
}

/// encrypts one component with the key of its parent
pub fn encrypt_path_component(
    component: &[u8],
    cipher: CipherSuite,
    key: &Key,
) -> Result<Vec<u8>, error::Encryption> {
    match cipher {
        CipherSuite::Null => Ok(component.to_vec()),
        CipherSuite::NullBase64Url => base64::decode_config(component, base64::URL_SAFE_NO_PAD)
            .map_err(|e| error::Encryption::EncryptFailed(e.to_string())),
        CipherSuite::AesGcm | CipherSuite::SecretBox => {
            let nonce = component_nonce(key, component);
            let mut data = nonce.0[..cipher.nonce_size()].to_vec();
            data.extend(crypto::encrypt(component, cipher, key, &nonce)?);
            Ok(segment::encode(&data))
        }
    }
}

/// decrypts one component with the key of its parent
pub fn decrypt_path_component(
    component: &[u8],
    cipher: CipherSuite,
    key: &Key,
) -> Result<Vec<u8>, error::Encryption> {
    match cipher {
        CipherSuite::Null => Ok(component.to_vec()),
        CipherSuite::NullBase64Url => {
            Ok(base64::encode_config(component, base64::URL_SAFE_NO_PAD).into_bytes())
        }
        CipherSuite::AesGcm | CipherSuite::SecretBox => {
            let data = segment::decode(component)?;
            let nonce_size = cipher.nonce_size();
            if data.len() < nonce_size {
                return Err(error::Encryption::DecryptFailed(
                    "component shorter than its nonce".to_string(),
                ));
            }

            let (nonce_bytes, ciphertext) = data.split_at(nonce_size);
            let mut nonce = Nonce([0u8; NONCE_SIZE]);
            nonce.0[..nonce_size].copy_from_slice(nonce_bytes);
            crypto::decrypt(ciphertext, cipher, key, &nonce)
        }
    }
}

/// derives the key of a child component
pub fn derive_path_key_component(key: &Key, component: &[u8]) -> Key {
    let mut message = Vec::with_capacity(5 + component.len());
    message.extend_from_slice(b"path:");
    message.extend_from_slice(component);
    crypto::derive_key(key, &message)
}

// the nonce is derived from the child key, so it is deterministic but
// reveals nothing about the key itself
fn component_nonce(key: &Key, component: &[u8]) -> Nonce {
    let child = derive_path_key_component(key, component);
    Nonce::from_digest(&crypto::hmac_sha512(child.as_bytes(), b"nonce"))
}

fn encrypt(
    bucket: &str,
    path: &Unencrypted,
    cipher: Option<CipherSuite>,
    store: &Store,
) -> Result<Encrypted, error::Encryption> {
    let lookup = store.lookup_unencrypted(bucket, path);
    let base = lookup.base.ok_or_else(|| missing_base(bucket, path.raw()))?;
    let cipher = resolve_cipher(cipher, &base, store);
    trace!(bucket, ?cipher, default = base.default, "encrypting path");

    let components = encrypt_components(lookup.remaining, cipher, &base_key(bucket, &base))?;
    Ok(Encrypted::from_components(
        base.encrypted.iter().map(<[u8]>::to_vec).chain(components),
    ))
}

fn decrypt(
    bucket: &str,
    path: &Encrypted,
    cipher: Option<CipherSuite>,
    store: &Store,
) -> Result<Unencrypted, error::Encryption> {
    let lookup = store.lookup_encrypted(bucket, path);
    let base = lookup.base.ok_or_else(|| missing_base(bucket, path.raw()))?;
    let cipher = resolve_cipher(cipher, &base, store);
    trace!(bucket, ?cipher, default = base.default, "decrypting path");

    let mut key = base_key(bucket, &base);
    let mut components: Vec<Vec<u8>> = base.unencrypted.iter().map(<[u8]>::to_vec).collect();
    for component in lookup.remaining {
        let decrypted = decrypt_path_component(component, cipher, &key)?;
        key = derive_path_key_component(&key, &decrypted);
        components.push(decrypted);
    }

    Ok(Unencrypted::from_components(components))
}

fn encrypt_components<'a, I>(
    components: I,
    cipher: CipherSuite,
    key: &Key,
) -> Result<Vec<Vec<u8>>, error::Encryption>
where
    I: Iterator<Item = &'a [u8]>,
{
    let mut key = key.clone();
    let mut encrypted = Vec::new();

    for component in components {
        encrypted.push(encrypt_path_component(component, cipher, &key)?);
        key = derive_path_key_component(&key, component);
    }

    Ok(encrypted)
}

fn resolve_cipher(cipher: Option<CipherSuite>, base: &Base, store: &Store) -> CipherSuite {
    if store.encryption_bypass() {
        CipherSuite::NullBase64Url
    } else {
        cipher.unwrap_or(base.path_cipher)
    }
}

// keys of default bases are scoped to the bucket before use
fn base_key(bucket: &str, base: &Base) -> Key {
    if base.default {
        derive_path_key_component(&base.key, bucket.as_bytes())
    } else {
        base.key.clone()
    }
}

fn missing_base(bucket: &str, path: &[u8]) -> error::Encryption {
    error::Encryption::MissingDecryptionBase(format!("{}/{}", bucket, path.escape_ascii()))
}
