use crate::crypto::{CipherSuite, Key};
use crate::error;
use crate::paths::{self, Encrypted, Unencrypted};

use std::collections::BTreeMap;
use tracing::trace;

/// binds an unencrypted prefix to an encrypted prefix, and to the key and
/// cipher used for everything below it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Base {
    pub unencrypted: Unencrypted,
    pub encrypted: Encrypted,
    pub key: Key,
    pub path_cipher: CipherSuite,
    /// the base comes from the store's default key. The key must be
    /// derived with the bucket name before use
    pub default: bool,
}

/// result of a store lookup
#[derive(Clone, Debug)]
pub struct Lookup<'p> {
    /// children of the node the whole path leads to, mapping components of
    /// the other side to components of the looked up side
    pub revealed: BTreeMap<Vec<u8>, Vec<u8>>,
    /// components of the path below the base
    pub remaining: paths::Iter<'p>,
    /// the deepest base along the path
    pub base: Option<Base>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Unencrypted,
    Encrypted,
}

/// a node of a bucket tree
///
/// children are owned through their unencrypted component. Both
/// component maps are kept so the tree can be walked from either side.
#[derive(Clone, Debug, Default)]
struct Node {
    children: BTreeMap<Vec<u8>, Node>,
    unenc_to_enc: BTreeMap<Vec<u8>, Vec<u8>>,
    enc_to_unenc: BTreeMap<Vec<u8>, Vec<u8>>,
    base: Option<Base>,
}

impl Node {
    /// checks that the components can be added without changing an
    /// existing binding
    fn check_add(&self, unenc: &[&[u8]], enc: &[&[u8]]) -> Result<(), error::Encryption> {
        let mut node = self;

        for (u, e) in unenc.iter().zip(enc.iter()) {
            if let Some(existing) = node.enc_to_unenc.get(*e) {
                if existing.as_slice() != *u {
                    return Err(error::Encryption::Mismatch(format!(
                        "encrypted component {} is already bound to {}",
                        e.escape_ascii(),
                        existing.escape_ascii()
                    )));
                }
            }

            if let Some(existing) = node.unenc_to_enc.get(*u) {
                if existing.as_slice() != *e {
                    return Err(error::Encryption::Mismatch(format!(
                        "unencrypted component {} is already bound to {}",
                        u.escape_ascii(),
                        existing.escape_ascii()
                    )));
                }
            }

            match node.children.get(*u) {
                Some(child) => node = child,
                None => return Ok(()),
            }
        }

        Ok(())
    }

    fn insert(&mut self, unenc: &[&[u8]], enc: &[&[u8]], base: Base) {
        let mut node = self;

        for (u, e) in unenc.iter().zip(enc.iter()) {
            node.unenc_to_enc.insert(u.to_vec(), e.to_vec());
            node.enc_to_unenc.insert(e.to_vec(), u.to_vec());
            node = node.children.entry(u.to_vec()).or_default();
        }

        node.base = Some(base);
    }

    fn lookup<'p>(
        &self,
        mut path: paths::Iter<'p>,
        side: Side,
    ) -> (
        Option<&BTreeMap<Vec<u8>, Vec<u8>>>,
        paths::Iter<'p>,
        Option<&Base>,
    ) {
        let mut node = self;
        let mut best_base = None;
        let mut best_remaining = path;

        loop {
            if node.base.is_some() || best_base.is_none() {
                best_base = node.base.as_ref();
                best_remaining = path;
            }

            let component = match path.next() {
                Some(component) => component,
                None => {
                    let revealed = match side {
                        Side::Unencrypted => &node.enc_to_unenc,
                        Side::Encrypted => &node.unenc_to_enc,
                    };
                    return (Some(revealed), best_remaining, best_base);
                }
            };

            let child = match side {
                Side::Unencrypted => node.children.get(component),
                Side::Encrypted => node
                    .enc_to_unenc
                    .get(component)
                    .and_then(|u| node.children.get(u)),
            };

            match child {
                Some(child) => node = child,
                None => return (None, best_remaining, best_base),
            }
        }
    }

    fn iterate<E, F>(&self, bucket: &str, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&str, &Base) -> Result<(), E>,
    {
        if let Some(base) = &self.base {
            f(bucket, base)?;
        }

        for child in self.children.values() {
            child.iterate(bucket, f)?;
        }

        Ok(())
    }
}

/// maps buckets and path prefixes to encryption keys
///
/// the store is not synchronized: mutate it before sharing it, clone it,
/// or put it behind a lock. Clones are deep and independent.
#[derive(Clone, Debug)]
pub struct Store {
    roots: BTreeMap<String, Node>,
    default_key: Option<Key>,
    default_path_cipher: CipherSuite,
    encryption_bypass: bool,
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl Store {
    /// creates an empty store, with AES-GCM as the default path cipher
    pub fn new() -> Self {
        Store {
            roots: BTreeMap::new(),
            default_key: None,
            default_path_cipher: CipherSuite::AesGcm,
            encryption_bypass: false,
        }
    }

    /// sets the key used for buckets and paths without a base
    pub fn set_default_key(&mut self, key: Key) {
        self.default_key = Some(key);
    }

    pub fn default_key(&self) -> Option<&Key> {
        self.default_key.as_ref()
    }

    /// sets the cipher used by [`Store::add`] and by the default key
    pub fn set_default_path_cipher(&mut self, cipher: CipherSuite) {
        self.default_path_cipher = cipher;
    }

    pub fn default_path_cipher(&self) -> CipherSuite {
        self.default_path_cipher
    }

    /// when set, lookups return a base using the null base64 cipher, so
    /// encrypted paths can be listed as text without knowing any key
    pub fn set_encryption_bypass(&mut self, bypass: bool) {
        self.encryption_bypass = bypass;
    }

    pub fn encryption_bypass(&self) -> bool {
        self.encryption_bypass
    }

    /// binds an unencrypted path to an encrypted path and a key, using the
    /// default path cipher
    pub fn add(
        &mut self,
        bucket: &str,
        unenc: Unencrypted,
        enc: Encrypted,
        key: Key,
    ) -> Result<(), error::Encryption> {
        let cipher = self.default_path_cipher;
        self.add_with_cipher(bucket, unenc, enc, key, cipher)
    }

    /// binds an unencrypted path to an encrypted path, a key and a cipher
    ///
    /// components already bound to other components are rejected, and
    /// nothing is modified in that case
    pub fn add_with_cipher(
        &mut self,
        bucket: &str,
        unenc: Unencrypted,
        enc: Encrypted,
        key: Key,
        path_cipher: CipherSuite,
    ) -> Result<(), error::Encryption> {
        let unenc_components: Vec<&[u8]> = unenc.iter().collect();
        let enc_components: Vec<&[u8]> = enc.iter().collect();

        if unenc_components.len() != enc_components.len() {
            return Err(error::Encryption::PathLengthsDiffer);
        }

        if let Some(root) = self.roots.get(bucket) {
            root.check_add(&unenc_components, &enc_components)?;
        }

        trace!(bucket, unencrypted = %unenc, "adding encryption base");

        let base = Base {
            unencrypted: unenc.clone(),
            encrypted: enc.clone(),
            key,
            path_cipher,
            default: false,
        };

        self.roots
            .entry(bucket.to_string())
            .or_default()
            .insert(&unenc_components, &enc_components, base);
        Ok(())
    }

    /// finds the deepest base for an unencrypted path
    pub fn lookup_unencrypted<'p>(&self, bucket: &str, path: &'p Unencrypted) -> Lookup<'p> {
        self.lookup(bucket, path.iter(), Side::Unencrypted)
    }

    /// finds the deepest base for an encrypted path
    pub fn lookup_encrypted<'p>(&self, bucket: &str, path: &'p Encrypted) -> Lookup<'p> {
        self.lookup(bucket, path.iter(), Side::Encrypted)
    }

    fn lookup<'p>(&self, bucket: &str, path: paths::Iter<'p>, side: Side) -> Lookup<'p> {
        if self.encryption_bypass {
            return Lookup {
                revealed: BTreeMap::new(),
                remaining: path,
                base: Some(Base {
                    unencrypted: Unencrypted::default(),
                    encrypted: Encrypted::default(),
                    key: Key::zero(),
                    path_cipher: CipherSuite::NullBase64Url,
                    default: false,
                }),
            };
        }

        let (revealed, remaining, base) = match self.roots.get(bucket) {
            Some(root) => root.lookup(path, side),
            None => (None, path, None),
        };
        let revealed = revealed.cloned().unwrap_or_default();

        match (base, &self.default_key) {
            (Some(base), _) => Lookup {
                revealed,
                remaining,
                base: Some(base.clone()),
            },
            (None, Some(key)) => {
                trace!(bucket, "falling back to the default key");
                Lookup {
                    revealed,
                    remaining: path,
                    base: Some(Base {
                        unencrypted: Unencrypted::default(),
                        encrypted: Encrypted::default(),
                        key: key.clone(),
                        path_cipher: self.default_path_cipher,
                        default: true,
                    }),
                }
            }
            (None, None) => Lookup {
                revealed,
                remaining,
                base: None,
            },
        }
    }

    /// calls `f` on every base added to the store, bucket by bucket, in
    /// depth first order. The default key is not reported
    pub fn iterate<E, F>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&str, &Base) -> Result<(), E>,
    {
        for (bucket, root) in self.roots.iter() {
            root.iterate(bucket, &mut f)?;
        }
        Ok(())
    }
}
