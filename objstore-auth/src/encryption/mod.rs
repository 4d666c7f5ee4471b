//! hierarchical path encryption
//!
//! A [`Store`] binds unencrypted path prefixes of a bucket to encrypted
//! prefixes and keys. Below a prefix, every component is encrypted with a
//! key derived from its parent's key and the parent component, so listing
//! a prefix only requires the key of that prefix.
//!
//! ```rust
//! use objstore_auth::encryption::{decrypt_path_with_store_cipher, encrypt_path_with_store_cipher, Store};
//! use objstore_auth::crypto::Key;
//! use objstore_auth::paths::Unencrypted;
//!
//! let mut store = Store::new();
//! store.set_default_key(Key::zero());
//!
//! let path = Unencrypted::from("photos/2021/cat.jpg");
//! let encrypted = encrypt_path_with_store_cipher("bucket", &path, &store).unwrap();
//! assert_eq!(encrypted.iter().count(), 3);
//!
//! let decrypted = decrypt_path_with_store_cipher("bucket", &encrypted, &store).unwrap();
//! assert_eq!(decrypted, path);
//! ```
mod path;
pub mod segment;
mod store;

pub use path::{
    decrypt_path, decrypt_path_component, decrypt_path_raw, decrypt_path_with_store_cipher,
    decrypt_prefix, derive_content_key, derive_path_key, derive_path_key_component, encrypt_path,
    encrypt_path_component, encrypt_path_raw, encrypt_path_with_store_cipher, encrypt_prefix,
    get_prefix_info, PrefixInfo,
};
pub use store::{Base, Lookup, Store};
