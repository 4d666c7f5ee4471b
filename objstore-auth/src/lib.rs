//! API keys and path encryption for an object storage network
//!
//! API keys are bearer credentials with the following properties:
//!
//! * offline attenuation: anybody holding a key can derive a more restricted
//! one by appending a caveat, without contacting the issuer;
//! * offline verification: the holder of the project secret checks a key
//! and its caveats against a request without any other state;
//! * selective revocation: every key derived from a revoked key is revoked
//! too, through a caller-provided revocation oracle.
//!
//! Non goals:
//!
//! * third party caveats and discharge macaroons;
//! * storing secrets or revocation lists, both are provided by the caller.
//!
//! # Usage
//!
//! ```rust
//! use objstore_auth::{error, Action, ActionType, ApiKey, ApiKeyVersion, Caveat, CaveatPath};
//!
//! fn main() -> Result<(), error::Token> {
//!   let secret = [0u8; 32];
//!
//!   // an unrestricted key, given to the project owner
//!   let root = ApiKey::new(&secret)?;
//!
//!   // the owner shares a read only key restricted to one bucket
//!   let shared = root.restrict(&Caveat {
//!     disallow_writes: true,
//!     disallow_deletes: true,
//!     allowed_paths: vec![CaveatPath::new("photos", "")],
//!     ..Caveat::default()
//!   })?;
//!   let text = shared.serialize();
//!
//!   // the service parses the key from a request and checks it
//!   let key: ApiKey = text.parse()?;
//!   let read = Action::now(ActionType::Read).bucket("photos").encrypted_path("cat.jpg");
//!   key.check(&secret, ApiKeyVersion::MIN, &read, None)?;
//!
//!   let write = Action::now(ActionType::Write).bucket("photos").encrypted_path("cat.jpg");
//!   assert!(key.check(&secret, ApiKeyVersion::MIN, &write, None).is_err());
//!
//!   // revoking the root key revokes the shared key
//!   let revoked: std::collections::HashSet<_> = vec![*root.tail()].into_iter().collect();
//!   assert_eq!(
//!     key.check(&secret, ApiKeyVersion::MIN, &read, Some(&revoked)),
//!     Err(error::Token::Revoked(error::Revocation::Revoked))
//!   );
//!
//!   Ok(())
//! }
//! ```
//!
//! # Concepts
//!
//! ## Macaroons
//!
//! An API key is a [Macaroon](`crate::token::Macaroon`): a random head, a
//! list of caveats and a tail. The tail is an HMAC chain started from the
//! project secret and the head, with each caveat hashed into the previous
//! tail. Appending a caveat only needs the current tail, while removing one
//! would require inverting HMAC-SHA256.
//!
//! ## Caveats
//!
//! A [Caveat] is a protobuf message restricting the operations, the paths
//! and the validity period of a key. Caveats only restrict: a key allows an
//! action when every one of its caveats allows it. Unknown caveat fields are
//! ignored, so older verifiers accept keys with newer caveats.
//!
//! ## Path encryption
//!
//! The [encryption] module maps plaintext object paths to encrypted paths,
//! component by component, with keys derived along the path. See [`Store`].
pub mod crypto;
pub mod encryption;
pub mod error;
pub mod format;
pub mod paths;
pub mod token;

pub use crypto::{CipherSuite, Key};
pub use encryption::Store;
pub use paths::{Encrypted, Unencrypted};
pub use token::{
    Action, ActionType, AllowedBuckets, ApiKey, ApiKeyVersion, Caveat, CaveatPath, Macaroon,
    Revoker, RevokerError,
};
