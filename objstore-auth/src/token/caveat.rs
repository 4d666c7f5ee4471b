use super::{Action, ActionType};
use crate::error;
use crate::format;

use rand_core::{CryptoRng, RngCore};
use std::time::{Duration, SystemTime};

/// size of the nonce added by [`Caveat::with_nonce`]
pub const CAVEAT_NONCE_SIZE: usize = 4;

/// a restriction appended to an API key
///
/// every field restricts independently. A caveat can only narrow the
/// rights of the key it is appended to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Caveat {
    pub disallow_reads: bool,
    pub disallow_writes: bool,
    pub disallow_lists: bool,
    pub disallow_deletes: bool,

    /// object lock restrictions. Those are only looked at for keys whose
    /// version carries the object lock bit
    pub disallow_locks: bool,
    pub disallow_put_retention: bool,
    /// only applies if `disallow_put_retention` is set too
    pub disallow_get_retention: bool,
    pub disallow_put_legal_hold: bool,
    pub disallow_get_legal_hold: bool,
    pub disallow_bypass_governance_retention: bool,
    pub disallow_put_bucket_object_lock_configuration: bool,
    pub disallow_get_bucket_object_lock_configuration: bool,

    /// if not empty, access is limited to these bucket and encrypted path
    /// prefixes
    pub allowed_paths: Vec<CaveatPath>,

    pub not_after: Option<SystemTime>,
    pub not_before: Option<SystemTime>,

    /// random bytes making otherwise identical caveats produce different tails
    pub nonce: Vec<u8>,

    pub max_object_ttl: Option<Duration>,
}

/// a bucket and an encrypted path prefix inside of it
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CaveatPath {
    pub bucket: Vec<u8>,
    pub encrypted_path_prefix: Vec<u8>,
}

impl CaveatPath {
    pub fn new<B: Into<Vec<u8>>, P: Into<Vec<u8>>>(bucket: B, encrypted_path_prefix: P) -> Self {
        CaveatPath {
            bucket: bucket.into(),
            encrypted_path_prefix: encrypted_path_prefix.into(),
        }
    }
}

impl Caveat {
    pub fn new() -> Self {
        Caveat::default()
    }

    /// fills the nonce with random bytes
    pub fn with_nonce(self) -> Self {
        self.with_nonce_and_rng(&mut rand::rngs::OsRng)
    }

    pub fn with_nonce_and_rng<T: RngCore + CryptoRng>(mut self, rng: &mut T) -> Self {
        let mut nonce = vec![0u8; CAVEAT_NONCE_SIZE];
        rng.fill_bytes(&mut nonce);
        self.nonce = nonce;
        self
    }

    /// serializes to the Protobuf wire form
    pub fn encode(&self) -> Result<Vec<u8>, error::Format> {
        format::encode_caveat(self)
    }

    /// deserializes from the Protobuf wire form. Unknown fields are ignored
    pub fn decode(data: &[u8]) -> Result<Self, error::Format> {
        format::decode_caveat(data)
    }

    /// returns true if this caveat permits the action
    ///
    /// time bounds are exclusive: an action exactly at `not_after` or
    /// `not_before` is allowed. An action without a time is denied by
    /// any caveat carrying a time bound.
    pub fn allows(&self, action: &Action) -> bool {
        if let Some(not_after) = self.not_after {
            match action.time {
                Some(time) if time <= not_after => {}
                _ => return false,
            }
        }

        if let Some(not_before) = self.not_before {
            match action.time {
                Some(time) if time >= not_before => {}
                _ => return false,
            }
        }

        // reading bucket metadata is always allowed, filtered by the buckets
        // of the allowed paths
        if action.op == ActionType::Read && action.encrypted_path.is_empty() {
            if self.allowed_paths.is_empty() {
                return true;
            }
            // an empty bucket lists every bucket. Those not allowed are
            // removed later by the caller through `get_allowed_buckets`
            if action.bucket.is_empty() {
                return true;
            }
            return self
                .allowed_paths
                .iter()
                .any(|path| path.bucket == action.bucket);
        }

        let disallowed = match action.op {
            ActionType::Read => self.disallow_reads,
            ActionType::Write => self.disallow_writes,
            ActionType::List => self.disallow_lists,
            ActionType::Delete => self.disallow_deletes,
            ActionType::ProjectInfo => false,
            ActionType::Lock => self.disallow_locks,
            ActionType::PutObjectRetention => self.disallow_put_retention,
            // being allowed to put a retention implies being allowed to get it
            ActionType::GetObjectRetention => {
                self.disallow_get_retention && self.disallow_put_retention
            }
            ActionType::PutObjectLegalHold => self.disallow_put_legal_hold,
            ActionType::GetObjectLegalHold => self.disallow_get_legal_hold,
            ActionType::BypassGovernanceRetention => self.disallow_bypass_governance_retention,
            ActionType::PutBucketObjectLockConfiguration => {
                self.disallow_put_bucket_object_lock_configuration
            }
            ActionType::GetBucketObjectLockConfiguration => {
                self.disallow_get_bucket_object_lock_configuration
            }
        };

        if disallowed {
            return false;
        }

        if !self.allowed_paths.is_empty() && action.op != ActionType::ProjectInfo {
            return self.allowed_paths.iter().any(|path| {
                path.bucket == action.bucket
                    && action
                        .encrypted_path
                        .starts_with(&path.encrypted_path_prefix)
            });
        }

        true
    }

    /// set of buckets named by the allowed paths
    pub(crate) fn buckets(&self) -> impl Iterator<Item = &[u8]> {
        self.allowed_paths.iter().map(|p| p.bucket.as_slice())
    }
}
