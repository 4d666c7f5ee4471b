//! main structures to interact with API keys
use std::collections::{BTreeSet, HashSet};
use std::fmt::{self, Display};
use std::ops::BitOr;
use std::str::FromStr;
use std::time::Duration;

use super::crypto::{Tail, HEAD_SIZE};
use super::error;
use super::format;
use rand_core::{CryptoRng, RngCore};
use tracing::debug;

mod action;
mod caveat;
mod macaroon;

pub use action::{Action, ActionType};
pub use caveat::{Caveat, CaveatPath, CAVEAT_NONCE_SIZE};
pub use macaroon::Macaroon;

/// capabilities of an API key, stored next to the key by the issuer
///
/// the version is not part of the key itself: it is provided at
/// verification time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApiKeyVersion(u32);

impl ApiKeyVersion {
    /// no capability bits
    pub const MIN: ApiKeyVersion = ApiKeyVersion(0);
    /// the key may be used for object lock operations
    pub const OBJECT_LOCK: ApiKeyVersion = ApiKeyVersion(1 << 0);
    /// the key usage may be audited
    pub const AUDITABLE: ApiKeyVersion = ApiKeyVersion(1 << 1);

    pub fn from_bits(bits: u32) -> Self {
        ApiKeyVersion(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: ApiKeyVersion) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn supports_object_lock(&self) -> bool {
        self.contains(Self::OBJECT_LOCK)
    }

    pub fn supports_audit(&self) -> bool {
        self.contains(Self::AUDITABLE)
    }
}

impl BitOr for ApiKeyVersion {
    type Output = ApiKeyVersion;

    fn bitor(self, rhs: Self) -> Self::Output {
        ApiKeyVersion(self.0 | rhs.0)
    }
}

/// error type returned by revocation oracles
pub type RevokerError = Box<dyn std::error::Error + Send + Sync>;

/// answers whether any tail of a key has been revoked
///
/// the oracle is called at most once per [`ApiKey::check`], with the whole
/// tail chain of the key. Results are never cached here.
pub trait Revoker {
    fn check(&self, tails: &[Tail]) -> Result<bool, RevokerError>;
}

impl<F> Revoker for F
where
    F: Fn(&[Tail]) -> Result<bool, RevokerError>,
{
    fn check(&self, tails: &[Tail]) -> Result<bool, RevokerError> {
        self(tails)
    }
}

impl Revoker for HashSet<Tail> {
    fn check(&self, tails: &[Tail]) -> Result<bool, RevokerError> {
        Ok(tails.iter().any(|tail| self.contains(tail)))
    }
}

/// buckets an API key may access
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowedBuckets {
    /// no caveat restricts buckets
    pub all: bool,
    /// if `all` is false, the buckets allowed by every caveat
    pub buckets: BTreeSet<Vec<u8>>,
}

impl Default for AllowedBuckets {
    fn default() -> Self {
        AllowedBuckets {
            all: true,
            buckets: BTreeSet::new(),
        }
    }
}

impl AllowedBuckets {
    pub fn contains(&self, bucket: &[u8]) -> bool {
        self.all || self.buckets.contains(bucket)
    }
}

/// a macaroon whose caveats are [`Caveat`] messages
///
/// ```rust
/// use objstore_auth::{Action, ActionType, ApiKey, ApiKeyVersion, Caveat, CaveatPath};
///
/// let secret = [0u8; 32];
/// let key = ApiKey::new(&secret).unwrap();
///
/// // attenuation does not need the secret
/// let restricted = key
///     .restrict(&Caveat {
///         allowed_paths: vec![CaveatPath::new("a-test-bucket", "a-test-path")],
///         ..Caveat::default()
///     })
///     .unwrap();
///
/// let parsed = ApiKey::parse(&restricted.serialize()).unwrap();
///
/// let action = Action::now(ActionType::Read)
///     .bucket("a-test-bucket")
///     .encrypted_path("a-test-path/x");
/// assert!(parsed.check(&secret, ApiKeyVersion::MIN, &action, None).is_ok());
///
/// let other = Action::now(ActionType::Read)
///     .bucket("other")
///     .encrypted_path("a-test-path");
/// assert!(parsed.check(&secret, ApiKeyVersion::MIN, &other, None).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey {
    mac: Macaroon,
}

impl ApiKey {
    /// creates an unrestricted key from a project secret
    pub fn new(secret: &[u8]) -> Result<Self, error::Token> {
        Macaroon::new_unrestricted(secret).map(ApiKey::from_macaroon)
    }

    /// creates an unrestricted key, using the provided CSPRNG
    pub fn new_with_rng<T: RngCore + CryptoRng>(
        rng: &mut T,
        secret: &[u8],
    ) -> Result<Self, error::Token> {
        Macaroon::new_unrestricted_with_rng(rng, secret).map(ApiKey::from_macaroon)
    }

    pub fn from_macaroon(mac: Macaroon) -> Self {
        ApiKey { mac }
    }

    /// parses the base58 textual form
    pub fn parse(key: &str) -> Result<Self, error::Token> {
        let data = format::from_base58_check(key)?;
        Self::parse_raw(&data)
    }

    /// parses the binary form
    pub fn parse_raw(data: &[u8]) -> Result<Self, error::Token> {
        let mac = Macaroon::parse(data)?;
        Ok(ApiKey { mac })
    }

    /// serializes to the base58 textual form
    pub fn serialize(&self) -> String {
        format::to_base58_check(&self.serialize_raw())
    }

    /// serializes to the binary form
    pub fn serialize_raw(&self) -> Vec<u8> {
        self.mac.serialize()
    }

    pub fn macaroon(&self) -> &Macaroon {
        &self.mac
    }

    pub fn head(&self) -> &[u8; HEAD_SIZE] {
        self.mac.head()
    }

    pub fn tail(&self) -> &Tail {
        self.mac.tail()
    }

    /// generates a new key with the caveat appended
    pub fn restrict(&self, caveat: &Caveat) -> Result<ApiKey, error::Token> {
        let payload = caveat.encode()?;
        Ok(ApiKey {
            mac: self.mac.add_first_party_caveat(payload),
        })
    }

    /// decodes every caveat of the key
    pub fn caveats(&self) -> Result<Vec<Caveat>, error::Token> {
        self.mac
            .caveats()
            .iter()
            .map(|c| Caveat::decode(c).map_err(error::Token::Format))
            .collect()
    }

    /// verifies the key under `secret` and checks that every caveat allows
    /// the action, then asks the revocation oracle if one is provided
    pub fn check(
        &self,
        secret: &[u8],
        version: ApiKeyVersion,
        action: &Action,
        revoker: Option<&dyn Revoker>,
    ) -> Result<(), error::Token> {
        let (valid, tails) = self.mac.validate_and_tails(secret);
        if !valid {
            debug!(head = %hex::encode(self.head()), "API key does not verify");
            return Err(error::Token::Invalid);
        }

        if action.time.is_none() {
            return Err(error::Token::Precondition(
                "no timestamp provided".to_string(),
            ));
        }

        if action.op.is_object_lock_op() && !version.supports_object_lock() {
            debug!(op = %action.op, version = version.bits(), "operation denied by key version");
            return Err(error::Unauthorized::VersionDenied(action.op).into());
        }

        for (index, payload) in self.mac.caveats().iter().enumerate() {
            let caveat = Caveat::decode(payload)?;
            if !caveat.allows(action) {
                debug!(op = %action.op, caveat = index, "action disallowed by caveat");
                return Err(error::Unauthorized::CaveatDenied { caveat: index }.into());
            }
        }

        if let Some(revoker) = revoker {
            match revoker.check(&tails) {
                Ok(false) => {}
                Ok(true) => {
                    debug!(head = %hex::encode(self.head()), "API key revoked");
                    return Err(error::Revocation::Revoked.into());
                }
                Err(e) => {
                    debug!(error = %e, "revocation check failed");
                    return Err(error::Revocation::Oracle(e.to_string()).into());
                }
            }
        }

        Ok(())
    }

    /// lists the buckets this key may access for the action
    ///
    /// this does not verify the key: call [`ApiKey::check`] first
    pub fn get_allowed_buckets(&self, action: &Action) -> Result<AllowedBuckets, error::Token> {
        let caveats = self.caveats()?;

        let mut allowed = AllowedBuckets::default();
        let mut restricted = false;

        for (index, caveat) in caveats.iter().enumerate() {
            if !caveat.allows(action) {
                return Err(error::Unauthorized::CaveatDenied { caveat: index }.into());
            }

            if caveat.allowed_paths.is_empty() {
                continue;
            }

            let buckets: BTreeSet<Vec<u8>> = caveat.buckets().map(|b| b.to_vec()).collect();
            if restricted {
                allowed.buckets = allowed.buckets.intersection(&buckets).cloned().collect();
            } else {
                allowed.buckets = buckets;
                restricted = true;
            }
            allowed.all = false;
        }

        Ok(allowed)
    }

    /// smallest maximum object TTL of all caveats, if any caveat sets one
    pub fn get_max_object_ttl(&self) -> Result<Option<Duration>, error::Token> {
        Ok(self
            .caveats()?
            .iter()
            .filter_map(|c| c.max_object_ttl)
            .min())
    }
}

impl Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for ApiKey {
    type Err = error::Token;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiKey::parse(s)
    }
}
