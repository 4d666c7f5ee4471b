//! error types
//!

use crate::token::ActionType;
use thiserror::Error;

/// the global error type for API keys
#[derive(Error, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-error", derive(serde::Serialize, serde::Deserialize))]
pub enum Token {
    #[error("error deserializing the API key")]
    Format(Format),
    #[error("the API key does not verify under the provided secret")]
    Invalid,
    #[error("action disallowed")]
    Unauthorized(Unauthorized),
    #[error("the API key was revoked")]
    Revoked(Revocation),
    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl From<Format> for Token {
    fn from(e: Format) -> Self {
        Token::Format(e)
    }
}

impl From<Unauthorized> for Token {
    fn from(e: Unauthorized) -> Self {
        Token::Unauthorized(e)
    }
}

impl From<Revocation> for Token {
    fn from(e: Revocation) -> Self {
        Token::Revoked(e)
    }
}

impl From<bs58::decode::Error> for Format {
    fn from(e: bs58::decode::Error) -> Self {
        Format::Base58(e.to_string())
    }
}

impl From<prost::DecodeError> for Format {
    fn from(e: prost::DecodeError) -> Self {
        Format::CaveatDeserialization(e.to_string())
    }
}

/// Errors related to the binary or textual form of an API key, or to
/// the encoding of its caveats
#[derive(Error, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-error", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    #[error("invalid base58 encoding: {0}")]
    Base58(String),
    #[error("unknown API key version {0}")]
    UnknownVersion(u8),
    #[error("the macaroon is truncated")]
    Truncated,
    #[error("invalid caveat length prefix: {0}")]
    CaveatLength(String),
    #[error("invalid tail size {0}")]
    InvalidTailSize(usize),
    #[error("could not deserialize the caveat: {0}")]
    CaveatDeserialization(String),
    #[error("could not serialize the caveat: {0}")]
    CaveatSerialization(String),
    #[error("unknown action type {0}")]
    UnknownAction(u8),
}

/// reasons for denying an action on a verified key
#[derive(Error, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-error", derive(serde::Serialize, serde::Deserialize))]
pub enum Unauthorized {
    #[error("caveat {caveat} disallows the action")]
    CaveatDenied { caveat: usize },
    #[error("the API key version does not permit {0}")]
    VersionDenied(ActionType),
}

/// revocation errors
///
/// a failing revocation oracle is reported as a revocation as well
#[derive(Error, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-error", derive(serde::Serialize, serde::Deserialize))]
pub enum Revocation {
    #[error("macaroon head revoked")]
    Revoked,
    #[error("revocation check failed: {0}")]
    Oracle(String),
}

/// errors from the path encryption store and the path ciphers
#[derive(Error, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-error", derive(serde::Serialize, serde::Deserialize))]
pub enum Encryption {
    #[error("conflicting path components: {0}")]
    Mismatch(String),
    #[error("encrypted and unencrypted paths had different number of components")]
    PathLengthsDiffer,
    #[error("decryption failed: {0}")]
    DecryptFailed(String),
    #[error("encryption failed: {0}")]
    EncryptFailed(String),
    #[error("unable to find encryption base for: {0}")]
    MissingDecryptionBase(String),
    #[error("invalid key size {0}")]
    InvalidKeySize(usize),
}
