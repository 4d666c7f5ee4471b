//! API key serialization/deserialization
//!
//! There are three levels of serialization:
//!
//! - caveats are serialized to Protobuf then `Vec<u8>`. Those bytes are
//!   the HMAC payloads and are kept as is once a caveat is appended
//! - the macaroon binary form: `head ∥ (varint length ∥ caveat)* ∥ tail`
//! - the textual API key: base58 with a checksum and a version byte
use super::crypto::{Tail, HEAD_SIZE, TAIL_SIZE};
use super::error;
use super::token::Caveat;

use prost::Message;
use std::convert::TryFrom;

/// Structures generated from the Protobuf schema
pub mod schema;

pub mod convert;

use self::convert::*;

/// version byte of the textual API key form
pub const API_KEY_VERSION_BYTE: u8 = 0;

/// the deserialized parts of a macaroon, before any verification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedMacaroon {
    pub head: [u8; HEAD_SIZE],
    pub caveats: Vec<Vec<u8>>,
    pub tail: Tail,
}

impl SerializedMacaroon {
    pub fn from_slice(slice: &[u8]) -> Result<Self, error::Format> {
        if slice.len() < HEAD_SIZE + TAIL_SIZE {
            return Err(error::Format::Truncated);
        }

        let (head_bytes, mut rest) = slice.split_at(HEAD_SIZE);
        let mut head = [0u8; HEAD_SIZE];
        head.copy_from_slice(head_bytes);

        let mut caveats = Vec::new();
        while rest.len() > TAIL_SIZE {
            let length = prost::encoding::decode_varint(&mut rest)
                .map_err(|e| error::Format::CaveatLength(e.to_string()))?;
            let length = usize::try_from(length)
                .map_err(|e| error::Format::CaveatLength(e.to_string()))?;

            if length > rest.len() {
                return Err(error::Format::Truncated);
            }

            let (caveat, next) = rest.split_at(length);
            caveats.push(caveat.to_vec());
            rest = next;
        }

        if rest.len() != TAIL_SIZE {
            return Err(error::Format::InvalidTailSize(rest.len()));
        }

        let mut tail = [0u8; TAIL_SIZE];
        tail.copy_from_slice(rest);

        Ok(SerializedMacaroon {
            head,
            caveats,
            tail,
        })
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.serialized_size());
        v.extend_from_slice(&self.head);
        for caveat in self.caveats.iter() {
            prost::encoding::encode_varint(caveat.len() as u64, &mut v);
            v.extend_from_slice(caveat);
        }
        v.extend_from_slice(&self.tail);
        v
    }

    pub fn serialized_size(&self) -> usize {
        HEAD_SIZE
            + TAIL_SIZE
            + self
                .caveats
                .iter()
                .map(|c| prost::encoding::encoded_len_varint(c.len() as u64) + c.len())
                .sum::<usize>()
    }
}

/// encodes bytes to base58 with a version byte and a checksum
pub fn to_base58_check(data: &[u8]) -> String {
    bs58::encode(data)
        .with_check_version(API_KEY_VERSION_BYTE)
        .into_string()
}

/// decodes base58 text, verifying its checksum and version byte
pub fn from_base58_check(text: &str) -> Result<Vec<u8>, error::Format> {
    let decoded = bs58::decode(text).with_check(None).into_vec()?;

    match decoded.split_first() {
        Some((&API_KEY_VERSION_BYTE, data)) => Ok(data.to_vec()),
        Some((version, _)) => Err(error::Format::UnknownVersion(*version)),
        None => Err(error::Format::Base58("missing version byte".to_string())),
    }
}

pub fn encode_caveat(caveat: &Caveat) -> Result<Vec<u8>, error::Format> {
    let proto = caveat_to_proto_caveat(caveat);

    let mut v = Vec::new();
    proto
        .encode(&mut v)
        .map(|_| v)
        .map_err(|e| error::Format::CaveatSerialization(format!("{:?}", e)))
}

/// decodes a caveat payload
///
/// unknown fields are skipped, the payload itself is never re-encoded
pub fn decode_caveat(data: &[u8]) -> Result<Caveat, error::Format> {
    let proto = schema::Caveat::decode(data)?;
    proto_caveat_to_caveat(proto)
}
