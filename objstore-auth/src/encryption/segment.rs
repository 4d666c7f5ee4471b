//! byte level encoding of encrypted path components
//!
//! The encoded form never contains `0x00`, `0xff` or the path separator,
//! and is never empty. Its first byte tells whether the original component
//! was empty.
use crate::error;

const NOT_EMPTY_PREFIX: u8 = 0x01;
const EMPTY_PREFIX: u8 = 0x02;

// each escape byte stands for itself (followed by 1) or for the next
// byte value (followed by 2). 0x01 escapes 0x00 and 0x01
const ESCAPE_SLASH: u8 = 0x2e;
const ESCAPE_FF: u8 = 0xfe;
const ESCAPE_01: u8 = 0x01;

fn decode_error(message: &str) -> error::Encryption {
    error::Encryption::DecryptFailed(message.to_string())
}

/// encodes a component so that it can be used inside of a path
pub fn encode(segment: &[u8]) -> Vec<u8> {
    if segment.is_empty() {
        return vec![EMPTY_PREFIX];
    }

    let mut result = Vec::with_capacity(segment.len() * 2 + 1);
    result.push(NOT_EMPTY_PREFIX);

    for b in segment.iter() {
        match *b {
            ESCAPE_SLASH => result.extend_from_slice(&[ESCAPE_SLASH, 1]),
            b'/' => result.extend_from_slice(&[ESCAPE_SLASH, 2]),
            ESCAPE_FF => result.extend_from_slice(&[ESCAPE_FF, 1]),
            0xff => result.extend_from_slice(&[ESCAPE_FF, 2]),
            0x00 => result.extend_from_slice(&[ESCAPE_01, 1]),
            ESCAPE_01 => result.extend_from_slice(&[ESCAPE_01, 2]),
            other => result.push(other),
        }
    }

    result
}

/// reverses [`encode`]
pub fn decode(segment: &[u8]) -> Result<Vec<u8>, error::Encryption> {
    let (prefix, body) = segment
        .split_first()
        .ok_or_else(|| decode_error("encoded segment cannot be empty"))?;

    match *prefix {
        EMPTY_PREFIX if body.is_empty() => Ok(Vec::new()),
        EMPTY_PREFIX => Err(decode_error(
            "segment encoded as empty but contains data",
        )),
        NOT_EMPTY_PREFIX if body.is_empty() => Err(decode_error(
            "segment encoded as not empty but does not contain data",
        )),
        NOT_EMPTY_PREFIX => {
            let mut result = Vec::with_capacity(body.len());
            let mut bytes = body.iter();

            while let Some(b) = bytes.next() {
                match *b {
                    escape @ ESCAPE_SLASH | escape @ ESCAPE_FF | escape @ ESCAPE_01 => {
                        let offset = match bytes.next().copied() {
                            Some(1) => 0,
                            Some(2) => 1,
                            Some(_) => return Err(decode_error("invalid escape sequence")),
                            None => {
                                return Err(decode_error(
                                    "invalid escape character at the end of segment",
                                ))
                            }
                        };
                        let base = if escape == ESCAPE_01 { 0x00 } else { escape };
                        result.push(base + offset);
                    }
                    0x00 | b'/' | 0xff => {
                        return Err(decode_error("invalid character in segment"))
                    }
                    other => result.push(other),
                }
            }

            Ok(result)
        }
        _ => Err(decode_error("invalid segment prefix")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const INTERESTING: [u8; 13] = [
        0x00, 0x01, 0x02, 0x03, b'A', b'/', b'\\', 0x2d, 0x2e, 0x2f, 0xfd, 0xfe, 0xff,
    ];

    fn assert_clean(encoded: &[u8]) {
        assert!(!encoded.is_empty());
        for b in encoded.iter() {
            assert!(*b != 0x00 && *b != b'/' && *b != 0xff, "{:?}", encoded);
        }
    }

    #[test]
    fn markers() {
        assert_eq!(encode(b""), vec![EMPTY_PREFIX]);
        assert_eq!(encode(b"a"), vec![NOT_EMPTY_PREFIX, b'a']);
        assert_eq!(decode(&[EMPTY_PREFIX]).unwrap(), b"");
    }

    #[test]
    fn every_three_bytes_segment() {
        for a in INTERESTING.iter() {
            for b in INTERESTING.iter() {
                for c in INTERESTING.iter() {
                    let segment = [*a, *b, *c];
                    let encoded = encode(&segment);
                    assert_clean(&encoded);
                    assert_eq!(decode(&encoded).unwrap(), segment);
                }
            }
        }
    }

    #[test]
    fn malformed() {
        let cases: &[&[u8]] = &[
            &[],
            &[0x03],
            &[0x03, b'a'],
            &[0x00, b'a'],
            &[EMPTY_PREFIX, 0x00],
            &[EMPTY_PREFIX, 0xff],
            &[EMPTY_PREFIX, b'/'],
            &[NOT_EMPTY_PREFIX],
            &[NOT_EMPTY_PREFIX, 0x00],
            &[NOT_EMPTY_PREFIX, b'a', 0xff],
            &[NOT_EMPTY_PREFIX, b'a', b'/'],
            &[NOT_EMPTY_PREFIX, ESCAPE_SLASH],
            &[NOT_EMPTY_PREFIX, b'a', ESCAPE_FF],
            &[NOT_EMPTY_PREFIX, ESCAPE_01],
            &[NOT_EMPTY_PREFIX, ESCAPE_SLASH, 3],
            &[NOT_EMPTY_PREFIX, ESCAPE_01, 0],
        ];

        for case in cases.iter() {
            assert!(
                matches!(decode(case), Err(error::Encryption::DecryptFailed(_))),
                "{:?} should not decode",
                case
            );
        }
    }

    proptest! {
        #[test]
        fn round_trip(segment in proptest::collection::vec(any::<u8>(), 0..64)) {
            let encoded = encode(&segment);
            assert_clean(&encoded);
            prop_assert_eq!(decode(&encoded).unwrap(), segment);
        }
    }
}
