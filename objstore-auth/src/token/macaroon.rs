use crate::crypto::{self, Tail, HEAD_SIZE, MIN_SECRET_SIZE};
use crate::error;
use crate::format::SerializedMacaroon;

use rand_core::{CryptoRng, RngCore};
use std::fmt;

/// an HMAC chained bearer credential
///
/// the tail is `HMAC(secret, head)` for an unrestricted macaroon, then
/// `HMAC(previous tail, caveat)` for each appended caveat. Holding a
/// tail is enough to append caveats, but not to remove them.
#[derive(Clone, PartialEq, Eq)]
pub struct Macaroon {
    head: [u8; HEAD_SIZE],
    caveats: Vec<Vec<u8>>,
    tail: Tail,
}

impl Macaroon {
    /// creates a macaroon with a random head and no caveats
    pub fn new_unrestricted(secret: &[u8]) -> Result<Self, error::Token> {
        Self::new_unrestricted_with_rng(&mut rand::rngs::OsRng, secret)
    }

    /// creates a macaroon with no caveats, using the provided CSPRNG
    pub fn new_unrestricted_with_rng<T: RngCore + CryptoRng>(
        rng: &mut T,
        secret: &[u8],
    ) -> Result<Self, error::Token> {
        let mut head = [0u8; HEAD_SIZE];
        rng.fill_bytes(&mut head);
        Self::with_head(secret, head)
    }

    /// creates a macaroon with no caveats from a known head
    pub fn with_head(secret: &[u8], head: [u8; HEAD_SIZE]) -> Result<Self, error::Token> {
        if secret.len() < MIN_SECRET_SIZE {
            return Err(error::Token::Precondition(format!(
                "secret must be at least {} bytes, got {}",
                MIN_SECRET_SIZE,
                secret.len()
            )));
        }

        let tail = crypto::sign(secret, &head);
        Ok(Macaroon {
            head,
            caveats: Vec::new(),
            tail,
        })
    }

    /// appends a caveat and returns the attenuated macaroon
    ///
    /// no secret is needed: the new tail is computed from the current one
    pub fn add_first_party_caveat(&self, caveat: Vec<u8>) -> Macaroon {
        let tail = crypto::sign(&self.tail, &caveat);

        let mut caveats = self.caveats.clone();
        caveats.push(caveat);

        Macaroon {
            head: self.head,
            caveats,
            tail,
        }
    }

    pub fn head(&self) -> &[u8; HEAD_SIZE] {
        &self.head
    }

    /// caveat payloads, in the order they were appended
    pub fn caveats(&self) -> &[Vec<u8>] {
        &self.caveats
    }

    pub fn tail(&self) -> &Tail {
        &self.tail
    }

    /// checks that the tail was derived from `secret`
    pub fn validate(&self, secret: &[u8]) -> bool {
        self.validate_and_tails(secret).0
    }

    /// checks that the tail was derived from `secret`, and returns every
    /// intermediate tail, starting with `HMAC(secret, head)`
    ///
    /// revoking any of those tails revokes this macaroon
    pub fn validate_and_tails(&self, secret: &[u8]) -> (bool, Vec<Tail>) {
        let tails = self.tails(secret);
        let valid = tails
            .last()
            .map(|last| crypto::tails_equal(last, &self.tail))
            .unwrap_or(false);
        (valid, tails)
    }

    /// recomputes the tail chain from `secret`
    pub fn tails(&self, secret: &[u8]) -> Vec<Tail> {
        let mut tails = Vec::with_capacity(self.caveats.len() + 1);
        let mut tail = crypto::sign(secret, &self.head);
        tails.push(tail);

        for caveat in self.caveats.iter() {
            tail = crypto::sign(&tail, caveat);
            tails.push(tail);
        }

        tails
    }

    /// serializes to the binary form
    pub fn serialize(&self) -> Vec<u8> {
        self.container().to_vec()
    }

    /// parses the binary form. No verification happens here
    pub fn parse(data: &[u8]) -> Result<Self, error::Format> {
        let SerializedMacaroon {
            head,
            caveats,
            tail,
        } = SerializedMacaroon::from_slice(data)?;

        Ok(Macaroon {
            head,
            caveats,
            tail,
        })
    }

    fn container(&self) -> SerializedMacaroon {
        SerializedMacaroon {
            head: self.head,
            caveats: self.caveats.clone(),
            tail: self.tail,
        }
    }
}

impl fmt::Debug for Macaroon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Macaroon")
            .field("head", &hex::encode(self.head))
            .field("caveats", &self.caveats.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn chain() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(0);
        let secret = crypto::new_secret_with_rng(&mut rng);

        let mut m = Macaroon::new_unrestricted_with_rng(&mut rng, &secret).unwrap();
        assert!(m.validate(&secret));
        assert_eq!(m.tails(&secret), vec![*m.tail()]);

        for i in 0..5u8 {
            m = m.add_first_party_caveat(vec![i; i as usize]);
        }

        let (valid, tails) = m.validate_and_tails(&secret);
        assert!(valid);
        assert_eq!(tails.len(), 6);
        assert_eq!(tails.last(), Some(m.tail()));

        let (valid, tails) = m.validate_and_tails(&[1u8; 32]);
        assert!(!valid);
        assert_eq!(tails.len(), 6);
    }

    #[test]
    fn attenuation_is_not_commutative() {
        let secret = [0u8; 32];
        let m = Macaroon::with_head(&secret, [9u8; HEAD_SIZE]).unwrap();

        let ab = m
            .add_first_party_caveat(b"a".to_vec())
            .add_first_party_caveat(b"b".to_vec());
        let ba = m
            .add_first_party_caveat(b"b".to_vec())
            .add_first_party_caveat(b"a".to_vec());

        assert_eq!(ab.head(), ba.head());
        assert_ne!(ab.tail(), ba.tail());
        assert!(ab.validate(&secret));
        assert!(ba.validate(&secret));
    }

    #[test]
    fn attenuation_leaves_the_parent_alone() {
        let secret = [0u8; 32];
        let m = Macaroon::with_head(&secret, [9u8; HEAD_SIZE]).unwrap();
        let tail = *m.tail();

        let child = m.add_first_party_caveat(b"caveat".to_vec());

        assert_eq!(m.tail(), &tail);
        assert!(m.caveats().is_empty());
        assert_eq!(child.caveats().len(), 1);
    }

    #[test]
    fn serialization() {
        let secret = [0u8; 32];
        let m = Macaroon::with_head(&secret, [5u8; HEAD_SIZE])
            .unwrap()
            .add_first_party_caveat(b"first".to_vec())
            .add_first_party_caveat(Vec::new());

        let serialized = m.serialize();
        let parsed = Macaroon::parse(&serialized).unwrap();
        assert_eq!(parsed, m);
        assert_eq!(parsed.serialize(), serialized);
        assert!(parsed.validate(&secret));
    }

    #[test]
    fn tampering() {
        let secret = [0u8; 32];
        let m = Macaroon::with_head(&secret, [5u8; HEAD_SIZE])
            .unwrap()
            .add_first_party_caveat(b"first".to_vec())
            .add_first_party_caveat(b"second".to_vec());

        // dropping the last caveat while keeping the tail
        let mut truncated = Macaroon::parse(&m.serialize()).unwrap();
        truncated.caveats.pop();
        assert!(!truncated.validate(&secret));

        // the tail of an attenuated key is not a valid tail for its parent
        let parent = Macaroon::with_head(&secret, [5u8; HEAD_SIZE])
            .unwrap()
            .add_first_party_caveat(b"first".to_vec());
        let mut forged = parent.clone();
        forged.tail = *m.tail();
        assert!(!forged.validate(&secret));
    }

    #[test]
    fn short_secret() {
        assert!(matches!(
            Macaroon::new_unrestricted(&[0u8; 16]),
            Err(error::Token::Precondition(_))
        ));
    }
}
