use objstore_auth::crypto::Tail;
use objstore_auth::error;
use objstore_auth::*;

use rand::{prelude::StdRng, SeedableRng};
use std::collections::HashSet;
use std::time::{Duration, SystemTime};

const SECRET: [u8; 32] = [0u8; 32];

fn test_key() -> ApiKey {
    let mut rng: StdRng = SeedableRng::seed_from_u64(1234);
    let root = ApiKey::new_with_rng(&mut rng, &SECRET).unwrap();
    root.restrict(&Caveat {
        allowed_paths: vec![CaveatPath::new("a-test-bucket", "a-test-path")],
        ..Caveat::default()
    })
    .unwrap()
}

#[test]
fn mint_attenuate_check() {
    let key: ApiKey = test_key().serialize().parse().unwrap();

    let read = Action::now(ActionType::Read)
        .bucket("a-test-bucket")
        .encrypted_path("a-test-path/x");
    assert_eq!(key.check(&SECRET, ApiKeyVersion::MIN, &read, None), Ok(()));

    let other = Action::now(ActionType::Read)
        .bucket("other")
        .encrypted_path("a-test-path");
    assert_eq!(
        key.check(&SECRET, ApiKeyVersion::MIN, &other, None),
        Err(error::Token::Unauthorized(
            error::Unauthorized::CaveatDenied { caveat: 0 }
        ))
    );

    // listing buckets is allowed by path restrictions
    let list_buckets = Action::now(ActionType::Read);
    assert_eq!(key.check(&SECRET, ApiKeyVersion::MIN, &list_buckets, None), Ok(()));

    assert_eq!(
        key.check(&[1u8; 32], ApiKeyVersion::MIN, &read, None),
        Err(error::Token::Invalid)
    );
}

#[test]
fn object_lock_version() {
    let key = ApiKey::new(&SECRET).unwrap();
    let action = Action::now(ActionType::PutObjectRetention);

    assert_eq!(
        key.check(&SECRET, ApiKeyVersion::MIN, &action, None),
        Err(error::Token::Unauthorized(
            error::Unauthorized::VersionDenied(ActionType::PutObjectRetention)
        ))
    );
    assert_eq!(
        key.check(&SECRET, ApiKeyVersion::OBJECT_LOCK, &action, None),
        Ok(())
    );

    // regular operations do not need the capability
    let read = Action::now(ActionType::Read);
    assert_eq!(key.check(&SECRET, ApiKeyVersion::MIN, &read, None), Ok(()));
}

#[test]
fn revocation() {
    let m = ApiKey::new(&SECRET).unwrap();
    let restricted = m
        .restrict(&Caveat {
            disallow_deletes: true,
            ..Caveat::default()
        })
        .unwrap();
    let parsed = ApiKey::parse(&restricted.serialize()).unwrap();
    let action = Action::now(ActionType::Read);

    let revoked_tail = *m.tail();
    let oracle = move |tails: &[Tail]| -> Result<bool, RevokerError> {
        Ok(tails.contains(&revoked_tail))
    };
    assert_eq!(
        parsed.check(&SECRET, ApiKeyVersion::MIN, &action, Some(&oracle)),
        Err(error::Token::Revoked(error::Revocation::Revoked))
    );

    // revoking the attenuated key leaves its parent alone
    let mut revoked = HashSet::new();
    revoked.insert(*parsed.tail());
    assert_eq!(
        m.check(&SECRET, ApiKeyVersion::MIN, &action, Some(&revoked)),
        Ok(())
    );
    assert!(parsed
        .check(&SECRET, ApiKeyVersion::MIN, &action, Some(&revoked))
        .is_err());

    let failing = |_: &[Tail]| -> Result<bool, RevokerError> { Err("oracle is down".into()) };
    assert_eq!(
        parsed.check(&SECRET, ApiKeyVersion::MIN, &action, Some(&failing)),
        Err(error::Token::Revoked(error::Revocation::Oracle(
            "oracle is down".to_string()
        )))
    );
}

#[test]
fn check_order() {
    let key = ApiKey::new(&SECRET)
        .unwrap()
        .restrict(&Caveat {
            disallow_reads: true,
            ..Caveat::default()
        })
        .unwrap();
    let always_revoked = |_: &[Tail]| -> Result<bool, RevokerError> { Ok(true) };

    // signature first
    let read = Action::now(ActionType::Read)
        .bucket("bucket")
        .encrypted_path("file");
    assert_eq!(
        key.check(&[7u8; 32], ApiKeyVersion::MIN, &read, Some(&always_revoked)),
        Err(error::Token::Invalid)
    );

    // then the action timestamp
    let untimed = Action {
        time: None,
        ..Action::now(ActionType::Write)
    };
    assert!(matches!(
        key.check(&SECRET, ApiKeyVersion::MIN, &untimed, Some(&always_revoked)),
        Err(error::Token::Precondition(_))
    ));

    // caveats before revocation
    assert_eq!(
        key.check(&SECRET, ApiKeyVersion::MIN, &read, Some(&always_revoked)),
        Err(error::Token::Unauthorized(
            error::Unauthorized::CaveatDenied { caveat: 0 }
        ))
    );

    let write = Action::now(ActionType::Write);
    assert_eq!(
        key.check(&SECRET, ApiKeyVersion::MIN, &write, Some(&always_revoked)),
        Err(error::Token::Revoked(error::Revocation::Revoked))
    );
}

#[test]
fn expiration() {
    let now = SystemTime::now();
    let key = ApiKey::new(&SECRET)
        .unwrap()
        .restrict(&Caveat {
            not_after: Some(now + Duration::from_secs(3600)),
            ..Caveat::default()
        })
        .unwrap();

    let before = Action::new(ActionType::List, now);
    assert_eq!(key.check(&SECRET, ApiKeyVersion::MIN, &before, None), Ok(()));

    let after = Action::new(ActionType::List, now + Duration::from_secs(7200));
    assert_eq!(
        key.check(&SECRET, ApiKeyVersion::MIN, &after, None),
        Err(error::Token::Unauthorized(
            error::Unauthorized::CaveatDenied { caveat: 0 }
        ))
    );
}

#[test]
fn allowed_buckets_and_ttl() {
    let key = ApiKey::new(&SECRET)
        .unwrap()
        .restrict(&Caveat {
            allowed_paths: vec![CaveatPath::new("b1", ""), CaveatPath::new("b2", "")],
            max_object_ttl: Some(Duration::from_secs(600)),
            ..Caveat::default()
        })
        .unwrap()
        .restrict(&Caveat {
            allowed_paths: vec![CaveatPath::new("b1", ""), CaveatPath::new("b3", "")],
            max_object_ttl: Some(Duration::from_secs(60)),
            ..Caveat::default()
        })
        .unwrap()
        .restrict(&Caveat::new().with_nonce())
        .unwrap();

    let allowed = key
        .get_allowed_buckets(&Action::now(ActionType::Read))
        .unwrap();
    assert!(!allowed.all);
    assert_eq!(
        allowed.buckets.into_iter().collect::<Vec<_>>(),
        vec![b"b1".to_vec()]
    );

    assert_eq!(
        key.get_max_object_ttl().unwrap(),
        Some(Duration::from_secs(60))
    );
    assert_eq!(key.caveats().unwrap().len(), 3);
}
