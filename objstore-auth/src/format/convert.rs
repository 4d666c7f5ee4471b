//! conversion functions between the Protobuf schema and the caveat type
use super::schema;
use crate::error;
use crate::token::{Caveat, CaveatPath};

use std::convert::TryFrom;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NANOS_PER_SECOND: u32 = 1_000_000_000;

pub fn caveat_to_proto_caveat(input: &Caveat) -> schema::Caveat {
    schema::Caveat {
        disallow_reads: input.disallow_reads,
        disallow_writes: input.disallow_writes,
        disallow_lists: input.disallow_lists,
        disallow_deletes: input.disallow_deletes,
        allowed_paths: input
            .allowed_paths
            .iter()
            .map(|p| schema::caveat::Path {
                bucket: p.bucket.clone(),
                encrypted_path_prefix: p.encrypted_path_prefix.clone(),
            })
            .collect(),
        not_after: input.not_after.map(system_time_to_proto),
        not_before: input.not_before.map(system_time_to_proto),
        nonce: input.nonce.clone(),
        max_object_ttl: input.max_object_ttl.map(duration_to_proto),
        disallow_locks: input.disallow_locks,
        disallow_put_retention: input.disallow_put_retention,
        disallow_get_retention: input.disallow_get_retention,
        disallow_put_legal_hold: input.disallow_put_legal_hold,
        disallow_get_legal_hold: input.disallow_get_legal_hold,
        disallow_bypass_governance_retention: input.disallow_bypass_governance_retention,
        disallow_put_bucket_object_lock_configuration: input
            .disallow_put_bucket_object_lock_configuration,
        disallow_get_bucket_object_lock_configuration: input
            .disallow_get_bucket_object_lock_configuration,
    }
}

pub fn proto_caveat_to_caveat(input: schema::Caveat) -> Result<Caveat, error::Format> {
    Ok(Caveat {
        disallow_reads: input.disallow_reads,
        disallow_writes: input.disallow_writes,
        disallow_lists: input.disallow_lists,
        disallow_deletes: input.disallow_deletes,
        disallow_locks: input.disallow_locks,
        disallow_put_retention: input.disallow_put_retention,
        disallow_get_retention: input.disallow_get_retention,
        disallow_put_legal_hold: input.disallow_put_legal_hold,
        disallow_get_legal_hold: input.disallow_get_legal_hold,
        disallow_bypass_governance_retention: input.disallow_bypass_governance_retention,
        disallow_put_bucket_object_lock_configuration: input
            .disallow_put_bucket_object_lock_configuration,
        disallow_get_bucket_object_lock_configuration: input
            .disallow_get_bucket_object_lock_configuration,
        allowed_paths: input
            .allowed_paths
            .into_iter()
            .map(|p| CaveatPath {
                bucket: p.bucket,
                encrypted_path_prefix: p.encrypted_path_prefix,
            })
            .collect(),
        not_after: input.not_after.as_ref().map(proto_to_system_time).transpose()?,
        not_before: input
            .not_before
            .as_ref()
            .map(proto_to_system_time)
            .transpose()?,
        nonce: input.nonce,
        max_object_ttl: input
            .max_object_ttl
            .as_ref()
            .map(proto_to_duration)
            .transpose()?,
    })
}

pub fn system_time_to_proto(time: SystemTime) -> prost_types::Timestamp {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => prost_types::Timestamp {
            seconds: d.as_secs() as i64,
            nanos: d.subsec_nanos() as i32,
        },
        Err(e) => {
            let d = e.duration();
            let mut seconds = -(d.as_secs() as i64);
            let mut nanos = d.subsec_nanos();
            if nanos > 0 {
                seconds -= 1;
                nanos = NANOS_PER_SECOND - nanos;
            }
            prost_types::Timestamp {
                seconds,
                nanos: nanos as i32,
            }
        }
    }
}

pub fn proto_to_system_time(ts: &prost_types::Timestamp) -> Result<SystemTime, error::Format> {
    let invalid = || {
        error::Format::CaveatDeserialization(format!(
            "invalid timestamp: {}s {}ns",
            ts.seconds, ts.nanos
        ))
    };

    let nanos = u32::try_from(ts.nanos)
        .ok()
        .filter(|n| *n < NANOS_PER_SECOND)
        .ok_or_else(invalid)?;

    let time = if ts.seconds >= 0 {
        UNIX_EPOCH.checked_add(Duration::new(ts.seconds as u64, nanos))
    } else {
        UNIX_EPOCH
            .checked_sub(Duration::from_secs(ts.seconds.unsigned_abs()))
            .and_then(|t| t.checked_add(Duration::from_nanos(nanos as u64)))
    };

    time.ok_or_else(invalid)
}

pub fn duration_to_proto(d: Duration) -> prost_types::Duration {
    prost_types::Duration {
        seconds: d.as_secs() as i64,
        nanos: d.subsec_nanos() as i32,
    }
}

pub fn proto_to_duration(d: &prost_types::Duration) -> Result<Duration, error::Format> {
    match (u64::try_from(d.seconds), u32::try_from(d.nanos)) {
        (Ok(seconds), Ok(nanos)) if nanos < NANOS_PER_SECOND => Ok(Duration::new(seconds, nanos)),
        _ => Err(error::Format::CaveatDeserialization(format!(
            "invalid duration: {}s {}ns",
            d.seconds, d.nanos
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps() {
        let times = [
            UNIX_EPOCH,
            UNIX_EPOCH + Duration::new(1_600_000_000, 123),
            UNIX_EPOCH - Duration::new(10, 500),
            UNIX_EPOCH - Duration::from_secs(3),
        ];

        for t in times.iter() {
            let proto = system_time_to_proto(*t);
            assert!(proto.nanos >= 0);
            assert_eq!(proto_to_system_time(&proto).unwrap(), *t);
        }

        let before_epoch = system_time_to_proto(UNIX_EPOCH - Duration::new(10, 500));
        assert_eq!(before_epoch.seconds, -11);
        assert_eq!(before_epoch.nanos, 999_999_500);

        assert!(proto_to_system_time(&prost_types::Timestamp {
            seconds: 0,
            nanos: -1
        })
        .is_err());
    }

    #[test]
    fn durations() {
        let d = Duration::new(3600, 7);
        assert_eq!(proto_to_duration(&duration_to_proto(d)).unwrap(), d);
        assert!(proto_to_duration(&prost_types::Duration {
            seconds: -5,
            nanos: 0
        })
        .is_err());
    }
}
