use crate::error;

use std::convert::TryFrom;
use std::fmt;
use std::time::SystemTime;

/// the operation an [`Action`] asks authorization for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ActionType {
    Read = 1,
    Write = 2,
    List = 3,
    Delete = 4,
    ProjectInfo = 5,
    Lock = 6,
    PutObjectRetention = 7,
    GetObjectRetention = 8,
    PutObjectLegalHold = 9,
    GetObjectLegalHold = 10,
    BypassGovernanceRetention = 11,
    PutBucketObjectLockConfiguration = 12,
    GetBucketObjectLockConfiguration = 13,
}

impl ActionType {
    /// object lock operations are only available to keys whose version
    /// carries the object lock bit
    pub fn is_object_lock_op(&self) -> bool {
        !matches!(
            self,
            ActionType::Read
                | ActionType::Write
                | ActionType::List
                | ActionType::Delete
                | ActionType::ProjectInfo
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Read => "read",
            ActionType::Write => "write",
            ActionType::List => "list",
            ActionType::Delete => "delete",
            ActionType::ProjectInfo => "project-info",
            ActionType::Lock => "lock",
            ActionType::PutObjectRetention => "put-retention",
            ActionType::GetObjectRetention => "get-retention",
            ActionType::PutObjectLegalHold => "put-legal-hold",
            ActionType::GetObjectLegalHold => "get-legal-hold",
            ActionType::BypassGovernanceRetention => "bypass-governance-retention",
            ActionType::PutBucketObjectLockConfiguration => {
                "put-bucket-object-lock-configuration"
            }
            ActionType::GetBucketObjectLockConfiguration => {
                "get-bucket-object-lock-configuration"
            }
        }
    }
}

impl TryFrom<u8> for ActionType {
    type Error = error::Format;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => ActionType::Read,
            2 => ActionType::Write,
            3 => ActionType::List,
            4 => ActionType::Delete,
            5 => ActionType::ProjectInfo,
            6 => ActionType::Lock,
            7 => ActionType::PutObjectRetention,
            8 => ActionType::GetObjectRetention,
            9 => ActionType::PutObjectLegalHold,
            10 => ActionType::GetObjectLegalHold,
            11 => ActionType::BypassGovernanceRetention,
            12 => ActionType::PutBucketObjectLockConfiguration,
            13 => ActionType::GetBucketObjectLockConfiguration,
            other => return Err(error::Format::UnknownAction(other)),
        })
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// a request to be authorized by [`ApiKey::check`](crate::ApiKey::check)
///
/// `bucket` and `encrypted_path` may be empty. An action without a time
/// cannot be checked.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Action {
    pub op: ActionType,
    pub bucket: Vec<u8>,
    pub encrypted_path: Vec<u8>,
    pub time: Option<SystemTime>,
}

impl Action {
    pub fn new(op: ActionType, time: SystemTime) -> Self {
        Action {
            op,
            bucket: Vec::new(),
            encrypted_path: Vec::new(),
            time: Some(time),
        }
    }

    /// creates an action at the current time
    pub fn now(op: ActionType) -> Self {
        Self::new(op, SystemTime::now())
    }

    pub fn bucket<T: Into<Vec<u8>>>(mut self, bucket: T) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn encrypted_path<T: Into<Vec<u8>>>(mut self, path: T) -> Self {
        self.encrypted_path = path.into();
        self
    }
}
