// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol constants: the path root, status tokens, and TTL policy.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::MufError;

pub mod naming;

/// Fixed first segment of every fabric key.
pub const PROTOCOL_ROOT: &str = "muf";

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';

/// Channel prefix the store puts in front of the key name when it emits a
/// keyspace notification.
pub const KEYSPACE_PREFIX: &str = "__keyspace@0__:";

/// Role of a record, rendered as the third path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// A request awaiting handling.
    Req,
    /// A normal completion.
    Res,
    /// An abnormal completion.
    Err,
    /// Long-lived shared state.
    Keep,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Req => "req",
            Self::Res => "res",
            Self::Err => "err",
            Self::Keep => "keep",
        }
    }

    /// Default record lifetime for this status.
    ///
    /// Requests only need to survive until a backend picks them up;
    /// responses and errors until the requester collects them; keep
    /// records hold session state for a day.
    pub fn default_ttl(&self) -> Duration {
        match self {
            Self::Req => Duration::from_secs(10),
            Self::Res => Duration::from_secs(30),
            Self::Err => Duration::from_secs(30),
            Self::Keep => Duration::from_secs(86_400),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = MufError;

    fn from_str(s: &str) -> Result<Self, MufError> {
        match s.to_lowercase().as_str() {
            "req" => Ok(Self::Req),
            "res" => Ok(Self::Res),
            "err" => Ok(Self::Err),
            "keep" => Ok(Self::Keep),
            other => Err(MufError::InvalidStatus(other.to_owned())),
        }
    }
}
