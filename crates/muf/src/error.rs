// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::time::Duration;

/// Errors surfaced by the fabric client.
///
/// Internal paths (the receive loop, the dispatcher, handler adapters)
/// confine their failures to their own task; only user-facing operations
/// return these.
#[derive(Debug)]
pub enum MufError {
    /// The store rejected the supplied credentials. Fatal; never retried.
    AuthFailed(String),
    /// A transport or protocol failure talking to the store.
    Store(redis::RedisError),
    /// A path segment was empty or contained the separator.
    InvalidPath(String),
    /// A handler pattern failed to compile.
    InvalidPattern(String),
    /// An unknown status token.
    InvalidStatus(String),
    /// A request saw neither a response nor an error within the deadline.
    Timeout { target: String, after: Duration },
    /// The remote handler reported an error; carries the stored text.
    Remote(String),
}

impl MufError {
    pub(crate) fn from_store(err: redis::RedisError) -> Self {
        if err.kind() == redis::ErrorKind::AuthenticationFailed {
            Self::AuthFailed(err.to_string())
        } else {
            Self::Store(err)
        }
    }
}

impl fmt::Display for MufError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthFailed(detail) => write!(f, "store rejected credentials: {detail}"),
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::InvalidPath(detail) => write!(f, "invalid path: {detail}"),
            Self::InvalidPattern(detail) => write!(f, "invalid pattern: {detail}"),
            Self::InvalidStatus(token) => write!(f, "unknown status token {token:?}"),
            Self::Timeout { target, after } => {
                write!(f, "request to {target} timed out after {:.1}s", after.as_secs_f64())
            }
            Self::Remote(message) => write!(f, "remote unit reported error: {message}"),
        }
    }
}

impl std::error::Error for MufError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<redis::RedisError> for MufError {
    fn from(err: redis::RedisError) -> Self {
        Self::from_store(err)
    }
}
