// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Policy layer over the connection and watcher: normalized writes,
//! point reads, and live observation of state changes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::connection::Connection;
use crate::error::MufError;
use crate::protocol::{naming, Status};
use crate::watcher::Watcher;

/// Reads and writes records under the canonical path shape, with the
/// per-status TTL policy applied.
#[derive(Clone)]
pub struct StateManager {
    connection: Arc<Connection>,
    watcher: Arc<Watcher>,
}

impl StateManager {
    pub fn new(connection: Arc<Connection>, watcher: Arc<Watcher>) -> Self {
        Self { connection, watcher }
    }

    /// Publish `payload` under `unit`'s namespace and return the path
    /// written. Without an explicit `ttl` the status default applies.
    pub async fn send(
        &self,
        unit: &str,
        status: Status,
        id: &str,
        payload: Bytes,
        ttl: Option<Duration>,
    ) -> Result<String, MufError> {
        let ttl = ttl.unwrap_or_else(|| status.default_ttl());
        let path = naming::build_path(unit, status, id)?;
        self.connection.set_ex(&path, payload.as_ref(), ttl).await?;
        tracing::trace!(%path, ttl_secs = ttl.as_secs(), "record published");
        Ok(path)
    }

    /// Read one record, `None` when absent or expired.
    pub async fn get_state(
        &self,
        unit: &str,
        id: &str,
        status: Status,
    ) -> Result<Option<Bytes>, MufError> {
        let path = naming::build_path(unit, status, id)?;
        self.connection.get(&path).await
    }

    /// Observe live changes to a path. The path doubles as a dispatch
    /// pattern, so `*` and `?` are honored in the unit and id segments.
    /// On every matching write the stored payload is loaded and `handler`
    /// runs with `(sender_unit, message_id, payload)`.
    pub fn watch_state<F, Fut>(
        &self,
        unit: &str,
        id: &str,
        status: Status,
        handler: F,
    ) -> Result<(), MufError>
    where
        F: Fn(String, String, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let pattern = naming::build_path(unit, status, id)?;
        let connection = Arc::clone(&self.connection);
        let handler = Arc::new(handler);
        self.watcher.register_handler(&pattern, move |key_path: String| {
            let connection = Arc::clone(&connection);
            let handler = Arc::clone(&handler);
            async move {
                let Some(parsed) = naming::parse_path(&key_path) else { return };
                let payload = match connection.get(&key_path).await {
                    Ok(Some(payload)) => payload,
                    Ok(None) => return,
                    Err(e) => {
                        tracing::debug!(key = %key_path, err = %e, "state read failed");
                        return;
                    }
                };
                handler(parsed.unit, parsed.id, payload).await;
            }
        })
    }
}
