// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response correlation over the fabric.
//!
//! An outbound request has exactly two terminals: the response key or the
//! error key appearing under the requester's namespace. Both waiters are
//! armed before the request record is written, so a backend answering
//! between publish and await cannot be missed. Whichever terminal loses
//! is removed from the dispatcher; the losing record expires by TTL.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use uuid::Uuid;

use crate::connection::Connection;
use crate::error::MufError;
use crate::protocol::{naming, Status, PATH_SEPARATOR, PROTOCOL_ROOT};
use crate::state::StateManager;
use crate::watcher::Watcher;

/// Both sides of the request/response flow.
pub struct Messenger {
    connection: Arc<Connection>,
    watcher: Arc<Watcher>,
    state: StateManager,
}

impl Messenger {
    pub fn new(connection: Arc<Connection>, watcher: Arc<Watcher>, state: StateManager) -> Self {
        Self { connection, watcher, state }
    }

    /// Publish a request and await its terminal.
    ///
    /// The request record carries the caller's timeout as its TTL. The
    /// request key is written under the requester's own namespace; which
    /// backend answers is decided by the listeners' filter choice, not by
    /// the path (`target` names the intended unit for diagnostics).
    pub async fn request(
        &self,
        unit: &str,
        target: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, MufError> {
        let message_id = Uuid::new_v4().to_string();
        let res_path = naming::build_path(unit, Status::Res, &message_id)?;
        let err_path = naming::build_path(unit, Status::Err, &message_id)?;

        // Arm both terminals before the request becomes visible.
        let mut res_rx = self.watcher.dispatcher.add_waiter(&res_path);
        let mut err_rx = self.watcher.dispatcher.add_waiter(&err_path);

        if let Err(e) =
            self.state.send(unit, Status::Req, &message_id, payload, Some(timeout)).await
        {
            self.watcher.dispatcher.remove_waiter(&res_path);
            self.watcher.dispatcher.remove_waiter(&err_path);
            return Err(e);
        }
        tracing::debug!(target, id = %message_id, "request published");

        let timed_out = || MufError::Timeout { target: target.to_owned(), after: timeout };
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        tokio::select! {
            outcome = &mut res_rx => {
                self.watcher.dispatcher.remove_waiter(&err_path);
                match outcome {
                    Ok(_) => {
                        // Empty if the record raced its TTL.
                        let payload = self.connection.get(&res_path).await?;
                        Ok(payload.unwrap_or_else(Bytes::new))
                    }
                    Err(_) => Err(timed_out()),
                }
            }
            outcome = &mut err_rx => {
                self.watcher.dispatcher.remove_waiter(&res_path);
                match outcome {
                    Ok(_) => {
                        let message = self
                            .connection
                            .get(&err_path)
                            .await?
                            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                            .unwrap_or_else(|| "unknown".to_owned());
                        Err(MufError::Remote(message))
                    }
                    Err(_) => Err(timed_out()),
                }
            }
            _ = &mut deadline => {
                self.watcher.dispatcher.remove_waiter(&res_path);
                self.watcher.dispatcher.remove_waiter(&err_path);
                Err(timed_out())
            }
        }
    }

    /// Serve inbound requests.
    ///
    /// Registers one dispatcher handler covering every unit's request
    /// namespace. Each invocation runs in its own task: the stored request
    /// is loaded (a record that already expired is skipped silently) and
    /// the user handler runs with `(sender_unit, message_id, payload)`.
    /// `Some(bytes)` is written back as the response; an error is written
    /// back as the error record, carrying its text.
    pub fn listen<F, Fut>(&self, handler: F) -> Result<(), MufError>
    where
        F: Fn(String, String, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<Bytes>>> + Send + 'static,
    {
        let pattern = format!(
            "{PROTOCOL_ROOT}{PATH_SEPARATOR}*{PATH_SEPARATOR}{}{PATH_SEPARATOR}*",
            Status::Req.as_str()
        );
        let connection = Arc::clone(&self.connection);
        let state = self.state.clone();
        let handler = Arc::new(handler);
        self.watcher.register_handler(&pattern, move |key_path: String| {
            let connection = Arc::clone(&connection);
            let state = state.clone();
            let handler = Arc::clone(&handler);
            async move {
                let Some(parsed) = naming::parse_path(&key_path) else { return };
                if parsed.status != Status::Req {
                    return;
                }
                let payload = match connection.get(&key_path).await {
                    Ok(Some(payload)) => payload,
                    Ok(None) => return,
                    Err(e) => {
                        tracing::debug!(key = %key_path, err = %e, "request read failed");
                        return;
                    }
                };
                match handler(parsed.unit.clone(), parsed.id.clone(), payload).await {
                    Ok(Some(response)) => {
                        if let Err(e) =
                            state.send(&parsed.unit, Status::Res, &parsed.id, response, None).await
                        {
                            tracing::warn!(unit = %parsed.unit, id = %parsed.id, err = %e, "response write failed");
                        }
                    }
                    Ok(None) => {}
                    Err(handler_err) => {
                        let text = Bytes::from(handler_err.to_string().into_bytes());
                        if let Err(e) =
                            state.send(&parsed.unit, Status::Err, &parsed.id, text, None).await
                        {
                            tracing::warn!(unit = %parsed.unit, id = %parsed.id, err = %e, "error write failed");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "messenger_tests.rs"]
mod tests;
