// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The client facade: one unit's handle on the fabric.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::config::MufConfig;
use crate::connection::Connection;
use crate::error::MufError;
use crate::messenger::Messenger;
use crate::protocol::Status;
use crate::state::StateManager;
use crate::watcher::Watcher;

/// A named participant on the fabric.
///
/// Created idle; [`start`](Self::start) opens the store session and the
/// notification loop, [`stop`](Self::stop) tears both down. Both are
/// idempotent.
pub struct MufClient {
    unit_name: String,
    connection: Arc<Connection>,
    watcher: Arc<Watcher>,
    state: StateManager,
    messenger: Messenger,
    running: AtomicBool,
}

impl MufClient {
    /// Build a client from `config`. The unit name is lowercased here;
    /// credentials fall back to the environment when not given.
    pub fn new(config: MufConfig) -> Self {
        let unit_name = config.unit_name.to_lowercase();
        let connection = Arc::new(Connection::new(config.settings()));
        let watcher = Arc::new(Watcher::new(Arc::clone(&connection)));
        let state = StateManager::new(Arc::clone(&connection), Arc::clone(&watcher));
        let messenger =
            Messenger::new(Arc::clone(&connection), Arc::clone(&watcher), state.clone());
        Self { unit_name, connection, watcher, state, messenger, running: AtomicBool::new(false) }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn watcher(&self) -> &Arc<Watcher> {
        &self.watcher
    }

    /// Connect and launch the notification loop. Credentials are verified
    /// by the store here.
    pub async fn start(&self) -> Result<(), MufError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Err(e) = self.try_start().await {
            self.running.store(false, Ordering::SeqCst);
            return Err(e);
        }
        tracing::info!(unit = %self.unit_name, "client started");
        Ok(())
    }

    async fn try_start(&self) -> Result<(), MufError> {
        self.connection.connect().await?;
        self.watcher.start().await
    }

    /// Stop the notification loop and close the session.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.watcher.stop().await;
        self.connection.disconnect().await;
        tracing::info!(unit = %self.unit_name, "client stopped");
    }

    /// Run `body` against a started client, stopping it afterwards
    /// whether or not the body succeeded.
    pub async fn scoped<T, E, F, Fut>(config: MufConfig, body: F) -> Result<T, E>
    where
        E: From<MufError>,
        F: FnOnce(Arc<MufClient>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let client = Arc::new(MufClient::new(config));
        client.start().await?;
        let result = body(Arc::clone(&client)).await;
        client.stop().await;
        result
    }

    /// Publish `payload` under this unit's namespace; returns the path
    /// written.
    pub async fn send(
        &self,
        status: Status,
        message_id: &str,
        payload: Bytes,
        ttl: Option<Duration>,
    ) -> Result<String, MufError> {
        self.state.send(&self.unit_name, status, message_id, payload, ttl).await
    }

    /// Dispatch a request and await the response payload.
    pub async fn request(
        &self,
        target_unit: &str,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, MufError> {
        self.messenger.request(&self.unit_name, target_unit, payload, timeout).await
    }

    /// Serve inbound requests with `handler`; see [`Messenger::listen`].
    pub fn listen<F, Fut>(&self, handler: F) -> Result<(), MufError>
    where
        F: Fn(String, String, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<Bytes>>> + Send + 'static,
    {
        self.messenger.listen(handler)
    }

    /// Read another unit's state record once.
    pub async fn get_state(
        &self,
        target_unit: &str,
        message_id: &str,
        status: Status,
    ) -> Result<Option<Bytes>, MufError> {
        self.state.get_state(target_unit, message_id, status).await
    }

    /// Observe another unit's state changes; see
    /// [`StateManager::watch_state`].
    pub fn watch_state<F, Fut>(
        &self,
        target_unit: &str,
        message_id: &str,
        status: Status,
        handler: F,
    ) -> Result<(), MufError>
    where
        F: Fn(String, String, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.state.watch_state(target_unit, message_id, status, handler)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
