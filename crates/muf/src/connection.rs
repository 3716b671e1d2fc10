// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store session management and the raw key/value operations.
//!
//! The session is opened lazily: `get` and `set_ex` connect on first use,
//! `connect` is a re-entrant no-op. Payloads are opaque bytes end to end;
//! nothing here decodes them.

use bytes::Bytes;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::MufError;

/// Resolved addressing for the store.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// An addressed store connection with a lazily-opened session.
pub struct Connection {
    settings: ConnectionSettings,
    session: Mutex<Option<MultiplexedConnection>>,
}

impl Connection {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings, session: Mutex::new(None) }
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.settings.host.clone(), self.settings.port),
            redis: RedisConnectionInfo {
                db: self.settings.db,
                username: self.settings.username.clone(),
                password: self.settings.password.clone(),
                ..Default::default()
            },
        }
    }

    fn client(&self) -> Result<redis::Client, MufError> {
        redis::Client::open(self.connection_info()).map_err(MufError::from_store)
    }

    /// Open the session if it is not already open. Credentials are
    /// verified by the store here.
    pub async fn connect(&self) -> Result<(), MufError> {
        let mut session = self.session.lock().await;
        if session.is_none() {
            *session = Some(self.open_session().await?);
        }
        Ok(())
    }

    /// Close the session. Safe to call when already closed.
    pub async fn disconnect(&self) {
        self.session.lock().await.take();
    }

    async fn open_session(&self) -> Result<MultiplexedConnection, MufError> {
        self.client()?
            .get_multiplexed_async_connection()
            .await
            .map_err(MufError::from_store)
    }

    async fn command_session(&self) -> Result<MultiplexedConnection, MufError> {
        let mut session = self.session.lock().await;
        if let Some(conn) = session.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.open_session().await?;
        *session = Some(conn.clone());
        Ok(conn)
    }

    /// Read the payload stored at `key`, or `None` when absent or expired.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>, MufError> {
        let mut conn = self.command_session().await?;
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(MufError::from_store)?;
        Ok(value.map(Bytes::from))
    }

    /// Write `payload` at `key` with the given lifetime. The store does
    /// not accept a zero expiry, so sub-second lifetimes round up.
    pub async fn set_ex(&self, key: &str, payload: &[u8], ttl: Duration) -> Result<(), MufError> {
        let mut conn = self.command_session().await?;
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, payload, seconds).await.map_err(MufError::from_store)
    }

    /// Obtain a fresh subscription handle on its own connection.
    pub async fn pubsub(&self) -> Result<redis::aio::PubSub, MufError> {
        self.client()?.get_async_pubsub().await.map_err(MufError::from_store)
    }
}
