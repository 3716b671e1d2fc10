// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background consumption of keyspace notifications.
//!
//! One pattern subscription covers every fabric path; one receive task per
//! client decodes channels into key paths and feeds the dispatcher.
//! Cancellation ends the loop; anything else is treated as a momentary
//! store fault: log at debug, wait a second, rebuild the subscription.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::connection::Connection;
use crate::dispatcher::{EventDispatcher, KeyEventHandler};
use crate::error::MufError;
use crate::protocol::naming;

const RETRY_DELAY: Duration = Duration::from_secs(1);

struct ReceiveTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the notification subscription and the receive loop.
pub struct Watcher {
    connection: Arc<Connection>,
    pub dispatcher: Arc<EventDispatcher>,
    task: tokio::sync::Mutex<Option<ReceiveTask>>,
}

impl Watcher {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self {
            connection,
            dispatcher: Arc::new(EventDispatcher::new()),
            task: tokio::sync::Mutex::new(None),
        }
    }

    /// Subscribe and launch the receive loop. No-op while already running.
    pub async fn start(&self) -> Result<(), MufError> {
        let mut slot = self.task.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        self.connection.connect().await?;
        let pattern = naming::build_keyspace_pattern("*", "*", "*");
        let mut pubsub = self.connection.pubsub().await?;
        pubsub.psubscribe(&pattern).await.map_err(MufError::from_store)?;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(receive_loop(
            Arc::clone(&self.connection),
            Arc::clone(&self.dispatcher),
            pubsub,
            pattern,
            cancel.clone(),
        ));
        *slot = Some(ReceiveTask { cancel, handle });
        tracing::info!("watcher started");
        Ok(())
    }

    /// Cancel the receive loop and wait for it to unsubscribe and exit.
    /// No-op while stopped.
    pub async fn stop(&self) {
        let task = self.task.lock().await.take();
        let Some(ReceiveTask { cancel, handle }) = task else { return };
        cancel.cancel();
        let _ = handle.await;
        tracing::info!("watcher stopped");
    }

    /// Await the appearance of `path`, up to `timeout`.
    ///
    /// The waiter is in the dispatcher table when this returns, before the
    /// future is first polled; callers may publish after calling and await
    /// later without racing the notification. Returns `false` on timeout
    /// (the waiter is removed) or when the waiter was displaced.
    pub fn wait_for_key(
        &self,
        path: &str,
        timeout: Duration,
    ) -> impl Future<Output = bool> + Send + 'static {
        let normalized = path.to_lowercase();
        let rx = self.dispatcher.add_waiter(&normalized);
        let dispatcher = Arc::clone(&self.dispatcher);
        async move {
            match tokio::time::timeout(timeout, rx).await {
                Ok(Ok(_)) => true,
                Ok(Err(_)) => false,
                Err(_) => {
                    dispatcher.remove_waiter(&normalized);
                    false
                }
            }
        }
    }

    /// Register `handler` for every key matching `pattern`. Re-registering
    /// a pattern replaces its handler.
    pub fn register_handler<F, Fut>(&self, pattern: &str, handler: F) -> Result<(), MufError>
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let run: KeyEventHandler = Arc::new(move |path| Box::pin(handler(path)));
        self.dispatcher.add_handler(pattern, run)
    }
}

enum LoopExit {
    Cancelled,
    Disconnected,
}

async fn receive_loop(
    connection: Arc<Connection>,
    dispatcher: Arc<EventDispatcher>,
    mut pubsub: redis::aio::PubSub,
    pattern: String,
    cancel: CancellationToken,
) {
    loop {
        let exit = {
            let stream = pubsub.on_message();
            tokio::pin!(stream);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break LoopExit::Cancelled,
                    msg = stream.next() => {
                        let Some(msg) = msg else { break LoopExit::Disconnected };
                        let channel: Vec<u8> = msg.get_channel().unwrap_or_default();
                        let key_path = naming::key_from_channel(&channel);
                        if naming::parse_path(&key_path).is_some() {
                            dispatcher.handle_event(&key_path);
                        } else {
                            tracing::trace!(key = %key_path, "ignoring non-fabric notification");
                        }
                    }
                }
            }
        };

        match exit {
            LoopExit::Cancelled => {
                let _ = pubsub.punsubscribe(&pattern).await;
                return;
            }
            LoopExit::Disconnected => {
                tracing::debug!("notification stream lost, resubscribing in {RETRY_DELAY:?}");
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
                match resubscribe(&connection, &pattern).await {
                    Ok(fresh) => pubsub = fresh,
                    Err(e) => tracing::debug!(err = %e, "resubscribe failed, will retry"),
                }
            }
        }
    }
}

async fn resubscribe(
    connection: &Connection,
    pattern: &str,
) -> Result<redis::aio::PubSub, MufError> {
    let mut pubsub = connection.pubsub().await?;
    pubsub.psubscribe(pattern).await.map_err(MufError::from_store)?;
    Ok(pubsub)
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
