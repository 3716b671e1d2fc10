// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of decoded key events to waiters and pattern handlers.
//!
//! Two tables, both keyed by lowercased strings: exact-path waiters
//! (single-fire, one per path) and wildcard-pattern handlers (live until
//! replaced). Table mutations never suspend, and the lock is released
//! before any handler code runs.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::MufError;

/// Async callback invoked with the concrete key path that matched.
pub type KeyEventHandler = Arc<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>;

// `*` stays within one path segment; `?` matches a single character.
const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

struct HandlerEntry {
    pattern: glob::Pattern,
    run: KeyEventHandler,
}

#[derive(Default)]
struct Tables {
    waiters: HashMap<String, oneshot::Sender<String>>,
    handlers: HashMap<String, HandlerEntry>,
}

/// Routing table shared between the watcher and the operations that wait
/// on or observe keys.
#[derive(Default)]
pub struct EventDispatcher {
    tables: Mutex<Tables>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single-fire completion for an exact path.
    ///
    /// Re-registering the same path displaces the previous waiter; its
    /// receiver resolves to an error.
    pub fn add_waiter(&self, path: &str) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        self.tables.lock().waiters.insert(path.to_lowercase(), tx);
        rx
    }

    /// Drop the waiter for `path`, if any. Idempotent.
    pub fn remove_waiter(&self, path: &str) {
        self.tables.lock().waiters.remove(&path.to_lowercase());
    }

    /// True while a waiter is registered for `path`.
    pub fn has_waiter(&self, path: &str) -> bool {
        self.tables.lock().waiters.contains_key(&path.to_lowercase())
    }

    pub fn waiter_count(&self) -> usize {
        self.tables.lock().waiters.len()
    }

    /// Register `handler` for every key matching `pattern`.
    ///
    /// Registering the same pattern again replaces the prior binding; a
    /// later event invokes the handler once per matching pattern.
    pub fn add_handler(&self, pattern: &str, handler: KeyEventHandler) -> Result<(), MufError> {
        let normalized = pattern.to_lowercase();
        let compiled = glob::Pattern::new(&normalized)
            .map_err(|e| MufError::InvalidPattern(format!("{normalized}: {e}")))?;
        self.tables
            .lock()
            .handlers
            .insert(normalized, HandlerEntry { pattern: compiled, run: handler });
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.tables.lock().handlers.len()
    }

    /// Route one decoded key event.
    ///
    /// Pops and completes the exact-path waiter if present (a completion
    /// whose receiver is gone is discarded silently), then spawns one task
    /// per matching handler pattern. Never blocks the caller.
    pub fn handle_event(&self, key_path: &str) {
        let path = key_path.to_lowercase();
        let (waiter, matched) = {
            let mut tables = self.tables.lock();
            let waiter = tables.waiters.remove(&path);
            let matched: Vec<KeyEventHandler> = tables
                .handlers
                .values()
                .filter(|entry| entry.pattern.matches_with(&path, MATCH_OPTIONS))
                .map(|entry| Arc::clone(&entry.run))
                .collect();
            (waiter, matched)
        };

        if let Some(tx) = waiter {
            let _ = tx.send(path.clone());
        }
        for run in matched {
            tokio::spawn(run(path.clone()));
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
