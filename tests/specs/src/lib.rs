// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harness for end-to-end fabric scenarios against a live store.
//!
//! The scenarios only run when `MUF_SPECS_REDIS_HOST` points at a store;
//! without it each test prints a skip notice and passes. The store must
//! allow `CONFIG SET` so the harness can enable keyspace notifications.

use muf::MufConfig;

/// Env var naming the store host for the spec run.
pub const ENV_SPECS_HOST: &str = "MUF_SPECS_REDIS_HOST";
/// Optional port override, default 6379.
pub const ENV_SPECS_PORT: &str = "MUF_SPECS_REDIS_PORT";

/// Configuration for `unit` against the spec store, or `None` when no
/// store is configured for this run.
pub fn spec_config(unit: &str) -> Option<MufConfig> {
    let host = std::env::var(ENV_SPECS_HOST).ok()?;
    let port = std::env::var(ENV_SPECS_PORT).ok().and_then(|p| p.parse().ok()).unwrap_or(6379);
    let mut config = MufConfig::new(unit);
    config.host = host;
    config.port = port;
    Some(config)
}

/// Turn on keyspace notifications for the spec store.
pub async fn enable_keyspace_events(config: &MufConfig) -> anyhow::Result<()> {
    let client = redis::Client::open((config.host.as_str(), config.port))?;
    let mut conn = client.get_multiplexed_async_connection().await?;
    let _: () = redis::cmd("CONFIG")
        .arg("SET")
        .arg("notify-keyspace-events")
        .arg("KEA")
        .query_async(&mut conn)
        .await?;
    Ok(())
}

/// A fresh message id so concurrent spec runs cannot collide.
pub fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}
