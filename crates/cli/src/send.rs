// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot write to a fabric path, with the status-derived TTL.

use std::time::Duration;

use muf::connection::Connection;
use muf::protocol::naming::{self, ParsedPath};

use crate::config::StoreArgs;

#[derive(Debug, clap::Args)]
pub struct SendArgs {
    /// Destination path (muf/<unit>/<status>/<id>).
    pub path: String,

    /// Payload to write.
    pub data: String,

    /// TTL override in seconds. Defaults by status.
    #[arg(long)]
    pub ttl: Option<u64>,
}

pub async fn run(store: StoreArgs, args: SendArgs) -> anyhow::Result<i32> {
    let (path, ttl) = resolve(&args)?;
    let connection = Connection::new(store.settings());
    connection.set_ex(&path, args.data.as_bytes(), ttl).await?;
    println!("posted {path} (ttl {}s)", ttl.as_secs());
    Ok(0)
}

/// Normalize the destination and pick the record lifetime.
fn resolve(args: &SendArgs) -> anyhow::Result<(String, Duration)> {
    let Some(ParsedPath { unit, status, id }) = naming::parse_path(&args.path) else {
        anyhow::bail!("path {:?} does not follow muf/<unit>/<status>/<id>", args.path);
    };
    let path = naming::build_path(&unit, status, &id)?;
    let ttl = args.ttl.map(Duration::from_secs).unwrap_or_else(|| status.default_ttl());
    Ok((path, ttl))
}

#[cfg(test)]
#[path = "send_tests.rs"]
mod tests;
