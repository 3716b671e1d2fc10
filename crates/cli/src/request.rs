// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch a single request and print the response.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use muf::MufClient;

use crate::config::StoreArgs;

#[derive(Debug, clap::Args)]
pub struct RequestArgs {
    /// Target unit name.
    pub target: String,

    /// Request payload.
    pub data: String,

    /// Unit name to send as.
    #[arg(long, default_value = "terminal-operator")]
    pub unit: String,

    /// Seconds to wait for a response.
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,
}

pub async fn run(store: StoreArgs, args: RequestArgs) -> anyhow::Result<i32> {
    let config = store.client_config(&args.unit);
    let payload = Bytes::from(args.data.clone().into_bytes());
    let timeout = Duration::from_secs(args.timeout);
    let target = args.target.clone();

    let response: Bytes = MufClient::scoped(config, |client: Arc<MufClient>| async move {
        client.request(&target, payload, timeout).await.map_err(anyhow::Error::from)
    })
    .await?;

    println!("{}", String::from_utf8_lossy(&response));
    Ok(0)
}
