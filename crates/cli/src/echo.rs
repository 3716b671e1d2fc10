// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The echo unit: answers every request on the fabric with its payload.

use bytes::Bytes;
use tracing::info;

use muf::MufClient;

use crate::config::StoreArgs;

#[derive(Debug, clap::Args)]
pub struct EchoArgs {
    /// Unit name to serve under.
    #[arg(long, default_value = "echo-unit")]
    pub unit: String,
}

pub async fn run(store: StoreArgs, args: EchoArgs) -> anyhow::Result<i32> {
    let client = MufClient::new(store.client_config(&args.unit));
    client.start().await?;

    client.listen(|sender, message_id, payload| async move {
        let text = String::from_utf8_lossy(&payload).into_owned();
        info!(%sender, id = %message_id, %text, "echo request");
        Ok(Some(Bytes::from(format!("Echo: {text}"))))
    })?;

    info!(unit = %client.unit_name(), "echo unit ready");
    tokio::signal::ctrl_c().await?;
    info!("echo unit shutting down");
    client.stop().await;
    Ok(0)
}
