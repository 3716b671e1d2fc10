// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in system check: state round-trip, request/response against an
//! echo responder, and a state-watch notification.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::info;

use muf::{MufClient, MufError, Status};

use crate::config::StoreArgs;

#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Unit name to check as.
    #[arg(long, default_value = "check-unit")]
    pub unit: String,

    /// Unit expected to answer the echo step.
    #[arg(long, default_value = "echo-unit")]
    pub target: String,
}

pub async fn run(store: StoreArgs, args: CheckArgs) -> anyhow::Result<i32> {
    let config = store.client_config(&args.unit);
    let target = args.target.clone();

    let result = MufClient::scoped(config, |client: Arc<MufClient>| async move {
        check_state_round_trip(&client).await?;
        check_echo_round_trip(&client, &target).await?;
        check_state_watch(&client).await?;
        Ok::<_, anyhow::Error>(())
    })
    .await;

    match result {
        Ok(()) => {
            info!("system check passed");
            Ok(0)
        }
        Err(e) => {
            if e.downcast_ref::<MufError>().is_some_and(|m| matches!(m, MufError::AuthFailed(_))) {
                eprintln!("authentication rejected; check REDIS_USERNAME / REDIS_PASSWORD");
                return Ok(1);
            }
            Err(e)
        }
    }
}

async fn check_state_round_trip(client: &MufClient) -> anyhow::Result<()> {
    info!("step 1: state round-trip");
    let expected = Bytes::from_static(b"system_ok");
    client.send(Status::Keep, "health_check", expected.clone(), None).await?;
    let stored = client.get_state(client.unit_name(), "health_check", Status::Keep).await?;
    anyhow::ensure!(stored.as_ref() == Some(&expected), "stored state did not round-trip");
    Ok(())
}

async fn check_echo_round_trip(client: &MufClient, target: &str) -> anyhow::Result<()> {
    info!(target, "step 2: request/response");
    let response = client
        .request(target, Bytes::from_static(b"muf_integration_test"), Duration::from_secs(5))
        .await?;
    info!(response = %String::from_utf8_lossy(&response), "echo answered");
    Ok(())
}

async fn check_state_watch(client: &MufClient) -> anyhow::Result<()> {
    info!("step 3: state watch");
    let (tx, rx) = tokio::sync::oneshot::channel::<String>();
    let tx = std::sync::Mutex::new(Some(tx));

    client.watch_state(client.unit_name(), "notify_test", Status::Keep, move |unit, id, data| {
        let notify = tx.lock().ok().and_then(|mut slot| slot.take());
        async move {
            if let Some(tx) = notify {
                let _ = tx.send(format!("{unit}/{id} = {}", String::from_utf8_lossy(&data)));
            }
        }
    })?;

    client.send(Status::Keep, "notify_test", Bytes::from_static(b"event_triggered"), None).await?;

    let seen = tokio::time::timeout(Duration::from_secs(3), rx)
        .await
        .map_err(|_| anyhow::anyhow!("no watch notification within 3s"))?
        .map_err(|_| anyhow::anyhow!("watch handler dropped without firing"))?;
    info!(%seen, "watch notification received");
    Ok(())
}
