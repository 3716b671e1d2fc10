// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end fabric scenarios. Each test self-skips unless
//! `MUF_SPECS_REDIS_HOST` names a live store.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serial_test::serial;

use muf::{MufClient, MufConfig, MufError, Status};
use muf_specs::{enable_keyspace_events, spec_config, unique_id, ENV_SPECS_HOST};

const ECHO_TIMEOUT: Duration = Duration::from_secs(5);

async fn started_client(config: MufConfig) -> anyhow::Result<Arc<MufClient>> {
    enable_keyspace_events(&config).await?;
    let client = Arc::new(MufClient::new(config));
    client.start().await?;
    Ok(client)
}

macro_rules! spec_store_or_skip {
    ($unit:expr) => {
        match spec_config($unit) {
            Some(config) => config,
            None => {
                eprintln!("skipping: {ENV_SPECS_HOST} not set");
                return Ok(());
            }
        }
    };
}

// ── S1: happy echo ────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn request_round_trips_through_an_echo_unit() -> anyhow::Result<()> {
    let requester = started_client(spec_store_or_skip!("a")).await?;
    let responder = started_client(spec_config("echo").ok_or_else(|| anyhow::anyhow!("config"))?)
        .await?;

    responder.listen(|_sender, _id, payload| async move {
        let text = String::from_utf8_lossy(&payload).into_owned();
        Ok(Some(Bytes::from(format!("Echo: {text}"))))
    })?;

    let response = requester.request("echo", Bytes::from_static(b"hello"), ECHO_TIMEOUT).await?;
    assert_eq!(&response[..], b"Echo: hello");
    assert_eq!(requester.watcher().dispatcher.waiter_count(), 0, "terminals must be disarmed");

    requester.stop().await;
    responder.stop().await;
    Ok(())
}

// ── S2: timeout ───────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn request_without_a_responder_times_out() -> anyhow::Result<()> {
    let requester = started_client(spec_store_or_skip!("a")).await?;

    let started = tokio::time::Instant::now();
    let result =
        requester.request("missing", Bytes::from_static(b"x"), Duration::from_millis(500)).await;

    match result {
        Err(MufError::Timeout { target, .. }) => assert_eq!(target, "missing"),
        other => anyhow::bail!("expected timeout, got {other:?}"),
    }
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(requester.watcher().dispatcher.waiter_count(), 0, "waiters must be removed");

    requester.stop().await;
    Ok(())
}

// ── S3: remote error ──────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn handler_error_reaches_the_requester() -> anyhow::Result<()> {
    let requester = started_client(spec_store_or_skip!("a")).await?;
    let responder = started_client(spec_config("echo").ok_or_else(|| anyhow::anyhow!("config"))?)
        .await?;

    responder.listen(|_sender, _id, _payload| async move {
        Err(anyhow::anyhow!("boom"))
    })?;

    let result = requester.request("echo", Bytes::from_static(b"x"), ECHO_TIMEOUT).await;
    match result {
        Err(MufError::Remote(message)) => assert!(message.contains("boom"), "got {message:?}"),
        other => anyhow::bail!("expected remote error, got {other:?}"),
    }

    requester.stop().await;
    responder.stop().await;
    Ok(())
}

// ── S4: state watch ───────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn state_write_notifies_the_watcher() -> anyhow::Result<()> {
    let client = started_client(spec_store_or_skip!("a")).await?;
    let id = unique_id("notify_test");

    let (tx, rx) = tokio::sync::oneshot::channel::<(String, String, Bytes)>();
    let tx = std::sync::Mutex::new(Some(tx));
    client.watch_state("a", &id, Status::Keep, move |unit, message_id, data| {
        let notify = tx.lock().ok().and_then(|mut slot| slot.take());
        async move {
            if let Some(tx) = notify {
                let _ = tx.send((unit, message_id, data));
            }
        }
    })?;

    client.send(Status::Keep, &id, Bytes::from_static(b"event_triggered"), None).await?;

    let (unit, message_id, data) = tokio::time::timeout(Duration::from_secs(3), rx)
        .await
        .map_err(|_| anyhow::anyhow!("no notification within 3s"))??;
    assert_eq!(unit, "a");
    assert_eq!(message_id, id);
    assert_eq!(&data[..], b"event_triggered");

    client.stop().await;
    Ok(())
}

// ── S5: case folding ──────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn mixed_case_units_fold_to_lowercase() -> anyhow::Result<()> {
    let requester = started_client(spec_store_or_skip!("CaseSender")).await?;
    let responder =
        started_client(spec_config("CaseEcho").ok_or_else(|| anyhow::anyhow!("config"))?).await?;
    assert_eq!(requester.unit_name(), "casesender");

    responder.listen(|sender, message_id, _payload| async move {
        // The fabric lowercases the sender and id before handlers see them.
        let reply = format!("{sender}:{message_id}");
        anyhow::ensure!(sender == sender.to_lowercase(), "sender not folded");
        anyhow::ensure!(message_id == message_id.to_lowercase(), "id not folded");
        Ok(Some(Bytes::from(reply)))
    })?;

    let response = requester.request("caseecho", Bytes::from_static(b"x"), ECHO_TIMEOUT).await?;
    assert!(String::from_utf8_lossy(&response).starts_with("casesender:"));

    requester.stop().await;
    responder.stop().await;
    Ok(())
}

// ── S6: malformed notification ────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn non_fabric_keys_are_ignored() -> anyhow::Result<()> {
    let config = spec_store_or_skip!("a");
    let client = started_client(config.clone()).await?;

    let fired = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = Arc::clone(&fired);
    client.listen(move |_sender, _id, _payload| {
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
        async move { Ok(None) }
    })?;

    // A write under the root that does not follow the 4-segment shape.
    let store = redis::Client::open((config.host.as_str(), config.port))?;
    let mut conn = store.get_multiplexed_async_connection().await?;
    let _: () = redis::cmd("SET")
        .arg("muf/stray")
        .arg("x")
        .arg("EX")
        .arg(5)
        .query_async(&mut conn)
        .await?;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!fired.load(std::sync::atomic::Ordering::SeqCst), "handler must not fire");

    // The client is still healthy afterwards.
    let id = unique_id("health");
    client.send(Status::Keep, &id, Bytes::from_static(b"ok"), None).await?;
    let stored = client.get_state("a", &id, Status::Keep).await?;
    assert_eq!(stored.as_deref(), Some(b"ok".as_slice()));

    client.stop().await;
    Ok(())
}

// ── lifecycle ─────────────────────────────────────────────────────────────

#[tokio::test]
#[serial]
async fn start_and_stop_are_idempotent() -> anyhow::Result<()> {
    let config = spec_store_or_skip!("a");
    enable_keyspace_events(&config).await?;
    let client = MufClient::new(config);

    client.start().await?;
    client.start().await?;
    client.stop().await;
    client.stop().await;

    // A second cycle still works.
    client.start().await?;
    client.stop().await;
    Ok(())
}

#[tokio::test]
#[serial]
async fn keep_state_round_trips_within_ttl() -> anyhow::Result<()> {
    let client = started_client(spec_store_or_skip!("a")).await?;
    let id = unique_id("health_check");

    let payload = Bytes::from_static(b"system_ok");
    let path = client.send(Status::Keep, &id, payload.clone(), None).await?;
    assert_eq!(path, format!("muf/a/keep/{id}"));

    let stored = client.get_state("a", &id, Status::Keep).await?;
    assert_eq!(stored, Some(payload));

    client.stop().await;
    Ok(())
}
