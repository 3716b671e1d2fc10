// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live view of the fabric: prints every keyspace event under the
//! protocol root, including keys that do not follow the path rules.

use futures_util::StreamExt;

use muf::connection::Connection;
use muf::protocol::{naming, KEYSPACE_PREFIX, PATH_SEPARATOR, PROTOCOL_ROOT};

use crate::config::StoreArgs;

pub async fn run(store: StoreArgs) -> anyhow::Result<i32> {
    let connection = Connection::new(store.settings());
    let mut pubsub = connection.pubsub().await?;
    // Broader than the client's own pattern so malformed keys show up too.
    let pattern = format!("{KEYSPACE_PREFIX}{PROTOCOL_ROOT}{PATH_SEPARATOR}*");
    pubsub.psubscribe(&pattern).await?;

    println!("monitoring fabric events ({pattern}), ctrl-c to exit");

    let stream = pubsub.on_message();
    tokio::pin!(stream);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            msg = stream.next() => {
                let Some(msg) = msg else {
                    anyhow::bail!("notification stream closed");
                };
                let event: String = msg.get_payload().unwrap_or_default();
                let channel: Vec<u8> = msg.get_channel().unwrap_or_default();
                let path = naming::key_from_channel(&channel);
                print_event(&connection, &path, &event).await;
            }
        }
    }
    Ok(0)
}

async fn print_event(connection: &Connection, path: &str, event: &str) {
    let Some(parsed) = naming::parse_path(path) else {
        println!("[?     ] {path:<40} | {event} (not a fabric path)");
        return;
    };
    match event {
        "set" => {
            let data = match connection.get(path).await {
                Ok(Some(payload)) => String::from_utf8_lossy(&payload).into_owned(),
                Ok(None) => "<already expired>".to_owned(),
                Err(e) => format!("<read failed: {e}>"),
            };
            println!("[{:<6}] {:<15} | id: {:<12} | data: {data}", parsed.status, parsed.unit, parsed.id);
        }
        "expired" | "del" => {
            println!("[{:<6}] {:<15} | id: {:<12} | --- {} ---", parsed.status, parsed.unit, parsed.id, event.to_uppercase());
        }
        _ => {}
    }
}
