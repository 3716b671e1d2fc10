// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use muf_cli::config::StoreArgs;

#[derive(Parser)]
#[command(name = "muf", version, about = "Units for the MUF message/state fabric.")]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Serve echo responses for every request on the fabric.
    Echo(muf_cli::echo::EchoArgs),
    /// Stream every fabric event to stdout.
    Monitor,
    /// Write one payload to a fabric path.
    Send(muf_cli::send::SendArgs),
    /// Dispatch one request and print the response.
    Request(muf_cli::request::RequestArgs),
    /// Run the built-in system check against a live fabric.
    Check(muf_cli::check::CheckArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let result = match cli.command {
        Commands::Echo(args) => muf_cli::echo::run(cli.store, args).await,
        Commands::Monitor => muf_cli::monitor::run(cli.store).await,
        Commands::Send(args) => muf_cli::send::run(cli.store, args).await,
        Commands::Request(args) => muf_cli::request::run(cli.store, args).await,
        Commands::Check(args) => muf_cli::check::run(cli.store, args).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("fatal: {e:#}");
            std::process::exit(1);
        }
    }
}
