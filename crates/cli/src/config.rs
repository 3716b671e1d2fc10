// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use muf::connection::ConnectionSettings;
use muf::MufConfig;

/// Store addressing shared by every subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct StoreArgs {
    /// Store host.
    #[arg(long, default_value = "localhost", env = "REDIS_HOST")]
    pub host: String,

    /// Store port.
    #[arg(long, default_value_t = 6379, env = "REDIS_PORT")]
    pub port: u16,

    /// Store database index.
    #[arg(long, default_value_t = 0, env = "REDIS_DB")]
    pub db: i64,

    /// ACL username. If unset, the store's default user is used.
    #[arg(long, env = "REDIS_USERNAME")]
    pub username: Option<String>,

    /// ACL password.
    #[arg(long, env = "REDIS_PASSWORD")]
    pub password: Option<String>,
}

impl StoreArgs {
    /// Client configuration for a unit joining the fabric.
    pub fn client_config(&self, unit_name: &str) -> MufConfig {
        let mut config = MufConfig::new(unit_name);
        config.host = self.host.clone();
        config.port = self.port;
        config.db = self.db;
        config.username = self.username.clone();
        config.password = self.password.clone();
        config
    }

    /// Raw connection settings, for commands that bypass the client.
    pub fn settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            host: self.host.clone(),
            port: self.port,
            db: self.db,
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}
