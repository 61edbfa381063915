//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Fixed controller identity. Left unset, the daemon reuses the ID
    /// recorded in its database from a previous run, or mints a fresh
    /// one on first boot.
    pub id: Option<Uuid>,
    #[serde(rename = "controllerIP")]
    pub controller_ip: IpAddr,
    #[serde(rename = "controllerPort")]
    pub controller_port: u16,
    #[serde(rename = "centralIP")]
    pub central_ip: Option<IpAddr>,
    #[serde(rename = "centralPort")]
    pub central_port: u16,
    /// `:memory:` or a filesystem path whose parent directory must
    /// already exist.
    #[serde(rename = "dbLocation")]
    pub db_location: String,
    /// A `tracing_subscriber::EnvFilter` directive string, e.g.
    /// `"info"` or `"sdn_engine=debug,sdn_peer=warn"`.
    #[serde(rename = "logLevel")]
    pub log_level: String,
}

// ===== impl Config =====

impl Config {
    const DFLT_FILEPATH: &'static str = "/etc/archsdnd.toml";

    pub(crate) fn load(config_file: Option<&str>) -> Config {
        let config_file = config_file.unwrap_or(Config::DFLT_FILEPATH);

        match std::fs::read_to_string(config_file) {
            Ok(config_str) => {
                toml::from_str(&config_str).expect("failed to parse configuration file")
            }
            Err(err) => {
                eprintln!("failed to load configuration file: {err}");
                eprintln!("falling back to default configuration...");
                Config::default()
            }
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            id: None,
            controller_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            controller_port: 12345,
            central_ip: None,
            central_port: 12345,
            db_location: ":memory:".to_owned(),
            log_level: "info".to_owned(),
        }
    }
}
