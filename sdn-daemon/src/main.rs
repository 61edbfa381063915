//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

mod config;
mod db;
mod logging;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{App, Arg};
use tracing::{info, warn};

use config::Config;
use sdn_engine::central_registry::{
    CentralRegistryClient, ControllerAddress, InMemoryCentralRegistry, NetworkPolicies,
};
use sdn_engine::{ControllerState, Engine};
use sdn_services::southbound::{self, SouthboundTx};
use sdn_topology::Topology;
use sdn_utils::ids::ControllerId;

/// Resolves this process's identity: the config file wins if set,
/// otherwise the database's record of a previous run, otherwise a
/// freshly minted one (persisted back for next time).
fn resolve_controller_id(config: &Config, db: &mut dyn db::Database) -> ControllerId {
    if let Some(id) = config.id {
        let id = ControllerId::from_uuid(id);
        db.set_controller_id(id);
        return id;
    }
    if let Some(id) = db.controller_id() {
        return id;
    }
    let id = ControllerId::new();
    db.set_controller_id(id);
    id
}

/// Registers with the central registry, following the original
/// controller's bootstrap order: register, and on
/// `ControllerAlreadyRegistered` (a restart against a database that
/// already knew this identity) fall back to updating the address
/// instead of treating it as fatal.
async fn register_with_central(
    central_registry: &dyn CentralRegistryClient,
    local_id: ControllerId,
    address: ControllerAddress,
) {
    if let Err(error) = central_registry.register_controller(local_id).await {
        warn!(%error, "controller was already registered at the central registry");
    }
    if let Err(error) = central_registry
        .update_controller_address(local_id, address)
        .await
    {
        warn!(%error, "failed to update controller address at the central registry");
    }
}

/// No real OpenFlow adapter is wired up here: flow commands are logged
/// in place of being forwarded to a switch-manager process, and the
/// event side never fires since nothing is driving it.
fn southbound_stub() -> (Arc<dyn SouthboundTx>, southbound::SouthboundRx) {
    let (tx, mut command_rx) = southbound::channel();
    tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            info!(?command, "southbound command (no adapter attached)");
        }
    });
    let (_event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
    (Arc::new(tx), southbound::SouthboundRx::new(event_rx))
}

async fn run(config: Config) {
    let mut db = db::open(&config.db_location);
    let local_id = resolve_controller_id(&config, &mut *db);
    info!(%local_id, "starting up");

    let central_registry: Arc<dyn CentralRegistryClient> =
        Arc::new(InMemoryCentralRegistry::new(NetworkPolicies::default()));

    register_with_central(
        &*central_registry,
        local_id,
        ControllerAddress {
            ipv4: match config.controller_ip {
                std::net::IpAddr::V4(addr) => Some(addr),
                std::net::IpAddr::V6(_) => None,
            },
            ipv4_port: Some(config.controller_port),
            ipv6: match config.controller_ip {
                std::net::IpAddr::V6(addr) => Some(addr),
                std::net::IpAddr::V4(_) => None,
            },
            ipv6_port: None,
        },
    )
    .await;

    let policies = central_registry
        .query_central_network_policies()
        .await
        .expect("central registry must answer the policy query for a registered controller");
    info!(?policies, "fetched central network policies");

    let (southbound_tx, _southbound_rx) = southbound_stub();
    let state = ControllerState::new(local_id, Topology::new());
    let engine = Arc::new(Engine::new(state, southbound_tx, central_registry));

    let listen_addr = SocketAddr::from((config.controller_ip, config.controller_port));
    let listener = match sdn_peer::server::listen(listen_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            error.log();
            std::process::exit(1);
        }
    };
    info!(%listen_addr, "listening for peer connections");

    tokio::spawn(sdn_peer::server::accept_loop(listener, engine));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received shutdown signal"),
        Err(error) => warn!(%error, "failed to listen for shutdown signal"),
    }
}

fn main() {
    let matches = App::new("ArchSDN controller")
        .version(clap::crate_version!())
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .get_matches();

    let config_file = matches.value_of("config");
    let config = Config::load(config_file);

    logging::init(&config.log_level);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create async runtime")
        .block_on(run(config));
}
