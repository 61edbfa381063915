//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing_subscriber::prelude::*;

/// Installs a stdout `tracing` subscriber filtered by `log_level` (an
/// `EnvFilter` directive string, e.g. `"info"` or
/// `"sdn_engine=debug,sdn_peer=warn"`), falling back to the `RUST_LOG`
/// environment variable when set.
///
/// Trimmed down from `holo-daemon::main::init_tracing`: no journald
/// layer (nothing here runs under systemd by assumption) and no
/// gRPC-specific directives (this daemon has no gRPC northbound).
pub fn init(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(log_level.parse().unwrap_or_else(|_| {
            eprintln!("invalid logLevel {log_level:?}, defaulting to info");
            tracing::level_filters::LevelFilter::INFO.into()
        }))
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
