//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

use sdn_utils::ids::GlobalPathSearchId;

#[derive(Debug)]
pub enum Error {
    PathNotFound,
    TaskExists(GlobalPathSearchId),
    ScenarioNotActive(GlobalPathSearchId),
    Exhausted,
    InvalidArgument(String),
    PeerFailure(sdn_peer::Error),
    ServiceInstall(sdn_services::Error),
    Fatal(String),
}

impl Error {
    pub fn log(&self) {
        match self {
            Error::PathNotFound => warn!("{}", self),
            Error::TaskExists(search_id) => warn!(%search_id, "{}", self),
            Error::ScenarioNotActive(search_id) => warn!(%search_id, "{}", self),
            Error::Exhausted => warn!("{}", self),
            Error::InvalidArgument(detail) => warn!(%detail, "{}", self),
            Error::PeerFailure(error) => warn!(error = %with_source(error), "{}", self),
            Error::ServiceInstall(error) => warn!(%error, "{}", self),
            Error::Fatal(detail) => tracing::error!(%detail, "{}", self),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::PathNotFound => write!(f, "no admissible path found"),
            Error::TaskExists(..) => {
                write!(f, "an implementation task is already in progress for this scenario")
            }
            Error::ScenarioNotActive(..) => write!(f, "scenario is not active"),
            Error::Exhausted => write!(f, "an identifier pool was exhausted"),
            Error::InvalidArgument(..) => write!(f, "invalid argument"),
            Error::PeerFailure(..) => write!(f, "peer RPC failed"),
            Error::ServiceInstall(..) => write!(f, "service installation failed"),
            Error::Fatal(..) => write!(f, "unrecoverable engine error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::PeerFailure(error) => Some(error),
            Error::ServiceInstall(error) => Some(error),
            _ => None,
        }
    }
}

impl From<sdn_peer::Error> for Error {
    fn from(error: sdn_peer::Error) -> Error {
        Error::PeerFailure(error)
    }
}

impl From<sdn_topology::Error> for Error {
    fn from(error: sdn_topology::Error) -> Error {
        match error {
            sdn_topology::Error::PathNotFound => Error::PathNotFound,
            sdn_topology::Error::InsufficientBandwidth => Error::PathNotFound,
        }
    }
}

impl From<sdn_services::Error> for Error {
    fn from(error: sdn_services::Error) -> Error {
        Error::ServiceInstall(error)
    }
}

impl From<sdn_scenario::Error> for Error {
    fn from(error: sdn_scenario::Error) -> Error {
        match error {
            sdn_scenario::Error::TaskExists(id) => Error::TaskExists(id),
            sdn_scenario::Error::ScenarioNotFound(id) => Error::ScenarioNotActive(id),
        }
    }
}

fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
