//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

use sdn_utils::ids::GlobalPathSearchId;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    TaskExists(GlobalPathSearchId),
    ScenarioNotFound(GlobalPathSearchId),
}

impl Error {
    pub fn log(&self) {
        match self {
            Error::TaskExists(search_id) => {
                warn!(%search_id, "{}", self);
            }
            Error::ScenarioNotFound(search_id) => {
                warn!(%search_id, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::TaskExists(..) => {
                write!(f, "an implementation task is already in progress for this scenario")
            }
            Error::ScenarioNotFound(..) => {
                write!(f, "scenario is not active")
            }
        }
    }
}

impl std::error::Error for Error {}
