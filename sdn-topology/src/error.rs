//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    PathNotFound,
    InsufficientBandwidth,
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::PathNotFound => {
                warn!("{}", self);
            }
            Error::InsufficientBandwidth => {
                warn!("{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::PathNotFound => {
                write!(f, "no admissible path exists between the requested entities")
            }
            Error::InsufficientBandwidth => {
                write!(f, "edge lacks the bandwidth being allocated")
            }
        }
    }
}

impl std::error::Error for Error {}
