//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

#[derive(Debug)]
pub enum Error {
    CookiesExhausted,
    SendFailed,
}

impl Error {
    pub fn log(&self) {
        warn!("{}", self);
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::CookiesExhausted => write!(f, "no cookie IDs left to allocate for this flow"),
            Error::SendFailed => write!(f, "southbound channel is closed"),
        }
    }
}

impl std::error::Error for Error {}
