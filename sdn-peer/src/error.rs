//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

#[derive(Debug)]
pub enum Error {
    IoError(IoError),
    SocketClosed,
    EncodeFailed(bincode::Error),
    DecodeFailed(bincode::Error),
    FrameTooLarge(usize),
}

#[derive(Debug)]
pub enum IoError {
    ConnectFailed(std::io::Error),
    SendFailed(std::io::Error),
    RecvFailed(std::io::Error),
    SetOptionFailed(std::io::Error),
    /// The peer did not answer within the receive timeout. Treated the
    /// same as any other peer failure: the caller penalizes the hop
    /// and moves on instead of waiting forever.
    RecvTimedOut,
}

impl Error {
    pub fn log(&self) {
        match self {
            Error::IoError(error) => error.log(),
            Error::SocketClosed => {
                warn!("{}", self);
            }
            Error::EncodeFailed(error) | Error::DecodeFailed(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
            Error::FrameTooLarge(size) => {
                warn!(size, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(error) => error.fmt(f),
            Error::SocketClosed => write!(f, "peer connection was closed"),
            Error::EncodeFailed(..) => write!(f, "failed to encode request frame"),
            Error::DecodeFailed(..) => write!(f, "failed to decode reply frame"),
            Error::FrameTooLarge(..) => write!(f, "frame exceeds the maximum wire length"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(error) => Some(error),
            Error::EncodeFailed(error) => Some(error),
            Error::DecodeFailed(error) => Some(error),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

impl IoError {
    pub fn log(&self) {
        match self {
            IoError::ConnectFailed(error)
            | IoError::SendFailed(error)
            | IoError::RecvFailed(error)
            | IoError::SetOptionFailed(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
            IoError::RecvTimedOut => {
                warn!("{}", self);
            }
        }
    }
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::ConnectFailed(..) => write!(f, "failed to connect to peer"),
            IoError::SendFailed(..) => write!(f, "failed to send data to peer"),
            IoError::RecvFailed(..) => write!(f, "failed to receive data from peer"),
            IoError::SetOptionFailed(..) => write!(f, "failed to configure peer socket"),
            IoError::RecvTimedOut => write!(f, "timed out waiting for peer reply"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoError::ConnectFailed(error)
            | IoError::SendFailed(error)
            | IoError::RecvFailed(error)
            | IoError::SetOptionFailed(error) => Some(error),
            IoError::RecvTimedOut => None,
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
