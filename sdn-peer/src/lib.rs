//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! TCP transport between controller processes: a length-prefixed,
//! DEFLATE-compressed `bincode` wire format carrying a fixed set of
//! peer-RPC requests and replies.

pub mod codec;
pub mod error;
pub mod handler;
pub mod proto;
pub mod proxy;
pub mod server;

pub use crate::error::Error;
pub use crate::handler::PeerHandler;
pub use crate::proxy::PeerProxy;
