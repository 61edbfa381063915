//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! Server-side dispatch: accepts connections from peer controllers and
//! answers requests against a [`PeerHandler`] until the peer closes
//! the socket.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

use crate::codec::{read_frame, write_frame};
use crate::error::{Error, IoError};
use crate::handler::PeerHandler;
use crate::proto::{Reply, Request};

pub async fn listen(addr: SocketAddr) -> Result<TcpListener, Error> {
    TcpListener::bind(addr)
        .await
        .map_err(|error| Error::from(IoError::ConnectFailed(error)))
}

/// Accepts connections forever, spawning a session task for each one.
/// Each session runs until the peer disconnects or a frame fails to
/// decode; neither condition propagates back to the caller, since one
/// misbehaving peer must not take down the whole listener.
pub async fn accept_loop(listener: TcpListener, handler: Arc<dyn PeerHandler>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                let handler = handler.clone();
                tokio::spawn(async move {
                    serve_session(stream, peer_addr, handler).await;
                });
            }
            Err(error) => {
                IoError::ConnectFailed(error).log();
            }
        }
    }
}

async fn serve_session(mut stream: TcpStream, peer_addr: SocketAddr, handler: Arc<dyn PeerHandler>) {
    let _ = stream.set_nodelay(true);

    loop {
        let request: Request = match read_frame(&mut stream).await {
            Ok(request) => request,
            Err(Error::SocketClosed) => {
                debug!(%peer_addr, "peer closed connection");
                return;
            }
            Err(error) => {
                error.log();
                return;
            }
        };

        let reply = dispatch(&*handler, request).await;

        if let Err(error) = write_frame(&mut stream, &reply).await {
            error.log();
            return;
        }
    }
}

async fn dispatch(handler: &dyn PeerHandler, request: Request) -> Reply {
    match request {
        Request::QuerySectorsIds => Reply::SectorsIds(handler.query_sectors_ids()),
        Request::QueryEdgesToSector { sector } => {
            Reply::EdgesToSector(handler.query_edges_to_sector(sector))
        }
        Request::QueryEntity { key } => Reply::Entity(handler.query_entity(key)),
        Request::ActivateScenario(request) => {
            Reply::ActivateScenario(handler.activate_scenario(request).await)
        }
        Request::TerminateScenario(request) => {
            Reply::TerminateScenario(handler.terminate_scenario(request).await)
        }
        // Kept on the wire for compatibility with the full RPC set;
        // this controller does not act on any of these.
        Request::ReqLocalTime => {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            Reply::LocalTime(now)
        }
        Request::PublishEvent { .. } => Reply::EventPublished,
        Request::QueryAddressInfo { .. } => Reply::AddressInfo(None),
    }
}
