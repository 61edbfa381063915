//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! Client-side connection to a single peer controller: a cached TCP
//! connection, reopened transparently the next time it is needed after
//! any failure.

use std::net::SocketAddr;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::codec::{read_frame, write_frame};
use crate::error::{Error, IoError};
use crate::proto::{Reply, Request};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const CONNECT_ATTEMPTS: u32 = 3;
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Caches one connection per remote controller, avoiding a fresh
/// TCP handshake for every request to a peer that is already reachable.
#[derive(Debug)]
pub struct PeerProxy {
    addr: SocketAddr,
    conn: Mutex<Option<TcpStream>>,
}

impl PeerProxy {
    pub fn new(addr: SocketAddr) -> PeerProxy {
        PeerProxy {
            addr,
            conn: Mutex::new(None),
        }
    }

    /// Sends `request` to the peer and waits for its reply.
    ///
    /// Any I/O failure, including the peer closing the socket, drops
    /// the cached connection so the next call starts clean.
    pub async fn call(&self, request: &Request) -> Result<Reply, Error> {
        let mut guard = self.conn.lock().await;

        if guard.is_none() {
            *guard = Some(connect_with_retry(self.addr).await?);
        }

        let result = async {
            let stream = guard.as_mut().unwrap();
            write_frame(stream, request).await?;
            match tokio::time::timeout(RECV_TIMEOUT, read_frame(stream)).await {
                Ok(result) => result,
                Err(_elapsed) => Err(Error::from(IoError::RecvTimedOut)),
            }
        }
        .await;

        if result.is_err() {
            *guard = None;
        }

        result
    }
}

fn connect_once(addr: SocketAddr, timeout: Duration) -> std::io::Result<std::net::TcpStream> {
    let domain = Domain::for_address(addr);
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nodelay(true)?;
    socket.connect_timeout(&addr.into(), timeout)?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

async fn connect_with_retry(addr: SocketAddr) -> Result<TcpStream, Error> {
    let mut last_error = None;

    for _ in 0..CONNECT_ATTEMPTS {
        let result = tokio::task::spawn_blocking(move || connect_once(addr, CONNECT_TIMEOUT))
            .await
            .expect("connect task panicked");

        match result {
            Ok(std_stream) => {
                return TcpStream::from_std(std_stream)
                    .map_err(|error| Error::from(IoError::ConnectFailed(error)));
            }
            Err(error) => last_error = Some(error),
        }
    }

    Err(Error::from(IoError::ConnectFailed(last_error.expect(
        "loop runs at least once so an error was always recorded",
    ))))
}
