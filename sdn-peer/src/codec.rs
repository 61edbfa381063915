//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! Wire framing: a big-endian u16 length prefix followed by a
//! DEFLATE-compressed `bincode` payload.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::{Error, IoError};

/// Largest payload (post length-prefix) this implementation will
/// attempt to frame.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    let raw = bincode::serialize(value).map_err(Error::EncodeFailed)?;

    let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(&raw)
        .expect("writing to an in-memory buffer cannot fail");
    let compressed = encoder
        .finish()
        .expect("finishing an in-memory buffer cannot fail");

    if compressed.len() > MAX_FRAME_LEN {
        return Err(Error::FrameTooLarge(compressed.len()));
    }

    let mut frame = Vec::with_capacity(2 + compressed.len());
    frame.extend_from_slice(&(compressed.len() as u16).to_be_bytes());
    frame.extend_from_slice(&compressed);
    Ok(frame)
}

fn decompress_and_decode<T: DeserializeOwned>(compressed: &[u8]) -> Result<T, Error> {
    let mut decoder = flate2::read::DeflateDecoder::new(compressed);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|_| Error::DecodeFailed(Box::new(bincode::ErrorKind::Custom(
            "malformed deflate stream".to_owned(),
        ))))?;
    bincode::deserialize(&raw).map_err(Error::DecodeFailed)
}

pub async fn write_frame<T: Serialize>(
    stream: &mut (impl AsyncWriteExt + Unpin),
    value: &T,
) -> Result<(), Error> {
    let frame = encode(value)?;
    stream
        .write_all(&frame)
        .await
        .map_err(IoError::SendFailed)?;
    Ok(())
}

pub async fn read_frame<T: DeserializeOwned>(
    stream: &mut (impl AsyncReadExt + Unpin),
) -> Result<T, Error> {
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|error| match error.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::SocketClosed,
            _ => Error::IoError(IoError::RecvFailed(error)),
        })?;
    let len = u16::from_be_bytes(len_buf) as usize;

    let mut buf = vec![0u8; len];
    stream
        .read_exact(&mut buf)
        .await
        .map_err(|error| match error.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::SocketClosed,
            _ => Error::IoError(IoError::RecvFailed(error)),
        })?;

    decompress_and_decode(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Sample {
        a: u32,
        b: String,
    }

    #[tokio::test]
    async fn frame_roundtrips_through_an_in_memory_duplex() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let value = Sample { a: 7, b: "hello".to_owned() };
        write_frame(&mut client, &value).await.unwrap();
        let decoded: Sample = read_frame(&mut server).await.unwrap();
        assert_eq!(value, decoded);
    }
}
