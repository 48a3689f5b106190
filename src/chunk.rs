// Copyright (C) 2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of gelf-ovh.
//
// gelf-ovh is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-ovh is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even
// the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-ovh.  If not,
// see <http://www.gnu.org/licenses/>.

//! GELF UDP chunking.
//!
//! A GELF payload that won't fit in a single datagram is split into chunks, each of which is sent
//! as its own datagram and carries a twelve-byte header:
//!
//! ```text
//! +------+------+------------------+-----+-------+------------------------+
//! | 0x1e | 0x0f | message ID (8)   | seq | total | data (<= 1348 bytes)   |
//! +------+------+------------------+-----+-------+------------------------+
//! ```
//!
//! The collector reassembles on (message ID, sequence number, total). All chunks of a payload share
//! a message ID drawn fresh from the OS random source; there may be no more than 128 of them.

use crate::error::{Error, Result};

use backtrace::Backtrace;
use bytes::{BufMut, Bytes, BytesMut};
use rand::{rngs::OsRng, TryRngCore};

/// Magic bytes opening every GELF chunk
pub const GELF_CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
/// Magic + message ID + sequence number + sequence count
pub const CHUNK_HEADER_LEN: usize = 2 + 8 + 1 + 1;
/// Payloads this size or larger are chunked
pub const UDP_CHUNK_MAX_SIZE: usize = 1420;
/// Payload bytes carried per chunk
pub const UDP_CHUNK_MAX_DATA_SIZE: usize = 1348;
/// GELF collectors drop messages split into more chunks than this
pub const MAX_CHUNKS: usize = 128;

/// The eight-byte identifier shared by all chunks of one payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub [u8; 8]);

impl MessageId {
    /// Draw a fresh ID from the operating system's CSPRNG.
    pub fn generate() -> Result<MessageId> {
        let mut id = [0u8; 8];
        OsRng.try_fill_bytes(&mut id).map_err(|err| Error::Randomness {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        Ok(MessageId(id))
    }
}

/// How many chunks a payload of `len` bytes needs.
pub fn chunk_count(len: usize) -> usize {
    len.div_ceil(UDP_CHUNK_MAX_DATA_SIZE)
}

/// Split `payload` into chunk frames tagged with `id`.
///
/// Fails up-front, before producing anything, if `payload` would need more than [`MAX_CHUNKS`]
/// chunks.
pub fn chunks(payload: &[u8], id: MessageId) -> Result<Chunks<'_>> {
    let total = chunk_count(payload.len());
    if total > MAX_CHUNKS {
        return Err(Error::PayloadTooLarge {
            len: payload.len(),
            chunks: total,
        });
    }
    Ok(Chunks {
        id,
        total: total as u8,
        seq: 0,
        data: payload.chunks(UDP_CHUNK_MAX_DATA_SIZE),
    })
}

/// Iterator over the chunk frames of one payload, in sequence order.
pub struct Chunks<'a> {
    id: MessageId,
    total: u8,
    seq: u8,
    data: std::slice::Chunks<'a, u8>,
}

impl Chunks<'_> {
    pub fn id(&self) -> MessageId {
        self.id
    }
    pub fn total(&self) -> u8 {
        self.total
    }
}

impl Iterator for Chunks<'_> {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        let data = self.data.next()?;
        let mut buf = BytesMut::with_capacity(CHUNK_HEADER_LEN + data.len());
        buf.put_slice(&GELF_CHUNK_MAGIC);
        buf.put_slice(&self.id.0);
        buf.put_u8(self.seq);
        buf.put_u8(self.total);
        buf.put_slice(data);
        self.seq += 1;
        Some(buf.freeze())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.data.size_hint()
    }
}

impl ExactSizeIterator for Chunks<'_> {}

/// A chunk frame, taken apart.
#[derive(Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    pub id: MessageId,
    pub seq: u8,
    pub total: u8,
    pub data: &'a [u8],
}

/// Take apart a chunk frame; `None` if `buf` doesn't start with a GELF chunk header.
pub fn parse_frame(buf: &[u8]) -> Option<Frame<'_>> {
    if buf.len() < CHUNK_HEADER_LEN || buf[..2] != GELF_CHUNK_MAGIC {
        return None;
    }
    let mut id = [0u8; 8];
    id.copy_from_slice(&buf[2..10]);
    Some(Frame {
        id: MessageId(id),
        seq: buf[10],
        total: buf[11],
        data: &buf[CHUNK_HEADER_LEN..],
    })
}
