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

//! GELF payload encoding.
//!
//! [`encode`] turns an [`Entry`] into the bytes that go on the wire: a JSON object, optionally run
//! through gzip or zlib. GELF collectors sniff the first bytes of a payload to tell which (if any)
//! compression was applied, so nothing else needs to be said about it.
//!
//! # Examples
//!
//! ```rust
//! use gelf_ovh::{entry::Entry, gelf::{encode, Compression}};
//! let bytes = encode(&Entry::new("Hello, world!"), Compression::None).unwrap();
//! assert!(bytes.starts_with(b"{\"version\""));
//! ```

use crate::{
    entry::Entry,
    error::{Error, Result},
};

use backtrace::Backtrace;
use flate2::write::{GzEncoder, ZlibEncoder};

use std::io::Write;

type StdResult<T, E> = std::result::Result<T, E>;

/// Payload compression algorithms understood by GELF collectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Zlib,
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Compression::None => "none",
                Compression::Gzip => "gzip",
                Compression::Zlib => "zlib",
            }
        )
    }
}

impl std::str::FromStr for Compression {
    type Err = Error;
    fn from_str(s: &str) -> StdResult<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            "zlib" => Ok(Compression::Zlib),
            _ => Err(Error::UnsupportedCompression {
                name: s.to_owned(),
                back: Backtrace::new(),
            }),
        }
    }
}

fn encoding_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
    Error::Encoding {
        source: Box::new(err),
        back: Backtrace::new(),
    }
}

/// Serialize `entry` to GELF JSON & compress it as requested.
pub fn encode(entry: &Entry, compression: Compression) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(entry).map_err(encoding_error)?;
    match compression {
        Compression::None => Ok(json),
        Compression::Gzip => {
            let mut w = GzEncoder::new(Vec::new(), flate2::Compression::default());
            w.write_all(&json).map_err(encoding_error)?;
            w.finish().map_err(encoding_error)
        }
        Compression::Zlib => {
            let mut w = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            w.write_all(&json).map_err(encoding_error)?;
            w.finish().map_err(encoding_error)
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::{
        env::{FixedClock, FixedHostname},
        level::Level,
    };

    use chrono::prelude::*;
    use flate2::read::{GzDecoder, ZlibDecoder};

    use std::io::Read;

    fn helo_world() -> Entry {
        let mut e = Entry::new("helo world")
            .with_level(Level::Informational)
            .with_host("localhost");
        e.fill_defaults(
            "token",
            &FixedClock(Utc.timestamp_millis_opt(1_656_000_000_123).unwrap()),
            &FixedHostname("ignored".to_owned()),
        );
        e
    }

    #[test]
    fn plain_json() {
        let bytes = encode(&helo_world(), Compression::None).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.contains("\"host\":\"localhost\""));
        assert!(text.contains("\"level\":6"));
        assert!(text.contains("\"short_message\":\"helo world\""));
        assert!(text.contains("\"version\":\"1.1\""));
        assert!(text.contains("\"time_stamp\":1656000000.123"));
    }

    #[test]
    fn round_trips() {
        let plain = encode(&helo_world(), Compression::None).unwrap();

        let gz = encode(&helo_world(), Compression::Gzip).unwrap();
        assert_eq!(&gz[..2], &[0x1f, 0x8b]);
        let mut out = Vec::new();
        GzDecoder::new(&gz[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, plain);

        let zl = encode(&helo_world(), Compression::Zlib).unwrap();
        assert_eq!(zl[0], 0x78);
        let mut out = Vec::new();
        ZlibDecoder::new(&zl[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn round_trips_large() {
        // Big enough to span several deflate blocks
        let full: String = (0..20_000u32).map(|i| format!("{} ", i * 7919)).collect();
        let entry = Entry::new(full);
        let plain = encode(&entry, Compression::None).unwrap();

        let packed = encode(&entry, Compression::Gzip).unwrap();
        assert!(packed.len() < plain.len());
        let mut out = Vec::new();
        GzDecoder::new(&packed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, plain);

        let packed = encode(&entry, Compression::Zlib).unwrap();
        assert!(packed.len() < plain.len());
        let mut out = Vec::new();
        ZlibDecoder::new(&packed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn parse_compression() {
        assert_eq!("gzip".parse::<Compression>().unwrap(), Compression::Gzip);
        assert_eq!("ZLIB".parse::<Compression>().unwrap(), Compression::Zlib);
        assert_eq!("none".parse::<Compression>().unwrap(), Compression::None);
        assert!(matches!(
            "deflate".parse::<Compression>(),
            Err(Error::UnsupportedCompression { .. })
        ));
    }
}
