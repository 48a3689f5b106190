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

//! [gelf-ovh](crate) errors

use backtrace::Backtrace;

/// [gelf-ovh](crate) error type
///
/// [gelf-ovh](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of a
/// straightforward enumeration with a few match arms chosen on the basis what the caller will need
/// to respond.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// Failed to serialize or compress an [`Entry`](crate::entry::Entry)
    Encoding {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Asked for a compression algorithm GELF doesn't speak
    UnsupportedCompression { name: String, back: Backtrace },
    /// Asked for a transport we don't implement
    UnsupportedProtocol { name: String, back: Backtrace },
    /// Couldn't resolve or reach the collector
    Connect {
        addr: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Reached the collector, but the TLS handshake failed
    TlsHandshake {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// The transport accepted fewer bytes than we handed it
    ShortWrite {
        written: usize,
        expected: usize,
        back: Backtrace,
    },
    /// The OS random source couldn't produce a chunked-message ID
    Randomness {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// The payload would need more than 128 UDP chunks
    PayloadTooLarge { len: usize, chunks: usize },
    /// Any other I/O failure while writing to the collector
    Io {
        source: std::io::Error,
        back: Backtrace,
    },
}

impl Error {
    pub(crate) fn io(source: std::io::Error) -> Error {
        Error::Io {
            source,
            back: Backtrace::new(),
        }
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Encoding { source, .. } => write!(f, "Failed to encode GELF entry: {}", source),
            Error::UnsupportedCompression { name, .. } => {
                write!(f, "{} compression not supported", name)
            }
            Error::UnsupportedProtocol { name, .. } => {
                write!(f, "{} not implemented or not supported", name)
            }
            Error::Connect { addr, source, .. } => {
                write!(f, "Couldn't connect to {}: {}", addr, source)
            }
            Error::TlsHandshake { source, .. } => write!(f, "TLS handshake failed: {}", source),
            Error::ShortWrite {
                written, expected, ..
            } => write!(f, "entry not completely sent {}/{}", written, expected),
            Error::Randomness { source, .. } => {
                write!(f, "unable to generate message ID: {}", source)
            }
            Error::PayloadTooLarge { len, chunks } => write!(
                f,
                "a {}-byte payload needs {} chunks; GELF allows at most 128",
                len, chunks
            ),
            Error::Io { source, .. } => write!(f, "I/O error: {}", source),
            _ => write!(f, "Other gelf-ovh error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Encoding { back, .. }
            | Error::UnsupportedCompression { back, .. }
            | Error::UnsupportedProtocol { back, .. }
            | Error::Connect { back, .. }
            | Error::TlsHandshake { back, .. }
            | Error::ShortWrite { back, .. }
            | Error::Randomness { back, .. }
            | Error::Io { back, .. } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "gelf-ovh error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Encoding { source, .. }
            | Error::Connect { source, .. }
            | Error::TlsHandshake { source, .. }
            | Error::Randomness { source, .. } => Some(source.as_ref()),
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
