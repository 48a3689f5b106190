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

//! Shared setup for the test programs: configuration comes from the environment.
//!
//! - `OVHLOGS_TOKEN` (required): the stream token
//! - `OVHLOGS_ENDPOINT`: collector host (default gra1.logs.ovh.com)
//! - `OVHLOGS_PROTOCOL`: tcp, tls or udp
//! - `OVHLOGS_COMPRESSION`: none, gzip or zlib

use gelf_ovh::{
    client::{Client, ClientBuilder},
    error::Result,
    gelf::Compression,
    transport::Protocol,
};

/// Build a [`ClientBuilder`] from the environment, overriding the protocol with `protocol` if
/// given; exits if no token is configured.
pub fn builder_from_env(protocol: Option<Protocol>) -> Result<ClientBuilder> {
    let token = match std::env::var("OVHLOGS_TOKEN") {
        Ok(token) => token,
        Err(_) => {
            eprintln!("OVHLOGS_TOKEN env var not found");
            std::process::exit(1);
        }
    };
    let mut builder = Client::builder(token);
    if let Ok(host) = std::env::var("OVHLOGS_ENDPOINT") {
        builder = builder.host(host);
    }
    builder = match (protocol, std::env::var("OVHLOGS_PROTOCOL")) {
        (Some(protocol), _) => builder.protocol(protocol),
        (None, Ok(protocol)) => builder.protocol_as_str(&protocol)?,
        (None, Err(_)) => builder,
    };
    builder = match std::env::var("OVHLOGS_COMPRESSION") {
        Ok(compression) => builder.compression_as_str(&compression)?,
        Err(_) => builder.compression(Compression::None),
    };
    Ok(builder)
}

/// Log this program's own diagnostics (including gelf-ovh's) to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(std::io::stderr)
        .init();
}
