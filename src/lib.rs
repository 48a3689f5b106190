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

//! Ship structured log entries to a [GELF] collector, such as [OVH Logs Data Platform], over TCP,
//! TLS or UDP.
//!
//! [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//! [OVH Logs Data Platform]: https://www.ovhcloud.com/en/logs-data-platform/
//!
//! # Introduction
//!
//! The Graylog Extended Log Format is, at heart, a JSON object: a version, a host, a short & a
//! full message, a timestamp, a syslog severity, and any number of "additional" fields whose names
//! begin with an underscore. OVH authenticates each entry through one such field,
//! `_X-OVH-TOKEN`, so shipping logs there is a matter of building that object, optionally
//! compressing it, and getting it to the collector.
//!
//! Over TCP & TLS, "getting it there" is a single write. Over UDP, it's a single datagram for
//! payloads that fit, and a sequence of [chunks] for those that don't: each chunk carries a magic
//! number, an eight-byte message ID, its sequence number & the total number of chunks, so that the
//! collector can put them back together.
//!
//! [chunks]: crate::chunk
//!
//! The pieces, from the bottom up:
//!
//! - [`entry`]: the [`Entry`](entry::Entry) log record & its defaulting rules
//! - [`gelf`]: JSON serialization & compression
//! - [`chunk`]: UDP chunk framing
//! - [`transport`]: connecting to the collector & putting payloads on the wire
//! - [`client`]: configuration, and the [`Client`](client::Client) that drives the above
//! - [`layer`]: a [`tracing-subscriber`] [`Layer`] built on a [`Client`](client::Client)
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! # Usage
//!
//! ```no_run
//! use gelf_ovh::{client::Client, entry::Entry, gelf::Compression, level::Level,
//!                transport::Protocol};
//!
//! let client = Client::builder("my-stream-token")
//!     .protocol(Protocol::Tls)
//!     .compression(Compression::Gzip)
//!     .build();
//!
//! client
//!     .send(Entry::new("helo world").with_level(Level::Informational))
//!     .unwrap();
//! client.error("something went sideways").unwrap();
//! ```
//!
//! Nothing is retried: each send is one connection attempt & one write (or one write per chunk),
//! and the first failure is what the caller sees. Callers who'd rather not wait can build a
//! [`Detached`](client::Detached) client, at the price of never hearing about failures at all.
//!
//! This crate logs its own goings-on (connections opened, payloads chunked) through [`tracing`] at
//! the `debug` & `trace` levels; it never installs a subscriber.
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html

pub mod chunk;
pub mod client;
pub mod entry;
pub mod env;
pub mod error;
pub mod gelf;
pub mod layer;
pub mod level;
pub mod transport;
