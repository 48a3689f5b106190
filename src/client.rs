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

//! The [gelf-ovh](crate) client.
//!
//! A [`Client`] holds the configuration for talking to one collector (token, endpoint, protocol,
//! compression) and drives each [`Entry`] through default-filling, [encoding] & [delivery].
//!
//! [encoding]: crate::gelf::encode
//! [delivery]: crate::transport::deliver
//!
//! # Dispatch
//!
//! Whether a send blocks the caller is chosen at the type level by the [`Dispatch`] parameter:
//!
//! - [`Blocking`]: the caller's thread connects & writes, and gets back the first error
//! - [`Detached`]: a new thread connects & writes; the caller gets back `()` immediately and any
//!   error is dropped on the floor
//!
//! Both put exactly the same bytes on the wire.
//!
//! # Examples
//!
//! ```no_run
//! use gelf_ovh::{client::Client, entry::Entry, level::Level, transport::Protocol};
//!
//! let client = Client::builder("my-stream-token")
//!     .protocol(Protocol::Tls)
//!     .build();
//! client
//!     .send(Entry::new("helo world").with_level(Level::Informational))
//!     .unwrap();
//!
//! // Fire & forget:
//! let client = Client::builder("my-stream-token").build_detached();
//! client.info("nobody will hear if this fails");
//! ```

use crate::{
    entry::Entry,
    env::{Clock, Hostname, SystemClock, SystemHostname},
    error::{Error, Result},
    gelf::{encode, Compression},
    level::Level,
    transport::{connect, default_tls_config, deliver, Endpoint, Protocol},
};

use rustls::ClientConfig;

use std::sync::Arc;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            dispatch                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// What a caller gets back from a send: something that may or may not carry an error.
pub trait Outcome {
    fn into_error(self) -> Option<Error>;
}

impl Outcome for Result<()> {
    fn into_error(self) -> Option<Error> {
        self.err()
    }
}

impl Outcome for () {
    fn into_error(self) -> Option<Error> {
        None
    }
}

/// Run a send job, deciding where it runs & what the caller hears about it.
pub trait Dispatch: Send + Sync + 'static {
    type Output: Outcome;
    fn dispatch<F>(&self, job: F) -> Self::Output
    where
        F: FnOnce() -> Result<()> + Send + 'static;
}

/// Run the job on the caller's thread & hand back its result.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blocking;

impl Dispatch for Blocking {
    type Output = Result<()>;
    fn dispatch<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        job()
    }
}

/// Run the job on a thread of its own; its result is discarded.
#[derive(Clone, Copy, Debug, Default)]
pub struct Detached;

impl Dispatch for Detached {
    type Output = ();
    fn dispatch<F>(&self, job: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        // If no thread can be had, the send is dropped like any other failure
        let _ = std::thread::Builder::new()
            .name("gelf-ovh-send".to_owned())
            .spawn(move || {
                let _ = job();
            });
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Client                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Read-only configuration shared by every send.
struct Config {
    token: String,
    endpoint: Endpoint,
    protocol: Protocol,
    compression: Compression,
    tls: Option<Arc<ClientConfig>>,
    clock: Box<dyn Clock>,
    hostname: Box<dyn Hostname>,
}

impl Config {
    fn ship(&self, entry: &Entry) -> Result<()> {
        let payload = encode(entry, self.compression)?;
        let mut conn = connect(self.protocol, &self.endpoint, self.tls.as_ref())?;
        deliver(&payload, self.protocol.framing(), conn.as_mut())
    }
}

/// Ships [`Entry`]s to a GELF collector.
///
/// Cheap to clone; clones share configuration.
pub struct Client<D: Dispatch = Blocking> {
    config: Arc<Config>,
    dispatch: D,
}

impl<D: Dispatch + Clone> Clone for Client<D> {
    fn clone(&self) -> Self {
        Client {
            config: self.config.clone(),
            dispatch: self.dispatch.clone(),
        }
    }
}

impl Client<Blocking> {
    /// Start configuring a [`Client`] that will authenticate with `token`.
    pub fn builder<T: Into<String>>(token: T) -> ClientBuilder {
        ClientBuilder::new(token)
    }
}

impl<D: Dispatch> Client<D> {
    pub fn protocol(&self) -> Protocol {
        self.config.protocol
    }
    pub fn compression(&self) -> Compression {
        self.config.compression
    }
    pub fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    /// Fill in `entry`'s defaults, stamp it with this client's version & token, and ship it.
    pub fn send(&self, mut entry: Entry) -> D::Output {
        entry.fill_defaults(
            &self.config.token,
            self.config.clock.as_ref(),
            self.config.hostname.as_ref(),
        );
        let config = self.config.clone();
        self.dispatch.dispatch(move || config.ship(&entry))
    }

    /// Send `msg` at `level`.
    pub fn log<M: Into<String>>(&self, level: Level, msg: M) -> D::Output {
        self.send(Entry::new(msg).with_level(level))
    }
    /// Send `msg` at [`Level::Informational`]; the analog of `log.Print`.
    pub fn print<M: Into<String>>(&self, msg: M) -> D::Output {
        self.log(Level::Informational, msg)
    }
    /// Send a formatted message at [`Level::Informational`]:
    ///
    /// ```no_run
    /// # let client = gelf_ovh::client::Client::builder("token").build();
    /// client.print_fmt(format_args!("{} widgets frobnicated", 11)).unwrap();
    /// ```
    pub fn print_fmt(&self, args: std::fmt::Arguments<'_>) -> D::Output {
        self.print(std::fmt::format(args))
    }
    pub fn info<M: Into<String>>(&self, msg: M) -> D::Output {
        self.log(Level::Informational, msg)
    }
    pub fn error<M: Into<String>>(&self, msg: M) -> D::Output {
        self.log(Level::Error, msg)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       struct ClientBuilder                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct ClientBuilder {
    imp: Config,
}

impl ClientBuilder {
    /// UDP, uncompressed, to the OVH collector, with the system clock & hostname.
    pub fn new<T: Into<String>>(token: T) -> ClientBuilder {
        ClientBuilder {
            imp: Config {
                token: token.into(),
                endpoint: Endpoint::default(),
                protocol: Protocol::default(),
                compression: Compression::default(),
                tls: None,
                clock: Box::new(SystemClock),
                hostname: Box::new(SystemHostname),
            },
        }
    }
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.imp.endpoint = endpoint;
        self
    }
    /// Talk to `host` on the standard ports
    pub fn host<H: Into<String>>(mut self, host: H) -> Self {
        self.imp.endpoint.host = host.into();
        self
    }
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.imp.protocol = protocol;
        self
    }
    pub fn protocol_as_str(mut self, protocol: &str) -> Result<Self> {
        self.imp.protocol = protocol.parse()?;
        Ok(self)
    }
    pub fn compression(mut self, compression: Compression) -> Self {
        self.imp.compression = compression;
        self
    }
    pub fn compression_as_str(mut self, compression: &str) -> Result<Self> {
        self.imp.compression = compression.parse()?;
        Ok(self)
    }
    /// Use `config` for TLS connections instead of trusting the platform's root certificates
    pub fn tls_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.imp.tls = Some(config);
        self
    }
    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.imp.clock = Box::new(clock);
        self
    }
    pub fn hostname<H: Hostname + 'static>(mut self, hostname: H) -> Self {
        self.imp.hostname = Box::new(hostname);
        self
    }
    /// A [`Client`] whose sends block & report errors
    pub fn build(self) -> Client<Blocking> {
        self.build_with(Blocking)
    }
    /// A [`Client`] whose sends return immediately & never report errors
    pub fn build_detached(self) -> Client<Detached> {
        self.build_with(Detached)
    }
    pub fn build_with<D: Dispatch>(mut self, dispatch: D) -> Client<D> {
        // Load the platform trust roots once, rather than on every send
        if self.imp.protocol == Protocol::Tls && self.imp.tls.is_none() {
            self.imp.tls = Some(default_tls_config());
        }
        Client {
            config: Arc::new(self.imp),
            dispatch,
        }
    }
}
