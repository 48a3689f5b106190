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

//! A [`tracing-subscriber`] [`Layer`] that ships [`tracing`] [`Event`]s to a GELF collector.
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//!
//! Each [`Event`] carrying a `message` field becomes one [`Entry`]: the message is the
//! `short_message` (truncated as usual), the message followed by the event's other fields as
//! `key=value` pairs is the `full_message`, and the source line, if known, goes in `line`.
//!
//! ```no_run
//! use gelf_ovh::{client::Client, layer::Layer};
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//! use tracing_subscriber::registry::Registry;
//!
//! let client = Client::builder("my-stream-token").build_detached();
//! let subscriber = Registry::default().with(Layer::new(client));
//! tracing::subscriber::set_global_default(subscriber).unwrap();
//!
//! tracing::info!(widgets = 11, "Hello, world!");
//! ```

use crate::{
    client::{Blocking, Client, Dispatch, Outcome},
    entry::{derive_short_message, Entry},
    level::Level,
};

use tracing::Event;
use tracing_subscriber::layer::Context;

// When the tracing-log feature is enabled, use NormalizeEvent to extract line metadata from
// events that originated from the `log` crate.
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

use std::fmt::Write;

/// Targets of this crate's own diagnostics (connection chatter, failed sends); events under them
/// are never shipped. Matched exactly, so neither `gelf_ovh_app` nor `gelf_ovh::layer::x` is caught.
const OWN_TARGETS: &[&str] = &[
    env!("CARGO_CRATE_NAME"),
    concat!(env!("CARGO_CRATE_NAME"), "::layer"),
    concat!(env!("CARGO_CRATE_NAME"), "::transport"),
];

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that will send [`Event`]s to a
/// GELF collector through a [`Client`].
///
/// With a [`Blocking`] client, every event waits on its send, and failed sends are reported through
/// [`tracing::error!`] (which this layer, in turn, ignores). With a
/// [`Detached`](crate::client::Detached) client, events are shipped in the background & failures
/// go unheard.
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
pub struct Layer<D: Dispatch = Blocking> {
    client: Client<D>,
    map_level: Box<dyn Fn(&tracing::Level) -> Level + Send + Sync>,
}

fn default_level_mapping(level: &tracing::Level) -> Level {
    Level::from(level)
}

impl<D: Dispatch> Layer<D> {
    pub fn new(client: Client<D>) -> Self {
        Layer {
            client,
            map_level: Box::new(default_level_mapping),
        }
    }
    /// Replace the default mapping (TRACE & DEBUG to debug, INFO to informational, and so on)
    pub fn with_level_mapping<F>(mut self, map_level: F) -> Self
    where
        F: Fn(&tracing::Level) -> Level + Send + Sync + 'static,
    {
        self.map_level = Box::new(map_level);
        self
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: Option<String>,
    fields: String,
}

impl EntryVisitor {
    fn push_field(&mut self, name: &str, value: std::fmt::Arguments<'_>) {
        // `log` records bridged through tracing-log carry their metadata as fields
        if name.starts_with("log.") {
            return;
        }
        let _ = write!(self.fields, " {}={}", name, value);
    }
}

impl tracing::field::Visit for EntryVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            // The tracing macros "pre-format" the `message` field so that `value` refers to a
            // `std::fmt::Arguments` instance, which prints without enclosing double-quotes.
            self.message = Some(format!("{:?}", value));
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}

impl<S, D> tracing_subscriber::layer::Layer<S> for Layer<D>
where
    S: tracing_core::subscriber::Subscriber,
    D: Dispatch,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        if OWN_TARGETS.contains(&meta.target()) {
            return;
        }

        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);
        let message = match visitor.message {
            Some(message) => message,
            None => return,
        };

        let mut entry = Entry::new(format!("{}{}", message, visitor.fields))
            .with_short_message(derive_short_message(&message))
            .with_level((*self.map_level)(meta.level()));
        if let Some(line) = meta.line() {
            entry = entry.with_line(line);
        }

        if let Some(err) = self.client.send(entry).into_error() {
            ::tracing::error!("failed to ship an event to the GELF collector: {}", err);
        }
    }
}

#[cfg(test)]
mod smoke {

    use super::*;

    use crate::{env::FixedHostname, transport::Endpoint};

    use tracing_subscriber::{layer::SubscriberExt, registry::Registry};

    use std::{net::UdpSocket, time::Duration};

    fn collector() -> (UdpSocket, Client) {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let port = sock.local_addr().unwrap().port();
        let client = Client::builder("layer-token")
            .endpoint(Endpoint::new("127.0.0.1").with_port(port))
            .hostname(FixedHostname("bree.local".to_owned()))
            .build();
        (sock, client)
    }

    fn recv(sock: &UdpSocket) -> serde_json::Value {
        let mut buf = [0u8; 2048];
        let n = sock.recv(&mut buf).unwrap();
        serde_json::from_slice(&buf[..n]).unwrap()
    }

    #[test]
    fn events_become_entries() {
        let (sock, client) = collector();
        let subscriber = Registry::default().with(Layer::new(client));
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(widgets = 11, name = "frobnicator", "Hello, 世界!");
        });
        let v = recv(&sock);
        assert_eq!(v["short_message"], "Hello, 世界!");
        assert_eq!(v["full_message"], "Hello, 世界! widgets=11 name=frobnicator");
        assert_eq!(v["level"], 4);
        assert_eq!(v["host"], "bree.local");
        assert_eq!(v["_X-OVH-TOKEN"], "layer-token");
        assert!(v["line"].as_u64().unwrap() > 0);
    }

    #[test]
    fn skips_what_it_should() {
        let (sock, client) = collector();
        let subscriber = Registry::default()
            .with(Layer::new(client).with_level_mapping(|_| Level::Notice));
        tracing::subscriber::with_default(subscriber, || {
            // No message field
            tracing::info!(widgets = 11);
            // Our own chatter
            tracing::info!(target: "gelf_ovh::transport", "connected");
            tracing::debug!("the one that counts");
        });
        let v = recv(&sock);
        assert_eq!(v["full_message"], "the one that counts");
        assert_eq!(v["level"], 5);
    }

    #[test]
    fn similar_targets_are_shipped() {
        let (sock, client) = collector();
        let subscriber = Registry::default().with(Layer::new(client));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "gelf_ovh", "crate root");
            tracing::error!(target: "gelf_ovh::layer", "failed to ship");
            tracing::info!(target: "gelf_ovh_app::handlers", "user event from another crate");
            tracing::info!(target: "gelf_ovh::transport::tests", "nested under ours");
        });
        assert_eq!(recv(&sock)["full_message"], "user event from another crate");
        assert_eq!(recv(&sock)["full_message"], "nested under ours");
    }
}
