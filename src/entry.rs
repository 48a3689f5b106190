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

//! The GELF log record.
//!
//! An [`Entry`] is a plain value: callers build one, the [`Client`](crate::client::Client) fills in
//! whatever they left unset & stamps its own version & token on it, and it's then encoded & dropped.

use crate::{
    env::{gelf_timestamp, Clock, Hostname},
    level::Level,
};

use serde::Serialize;

/// The GELF version we speak
pub const GELF_VERSION: &str = "1.1";

/// `short_message` is derived from the first this-many characters of `full_message`
pub const SHORT_MESSAGE_MAX_CHARS: usize = 80;

/// One log record, laid out the way the collector expects to see it on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Entry {
    pub version: String,
    pub host: String,
    pub short_message: String,
    pub full_message: String,
    /// Seconds since the epoch, with millisecond precision; zero means "now"
    #[serde(rename = "time_stamp")]
    pub timestamp: f64,
    pub level: Level,
    #[serde(serialize_with = "line_or_zero")]
    pub line: Option<u32>,
    /// Injected by the client; whatever the caller puts here is overwritten
    #[serde(rename = "_X-OVH-TOKEN")]
    pub auth_token: String,
}

fn line_or_zero<S: serde::Serializer>(
    line: &Option<u32>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u32(line.unwrap_or(0))
}

impl Entry {
    /// An informational entry carrying `full_message`; everything else is left to defaults.
    pub fn new<M: Into<String>>(full_message: M) -> Entry {
        Entry {
            full_message: full_message.into(),
            ..Default::default()
        }
    }
    pub fn with_level(mut self, level: Level) -> Entry {
        self.level = level;
        self
    }
    pub fn with_host<H: Into<String>>(mut self, host: H) -> Entry {
        self.host = host.into();
        self
    }
    pub fn with_short_message<M: Into<String>>(mut self, short_message: M) -> Entry {
        self.short_message = short_message.into();
        self
    }
    pub fn with_timestamp(mut self, timestamp: f64) -> Entry {
        self.timestamp = timestamp;
        self
    }
    pub fn with_line(mut self, line: u32) -> Entry {
        self.line = Some(line);
        self
    }

    /// Fill in the fields the caller left unset, and overwrite those the client owns.
    ///
    /// `version` & `auth_token` are always replaced. `host`, `timestamp` & `short_message` are
    /// only replaced when empty (zero, in the case of `timestamp`).
    pub fn fill_defaults(&mut self, token: &str, clock: &dyn Clock, hostname: &dyn Hostname) {
        self.auth_token = token.to_owned();
        self.version = GELF_VERSION.to_owned();
        if self.host.is_empty() {
            self.host = hostname.hostname();
        }
        if self.timestamp == 0.0 {
            self.timestamp = gelf_timestamp(&clock.now());
        }
        if self.short_message.is_empty() {
            self.short_message = derive_short_message(&self.full_message);
        }
    }
}

/// The first [`SHORT_MESSAGE_MAX_CHARS`] characters of `full`, with an ellipsis if anything was
/// cut.
pub fn derive_short_message(full: &str) -> String {
    match full.char_indices().nth(SHORT_MESSAGE_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &full[..cut]),
        None => full.to_owned(),
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::env::{FixedClock, FixedHostname};

    use chrono::prelude::*;

    fn fill(mut entry: Entry) -> Entry {
        entry.fill_defaults(
            "my-token",
            &FixedClock(Utc.timestamp_millis_opt(1_656_000_000_250).unwrap()),
            &FixedHostname("bree.local".to_owned()),
        );
        entry
    }

    #[test]
    fn short_message() {
        for len in [0, 1, 79, 80] {
            let full = "x".repeat(len);
            assert_eq!(derive_short_message(&full), full);
        }
        for len in [81, 82, 200, 4096] {
            let full = "y".repeat(len);
            let short = derive_short_message(&full);
            assert_eq!(short.chars().count(), 83);
            assert_eq!(&short[..80], &full[..80]);
            assert!(short.ends_with("..."));
        }
        // Counted in characters, not bytes
        let full = "世".repeat(81);
        let short = derive_short_message(&full);
        assert_eq!(short.chars().count(), 83);
        assert_eq!(short, format!("{}...", "世".repeat(80)));
        assert_eq!(derive_short_message(&"界".repeat(80)), "界".repeat(80));
    }

    #[test]
    fn defaults() {
        let e = fill(Entry::new("helo world"));
        assert_eq!(e.version, "1.1");
        assert_eq!(e.auth_token, "my-token");
        assert_eq!(e.host, "bree.local");
        assert_eq!(e.short_message, "helo world");
        assert_eq!(e.timestamp, 1_656_000_000.25);
        assert_eq!(e.level, Level::Informational);
        assert_eq!(e.line, None);
    }

    #[test]
    fn caller_values_survive_where_allowed() {
        let mut e = Entry::new("helo world")
            .with_host("localhost")
            .with_short_message("hi")
            .with_timestamp(12.5)
            .with_level(Level::Error)
            .with_line(42);
        e.version = "0.9".to_owned();
        e.auth_token = "forged".to_owned();
        let e = fill(e);
        assert_eq!(e.version, "1.1");
        assert_eq!(e.auth_token, "my-token");
        assert_eq!(e.host, "localhost");
        assert_eq!(e.short_message, "hi");
        assert_eq!(e.timestamp, 12.5);
        assert_eq!(e.level, Level::Error);
        assert_eq!(e.line, Some(42));
    }

    #[test]
    fn wire_names() {
        let e = fill(Entry::new("helo world").with_host("localhost"));
        let v: serde_json::Value = serde_json::to_value(&e).unwrap();
        let obj = v.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "_X-OVH-TOKEN",
                "full_message",
                "host",
                "level",
                "line",
                "short_message",
                "time_stamp",
                "version"
            ]
        );
        assert_eq!(obj["line"], 0);
        assert_eq!(obj["_X-OVH-TOKEN"], "my-token");
    }
}
