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

//! Process-wide facts an [`Entry`](crate::entry::Entry) defaults from.
//!
//! The wall clock & the local hostname are modeled as capabilities handed to the
//! [`Client`](crate::client::Client) so that tests (or callers with opinions) can pin them.

use chrono::prelude::*;

/// Something that can tell the time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that's always at the same instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Something that can name the host we're running on.
pub trait Hostname: Send + Sync {
    fn hostname(&self) -> String;
}

/// Ask the operating system.
///
/// This will first simply try [gethostname()], then fall back to the primary local IP address, and
/// finally to the string "undefined". It cannot fail.
///
/// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHostname;

impl Hostname for SystemHostname {
    fn hostname(&self) -> String {
        hostname::get()
            .ok()
            .and_then(|hn| hn.into_string().ok())
            .filter(|hn| !hn.is_empty())
            .or_else(|| local_ip_address::local_ip().ok().map(|ip| ip.to_string()))
            .unwrap_or_else(|| "undefined".to_owned())
    }
}

/// A hostname fixed at construction.
#[derive(Clone, Debug)]
pub struct FixedHostname(pub String);

impl Hostname for FixedHostname {
    fn hostname(&self) -> String {
        self.0.clone()
    }
}

/// Seconds since the epoch, truncated to millisecond precision.
pub fn gelf_timestamp(t: &DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn timestamps() {
        let t = Utc.timestamp_millis_opt(1_656_000_000_123).unwrap();
        assert_eq!(gelf_timestamp(&t), 1_656_000_000.123);
        // Sub-millisecond precision is dropped
        let t = Utc.timestamp_nanos(1_656_000_000_123_987_654);
        assert_eq!(gelf_timestamp(&t), 1_656_000_000.123);
        assert_eq!(gelf_timestamp(&FixedClock(t).now()), 1_656_000_000.123);
    }

    #[test]
    fn hostnames() {
        // At least _exercise_ the system lookup; it always yields something
        assert!(!SystemHostname.hostname().is_empty());
        assert_eq!(FixedHostname("bree.local".to_owned()).hostname(), "bree.local");
    }
}
