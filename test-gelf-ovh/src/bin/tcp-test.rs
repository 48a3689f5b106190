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

//! Test shipping tracing events over TCP (or TLS, with `--tls`), in the background.

use gelf_ovh::{layer::Layer, transport::Protocol};
use gelf_ovh_test::{builder_from_env, init_stderr_logging};

use tracing::{debug, error, info, trace, warn};

pub fn main() {
    let protocol = if std::env::args().any(|arg| arg == "--tls") {
        Protocol::Tls
    } else {
        Protocol::Tcp
    };
    let client = builder_from_env(Some(protocol)).unwrap().build_detached();

    // Ship through a layer on a detached client, so nothing here waits on the network...
    use tracing_subscriber::{layer::SubscriberExt, registry::Registry};
    let subscriber = Registry::default().with(Layer::new(client.clone()));
    tracing::subscriber::with_default(subscriber, || {
        trace!("你好, TCP socket.");
        debug!("你好, TCP socket.");
        info!("你好, TCP socket.");
        warn!("你好, TCP socket.");
        error!("你好, TCP socket.");
    });

    // and then once more by hand, with our own diagnostics on stderr.
    init_stderr_logging();
    client.print_fmt(format_args!("sent over {}", protocol));

    // Detached sends run on their own threads; give them a moment before we exit.
    std::thread::sleep(std::time::Duration::from_secs(2));
}
