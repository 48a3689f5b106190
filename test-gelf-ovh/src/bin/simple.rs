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

//! Send a single entry, built by hand.

use gelf_ovh::{entry::Entry, level::Level};
use gelf_ovh_test::{builder_from_env, init_stderr_logging};

pub fn main() {
    init_stderr_logging();
    let client = builder_from_env(None).unwrap().build();

    let entry = Entry::new("helo world")
        .with_host("localhost")
        .with_level(Level::Informational);
    if let Err(err) = client.send(entry) {
        eprintln!("{}", err);
        std::process::exit(2);
    }
}
