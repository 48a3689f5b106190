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

//! Send the first line read from stdin:
//!
//! ```text
//! echo "hello OVH logs" | from-stdin
//! ```

use gelf_ovh_test::builder_from_env;

use std::io::BufRead;

pub fn main() {
    let client = builder_from_env(None).unwrap().build();

    let mut line = String::new();
    if let Err(err) = std::io::stdin().lock().read_line(&mut line) {
        eprintln!("couldn't read stdin: {}", err);
        std::process::exit(1);
    }
    if let Err(err) = client.print(line.trim_end_matches(&['\r', '\n'][..])) {
        eprintln!("{}", err);
        std::process::exit(2);
    }
}
