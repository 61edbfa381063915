//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod allocator;
pub mod ids;
pub mod task;

// ===== global functions =====

/// Formats an error together with its full `source()` chain, one "caused
/// by" link at a time.
pub fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
