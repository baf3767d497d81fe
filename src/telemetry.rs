// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Process-wide tracing setup for binaries embedding the descrambler.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the host. [`init_tracing`] is the default choice: a fmt layer filtered
//! by `RUST_LOG` (falling back to `info`).

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<bool> = OnceLock::new();

/// Install the global subscriber. Later calls are no-ops.
///
/// Returns `false` if another subscriber was already installed by the host.
pub fn init_tracing() -> bool {
    *INITIALISED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr);
        Registry::default().with(filter).with(fmt_layer).try_init().is_ok()
    })
}
