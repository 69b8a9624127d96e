// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! # Tracing configuration setup.
//!
//! The engine code is instrumented with Rust's `tracing` framework.
//!
//! Calling the `init` function will initialize a global tracing subscriber
//! based on the value of the `EXO_LOG` environment variable, which follows
//! the same conventions as `RUST_LOG`. This provides console logging.
//!
//! Hosts that embed the engine and own their own subscriber (or export to a
//! telemetry backend) should skip `init` and install their own.

use tracing_subscriber::{EnvFilter, filter::LevelFilter, prelude::*};

const EXO_LOG: &str = "EXO_LOG";

/// Initialize the tracing subscriber.
///
/// Creates a compact `tracing_subscriber::fmt` layer filtered by `EXO_LOG`
/// (default level WARN). Returns an error if a global subscriber is already
/// installed.
pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    let fmt_layer = tracing_subscriber::fmt::layer().compact();
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(EXO_LOG)
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
}
