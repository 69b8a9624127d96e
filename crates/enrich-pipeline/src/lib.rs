// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// The generic enrichment pipeline runtime.
///
/// A [Pipeline] executes an ordered sequence of [EnrichmentStep]s against a
/// per-row [TransactionContext], producing a [RowResult] per row and a
/// [BatchResult] per batch. The runtime is deliberately dumb: it owns step
/// ordering, skip/abort bookkeeping and timing, and nothing else. Steps carry
/// all domain behavior and communicate through the context's enrichments map
/// (see [keys] for the recognized entries).
///
/// Failure handling follows a continue-by-default policy: a failed step is
/// recorded and, unless stop-on-error is set, the remaining steps still run
/// so that each can contribute what it can. A step that returns `Err` (an
/// unexpected error, e.g. a store failure) is converted by the runtime into a
/// failed [StepResult] carrying the error text; it never tears down the
/// batch.
pub mod amount;
pub mod audit;
pub mod exception;
pub mod keys;

mod context;
mod pipeline;
mod result;
mod step;

pub use context::{ProcessingStatus, SourceType, TransactionContext};
pub use exception::{ExceptionPriority, ExceptionType};
pub use pipeline::Pipeline;
pub use result::{BatchResult, RowResult, StepRecord, StepResult};
pub use step::{EnrichmentStep, StepError};

/// Sentinel enrichment values that let processing progress past an unresolved
/// lookup while flagging an exception.
pub mod sentinel {
    /// Customer or counterparty that could not be identified.
    pub const UNKNOWN: &str = "UNKNOWN";
    /// Transaction type no mapping rule matched.
    pub const UNMATCHED: &str = "UNMATCHED";
    /// Owner of universal (non-counterparty-specific) mapping rules.
    pub const SYSTEM: &str = "SYSTEM";
    /// The fixed base currency of the engine.
    pub const BASE_CURRENCY: &str = "EUR";
}
