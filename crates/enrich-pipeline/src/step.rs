// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;
use thiserror::Error;

use exo_store::{StoreError, TransactionStore};

use crate::context::TransactionContext;
use crate::result::StepResult;

/// One stage of the enrichment pipeline.
///
/// Expected failures (invalid currency, missing reference data, ...) are
/// reported by returning `Ok(StepResult::failure(..))` so the row can
/// continue; `Err` is reserved for unexpected conditions such as store
/// failures, which the runtime wraps into a failed result. Errors are never
/// used for control flow.
#[async_trait]
pub trait EnrichmentStep: Send + Sync {
    /// Used in logs, audit rows and the per-step result map; must be unique
    /// within a pipeline.
    fn name(&self) -> &'static str;

    /// Whether the step should run for this row. The default guard skips
    /// rows a prior step marked fatally failed.
    fn should_execute(&self, ctx: &TransactionContext) -> bool {
        ctx.error_message.is_none()
    }

    async fn run(
        &self,
        ctx: &mut TransactionContext,
        store: &dyn TransactionStore,
    ) -> Result<StepResult, StepError>;
}

/// Unexpected step errors. The pipeline converts these into failed
/// [StepResult]s; they are never propagated out of a batch.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("Store: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("Missing context field '{0}'")]
    MissingField(&'static str),

    #[error("{0}")]
    Message(String),
}
