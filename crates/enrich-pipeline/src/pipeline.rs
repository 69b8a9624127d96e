// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Instant;

use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use exo_store::TransactionStore;

use crate::context::TransactionContext;
use crate::result::{BatchResult, RowResult, StepRecord, StepResult};
use crate::step::EnrichmentStep;

/// An ordered sequence of [EnrichmentStep]s.
///
/// Steps run in insertion order, each at most once per row. The runtime
/// records a [StepRecord] per step, converts step errors into failed
/// results, and never mutates the context or touches the store itself.
/// Rows are fully isolated: one row's failure cannot affect another row's
/// context.
pub struct Pipeline {
    steps: Vec<Box<dyn EnrichmentStep>>,
    stop_on_error: bool,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: vec![],
            stop_on_error: false,
        }
    }

    pub fn add_step(mut self, step: impl EnrichmentStep + 'static) -> Self {
        debug_assert!(
            !self.steps.iter().any(|s| s.name() == step.name()),
            "duplicate step name '{}'",
            step.name()
        );
        self.steps.push(Box::new(step));
        self
    }

    /// Abort the remaining steps of a row once one fails. Off by default:
    /// downstream steps usually can still contribute partial enrichments.
    pub fn with_stop_on_error(mut self, stop_on_error: bool) -> Self {
        self.stop_on_error = stop_on_error;
        self
    }

    pub fn step_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|s| s.name())
    }

    /// Run all steps for one row.
    #[instrument(name = "Pipeline::execute", skip_all, fields(transaction_id = ctx.transaction_id()))]
    pub async fn execute(
        &self,
        ctx: &mut TransactionContext,
        store: &dyn TransactionStore,
    ) -> RowResult {
        let start = Instant::now();
        let mut records: IndexMap<String, StepRecord> = IndexMap::new();
        let mut aborted = false;

        for step in &self.steps {
            if aborted || ctx.is_cancelled() || !step.should_execute(ctx) {
                debug!(step = step.name(), "Skipping step");
                records.insert(step.name().to_string(), StepRecord::Skipped);
                continue;
            }

            let result = match step.run(ctx, store).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(step = step.name(), error = %e, "Step raised an unexpected error");
                    StepResult::failure(e.to_string())
                }
            };

            if !result.success && self.stop_on_error {
                aborted = true;
            }
            records.insert(step.name().to_string(), StepRecord::Completed(result));
        }

        RowResult::new(ctx.transaction_id().to_string(), records, start.elapsed())
    }

    /// Run all steps for every row, collecting per-row results. Contexts are
    /// processed independently; the declared step order is observed within
    /// each row.
    #[instrument(name = "Pipeline::execute_batch", skip_all, fields(rows = contexts.len()))]
    pub async fn execute_batch(
        &self,
        contexts: &mut [TransactionContext],
        store: &dyn TransactionStore,
    ) -> BatchResult {
        let start = Instant::now();
        let mut row_results = Vec::with_capacity(contexts.len());
        for ctx in contexts.iter_mut() {
            row_results.push(self.execute(ctx, store).await);
        }
        BatchResult::new(row_results, start.elapsed())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
