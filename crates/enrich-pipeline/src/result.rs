// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use indexmap::IndexMap;

use common::Val;

/// What a step reports back to the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub success: bool,
    pub message: String,
    /// Step-specific structured output, informational only.
    pub payload: Option<Val>,
}

impl StepResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Val) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// One entry of a row's per-step map: either the step ran and produced a
/// [StepResult], or it was skipped (guard returned false, a prior abort, or
/// cancellation).
#[derive(Debug, Clone, PartialEq)]
pub enum StepRecord {
    Skipped,
    Completed(StepResult),
}

impl StepRecord {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepRecord::Completed(result) if !result.success)
    }

    pub fn result(&self) -> Option<&StepResult> {
        match self {
            StepRecord::Completed(result) => Some(result),
            StepRecord::Skipped => None,
        }
    }
}

/// Outcome of running the pipeline for one row. The per-step map preserves
/// pipeline order and holds at most one entry per step name.
#[derive(Debug)]
pub struct RowResult {
    transaction_id: String,
    steps: IndexMap<String, StepRecord>,
    elapsed: Duration,
}

impl RowResult {
    pub(crate) fn new(
        transaction_id: String,
        steps: IndexMap<String, StepRecord>,
        elapsed: Duration,
    ) -> Self {
        Self {
            transaction_id,
            steps,
            elapsed,
        }
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn steps(&self) -> impl Iterator<Item = (&str, &StepRecord)> + '_ {
        self.steps.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn step(&self, name: &str) -> Option<&StepRecord> {
        self.steps.get(name)
    }

    /// True when no executed step reported failure (skipped steps do not
    /// count against the row).
    pub fn overall_success(&self) -> bool {
        !self.steps.values().any(StepRecord::is_failure)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Aggregate outcome of a batch run.
#[derive(Debug)]
pub struct BatchResult {
    row_results: Vec<RowResult>,
    elapsed: Duration,
}

impl BatchResult {
    pub(crate) fn new(row_results: Vec<RowResult>, elapsed: Duration) -> Self {
        Self {
            row_results,
            elapsed,
        }
    }

    pub fn row_results(&self) -> &[RowResult] {
        &self.row_results
    }

    pub fn total_count(&self) -> usize {
        self.row_results.len()
    }

    pub fn success_count(&self) -> usize {
        self.row_results
            .iter()
            .filter(|r| r.overall_success())
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.total_count() - self.success_count()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
