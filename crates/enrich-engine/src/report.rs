// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;
use std::time::Duration;

use indexmap::IndexMap;

use enrich_pipeline::{BatchResult, StepRecord};

/// Per-step tallies across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepTally {
    pub executed: usize,
    pub succeeded: usize,
    pub skipped: usize,
}

/// Aggregate outcome of one controller run, suitable for host logs.
#[derive(Debug)]
pub struct BatchReport {
    batch_id: Option<String>,
    total_count: usize,
    success_count: usize,
    failure_count: usize,
    elapsed: Duration,
    step_tallies: IndexMap<String, StepTally>,
}

impl BatchReport {
    pub fn new(batch_id: Option<String>, batch: &BatchResult) -> Self {
        let mut step_tallies: IndexMap<String, StepTally> = IndexMap::new();
        for row in batch.row_results() {
            for (name, record) in row.steps() {
                let tally = step_tallies.entry(name.to_string()).or_default();
                match record {
                    StepRecord::Skipped => tally.skipped += 1,
                    StepRecord::Completed(result) => {
                        tally.executed += 1;
                        if result.success {
                            tally.succeeded += 1;
                        }
                    }
                }
            }
        }

        Self {
            batch_id,
            total_count: batch.total_count(),
            success_count: batch.success_count(),
            failure_count: batch.failure_count(),
            elapsed: batch.elapsed(),
            step_tallies,
        }
    }

    pub fn batch_id(&self) -> Option<&str> {
        self.batch_id.as_deref()
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn step_tally(&self, step: &str) -> Option<StepTally> {
        self.step_tallies.get(step).copied()
    }

    pub fn step_tallies(&self) -> impl Iterator<Item = (&str, StepTally)> + '_ {
        self.step_tallies.iter().map(|(name, tally)| (name.as_str(), *tally))
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Enriched {} rows ({} ok, {} failed) in {:?}{}",
            self.total_count,
            self.success_count,
            self.failure_count,
            self.elapsed,
            self.batch_id
                .as_deref()
                .map(|id| format!(" [batch {id}]"))
                .unwrap_or_default(),
        )?;
        for (name, tally) in &self.step_tallies {
            writeln!(
                f,
                "  {name}: {}/{} succeeded, {} skipped",
                tally.succeeded, tally.executed, tally.skipped
            )?;
        }
        Ok(())
    }
}
