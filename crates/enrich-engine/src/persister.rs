// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::BTreeSet;

use async_trait::async_trait;

use common::Val;
use enrich_pipeline::{BatchResult, TransactionContext};
use exo_store::{Row, TransactionStore, tables};

use crate::engine_error::EngineError;

/// Writes the fully annotated records back. One success return per context
/// it accepts.
#[async_trait]
pub trait EnrichmentPersister: Send + Sync {
    async fn persist(
        &self,
        store: &dyn TransactionStore,
        contexts: &[TransactionContext],
        batch: &BatchResult,
    ) -> Result<(), EngineError>;
}

/// Flattens each context (input fields, checkpoints, enrichments) into one
/// `enriched_transaction` row keyed by transaction id, then marks the parent
/// statements enriched.
pub struct EnrichedRowPersister;

/// Enrichment values are stored in their raw field form; only non-string
/// values go through their display form.
fn field_value(val: &Val) -> String {
    match val {
        Val::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl EnrichedRowPersister {
    fn enriched_row(ctx: &TransactionContext, overall_success: bool) -> Row {
        let mut row = Row::new(ctx.transaction_id())
            .with("statement_id", ctx.statement_id())
            .with("source_type", ctx.source_type().as_str())
            .with("currency", ctx.currency.as_deref().unwrap_or_default())
            .with("amount", ctx.amount.as_deref().unwrap_or_default())
            .with(
                "transaction_date",
                ctx.transaction_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            )
            .with(
                "processing_status",
                ctx.processing_status()
                    .map(|s| s.as_str())
                    .unwrap_or_default(),
            )
            .with(
                "processed_steps",
                ctx.processed_steps()
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            )
            .with("overall_success", if overall_success { "true" } else { "false" });

        for (key, value) in ctx.enrichments() {
            row.set(key, field_value(value));
        }
        row
    }
}

#[async_trait]
impl EnrichmentPersister for EnrichedRowPersister {
    async fn persist(
        &self,
        store: &dyn TransactionStore,
        contexts: &[TransactionContext],
        batch: &BatchResult,
    ) -> Result<(), EngineError> {
        let rows = contexts
            .iter()
            .zip(batch.row_results())
            .map(|(ctx, row_result)| Self::enriched_row(ctx, row_result.overall_success()))
            .collect();
        store
            .save_or_update(tables::ENRICHED_TRANSACTION, rows)
            .await?;

        let statement_ids: BTreeSet<&str> = contexts
            .iter()
            .map(|ctx| ctx.statement_id())
            .filter(|id| !id.is_empty())
            .collect();
        for statement_id in statement_ids {
            let mut statement = store
                .load(tables::STATEMENT, statement_id)
                .await?
                .unwrap_or_else(|| Row::new(statement_id));
            statement.set("status", "enriched");
            store
                .save_or_update(tables::STATEMENT, vec![statement])
                .await?;
        }

        Ok(())
    }
}
