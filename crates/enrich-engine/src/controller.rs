// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use tracing::{info, instrument};

use enrich_pipeline::Pipeline;
use enrich_steps::{
    CounterpartyStep, CurrencyValidationStep, CustomerIdentificationStep, FxConversionStep,
    TransactionTypeMappingStep,
};
use exo_store::TransactionStore;

use crate::config::EnrichmentConfig;
use crate::engine_error::EngineError;
use crate::loader::{ContextLoader, StagedTransactionLoader};
use crate::persister::{EnrichedRowPersister, EnrichmentPersister};
use crate::report::BatchReport;

/// The standard step sequence. Steps hold per-batch reference snapshots, so
/// a pipeline must be built fresh for every batch.
pub fn standard_pipeline(stop_on_error: bool) -> Pipeline {
    Pipeline::new()
        .add_step(CurrencyValidationStep::new())
        .add_step(FxConversionStep::new())
        .add_step(CustomerIdentificationStep::new())
        .add_step(CounterpartyStep::new())
        .add_step(TransactionTypeMappingStep::new())
        .with_stop_on_error(stop_on_error)
}

/// Thin orchestration of one enrichment run: load, execute, persist,
/// report.
pub struct EnrichmentController {
    config: EnrichmentConfig,
    loader: Box<dyn ContextLoader>,
    persister: Box<dyn EnrichmentPersister>,
}

impl EnrichmentController {
    pub fn new(config: EnrichmentConfig) -> Self {
        Self {
            config,
            loader: Box::new(StagedTransactionLoader),
            persister: Box::new(EnrichedRowPersister),
        }
    }

    pub fn with_loader(mut self, loader: impl ContextLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_persister(mut self, persister: impl EnrichmentPersister + 'static) -> Self {
        self.persister = Box::new(persister);
        self
    }

    #[instrument(name = "EnrichmentController::run", skip_all, fields(batch_id = ?self.config.batch_id))]
    pub async fn run(&self, store: &dyn TransactionStore) -> Result<BatchReport, EngineError> {
        let mut contexts = self.loader.load(store, &self.config).await?;
        info!(rows = contexts.len(), "Loaded staged transactions");

        let pipeline = standard_pipeline(self.config.stop_on_error);
        let batch = pipeline.execute_batch(&mut contexts, store).await;

        self.persister.persist(store, &contexts, &batch).await?;

        let report = BatchReport::new(self.config.batch_id.clone(), &batch);
        info!(
            total = report.total_count(),
            failed = report.failure_count(),
            elapsed = ?report.elapsed(),
            "Enrichment batch finished"
        );
        Ok(report)
    }
}
