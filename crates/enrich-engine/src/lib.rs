// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// The enrichment controller: the thin composition layer a host runtime
/// invokes.
///
/// [EnrichmentController] loads staged statement rows into contexts, runs
/// them through the standard pipeline (currency validation, base-currency
/// conversion, customer identification, counterparty determination,
/// transaction-type mapping), hands the enriched contexts to the persister
/// and reports the aggregate outcome. No business logic lives here.
mod config;
mod controller;
mod engine_error;
mod loader;
mod persister;
mod report;

pub use config::EnrichmentConfig;
pub use controller::{EnrichmentController, standard_pipeline};
pub use engine_error::EngineError;
pub use loader::{ContextLoader, StagedTransactionLoader};
pub use persister::{EnrichedRowPersister, EnrichmentPersister};
pub use report::BatchReport;
