// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// The domain steps of the enrichment pipeline, in their canonical order:
///
/// 1. [CurrencyValidationStep]: normalize and validate the currency code
/// 2. [FxConversionStep]: convert the amount to the EUR base
/// 3. [CustomerIdentificationStep]: multi-method customer matching (BANK only)
/// 4. [CounterpartyStep]: resolve the statement-issuing institution
/// 5. [TransactionTypeMappingStep]: rule-driven classification to an
///    internal transaction type
///
/// Each step follows the same pattern: read what it needs from the context,
/// consult reference data through the store port, write its conclusions into
/// the enrichments map, and flag anything a human must look at as an
/// exception. Reference tables that a step reads wholesale are snapshotted
/// once per step instance; since a pipeline (and thus its steps) is built
/// per batch, the snapshot lives exactly one batch.
pub mod mapping;
pub mod refdata;

mod counterparty;
mod currency;
mod customer;
mod fx;

pub use counterparty::CounterpartyStep;
pub use currency::CurrencyValidationStep;
pub use customer::CustomerIdentificationStep;
pub use fx::FxConversionStep;
pub use mapping::TransactionTypeMappingStep;
