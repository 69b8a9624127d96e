// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use enrich_pipeline::amount::context_amount_priority;
use enrich_pipeline::{
    EnrichmentStep, ExceptionType, ProcessingStatus, StepError, StepResult, TransactionContext,
    audit, exception, keys,
};
use exo_store::{Predicate, TransactionStore, tables};

use crate::refdata::{Currency, parse_rows};

/// First pipeline step: normalize the currency code and validate it against
/// the currency master.
///
/// An invalid or missing currency is a soft failure: the step reports
/// failure and raises an exception, but does not mark the row fatally
/// errored. Downstream steps guard themselves against unusable currency
/// data.
pub struct CurrencyValidationStep {
    currencies: OnceCell<Vec<Currency>>,
}

impl CurrencyValidationStep {
    pub fn new() -> Self {
        Self {
            currencies: OnceCell::new(),
        }
    }

    async fn currencies(&self, store: &dyn TransactionStore) -> Result<&Vec<Currency>, StepError> {
        self.currencies
            .get_or_try_init(|| async {
                let rows = store
                    .find(tables::CURRENCY_MASTER, &Predicate::True, None, None, None)
                    .await?;
                Ok(parse_rows(tables::CURRENCY_MASTER, &rows, Currency::from_row))
            })
            .await
    }
}

impl Default for CurrencyValidationStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnrichmentStep for CurrencyValidationStep {
    fn name(&self) -> &'static str {
        "currency_validation"
    }

    async fn run(
        &self,
        ctx: &mut TransactionContext,
        store: &dyn TransactionStore,
    ) -> Result<StepResult, StepError> {
        let priority = context_amount_priority(ctx.amount.as_deref());

        let Some(raw) = ctx.currency.as_deref().map(str::trim).filter(|c| !c.is_empty())
        else {
            exception::raise(
                store,
                ctx,
                ExceptionType::MissingCurrency,
                "Transaction carries no currency code",
                priority,
            )
            .await?;
            return Ok(StepResult::failure("Currency is missing"));
        };

        let normalized = raw.to_uppercase();
        ctx.currency = Some(normalized.clone());

        let currencies = self.currencies(store).await?;
        let Some(currency) = currencies
            .iter()
            .find(|c| c.code == normalized && c.active)
        else {
            exception::raise(
                store,
                ctx,
                ExceptionType::InvalidCurrency,
                &format!("Currency '{normalized}' is unknown or inactive"),
                priority,
            )
            .await?;
            return Ok(StepResult::failure(format!(
                "Currency '{normalized}' is unknown or inactive"
            )));
        };

        ctx.set_enrichment(keys::CURRENCY_NAME, currency.name.as_str());
        if let Some(symbol) = &currency.symbol {
            ctx.set_enrichment(keys::CURRENCY_SYMBOL, symbol.as_str());
        }
        if let Some(decimal_places) = currency.decimal_places {
            ctx.set_enrichment(keys::CURRENCY_DECIMAL_PLACES, decimal_places);
        }

        audit::record(
            store,
            ctx,
            self.name(),
            "CURRENCY_VALIDATED",
            &format!("Validated currency {normalized} ({})", currency.name),
        )
        .await;
        ctx.record_status(ProcessingStatus::CurrencyValidated);

        Ok(StepResult::success(format!("Currency {normalized} validated")))
    }
}
