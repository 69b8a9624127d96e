// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::OnceCell;

use enrich_pipeline::amount::{context_amount_priority, parse_amount};
use enrich_pipeline::{
    EnrichmentStep, ExceptionPriority, ExceptionType, ProcessingStatus, StepError, StepResult,
    TransactionContext, audit, exception, keys, sentinel,
};
use exo_store::{Predicate, TransactionStore, tables};

use crate::refdata::{FxRate, parse_rows};

/// How far back a quote may lie and still convert a transaction, in calendar
/// days (inclusive).
const MAX_RATE_AGE_DAYS: u64 = 5;

/// Converts the transaction amount into the EUR base.
///
/// After this step, either `base_amount` holds the EUR-equivalent amount
/// with two decimals, or an `FX_RATE_MISSING` exception has been raised and
/// a placeholder of `0.00` written so downstream steps are not blocked. EUR
/// rows convert 1:1 without touching the rate table.
///
/// Quotes are EUR-based (`exchange_rate` units of target currency per
/// 1 EUR), so converting to EUR divides by the quote.
pub struct FxConversionStep {
    rates: OnceCell<Vec<FxRate>>,
}

impl FxConversionStep {
    pub fn new() -> Self {
        Self {
            rates: OnceCell::new(),
        }
    }

    async fn rates(&self, store: &dyn TransactionStore) -> Result<&Vec<FxRate>, StepError> {
        self.rates
            .get_or_try_init(|| async {
                let rows = store
                    .find(tables::FX_RATES_EUR, &Predicate::True, None, None, None)
                    .await?;
                Ok(parse_rows(tables::FX_RATES_EUR, &rows, FxRate::from_row))
            })
            .await
    }

    /// The newest active quote for `currency` dated within
    /// [`fx_date - MAX_RATE_AGE_DAYS`, `fx_date`].
    fn applicable_rate<'a>(
        rates: &'a [FxRate],
        currency: &str,
        fx_date: NaiveDate,
    ) -> Option<&'a FxRate> {
        let window_start = fx_date.checked_sub_days(Days::new(MAX_RATE_AGE_DAYS))?;
        rates
            .iter()
            .filter(|rate| {
                rate.active
                    && rate.target_currency == currency
                    && rate.effective_date <= fx_date
                    && rate.effective_date >= window_start
            })
            .max_by_key(|rate| rate.effective_date)
    }
}

impl Default for FxConversionStep {
    fn default() -> Self {
        Self::new()
    }
}

fn format_base(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

#[async_trait]
impl EnrichmentStep for FxConversionStep {
    fn name(&self) -> &'static str {
        "fx_conversion"
    }

    async fn run(
        &self,
        ctx: &mut TransactionContext,
        store: &dyn TransactionStore,
    ) -> Result<StepResult, StepError> {
        let Some(currency) = ctx.currency.clone().filter(|c| !c.trim().is_empty()) else {
            exception::raise(
                store,
                ctx,
                ExceptionType::MissingCurrency,
                "Cannot convert to base currency without a currency code",
                context_amount_priority(ctx.amount.as_deref()),
            )
            .await?;
            return Ok(StepResult::failure("Currency is missing"));
        };

        let amount = parse_amount(ctx.amount.as_deref().ok_or(StepError::MissingField("amount"))?)?;

        // EUR converts 1:1, no rate lookup
        if currency == sentinel::BASE_CURRENCY {
            ctx.set_enrichment(keys::ORIGINAL_AMOUNT, amount);
            ctx.set_enrichment(keys::ORIGINAL_CURRENCY, currency.as_str());
            ctx.set_enrichment(keys::BASE_AMOUNT, format_base(amount));
            ctx.set_enrichment(keys::BASE_CURRENCY, sentinel::BASE_CURRENCY);
            ctx.set_enrichment(keys::FX_RATE, "1");
            ctx.set_enrichment(keys::FX_RATE_SOURCE, "BASE_CURRENCY");
            if let Some(fee) = ctx.fee.as_deref().and_then(|f| parse_amount(f).ok()) {
                ctx.set_enrichment(keys::BASE_FEE, format_base(fee));
            }

            audit::record(
                store,
                ctx,
                self.name(),
                "BASE_CURRENCY_CALCULATED",
                "Amount already in base currency",
            )
            .await;
            ctx.record_status(ProcessingStatus::FxConverted);
            return Ok(StepResult::success("Amount already in EUR"));
        }

        let fx_date = ctx.transaction_date;
        let rate = match fx_date {
            Some(fx_date) => {
                let rates = self.rates(store).await?;
                Self::applicable_rate(rates, &currency, fx_date).cloned()
            }
            None => None,
        };

        let Some(rate) = rate else {
            exception::raise(
                store,
                ctx,
                ExceptionType::FxRateMissing,
                &format!(
                    "No active {currency} rate within {MAX_RATE_AGE_DAYS} days of {}",
                    fx_date.map(|d| d.to_string()).unwrap_or_else(|| "an unknown date".to_string()),
                ),
                ExceptionPriority::High,
            )
            .await?;

            // placeholder so downstream steps are not blocked
            ctx.set_enrichment(keys::BASE_AMOUNT, "0.00");
            ctx.set_enrichment(keys::FX_RATE, "0");
            return Ok(StepResult::success(format!(
                "No usable {currency} rate; wrote placeholder base amount"
            )));
        };

        // fx_date is present whenever a rate was found
        let fx_date = fx_date.ok_or(StepError::MissingField("transaction_date"))?;
        let age_days = (fx_date - rate.effective_date).num_days();
        if age_days > 0 {
            exception::raise(
                store,
                ctx,
                ExceptionType::OldFxRate,
                &format!(
                    "Converted with a {age_days}-day-old {currency} rate dated {}",
                    rate.effective_date
                ),
                ExceptionPriority::Low,
            )
            .await?;
        }

        let rate_to_eur = Decimal::ONE / rate.exchange_rate;
        let base_amount = amount / rate.exchange_rate;

        ctx.set_enrichment(keys::ORIGINAL_AMOUNT, amount);
        ctx.set_enrichment(keys::ORIGINAL_CURRENCY, currency.as_str());
        ctx.set_enrichment(keys::BASE_AMOUNT, format_base(base_amount));
        ctx.set_enrichment(keys::BASE_CURRENCY, sentinel::BASE_CURRENCY);
        ctx.set_enrichment(
            keys::FX_RATE,
            rate_to_eur
                .round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
                .normalize(),
        );
        ctx.set_enrichment(keys::FX_RATE_DATE, rate.effective_date.to_string());
        ctx.set_enrichment(keys::FX_RATE_SOURCE, "MARKET_RATE");
        if let Some(fee) = ctx.fee.as_deref().and_then(|f| parse_amount(f).ok()) {
            ctx.set_enrichment(keys::BASE_FEE, format_base(fee / rate.exchange_rate));
        }

        audit::record(
            store,
            ctx,
            self.name(),
            "BASE_CURRENCY_CALCULATED",
            &format!(
                "Converted {amount} {currency} with rate dated {}",
                rate.effective_date
            ),
        )
        .await;
        ctx.record_status(ProcessingStatus::FxConverted);

        Ok(StepResult::success(format!(
            "Converted {currency} amount to EUR"
        )))
    }
}
