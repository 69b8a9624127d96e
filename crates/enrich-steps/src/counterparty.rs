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
    EnrichmentStep, ExceptionType, ProcessingStatus, SourceType, StepError, StepResult,
    TransactionContext, audit, exception, keys, sentinel,
};
use exo_store::{Predicate, TransactionStore, tables};

use crate::refdata::{Counterparty, CounterpartyKind, parse_rows};

/// Resolves the counterparty of a transaction: the institution that issued
/// the statement, not the payment's other side. Classification rules are
/// authored per issuing institution, so the counterparty id found here
/// scopes the rule lookup of the next step.
///
/// BANK rows match the statement bank's BIC against bank counterparties.
/// SECU rows first infer whether the institution acted as broker or
/// custodian from the transaction type, then match accordingly (brokers
/// indirect through the broker master, whose rows carry the BIC).
pub struct CounterpartyStep {
    counterparties: OnceCell<Vec<Counterparty>>,
}

impl CounterpartyStep {
    pub fn new() -> Self {
        Self {
            counterparties: OnceCell::new(),
        }
    }

    async fn counterparties(
        &self,
        store: &dyn TransactionStore,
    ) -> Result<&Vec<Counterparty>, StepError> {
        self.counterparties
            .get_or_try_init(|| async {
                let rows = store
                    .find(
                        tables::COUNTERPARTY_MASTER,
                        &Predicate::True,
                        None,
                        None,
                        None,
                    )
                    .await?;
                Ok(parse_rows(
                    tables::COUNTERPARTY_MASTER,
                    &rows,
                    Counterparty::from_row,
                ))
            })
            .await
    }

    /// Securities rows: what role did the statement bank play?
    fn infer_secu_kind(txn_type: Option<&str>) -> CounterpartyKind {
        let Some(txn_type) = txn_type else {
            return CounterpartyKind::Custodian;
        };
        let upper = txn_type.to_uppercase();
        if ["BUY", "SELL", "TRADE"].iter().any(|t| upper.contains(t)) {
            CounterpartyKind::Broker
        } else if ["CUSTODY", "SAFEKEEPING", "DIVIDEND", "CORPORATE"]
            .iter()
            .any(|t| upper.contains(t))
        {
            CounterpartyKind::Custodian
        } else {
            CounterpartyKind::Custodian
        }
    }

    async fn resolve<'a>(
        &self,
        counterparties: &'a [Counterparty],
        ctx: &TransactionContext,
        store: &dyn TransactionStore,
        statement_bank: &str,
    ) -> Result<Option<&'a Counterparty>, StepError> {
        let active = counterparties.iter().filter(|cp| cp.is_active);

        match ctx.source_type() {
            SourceType::Bank => Ok(active
                .filter(|cp| cp.kind == CounterpartyKind::Bank)
                .find(|cp| cp.bank_id.as_deref() == Some(statement_bank))),
            SourceType::Secu => match Self::infer_secu_kind(ctx.txn_type.as_deref()) {
                CounterpartyKind::Broker => {
                    // broker counterparties reference a broker-master row,
                    // which carries the BIC
                    let brokers = store
                        .find(
                            tables::BROKER,
                            &Predicate::eq("bic", statement_bank),
                            None,
                            None,
                            None,
                        )
                        .await?;
                    let Some(broker) = brokers.first() else {
                        return Ok(None);
                    };
                    Ok(active
                        .filter(|cp| cp.kind == CounterpartyKind::Broker)
                        .find(|cp| cp.broker_id.as_deref() == Some(broker.id())))
                }
                _ => Ok(active
                    .filter(|cp| cp.kind == CounterpartyKind::Custodian)
                    .find(|cp| cp.custodian_id.as_deref() == Some(statement_bank))),
            },
        }
    }
}

impl Default for CounterpartyStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnrichmentStep for CounterpartyStep {
    fn name(&self) -> &'static str {
        "counterparty_determination"
    }

    async fn run(
        &self,
        ctx: &mut TransactionContext,
        store: &dyn TransactionStore,
    ) -> Result<StepResult, StepError> {
        // the payment's other side, recorded for reference only
        if ctx.source_type() == SourceType::Bank {
            if let Some(bic) = ctx.other_side_bic.clone() {
                ctx.set_enrichment(keys::OTHER_SIDE_BIC, bic.as_str());
            }
            if let Some(name) = ctx.other_side_name.clone() {
                ctx.set_enrichment(keys::OTHER_SIDE_NAME, name.as_str());
            }
        }

        let statement_bank = ctx
            .statement_bank
            .clone()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        let counterparty = match &statement_bank {
            Some(statement_bank) => {
                let counterparties = self.counterparties(store).await?;
                self.resolve(counterparties, ctx, store, statement_bank)
                    .await?
                    .cloned()
            }
            None => None,
        };

        let Some(counterparty) = counterparty else {
            exception::raise(
                store,
                ctx,
                ExceptionType::CounterpartyNotFound,
                &format!(
                    "No active counterparty for statement bank '{}'",
                    statement_bank.as_deref().unwrap_or("")
                ),
                context_amount_priority(ctx.amount.as_deref()),
            )
            .await?;
            ctx.set_enrichment(keys::COUNTERPARTY_ID, sentinel::UNKNOWN);
            ctx.record_status(ProcessingStatus::CounterpartyDetermined);
            return Ok(StepResult::success("No counterparty found"));
        };

        ctx.set_enrichment(keys::COUNTERPARTY_ID, counterparty.id.as_str());
        ctx.set_enrichment(keys::COUNTERPARTY_TYPE, counterparty.kind.as_str());
        if let Some(statement_bank) = &statement_bank {
            ctx.set_enrichment(keys::COUNTERPARTY_BIC, statement_bank.as_str());
        }
        ctx.set_enrichment(keys::COUNTERPARTY_NAME, counterparty.name.as_str());
        if let Some(short_code) = &counterparty.short_code {
            // used downstream for GL-account construction
            ctx.set_enrichment(keys::COUNTERPARTY_SHORT_CODE, short_code.as_str());
        }

        audit::record(
            store,
            ctx,
            self.name(),
            "COUNTERPARTY_DETERMINED",
            &format!(
                "Resolved {} ({}) for statement bank",
                counterparty.id,
                counterparty.kind.as_str()
            ),
        )
        .await;
        ctx.record_status(ProcessingStatus::CounterpartyDetermined);

        Ok(StepResult::success(format!(
            "Counterparty {} determined",
            counterparty.id
        )))
    }
}
