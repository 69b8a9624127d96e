// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Rule-driven classification of a transaction to its canonical internal
//! type (the "F14" mapping of statement parlance).

mod expression;
mod matcher;
mod rule;

pub use expression::{ExpressionError, evaluate as evaluate_expression};
pub use matcher::rule_matches;
pub use rule::{DEFAULT_PRIORITY, MappingRule, MatchOperator, sort_for_evaluation};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OnceCell;

use enrich_pipeline::{
    EnrichmentStep, ExceptionPriority, ExceptionType, ProcessingStatus, SourceType, StepError,
    StepResult, TransactionContext, audit, exception, keys, sentinel,
};
use exo_store::{Predicate, TransactionStore, tables};

use crate::refdata::parse_rows;

/// Classifies the transaction by evaluating counterparty-scoped mapping
/// rules in deterministic order; the first rule that holds wins.
///
/// Rules are loaded for the row's counterparty plus the universal `SYSTEM`
/// scope, restricted to the row's source type, active status and an
/// effective date not in the future. Counterparty-specific rules always
/// outrank `SYSTEM` rules, regardless of priority numbers.
///
/// A row that no rule classifies continues with `internal_type = UNMATCHED`
/// and an exception; classification never fails a row.
pub struct TransactionTypeMappingStep {
    rules: OnceCell<Vec<MappingRule>>,
}

impl TransactionTypeMappingStep {
    pub fn new() -> Self {
        Self {
            rules: OnceCell::new(),
        }
    }

    async fn rules(&self, store: &dyn TransactionStore) -> Result<&Vec<MappingRule>, StepError> {
        self.rules
            .get_or_try_init(|| async {
                let rows = store
                    .find(
                        tables::CP_TXN_MAPPING,
                        &Predicate::eq("status", "active"),
                        None,
                        None,
                        None,
                    )
                    .await?;
                Ok(parse_rows(tables::CP_TXN_MAPPING, &rows, MappingRule::from_row))
            })
            .await
    }

    /// The context fields a human needs to author the missing rule.
    fn unmatched_details(ctx: &TransactionContext) -> String {
        match ctx.source_type() {
            SourceType::Bank => format!(
                "description='{}', d_c='{}', other_side_name='{}'",
                ctx.payment_description.as_deref().unwrap_or(""),
                ctx.debit_credit.as_deref().unwrap_or(""),
                ctx.other_side_name.as_deref().unwrap_or(""),
            ),
            SourceType::Secu => format!(
                "type='{}', ticker='{}', description='{}'",
                ctx.txn_type.as_deref().unwrap_or(""),
                ctx.ticker.as_deref().unwrap_or(""),
                ctx.description.as_deref().unwrap_or(""),
            ),
        }
    }
}

impl Default for TransactionTypeMappingStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnrichmentStep for TransactionTypeMappingStep {
    fn name(&self) -> &'static str {
        "transaction_type_mapping"
    }

    async fn run(
        &self,
        ctx: &mut TransactionContext,
        store: &dyn TransactionStore,
    ) -> Result<StepResult, StepError> {
        let counterparty_id = ctx
            .enrichment_str(keys::COUNTERPARTY_ID)
            .unwrap_or(sentinel::UNKNOWN)
            .to_string();
        let today = Utc::now().date_naive();

        let mut candidates: Vec<MappingRule> = self
            .rules(store)
            .await?
            .iter()
            .filter(|rule| {
                rule.active
                    && rule.source_type == ctx.source_type()
                    && (rule.counterparty_id == counterparty_id || rule.is_universal())
                    && rule.effective_date.is_none_or(|d| d <= today)
            })
            .cloned()
            .collect();

        if candidates.is_empty() {
            ctx.set_enrichment(keys::INTERNAL_TYPE, sentinel::UNMATCHED);
            exception::raise(
                store,
                ctx,
                ExceptionType::NoMappingRules,
                &format!(
                    "No active {} rules for counterparty '{counterparty_id}' or SYSTEM",
                    ctx.source_type()
                ),
                ExceptionPriority::High,
            )
            .await?;
            ctx.record_status(ProcessingStatus::NoRules);
            return Ok(StepResult::success("No mapping rules to evaluate"));
        }

        sort_for_evaluation(&mut candidates);

        let matched = candidates
            .iter()
            .enumerate()
            .find(|(_, rule)| rule_matches(rule, ctx));

        match matched {
            Some((index, rule)) => {
                ctx.set_enrichment(keys::INTERNAL_TYPE, rule.internal_type.as_str());
                ctx.set_enrichment(keys::F14_RULE_ID, rule.id.as_str());
                ctx.set_enrichment(
                    keys::F14_RULE_NAME,
                    rule.rule_name.as_deref().unwrap_or(&rule.id),
                );
                ctx.set_enrichment(keys::F14_RULES_EVALUATED, (index + 1) as u64);

                audit::record(
                    store,
                    ctx,
                    self.name(),
                    "F14_MAPPED",
                    &format!(
                        "Rule {} mapped transaction to {}",
                        rule.id, rule.internal_type
                    ),
                )
                .await;
                ctx.record_status(ProcessingStatus::Mapped);
                Ok(StepResult::success(format!(
                    "Mapped to {} by rule {}",
                    rule.internal_type, rule.id
                )))
            }
            None => {
                ctx.set_enrichment(keys::INTERNAL_TYPE, sentinel::UNMATCHED);
                exception::raise(
                    store,
                    ctx,
                    ExceptionType::NoRuleMatch,
                    &format!(
                        "{} rules evaluated, none matched: {}",
                        candidates.len(),
                        Self::unmatched_details(ctx)
                    ),
                    ExceptionPriority::Medium,
                )
                .await?;
                ctx.record_status(ProcessingStatus::NoRuleMatch);
                Ok(StepResult::success("No mapping rule matched"))
            }
        }
    }
}
