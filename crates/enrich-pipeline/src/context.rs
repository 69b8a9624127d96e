// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use chrono::NaiveDate;
use indexmap::IndexMap;

use common::Val;

/// Which statement family a row came from. Selects the meaningful subset of
/// context fields and the source-specific branches inside steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Bank,
    Secu,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Bank => "BANK",
            SourceType::Secu => "SECU",
        }
    }

    pub fn parse(value: &str) -> Option<SourceType> {
        match value.trim().to_uppercase().as_str() {
            "BANK" => Some(SourceType::Bank),
            "SECU" => Some(SourceType::Secu),
            _ => None,
        }
    }
}

impl Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline checkpoints recorded on the context as steps complete.
///
/// The wire strings (`currency_validated`, `f14_mapped`, ...) are a stored
/// contract shared with downstream posting; they are not free to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    CurrencyValidated,
    FxConverted,
    CustomerIdentified,
    CounterpartyDetermined,
    Mapped,
    NoRuleMatch,
    NoRules,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::CurrencyValidated => "currency_validated",
            ProcessingStatus::FxConverted => "fx_converted",
            ProcessingStatus::CustomerIdentified => "customer_identified",
            ProcessingStatus::CounterpartyDetermined => "counterparty_determined",
            ProcessingStatus::Mapped => "f14_mapped",
            ProcessingStatus::NoRuleMatch => "f14_no_match",
            ProcessingStatus::NoRules => "f14_no_rules",
        }
    }
}

impl Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-row working state: the raw input fields plus accumulating
/// enrichments.
///
/// A context is created by a loader, mutated in place by the steps of a
/// single pipeline invocation (one step at a time) and finally consumed by
/// the persister. `transaction_id` and `source_type` are fixed at
/// construction; `processed_steps` only grows, through [Self::record_status].
#[derive(Debug, Clone)]
pub struct TransactionContext {
    transaction_id: String,
    statement_id: String,
    source_type: SourceType,

    pub currency: Option<String>,
    pub amount: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub customer_id_raw: Option<String>,
    pub statement_bank: Option<String>,

    // BANK-only fields
    pub other_side_name: Option<String>,
    pub other_side_bic: Option<String>,
    pub payment_description: Option<String>,
    pub reference_number: Option<String>,
    pub debit_credit: Option<String>,
    pub account_number: Option<String>,

    // SECU-only fields
    pub ticker: Option<String>,
    pub txn_type: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub fee: Option<String>,

    /// Set by a step on fatal failure; gates subsequent steps through their
    /// default `should_execute`.
    pub error_message: Option<String>,

    processing_status: Option<ProcessingStatus>,
    processed_steps: Vec<ProcessingStatus>,
    enrichments: IndexMap<String, Val>,
    cancelled: bool,
}

impl TransactionContext {
    pub fn new(
        transaction_id: impl Into<String>,
        statement_id: impl Into<String>,
        source_type: SourceType,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            statement_id: statement_id.into(),
            source_type,
            currency: None,
            amount: None,
            transaction_date: None,
            customer_id_raw: None,
            statement_bank: None,
            other_side_name: None,
            other_side_bic: None,
            payment_description: None,
            reference_number: None,
            debit_credit: None,
            account_number: None,
            ticker: None,
            txn_type: None,
            description: None,
            reference: None,
            fee: None,
            error_message: None,
            processing_status: None,
            processed_steps: vec![],
            enrichments: IndexMap::new(),
            cancelled: false,
        }
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn statement_id(&self) -> &str {
        &self.statement_id
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    /// The most recent checkpoint, if any step has completed.
    pub fn processing_status(&self) -> Option<ProcessingStatus> {
        self.processing_status
    }

    /// All checkpoints reached, in order.
    pub fn processed_steps(&self) -> &[ProcessingStatus] {
        &self.processed_steps
    }

    pub fn record_status(&mut self, status: ProcessingStatus) {
        self.processing_status = Some(status);
        self.processed_steps.push(status);
    }

    pub fn set_enrichment(&mut self, key: impl Into<String>, value: impl Into<Val>) {
        self.enrichments.insert(key.into(), value.into());
    }

    pub fn enrichment(&self, key: &str) -> Option<&Val> {
        self.enrichments.get(key)
    }

    pub fn enrichment_str(&self, key: &str) -> Option<&str> {
        self.enrichments.get(key).and_then(Val::as_str)
    }

    pub fn enrichments(&self) -> impl Iterator<Item = (&str, &Val)> + '_ {
        self.enrichments.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Requests cooperative cancellation; the pipeline checks between steps.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Resolves a context field by its logical name, as referenced by
    /// mapping rules. `d_c` and `type` are accepted aliases used by rule
    /// authors for `debit_credit` and `txn_type`.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "transaction_id" => Some(self.transaction_id.clone()),
            "statement_id" => Some(self.statement_id.clone()),
            "source_type" => Some(self.source_type.as_str().to_string()),
            "currency" => self.currency.clone(),
            "amount" => self.amount.clone(),
            "transaction_date" => self.transaction_date.map(|d| d.to_string()),
            "customer_id_raw" => self.customer_id_raw.clone(),
            "statement_bank" => self.statement_bank.clone(),
            "other_side_name" => self.other_side_name.clone(),
            "other_side_bic" => self.other_side_bic.clone(),
            "payment_description" => self.payment_description.clone(),
            "reference_number" => self.reference_number.clone(),
            "debit_credit" | "d_c" => self.debit_credit.clone(),
            "account_number" => self.account_number.clone(),
            "ticker" => self.ticker.clone(),
            "txn_type" | "type" => self.txn_type.clone(),
            "description" => self.description.clone(),
            "reference" => self.reference.clone(),
            "fee" => self.fee.clone(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_use_wire_strings() {
        assert_eq!(ProcessingStatus::CurrencyValidated.as_str(), "currency_validated");
        assert_eq!(ProcessingStatus::Mapped.as_str(), "f14_mapped");
        assert_eq!(ProcessingStatus::NoRules.as_str(), "f14_no_rules");
    }

    #[test]
    fn processed_steps_accumulate_in_order() {
        let mut ctx = TransactionContext::new("tx-1", "st-1", SourceType::Bank);
        assert_eq!(ctx.processing_status(), None);

        ctx.record_status(ProcessingStatus::CurrencyValidated);
        ctx.record_status(ProcessingStatus::FxConverted);

        assert_eq!(ctx.processing_status(), Some(ProcessingStatus::FxConverted));
        assert_eq!(
            ctx.processed_steps(),
            &[
                ProcessingStatus::CurrencyValidated,
                ProcessingStatus::FxConverted
            ]
        );
    }

    #[test]
    fn field_resolution_and_aliases() {
        let mut ctx = TransactionContext::new("tx-1", "st-1", SourceType::Secu);
        ctx.txn_type = Some("BUY".to_string());
        ctx.debit_credit = Some("D".to_string());

        assert_eq!(ctx.field("type").as_deref(), Some("BUY"));
        assert_eq!(ctx.field("txn_type").as_deref(), Some("BUY"));
        assert_eq!(ctx.field("d_c").as_deref(), Some("D"));
        assert_eq!(ctx.field("source_type").as_deref(), Some("SECU"));
        assert_eq!(ctx.field("no_such_field"), None);
    }

    #[test]
    fn enrichments_are_val_typed() {
        let mut ctx = TransactionContext::new("tx-1", "st-1", SourceType::Bank);
        ctx.set_enrichment("counterparty_id", "CPT0143");
        ctx.set_enrichment("customer_confidence", 100u64);

        assert_eq!(ctx.enrichment_str("counterparty_id"), Some("CPT0143"));
        assert_eq!(
            ctx.enrichment("customer_confidence").and_then(Val::as_u64),
            Some(100)
        );
    }
}
