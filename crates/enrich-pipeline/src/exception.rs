// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The exception queue: append-only records of problems requiring human
//! follow-up, written during enrichment and resolved out-of-band.

use std::fmt::Display;

use chrono::{Days, Utc};
use uuid::Uuid;

use exo_store::{Row, StoreError, TransactionStore, tables};

use crate::context::{SourceType, TransactionContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl ExceptionPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionPriority::Critical => "critical",
            ExceptionPriority::High => "high",
            ExceptionPriority::Medium => "medium",
            ExceptionPriority::Low => "low",
        }
    }

    /// Days until follow-up is due.
    pub fn due_days(&self) -> u64 {
        match self {
            ExceptionPriority::Critical | ExceptionPriority::High => 1,
            ExceptionPriority::Medium => 3,
            ExceptionPriority::Low => 7,
        }
    }
}

impl Display for ExceptionPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kinds of exception the pipeline emits. `code` is the stored wire
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionType {
    MissingCurrency,
    InvalidCurrency,
    FxRateMissing,
    OldFxRate,
    MissingCustomer,
    InactiveCustomer,
    LowConfidenceIdentification,
    CounterpartyNotFound,
    NoMappingRules,
    NoRuleMatch,
}

impl ExceptionType {
    pub fn code(&self) -> &'static str {
        match self {
            ExceptionType::MissingCurrency => "MISSING_CURRENCY",
            ExceptionType::InvalidCurrency => "INVALID_CURRENCY",
            ExceptionType::FxRateMissing => "FX_RATE_MISSING",
            ExceptionType::OldFxRate => "OLD_FX_RATE",
            ExceptionType::MissingCustomer => "MISSING_CUSTOMER",
            ExceptionType::InactiveCustomer => "INACTIVE_CUSTOMER",
            ExceptionType::LowConfidenceIdentification => "LOW_CONFIDENCE_IDENTIFICATION",
            ExceptionType::CounterpartyNotFound => "COUNTERPARTY_NOT_FOUND",
            ExceptionType::NoMappingRules => "NO_F14_RULES",
            ExceptionType::NoRuleMatch => "NO_RULE_MATCH",
        }
    }

    fn is_fx(&self) -> bool {
        matches!(self, ExceptionType::FxRateMissing | ExceptionType::OldFxRate)
    }

    /// Who works the queue entry: urgent items go to a supervisor (the FX
    /// desk for rate problems), the rest to operations.
    pub fn assignee(&self, priority: ExceptionPriority) -> &'static str {
        match priority {
            ExceptionPriority::Critical | ExceptionPriority::High => {
                if self.is_fx() {
                    "fx_specialist"
                } else {
                    "supervisor"
                }
            }
            ExceptionPriority::Medium | ExceptionPriority::Low => "operations",
        }
    }
}

impl Display for ExceptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Appends an exception row for the given context.
///
/// Every row carries the full identification of the transaction, the
/// priority-derived assignee and due date, and source-type-specific context
/// fields to aid human resolution.
pub async fn raise(
    store: &dyn TransactionStore,
    ctx: &TransactionContext,
    exception_type: ExceptionType,
    details: &str,
    priority: ExceptionPriority,
) -> Result<(), StoreError> {
    let now = Utc::now();
    let due_date = now
        .date_naive()
        .checked_add_days(Days::new(priority.due_days()))
        .unwrap_or(now.date_naive());

    let mut row = Row::new(Uuid::new_v4().to_string())
        .with("transaction_id", ctx.transaction_id())
        .with("statement_id", ctx.statement_id())
        .with("source_type", ctx.source_type().as_str())
        .with("exception_type", exception_type.code())
        .with("details", details)
        .with("amount", ctx.amount.as_deref().unwrap_or_default())
        .with("currency", ctx.currency.as_deref().unwrap_or_default())
        .with(
            "transaction_date",
            ctx.transaction_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
        )
        .with("priority", priority.as_str())
        .with("status", "pending")
        .with("assigned_to", exception_type.assignee(priority))
        .with("due_date", due_date.to_string())
        .with("exception_date", now.to_rfc3339());

    match ctx.source_type() {
        SourceType::Bank => {
            if let Some(description) = &ctx.payment_description {
                row.set("payment_description", description);
            }
            if let Some(name) = &ctx.other_side_name {
                row.set("other_side_name", name);
            }
            if let Some(debit_credit) = &ctx.debit_credit {
                row.set("debit_credit", debit_credit);
            }
        }
        SourceType::Secu => {
            if let Some(ticker) = &ctx.ticker {
                row.set("ticker", ticker);
            }
            if let Some(txn_type) = &ctx.txn_type {
                row.set("txn_type", txn_type);
            }
            if let Some(description) = &ctx.description {
                row.set("description", description);
            }
        }
    }

    tracing::debug!(
        transaction_id = ctx.transaction_id(),
        exception_type = exception_type.code(),
        priority = priority.as_str(),
        "Raising exception"
    );
    store.save_or_update(tables::EXCEPTION_QUEUE, vec![row]).await
}
