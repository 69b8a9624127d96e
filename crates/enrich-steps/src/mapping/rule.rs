// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::NaiveDate;

use enrich_pipeline::{SourceType, sentinel};
use exo_store::{Row, StoreError};

/// Priority assigned to rules that declare none; sorts after any authored
/// priority.
pub const DEFAULT_PRIORITY: i64 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOperator {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
    /// Comma-separated list of accepted values.
    In,
}

impl MatchOperator {
    pub fn parse(value: &str) -> Option<MatchOperator> {
        match value.trim() {
            "equals" => Some(MatchOperator::Equals),
            "contains" => Some(MatchOperator::Contains),
            "startsWith" | "starts_with" => Some(MatchOperator::StartsWith),
            "endsWith" | "ends_with" => Some(MatchOperator::EndsWith),
            "regex" => Some(MatchOperator::Regex),
            "in" => Some(MatchOperator::In),
            _ => None,
        }
    }
}

/// One row of the counterparty-to-transaction-type mapping table: if the
/// condition holds for a transaction, the transaction classifies as
/// `internal_type`.
///
/// A rule is either a single-field condition (`matching_field` +
/// `match_operator` + `match_value`, optionally refined by an arithmetic
/// condition on the amount) or, when `matching_field` is `combined`, a
/// [complex expression](super::expression) over several fields.
#[derive(Debug, Clone)]
pub struct MappingRule {
    pub id: String,
    pub counterparty_id: String,
    pub source_type: SourceType,
    pub matching_field: String,
    pub match_operator: Option<MatchOperator>,
    pub match_value: String,
    pub case_sensitive: bool,
    pub arithmetic_condition: Option<String>,
    pub complex_rule_expression: Option<String>,
    pub internal_type: String,
    pub priority: i64,
    pub active: bool,
    pub effective_date: Option<NaiveDate>,
    pub rule_name: Option<String>,
}

impl MappingRule {
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        let source_type = row
            .get_nonempty("source_type")
            .and_then(SourceType::parse)
            .ok_or_else(|| StoreError::InvalidValue {
                column: "source_type".to_string(),
                value: row.get("source_type").unwrap_or_default().to_string(),
                message: "expected BANK or SECU".to_string(),
            })?;
        let internal_type = row
            .get_nonempty("internal_type")
            .ok_or_else(|| StoreError::InvalidValue {
                column: "internal_type".to_string(),
                value: String::new(),
                message: "missing".to_string(),
            })?
            .to_string();

        Ok(Self {
            id: row.id().to_string(),
            counterparty_id: row
                .get_nonempty("counterparty_id")
                .unwrap_or(sentinel::SYSTEM)
                .to_string(),
            source_type,
            matching_field: row
                .get_nonempty("matching_field")
                .unwrap_or_default()
                .to_string(),
            match_operator: row
                .get_nonempty("match_operator")
                .and_then(MatchOperator::parse),
            match_value: row.get_nonempty("match_value").unwrap_or_default().to_string(),
            case_sensitive: row.get_bool("case_sensitive")?.unwrap_or(false),
            arithmetic_condition: row
                .get_nonempty("arithmetic_condition")
                .map(str::to_string),
            complex_rule_expression: row
                .get_nonempty("complex_rule_expression")
                .map(str::to_string),
            internal_type,
            priority: row.get_i64("priority")?.unwrap_or(DEFAULT_PRIORITY),
            active: row.get_nonempty("status") == Some("active"),
            effective_date: row.get_date("effective_date")?,
            rule_name: row.get_nonempty("rule_name").map(str::to_string),
        })
    }

    pub fn is_universal(&self) -> bool {
        self.counterparty_id == sentinel::SYSTEM
    }
}

/// Deterministic evaluation order: counterparty-specific rules before
/// universal (`SYSTEM`) ones, then ascending priority within each group.
/// The sort is stable, so same-priority rules keep their store order.
pub fn sort_for_evaluation(rules: &mut [MappingRule]) {
    rules.sort_by_key(|rule| (rule.is_universal(), rule.priority));
}
