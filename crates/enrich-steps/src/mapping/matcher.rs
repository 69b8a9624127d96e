// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Evaluation of a single [MappingRule] against a transaction context.
//!
//! A rule that cannot be evaluated (bad regex, unparsable arithmetic
//! condition, malformed combined expression) is a non-match, never an
//! error: one badly authored rule must not block a row, the next rule in
//! priority order simply gets its chance.

use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use enrich_pipeline::TransactionContext;
use enrich_pipeline::amount::parse_amount;

use super::expression;
use super::rule::{MappingRule, MatchOperator};

/// The field name selecting combined-expression evaluation.
const COMBINED: &str = "combined";

pub fn rule_matches(rule: &MappingRule, ctx: &TransactionContext) -> bool {
    if rule.matching_field == COMBINED {
        let Some(expression_text) = rule.complex_rule_expression.as_deref() else {
            debug!(rule_id = rule.id, "Combined rule without an expression");
            return false;
        };
        return match expression::evaluate(expression_text, ctx) {
            Ok(result) => result,
            Err(e) => {
                debug!(rule_id = rule.id, error = %e, "Unevaluable combined expression");
                false
            }
        };
    }

    let Some(field_value) = ctx.field(&rule.matching_field) else {
        return false;
    };

    let (value, pattern) = if rule.case_sensitive {
        (field_value, rule.match_value.clone())
    } else {
        (
            field_value.to_uppercase(),
            rule.match_value.to_uppercase(),
        )
    };

    let matched = match rule.match_operator {
        Some(MatchOperator::Equals) => value == pattern,
        Some(MatchOperator::Contains) => value.contains(&pattern),
        Some(MatchOperator::StartsWith) => value.starts_with(&pattern),
        Some(MatchOperator::EndsWith) => value.ends_with(&pattern),
        Some(MatchOperator::In) => pattern.split(',').any(|p| p.trim() == value),
        Some(MatchOperator::Regex) => match Regex::new(&pattern) {
            Ok(regex) => regex.is_match(&value),
            Err(e) => {
                debug!(rule_id = rule.id, error = %e, "Unparsable rule regex");
                false
            }
        },
        None => {
            debug!(rule_id = rule.id, "Rule without a match operator");
            false
        }
    };

    if !matched {
        return false;
    }

    match rule.arithmetic_condition.as_deref() {
        None => true,
        Some(condition) => match parse_amount(ctx.amount.as_deref().unwrap_or_default()) {
            Ok(amount) => arithmetic_condition_holds(condition, amount).unwrap_or_else(|| {
                debug!(rule_id = rule.id, condition, "Unparsable arithmetic condition");
                false
            }),
            Err(_) => false,
        },
    }
}

/// `> 1000`, `<= 2500.00` and the like, compared against the transaction
/// amount. `None` when the condition itself does not parse.
fn arithmetic_condition_holds(condition: &str, amount: Decimal) -> Option<bool> {
    let condition = condition.trim();
    let (operator, rhs) = if let Some(rest) = condition.strip_prefix(">=") {
        (">=", rest)
    } else if let Some(rest) = condition.strip_prefix("<=") {
        ("<=", rest)
    } else if let Some(rest) = condition.strip_prefix('>') {
        (">", rest)
    } else if let Some(rest) = condition.strip_prefix('<') {
        ("<", rest)
    } else {
        return None;
    };

    let rhs: Decimal = rhs.trim().parse().ok()?;
    Some(match operator {
        ">=" => amount >= rhs,
        "<=" => amount <= rhs,
        ">" => amount > rhs,
        "<" => amount < rhs,
        _ => unreachable!(),
    })
}

#[cfg(test)]
mod tests {
    use enrich_pipeline::SourceType;

    use super::*;

    fn ctx() -> TransactionContext {
        let mut ctx = TransactionContext::new("tx-1", "st-1", SourceType::Bank);
        ctx.payment_description = Some("Wire transfer from client".to_string());
        ctx.debit_credit = Some("C".to_string());
        ctx.amount = Some("1500.00".to_string());
        ctx
    }

    fn rule(field: &str, operator: MatchOperator, value: &str) -> MappingRule {
        MappingRule {
            id: "r1".to_string(),
            counterparty_id: "CPT0143".to_string(),
            source_type: SourceType::Bank,
            matching_field: field.to_string(),
            match_operator: Some(operator),
            match_value: value.to_string(),
            case_sensitive: false,
            arithmetic_condition: None,
            complex_rule_expression: None,
            internal_type: "INCOMING_WIRE".to_string(),
            priority: 10,
            active: true,
            effective_date: None,
            rule_name: None,
        }
    }

    #[test]
    fn case_insensitive_by_default() {
        let ctx = ctx();
        assert!(rule_matches(
            &rule("payment_description", MatchOperator::Contains, "WIRE"),
            &ctx
        ));
        assert!(rule_matches(
            &rule("payment_description", MatchOperator::StartsWith, "wire"),
            &ctx
        ));
        assert!(rule_matches(
            &rule("payment_description", MatchOperator::EndsWith, "CLIENT"),
            &ctx
        ));
    }

    #[test]
    fn case_sensitive_when_requested() {
        let ctx = ctx();
        let mut r = rule("payment_description", MatchOperator::Contains, "WIRE");
        r.case_sensitive = true;
        assert!(!rule_matches(&r, &ctx));
        r.match_value = "Wire".to_string();
        assert!(rule_matches(&r, &ctx));
    }

    #[test]
    fn in_operator_splits_on_commas() {
        let ctx = ctx();
        assert!(rule_matches(&rule("debit_credit", MatchOperator::In, "D, C"), &ctx));
        assert!(!rule_matches(&rule("debit_credit", MatchOperator::In, "D,X"), &ctx));
    }

    #[test]
    fn regex_operator() {
        let ctx = ctx();
        assert!(rule_matches(
            &rule("payment_description", MatchOperator::Regex, r"WIRE\s+TRANSFER"),
            &ctx
        ));
        // an unparsable pattern is a non-match, not an error
        assert!(!rule_matches(
            &rule("payment_description", MatchOperator::Regex, r"WIRE ["),
            &ctx
        ));
    }

    #[test]
    fn arithmetic_condition_refines_the_match() {
        let ctx = ctx();
        let mut r = rule("payment_description", MatchOperator::Contains, "WIRE");

        r.arithmetic_condition = Some("> 1000".to_string());
        assert!(rule_matches(&r, &ctx));

        r.arithmetic_condition = Some(">= 1500".to_string());
        assert!(rule_matches(&r, &ctx));

        r.arithmetic_condition = Some("< 1000".to_string());
        assert!(!rule_matches(&r, &ctx));

        r.arithmetic_condition = Some("about 1000".to_string());
        assert!(!rule_matches(&r, &ctx));
    }

    #[test]
    fn missing_field_never_matches() {
        let ctx = ctx();
        assert!(!rule_matches(&rule("ticker", MatchOperator::Equals, "AAPL"), &ctx));
    }

    #[test]
    fn combined_rules_delegate_to_the_expression() {
        let ctx = ctx();
        let mut r = rule(COMBINED, MatchOperator::Equals, "");
        r.complex_rule_expression =
            Some("payment_description CONTAINS 'WIRE' AND d_c = 'C'".to_string());
        assert!(rule_matches(&r, &ctx));

        r.complex_rule_expression = Some("d_c = 'D'".to_string());
        assert!(!rule_matches(&r, &ctx));

        // mixed connectors: unevaluable, therefore a non-match
        r.complex_rule_expression = Some("d_c = 'C' AND d_c = 'C' OR d_c = 'D'".to_string());
        assert!(!rule_matches(&r, &ctx));

        r.complex_rule_expression = None;
        assert!(!rule_matches(&r, &ctx));
    }
}
