// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Amount parsing and the amount-derived exception priority.

use rust_decimal::Decimal;

use crate::exception::ExceptionPriority;
use crate::step::StepError;

/// Parses an amount string as delivered by statement feeds: currency
/// symbols, grouping separators and whitespace are noise; the sign is
/// preserved.
///
/// ```text
/// "€ 1.234,00" is NOT supported -- feeds deliver decimal points.
/// "$-1,234.56" => -1234.56
/// " 1 234.56 " => 1234.56
/// ```
pub fn parse_amount(raw: &str) -> Result<Decimal, StepError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        .collect();

    cleaned
        .parse::<Decimal>()
        .map_err(|_| StepError::InvalidAmount(raw.to_string()))
}

/// Priority of an exception when the step has no fixed rule: bigger money,
/// faster follow-up.
pub fn amount_priority(amount: Decimal) -> ExceptionPriority {
    let abs = amount.abs();
    if abs >= Decimal::from(1_000_000) {
        ExceptionPriority::Critical
    } else if abs >= Decimal::from(100_000) {
        ExceptionPriority::High
    } else if abs >= Decimal::from(10_000) {
        ExceptionPriority::Medium
    } else {
        ExceptionPriority::Low
    }
}

/// The amount-derived priority of a context whose amount may be absent or
/// malformed; those rank lowest, having no magnitude to rank by.
pub fn context_amount_priority(amount: Option<&str>) -> ExceptionPriority {
    amount
        .and_then(|raw| parse_amount(raw).ok())
        .map(amount_priority)
        .unwrap_or(ExceptionPriority::Low)
}
