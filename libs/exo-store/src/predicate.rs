// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::row::Row;

/// A boolean condition over a [Row], used as the `find` condition of a
/// [crate::TransactionStore].
///
/// Left-hand sides are logical field names, right-hand sides literal values.
/// String comparisons are exact (case-sensitive); a missing field never
/// matches a comparison. Prefer [Predicate::and] / [Predicate::or] over the
/// raw variants, which simplify the clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    True,
    False,
    Eq(String, String),
    Neq(String, String),
    In(String, Vec<String>),

    // string predicates
    Contains(String, String),
    StartsWith(String, String),
    EndsWith(String, String),

    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Predicate {
        Predicate::Eq(field.into(), value.into())
    }

    pub fn neq(field: impl Into<String>, value: impl Into<String>) -> Predicate {
        Predicate::Neq(field.into(), value.into())
    }

    /// Logical and of two predicates, reducing to a simpler predicate if possible.
    pub fn and(lhs: Predicate, rhs: Predicate) -> Predicate {
        match (lhs, rhs) {
            (Predicate::False, _) | (_, Predicate::False) => Predicate::False,
            (Predicate::True, rhs) => rhs,
            (lhs, Predicate::True) => lhs,
            (lhs, rhs) if lhs == rhs => lhs,
            (lhs, rhs) => Predicate::And(Box::new(lhs), Box::new(rhs)),
        }
    }

    /// Logical or of two predicates, reducing to a simpler predicate if possible.
    pub fn or(lhs: Predicate, rhs: Predicate) -> Predicate {
        match (lhs, rhs) {
            (Predicate::True, _) | (_, Predicate::True) => Predicate::True,
            (Predicate::False, rhs) => rhs,
            (lhs, Predicate::False) => lhs,
            (lhs, rhs) if lhs == rhs => lhs,
            (lhs, rhs) => Predicate::Or(Box::new(lhs), Box::new(rhs)),
        }
    }

    /// Evaluate against a row.
    pub fn matches(&self, row: &Row) -> bool {
        fn field_matches(row: &Row, field: &str, test: impl Fn(&str) -> bool) -> bool {
            row.get(field).is_some_and(test)
        }

        match self {
            Predicate::True => true,
            Predicate::False => false,
            Predicate::Eq(field, value) => field_matches(row, field, |v| v == value),
            Predicate::Neq(field, value) => field_matches(row, field, |v| v != value),
            Predicate::In(field, values) => {
                field_matches(row, field, |v| values.iter().any(|value| value == v))
            }
            Predicate::Contains(field, value) => field_matches(row, field, |v| v.contains(value)),
            Predicate::StartsWith(field, value) => {
                field_matches(row, field, |v| v.starts_with(value))
            }
            Predicate::EndsWith(field, value) => field_matches(row, field, |v| v.ends_with(value)),
            Predicate::And(lhs, rhs) => lhs.matches(row) && rhs.matches(row),
            Predicate::Or(lhs, rhs) => lhs.matches(row) || rhs.matches(row),
            Predicate::Not(p) => !p.matches(row),
        }
    }

    /// Field names referenced by this predicate (used for column validation).
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Predicate::True | Predicate::False => vec![],
            Predicate::Eq(field, _)
            | Predicate::Neq(field, _)
            | Predicate::In(field, _)
            | Predicate::Contains(field, _)
            | Predicate::StartsWith(field, _)
            | Predicate::EndsWith(field, _) => vec![field],
            Predicate::And(lhs, rhs) | Predicate::Or(lhs, rhs) => {
                let mut result = lhs.fields();
                result.extend(rhs.fields());
                result
            }
            Predicate::Not(p) => p.fields(),
        }
    }
}

impl From<bool> for Predicate {
    fn from(b: bool) -> Predicate {
        if b { Predicate::True } else { Predicate::False }
    }
}

impl std::ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        match self {
            // Reduced to a simpler form when possible, else fall back to Predicate::Not
            Predicate::True => Predicate::False,
            Predicate::False => Predicate::True,
            Predicate::Eq(lhs, rhs) => Predicate::Neq(lhs, rhs),
            Predicate::Neq(lhs, rhs) => Predicate::Eq(lhs, rhs),
            predicate => Predicate::Not(Box::new(predicate)),
        }
    }
}
