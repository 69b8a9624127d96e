// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The `combined` rule expression: a single-level chain of field
//! comparisons joined by one connector kind.
//!
//! ```text
//! expression := clause ( (" AND " clause)* | (" OR " clause)* )
//! clause     := field "=" "'" literal "'"
//!             | field "CONTAINS" "'" literal "'"
//! ```
//!
//! Comparisons are case-insensitive (both sides upper-cased). Mixing `AND`
//! and `OR` at the one supported level is rejected; nested expressions are
//! not supported.

use thiserror::Error;

use enrich_pipeline::TransactionContext;

#[derive(Error, Debug, PartialEq)]
pub enum ExpressionError {
    #[error("Expression is empty")]
    Empty,

    #[error("Expression mixes AND and OR: '{0}'")]
    MixedConnectors(String),

    #[error("Malformed clause '{0}'")]
    MalformedClause(String),
}

#[derive(Debug, PartialEq)]
enum Comparison {
    Equals,
    Contains,
}

#[derive(Debug, PartialEq)]
struct Clause {
    field: String,
    comparison: Comparison,
    literal: String,
}

impl Clause {
    fn parse(text: &str) -> Result<Clause, ExpressionError> {
        let malformed = || ExpressionError::MalformedClause(text.trim().to_string());

        // "field CONTAINS 'lit'" takes precedence so a literal containing
        // '=' still parses
        let (field, comparison, rest) = if let Some((field, rest)) = split_keyword(text, " CONTAINS ")
        {
            (field, Comparison::Contains, rest)
        } else if let Some((field, rest)) = text.split_once('=') {
            (field, Comparison::Equals, rest)
        } else {
            return Err(malformed());
        };

        let field = field.trim();
        let literal = rest.trim();
        let literal = literal
            .strip_prefix('\'')
            .and_then(|l| l.strip_suffix('\''))
            .ok_or_else(malformed)?;
        if field.is_empty() {
            return Err(malformed());
        }

        Ok(Clause {
            field: field.to_string(),
            comparison,
            literal: literal.to_string(),
        })
    }

    fn evaluate(&self, ctx: &TransactionContext) -> bool {
        let Some(value) = ctx.field(&self.field) else {
            return false;
        };
        let value = value.to_uppercase();
        let literal = self.literal.to_uppercase();
        match self.comparison {
            Comparison::Equals => value == literal,
            Comparison::Contains => value.contains(&literal),
        }
    }
}

/// Case-insensitive match of an infix keyword (` CONTAINS `), returning the
/// parts around it. ASCII-only case folding keeps byte offsets valid.
fn split_keyword<'a>(text: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
    let upper = text.to_ascii_uppercase();
    let index = upper.find(keyword)?;
    Some((&text[..index], &text[index + keyword.len()..]))
}

/// Evaluates a combined expression against the context's fields.
pub fn evaluate(expression: &str, ctx: &TransactionContext) -> Result<bool, ExpressionError> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let has_and = expression.contains(" AND ");
    let has_or = expression.contains(" OR ");
    if has_and && has_or {
        return Err(ExpressionError::MixedConnectors(expression.to_string()));
    }

    let (connector, all_required) = if has_or { (" OR ", false) } else { (" AND ", true) };
    let clauses = expression
        .split(connector)
        .map(Clause::parse)
        .collect::<Result<Vec<_>, _>>()?;

    let mut results = clauses.iter().map(|clause| clause.evaluate(ctx));
    Ok(if all_required {
        results.all(|r| r)
    } else {
        results.any(|r| r)
    })
}
