// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store_error::StoreError;

/// A record addressed by logical field names.
///
/// Every row carries an explicit primary key (`id`) plus string-valued
/// fields. Typed getters parse on access; a field that is absent or blank is
/// `None` for all of them, so reference rows with optional attributes can be
/// read without presence checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    id: String,
    fields: IndexMap<String, String>,
}

impl Row {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field assignment (`Row::new("C1").with("name", "Euro")`).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|v| v.as_str())
    }

    /// The field's value with surrounding whitespace removed; `None` when the
    /// field is absent or blank.
    pub fn get_nonempty(&self, field: &str) -> Option<&str> {
        self.get(field).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn get_decimal(&self, field: &str) -> Result<Option<Decimal>, StoreError> {
        self.get_nonempty(field)
            .map(|v| {
                v.parse::<Decimal>().map_err(|e| StoreError::InvalidValue {
                    column: field.to_string(),
                    value: v.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    /// Parses an ISO (`YYYY-MM-DD`) date field.
    pub fn get_date(&self, field: &str) -> Result<Option<NaiveDate>, StoreError> {
        self.get_nonempty(field)
            .map(|v| {
                NaiveDate::parse_from_str(v, "%Y-%m-%d").map_err(|e| StoreError::InvalidValue {
                    column: field.to_string(),
                    value: v.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn get_i64(&self, field: &str) -> Result<Option<i64>, StoreError> {
        self.get_nonempty(field)
            .map(|v| {
                v.parse::<i64>().map_err(|e| StoreError::InvalidValue {
                    column: field.to_string(),
                    value: v.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    /// Accepts the usual textual spellings of a boolean.
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, StoreError> {
        self.get_nonempty(field)
            .map(|v| match v.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(StoreError::InvalidValue {
                    column: field.to_string(),
                    value: v.to_string(),
                    message: "expected a boolean".to_string(),
                }),
            })
            .transpose()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters() {
        let row = Row::new("tx-1")
            .with("amount", "1234.56")
            .with("transaction_date", "2024-01-15")
            .with("is_active", "true")
            .with("priority", "10")
            .with("blank", "   ");

        assert_eq!(row.id(), "tx-1");
        assert_eq!(
            row.get_decimal("amount").unwrap(),
            Some("1234.56".parse().unwrap())
        );
        assert_eq!(
            row.get_date("transaction_date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(row.get_bool("is_active").unwrap(), Some(true));
        assert_eq!(row.get_i64("priority").unwrap(), Some(10));
        assert_eq!(row.get_nonempty("blank"), None);
        assert_eq!(row.get_decimal("missing").unwrap(), None);
    }

    #[test]
    fn invalid_value_reports_column() {
        let row = Row::new("tx-1").with("amount", "12,34x");
        let err = row.get_decimal("amount").unwrap_err();
        assert!(err.to_string().contains("amount"));
    }
}
