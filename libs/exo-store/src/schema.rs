// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;

use crate::store_error::StoreError;
use crate::tables;

/// Translation of one logical table to its physical counterpart.
///
/// A mapping is *closed* when its column set is exhaustive. Tables whose rows
/// carry source-type-specific context (the exception queue, the enriched
/// output) are open: columns beyond the declared ones pass through with
/// identity naming.
#[derive(Debug, Clone)]
pub struct TableMapping {
    logical: String,
    physical: String,
    columns: IndexMap<String, String>,
    open: bool,
}

impl TableMapping {
    pub fn new(logical: &str, physical: &str, columns: &[(&str, &str)]) -> Self {
        Self {
            logical: logical.to_string(),
            physical: physical.to_string(),
            columns: columns
                .iter()
                .map(|(l, p)| (l.to_string(), p.to_string()))
                .collect(),
            open: false,
        }
    }

    /// A mapping whose physical names equal the logical ones.
    pub fn same_named(logical: &str, columns: &[&str]) -> Self {
        Self {
            logical: logical.to_string(),
            physical: logical.to_string(),
            columns: columns
                .iter()
                .map(|c| (c.to_string(), c.to_string()))
                .collect(),
            open: false,
        }
    }

    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }

    pub fn logical(&self) -> &str {
        &self.logical
    }

    pub fn physical(&self) -> &str {
        &self.physical
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn has_column(&self, logical: &str) -> bool {
        self.open || self.columns.contains_key(logical)
    }

    /// The physical column for a logical name. Open tables fall back to
    /// identity naming for undeclared columns.
    pub fn physical_column(&self, logical: &str) -> Result<String, StoreError> {
        match self.columns.get(logical) {
            Some(physical) => Ok(physical.clone()),
            None if self.open => Ok(logical.to_string()),
            None => Err(StoreError::UnknownColumn {
                table: self.logical.clone(),
                column: logical.to_string(),
            }),
        }
    }
}

/// The set of logical tables a store serves.
///
/// [StoreSchema::standard] declares every table the enrichment engine touches.
/// Store implementations validate table and column names against the schema,
/// so a typo'd logical name surfaces as [StoreError::UnknownTable] /
/// [StoreError::UnknownColumn] instead of silently matching nothing.
#[derive(Debug, Clone)]
pub struct StoreSchema {
    mappings: IndexMap<String, TableMapping>,
}

impl StoreSchema {
    pub fn new(mappings: Vec<TableMapping>) -> Self {
        Self {
            mappings: mappings
                .into_iter()
                .map(|m| (m.logical.clone(), m))
                .collect(),
        }
    }

    pub fn table(&self, logical: &str) -> Result<&TableMapping, StoreError> {
        self.mappings
            .get(logical)
            .ok_or_else(|| StoreError::UnknownTable(logical.to_string()))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.mappings.keys().map(|k| k.as_str())
    }

    pub fn standard() -> Self {
        Self::new(vec![
            TableMapping::same_named(
                tables::CURRENCY_MASTER,
                &["name", "symbol", "decimal_places", "status"],
            ),
            TableMapping::same_named(
                tables::COUNTERPARTY_MASTER,
                &[
                    "name",
                    "counterparty_type",
                    "bank_id",
                    "custodian_id",
                    "broker_id",
                    "short_code",
                    "is_active",
                ],
            ),
            TableMapping::same_named(
                tables::CUSTOMER_MASTER,
                &[
                    "name",
                    "short_name",
                    "customer_type",
                    "registration_number",
                    "personal_id",
                    "tax_id",
                    "base_currency",
                    "risk_level",
                    "primary_account",
                    "bank_account_number",
                    "status",
                ],
            ),
            TableMapping::same_named(
                tables::CUSTOMER_ACCOUNT,
                &["account_number", "customer_id", "status"],
            ),
            TableMapping::same_named(tables::BANK, &["bic", "name"]),
            TableMapping::same_named(tables::BROKER, &["bic", "name"]),
            TableMapping::same_named(
                tables::FX_RATES_EUR,
                &["effective_date", "target_currency", "exchange_rate", "status"],
            ),
            TableMapping::same_named(
                tables::CP_TXN_MAPPING,
                &[
                    "counterparty_id",
                    "source_type",
                    "matching_field",
                    "match_operator",
                    "match_value",
                    "case_sensitive",
                    "arithmetic_condition",
                    "complex_rule_expression",
                    "internal_type",
                    "priority",
                    "status",
                    "effective_date",
                    "rule_name",
                ],
            ),
            TableMapping::same_named(
                tables::AUDIT_LOG,
                &[
                    "transaction_id",
                    "step_name",
                    "action",
                    "details",
                    "timestamp",
                    "status",
                ],
            ),
            TableMapping::same_named(
                tables::EXCEPTION_QUEUE,
                &[
                    "transaction_id",
                    "statement_id",
                    "source_type",
                    "exception_type",
                    "details",
                    "amount",
                    "currency",
                    "transaction_date",
                    "priority",
                    "status",
                    "assigned_to",
                    "due_date",
                    "exception_date",
                ],
            )
            .open(),
            TableMapping::same_named(
                tables::BANK_TRANSACTION,
                &[
                    "statement_id",
                    "batch_id",
                    "currency",
                    "amount",
                    "transaction_date",
                    "customer_id_raw",
                    "other_side_name",
                    "other_side_bic",
                    "payment_description",
                    "reference_number",
                    "debit_credit",
                    "account_number",
                    "statement_bank",
                ],
            ),
            TableMapping::same_named(
                tables::SECU_TRANSACTION,
                &[
                    "statement_id",
                    "batch_id",
                    "currency",
                    "amount",
                    "transaction_date",
                    "customer_id_raw",
                    "ticker",
                    "txn_type",
                    "description",
                    "reference",
                    "fee",
                    "statement_bank",
                ],
            ),
            TableMapping::same_named(
                tables::STATEMENT,
                &["source_type", "statement_bank", "status"],
            ),
            TableMapping::same_named(
                tables::ENRICHED_TRANSACTION,
                &[
                    "statement_id",
                    "source_type",
                    "currency",
                    "amount",
                    "transaction_date",
                    "processing_status",
                    "processed_steps",
                    "overall_success",
                ],
            )
            .open(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_schema_covers_engine_tables() {
        let schema = StoreSchema::standard();
        for table in [
            tables::CURRENCY_MASTER,
            tables::COUNTERPARTY_MASTER,
            tables::CUSTOMER_MASTER,
            tables::CUSTOMER_ACCOUNT,
            tables::BANK,
            tables::BROKER,
            tables::FX_RATES_EUR,
            tables::CP_TXN_MAPPING,
            tables::AUDIT_LOG,
            tables::EXCEPTION_QUEUE,
            tables::BANK_TRANSACTION,
            tables::SECU_TRANSACTION,
            tables::STATEMENT,
            tables::ENRICHED_TRANSACTION,
        ] {
            assert!(schema.table(table).is_ok(), "missing {table}");
        }
        assert!(matches!(
            schema.table("no_such_table"),
            Err(StoreError::UnknownTable(_))
        ));
    }

    #[test]
    fn physical_translation() {
        let mapping = TableMapping::new(
            tables::CP_TXN_MAPPING,
            "gam_cp_txn_mapping",
            &[("counterparty_id", "cpid"), ("internal_type", "int_type")],
        );
        assert_eq!(mapping.physical(), "gam_cp_txn_mapping");
        assert_eq!(mapping.physical_column("counterparty_id").unwrap(), "cpid");
        assert!(matches!(
            mapping.physical_column("priority"),
            Err(StoreError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn open_tables_pass_undeclared_columns_through() {
        let schema = StoreSchema::standard();
        let exceptions = schema.table(tables::EXCEPTION_QUEUE).unwrap();
        assert!(exceptions.has_column("ticker"));
        assert_eq!(exceptions.physical_column("ticker").unwrap(), "ticker");

        let closed = schema.table(tables::CURRENCY_MASTER).unwrap();
        assert!(!closed.has_column("ticker"));
    }
}
