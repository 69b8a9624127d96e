// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::predicate::Predicate;
use crate::row::Row;
use crate::schema::StoreSchema;
use crate::store::{Sort, TransactionStore};
use crate::store_error::StoreError;

/// Reference [TransactionStore] holding all tables in memory.
///
/// Rows keep insertion order per table (an unsorted `find` returns them in
/// the order they were saved). Concurrent readers are cheap; writers take the
/// table map exclusively for the duration of one call, which is what the
/// append-only audit/exception tables need.
pub struct InMemoryStore {
    schema: StoreSchema,
    tables: RwLock<HashMap<String, IndexMap<String, Row>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_schema(StoreSchema::standard())
    }

    pub fn with_schema(schema: StoreSchema) -> Self {
        let tables = schema
            .table_names()
            .map(|name| (name.to_string(), IndexMap::new()))
            .collect();
        Self {
            schema,
            tables: RwLock::new(tables),
        }
    }

    /// Convenience for seeding fixture data table by table.
    pub async fn seed(&self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        self.save_or_update(table, rows).await
    }

    pub async fn count(&self, table: &str) -> Result<usize, StoreError> {
        self.schema.table(table)?;
        let tables = self.tables.read().await;
        Ok(tables.get(table).map(|rows| rows.len()).unwrap_or(0))
    }

    fn validate_predicate(&self, table: &str, predicate: &Predicate) -> Result<(), StoreError> {
        let mapping = self.schema.table(table)?;
        for field in predicate.fields() {
            if !mapping.has_column(field) {
                return Err(StoreError::UnknownColumn {
                    table: table.to_string(),
                    column: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn find(
        &self,
        table: &str,
        predicate: &Predicate,
        sort: Option<&Sort>,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError> {
        self.validate_predicate(table, predicate)?;

        let tables = self.tables.read().await;
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;

        let mut result: Vec<Row> = rows
            .values()
            .filter(|row| predicate.matches(row))
            .cloned()
            .collect();

        if let Some(sort) = sort {
            result.sort_by(|a, b| {
                let ordering = a.get(&sort.field).cmp(&b.get(&sort.field));
                if sort.desc { ordering.reverse() } else { ordering }
            });
        }

        let offset = offset.unwrap_or(0);
        let result = result
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        Ok(result)
    }

    async fn load(&self, table: &str, id: &str) -> Result<Option<Row>, StoreError> {
        self.schema.table(table)?;
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|rows| rows.get(id)).cloned())
    }

    async fn save_or_update(&self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        let mapping = self.schema.table(table)?;
        if !mapping.is_open() {
            for row in &rows {
                for (field, _) in row.fields() {
                    if !mapping.has_column(field) {
                        return Err(StoreError::UnknownColumn {
                            table: table.to_string(),
                            column: field.to_string(),
                        });
                    }
                }
            }
        }

        let mut tables = self.tables.write().await;
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        for row in rows {
            stored.insert(row.id().to_string(), row);
        }
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        self.schema.table(table)?;
        let mut tables = self.tables.write().await;
        if let Some(rows) = tables.get_mut(table) {
            rows.shift_remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables;

    fn currencies() -> Vec<Row> {
        vec![
            Row::new("EUR")
                .with("name", "Euro")
                .with("symbol", "€")
                .with("decimal_places", "2")
                .with("status", "active"),
            Row::new("USD")
                .with("name", "US Dollar")
                .with("symbol", "$")
                .with("decimal_places", "2")
                .with("status", "active"),
            Row::new("XAU")
                .with("name", "Gold")
                .with("decimal_places", "4")
                .with("status", "inactive"),
        ]
    }

    #[tokio::test]
    async fn find_load_save_delete() {
        let store = InMemoryStore::new();
        store
            .seed(tables::CURRENCY_MASTER, currencies())
            .await
            .unwrap();

        let active = store
            .find(
                tables::CURRENCY_MASTER,
                &Predicate::eq("status", "active"),
                None,
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(active.len(), 2);

        let eur = store.load(tables::CURRENCY_MASTER, "EUR").await.unwrap();
        assert_eq!(eur.unwrap().get("name"), Some("Euro"));

        store.delete(tables::CURRENCY_MASTER, "XAU").await.unwrap();
        assert_eq!(store.count(tables::CURRENCY_MASTER).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn find_preserves_insertion_order() {
        let store = InMemoryStore::new();
        store
            .seed(tables::CURRENCY_MASTER, currencies())
            .await
            .unwrap();

        let all = store
            .find(tables::CURRENCY_MASTER, &Predicate::True, None, None, None)
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["EUR", "USD", "XAU"]);
    }

    #[tokio::test]
    async fn sort_offset_limit() {
        let store = InMemoryStore::new();
        store
            .seed(tables::CURRENCY_MASTER, currencies())
            .await
            .unwrap();

        let sorted = store
            .find(
                tables::CURRENCY_MASTER,
                &Predicate::True,
                Some(&Sort::desc("name")),
                None,
                Some(2),
            )
            .await
            .unwrap();
        let names: Vec<_> = sorted.iter().map(|r| r.get("name").unwrap()).collect();
        assert_eq!(names, vec!["US Dollar", "Gold"]);

        let offset = store
            .find(
                tables::CURRENCY_MASTER,
                &Predicate::True,
                Some(&Sort::asc("name")),
                Some(1),
                None,
            )
            .await
            .unwrap();
        assert_eq!(offset.first().unwrap().get("name"), Some("Gold"));
    }

    #[tokio::test]
    async fn save_replaces_by_primary_key() {
        let store = InMemoryStore::new();
        store
            .seed(tables::CURRENCY_MASTER, currencies())
            .await
            .unwrap();

        store
            .save_or_update(
                tables::CURRENCY_MASTER,
                vec![Row::new("XAU").with("status", "active")],
            )
            .await
            .unwrap();

        let xau = store
            .load(tables::CURRENCY_MASTER, "XAU")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(xau.get("status"), Some("active"));
        // replaced, not merged
        assert_eq!(xau.get("name"), None);
    }

    #[tokio::test]
    async fn unknown_names_are_rejected() {
        let store = InMemoryStore::new();

        assert!(matches!(
            store.load("no_such_table", "x").await,
            Err(StoreError::UnknownTable(_))
        ));

        assert!(matches!(
            store
                .find(
                    tables::CURRENCY_MASTER,
                    &Predicate::eq("ticker", "AAPL"),
                    None,
                    None,
                    None,
                )
                .await,
            Err(StoreError::UnknownColumn { .. })
        ));

        assert!(matches!(
            store
                .save_or_update(
                    tables::CURRENCY_MASTER,
                    vec![Row::new("EUR").with("ticker", "x")],
                )
                .await,
            Err(StoreError::UnknownColumn { .. })
        ));
    }

    #[tokio::test]
    async fn open_tables_accept_contextual_columns() {
        let store = InMemoryStore::new();
        store
            .save_or_update(
                tables::EXCEPTION_QUEUE,
                vec![
                    Row::new("e1")
                        .with("transaction_id", "tx-1")
                        .with("exception_type", "MISSING_CURRENCY")
                        .with("ticker", "AAPL"),
                ],
            )
            .await
            .unwrap();

        let rows = store
            .find(
                tables::EXCEPTION_QUEUE,
                &Predicate::eq("transaction_id", "tx-1"),
                None,
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(rows[0].get("ticker"), Some("AAPL"));
    }
}
