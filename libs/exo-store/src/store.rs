// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;

use crate::predicate::Predicate;
use crate::row::Row;
use crate::store_error::StoreError;

/// Ordering for [TransactionStore::find] results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub desc: bool,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            desc: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            desc: true,
        }
    }
}

/// The data-access port of the enrichment engine.
///
/// All addressing is by logical table and field names; implementations own
/// the translation to physical naming (see [crate::StoreSchema]). Reads of
/// reference tables are safe to issue concurrently; `save_or_update` of a
/// single row is atomic but appends from different rows are not ordered
/// relative to each other.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Rows of `table` matching `predicate`, optionally sorted and paged.
    async fn find(
        &self,
        table: &str,
        predicate: &Predicate,
        sort: Option<&Sort>,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError>;

    /// The row with the given primary key, if any.
    async fn load(&self, table: &str, id: &str) -> Result<Option<Row>, StoreError>;

    /// Inserts rows, replacing any existing row with the same primary key.
    async fn save_or_update(&self, table: &str, rows: Vec<Row>) -> Result<(), StoreError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;
}
