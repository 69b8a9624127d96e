// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// A thin port over a tabular record store.
///
/// The core idea is that callers address data by *logical* table and field
/// names ([tables] lists the recognized tables) and express conditions as an
/// in-memory [Predicate] rather than backend-specific clauses. A
/// [StoreSchema] carries the logical-to-physical translation so that a
/// SQL-backed implementation can map names without its callers ever seeing a
/// physical column. The enrichment engine built on top of this crate treats
/// the store as opaque: it only uses the four operations of
/// [TransactionStore].
///
/// [InMemoryStore] is a complete reference implementation used by tests and
/// ad-hoc runs.
mod memory;
mod predicate;
mod row;
mod schema;
mod store;
mod store_error;

pub mod tables;

pub use memory::InMemoryStore;
pub use predicate::Predicate;
pub use row::Row;
pub use schema::{StoreSchema, TableMapping};
pub use store::{Sort, TransactionStore};
pub use store_error::{StoreError, WithContext};
