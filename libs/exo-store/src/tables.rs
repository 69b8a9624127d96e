// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Logical table names recognized by the standard [crate::StoreSchema].

/// Currency master keyed by 3-letter code.
pub const CURRENCY_MASTER: &str = "currency_master";
/// Counterparty master keyed by business id (e.g. `CPT0143`).
pub const COUNTERPARTY_MASTER: &str = "counterparty_master";
/// Customer master keyed by customer id (e.g. `CUST-000123`).
pub const CUSTOMER_MASTER: &str = "customer_master";
/// Account-number to customer-id mapping.
pub const CUSTOMER_ACCOUNT: &str = "customer_account";
/// Bank master, lookup by BIC.
pub const BANK: &str = "bank";
/// Broker master, lookup by BIC.
pub const BROKER: &str = "broker";
/// EUR-based FX rates (units of target currency per 1 EUR).
pub const FX_RATES_EUR: &str = "fx_rates_eur";
/// Counterparty-to-transaction-type mapping rules.
pub const CP_TXN_MAPPING: &str = "cp_txn_mapping";

/// Append-only audit trail.
pub const AUDIT_LOG: &str = "audit_log";
/// Append-only queue of problems requiring human follow-up.
pub const EXCEPTION_QUEUE: &str = "exception_queue";

/// Raw bank-statement rows staged for enrichment.
pub const BANK_TRANSACTION: &str = "bank_transaction";
/// Raw securities-custody rows staged for enrichment.
pub const SECU_TRANSACTION: &str = "secu_transaction";
/// Statement-level records (status updated after persisting).
pub const STATEMENT: &str = "statement";
/// Fully annotated output records.
pub const ENRICHED_TRANSACTION: &str = "enriched_transaction";
