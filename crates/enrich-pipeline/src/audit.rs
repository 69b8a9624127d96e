// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Best-effort audit trail. A failed append is logged and swallowed; an
//! audit problem must never fail the row it describes.

use chrono::Utc;
use uuid::Uuid;

use exo_store::{Row, TransactionStore, tables};

use crate::context::TransactionContext;

/// Appends one audit row for a checkpoint the pipeline passed.
pub async fn record(
    store: &dyn TransactionStore,
    ctx: &TransactionContext,
    step_name: &str,
    action: &str,
    details: &str,
) {
    let row = Row::new(Uuid::new_v4().to_string())
        .with("transaction_id", ctx.transaction_id())
        .with("step_name", step_name)
        .with("action", action)
        .with("details", details)
        .with("timestamp", Utc::now().to_rfc3339())
        .with("status", "logged");

    if let Err(e) = store.save_or_update(tables::AUDIT_LOG, vec![row]).await {
        tracing::warn!(
            transaction_id = ctx.transaction_id(),
            step_name,
            action,
            error = %e,
            "Failed to append audit row"
        );
    }
}

#[cfg(test)]
mod tests {
    use exo_store::{InMemoryStore, Predicate};

    use super::*;
    use crate::context::SourceType;

    #[tokio::test]
    async fn appends_audit_rows() {
        let store = InMemoryStore::new();
        let ctx = TransactionContext::new("tx-1", "st-1", SourceType::Bank);

        record(&store, &ctx, "currency_validation", "CURRENCY_VALIDATED", "EUR").await;
        record(&store, &ctx, "fx_conversion", "BASE_CURRENCY_CALCULATED", "1:1").await;

        let rows = store
            .find(
                tables::AUDIT_LOG,
                &Predicate::eq("transaction_id", "tx-1"),
                None,
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("action"), Some("CURRENCY_VALIDATED"));
        assert_eq!(rows[0].get("status"), Some("logged"));
    }
}
