// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;
use tracing::warn;

use enrich_pipeline::{SourceType, TransactionContext};
use exo_store::{Predicate, Row, TransactionStore, tables};

use crate::config::EnrichmentConfig;
use crate::engine_error::EngineError;

/// Supplies the contexts a batch run enriches.
#[async_trait]
pub trait ContextLoader: Send + Sync {
    async fn load(
        &self,
        store: &dyn TransactionStore,
        config: &EnrichmentConfig,
    ) -> Result<Vec<TransactionContext>, EngineError>;
}

/// Loads the staged raw rows of both statement families, bank rows first.
/// When the configuration names a batch, only rows staged under it are
/// loaded.
pub struct StagedTransactionLoader;

impl StagedTransactionLoader {
    fn scope_predicate(config: &EnrichmentConfig) -> Predicate {
        match &config.batch_id {
            Some(batch_id) => Predicate::eq("batch_id", batch_id.as_str()),
            None => Predicate::True,
        }
    }

    fn bank_context(row: &Row) -> TransactionContext {
        let mut ctx = TransactionContext::new(
            row.id(),
            row.get_nonempty("statement_id").unwrap_or_default(),
            SourceType::Bank,
        );
        Self::common_fields(&mut ctx, row);
        ctx.other_side_name = row.get_nonempty("other_side_name").map(str::to_string);
        ctx.other_side_bic = row.get_nonempty("other_side_bic").map(str::to_string);
        ctx.payment_description = row.get_nonempty("payment_description").map(str::to_string);
        ctx.reference_number = row.get_nonempty("reference_number").map(str::to_string);
        ctx.debit_credit = row.get_nonempty("debit_credit").map(str::to_string);
        ctx.account_number = row.get_nonempty("account_number").map(str::to_string);
        ctx
    }

    fn secu_context(row: &Row) -> TransactionContext {
        let mut ctx = TransactionContext::new(
            row.id(),
            row.get_nonempty("statement_id").unwrap_or_default(),
            SourceType::Secu,
        );
        Self::common_fields(&mut ctx, row);
        ctx.ticker = row.get_nonempty("ticker").map(str::to_string);
        ctx.txn_type = row.get_nonempty("txn_type").map(str::to_string);
        ctx.description = row.get_nonempty("description").map(str::to_string);
        ctx.reference = row.get_nonempty("reference").map(str::to_string);
        ctx.fee = row.get_nonempty("fee").map(str::to_string);
        ctx
    }

    fn common_fields(ctx: &mut TransactionContext, row: &Row) {
        ctx.currency = row.get_nonempty("currency").map(str::to_string);
        ctx.amount = row.get_nonempty("amount").map(str::to_string);
        ctx.customer_id_raw = row.get_nonempty("customer_id_raw").map(str::to_string);
        ctx.statement_bank = row.get_nonempty("statement_bank").map(str::to_string);
        ctx.transaction_date = match row.get_date("transaction_date") {
            Ok(date) => date,
            Err(e) => {
                // the row still enriches as far as possible without a date
                warn!(transaction_id = row.id(), error = %e, "Unparsable transaction date");
                None
            }
        };
    }
}

#[async_trait]
impl ContextLoader for StagedTransactionLoader {
    async fn load(
        &self,
        store: &dyn TransactionStore,
        config: &EnrichmentConfig,
    ) -> Result<Vec<TransactionContext>, EngineError> {
        let predicate = Self::scope_predicate(config);

        let (bank_rows, secu_rows) = futures::try_join!(
            store.find(tables::BANK_TRANSACTION, &predicate, None, None, None),
            store.find(tables::SECU_TRANSACTION, &predicate, None, None, None),
        )?;

        let mut contexts: Vec<TransactionContext> =
            bank_rows.iter().map(Self::bank_context).collect();
        contexts.extend(secu_rows.iter().map(Self::secu_context));
        Ok(contexts)
    }
}
