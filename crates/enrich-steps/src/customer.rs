// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::OnceCell;

use enrich_pipeline::{
    EnrichmentStep, ExceptionPriority, ExceptionType, ProcessingStatus, SourceType, StepError,
    StepResult, TransactionContext, audit, exception, keys, sentinel,
};
use exo_store::{Predicate, TransactionStore, tables};

use crate::refdata::{Customer, parse_rows};

/// How a customer was identified, with the confidence each method carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentificationMethod {
    DirectId,
    AccountNumber,
    ExtractedRegistration,
    NamePattern,
}

impl IdentificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentificationMethod::DirectId => "DIRECT_ID",
            IdentificationMethod::AccountNumber => "ACCOUNT_NUMBER",
            IdentificationMethod::ExtractedRegistration => "EXTRACTED_REGISTRATION",
            IdentificationMethod::NamePattern => "NAME_PATTERN",
        }
    }

    pub fn confidence(&self) -> u64 {
        match self {
            IdentificationMethod::DirectId => 100,
            IdentificationMethod::AccountNumber => 95,
            IdentificationMethod::ExtractedRegistration => 90,
            IdentificationMethod::NamePattern => 70,
        }
    }
}

/// Identifies the customer behind a BANK transaction.
///
/// Methods are tried in decreasing confidence order and the first success
/// wins. A row without any identifiable customer continues with the
/// `UNKNOWN` sentinel and a `MISSING_CUSTOMER` exception; identification is
/// never fatal.
///
/// Securities rows represent the bank's own portfolio operations and carry
/// no individual customer, so the step only executes for BANK rows.
pub struct CustomerIdentificationStep {
    customers: OnceCell<Vec<Customer>>,
    customer_key: Regex,
    registration_token: Regex,
}

impl CustomerIdentificationStep {
    pub fn new() -> Self {
        Self {
            customers: OnceCell::new(),
            // customer keys look like CUST-000123 (any upper-case prefix)
            customer_key: Regex::new(r"^[A-Z]+-\d+$").expect("static pattern"),
            // REG:/REG-/REGNUM:/REGISTRATION: followed by a token
            registration_token: Regex::new(r"(?i)(?:REGISTRATION:|REGNUM:|REG:|REG-)\s*(\S+)")
                .expect("static pattern"),
        }
    }

    async fn customers(&self, store: &dyn TransactionStore) -> Result<&Vec<Customer>, StepError> {
        self.customers
            .get_or_try_init(|| async {
                let rows = store
                    .find(tables::CUSTOMER_MASTER, &Predicate::True, None, None, None)
                    .await?;
                Ok(parse_rows(tables::CUSTOMER_MASTER, &rows, Customer::from_row))
            })
            .await
    }

    /// Method 1: the raw identifier is either a customer key or one of the
    /// registry numbers (registration, personal, tax, in that preference
    /// order).
    fn by_direct_id<'a>(&self, customers: &'a [Customer], raw: &str) -> Option<&'a Customer> {
        if self.customer_key.is_match(raw) {
            return customers.iter().find(|c| c.id == raw);
        }
        customers
            .iter()
            .find(|c| c.registration_number.as_deref() == Some(raw))
            .or_else(|| customers.iter().find(|c| c.personal_id.as_deref() == Some(raw)))
            .or_else(|| customers.iter().find(|c| c.tax_id.as_deref() == Some(raw)))
    }

    /// Method 2: the account number, first through the active
    /// account-to-customer mappings, then directly against the master's
    /// account fields.
    async fn by_account_number<'a>(
        &self,
        customers: &'a [Customer],
        store: &dyn TransactionStore,
        account_number: &str,
    ) -> Result<Option<&'a Customer>, StepError> {
        let mappings = store
            .find(
                tables::CUSTOMER_ACCOUNT,
                &Predicate::and(
                    Predicate::eq("account_number", account_number),
                    Predicate::eq("status", "active"),
                ),
                None,
                None,
                None,
            )
            .await?;
        for mapping in &mappings {
            if let Some(customer_id) = mapping.get_nonempty("customer_id")
                && let Some(customer) = customers.iter().find(|c| c.id == customer_id)
            {
                return Ok(Some(customer));
            }
        }

        Ok(customers.iter().find(|c| {
            c.bank_account_number.as_deref() == Some(account_number)
                || c.primary_account.as_deref() == Some(account_number)
        }))
    }

    /// Method 3: registration-number tokens embedded in the reference number
    /// or payment description.
    fn by_extracted_registration<'a>(
        &self,
        customers: &'a [Customer],
        ctx: &TransactionContext,
    ) -> Option<&'a Customer> {
        let sources = [
            ctx.reference_number.as_deref(),
            ctx.payment_description.as_deref(),
        ];
        for text in sources.into_iter().flatten() {
            for capture in self.registration_token.captures_iter(text) {
                if let Some(token) = capture.get(1)
                    && let Some(customer) = self.by_direct_id(customers, token.as_str())
                {
                    return Some(customer);
                }
            }
        }
        None
    }

    /// Method 4: the other side's name, exactly or by guarded substring.
    fn by_name_pattern<'a>(
        &self,
        customers: &'a [Customer],
        other_side_name: &str,
    ) -> Option<&'a Customer> {
        let target = other_side_name.trim().to_uppercase();
        if target.is_empty() {
            return None;
        }

        let exact = customers.iter().find(|c| {
            c.name.to_uppercase() == target
                || c.short_name
                    .as_deref()
                    .is_some_and(|s| s.to_uppercase() == target)
        });
        if exact.is_some() {
            return exact;
        }

        // substring in either direction, only for close-enough lengths
        fn close_substring(a: &str, b: &str) -> bool {
            let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
            shorter.len() >= 5
                && shorter.len() * 10 >= longer.len() * 7
                && longer.contains(shorter)
        }

        customers.iter().find(|c| {
            close_substring(&c.name.to_uppercase(), &target)
                || c.short_name
                    .as_deref()
                    .is_some_and(|s| close_substring(&s.to_uppercase(), &target))
        })
    }

    async fn identify<'a>(
        &self,
        customers: &'a [Customer],
        ctx: &TransactionContext,
        store: &dyn TransactionStore,
    ) -> Result<Option<(&'a Customer, IdentificationMethod)>, StepError> {
        if let Some(raw) = ctx.customer_id_raw.as_deref().map(str::trim).filter(|r| !r.is_empty())
            && let Some(customer) = self.by_direct_id(customers, raw)
        {
            return Ok(Some((customer, IdentificationMethod::DirectId)));
        }

        if let Some(account) = ctx.account_number.as_deref().map(str::trim).filter(|a| !a.is_empty())
            && let Some(customer) = self.by_account_number(customers, store, account).await?
        {
            return Ok(Some((customer, IdentificationMethod::AccountNumber)));
        }

        if let Some(customer) = self.by_extracted_registration(customers, ctx) {
            return Ok(Some((customer, IdentificationMethod::ExtractedRegistration)));
        }

        if let Some(name) = ctx.other_side_name.as_deref()
            && let Some(customer) = self.by_name_pattern(customers, name)
        {
            return Ok(Some((customer, IdentificationMethod::NamePattern)));
        }

        Ok(None)
    }
}

impl Default for CustomerIdentificationStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnrichmentStep for CustomerIdentificationStep {
    fn name(&self) -> &'static str {
        "customer_identification"
    }

    fn should_execute(&self, ctx: &TransactionContext) -> bool {
        ctx.error_message.is_none() && ctx.source_type() == SourceType::Bank
    }

    async fn run(
        &self,
        ctx: &mut TransactionContext,
        store: &dyn TransactionStore,
    ) -> Result<StepResult, StepError> {
        let customers = self.customers(store).await?;

        let Some((customer, method)) = self.identify(customers, ctx, store).await? else {
            ctx.set_enrichment(keys::CUSTOMER_ID, sentinel::UNKNOWN);
            ctx.set_enrichment(keys::CUSTOMER_CONFIDENCE, 0u64);
            exception::raise(
                store,
                ctx,
                ExceptionType::MissingCustomer,
                "No identification method produced a customer",
                ExceptionPriority::High,
            )
            .await?;
            ctx.record_status(ProcessingStatus::CustomerIdentified);
            return Ok(StepResult::success("No customer identified"));
        };

        let confidence = method.confidence();
        ctx.set_enrichment(keys::CUSTOMER_ID, customer.id.as_str());
        ctx.set_enrichment(keys::CUSTOMER_CONFIDENCE, confidence);
        ctx.set_enrichment(keys::CUSTOMER_ID_METHOD, method.as_str());
        ctx.set_enrichment(keys::CUSTOMER_NAME, customer.name.as_str());
        if let Some(short_name) = &customer.short_name {
            ctx.set_enrichment(keys::CUSTOMER_CODE, short_name.as_str());
        }
        if let Some(customer_type) = &customer.customer_type {
            ctx.set_enrichment(keys::CUSTOMER_TYPE, customer_type.as_str());
        }
        if let Some(base_currency) = &customer.base_currency {
            ctx.set_enrichment(keys::CUSTOMER_BASE_CURRENCY, base_currency.as_str());
        }
        if let Some(risk_level) = &customer.risk_level {
            ctx.set_enrichment(keys::CUSTOMER_RISK_LEVEL, risk_level.as_str());
        }

        if !customer.active {
            exception::raise(
                store,
                ctx,
                ExceptionType::InactiveCustomer,
                &format!("Customer {} is not active", customer.id),
                ExceptionPriority::High,
            )
            .await?;
        }
        if confidence < 80 {
            exception::raise(
                store,
                ctx,
                ExceptionType::LowConfidenceIdentification,
                &format!(
                    "Customer {} identified by {} with confidence {confidence}",
                    customer.id,
                    method.as_str()
                ),
                ExceptionPriority::Low,
            )
            .await?;
        }

        audit::record(
            store,
            ctx,
            self.name(),
            "CUSTOMER_IDENTIFIED",
            &format!(
                "Identified {} via {} (confidence {confidence})",
                customer.id,
                method.as_str()
            ),
        )
        .await;
        ctx.record_status(ProcessingStatus::CustomerIdentified);

        Ok(StepResult::success(format!(
            "Customer {} identified via {}",
            customer.id,
            method.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use exo_store::{InMemoryStore, Row};

    use super::*;

    async fn store_with_customers() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .seed(
                tables::CUSTOMER_MASTER,
                vec![
                    Row::new("CUST-000042")
                        .with("name", "Acme Industries OU")
                        .with("short_name", "ACME")
                        .with("customer_type", "company")
                        .with("registration_number", "123456789")
                        .with("base_currency", "EUR")
                        .with("risk_level", "low")
                        .with("bank_account_number", "EE382200221020145685")
                        .with("status", "active"),
                    Row::new("CUST-000077")
                        .with("name", "Jane Mattson")
                        .with("personal_id", "48001010033")
                        .with("status", "active"),
                    Row::new("CUST-000099")
                        .with("name", "Dormant Holdings")
                        .with("registration_number", "555000111")
                        .with("status", "closed"),
                ],
            )
            .await
            .unwrap();
        store
            .seed(
                tables::CUSTOMER_ACCOUNT,
                vec![
                    Row::new("ca-1")
                        .with("account_number", "EE100010010001")
                        .with("customer_id", "CUST-000077")
                        .with("status", "active"),
                    Row::new("ca-2")
                        .with("account_number", "EE200020020002")
                        .with("customer_id", "CUST-000042")
                        .with("status", "inactive"),
                ],
            )
            .await
            .unwrap();
        store
    }

    fn bank_ctx() -> TransactionContext {
        let mut ctx = TransactionContext::new("tx-1", "st-1", SourceType::Bank);
        ctx.amount = Some("1000.00".to_string());
        ctx
    }

    async fn exception_types(store: &InMemoryStore) -> Vec<String> {
        store
            .find(tables::EXCEPTION_QUEUE, &Predicate::True, None, None, None)
            .await
            .unwrap()
            .iter()
            .map(|r| r.get("exception_type").unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn skips_securities_rows() {
        let step = CustomerIdentificationStep::new();
        let ctx = TransactionContext::new("tx-1", "st-1", SourceType::Secu);
        assert!(!step.should_execute(&ctx));
    }

    #[tokio::test]
    async fn direct_customer_key() {
        let store = store_with_customers().await;
        let step = CustomerIdentificationStep::new();
        let mut ctx = bank_ctx();
        ctx.customer_id_raw = Some("CUST-000042".to_string());

        let result = step.run(&mut ctx, &store).await.unwrap();
        assert!(result.success);
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID), Some("CUST-000042"));
        assert_eq!(
            ctx.enrichment(keys::CUSTOMER_CONFIDENCE).and_then(common::Val::as_u64),
            Some(100)
        );
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID_METHOD), Some("DIRECT_ID"));
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_CODE), Some("ACME"));
        assert!(exception_types(&store).await.is_empty());
    }

    #[tokio::test]
    async fn registration_number_without_prefix() {
        let store = store_with_customers().await;
        let step = CustomerIdentificationStep::new();
        let mut ctx = bank_ctx();
        ctx.customer_id_raw = Some("123456789".to_string());

        step.run(&mut ctx, &store).await.unwrap();
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID), Some("CUST-000042"));
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID_METHOD), Some("DIRECT_ID"));
        assert!(exception_types(&store).await.is_empty());
    }

    #[tokio::test]
    async fn personal_id_matches_individuals() {
        let store = store_with_customers().await;
        let step = CustomerIdentificationStep::new();
        let mut ctx = bank_ctx();
        ctx.customer_id_raw = Some("48001010033".to_string());

        step.run(&mut ctx, &store).await.unwrap();
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID), Some("CUST-000077"));
    }

    #[tokio::test]
    async fn account_number_through_mapping() {
        let store = store_with_customers().await;
        let step = CustomerIdentificationStep::new();
        let mut ctx = bank_ctx();
        ctx.account_number = Some("EE100010010001".to_string());

        step.run(&mut ctx, &store).await.unwrap();
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID), Some("CUST-000077"));
        assert_eq!(
            ctx.enrichment(keys::CUSTOMER_CONFIDENCE).and_then(common::Val::as_u64),
            Some(95)
        );
    }

    #[tokio::test]
    async fn inactive_account_mapping_is_ignored_but_master_field_matches() {
        let store = store_with_customers().await;
        let step = CustomerIdentificationStep::new();
        let mut ctx = bank_ctx();
        // ca-2 is inactive; the master's bank_account_number still matches
        ctx.account_number = Some("EE382200221020145685".to_string());

        step.run(&mut ctx, &store).await.unwrap();
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID), Some("CUST-000042"));
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID_METHOD), Some("ACCOUNT_NUMBER"));
    }

    #[tokio::test]
    async fn registration_token_extracted_from_description() {
        let store = store_with_customers().await;
        let step = CustomerIdentificationStep::new();
        let mut ctx = bank_ctx();
        ctx.payment_description = Some("INVOICE 2024-17 REG:123456789 THANK YOU".to_string());

        step.run(&mut ctx, &store).await.unwrap();
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID), Some("CUST-000042"));
        assert_eq!(
            ctx.enrichment_str(keys::CUSTOMER_ID_METHOD),
            Some("EXTRACTED_REGISTRATION")
        );
        assert!(exception_types(&store).await.is_empty());
    }

    #[tokio::test]
    async fn name_pattern_is_low_confidence() {
        let store = store_with_customers().await;
        let step = CustomerIdentificationStep::new();
        let mut ctx = bank_ctx();
        ctx.other_side_name = Some("acme industries ou".to_string());

        step.run(&mut ctx, &store).await.unwrap();
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID), Some("CUST-000042"));
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID_METHOD), Some("NAME_PATTERN"));
        assert_eq!(
            exception_types(&store).await,
            vec!["LOW_CONFIDENCE_IDENTIFICATION"]
        );
    }

    #[tokio::test]
    async fn substring_name_match_requires_close_lengths() {
        let store = store_with_customers().await;
        let step = CustomerIdentificationStep::new();

        // "ACME INDUSTRIES" (15) vs "ACME INDUSTRIES OU" (18): 15 >= 0.7*18
        let mut ctx = bank_ctx();
        ctx.other_side_name = Some("ACME INDUSTRIES".to_string());
        step.run(&mut ctx, &store).await.unwrap();
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID), Some("CUST-000042"));

        // "ACME" alone is too short for a substring match (and matches
        // short_name exactly instead)
        let mut ctx = bank_ctx();
        ctx.other_side_name = Some("ACME".to_string());
        step.run(&mut ctx, &store).await.unwrap();
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID), Some("CUST-000042"));
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID_METHOD), Some("NAME_PATTERN"));
    }

    #[tokio::test]
    async fn unknown_customer_continues_with_exception() {
        let store = store_with_customers().await;
        let step = CustomerIdentificationStep::new();
        let mut ctx = bank_ctx();
        ctx.other_side_name = Some("NO SUCH COMPANY".to_string());

        let result = step.run(&mut ctx, &store).await.unwrap();
        assert!(result.success);
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID), Some("UNKNOWN"));
        assert_eq!(
            ctx.enrichment(keys::CUSTOMER_CONFIDENCE).and_then(common::Val::as_u64),
            Some(0)
        );
        assert_eq!(exception_types(&store).await, vec!["MISSING_CUSTOMER"]);
    }

    #[tokio::test]
    async fn inactive_customer_raises_advisory() {
        let store = store_with_customers().await;
        let step = CustomerIdentificationStep::new();
        let mut ctx = bank_ctx();
        ctx.customer_id_raw = Some("555000111".to_string());

        let result = step.run(&mut ctx, &store).await.unwrap();
        assert!(result.success);
        assert_eq!(ctx.enrichment_str(keys::CUSTOMER_ID), Some("CUST-000099"));
        assert_eq!(exception_types(&store).await, vec!["INACTIVE_CUSTOMER"]);
    }
}
