// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Typed views over reference-data rows.
//!
//! Reference tables are read-only during enrichment. Each type parses from a
//! store [Row]; a row that does not parse is unusable reference data and is
//! skipped (with a warning) rather than failing the transaction that
//! happened to read it; see [parse_rows].

use chrono::NaiveDate;
use rust_decimal::Decimal;

use exo_store::{Row, StoreError};

/// Currency-master entry keyed by 3-letter code.
#[derive(Debug, Clone)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
    pub decimal_places: Option<i64>,
    pub active: bool,
}

impl Currency {
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            code: row.id().to_string(),
            name: row.get_nonempty("name").unwrap_or_default().to_string(),
            symbol: row.get_nonempty("symbol").map(str::to_string),
            decimal_places: row.get_i64("decimal_places")?,
            active: row.get_nonempty("status") == Some("active"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterpartyKind {
    Bank,
    Custodian,
    Broker,
}

impl CounterpartyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterpartyKind::Bank => "Bank",
            CounterpartyKind::Custodian => "Custodian",
            CounterpartyKind::Broker => "Broker",
        }
    }

    pub fn parse(value: &str) -> Option<CounterpartyKind> {
        match value.trim().to_lowercase().as_str() {
            "bank" => Some(CounterpartyKind::Bank),
            "custodian" => Some(CounterpartyKind::Custodian),
            "broker" => Some(CounterpartyKind::Broker),
            _ => None,
        }
    }
}

/// Counterparty-master entry keyed by business id (e.g. `CPT0143`). Exactly
/// one of the `*_id` fields is populated, matching `kind`; for banks and
/// custodians it holds a BIC, for brokers the key of a broker-master row.
#[derive(Debug, Clone)]
pub struct Counterparty {
    pub id: String,
    pub name: String,
    pub kind: CounterpartyKind,
    pub bank_id: Option<String>,
    pub custodian_id: Option<String>,
    pub broker_id: Option<String>,
    pub short_code: Option<String>,
    pub is_active: bool,
}

impl Counterparty {
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        let kind = row
            .get_nonempty("counterparty_type")
            .and_then(CounterpartyKind::parse)
            .ok_or_else(|| StoreError::InvalidValue {
                column: "counterparty_type".to_string(),
                value: row.get("counterparty_type").unwrap_or_default().to_string(),
                message: "expected Bank, Custodian or Broker".to_string(),
            })?;
        Ok(Self {
            id: row.id().to_string(),
            name: row.get_nonempty("name").unwrap_or_default().to_string(),
            kind,
            bank_id: row.get_nonempty("bank_id").map(str::to_string),
            custodian_id: row.get_nonempty("custodian_id").map(str::to_string),
            broker_id: row.get_nonempty("broker_id").map(str::to_string),
            short_code: row.get_nonempty("short_code").map(str::to_string),
            is_active: row.get_bool("is_active")?.unwrap_or(false),
        })
    }
}

/// Customer-master entry keyed by customer id (e.g. `CUST-000123`).
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub short_name: Option<String>,
    pub customer_type: Option<String>,
    pub registration_number: Option<String>,
    pub personal_id: Option<String>,
    pub tax_id: Option<String>,
    pub base_currency: Option<String>,
    pub risk_level: Option<String>,
    pub primary_account: Option<String>,
    pub bank_account_number: Option<String>,
    pub active: bool,
}

impl Customer {
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.id().to_string(),
            name: row.get_nonempty("name").unwrap_or_default().to_string(),
            short_name: row.get_nonempty("short_name").map(str::to_string),
            customer_type: row.get_nonempty("customer_type").map(str::to_string),
            registration_number: row.get_nonempty("registration_number").map(str::to_string),
            personal_id: row.get_nonempty("personal_id").map(str::to_string),
            tax_id: row.get_nonempty("tax_id").map(str::to_string),
            base_currency: row.get_nonempty("base_currency").map(str::to_string),
            risk_level: row.get_nonempty("risk_level").map(str::to_string),
            primary_account: row.get_nonempty("primary_account").map(str::to_string),
            bank_account_number: row.get_nonempty("bank_account_number").map(str::to_string),
            active: row.get_nonempty("status") == Some("active"),
        })
    }
}

/// One EUR-based FX quote: `exchange_rate` units of `target_currency` per
/// 1 EUR on `effective_date`. Non-positive rates are unusable and rejected
/// at parse time.
#[derive(Debug, Clone)]
pub struct FxRate {
    pub effective_date: NaiveDate,
    pub target_currency: String,
    pub exchange_rate: Decimal,
    pub active: bool,
}

impl FxRate {
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        let effective_date =
            row.get_date("effective_date")?
                .ok_or_else(|| StoreError::InvalidValue {
                    column: "effective_date".to_string(),
                    value: String::new(),
                    message: "missing".to_string(),
                })?;
        let exchange_rate =
            row.get_decimal("exchange_rate")?
                .ok_or_else(|| StoreError::InvalidValue {
                    column: "exchange_rate".to_string(),
                    value: String::new(),
                    message: "missing".to_string(),
                })?;
        if exchange_rate <= Decimal::ZERO {
            return Err(StoreError::InvalidValue {
                column: "exchange_rate".to_string(),
                value: exchange_rate.to_string(),
                message: "expected a positive rate".to_string(),
            });
        }
        Ok(Self {
            effective_date,
            target_currency: row
                .get_nonempty("target_currency")
                .unwrap_or_default()
                .to_uppercase(),
            exchange_rate,
            active: row.get_nonempty("status") == Some("active"),
        })
    }
}

/// Parses a table's rows, skipping (and logging) the unparsable ones.
pub fn parse_rows<T>(
    table: &str,
    rows: &[Row],
    parse: impl Fn(&Row) -> Result<T, StoreError>,
) -> Vec<T> {
    rows.iter()
        .filter_map(|row| match parse(row) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(table, row_id = row.id(), error = %e, "Skipping unparsable reference row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_parses_status() {
        let row = Row::new("USD")
            .with("name", "US Dollar")
            .with("symbol", "$")
            .with("decimal_places", "2")
            .with("status", "active");
        let currency = Currency::from_row(&row).unwrap();
        assert!(currency.active);
        assert_eq!(currency.decimal_places, Some(2));

        let inactive = Currency::from_row(&Row::new("XAU").with("status", "inactive")).unwrap();
        assert!(!inactive.active);
    }

    #[test]
    fn counterparty_requires_a_known_kind() {
        let row = Row::new("CPT0143")
            .with("name", "Alpha Bank")
            .with("counterparty_type", "Bank")
            .with("bank_id", "XBANKXX0")
            .with("short_code", "ALB")
            .with("is_active", "true");
        let cp = Counterparty::from_row(&row).unwrap();
        assert_eq!(cp.kind, CounterpartyKind::Bank);
        assert_eq!(cp.bank_id.as_deref(), Some("XBANKXX0"));

        let bad = Row::new("CPT9999").with("counterparty_type", "Exchange");
        assert!(Counterparty::from_row(&bad).is_err());
    }

    #[test]
    fn fx_rate_rejects_non_positive_rates() {
        let row = Row::new("fx1")
            .with("effective_date", "2024-01-12")
            .with("target_currency", "usd")
            .with("exchange_rate", "1.10")
            .with("status", "active");
        let rate = FxRate::from_row(&row).unwrap();
        assert_eq!(rate.target_currency, "USD");

        let zero = Row::new("fx2")
            .with("effective_date", "2024-01-12")
            .with("target_currency", "USD")
            .with("exchange_rate", "0");
        assert!(FxRate::from_row(&zero).is_err());
    }

    #[test]
    fn parse_rows_skips_bad_rows() {
        let rows = vec![
            Row::new("fx1")
                .with("effective_date", "2024-01-12")
                .with("target_currency", "USD")
                .with("exchange_rate", "1.10")
                .with("status", "active"),
            Row::new("fx2").with("target_currency", "USD"),
        ];
        let parsed = parse_rows("fx_rates_eur", &rows, FxRate::from_row);
        assert_eq!(parsed.len(), 1);
    }
}
