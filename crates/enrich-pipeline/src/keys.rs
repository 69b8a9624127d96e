// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The recognized entries of a context's enrichments map.
//!
//! The map itself is open (steps may share anything through it); the keys
//! below are the ones with a defined meaning that downstream posting reads.

// currency validation
pub const CURRENCY_NAME: &str = "currency_name";
pub const CURRENCY_SYMBOL: &str = "currency_symbol";
pub const CURRENCY_DECIMAL_PLACES: &str = "currency_decimal_places";

// base-currency conversion
pub const ORIGINAL_AMOUNT: &str = "original_amount";
pub const ORIGINAL_CURRENCY: &str = "original_currency";
pub const BASE_AMOUNT: &str = "base_amount";
pub const BASE_CURRENCY: &str = "base_currency";
pub const BASE_FEE: &str = "base_fee";
pub const FX_RATE: &str = "fx_rate";
pub const FX_RATE_DATE: &str = "fx_rate_date";
pub const FX_RATE_SOURCE: &str = "fx_rate_source";

// customer identification
pub const CUSTOMER_ID: &str = "customer_id";
pub const CUSTOMER_CONFIDENCE: &str = "customer_confidence";
pub const CUSTOMER_ID_METHOD: &str = "customer_id_method";
pub const CUSTOMER_NAME: &str = "customer_name";
pub const CUSTOMER_CODE: &str = "customer_code";
pub const CUSTOMER_TYPE: &str = "customer_type";
pub const CUSTOMER_BASE_CURRENCY: &str = "customer_base_currency";
pub const CUSTOMER_RISK_LEVEL: &str = "customer_risk_level";

// counterparty determination
pub const COUNTERPARTY_ID: &str = "counterparty_id";
pub const COUNTERPARTY_TYPE: &str = "counterparty_type";
pub const COUNTERPARTY_BIC: &str = "counterparty_bic";
pub const COUNTERPARTY_NAME: &str = "counterparty_name";
pub const COUNTERPARTY_SHORT_CODE: &str = "counterparty_short_code";
/// BANK rows: the other side of the payment, recorded for reference only.
pub const OTHER_SIDE_BIC: &str = "other_side_bic";
pub const OTHER_SIDE_NAME: &str = "other_side_name";

// transaction-type mapping
pub const INTERNAL_TYPE: &str = "internal_type";
pub const F14_RULE_ID: &str = "f14_rule_id";
pub const F14_RULE_NAME: &str = "f14_rule_name";
pub const F14_RULES_EVALUATED: &str = "f14_rules_evaluated";
