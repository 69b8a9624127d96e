// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Environment access behind a trait, so that hosts and tests can supply
//! configuration without touching process-level variables.

use std::collections::HashMap;

/// Variables recognized by the enrichment engine.
pub mod env_const {
    /// Continue-vs-abort policy for a row whose step failed (default: continue).
    pub const EXO_ENRICH_STOP_ON_ERROR: &str = "EXO_ENRICH_STOP_ON_ERROR";
    /// Restricts the staged-row loaders to one batch.
    pub const EXO_ENRICH_BATCH_ID: &str = "EXO_ENRICH_BATCH_ID";
}

pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn enabled(&self, key: &str, default_value: bool) -> Result<bool, EnvError> {
        match self.get(key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(EnvError::InvalidBoolean {
                    key: key.to_string(),
                    value,
                }),
            },
            None => Ok(default_value),
        }
    }

    fn get_or_else(&self, key: &str, default_value: &str) -> String {
        self.get(key).unwrap_or(default_value.to_string())
    }
}

/// Process environment variables.
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed variables, for tests and embedded hosts.
#[derive(Clone, Default)]
pub struct MapEnvironment {
    values: HashMap<String, String>,
}

impl Environment for MapEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MapEnvironment {
    fn from(values: [(&str, &str); N]) -> Self {
        Self {
            values: HashMap::from_iter(
                values
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("Invalid value for {key}: {value}. Expected true, 1, yes, on OR false, 0, no, off")]
    InvalidBoolean { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_parses_boolean_spellings() {
        let env = MapEnvironment::from([("A", "yes"), ("B", "0"), ("C", "maybe")]);
        assert!(env.enabled("A", false).unwrap());
        assert!(!env.enabled("B", true).unwrap());
        assert!(env.enabled("MISSING", true).unwrap());
        assert!(env.enabled("C", false).is_err());
    }

    #[test]
    fn get_or_else_falls_back() {
        let env = MapEnvironment::default();
        assert_eq!(env.get_or_else("X", "fallback"), "fallback");
    }
}
