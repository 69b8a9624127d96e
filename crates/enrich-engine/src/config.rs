// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use common::env::{Environment, env_const};

use crate::engine_error::EngineError;

/// Execution options supplied by the host. Nothing else affects pipeline
/// semantics.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentConfig {
    /// Abort a row's remaining steps once one fails. Off by default:
    /// partially enriched rows are still worth persisting and flagging.
    pub stop_on_error: bool,
    /// Restrict the loaders to rows staged under this batch.
    pub batch_id: Option<String>,
}

impl EnrichmentConfig {
    /// Reads the configuration from an [Environment], for hosts that pass
    /// options through variables rather than programmatically.
    pub fn from_env(env: &dyn Environment) -> Result<Self, EngineError> {
        Ok(Self {
            stop_on_error: env.enabled(env_const::EXO_ENRICH_STOP_ON_ERROR, false)?,
            batch_id: env.get(env_const::EXO_ENRICH_BATCH_ID),
        })
    }
}

#[cfg(test)]
mod tests {
    use common::env::MapEnvironment;

    use super::*;

    #[test]
    fn defaults() {
        let config = EnrichmentConfig::default();
        assert!(!config.stop_on_error);
        assert!(config.batch_id.is_none());
    }

    #[test]
    fn from_environment() {
        let env = MapEnvironment::from([
            ("EXO_ENRICH_STOP_ON_ERROR", "true"),
            ("EXO_ENRICH_BATCH_ID", "batch-7"),
        ]);
        let config = EnrichmentConfig::from_env(&env).unwrap();
        assert!(config.stop_on_error);
        assert_eq!(config.batch_id.as_deref(), Some("batch-7"));
    }

    #[test]
    fn invalid_boolean_is_a_config_error() {
        let env = MapEnvironment::from([("EXO_ENRICH_STOP_ON_ERROR", "perhaps")]);
        assert!(matches!(
            EnrichmentConfig::from_env(&env),
            Err(EngineError::Config(_))
        ));
    }
}
