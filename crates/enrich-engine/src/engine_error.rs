// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

use common::env::EnvError;
use exo_store::StoreError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Store: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration: {0}")]
    Config(#[from] EnvError),

    #[error("Loader: {0}")]
    Loader(String),

    #[error("Persister: {0}")]
    Persister(String),
}
