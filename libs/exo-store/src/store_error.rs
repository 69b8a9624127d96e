// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid value '{value}' for column '{column}': {message}")]
    InvalidValue {
        column: String,
        value: String,
        message: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("{0} {1}")]
    WithContext(String, #[source] Box<StoreError>),
}

impl StoreError {
    pub fn with_context(self, context: String) -> StoreError {
        StoreError::WithContext(context, Box::new(self))
    }
}

pub trait WithContext {
    fn with_context(self, context: String) -> Self;
}

impl<T> WithContext for Result<T, StoreError> {
    fn with_context(self, context: String) -> Result<T, StoreError> {
        self.map_err(|e| e.with_context(context))
    }
}
