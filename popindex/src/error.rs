// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine error types

use crate::storage::StorageError;
use thiserror::Error;

/// Errors surfaced by compute and read operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Rejected before any I/O: unknown game, blank period, future date
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Any gateway failure, passed through unchanged
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Storage failures may succeed on retry; the engine never retries itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Storage(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, EngineError::InvalidArgument(_))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
