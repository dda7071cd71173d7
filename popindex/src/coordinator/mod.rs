// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine facade
//!
//! Provides the main public API for embedding the popularity engine.

pub mod engine;

pub use engine::PopularityEngine;
