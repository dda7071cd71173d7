//! Test utilities for PopIndex integration tests
//!
//! - TestFixture: engine over a shared in-memory gateway with a fixed clock,
//!   seeded with a small catalog of games, sources and metrics
//! - GatedGateway: holds a chosen read open so a write can land mid-read

#![allow(dead_code)]

pub mod gated_gateway;
pub mod test_fixture;
