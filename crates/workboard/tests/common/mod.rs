//! Shared test utilities for workboard integration tests.
//!
//! This module provides:
//! - `TestHarness` wiring an in-memory database, gateway and store together
//! - `FailingStore` for injecting backend failures
//! - `FakeProvider` for driving the identity gateway without a network
//! - Builder patterns for drafts

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{eventually, user, FailingStore, FakeProvider, TestHarness};
