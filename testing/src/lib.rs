//! Test doubles for the Stagepass pipeline.
//!
//! [`mocks::MemoryStore`] implements every store trait under a single mutex
//! with the same observable atomicity as the PostgreSQL implementation, so
//! the concurrency properties (no oversell, exactly-once issuance, no
//! overdraw) can be exercised without a database. [`mocks::MockGateway`]
//! records outbound calls and can be scripted to fail;
//! [`mocks::CapturingMailer`] collects dispatched notices.

pub mod fixtures;
pub mod mocks;

pub use mocks::{CapturingMailer, MemoryStore, MockGateway};
