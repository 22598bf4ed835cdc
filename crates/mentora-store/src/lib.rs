//! mentora-store
//!
//! Persistence for report records — one JSON file per record with
//! serialized, validated status transitions — plus the in-memory
//! analytics source used for wiring and tests.

pub mod error;
pub mod memory;
pub mod reports;
