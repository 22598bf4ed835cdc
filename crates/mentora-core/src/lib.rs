//! mentora-core
//!
//! Pure domain types for the report pipeline: the report entity and its
//! state machine, parameters, analytics data contracts, and structured
//! result sets. No I/O dependency — this is the shared vocabulary of the
//! Mentora system.

pub mod analytics;
pub mod dataset;
pub mod error;
pub mod models;
pub mod report_files;
