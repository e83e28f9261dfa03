//! Core domain types for launch orchestration.
//!
//! This module contains pure domain types with no I/O:
//! - Launch requests and their validation
//! - Per-attempt launch outcomes
//! - Batch job results and summaries

pub mod batch;
pub mod outcome;
pub mod request;

pub use batch::{BatchJobResult, BatchSummary};
pub use outcome::LaunchOutcome;
pub use request::{LaunchId, LaunchRequest, LaunchRequestInput, MAX_SYMBOL_LEN, MintIdentity};
