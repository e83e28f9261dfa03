//! Aggregation of batch results.

use crate::domain::{BatchJobResult, BatchSummary};

/// Count successful and failed jobs.
pub fn summarize(results: &[BatchJobResult]) -> BatchSummary {
    let successful = results.iter().filter(|result| result.success()).count();
    BatchSummary {
        successful,
        failed: results.len() - successful,
    }
}
