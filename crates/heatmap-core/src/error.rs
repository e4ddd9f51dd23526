//! Core error taxonomy.
//!
//! Only failures that are fatal to the core, or that reject a caller-supplied
//! configuration outright, become a `CoreError`. Everything the core can
//! recover from locally (a bad CIDR line, an out-of-order event) is folded
//! into a monotonic counter on [`crate::pipeline::Pipeline`] instead of
//! propagated as an error. IO failures and video-encoder failures are
//! driver-level concerns that never reach this crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("hilbert order {0} out of range [4, 16]")]
    InvalidOrder(u8),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("resource exhausted: {0}")]
    Resource(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
