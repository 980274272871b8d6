//! # peek-common
//!
//! Shared configuration, error handling, and identifier validation used across
//! the peek crates. No federation logic lives here, just primitives and the
//! HTTP-facing error contract.

pub mod config;
pub mod error;
pub mod validation;

pub use error::{ApiError, ApiResult, MatrixError};
