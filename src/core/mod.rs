//! Core utilities shared across the pipeline.
//!
//! - **Error handling**: [`error::RasterError`], the crate's sole recoverable
//!   error type — the hot draw path itself has none (see its module docs).
//! - **Math**: FFI-safe vector/matrix types the pipeline's byte-addressed
//!   vertex and attribute storage is built on.

pub mod error;
pub mod math;
