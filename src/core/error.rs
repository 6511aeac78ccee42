//! Error types for the small fallible surface of this crate.
//!
//! The draw path itself (`Pipeline::draw`) recognizes no recoverable error —
//! missing bound state, an `attr_count` over the compile-time cap, and
//! similar misuse are programmer errors caught by `assert!`/`debug_assert!`.
//! `RasterError` instead covers the handful of constructor-time operations
//! that run once, off the hot path, and are worth handing back to a caller
//! rather than aborting on: building a framebuffer with an invalid
//! attachment count, or attaching a texture whose dimensions don't match
//! the framebuffer it's being attached to.

use thiserror::Error;

/// Errors returned by the crate's non-hot-path setup APIs.
#[derive(Error, Debug, PartialEq)]
pub enum RasterError {
    /// `FrameBuffer::new` was asked for zero color attachments, or more
    /// than `MAX_COLOR_ATTACHMENTS`.
    #[error("color attachment count {requested} out of range 1..={max}")]
    InvalidAttachmentCount {
        /// The attachment count that was requested.
        requested: usize,
        /// The crate's compile-time maximum.
        max: usize,
    },

    /// A texture attached to a framebuffer didn't match its dimensions.
    #[error(
        "attachment size {width}x{height} does not match framebuffer size {expected_width}x{expected_height}"
    )]
    AttachmentSizeMismatch {
        /// Width of the texture that was attached.
        width: u32,
        /// Height of the texture that was attached.
        height: u32,
        /// The framebuffer's (and depth texture's) width.
        expected_width: u32,
        /// The framebuffer's (and depth texture's) height.
        expected_height: u32,
    },

    /// A color slot index was out of range for the framebuffer's attachment
    /// count.
    #[error("color slot {slot} out of range, framebuffer has {count} attachment(s)")]
    SlotOutOfRange {
        /// The slot index that was requested.
        slot: usize,
        /// The number of attachments the framebuffer actually has.
        count: usize,
    },
}
