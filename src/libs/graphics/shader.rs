//! The vertex/fragment shader contract and `Program` descriptor.
//!
//! Shaders are plain function pointers sharing an opaque uniform pointer,
//! not a trait object or closure: the pipeline must stay agnostic to the
//! uniform struct's layout without a compiled shader IR, and a raw `fn`
//! pointer plus a `*const c_void` is the cheapest shape that allows that.

use std::ffi::c_void;

use crate::libs::graphics::framebuffer::MAX_COLOR_ATTACHMENTS;
use crate::libs::graphics::vertex::{Fragment, Vertex, VertexH};

/// Compile-time cap on `Program::attr_count`.
pub const MAX_ATTRS: usize = 16;

/// `(vertex_in, uniform_ptr, vertex_out) -> ()`.
///
/// Must fill `vertex_out.pos` (clip-space) and write `attr_count` floats
/// into `vertex_out.attrs()`. Pure: must not retain state across calls and
/// must not allocate from the pipeline's arena.
pub type VertexShader = fn(vertex_in: &Vertex, uniform: *const c_void, vertex_out: &mut VertexH);

/// `(fragment_in, uniform_ptr, color_out) -> ()`.
///
/// Writes one color per bound attachment into `color_out[0..attachment_count]`.
/// Pure, same constraints as [`VertexShader`].
pub type FragmentShader = fn(
    fragment_in: &Fragment,
    uniform: *const c_void,
    color_out: &mut [crate::core::math::Vec4; MAX_COLOR_ATTACHMENTS],
);

/// A bound shader pair plus the number of float attribute slots they share.
#[derive(Clone, Copy)]
pub struct Program {
    /// The vertex shader.
    pub vs: VertexShader,
    /// The fragment shader.
    pub fs: FragmentShader,
    /// Number of float attribute slots passed from `vs` to `fs` per vertex.
    /// Must be `<= MAX_ATTRS`.
    pub attr_count: usize,
}

impl Program {
    /// Builds a program, asserting `attr_count` respects the compile-time
    /// cap — exceeding it is a programmer error.
    pub fn new(vs: VertexShader, fs: FragmentShader, attr_count: usize) -> Self {
        assert!(
            attr_count <= MAX_ATTRS,
            "attr_count {attr_count} exceeds MAX_ATTRS {MAX_ATTRS}"
        );
        Self { vs, fs, attr_count }
    }
}
