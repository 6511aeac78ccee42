//! Shader-facing record types: `Vertex`, `VertexH`, `Fragment`, the
//! borrowed `VertexBuffer`, and the per-draw `Triangle`.
//!
//! User vertex types extend `Vertex` by composition rather than
//! inheritance: a `#[repr(C)]` struct whose first field is `Vertex`,
//! followed by application-defined attributes at known byte offsets. Each
//! vertex's attribute payload is a typed `&mut [f32]`/`&[f32]` slice
//! borrowed from the pipeline's arena, tying its lifetime to the draw call
//! rather than exposing a raw pointer.

use std::marker::PhantomData;

use crate::core::math::{Vec3, Vec4};
use crate::libs::graphics::shader::MAX_ATTRS;

/// The fixed header every user vertex type must start with.
///
/// A user vertex is any `#[repr(C)]` struct whose first field has this
/// type, followed by application-defined attributes (normal, UV, color,
/// ...) at known offsets. Composition stands in for the inheritance a
/// C++ renderer would use here, since Rust has no struct inheritance.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vertex {
    /// Object-space position.
    pub pos: Vec3,
}

/// The output of the vertex shader: homogeneous clip-space position plus
/// the per-vertex attribute payload.
///
/// `pos` is mutated in place by perspective divide (after which `pos.w`
/// holds `1/w_clip`, reused as `1/z_view`) and by the viewport transform.
pub struct VertexH<'a> {
    /// Clip-space (pre-divide), then NDC, then screen-space position.
    pub pos: Vec4,
    attrs: &'a mut [f32],
}

impl<'a> VertexH<'a> {
    /// Builds a vertex header over an arena-allocated attribute slice.
    pub fn new(attrs: &'a mut [f32]) -> Self {
        Self {
            pos: Vec4::zero(),
            attrs,
        }
    }

    /// Read-only view of this vertex's attribute payload.
    pub fn attrs(&self) -> &[f32] {
        self.attrs
    }

    /// Mutable view of this vertex's attribute payload — written by the
    /// vertex shader, then read (and, during perspective-correct setup,
    /// rewritten) by the pipeline.
    pub fn attrs_mut(&mut self) -> &mut [f32] {
        self.attrs
    }
}

/// The input to the fragment shader: an integer pixel center plus depth,
/// and interpolated attributes in fixed-size scratch storage.
///
/// A plain fixed-size array sized to the compile-time attribute cap gives
/// "no heap allocation per fragment" without a stack buffer reinterpreted
/// through a raw pointer.
pub struct Fragment {
    /// `(x, y)` are integer pixel centers (stored as floats); `z` is depth
    /// in `[0, 1]`.
    pub coord: Vec3,
    attrs: [f32; MAX_ATTRS],
    attr_count: usize,
}

impl Fragment {
    /// Builds a fragment with `attr_count` valid attribute slots.
    pub fn new(coord: Vec3, attr_count: usize) -> Self {
        assert!(attr_count <= MAX_ATTRS);
        Self {
            coord,
            attrs: [0.0; MAX_ATTRS],
            attr_count,
        }
    }

    /// The interpolated attribute payload.
    pub fn attrs(&self) -> &[f32] {
        &self.attrs[..self.attr_count]
    }

    /// Mutable access used by the pipeline while interpolating.
    pub fn attrs_mut(&mut self) -> &mut [f32] {
        &mut self.attrs[..self.attr_count]
    }
}

/// A borrowed view over a caller-owned vertex array: pointer, element
/// count, and byte stride. The pipeline interprets the first bytes of each
/// element as a [`Vertex`]; remaining bytes are user-defined attributes
/// reached by the user's own vertex shader.
///
/// Borrowed, not copied — the `'a` lifetime ties this view to the backing
/// storage, so it cannot outlive the slice it was built from, enforcing
/// that the bound vertex buffer and its backing memory stay valid between
/// `set_vertex_buffer` and `draw`.
pub struct VertexBuffer<'a> {
    ptr: *const u8,
    count: usize,
    stride: usize,
    _marker: PhantomData<&'a ()>,
}

impl<'a> VertexBuffer<'a> {
    /// Builds a vertex buffer view over `data`, whose element type `V`
    /// must have `Vertex` as its first field.
    pub fn from_slice<V>(data: &'a [V]) -> Self {
        Self {
            ptr: data.as_ptr() as *const u8,
            count: data.len(),
            stride: std::mem::size_of::<V>(),
            _marker: PhantomData,
        }
    }

    /// Number of vertices in the buffer.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The raw base pointer, for the pipeline to copy into its own
    /// pointer-based bound state (see `Pipeline::set_vertex_buffer`).
    pub(crate) fn ptr(&self) -> *const u8 {
        self.ptr
    }

    /// The per-element byte stride.
    pub(crate) fn stride(&self) -> usize {
        self.stride
    }
}

/// Three vertex-header indices into the pipeline's per-draw vertex array,
/// plus a cached signed screen-space area.
///
/// Indices into the arena-allocated vertex array, rather than raw
/// `VertexH` pointers, avoid aliased mutable pointers into the arena
/// while keeping the same "three vertices plus cached area" shape.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    /// Indices of this triangle's three vertices.
    pub indices: [usize; 3],
    /// Cached signed screen-space area (set once culling determines
    /// winding; `0.0` before that point).
    pub darea: f32,
}

impl Triangle {
    /// Builds a triangle from three vertex indices with no area computed
    /// yet.
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices, darea: 0.0 }
    }
}
