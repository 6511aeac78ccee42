//! Multi-target framebuffer: up to `MAX_COLOR_ATTACHMENTS` color textures
//! plus one depth texture, all sharing dimensions.
//!
//! Supports multiple render targets (for deferred-style passes writing
//! albedo/normal/position in one draw) while keeping a single shared depth
//! buffer and clear/depth-test/color-write semantics.

use crate::core::error::RasterError;
use crate::core::math::{Vec3, Vec4};
use crate::libs::graphics::texture::{Texel, Texture, Unorm8x4};

/// Design bound: a framebuffer may have at most this many color
/// attachments.
pub const MAX_COLOR_ATTACHMENTS: usize = 4;

/// A color attachment, typed by its storage format.
#[derive(Clone, Debug)]
pub enum ColorAttachment {
    /// Packed 8-bit RGBA.
    Unorm(Texture<Unorm8x4>),
    /// Full-precision RGB (no alpha).
    Vec3(Texture<Vec3>),
}

impl ColorAttachment {
    fn width(&self) -> u32 {
        match self {
            ColorAttachment::Unorm(t) => t.width(),
            ColorAttachment::Vec3(t) => t.width(),
        }
    }

    fn height(&self) -> u32 {
        match self {
            ColorAttachment::Unorm(t) => t.height(),
            ColorAttachment::Vec3(t) => t.height(),
        }
    }

    fn clear(&mut self) {
        match self {
            ColorAttachment::Unorm(t) => t.clear(),
            ColorAttachment::Vec3(t) => t.clear(),
        }
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Vec4) {
        match self {
            ColorAttachment::Unorm(t) => t.set_texel(x, y, color),
            ColorAttachment::Vec3(t) => t.set_texel(x, y, color.xyz()),
        }
    }

    /// Bytes of the raw texel buffer, for host-side blit.
    pub fn raw_bytes(&self) -> &[u8] {
        match self {
            ColorAttachment::Unorm(t) => bytemuck::cast_slice(t.raw_buffer()),
            ColorAttachment::Vec3(t) => {
                let floats: &[Vec3] = t.raw_buffer();
                bytemuck::cast_slice(floats)
            }
        }
    }
}

/// Bundles color attachments and a depth buffer sharing one size.
pub struct FrameBuffer {
    colors: Vec<ColorAttachment>,
    depth: Texture<f32>,
    color_write: bool,
}

impl FrameBuffer {
    /// Creates a framebuffer of `width x height` with `n_color` default
    /// (UNorm) color attachments and a depth texture cleared to `1.0`.
    pub fn new(width: u32, height: u32, n_color: usize) -> Result<Self, RasterError> {
        if n_color == 0 || n_color > MAX_COLOR_ATTACHMENTS {
            return Err(RasterError::InvalidAttachmentCount {
                requested: n_color,
                max: MAX_COLOR_ATTACHMENTS,
            });
        }

        let mut depth = Texture::new(width, height);
        depth.fill(1.0);

        Ok(Self {
            colors: (0..n_color)
                .map(|_| ColorAttachment::Unorm(Texture::new(width, height)))
                .collect(),
            depth,
            color_write: true,
        })
    }

    /// Replaces the color attachment at `slot` with a caller-provided
    /// texture, which must match this framebuffer's dimensions.
    pub fn attach_color(&mut self, slot: usize, texture: ColorAttachment) -> Result<(), RasterError> {
        if slot >= self.colors.len() {
            return Err(RasterError::SlotOutOfRange {
                slot,
                count: self.colors.len(),
            });
        }
        if texture.width() != self.width() || texture.height() != self.height() {
            return Err(RasterError::AttachmentSizeMismatch {
                width: texture.width(),
                height: texture.height(),
                expected_width: self.width(),
                expected_height: self.height(),
            });
        }
        self.colors[slot] = texture;
        Ok(())
    }

    /// Framebuffer width, shared by every attachment.
    pub fn width(&self) -> u32 {
        self.depth.width()
    }

    /// Framebuffer height, shared by every attachment.
    pub fn height(&self) -> u32 {
        self.depth.height()
    }

    /// Number of bound color attachments.
    pub fn color_attachment_count(&self) -> usize {
        self.colors.len()
    }

    /// Resets every color attachment to zero and depth to `1.0`.
    pub fn clear(&mut self) {
        for color in &mut self.colors {
            color.clear();
        }
        self.depth.fill(1.0);
    }

    /// Enables or disables writes to color attachments. Depth writes are
    /// never gated by this flag.
    pub fn set_color_write(&mut self, enabled: bool) {
        self.color_write = enabled;
    }

    /// Whether color writes are currently enabled.
    pub fn color_write(&self) -> bool {
        self.color_write
    }

    /// Current depth at `(x, y)`.
    pub fn get_depth(&self, x: u32, y: u32) -> f32 {
        self.depth.fetch_texel(x, y)
    }

    /// Writes `colors[i]` to attachment `i` (for `i` in
    /// `0..color_attachment_count()`) iff color writes are enabled, and
    /// unconditionally writes `depth`.
    ///
    /// Callers (the pipeline's early depth test) are expected to have
    /// already decided this fragment survives — `set_pixel` itself does
    /// not re-test depth; a pixel reaches here only once the depth
    /// comparison has already passed.
    pub fn set_pixel(&mut self, x: u32, y: u32, colors: &[Vec4], depth: f32) {
        if self.color_write {
            for (attachment, &color) in self.colors.iter_mut().zip(colors) {
                attachment.set_pixel(x, y, color);
            }
        }
        self.depth.set_texel(x, y, depth);
    }

    /// Raw bytes of color attachment `slot`, for the host blit path. Row
    /// major, top row first, `W*H*4` bytes for a UNorm attachment or
    /// `W*H*3*sizeof(f32)` bytes for a `Vec3` attachment.
    pub fn raw_color_buffer(&self, slot: usize) -> &[u8] {
        self.colors[slot].raw_bytes()
    }
}
