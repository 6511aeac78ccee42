//! The CPU rasterization pipeline and its supporting types.

pub mod arena;
pub mod framebuffer;
pub mod pipeline;
pub mod shader;
pub mod texture;
pub mod vertex;
