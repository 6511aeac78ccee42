//! Low-level libraries: the rasterization pipeline and ambient logging.

pub mod graphics;
pub mod logger;
