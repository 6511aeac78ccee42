//! FFI-safe mathematical types for the rasterizer.
//!
//! This module provides `#[repr(C)]` vector and matrix types with a stable,
//! predictable memory layout — the pipeline casts raw vertex-buffer bytes
//! into these types, so their layout is part of the crate's contract, not
//! an implementation detail.
//!
//! # Design Decision
//!
//! We wrap `cgmath` rather than replacing it because:
//! 1. **Internal Operations**: cgmath provides battle-tested matrix/vector
//!    operations that would be error-prone to reimplement from scratch.
//! 2. **Layout Control**: cgmath's own types don't guarantee the specific
//!    memory layout the pipeline's byte-addressed vertex/attribute storage
//!    depends on.
//! 3. **Spec-exact semantics**: `Mat4`'s builders (`create_persp_proj_matrix`,
//!    `create_view_matrix`) follow this renderer's exact conventions
//!    (column-vectors, right-handed, `w = -z_view`), which don't match any
//!    single cgmath constructor — so they're hand-written here and merely
//!    convert to/from cgmath at the boundary.
//!
//! # Usage
//!
//! ```rust
//! use goud_raster::core::math::{Vec3, Vec4, Mat4, Deg};
//!
//! let position = Vec3::new(1.0, 2.0, 3.0);
//! let model = Mat4::translate(position) * Mat4::rotate_y(Deg(45.0).to_radians());
//! let clip: Vec4 = model * Vec4::from_vec3(position, 1.0);
//! ```

use std::ops::{Add, Div, Index, IndexMut, Mul, Neg, Sub};

// =============================================================================
// Vec2 - 2D Vector (FFI-Safe)
// =============================================================================

/// A 2D vector with FFI-safe memory layout.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec2 {
    /// The x-component of the vector.
    pub x: f32,
    /// The y-component of the vector.
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2 from x and y components.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the zero vector (0, 0).
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Computes the dot product of two vectors.
    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Returns the length (magnitude) of the vector.
    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;
    #[inline]
    fn div(self, scalar: f32) -> Self {
        Self::new(self.x / scalar, self.y / scalar)
    }
}

impl Index<usize> for Vec2 {
    type Output = f32;
    #[inline]
    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            _ => panic!("Vec2 index out of range: {i}"),
        }
    }
}

// =============================================================================
// Vec3 - 3D Vector (FFI-Safe)
// =============================================================================

/// A 3D vector with FFI-safe memory layout.
///
/// Used for object-space/view-space positions and directions, and for the
/// `r`/`g`/`b` channels of an unpacked color when `w`/`a` isn't needed.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec3 {
    /// The x-component of the vector.
    pub x: f32,
    /// The y-component of the vector.
    pub y: f32,
    /// The z-component of the vector.
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3 from x, y, z components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns the zero vector (0, 0, 0).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Red channel alias for `x`.
    #[inline]
    pub const fn r(self) -> f32 {
        self.x
    }

    /// Green channel alias for `y`.
    #[inline]
    pub const fn g(self) -> f32 {
        self.y
    }

    /// Blue channel alias for `z`.
    #[inline]
    pub const fn b(self) -> f32 {
        self.z
    }

    /// Computes the dot product of two vectors.
    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Computes the cross product of two vectors (right-hand rule).
    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Returns the length (magnitude) of the vector.
    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Returns a normalized (unit length) version of this vector.
    ///
    /// Returns the zero vector if `self` has zero length.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::zero()
        } else {
            self / len
        }
    }

    /// Reflects `self` about the normal `n` (assumed normalized).
    #[inline]
    pub fn reflect(self, n: Self) -> Self {
        self - n * n.dot(self) * 2.0
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Mul<Vec3> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;
    #[inline]
    fn div(self, scalar: f32) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Index<usize> for Vec3 {
    type Output = f32;
    #[inline]
    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of range: {i}"),
        }
    }
}

// A plain 3-float struct with no padding; safe to reinterpret as bytes for
// the host blit path (`FrameBuffer::raw_color_buffer` on a Vec3 attachment).
unsafe impl bytemuck::Pod for Vec3 {}
unsafe impl bytemuck::Zeroable for Vec3 {}

impl From<cgmath::Vector3<f32>> for Vec3 {
    #[inline]
    fn from(v: cgmath::Vector3<f32>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for cgmath::Vector3<f32> {
    #[inline]
    fn from(v: Vec3) -> Self {
        cgmath::Vector3::new(v.x, v.y, v.z)
    }
}

// =============================================================================
// Vec4 - 4D Vector (FFI-Safe)
// =============================================================================

/// A 4D vector with FFI-safe memory layout.
///
/// Used for homogeneous clip-space coordinates (`x,y,z,w`) and RGBA color
/// (`r,g,b,a`) — both views alias the same four fields.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec4 {
    /// The x-component of the vector (or red channel).
    pub x: f32,
    /// The y-component of the vector (or green channel).
    pub y: f32,
    /// The z-component of the vector (or blue channel).
    pub z: f32,
    /// The w-component of the vector (or alpha channel).
    pub w: f32,
}

impl Vec4 {
    /// Creates a new Vec4 from x, y, z, w components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Returns the zero vector (0, 0, 0, 0).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Creates a Vec4 from a Vec3 and a w component.
    #[inline]
    pub const fn from_vec3(v: Vec3, w: f32) -> Self {
        Self::new(v.x, v.y, v.z, w)
    }

    /// Returns the xyz components as a Vec3.
    #[inline]
    pub const fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Red channel alias for `x`.
    #[inline]
    pub const fn r(self) -> f32 {
        self.x
    }

    /// Green channel alias for `y`.
    #[inline]
    pub const fn g(self) -> f32 {
        self.y
    }

    /// Blue channel alias for `z`.
    #[inline]
    pub const fn b(self) -> f32 {
        self.z
    }

    /// Alpha channel alias for `w`.
    #[inline]
    pub const fn a(self) -> f32 {
        self.w
    }

    /// Component-wise clamp to `[lo, hi]`.
    #[inline]
    pub fn clamp(self, lo: f32, hi: f32) -> Self {
        Self::new(
            self.x.clamp(lo, hi),
            self.y.clamp(lo, hi),
            self.z.clamp(lo, hi),
            self.w.clamp(lo, hi),
        )
    }
}

impl Add for Vec4 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
            self.w + other.w,
        )
    }
}

impl Sub for Vec4 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(
            self.x - other.x,
            self.y - other.y,
            self.z - other.z,
            self.w - other.w,
        )
    }
}

impl Mul<f32> for Vec4 {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self::new(
            self.x * scalar,
            self.y * scalar,
            self.z * scalar,
            self.w * scalar,
        )
    }
}

impl Div<f32> for Vec4 {
    type Output = Self;
    #[inline]
    fn div(self, scalar: f32) -> Self {
        Self::new(
            self.x / scalar,
            self.y / scalar,
            self.z / scalar,
            self.w / scalar,
        )
    }
}

impl Index<usize> for Vec4 {
    type Output = f32;
    #[inline]
    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            3 => &self.w,
            _ => panic!("Vec4 index out of range: {i}"),
        }
    }
}

impl From<cgmath::Vector4<f32>> for Vec4 {
    #[inline]
    fn from(v: cgmath::Vector4<f32>) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

impl From<Vec4> for cgmath::Vector4<f32> {
    #[inline]
    fn from(v: Vec4) -> Self {
        cgmath::Vector4::new(v.x, v.y, v.z, v.w)
    }
}

// =============================================================================
// Deg - degree literal helper
// =============================================================================

/// A value in degrees, convertible to radians.
///
/// A newtype rather than a literal suffix (e.g. `180.0_deg`), since Rust
/// has no stable user-defined literal operators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Deg(pub f32);

impl Deg {
    /// Converts degrees to radians.
    #[inline]
    pub fn to_radians(self) -> f32 {
        self.0 * (std::f32::consts::PI / 180.0)
    }
}

// =============================================================================
// Mat4 - 4x4 Matrix (column-vector convention)
// =============================================================================

/// A 4x4 matrix stored as four column vectors, matching column-vector
/// convention: `m * v` transforms `v`.
///
/// Memory layout is `[col0, col1, col2, col3]`, each a `Vec4` — the layout
/// OpenGL/cgmath expect, so `Mat4` converts losslessly to/from
/// `cgmath::Matrix4<f32>`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    /// The four columns of the matrix.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// Builds a matrix from four explicit columns.
    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// The identity matrix.
    #[inline]
    pub fn identity() -> Self {
        Self::diagonal(1.0)
    }

    /// A diagonal matrix with `d` on the diagonal.
    #[inline]
    pub fn diagonal(d: f32) -> Self {
        Self::from_cols(
            Vec4::new(d, 0.0, 0.0, 0.0),
            Vec4::new(0.0, d, 0.0, 0.0),
            Vec4::new(0.0, 0.0, d, 0.0),
            Vec4::new(0.0, 0.0, 0.0, d),
        )
    }

    /// Builds a translation matrix.
    #[inline]
    pub fn translate(v: Vec3) -> Self {
        let mut m = Self::identity();
        m.cols[3] = Vec4::new(v.x, v.y, v.z, 1.0);
        m
    }

    /// Builds a non-uniform scale matrix.
    #[inline]
    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        Self::from_cols(
            Vec4::new(x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, z, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// Builds a rotation matrix about the X axis. `angle` is in radians.
    pub fn rotate_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols(
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, c, s, 0.0),
            Vec4::new(0.0, -s, c, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// Builds a rotation matrix about the Y axis. `angle` is in radians.
    pub fn rotate_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols(
            Vec4::new(c, 0.0, -s, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(s, 0.0, c, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// Builds a rotation matrix about the Z axis. `angle` is in radians.
    pub fn rotate_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols(
            Vec4::new(c, s, 0.0, 0.0),
            Vec4::new(-s, c, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// Builds a right-handed perspective projection matrix with -Z forward.
    ///
    /// Produces homogeneous clip coordinates where `w = -z_view`, so that
    /// dividing by `w` after the view transform yields standard NDC. `fovy`
    /// and the implied vertical field of view are in radians.
    pub fn create_persp_proj_matrix(fovy: f32, aspect: f32, znear: f32, zfar: f32) -> Self {
        let f = 1.0 / (fovy / 2.0).tan();
        let nf = 1.0 / (znear - zfar);
        Self::from_cols(
            Vec4::new(f / aspect, 0.0, 0.0, 0.0),
            Vec4::new(0.0, f, 0.0, 0.0),
            Vec4::new(0.0, 0.0, (zfar + znear) * nf, -1.0),
            Vec4::new(0.0, 0.0, 2.0 * zfar * znear * nf, 0.0),
        )
    }

    /// Builds a right-handed look-at view matrix.
    pub fn create_view_matrix(pos: Vec3, target: Vec3, up: Vec3) -> Self {
        let f = (target - pos).normalize();
        let s = f.cross(up).normalize();
        let u = s.cross(f);

        Self::from_cols(
            Vec4::new(s.x, u.x, -f.x, 0.0),
            Vec4::new(s.y, u.y, -f.y, 0.0),
            Vec4::new(s.z, u.z, -f.z, 0.0),
            Vec4::new(-s.dot(pos), -u.dot(pos), f.dot(pos), 1.0),
        )
    }

    /// Matrix-matrix multiplication.
    pub fn mat_mul(self, other: Self) -> Self {
        let mut cols = [Vec4::zero(); 4];
        for c in 0..4 {
            for r in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.cols[k][r] * other.cols[c][k];
                }
                cols[c][r] = sum;
            }
        }
        Self { cols }
    }

    /// Matrix-vector multiplication (column-vector convention).
    pub fn mul_vec4(self, v: Vec4) -> Vec4 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z + self.cols[3] * v.w
    }
}

impl IndexMut<usize> for Vec4 {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            3 => &mut self.w,
            _ => panic!("Vec4 index out of range: {i}"),
        }
    }
}

impl Mul for Mat4 {
    type Output = Self;
    #[inline]
    fn mul(self, other: Self) -> Self {
        self.mat_mul(other)
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, v: Vec4) -> Vec4 {
        self.mul_vec4(v)
    }
}

impl From<cgmath::Matrix4<f32>> for Mat4 {
    #[inline]
    fn from(m: cgmath::Matrix4<f32>) -> Self {
        Self::from_cols(m.x.into(), m.y.into(), m.z.into(), m.w.into())
    }
}

impl From<Mat4> for cgmath::Matrix4<f32> {
    #[inline]
    fn from(m: Mat4) -> Self {
        cgmath::Matrix4::from_cols(
            cgmath::Vector4::new(m.cols[0].x, m.cols[0].y, m.cols[0].z, m.cols[0].w),
            cgmath::Vector4::new(m.cols[1].x, m.cols[1].y, m.cols[1].z, m.cols[1].w),
            cgmath::Vector4::new(m.cols[2].x, m.cols[2].y, m.cols[2].z, m.cols[2].w),
            cgmath::Vector4::new(m.cols[3].x, m.cols[3].y, m.cols[3].z, m.cols[3].w),
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
