use core::ops::Mul;

use bytemuck::{Pod, Zeroable};

/// Column-major 4x4 matrix with fixed-function (`glTranslatef`/`glRotatef`) semantics.
///
/// Element `(row, col)` lives at index `col * 4 + row`, so the layout can be
/// uploaded to a shader uniform as-is.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mtx([f32; 16]);

impl Mtx {
    /// Builds a matrix from its sixteen elements, one column per line.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        m00: f32, m01: f32, m02: f32, m03: f32,
        m10: f32, m11: f32, m12: f32, m13: f32,
        m20: f32, m21: f32, m22: f32, m23: f32,
        m30: f32, m31: f32, m32: f32, m33: f32,
    ) -> Self {
        Self([
            m00, m01, m02, m03,
            m10, m11, m12, m13,
            m20, m21, m22, m23,
            m30, m31, m32, m33,
        ])
    }

    pub const IDENTITY: Self = Self::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0);

    pub const fn from_cols_array(m: [f32; 16]) -> Self {
        Self(m)
    }

    pub const fn to_cols_array(self) -> [f32; 16] {
        self.0
    }

    /// Returns element `(row, col)`.
    #[inline]
    pub const fn get(&self, row: usize, col: usize) -> f32 {
        self.0[col * 4 + row]
    }

    pub const fn translation(x: f32, y: f32, z: f32) -> Self {
        Self::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
              x,   y,   z, 1.0)
    }

    pub const fn scaled(x: f32, y: f32, z: f32) -> Self {
        Self::new(
              x, 0.0, 0.0, 0.0,
            0.0,   y, 0.0, 0.0,
            0.0, 0.0,   z, 0.0,
            0.0, 0.0, 0.0, 1.0)
    }

    /// Pure rotation of `angle` degrees about `(x, y, z)`.
    pub fn rotation(angle: f32, x: f32, y: f32, z: f32) -> Self {
        let r = gl_rotation(angle, x, y, z);
        Self::new(
            r[0], r[1], r[2], 0.0,
            r[3], r[4], r[5], 0.0,
            r[6], r[7], r[8], 0.0,
             0.0,  0.0,  0.0, 1.0)
    }

    /// Right-handed perspective projection targeting wgpu clip space.
    ///
    /// Eye space looks down -Z; the near plane maps to depth 0 and the far
    /// plane to depth 1.
    pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Self {
        let h = 1.0 / (fovy.to_radians() * 0.5).tan();
        let w = h / aspect;
        let inv_clip_range = 1.0 / (far - near);
        let zh = -far * inv_clip_range;
        let zl = -(far * near) * inv_clip_range;

        /*
          [w  0  0  0]
          [0  h  0  0]
          [0  0 zh zl]
          [0  0 -1  0]
        */
        Self::new(
              w, 0.0, 0.0,  0.0,
            0.0,   h, 0.0,  0.0,
            0.0, 0.0,  zh, -1.0,
            0.0, 0.0,  zl,  0.0)
    }

    /// `self = self * T(x, y, z)`, i.e. translate in the current local frame.
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        let m = self.0;
        self.0[12] += x * m[0] + y * m[4] + z * m[8];
        self.0[13] += x * m[1] + y * m[5] + z * m[9];
        self.0[14] += x * m[2] + y * m[6] + z * m[10];
        self.0[15] += x * m[3] + y * m[7] + z * m[11];
    }

    /// `self = self * R(angle, axis)`, i.e. rotate in the current local frame.
    pub fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) {
        let r = gl_rotation(angle, x, y, z);

        // Only the upper three columns change.
        let mut t = [0f32; 12];
        t.copy_from_slice(&self.0[..12]);
        for col in 0..3 {
            let (a, b, c) = (r[col * 3], r[col * 3 + 1], r[col * 3 + 2]);
            for row in 0..4 {
                self.0[col * 4 + row] = a * t[row] + b * t[4 + row] + c * t[8 + row];
            }
        }
    }

    /// `self = self * S(x, y, z)`.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        for row in 0..4 {
            self.0[row] *= x;
            self.0[4 + row] *= y;
            self.0[8 + row] *= z;
        }
    }

    /// Transforms a homogeneous column vector.
    pub fn transform(&self, v: [f32; 4]) -> [f32; 4] {
        core::array::from_fn(|row| (0..4).map(|col| self.get(row, col) * v[col]).sum())
    }
}

impl Default for Mtx {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mtx {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(core::array::from_fn(|i| {
            let (row, col) = (i & 0x3, i >> 2);
            (0..4).fold(0f32, |a, j| a + self.0[j * 4 + row] * rhs.0[col * 4 + j])
        }))
    }
}

/// Rodrigues rotation, returned as a column-major 3x3.
fn make_rotation(c: f32, s: f32, x: f32, y: f32, z: f32) -> [f32; 9] {
    let rc = 1.0 - c;
    let (rcx, rcy, rcz) = (x * rc, y * rc, z * rc);
    let (sx, sy, sz) = (x * s, y * s, z * s);

    [
        rcx * x + c,  rcy * x + sz, rcz * x - sy,
        rcx * y - sz, rcy * y + c,  rcz * y + sx,
        rcx * z + sy, rcy * z - sx, rcz * z + c,
    ]
}

/// Degrees and a possibly non-unit axis, as `glRotatef` accepts them.
fn gl_rotation(angle: f32, x: f32, y: f32, z: f32) -> [f32; 9] {
    let theta = angle.to_radians();
    let mag = (x * x + y * y + z * z).sqrt();
    let (x, y, z) = if (mag - 1.0).abs() > f32::EPSILON && mag > 0.0 {
        (x / mag, y / mag, z / mag)
    } else {
        (x, y, z)
    };
    make_rotation(theta.cos(), theta.sin(), x, y, z)
}
