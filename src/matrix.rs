// matrix.rs - 4x4 变换矩阵

#[cfg(test)]
#[path = "matrix_test.rs"]
mod matrix_test;

use glam::{Mat4, Vec3, Vec4};

/// A 4x4 matrix addressed as `m[row * 4 + col]`.
///
/// The 16 floats are uploaded to the GPU verbatim, where the shader reads them
/// column-major. Every builder post-multiplies (`self × op`), so a chain such as
/// `identity().rotate_y(a).scale(s)` applies the rotation first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    m: [f32; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub const fn from_array(m: [f32; 16]) -> Self {
        Self { m }
    }

    pub fn as_array(&self) -> &[f32; 16] {
        &self.m
    }

    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.m[row * 4 + col]
    }

    /// Returns a copy with one element replaced.
    #[must_use]
    pub fn with(mut self, row: usize, col: usize, value: f32) -> Self {
        self.m[row * 4 + col] = value;
        self
    }

    #[must_use]
    pub fn concat(&self, n: &Self) -> Self {
        let mut o = [0.0f32; 16];
        for (i, out) in o.iter_mut().enumerate() {
            let (row, col) = (i / 4, i % 4);
            *out = (0..4).map(|j| self.m[row * 4 + j] * n.m[col + j * 4]).sum();
        }
        Self { m: o }
    }

    #[must_use]
    pub fn translate_x(&self, t: f32) -> Self {
        self.concat(&Self::IDENTITY.with(0, 3, t))
    }

    #[must_use]
    pub fn translate_y(&self, t: f32) -> Self {
        self.concat(&Self::IDENTITY.with(1, 3, t))
    }

    #[must_use]
    pub fn translate_z(&self, t: f32) -> Self {
        self.concat(&Self::IDENTITY.with(2, 3, t))
    }

    #[must_use]
    pub fn translate(&self, t: Vec3) -> Self {
        self.translate_x(t.x).translate_y(t.y).translate_z(t.z)
    }

    #[must_use]
    pub fn scale(&self, s: Vec3) -> Self {
        self.concat(&Self::from_array([
            s.x, 0.0, 0.0, 0.0, //
            0.0, s.y, 0.0, 0.0, //
            0.0, 0.0, s.z, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]))
    }

    #[must_use]
    pub fn scale_uniform(&self, s: f32) -> Self {
        self.scale(Vec3::splat(s))
    }

    #[must_use]
    pub fn rotate_x(&self, r: f32) -> Self {
        let (s, c) = r.sin_cos();
        self.concat(&Self::from_array([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, -s, 0.0, //
            0.0, s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]))
    }

    #[must_use]
    pub fn rotate_y(&self, r: f32) -> Self {
        let (s, c) = r.sin_cos();
        self.concat(&Self::from_array([
            c, 0.0, s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            -s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]))
    }

    #[must_use]
    pub fn rotate_z(&self, r: f32) -> Self {
        let (s, c) = r.sin_cos();
        self.concat(&Self::from_array([
            c, -s, 0.0, 0.0, //
            s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]))
    }

    /// The matrix as the shader sees it.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array(&self.m)
    }

    /// Applies the matrix to a point exactly as the vertex shader does.
    pub fn project(&self, p: Vec3) -> Vec4 {
        self.to_mat4() * p.extend(1.0)
    }
}
