//! Math type aliases and helper functions.
//!
//! Geometry is stored as plain `[f32; 3]` arrays so it can be copied into
//! vertex buffers with `bytemuck`; these helpers convert to `nalgebra` types
//! where actual vector math is needed.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Normal used when a primitive is degenerate.
pub const FALLBACK_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

#[inline]
pub fn vec3(v: &[f32; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

#[inline]
pub fn to_array(v: &Vec3) -> [f32; 3] {
    [v.x, v.y, v.z]
}

fn normalize_or_fallback(n: Vec3) -> [f32; 3] {
    let len = n.norm();
    if len > f32::EPSILON {
        to_array(&(n / len))
    } else {
        FALLBACK_NORMAL
    }
}

/// Unit normal of the triangle `(a, b, c)` (counter-clockwise winding).
pub fn normal_tri(a: &[f32; 3], b: &[f32; 3], c: &[f32; 3]) -> [f32; 3] {
    let n1 = vec3(a) - vec3(b);
    let n2 = vec3(b) - vec3(c);
    normalize_or_fallback(n1.cross(&n2))
}

/// Unit normal of the quad `(a, b, c, d)` from its two diagonals.
pub fn normal_quad(a: &[f32; 3], b: &[f32; 3], c: &[f32; 3], d: &[f32; 3]) -> [f32; 3] {
    let d1 = vec3(a) - vec3(c);
    let d2 = vec3(b) - vec3(d);
    normalize_or_fallback(d1.cross(&d2))
}

/// Unit normal of an arbitrary polygon using Newell's method.
pub fn normal_poly<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> [f32; 3] {
    let points: Vec<&[f32; 3]> = points.into_iter().collect();
    let Some(&last) = points.last() else {
        return FALLBACK_NORMAL;
    };

    let mut n = Vec3::zeros();
    let mut prev = last;
    for &curr in &points {
        n.x += (prev[1] - curr[1]) * (prev[2] + curr[2]);
        n.y += (prev[2] - curr[2]) * (prev[0] + curr[0]);
        n.z += (prev[0] - curr[0]) * (prev[1] + curr[1]);
        prev = curr;
    }
    normalize_or_fallback(n)
}

/// Linear interpolation between two points.
pub fn interp(a: &[f32; 3], b: &[f32; 3], t: f32) -> [f32; 3] {
    to_array(&(vec3(a) * (1.0 - t) + vec3(b) * t))
}

/// Centroid of a triangle.
pub fn centroid3(a: &[f32; 3], b: &[f32; 3], c: &[f32; 3]) -> [f32; 3] {
    to_array(&((vec3(a) + vec3(b) + vec3(c)) / 3.0))
}

/// Convert a unit float normal to the signed 16-bit encoding used in vertex buffers.
pub fn normal_float_to_short(n: &[f32; 3]) -> [i16; 3] {
    [
        (n[0] * 32767.0) as i16,
        (n[1] * 32767.0) as i16,
        (n[2] * 32767.0) as i16,
    ]
}

/// Convert a signed 16-bit normal back to floats.
pub fn normal_short_to_float(n: &[i16; 3]) -> [f32; 3] {
    [
        n[0] as f32 / 32767.0,
        n[1] as f32 / 32767.0,
        n[2] as f32 / 32767.0,
    ]
}

/// Convert a unit float normal to signed bytes.
pub fn normal_float_to_byte(n: &[f32; 3]) -> [i8; 3] {
    [
        (n[0] * 127.0) as i8,
        (n[1] * 127.0) as i8,
        (n[2] * 127.0) as i8,
    ]
}

/// Quantize a `[0, 1]` float to `u16` with rounding and clamping.
pub fn unit_float_to_u16_clamp(f: f32) -> u16 {
    if f >= 1.0 - 0.5 / 65535.0 {
        u16::MAX
    } else if f <= 0.0 {
        0
    } else {
        (f * 65535.0 + 0.5) as u16
    }
}

/// Quantize a `[0, 1]` float to `u8` with rounding and clamping.
pub fn unit_float_to_u8_clamp(f: f32) -> u8 {
    if f >= 1.0 - 0.5 / 255.0 {
        u8::MAX
    } else if f <= 0.0 {
        0
    } else {
        (f * 255.0 + 0.5) as u8
    }
}

/// Axis-aligned bounds used by the quantized position encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    /// Bounds of a point set, or `None` for an empty set.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in iter {
            for i in 0..3 {
                bounds.min[i] = bounds.min[i].min(p[i]);
                bounds.max[i] = bounds.max[i].max(p[i]);
            }
        }
        Some(bounds)
    }

    /// Matrix mapping the bounds onto the unit cube.
    ///
    /// Flat axes get a zero scale so every point lands on `0.0`.
    pub fn to_unit_matrix(&self) -> Mat4 {
        let mut m = Mat4::identity();
        for i in 0..3 {
            let extent = self.max[i] - self.min[i];
            let scale = if extent != 0.0 { 1.0 / extent } else { 0.0 };
            m[(i, i)] = scale;
            m[(i, 3)] = -self.min[i] * scale;
        }
        m
    }

    /// Matrix mapping the unit cube back onto the bounds.
    pub fn from_unit_matrix(&self) -> Mat4 {
        let mut m = Mat4::identity();
        for i in 0..3 {
            m[(i, i)] = self.max[i] - self.min[i];
            m[(i, 3)] = self.min[i];
        }
        m
    }
}
