//! Color space conversion and the face-set overlay palette.

use std::sync::LazyLock;

use crate::math::{unit_float_to_u16_clamp, unit_float_to_u8_clamp};

/// Step between neighbouring face-set hues.
const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;

/// 8-bit sRGB to linear float lookup table.
static SRGB_TO_LINEAR: LazyLock<[f32; 256]> = LazyLock::new(|| {
    let mut table = [0.0; 256];
    for (i, value) in table.iter_mut().enumerate() {
        *value = srgb_to_linear(i as f32 / 255.0);
    }
    table
});

/// Convert one sRGB-encoded channel to linear.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        if c < 0.0 { 0.0 } else { c / 12.92 }
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Linear value of an 8-bit sRGB channel, via the lookup table.
#[inline]
pub fn srgb_byte_to_linear(c: u8) -> f32 {
    SRGB_TO_LINEAR[c as usize]
}

/// Decode an sRGB 8-bit RGBA color into normalized 16-bit linear channels.
///
/// Alpha is stored linearly and only rescaled.
pub fn srgb_bytes_to_linear_u16(c: [u8; 4]) -> [u16; 4] {
    [
        unit_float_to_u16_clamp(srgb_byte_to_linear(c[0])),
        unit_float_to_u16_clamp(srgb_byte_to_linear(c[1])),
        unit_float_to_u16_clamp(srgb_byte_to_linear(c[2])),
        unit_float_to_u16_clamp(c[3] as f32 / 255.0),
    ]
}

/// Quantize a linear float RGBA color into normalized 16-bit channels.
pub fn linear_float_to_u16(c: [f32; 4]) -> [u16; 4] {
    c.map(unit_float_to_u16_clamp)
}

/// Bob Jenkins' final mix over two integer keys.
pub fn hash_int_2d(kx: u32, ky: u32) -> u32 {
    #[inline]
    fn rot(x: u32, k: u32) -> u32 {
        x.rotate_left(k)
    }

    let init = 0xdeadbeef_u32.wrapping_add(2 << 2).wrapping_add(13);
    let mut a = init.wrapping_add(kx);
    let mut b = init.wrapping_add(ky);
    let mut c = init;

    c ^= b;
    c = c.wrapping_sub(rot(b, 14));
    a ^= c;
    a = a.wrapping_sub(rot(c, 11));
    b ^= a;
    b = b.wrapping_sub(rot(a, 25));
    c ^= b;
    c = c.wrapping_sub(rot(b, 16));
    a ^= c;
    a = a.wrapping_sub(rot(c, 4));
    b ^= a;
    b = b.wrapping_sub(rot(a, 14));
    c ^= b;
    c = c.wrapping_sub(rot(b, 24));
    c
}

/// Hash an integer into `[0, 1]`.
pub fn hash_int_01(k: u32) -> f32 {
    hash_int_2d(k, 0) as f32 * (1.0 / u32::MAX as f32)
}

/// HSV to RGB with all inputs in `[0, 1]`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let nr = ((h * 6.0 - 3.0).abs() - 1.0).clamp(0.0, 1.0);
    let ng = (2.0 - (h * 6.0 - 2.0).abs()).clamp(0.0, 1.0);
    let nb = (2.0 - (h * 6.0 - 4.0).abs()).clamp(0.0, 1.0);

    [
        ((nr - 1.0) * s + 1.0) * v,
        ((ng - 1.0) * s + 1.0) * v,
        ((nb - 1.0) * s + 1.0) * v,
    ]
}

/// Overlay color of a face set.
///
/// Negative ids (hidden face sets) share the color of their absolute value.
pub fn face_set_overlay_color(face_set: i32, seed: i32) -> [u8; 3] {
    let id = face_set.unsigned_abs();
    let seed = seed as u32;

    let hue = GOLDEN_RATIO_CONJUGATE * id.wrapping_add(seed % 10) as f32;
    let hue = hue - hue.floor();
    let sat = hash_int_01(id.wrapping_add(seed).wrapping_add(1));
    let val = hash_int_01(id.wrapping_add(seed).wrapping_add(2));

    let rgb = hsv_to_rgb(hue, 0.6 + sat * 0.25, 1.0 - val * 0.35);
    rgb.map(unit_float_to_u8_clamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_table_endpoints() {
        assert_eq!(srgb_byte_to_linear(0), 0.0);
        assert!((srgb_byte_to_linear(255) - 1.0).abs() < 1e-6);
        // Mid-grey is darker in linear space.
        assert!(srgb_byte_to_linear(128) < 0.25);
    }

    #[test]
    fn test_srgb_alpha_is_linear() {
        let c = srgb_bytes_to_linear_u16([255, 0, 128, 128]);
        assert_eq!(c[0], u16::MAX);
        assert_eq!(c[1], 0);
        assert!(c[2] < c[3]);
        assert_eq!(c[3], unit_float_to_u16_clamp(128.0 / 255.0));
    }

    #[test]
    fn test_hsv_primaries() {
        let red = hsv_to_rgb(0.0, 1.0, 1.0);
        assert_eq!(red, [1.0, 0.0, 0.0]);
        let white = hsv_to_rgb(0.3, 0.0, 1.0);
        assert_eq!(white, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_int_2d(7, 0), hash_int_2d(7, 0));
        assert_ne!(hash_int_2d(7, 0), hash_int_2d(8, 0));
        let h = hash_int_01(42);
        assert!((0.0..=1.0).contains(&h));
    }

    #[test]
    fn test_face_set_colors() {
        assert_eq!(face_set_overlay_color(3, 0), face_set_overlay_color(-3, 0));
        assert_ne!(face_set_overlay_color(3, 0), face_set_overlay_color(4, 0));
        assert_ne!(face_set_overlay_color(3, 0), face_set_overlay_color(3, 5));
    }
}
