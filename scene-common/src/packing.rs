//! Half-precision packing utilities
//!
//! Every geometric value in a scene file (positions, normals, UVs, transforms,
//! bone weights, bind poses, blend-shape deltas) is stored as an IEEE 754
//! binary16 value in little-endian order:
//! - f32 → f16 rounds to the nearest representable half
//! - magnitudes above 65504 become ±infinity
//! - vectors are plain concatenations of their components, no padding
//!
//! Material parameters use a separate byte quantization over `[0, max]`.

use glam::{Vec2, Vec3};
use half::f16;

/// Size of one packed scalar in bytes
pub const HALF_SIZE: usize = 2;

/// Size of one packed 2-component vector in bytes
pub const HALF_VEC2_SIZE: usize = 2 * HALF_SIZE;

/// Size of one packed 3-component vector in bytes
pub const HALF_VEC3_SIZE: usize = 3 * HALF_SIZE;

// ============================================================================
// Bit-level conversion
// ============================================================================

/// Convert f32 to f16 bits
#[inline]
pub fn f32_to_f16(value: f32) -> u16 {
    f16::from_f32(value).to_bits()
}

/// Convert f16 bits to f32
#[inline]
pub fn f16_to_f32(bits: u16) -> f32 {
    f16::from_bits(bits).to_f32()
}

// ============================================================================
// Scalar and vector packing
// ============================================================================

/// Pack a scalar to 2 little-endian bytes
#[inline]
pub fn encode_scalar(value: f32) -> [u8; HALF_SIZE] {
    f16::from_f32(value).to_le_bytes()
}

/// Unpack a scalar from 2 little-endian bytes
#[inline]
pub fn decode_scalar(bytes: [u8; HALF_SIZE]) -> f32 {
    f16::from_le_bytes(bytes).to_f32()
}

/// Pack a 2D vector (x, y)
#[inline]
pub fn encode_vec2(v: Vec2) -> [u8; HALF_VEC2_SIZE] {
    let [x0, x1] = encode_scalar(v.x);
    let [y0, y1] = encode_scalar(v.y);
    [x0, x1, y0, y1]
}

/// Unpack a 2D vector (x, y)
#[inline]
pub fn decode_vec2(bytes: [u8; HALF_VEC2_SIZE]) -> Vec2 {
    Vec2::new(
        decode_scalar([bytes[0], bytes[1]]),
        decode_scalar([bytes[2], bytes[3]]),
    )
}

/// Pack a 3D vector (x, y, z)
#[inline]
pub fn encode_vec3(v: Vec3) -> [u8; HALF_VEC3_SIZE] {
    let [x0, x1] = encode_scalar(v.x);
    let [y0, y1] = encode_scalar(v.y);
    let [z0, z1] = encode_scalar(v.z);
    [x0, x1, y0, y1, z0, z1]
}

/// Unpack a 3D vector (x, y, z)
#[inline]
pub fn decode_vec3(bytes: [u8; HALF_VEC3_SIZE]) -> Vec3 {
    Vec3::new(
        decode_scalar([bytes[0], bytes[1]]),
        decode_scalar([bytes[2], bytes[3]]),
        decode_scalar([bytes[4], bytes[5]]),
    )
}

// ============================================================================
// Byte quantization (material parameters)
// ============================================================================

/// Quantize `value` over `[0, max]` to a byte: `round(value / max * 255)`
///
/// Out-of-range values clamp to 0 or 255. NaN maps to 0.
#[inline]
pub fn quantize_unorm8(value: f32, max: f32) -> u8 {
    ((value / max).clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Reverse [`quantize_unorm8`]: `byte / 255 * max`
#[inline]
pub fn dequantize_unorm8(value: u8, max: f32) -> f32 {
    value as f32 / 255.0 * max
}
