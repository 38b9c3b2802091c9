//! Shared types and utilities for the scene container format
//!
//! This crate provides the format-level pieces shared between:
//! - `scene-codec` (encoder/decoder and the inspection tool)
//! - host editors that build or consume [`SceneNode`] trees
//!
//! # Modules
//!
//! - [`packing`] - Half-precision packing utilities (f32 ↔ f16, unorm8 quantization)
//! - [`formats`] - Wire tags, layout constants and binary read/write primitives
//! - [`scene`] - In-memory scene graph (nodes, geometry, skins, materials)
//! - [`error`] - Format and codec error types

pub mod error;
pub mod formats;
pub mod packing;
pub mod scene;

pub use error::{CodecError, FormatError};

// Re-export commonly used packing items
pub use packing::{
    HALF_SIZE, HALF_VEC2_SIZE, HALF_VEC3_SIZE, decode_scalar, decode_vec2, decode_vec3,
    dequantize_unorm8, encode_scalar, encode_vec2, encode_vec3, f16_to_f32, f32_to_f16,
    quantize_unorm8,
};

// Re-export commonly used format items
pub use formats::{
    BIND_POSE_COMPONENTS, BONE_INFLUENCES, ByteReader, COLLIDER_PAYLOAD_SIZE, ColliderKind,
    ComponentKind, INTENSITY_MAX, MATERIAL_PARAM_COUNT, MAX_VERTEX_COUNT, MaterialType, ModelKind,
    PULSE_MAX, SHADER_TABLE, THUMBNAIL_TEXTURE_ID, TextureEncoding, WIND_MAX,
};

// Re-export the scene graph
pub use scene::{
    AnimationDescriptor, AnimationState, BlendShape, Bone, BoneWeight, Bounds, Collider, Color32,
    Geometry, MaterialBinding, MaterialDescriptor, MaterialParams, MaterialSet, SceneNode,
    SkinnedMesh, SurfaceMaterial, TextureRef, Transform,
};
