//! Container-level tags
//!
//! # Static layout
//! ```text
//! model_kind u8 (= 0)
//! reserved u8 × 2
//! texture_encoding u8
//! texture_count u8
//!   { id i32, color_len u32, color bytes, [alpha_len u32, alpha bytes] } × texture_count
//! node_count u8
//!   node record × node_count
//!
//! node record:
//!   name str, position h3, rotation h3, scale h3
//!   component_count u8
//!     { kind u8, byte_len u32, payload } × component_count
//!   child_count u8
//!     node record × child_count
//! ```
//!
//! # Avatar layout
//! ```text
//! model_kind u8 (= 1)
//! reserved u8 × 2
//! root name str, position h3, rotation h3, scale h3
//! state_count u8
//!   { state str, clip_path str } × state_count
//! child_count u16
//!   { name str, position h3, rotation h3, scale h3, has_skin u8, [skin payload] } × child_count
//! thumbnail: color_len u32, color bytes, alpha_len u32, alpha bytes
//! ```

/// Number of reserved bytes that follow the model kind tag
pub const RESERVED_HEADER_BYTES: usize = 2;

/// Texture id reserved for the thumbnail in the static texture table.
/// Material texture references use the same value to mean "no texture".
pub const THUMBNAIL_TEXTURE_ID: i32 = 0;

/// Model kind, the first byte of every file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModelKind {
    /// Static node tree with meshes, materials and colliders
    Static = 0,
    /// Skinned character with bones, blend shapes and an animation block
    Avatar = 1,
}

impl ModelKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Static),
            1 => Some(Self::Avatar),
            _ => None,
        }
    }
}

/// How texture table entries store their pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TextureEncoding {
    /// Color payload only, alpha is opaque
    NoAlpha = 0,
    /// Color payload followed by a separate alpha payload
    #[default]
    SplitAlpha = 1,
}

impl TextureEncoding {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NoAlpha),
            1 => Some(Self::SplitAlpha),
            _ => None,
        }
    }
}

/// Component record kind inside a static node record
///
/// Only mesh, material and collider records are written. The other tags exist
/// in files produced by older exporters and are skipped by their byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ComponentKind {
    MeshFilter = 1,
    MeshRender = 2,
    ColliderHelper = 3,
    Animator = 4,
    SkinnedMeshRenderer = 5,
}

impl ComponentKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::MeshFilter),
            2 => Some(Self::MeshRender),
            3 => Some(Self::ColliderHelper),
            4 => Some(Self::Animator),
            5 => Some(Self::SkinnedMeshRenderer),
            _ => None,
        }
    }
}
