//! Collider descriptor (ColliderHelper component payload)
//!
//! # Layout
//! ```text
//! 0x00: collider_kind u8
//! 0x01: param1 h3
//! 0x07: param2 h3
//! ```

/// Payload size of a collider component in bytes
pub const COLLIDER_PAYLOAD_SIZE: u32 = 13;

/// Collision shape attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ColliderKind {
    #[default]
    None = 0,
    Box = 1,
    Sphere = 2,
    Capsule = 3,
    Mesh = 4,
}

impl ColliderKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Box),
            2 => Some(Self::Sphere),
            3 => Some(Self::Capsule),
            4 => Some(Self::Mesh),
            _ => None,
        }
    }
}
