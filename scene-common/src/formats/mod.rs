//! Scene container wire format
//!
//! A scene file is a single GZIP stream. Inside it, every record is written in
//! a fixed order with no magic bytes and no padding; the meaning of each byte
//! depends on the offset left by the previous record, so a file can only be
//! read front to back.
//!
//! ```text
//! 0x00: model_kind u8   (0 = static, 1 = avatar)
//! 0x01: reserved u8 × 2
//! 0x03: kind-specific payload
//! ```
//!
//! Integers are little-endian. Strings use the length-prefixed layout of
//! [`io::write_string`]. Floats are IEEE binary16 (see [`crate::packing`]).

pub mod collider;
pub mod container;
pub mod io;
pub mod material;
pub mod mesh;

pub use collider::*;
pub use container::*;
pub use io::ByteReader;
pub use material::*;
pub use mesh::*;
