//! scene-codec library
//!
//! Encodes scene graphs into compressed static and avatar containers and
//! rebuilds them on load. The `scene-codec` binary uses it to inspect and
//! repack files.
//!
//! # Modules
//!
//! - [`codec`] - GZIP framing and the [`SceneCodec`] entry points
//! - [`container`] - Header, texture table and recursive node records
//! - [`geometry`], [`skeleton`], [`material`] - Component payloads
//! - [`bones`] - Bone hierarchy reconstruction for avatars
//! - [`animation`] - Animation block and controller synthesis
//! - [`texture`] - Image payloads with a separate alpha plane
//! - [`config`] - `scene-codec.toml` settings
//! - [`summary`] - Inspection summaries

pub mod animation;
pub mod bones;
pub mod codec;
pub mod config;
pub mod container;
pub mod geometry;
pub mod material;
pub mod skeleton;
pub mod summary;
pub mod texture;

pub use animation::{AnimatorController, ClipResolver, FileStemClipResolver, ParameterNaming};
pub use codec::{DecodedModel, SceneCodec};
pub use config::{CodecConfig, ConfigError};
pub use container::{AvatarModel, StaticModel, WriteOptions};
pub use material::{DefaultMaterialRegistry, MaterialRegistry};
pub use summary::ModelSummary;
pub use texture::{PayloadFormat, SplitAlphaOptions};

// Re-export the shared format crate for hosts that only depend on the codec
pub use scene_common;
