//! `SceneCodec` - compressed scene files in and out
//!
//! Every file is a GZIP stream wrapping a static or avatar container. The
//! codec owns the host collaborators (material registry, clip resolver) and
//! the write settings; each call keeps its own working state, so one codec
//! can serve several threads.

use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use image::RgbaImage;
use scene_common::{CodecError, FormatError, ModelKind, SceneNode};
use tracing::{debug, info};

use crate::animation::{ClipResolver, FileStemClipResolver, ParameterNaming};
use crate::config::CodecConfig;
use crate::container::{
    self, AvatarModel, DecodeContext, StaticModel, WriteOptions, model_kind,
};
use crate::material::{DefaultMaterialRegistry, MaterialRegistry};

/// GZIP level used when nothing else is configured
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Either container, as found in a file
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedModel {
    Static(StaticModel),
    Avatar(AvatarModel),
}

impl DecodedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Static(_) => ModelKind::Static,
            Self::Avatar(_) => ModelKind::Avatar,
        }
    }

    pub fn thumbnail(&self) -> Option<&RgbaImage> {
        match self {
            Self::Static(model) => model.thumbnail.as_ref(),
            Self::Avatar(model) => Some(&model.thumbnail),
        }
    }
}

pub struct SceneCodec {
    registry: Arc<dyn MaterialRegistry>,
    resolver: Arc<dyn ClipResolver>,
    write_options: WriteOptions,
    compression: Compression,
    naming: ParameterNaming,
}

impl Default for SceneCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SceneCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneCodec")
            .field("write_options", &self.write_options)
            .field("compression", &self.compression.level())
            .field("naming", &self.naming)
            .finish_non_exhaustive()
    }
}

impl SceneCodec {
    /// Codec with the default registry, file-stem clip resolver and settings
    pub fn new() -> Self {
        Self {
            registry: Arc::new(DefaultMaterialRegistry::default()),
            resolver: Arc::new(FileStemClipResolver),
            write_options: WriteOptions::default(),
            compression: Compression::new(DEFAULT_COMPRESSION_LEVEL),
            naming: ParameterNaming::default(),
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new()
            .with_write_options(config.write_options())
            .with_compression_level(config.compression.level)
            .with_naming(config.animation.parameter_naming)
    }

    pub fn with_registry(mut self, registry: Arc<dyn MaterialRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ClipResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_write_options(mut self, options: WriteOptions) -> Self {
        self.write_options = options;
        self
    }

    /// GZIP level, clamped to 0-9
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression = Compression::new(level.min(9));
        self
    }

    pub fn with_naming(mut self, naming: ParameterNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn registry(&self) -> &dyn MaterialRegistry {
        self.registry.as_ref()
    }

    pub fn write_options(&self) -> &WriteOptions {
        &self.write_options
    }

    fn context(&self) -> DecodeContext<'_> {
        DecodeContext {
            registry: self.registry.as_ref(),
            resolver: self.resolver.as_ref(),
            naming: self.naming,
        }
    }

    // ------------------------------------------------------------------------
    // Encode
    // ------------------------------------------------------------------------

    /// Encode the children of `root` as a static container
    pub fn encode_static(
        &self,
        root: &SceneNode,
        thumbnail: Option<&RgbaImage>,
    ) -> Result<Vec<u8>, CodecError> {
        let mut output = Vec::new();
        self.write_static(&mut output, root, thumbnail)?;
        Ok(output)
    }

    /// Encode `root` and its skinned children as an avatar container
    pub fn encode_avatar(
        &self,
        root: &SceneNode,
        thumbnail: &RgbaImage,
    ) -> Result<Vec<u8>, CodecError> {
        let mut output = Vec::new();
        self.write_avatar(&mut output, root, thumbnail)?;
        Ok(output)
    }

    pub fn write_static<W: Write>(
        &self,
        writer: W,
        root: &SceneNode,
        thumbnail: Option<&RgbaImage>,
    ) -> Result<(), CodecError> {
        let mut raw = Vec::new();
        container::write_static(&mut raw, root, thumbnail, &self.write_options)?;
        info!(
            "Encoded static model '{}' ({} top-level nodes, {} bytes before compression)",
            root.name,
            root.children.len(),
            raw.len()
        );
        self.deflate(writer, &raw)
    }

    pub fn write_avatar<W: Write>(
        &self,
        writer: W,
        root: &SceneNode,
        thumbnail: &RgbaImage,
    ) -> Result<(), CodecError> {
        let mut raw = Vec::new();
        container::write_avatar(&mut raw, root, thumbnail, &self.write_options)?;
        info!(
            "Encoded avatar '{}' ({} children, {} bytes before compression)",
            root.name,
            root.children.len(),
            raw.len()
        );
        self.deflate(writer, &raw)
    }

    fn deflate<W: Write>(&self, writer: W, raw: &[u8]) -> Result<(), CodecError> {
        let mut encoder = GzEncoder::new(writer, self.compression);
        encoder.write_all(raw)?;
        encoder.finish()?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Decode
    // ------------------------------------------------------------------------

    pub fn decode_static(&self, data: &[u8]) -> Result<StaticModel, FormatError> {
        let raw = inflate(data)?;
        container::read_static(&raw, &self.context())
    }

    pub fn decode_avatar(&self, data: &[u8]) -> Result<AvatarModel, FormatError> {
        let raw = inflate(data)?;
        container::read_avatar(&raw, &self.context())
    }

    /// Decode whichever container the file holds
    pub fn decode_any(&self, data: &[u8]) -> Result<DecodedModel, FormatError> {
        let raw = inflate(data)?;
        let context = self.context();
        match model_kind(&raw)? {
            ModelKind::Static => container::read_static(&raw, &context).map(DecodedModel::Static),
            ModelKind::Avatar => container::read_avatar(&raw, &context).map(DecodedModel::Avatar),
        }
    }

    /// Read a whole file from `reader` and decode it
    pub fn read_any<R: Read>(&self, mut reader: R) -> Result<DecodedModel, CodecError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(self.decode_any(&data)?)
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, FormatError> {
    let mut raw = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut raw)
        .map_err(|e| FormatError::Compression(e.to_string()))?;
    debug!("Inflated {} bytes to {}", data.len(), raw.len());
    Ok(raw)
}
