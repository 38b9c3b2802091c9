//! Codec configuration (scene-codec.toml)

use std::path::Path;

use scene_common::TextureEncoding;
use serde::{Deserialize, Serialize};

use crate::animation::ParameterNaming;
use crate::container::WriteOptions;
use crate::codec::DEFAULT_COMPRESSION_LEVEL;
use crate::texture::{
    DEFAULT_ALPHA_QUALITY, DEFAULT_COLOR_QUALITY, PayloadFormat, SplitAlphaOptions,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("compression level {0} is out of range (0-9)")]
    CompressionLevel(u32),
    #[error("{field} quality {value} is out of range (1-100)")]
    Quality { field: &'static str, value: u8 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CodecConfig {
    #[serde(default)]
    pub texture: TextureConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureConfig {
    #[serde(default)]
    pub payload: PayloadFormat,
    #[serde(default = "default_color_quality")]
    pub color_quality: u8,
    #[serde(default = "default_alpha_quality")]
    pub alpha_quality: u8,
    /// Store a separate alpha payload for static textures
    #[serde(default = "default_true")]
    pub split_alpha: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// GZIP level, 0 (store) to 9 (best)
    #[serde(default = "default_level")]
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnimationConfig {
    #[serde(default)]
    pub parameter_naming: ParameterNaming,
}

fn default_true() -> bool {
    true
}
fn default_color_quality() -> u8 {
    DEFAULT_COLOR_QUALITY
}
fn default_alpha_quality() -> u8 {
    DEFAULT_ALPHA_QUALITY
}
fn default_level() -> u32 {
    DEFAULT_COMPRESSION_LEVEL
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            payload: PayloadFormat::default(),
            color_quality: DEFAULT_COLOR_QUALITY,
            alpha_quality: DEFAULT_ALPHA_QUALITY,
            split_alpha: true,
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl CodecConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compression.level > 9 {
            return Err(ConfigError::CompressionLevel(self.compression.level));
        }
        for (field, value) in [
            ("color", self.texture.color_quality),
            ("alpha", self.texture.alpha_quality),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Quality { field, value });
            }
        }
        Ok(())
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            textures: SplitAlphaOptions {
                format: self.texture.payload,
                color_quality: self.texture.color_quality,
                alpha_quality: self.texture.alpha_quality,
            },
            texture_encoding: if self.texture.split_alpha {
                TextureEncoding::SplitAlpha
            } else {
                TextureEncoding::NoAlpha
            },
        }
    }
}
