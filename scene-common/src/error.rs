//! Error types for scene encoding and decoding

/// A scene file that cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Stream ended in the middle of a record
    #[error("unexpected end of data at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    /// String length prefix longer than 5 bytes
    #[error("invalid string length prefix at offset {offset}")]
    InvalidLengthPrefix { offset: usize },

    /// String bytes are not UTF-8
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidString { offset: usize },

    #[error("unknown model kind {0}")]
    UnknownModelKind(u8),

    #[error("unknown texture encoding {0}")]
    UnknownTextureEncoding(u8),

    /// File holds a different model kind than the caller asked for
    #[error("expected a {expected} model, found {found}")]
    UnexpectedModelKind {
        expected: &'static str,
        found: &'static str,
    },

    /// Bone parent never appeared anywhere in the avatar
    #[error("bone '{bone}' references missing parent '{parent}'")]
    DanglingBone { bone: String, parent: String },

    /// Skinned mesh root bone never appeared anywhere in the avatar
    #[error("skinned mesh '{node}' references missing root bone '{root_bone}'")]
    DanglingRootBone { node: String, root_bone: String },

    #[error("bone '{0}' appears more than once in one skeleton")]
    DuplicateBone(String),

    /// Attaching the bone to its parent would make it its own ancestor
    #[error("bone '{bone}' cannot be parented under '{parent}' (cycle)")]
    BoneCycle { bone: String, parent: String },

    /// Color and alpha payloads of one texture differ in size
    #[error(
        "alpha payload is {alpha_width}x{alpha_height}, \
         color payload is {color_width}x{color_height}"
    )]
    AlphaMismatch {
        color_width: u32,
        color_height: u32,
        alpha_width: u32,
        alpha_height: u32,
    },

    /// Compressed image payload could not be decoded
    #[error("invalid image payload: {0}")]
    InvalidImage(String),

    #[error("texture id {0} appears twice in the texture table")]
    DuplicateTextureId(i32),

    /// Component body read past its declared length
    #[error("component {kind} overruns its declared length {declared}")]
    ComponentOverrun { kind: u8, declared: u32 },

    /// Outer GZIP stream is corrupt
    #[error("decompression failed: {0}")]
    Compression(String),

    #[error("node tree nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Any failure surfaced by an encode or decode call
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image compression failed while encoding
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    /// Scene graph violates an encoder precondition
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_messages() {
        let err = FormatError::UnexpectedEof {
            offset: 12,
            needed: 4,
        };
        assert_eq!(
            err.to_string(),
            "unexpected end of data at offset 12 (needed 4 more bytes)"
        );

        let err = FormatError::DanglingBone {
            bone: "Hand_L".into(),
            parent: "Arm_L".into(),
        };
        assert!(err.to_string().contains("Arm_L"));
    }

    #[test]
    fn test_codec_error_wraps_format_error() {
        let err: CodecError = FormatError::UnknownModelKind(9).into();
        assert!(matches!(
            err,
            CodecError::Format(FormatError::UnknownModelKind(9))
        ));
        assert_eq!(err.to_string(), "unknown model kind 9");
    }
}
