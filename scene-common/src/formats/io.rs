//! Binary read/write primitives
//!
//! Writers append to a `Vec<u8>`; [`ByteReader`] walks a borrowed slice and
//! reports the offset of every failure. Strings use a 7-bit variable-length
//! byte count (LEB128, at most 5 bytes) followed by UTF-8 bytes.

use glam::{Vec2, Vec3};

use crate::error::FormatError;
use crate::packing::{
    HALF_SIZE, HALF_VEC2_SIZE, HALF_VEC3_SIZE, decode_scalar, decode_vec2, decode_vec3,
    encode_scalar, encode_vec2, encode_vec3,
};
use crate::scene::Transform;

/// Longest valid 7-bit length prefix (32-bit value)
const MAX_LENGTH_PREFIX_BYTES: usize = 5;

// ============================================================================
// Writing
// ============================================================================

pub fn write_u8(output: &mut Vec<u8>, value: u8) {
    output.push(value);
}

pub fn write_u16(output: &mut Vec<u8>, value: u16) {
    output.extend_from_slice(&value.to_le_bytes());
}

pub fn write_u32(output: &mut Vec<u8>, value: u32) {
    output.extend_from_slice(&value.to_le_bytes());
}

pub fn write_i32(output: &mut Vec<u8>, value: i32) {
    output.extend_from_slice(&value.to_le_bytes());
}

pub fn write_half(output: &mut Vec<u8>, value: f32) {
    output.extend_from_slice(&encode_scalar(value));
}

pub fn write_vec2(output: &mut Vec<u8>, value: Vec2) {
    output.extend_from_slice(&encode_vec2(value));
}

pub fn write_vec3(output: &mut Vec<u8>, value: Vec3) {
    output.extend_from_slice(&encode_vec3(value));
}

/// Write position, Euler rotation and scale
pub fn write_transform(output: &mut Vec<u8>, transform: &Transform) {
    write_vec3(output, transform.position);
    write_vec3(output, transform.rotation);
    write_vec3(output, transform.scale);
}

/// Write a 7-bit encoded length (low groups first, high bit = more bytes)
pub fn write_length_prefix(output: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        output.push((value as u8) | 0x80);
        value >>= 7;
    }
    output.push(value as u8);
}

/// Write a length-prefixed UTF-8 string
pub fn write_string(output: &mut Vec<u8>, value: &str) {
    write_length_prefix(output, value.len() as u32);
    output.extend_from_slice(value.as_bytes());
}

/// Write a `u32` byte length followed by the bytes
pub fn write_blob(output: &mut Vec<u8>, bytes: &[u8]) {
    write_u32(output, bytes.len() as u32);
    output.extend_from_slice(bytes);
}

/// Write a block preceded by its `u32` byte length.
///
/// The length is patched in after `body` returns, so the body can be written
/// straight into `output`.
pub fn write_sized_block<E>(
    output: &mut Vec<u8>,
    body: impl FnOnce(&mut Vec<u8>) -> Result<(), E>,
) -> Result<(), E> {
    let length_at = output.len();
    write_u32(output, 0);
    body(output)?;
    let length = (output.len() - length_at - 4) as u32;
    output[length_at..length_at + 4].copy_from_slice(&length.to_le_bytes());
    Ok(())
}

// ============================================================================
// Reading
// ============================================================================

/// Forward-only reader over a borrowed byte slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
    /// Offset of `data[0]` in the outermost stream, for error reporting
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            base: 0,
        }
    }

    /// Offset of the next byte in the outermost stream
    pub fn offset(&self) -> usize {
        self.base + self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        if len > self.remaining() {
            return Err(FormatError::UnexpectedEof {
                offset: self.offset(),
                needed: len,
            });
        }
        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), FormatError> {
        self.read_bytes(len).map(|_| ())
    }

    /// Split off the next `len` bytes as an independent reader
    pub fn sub_reader(&mut self, len: usize) -> Result<ByteReader<'a>, FormatError> {
        let base = self.offset();
        let data = self.read_bytes(len)?;
        Ok(ByteReader {
            data,
            position: 0,
            base,
        })
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, FormatError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_half(&mut self) -> Result<f32, FormatError> {
        Ok(decode_scalar(self.read_array::<HALF_SIZE>()?))
    }

    pub fn read_vec2(&mut self) -> Result<Vec2, FormatError> {
        Ok(decode_vec2(self.read_array::<HALF_VEC2_SIZE>()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3, FormatError> {
        Ok(decode_vec3(self.read_array::<HALF_VEC3_SIZE>()?))
    }

    pub fn read_transform(&mut self) -> Result<Transform, FormatError> {
        Ok(Transform {
            position: self.read_vec3()?,
            rotation: self.read_vec3()?,
            scale: self.read_vec3()?,
        })
    }

    pub fn read_length_prefix(&mut self) -> Result<usize, FormatError> {
        let offset = self.offset();
        let mut value: u32 = 0;
        for i in 0..MAX_LENGTH_PREFIX_BYTES {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as u32) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value as usize);
            }
        }
        Err(FormatError::InvalidLengthPrefix { offset })
    }

    pub fn read_string(&mut self) -> Result<String, FormatError> {
        let len = self.read_length_prefix()?;
        let offset = self.offset();
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| FormatError::InvalidString { offset })
    }

    /// Read a `u32` byte length followed by that many bytes
    pub fn read_blob(&mut self) -> Result<&'a [u8], FormatError> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }
}
