//! Geometry block encoding (MeshFilter payload)
//!
//! The vertex arrays, color, uv, index and bounds helpers here are shared with
//! the skin payload, which interleaves skeleton data between them.

use glam::Vec3;
use scene_common::formats::io::{write_u8, write_u16, write_u32, write_vec2, write_vec3};
use scene_common::{
    Bounds, ByteReader, CodecError, Color32, FormatError, Geometry, MAX_VERTEX_COUNT,
};
use tracing::warn;

/// Whether `geometry` fits the 16-bit vertex count of the format
pub fn fits(geometry: &Geometry) -> bool {
    geometry.vertex_count() <= MAX_VERTEX_COUNT
}

/// Write a geometry payload.
///
/// The caller checks [`fits`] first; oversized geometry is rejected here.
pub fn write_geometry(output: &mut Vec<u8>, geometry: &Geometry) -> Result<(), CodecError> {
    write_vertices(output, geometry)?;
    write_colors(output, &geometry.colors);
    write_uvs(output, geometry);
    write_indices(output, &geometry.indices);
    write_bounds(output, &geometry.bounds);
    Ok(())
}

/// Read a geometry payload
pub fn read_geometry(reader: &mut ByteReader<'_>) -> Result<Geometry, FormatError> {
    let (positions, normals) = read_vertices(reader)?;
    let colors = read_colors(reader)?;
    let uvs = read_uvs(reader)?;
    let indices = read_indices(reader)?;
    let bounds = read_bounds(reader)?;
    Ok(Geometry {
        positions,
        normals,
        colors,
        uvs,
        indices,
        bounds,
    })
}

// ============================================================================
// Shared array helpers
// ============================================================================

/// `u16 vertex_count`, positions, normals
pub(crate) fn write_vertices(output: &mut Vec<u8>, geometry: &Geometry) -> Result<(), CodecError> {
    let count = geometry.vertex_count();
    if count > MAX_VERTEX_COUNT {
        return Err(CodecError::InvalidInput(format!(
            "{count} vertices exceed the format limit of {MAX_VERTEX_COUNT}"
        )));
    }
    if geometry.normals.len() != count {
        return Err(CodecError::InvalidInput(format!(
            "{} normals for {count} vertices",
            geometry.normals.len()
        )));
    }

    write_u16(output, count as u16);
    for position in &geometry.positions {
        write_vec3(output, *position);
    }
    for normal in &geometry.normals {
        write_vec3(output, *normal);
    }
    Ok(())
}

pub(crate) fn read_vertices(
    reader: &mut ByteReader<'_>,
) -> Result<(Vec<Vec3>, Vec<Vec3>), FormatError> {
    let count = reader.read_u16()? as usize;
    let positions = read_vec3_array(reader, count)?;
    let normals = read_vec3_array(reader, count)?;
    Ok((positions, normals))
}

pub(crate) fn read_vec3_array(
    reader: &mut ByteReader<'_>,
    count: usize,
) -> Result<Vec<Vec3>, FormatError> {
    (0..count).map(|_| reader.read_vec3()).collect()
}

/// Clamp an array length to a `u16` count field
pub(crate) fn u16_count(len: usize, what: &str) -> u16 {
    if len > u16::MAX as usize {
        warn!("{len} {what} exceed the u16 count field, writing the first {}", u16::MAX);
        u16::MAX
    } else {
        len as u16
    }
}

pub(crate) fn write_colors(output: &mut Vec<u8>, colors: &[Color32]) {
    let count = u16_count(colors.len(), "colors");
    write_u16(output, count);
    for color in &colors[..count as usize] {
        for channel in color.to_array() {
            write_u8(output, channel);
        }
    }
}

pub(crate) fn read_colors(reader: &mut ByteReader<'_>) -> Result<Vec<Color32>, FormatError> {
    let count = reader.read_u16()? as usize;
    (0..count)
        .map(|_| {
            let bytes = reader.read_bytes(4)?;
            Ok(Color32::new(bytes[0], bytes[1], bytes[2], bytes[3]))
        })
        .collect()
}

pub(crate) fn write_uvs(output: &mut Vec<u8>, geometry: &Geometry) {
    let count = u16_count(geometry.uvs.len(), "uvs");
    write_u16(output, count);
    for uv in &geometry.uvs[..count as usize] {
        write_vec2(output, *uv);
    }
}

pub(crate) fn read_uvs(reader: &mut ByteReader<'_>) -> Result<Vec<glam::Vec2>, FormatError> {
    let count = reader.read_u16()? as usize;
    (0..count).map(|_| reader.read_vec2()).collect()
}

pub(crate) fn write_indices(output: &mut Vec<u8>, indices: &[u16]) {
    write_u32(output, indices.len() as u32);
    for index in indices {
        write_u16(output, *index);
    }
}

pub(crate) fn read_indices(reader: &mut ByteReader<'_>) -> Result<Vec<u16>, FormatError> {
    let count = reader.read_u32()? as usize;
    // Each index is 2 bytes; bail before allocating for a corrupt count
    if count > reader.remaining() / 2 {
        return Err(FormatError::UnexpectedEof {
            offset: reader.offset(),
            needed: count * 2,
        });
    }
    (0..count).map(|_| reader.read_u16()).collect()
}

pub(crate) fn write_bounds(output: &mut Vec<u8>, bounds: &Bounds) {
    write_vec3(output, bounds.center);
    write_vec3(output, bounds.size);
}

pub(crate) fn read_bounds(reader: &mut ByteReader<'_>) -> Result<Bounds, FormatError> {
    Ok(Bounds {
        center: reader.read_vec3()?,
        size: reader.read_vec3()?,
    })
}
