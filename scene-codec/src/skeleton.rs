//! Skin payload encoding: skinned geometry, bone weights, bind poses, the bone
//! list and blend shapes.
//!
//! Bones are stored by name with their parent's name. Turning those names back
//! into a node hierarchy is the job of [`crate::bones`].

use glam::{Mat4, Vec3};
use hashbrown::HashSet;
use scene_common::formats::io::{
    write_half, write_string, write_transform, write_u16, write_vec3,
};
use scene_common::{
    BIND_POSE_COMPONENTS, BlendShape, Bone, BoneWeight, ByteReader, CodecError, FormatError,
    Geometry, MAX_VERTEX_COUNT, SkinnedMesh,
};

use crate::geometry::{
    read_bounds, read_colors, read_indices, read_uvs, read_vec3_array, read_vertices,
    write_bounds, write_colors, write_indices, write_uvs, write_vertices,
};

/// A skin payload as read from a file
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSkin {
    /// Node name recorded inside the payload
    pub node_name: String,
    pub skin: SkinnedMesh,
}

/// Check every count field of the skin payload.
///
/// Returns a description of the first overflowing array.
pub fn check_capacity(skin: &SkinnedMesh) -> Result<(), String> {
    let limit = MAX_VERTEX_COUNT;
    let counts = [
        ("vertices", skin.geometry.vertex_count()),
        ("colors", skin.geometry.colors.len()),
        ("uvs", skin.geometry.uvs.len()),
        ("bone weights", skin.bone_weights.len()),
        ("bind poses", skin.bind_poses.len()),
        ("bones", skin.bones.len()),
        ("blend shapes", skin.blend_shapes.len()),
    ];
    match counts.iter().find(|(_, count)| *count > limit) {
        Some((what, count)) => Err(format!("{count} {what} exceed the limit of {limit}")),
        None => Ok(()),
    }
}

/// Reject bone lists that name the same bone twice
fn check_unique_bones(bones: &[Bone]) -> Result<(), String> {
    let mut seen = HashSet::with_capacity(bones.len());
    for bone in bones {
        if !seen.insert(bone.name.as_str()) {
            return Err(bone.name.clone());
        }
    }
    Ok(())
}

/// Write a skin payload for the node called `node_name`
pub fn write_skin(
    output: &mut Vec<u8>,
    node_name: &str,
    skin: &SkinnedMesh,
) -> Result<(), CodecError> {
    check_capacity(skin).map_err(CodecError::InvalidInput)?;
    check_unique_bones(&skin.bones).map_err(|name| {
        CodecError::InvalidInput(format!("bone '{name}' appears twice in skin of '{node_name}'"))
    })?;

    let geometry = &skin.geometry;
    write_vertices(output, geometry)?;
    write_colors(output, &geometry.colors);

    write_u16(output, skin.bone_weights.len() as u16);
    for weight in &skin.bone_weights {
        for index in weight.indices {
            write_u16(output, index);
        }
        for value in weight.weights {
            write_half(output, value);
        }
    }

    // Row-major: m00 m01 m02 m03 m10 ...
    write_u16(output, skin.bind_poses.len() as u16);
    for pose in &skin.bind_poses {
        for row in 0..4 {
            for value in pose.row(row).to_array() {
                write_half(output, value);
            }
        }
    }

    write_u16(output, skin.bones.len() as u16);
    for bone in &skin.bones {
        write_string(output, &bone.name);
        write_string(output, &bone.parent);
        write_transform(output, &bone.transform);
    }

    write_blend_shapes(output, geometry.vertex_count(), &skin.blend_shapes);

    write_uvs(output, geometry);
    write_indices(output, &geometry.indices);
    write_bounds(output, &geometry.bounds);

    write_string(output, node_name);
    write_string(output, &skin.root_bone);
    write_string(output, &skin.mesh_name);
    Ok(())
}

/// Every delta array is written with exactly `vertex_count` entries
fn write_blend_shapes(output: &mut Vec<u8>, vertex_count: usize, shapes: &[BlendShape]) {
    write_u16(output, shapes.len() as u16);
    write_u16(output, vertex_count as u16);
    for shape in shapes {
        write_string(output, &shape.name);
        for deltas in [
            &shape.delta_positions,
            &shape.delta_normals,
            &shape.delta_tangents,
        ] {
            for i in 0..vertex_count {
                write_vec3(output, deltas.get(i).copied().unwrap_or(Vec3::ZERO));
            }
        }
    }
}

/// Read a skin payload
pub fn read_skin(reader: &mut ByteReader<'_>) -> Result<DecodedSkin, FormatError> {
    let (positions, normals) = read_vertices(reader)?;
    let colors = read_colors(reader)?;

    let weight_count = reader.read_u16()? as usize;
    let mut bone_weights = Vec::with_capacity(weight_count);
    for _ in 0..weight_count {
        let mut weight = BoneWeight::default();
        for index in &mut weight.indices {
            *index = reader.read_u16()?;
        }
        for value in &mut weight.weights {
            *value = reader.read_half()?;
        }
        bone_weights.push(weight);
    }

    let pose_count = reader.read_u16()? as usize;
    let mut bind_poses = Vec::with_capacity(pose_count);
    for _ in 0..pose_count {
        let mut rows = [0.0f32; BIND_POSE_COMPONENTS];
        for value in &mut rows {
            *value = reader.read_half()?;
        }
        bind_poses.push(Mat4::from_cols_array(&rows).transpose());
    }

    let bone_count = reader.read_u16()? as usize;
    let mut bones = Vec::with_capacity(bone_count);
    let mut seen = HashSet::with_capacity(bone_count);
    for _ in 0..bone_count {
        let name = reader.read_string()?;
        let parent = reader.read_string()?;
        let transform = reader.read_transform()?;
        if !seen.insert(name.clone()) {
            return Err(FormatError::DuplicateBone(name));
        }
        bones.push(Bone {
            name,
            parent,
            transform,
        });
    }

    let blend_shapes = read_blend_shapes(reader)?;

    let uvs = read_uvs(reader)?;
    let indices = read_indices(reader)?;
    let bounds = read_bounds(reader)?;

    let node_name = reader.read_string()?;
    let root_bone = reader.read_string()?;
    let mesh_name = reader.read_string()?;

    Ok(DecodedSkin {
        node_name,
        skin: SkinnedMesh {
            geometry: Geometry {
                positions,
                normals,
                colors,
                uvs,
                indices,
                bounds,
            },
            bone_weights,
            bind_poses,
            bones,
            blend_shapes,
            root_bone,
            mesh_name,
        },
    })
}

/// Delta arrays are sized by the declared shape length, not the live vertex count
fn read_blend_shapes(reader: &mut ByteReader<'_>) -> Result<Vec<BlendShape>, FormatError> {
    let shape_count = reader.read_u16()? as usize;
    let shape_len = reader.read_u16()? as usize;
    let mut shapes = Vec::with_capacity(shape_count);
    for _ in 0..shape_count {
        let name = reader.read_string()?;
        shapes.push(BlendShape {
            name,
            delta_positions: read_vec3_array(reader, shape_len)?,
            delta_normals: read_vec3_array(reader, shape_len)?,
            delta_tangents: read_vec3_array(reader, shape_len)?,
        });
    }
    Ok(shapes)
}
