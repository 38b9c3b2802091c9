//! Geometry and skin payload limits
//!
//! # Geometry layout (MeshFilter component payload)
//! ```text
//! vertex_count u16
//! positions h3 × vertex_count
//! normals h3 × vertex_count
//! color_count u16
//! colors [r g b a] × color_count
//! uv_count u16
//! uvs h2 × uv_count
//! index_count u32
//! indices u16 × index_count
//! bounds_center h3
//! bounds_size h3
//! ```
//!
//! # Skin layout (avatar child with has_skin = 1)
//! ```text
//! vertex_count u16, positions, normals
//! color_count u16, colors
//! weight_count u16
//!   { bone_index u16 × 4, weight h × 4 } × weight_count
//! bind_pose_count u16
//!   { m00 m01 m02 m03 m10 … m33 as h } × bind_pose_count
//! bone_count u16
//!   { name str, parent str, position h3, rotation h3, scale h3 } × bone_count
//! blend_shape_count u16
//! shape_vertex_len u16
//!   { name str, delta_positions h3 × len, delta_normals h3 × len, delta_tangents h3 × len }
//! uv_count u16, uvs
//! index_count u32, indices
//! bounds_center h3, bounds_size h3
//! node_name str, root_bone str, mesh_name str
//! ```

/// Largest vertex count a geometry block can carry (indices are 16-bit)
pub const MAX_VERTEX_COUNT: usize = u16::MAX as usize;

/// Bone influences per vertex
pub const BONE_INFLUENCES: usize = 4;

/// Components per bind pose matrix
pub const BIND_POSE_COMPONENTS: usize = 16;
