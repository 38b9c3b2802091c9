//! In-memory scene graph
//!
//! A scene is an owned tree of [`SceneNode`]s. Nodes carry no identifiers:
//! every cross reference (bone parents, root bones) is by name, and textures
//! are shared through [`TextureRef`] handles.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use image::RgbaImage;

use crate::formats::{BONE_INFLUENCES, ColliderKind, MaterialType};

/// Shared handle to a decoded texture
///
/// Two materials that hold clones of the same handle share one texture table
/// entry when encoded.
pub type TextureRef = Arc<RgbaImage>;

// ============================================================================
// Transforms and small value types
// ============================================================================

/// Local transform: position, Euler rotation in degrees, scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 8-bit RGBA vertex color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color32 {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Axis-aligned bounds stored alongside every mesh
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub center: Vec3,
    pub size: Vec3,
}

impl Bounds {
    /// Smallest box enclosing `points` (zero box when empty)
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (min, max) = points
            .iter()
            .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
        Self {
            center: (min + max) * 0.5,
            size: max - min,
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Static mesh arrays
///
/// `positions` and `normals` are parallel. `colors` and `uvs` have their own
/// lengths and are preserved as-is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<Color32>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u16>,
    pub bounds: Bounds,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// ============================================================================
// Skinning
// ============================================================================

/// Four bone influences for one vertex
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoneWeight {
    pub indices: [u16; BONE_INFLUENCES],
    pub weights: [f32; BONE_INFLUENCES],
}

impl BoneWeight {
    /// Full weight on a single bone
    pub fn single(bone: u16) -> Self {
        Self {
            indices: [bone, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// One entry of a skeleton's bone list; `parent` is a node name
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: String,
    pub transform: Transform,
}

/// Per-vertex morph deltas
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlendShape {
    pub name: String,
    pub delta_positions: Vec<Vec3>,
    pub delta_normals: Vec<Vec3>,
    pub delta_tangents: Vec<Vec3>,
}

/// Skinned mesh attached to an avatar child
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkinnedMesh {
    pub geometry: Geometry,
    pub bone_weights: Vec<BoneWeight>,
    /// Inverse bind matrices, one per bone
    pub bind_poses: Vec<Mat4>,
    pub bones: Vec<Bone>,
    pub blend_shapes: Vec<BlendShape>,
    /// Name of the node the skin is rooted at
    pub root_bone: String,
    pub mesh_name: String,
}

// ============================================================================
// Materials
// ============================================================================

/// Quantized surface parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaterialParams {
    /// Range `[0, 2]`
    pub intensity: f32,
    /// Range `[0, 1]`
    pub wind: f32,
    /// Range `[0, 1]`
    pub pulse: f32,
}

/// Host-side material instance handed out by a material registry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceMaterial {
    pub kind: MaterialType,
    pub params: MaterialParams,
    pub base_color_map: Option<TextureRef>,
    pub normal_map: Option<TextureRef>,
}

/// How a decoded material was bound to the host
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialBinding {
    /// The registry's default for this type, shared by every user
    Shared(Arc<SurfaceMaterial>),
    /// A private copy carrying this node's parameters and textures
    Instance(Arc<SurfaceMaterial>),
}

impl MaterialBinding {
    pub fn material(&self) -> &SurfaceMaterial {
        match self {
            Self::Shared(material) | Self::Instance(material) => material,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }
}

/// One material slot of a mesh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialDescriptor {
    /// Shader name; unrecognized names are stored as Lit
    pub shader: String,
    pub base_color_map: Option<TextureRef>,
    pub normal_map: Option<TextureRef>,
    pub params: MaterialParams,
    /// Filled in by the decoder, ignored by the encoder
    pub binding: Option<MaterialBinding>,
}

impl MaterialDescriptor {
    pub fn new(kind: MaterialType) -> Self {
        Self {
            shader: kind.shader_name().to_string(),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: MaterialParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_base_color_map(mut self, texture: TextureRef) -> Self {
        self.base_color_map = Some(texture);
        self
    }

    pub fn with_normal_map(mut self, texture: TextureRef) -> Self {
        self.normal_map = Some(texture);
        self
    }

    /// Stored material type for this shader
    pub fn kind(&self) -> MaterialType {
        MaterialType::from_shader_name(&self.shader).unwrap_or_default()
    }
}

/// Ordered material slots of one mesh
pub type MaterialSet = Vec<MaterialDescriptor>;

// ============================================================================
// Colliders and animation
// ============================================================================

/// Collision shape with two shape-dependent parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Collider {
    pub kind: ColliderKind,
    pub param1: Vec3,
    pub param2: Vec3,
}

/// One animator state and the clip it plays
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimationState {
    pub name: String,
    pub clip_path: String,
}

impl AnimationState {
    pub fn new(name: impl Into<String>, clip_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clip_path: clip_path.into(),
        }
    }
}

/// Ordered animator states; the first one is the entry state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimationDescriptor {
    pub states: Vec<AnimationState>,
}

// ============================================================================
// Nodes
// ============================================================================

/// A named node in the scene tree
///
/// Names need not be unique. Children are owned exclusively.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub children: Vec<SceneNode>,
    pub geometry: Option<Geometry>,
    pub materials: Option<MaterialSet>,
    pub collider: Option<Collider>,
    pub skin: Option<SkinnedMesh>,
    /// Only meaningful on an avatar root
    pub animation: Option<AnimationDescriptor>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_materials(mut self, materials: MaterialSet) -> Self {
        self.materials = Some(materials);
        self
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn with_skin(mut self, skin: SkinnedMesh) -> Self {
        self.skin = Some(skin);
        self
    }

    pub fn with_animation(mut self, animation: AnimationDescriptor) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Depth-first search (self first) for the first node called `name`
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Visit this node and every descendant, parents before children
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SceneNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn test_bounds_from_points() {
        let bounds = Bounds::from_points(&[
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(3.0, 4.0, 2.0),
            Vec3::new(1.0, 2.0, 0.0),
        ]);
        assert_eq!(bounds.center, Vec3::new(1.0, 2.0, 1.0));
        assert_eq!(bounds.size, Vec3::new(4.0, 4.0, 2.0));
        assert_eq!(Bounds::from_points(&[]), Bounds::default());
    }

    #[test]
    fn test_material_kind_from_shader() {
        assert_eq!(
            MaterialDescriptor::new(MaterialType::Glass).kind(),
            MaterialType::Glass
        );
        let custom = MaterialDescriptor {
            shader: "Foo/Bar".into(),
            ..Default::default()
        };
        assert_eq!(custom.kind(), MaterialType::Lit);
    }

    #[test]
    fn test_find_and_walk() {
        let root = SceneNode::new("root")
            .with_child(SceneNode::new("a").with_child(SceneNode::new("c")))
            .with_child(SceneNode::new("b"));

        assert_eq!(root.find("c").map(|n| n.name.as_str()), Some("c"));
        assert!(root.find("missing").is_none());
        assert_eq!(root.node_count(), 4);

        let mut order = Vec::new();
        root.walk(&mut |node| order.push(node.name.as_str()));
        assert_eq!(order, ["root", "a", "c", "b"]);
    }
}
