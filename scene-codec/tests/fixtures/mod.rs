//! Scene builders shared by the integration tests
//!
//! Every float used here is exactly representable as binary16, so decoded
//! transforms and geometry compare equal to the input.

#![allow(dead_code)]

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use image::{Rgba, RgbaImage};
use scene_codec::{SceneCodec, SplitAlphaOptions, WriteOptions};
use scene_common::{
    AnimationDescriptor, AnimationState, BlendShape, Bone, BoneWeight, Bounds, Color32, Geometry,
    MaterialDescriptor, MaterialParams, MaterialType, SceneNode, SkinnedMesh, TextureRef,
    Transform,
};

/// Codec writing PNG payloads so textures survive exactly
pub fn lossless_codec() -> SceneCodec {
    SceneCodec::new().with_write_options(WriteOptions {
        textures: SplitAlphaOptions::lossless(),
        ..Default::default()
    })
}

pub fn thumbnail() -> RgbaImage {
    RgbaImage::from_fn(8, 8, |x, y| {
        Rgba([(x * 30) as u8, (y * 30) as u8, 200, if x < 4 { 255 } else { 64 }])
    })
}

pub fn checker_texture() -> TextureRef {
    Arc::new(RgbaImage::from_fn(4, 4, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 128])
        }
    }))
}

pub fn transform(position: [f32; 3], rotation: [f32; 3], scale: [f32; 3]) -> Transform {
    Transform {
        position: Vec3::from_array(position),
        rotation: Vec3::from_array(rotation),
        scale: Vec3::from_array(scale),
    }
}

/// Two-triangle quad on the XZ plane
pub fn quad() -> Geometry {
    let positions = vec![
        Vec3::new(-0.5, 0.0, -0.5),
        Vec3::new(0.5, 0.0, -0.5),
        Vec3::new(0.5, 0.0, 0.5),
        Vec3::new(-0.5, 0.0, 0.5),
    ];
    Geometry {
        normals: vec![Vec3::Y; positions.len()],
        colors: vec![
            Color32::new(255, 0, 0, 255),
            Color32::new(0, 255, 0, 255),
            Color32::new(0, 0, 255, 255),
            Color32::WHITE,
        ],
        uvs: vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
        bounds: Bounds::from_points(&positions),
        positions,
    }
}

/// Geometry one vertex past the format limit
pub fn oversized_geometry() -> Geometry {
    let count = u16::MAX as usize + 1;
    Geometry {
        positions: vec![Vec3::ZERO; count],
        normals: vec![Vec3::Y; count],
        ..Default::default()
    }
}

fn params(intensity: f32, wind: f32, pulse: f32) -> MaterialParams {
    MaterialParams {
        intensity,
        wind,
        pulse,
    }
}

/// Static scene: textured floor, a swaying tree, a pulsing lamp and a
/// nested prop. The floor and the sign share one texture handle.
pub fn static_scene(texture: &TextureRef) -> SceneNode {
    let floor = SceneNode::new("floor")
        .with_transform(transform([0.0, -1.0, 0.0], [0.0, 0.0, 0.0], [4.0, 1.0, 4.0]))
        .with_geometry(quad())
        .with_materials(vec![
            MaterialDescriptor::new(MaterialType::Lit)
                .with_params(params(1.0, 0.0, 0.0))
                .with_base_color_map(Arc::clone(texture)),
        ]);

    let leaves = SceneNode::new("leaves")
        .with_transform(transform([0.0, 2.5, 0.0], [0.0, 45.0, 0.0], [1.5, 1.5, 1.5]))
        .with_geometry(quad())
        .with_materials(vec![
            MaterialDescriptor::new(MaterialType::VertexColor)
                .with_params(params(1.0, 40.0 / 255.0, 0.0)),
        ]);
    let tree = SceneNode::new("tree")
        .with_transform(transform([3.0, 0.0, -2.0], [0.0, 90.0, 0.0], [1.0, 1.0, 1.0]))
        .with_geometry(quad())
        .with_materials(vec![
            MaterialDescriptor::new(MaterialType::VertexColor).with_params(params(1.0, 0.0, 0.0)),
        ])
        .with_child(leaves);

    let lamp = SceneNode::new("lamp")
        .with_transform(transform([-2.0, 1.25, 0.5], [-90.0, 0.0, 0.0], [0.5, 0.5, 0.5]))
        .with_geometry(quad())
        .with_materials(vec![
            MaterialDescriptor::new(MaterialType::Emission).with_params(params(2.0, 0.0, 1.0)),
        ]);

    let sign = SceneNode::new("sign").with_geometry(quad()).with_materials(vec![
        MaterialDescriptor::new(MaterialType::Lit).with_base_color_map(Arc::clone(texture)),
        MaterialDescriptor {
            shader: "Foo/Bar".into(),
            params: params(0.5, 0.0, 0.0),
            ..Default::default()
        },
    ]);

    // Names are not unique
    let prop = SceneNode::new("prop")
        .with_child(SceneNode::new("prop").with_child(sign))
        .with_child(SceneNode::new("empty"));

    SceneNode::new("root")
        .with_child(floor)
        .with_child(tree)
        .with_child(lamp)
        .with_child(prop)
}

fn bone(name: &str, parent: &str, y: f32) -> Bone {
    Bone {
        name: name.into(),
        parent: parent.into(),
        transform: Transform::from_position(Vec3::new(0.0, y, 0.0)),
    }
}

/// Skin whose bone list names every child before its parent
pub fn body_skin() -> SkinnedMesh {
    let geometry = quad();
    let vertex_count = geometry.vertex_count();
    SkinnedMesh {
        bone_weights: vec![
            BoneWeight::single(0),
            BoneWeight::single(1),
            BoneWeight {
                indices: [1, 2, 0, 0],
                weights: [0.75, 0.25, 0.0, 0.0],
            },
            BoneWeight::single(3),
        ],
        bind_poses: (0..4)
            .map(|i| Mat4::from_translation(Vec3::new(0.0, -(i as f32) * 0.5, 0.0)))
            .collect(),
        bones: vec![
            bone("Head", "Neck", 0.25),
            bone("Neck", "Spine", 0.5),
            bone("Spine", "Hips", 0.5),
            bone("Hips", "Armature", 1.0),
        ],
        blend_shapes: vec![BlendShape {
            name: "Smile".into(),
            delta_positions: vec![Vec3::new(0.0, 0.125, 0.0); vertex_count],
            delta_normals: vec![Vec3::ZERO; vertex_count],
            // Shorter than the vertex count, padded with zeros on write
            delta_tangents: vec![Vec3::X],
        }],
        root_bone: "Hips".into(),
        mesh_name: "BodyMesh".into(),
        geometry,
    }
}

/// Skin sharing part of the body's bones and adding its own
pub fn hat_skin() -> SkinnedMesh {
    let geometry = quad();
    SkinnedMesh {
        bone_weights: vec![BoneWeight::single(0); geometry.vertex_count()],
        bind_poses: vec![Mat4::IDENTITY; 2],
        bones: vec![bone("HatTip", "Head", 0.25), bone("Head", "Neck", 0.25)],
        root_bone: "Head".into(),
        mesh_name: "HatMesh".into(),
        geometry,
        ..Default::default()
    }
}

pub fn avatar_scene() -> SceneNode {
    SceneNode {
        animation: Some(AnimationDescriptor {
            states: vec![
                AnimationState::new("Idle", "Assets/Anim/Idle.anim"),
                AnimationState::new("Run", "Assets/Anim/Run.anim"),
                AnimationState::new("Jump", "Assets/Anim/Jump.anim"),
            ],
        }),
        ..SceneNode::new("Avatar")
            .with_transform(transform([0.0, 0.0, 2.0], [0.0, 180.0, 0.0], [1.0, 1.0, 1.0]))
            .with_child(SceneNode::new("Body").with_skin(body_skin()))
            .with_child(SceneNode::new("Hat").with_skin(hat_skin()))
            .with_child(SceneNode::new("Armature"))
    }
}

/// Names of every node under `root`, root included, in walk order
pub fn node_names(root: &SceneNode) -> Vec<String> {
    let mut names = Vec::new();
    root.walk(&mut |node| names.push(node.name.clone()));
    names
}
