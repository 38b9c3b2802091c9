//! Inspection summaries of decoded models

use std::fmt::{self, Write as _};

use scene_common::{ModelKind, SceneNode, TextureEncoding};

use crate::codec::DecodedModel;

/// Model summary
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelSummary {
    /// "static" or "avatar"
    pub kind: String,
    /// Static containers only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_encoding: Option<String>,
    /// Thumbnail size as `[width, height]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<[u32; 2]>,
    /// Total node count, roots included
    pub node_count: usize,
    pub nodes: Vec<NodeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<ControllerSummary>,
}

/// One node and its subtree
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NodeSummary {
    pub name: String,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshSummary>,
    /// Shader names of the material slots
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub materials: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin: Option<SkinSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<NodeSummary>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MeshSummary {
    pub vertices: usize,
    pub triangles: usize,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SkinSummary {
    pub bones: usize,
    pub blend_shapes: usize,
    pub root_bone: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ControllerSummary {
    pub states: Vec<String>,
    pub parameters: Vec<String>,
    pub transitions: usize,
}

impl NodeSummary {
    pub fn from_node(node: &SceneNode) -> Self {
        let transform = &node.transform;
        Self {
            name: node.name.clone(),
            position: transform.position.to_array(),
            rotation: transform.rotation.to_array(),
            scale: transform.scale.to_array(),
            mesh: node.geometry.as_ref().map(|geometry| MeshSummary {
                vertices: geometry.vertex_count(),
                triangles: geometry.triangle_count(),
            }),
            materials: node
                .materials
                .iter()
                .flatten()
                .map(|material| material.kind().shader_name().to_string())
                .collect(),
            collider: node.collider.map(|collider| format!("{:?}", collider.kind)),
            skin: node.skin.as_ref().map(|skin| SkinSummary {
                bones: skin.bones.len(),
                blend_shapes: skin.blend_shapes.len(),
                root_bone: skin.root_bone.clone(),
            }),
            children: node.children.iter().map(Self::from_node).collect(),
        }
    }
}

impl ModelSummary {
    pub fn from_model(model: &DecodedModel) -> Self {
        let thumbnail = model.thumbnail().map(|image| [image.width(), image.height()]);
        match model {
            DecodedModel::Static(model) => Self {
                kind: kind_label(ModelKind::Static).into(),
                texture_encoding: Some(
                    match model.texture_encoding {
                        TextureEncoding::NoAlpha => "no_alpha",
                        TextureEncoding::SplitAlpha => "split_alpha",
                    }
                    .into(),
                ),
                thumbnail,
                node_count: model.nodes.iter().map(SceneNode::node_count).sum(),
                nodes: model.nodes.iter().map(NodeSummary::from_node).collect(),
                controller: None,
            },
            DecodedModel::Avatar(model) => Self {
                kind: kind_label(ModelKind::Avatar).into(),
                texture_encoding: None,
                thumbnail,
                node_count: model.root.node_count(),
                nodes: vec![NodeSummary::from_node(&model.root)],
                controller: Some(ControllerSummary {
                    states: model
                        .controller
                        .states
                        .iter()
                        .map(|state| state.name.clone())
                        .collect(),
                    parameters: model.controller.parameters.clone(),
                    transitions: model.controller.transitions.len(),
                }),
            },
        }
    }

    pub fn is_avatar(&self) -> bool {
        self.kind == kind_label(ModelKind::Avatar)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn kind_label(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::Static => "static",
        ModelKind::Avatar => "avatar",
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} model, {} nodes", self.kind, self.node_count)?;
        if let Some(encoding) = &self.texture_encoding {
            write!(f, ", textures {encoding}")?;
        }
        match self.thumbnail {
            Some([width, height]) => writeln!(f, ", thumbnail {width}x{height}")?,
            None => writeln!(f, ", no thumbnail")?,
        }

        let mut tree = String::new();
        for node in &self.nodes {
            render_node(&mut tree, node, 1)?;
        }
        f.write_str(&tree)?;

        if let Some(controller) = &self.controller {
            writeln!(
                f,
                "controller: states [{}], parameters [{}], {} transitions",
                controller.states.join(", "),
                controller.parameters.join(", "),
                controller.transitions
            )?;
        }
        Ok(())
    }
}

fn render_node(out: &mut String, node: &NodeSummary, depth: usize) -> fmt::Result {
    write!(out, "{:indent$}{}", "", node.name, indent = depth * 2)?;
    if let Some(mesh) = &node.mesh {
        write!(out, "  mesh {}v/{}t", mesh.vertices, mesh.triangles)?;
    }
    if !node.materials.is_empty() {
        write!(out, "  [{}]", node.materials.join(", "))?;
    }
    if let Some(collider) = &node.collider {
        write!(out, "  collider {collider}")?;
    }
    if let Some(skin) = &node.skin {
        write!(
            out,
            "  skin {} bones, {} blend shapes, root '{}'",
            skin.bones, skin.blend_shapes, skin.root_bone
        )?;
    }
    out.push('\n');
    for child in &node.children {
        render_node(out, child, depth + 1)?;
    }
    Ok(())
}
