//! Node-tree walker for the static and avatar containers
//!
//! Operates on the inflated byte stream; compression is handled by
//! [`crate::codec`]. Encoding walks the scene depth-first, parents before
//! children. Decoding is a single forward pass that returns a complete tree or
//! an error, never a partial tree.
//!
//! Count fields narrower than the data (`u8` node, texture and material
//! counts, `u16` avatar children) are truncated with a warning so the count
//! written always matches the records that follow.

use std::sync::Arc;

use hashbrown::HashMap;
use image::RgbaImage;
use scene_common::formats::RESERVED_HEADER_BYTES;
use scene_common::formats::io::{
    write_blob, write_i32, write_sized_block, write_string, write_transform, write_u8, write_u16,
    write_u32, write_vec3,
};
use scene_common::{
    AnimationDescriptor, ByteReader, COLLIDER_PAYLOAD_SIZE, CodecError, Collider, ColliderKind,
    ComponentKind, FormatError, Geometry, MaterialBinding, MaterialDescriptor, MaterialType,
    ModelKind, SceneNode, THUMBNAIL_TEXTURE_ID, TextureEncoding, TextureRef,
};
use tracing::{debug, warn};

use crate::animation::{
    AnimatorController, ClipResolver, ParameterNaming, read_animation, synthesize_controller,
    write_animation,
};
use crate::bones::BoneGroup;
use crate::geometry::{self, read_geometry, write_geometry};
use crate::material::{MaterialRegistry, read_materials, write_materials};
use crate::skeleton::{check_capacity, read_skin, write_skin};
use crate::texture::{SplitAlphaOptions, compress_opaque, decode_opaque, join_alpha, split_alpha};

/// Deepest node nesting accepted on encode and decode
pub const MAX_NESTING_DEPTH: usize = 1024;

/// Most entries a static texture table can hold (`u8` count, thumbnail included)
pub const MAX_TEXTURES: usize = u8::MAX as usize;

// ============================================================================
// Models and options
// ============================================================================

/// Decoded static container
#[derive(Debug, Clone, PartialEq)]
pub struct StaticModel {
    /// Top-level nodes, in file order
    pub nodes: Vec<SceneNode>,
    pub thumbnail: Option<RgbaImage>,
    pub texture_encoding: TextureEncoding,
}

impl StaticModel {
    /// Wrap the top-level nodes under a new root called `name`
    pub fn into_root(self, name: &str) -> SceneNode {
        SceneNode {
            children: self.nodes,
            ..SceneNode::new(name)
        }
    }
}

/// Decoded avatar container
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarModel {
    /// Avatar root with its children and every reconstructed bone
    pub root: SceneNode,
    pub thumbnail: RgbaImage,
    pub controller: AnimatorController,
}

/// Encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    pub textures: SplitAlphaOptions,
    /// Static containers only; avatar thumbnails always keep alpha
    pub texture_encoding: TextureEncoding,
}

/// Host collaborators used while decoding
#[derive(Clone, Copy)]
pub struct DecodeContext<'a> {
    pub registry: &'a dyn MaterialRegistry,
    pub resolver: &'a dyn ClipResolver,
    pub naming: ParameterNaming,
}

// ============================================================================
// Texture table
// ============================================================================

/// Encode-side texture table: one id per distinct texture handle
///
/// Handles are compared by identity, so two equal images held in different
/// `Arc`s get two entries. Id 0 is kept for the thumbnail.
#[derive(Debug, Clone)]
pub struct TextureTable {
    entries: Vec<(i32, TextureRef)>,
    ids: HashMap<usize, i32>,
    limit: usize,
}

impl Default for TextureTable {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TextureTable {
    pub fn new(has_thumbnail: bool) -> Self {
        Self {
            entries: Vec::new(),
            ids: HashMap::new(),
            limit: MAX_TEXTURES - usize::from(has_thumbnail),
        }
    }

    /// Collect every texture of the nodes that will be written under `root`
    pub fn collect(root: &SceneNode, has_thumbnail: bool) -> Self {
        let mut table = Self::new(has_thumbnail);
        for node in written(&root.children, u8::MAX as usize) {
            table.collect_node(node);
        }
        table
    }

    fn collect_node(&mut self, node: &SceneNode) {
        for material in node.materials.iter().flatten().take(u8::MAX as usize) {
            self.collect_material(material);
        }
        for child in written(&node.children, u8::MAX as usize) {
            self.collect_node(child);
        }
    }

    pub fn collect_material(&mut self, material: &MaterialDescriptor) {
        for texture in [&material.base_color_map, &material.normal_map]
            .into_iter()
            .flatten()
        {
            self.insert(texture);
        }
    }

    fn insert(&mut self, texture: &TextureRef) {
        let key = Arc::as_ptr(texture) as usize;
        if self.ids.contains_key(&key) {
            return;
        }
        if self.entries.len() >= self.limit {
            warn!("Texture table is full ({} entries), dropping texture", self.limit);
            return;
        }
        let id = self.entries.len() as i32 + 1;
        self.ids.insert(key, id);
        self.entries.push((id, Arc::clone(texture)));
    }

    pub fn id_of(&self, texture: &TextureRef) -> Option<i32> {
        self.ids.get(&(Arc::as_ptr(texture) as usize)).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (i32, &TextureRef)> {
        self.entries.iter().map(|(id, texture)| (*id, texture))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The prefix of `nodes` that fits a count field of width `limit`
fn written(nodes: &[SceneNode], limit: usize) -> &[SceneNode] {
    &nodes[..nodes.len().min(limit)]
}

fn truncated_count(len: usize, limit: usize, what: &str, owner: &str) -> usize {
    if len > limit {
        warn!("'{owner}' has {len} {what}, writing the first {limit}");
        limit
    } else {
        len
    }
}

fn write_header(output: &mut Vec<u8>, kind: ModelKind) {
    write_u8(output, kind as u8);
    for _ in 0..RESERVED_HEADER_BYTES {
        write_u8(output, 0);
    }
}

fn read_header(reader: &mut ByteReader<'_>) -> Result<ModelKind, FormatError> {
    let tag = reader.read_u8()?;
    let kind = ModelKind::from_u8(tag).ok_or(FormatError::UnknownModelKind(tag))?;
    reader.skip(RESERVED_HEADER_BYTES)?;
    Ok(kind)
}

fn expect_kind(found: ModelKind, expected: ModelKind) -> Result<(), FormatError> {
    if found == expected {
        return Ok(());
    }
    let label = |kind: ModelKind| match kind {
        ModelKind::Static => "static",
        ModelKind::Avatar => "avatar",
    };
    Err(FormatError::UnexpectedModelKind {
        expected: label(expected),
        found: label(found),
    })
}

/// Peek the model kind of an inflated stream
pub fn model_kind(data: &[u8]) -> Result<ModelKind, FormatError> {
    read_header(&mut ByteReader::new(data))
}

// ============================================================================
// Static container
// ============================================================================

/// Write a static container for the children of `root`
pub fn write_static(
    output: &mut Vec<u8>,
    root: &SceneNode,
    thumbnail: Option<&RgbaImage>,
    options: &WriteOptions,
) -> Result<(), CodecError> {
    write_header(output, ModelKind::Static);
    write_u8(output, options.texture_encoding as u8);

    let table = TextureTable::collect(root, thumbnail.is_some());
    write_u8(output, (table.len() + usize::from(thumbnail.is_some())) as u8);
    if let Some(thumbnail) = thumbnail {
        write_texture(output, THUMBNAIL_TEXTURE_ID, thumbnail, options)?;
    }
    for (id, texture) in table.entries() {
        write_texture(output, id, texture, options)?;
    }
    debug!(
        "Wrote {} textures (thumbnail: {})",
        table.len(),
        thumbnail.is_some()
    );

    let count = truncated_count(root.children.len(), u8::MAX as usize, "children", &root.name);
    write_u8(output, count as u8);
    for node in &root.children[..count] {
        write_node(output, node, &table, 0)?;
    }
    Ok(())
}

fn write_texture(
    output: &mut Vec<u8>,
    id: i32,
    image: &RgbaImage,
    options: &WriteOptions,
) -> Result<(), CodecError> {
    write_i32(output, id);
    match options.texture_encoding {
        TextureEncoding::SplitAlpha => {
            let payload = split_alpha(image, &options.textures)?;
            write_blob(output, &payload.color);
            write_blob(output, &payload.alpha);
        }
        TextureEncoding::NoAlpha => {
            write_blob(output, &compress_opaque(image, &options.textures)?);
        }
    }
    Ok(())
}

fn write_node(
    output: &mut Vec<u8>,
    node: &SceneNode,
    textures: &TextureTable,
    depth: usize,
) -> Result<(), CodecError> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(CodecError::InvalidInput(format!(
            "node '{}' is nested deeper than {MAX_NESTING_DEPTH} levels",
            node.name
        )));
    }
    if node.skin.is_some() || node.animation.is_some() {
        debug!("Static node '{}': skin and animation are not stored", node.name);
    }

    write_string(output, &node.name);
    write_transform(output, &node.transform);

    let component_count = usize::from(node.geometry.is_some())
        + usize::from(node.materials.is_some())
        + usize::from(node.collider.is_some());
    write_u8(output, component_count as u8);

    if let Some(geometry) = &node.geometry {
        write_u8(output, ComponentKind::MeshFilter as u8);
        if geometry::fits(geometry) {
            write_sized_block(output, |body| write_geometry(body, geometry))?;
        } else {
            warn!(
                "Mesh of '{}' has {} vertices, more than the format allows; writing it empty",
                node.name,
                geometry.vertex_count()
            );
            write_sized_block(output, |body| write_geometry(body, &Geometry::default()))?;
        }
    }

    if let Some(materials) = &node.materials {
        write_u8(output, ComponentKind::MeshRender as u8);
        write_sized_block::<CodecError>(output, |body| {
            write_materials(body, materials, textures);
            Ok(())
        })?;
    }

    if let Some(collider) = &node.collider {
        write_u8(output, ComponentKind::ColliderHelper as u8);
        write_u32(output, COLLIDER_PAYLOAD_SIZE);
        write_u8(output, collider.kind as u8);
        write_vec3(output, collider.param1);
        write_vec3(output, collider.param2);
    }

    let count = truncated_count(node.children.len(), u8::MAX as usize, "children", &node.name);
    write_u8(output, count as u8);
    for child in &node.children[..count] {
        write_node(output, child, textures, depth + 1)?;
    }
    Ok(())
}

/// Read a static container
pub fn read_static(data: &[u8], context: &DecodeContext<'_>) -> Result<StaticModel, FormatError> {
    let mut reader = ByteReader::new(data);
    expect_kind(read_header(&mut reader)?, ModelKind::Static)?;

    let tag = reader.read_u8()?;
    let texture_encoding =
        TextureEncoding::from_u8(tag).ok_or(FormatError::UnknownTextureEncoding(tag))?;

    let mut textures = read_texture_table(&mut reader, texture_encoding)?;
    let thumbnail = textures
        .get(&THUMBNAIL_TEXTURE_ID)
        .map(|thumbnail| (**thumbnail).clone());
    textures.remove(&THUMBNAIL_TEXTURE_ID);

    let count = reader.read_u8()? as usize;
    let mut nodes = Vec::with_capacity(count);
    for _ in 0..count {
        nodes.push(read_node(&mut reader, &textures, context, 0)?);
    }

    if !reader.is_empty() {
        debug!("Ignoring {} trailing bytes", reader.remaining());
    }
    Ok(StaticModel {
        nodes,
        thumbnail,
        texture_encoding,
    })
}

fn read_texture_table(
    reader: &mut ByteReader<'_>,
    encoding: TextureEncoding,
) -> Result<HashMap<i32, TextureRef>, FormatError> {
    let count = reader.read_u8()? as usize;
    let mut textures = HashMap::with_capacity(count);
    for _ in 0..count {
        let id = reader.read_i32()?;
        let color = reader.read_blob()?;
        let image = match encoding {
            TextureEncoding::SplitAlpha => join_alpha(color, reader.read_blob()?)?,
            TextureEncoding::NoAlpha => decode_opaque(color)?,
        };
        if textures.insert(id, Arc::new(image)).is_some() {
            return Err(FormatError::DuplicateTextureId(id));
        }
    }
    Ok(textures)
}

fn read_node(
    reader: &mut ByteReader<'_>,
    textures: &HashMap<i32, TextureRef>,
    context: &DecodeContext<'_>,
    depth: usize,
) -> Result<SceneNode, FormatError> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(FormatError::NestingTooDeep(MAX_NESTING_DEPTH));
    }

    let mut node = SceneNode::new(reader.read_string()?);
    node.transform = reader.read_transform()?;

    let component_count = reader.read_u8()?;
    for _ in 0..component_count {
        let tag = reader.read_u8()?;
        let declared = reader.read_u32()?;
        if declared == 0 && tag == ComponentKind::MeshFilter as u8 {
            // Legacy writers leave the mesh length at 0 and store the body inline
            node.geometry = Some(read_geometry(reader)?);
            continue;
        }
        let mut body = reader.sub_reader(declared as usize)?;
        read_component(&mut node, tag, &mut body, textures, context).map_err(|e| match e {
            FormatError::UnexpectedEof { .. } => FormatError::ComponentOverrun {
                kind: tag,
                declared,
            },
            other => other,
        })?;
    }

    let child_count = reader.read_u8()? as usize;
    node.children.reserve(child_count);
    for _ in 0..child_count {
        node.children
            .push(read_node(reader, textures, context, depth + 1)?);
    }
    Ok(node)
}

fn read_component(
    node: &mut SceneNode,
    tag: u8,
    body: &mut ByteReader<'_>,
    textures: &HashMap<i32, TextureRef>,
    context: &DecodeContext<'_>,
) -> Result<(), FormatError> {
    match ComponentKind::from_u8(tag) {
        Some(ComponentKind::MeshFilter) => {
            node.geometry = Some(read_geometry(body)?);
        }
        Some(ComponentKind::MeshRender) => {
            node.materials = Some(read_materials(body, textures, context.registry)?);
        }
        Some(ComponentKind::ColliderHelper) => {
            let kind_tag = body.read_u8()?;
            let kind = ColliderKind::from_u8(kind_tag).unwrap_or_else(|| {
                debug!("Unknown collider kind {} on '{}'", kind_tag, node.name);
                ColliderKind::None
            });
            node.collider = Some(Collider {
                kind,
                param1: body.read_vec3()?,
                param2: body.read_vec3()?,
            });
        }
        other => {
            debug!(
                "Skipping component {:?} (tag {}, {} bytes) on '{}'",
                other,
                tag,
                body.remaining(),
                node.name
            );
        }
    }
    Ok(())
}

// ============================================================================
// Avatar container
// ============================================================================

/// Write an avatar container
///
/// Only the direct children of `root` are written; deeper nodes are rebuilt
/// from the bone lists of the skins.
pub fn write_avatar(
    output: &mut Vec<u8>,
    root: &SceneNode,
    thumbnail: &RgbaImage,
    options: &WriteOptions,
) -> Result<(), CodecError> {
    write_header(output, ModelKind::Avatar);
    write_string(output, &root.name);
    write_transform(output, &root.transform);
    write_animation(output, root.animation.as_ref());

    let count = truncated_count(root.children.len(), u16::MAX as usize, "children", &root.name);
    write_u16(output, count as u16);
    for child in &root.children[..count] {
        write_string(output, &child.name);
        write_transform(output, &child.transform);

        match &child.skin {
            Some(skin) => match check_capacity(skin) {
                Ok(()) => {
                    write_u8(output, 1);
                    write_skin(output, &child.name, skin)?;
                }
                Err(reason) => {
                    warn!("Dropping skin of '{}': {}", child.name, reason);
                    write_u8(output, 0);
                }
            },
            None => write_u8(output, 0),
        }
    }

    let payload = split_alpha(thumbnail, &options.textures)?;
    write_blob(output, &payload.color);
    write_blob(output, &payload.alpha);
    Ok(())
}

/// Read an avatar container and rebuild its bone hierarchy
pub fn read_avatar(data: &[u8], context: &DecodeContext<'_>) -> Result<AvatarModel, FormatError> {
    let mut reader = ByteReader::new(data);
    expect_kind(read_header(&mut reader)?, ModelKind::Avatar)?;

    let root_name = reader.read_string()?;
    let root_transform = reader.read_transform()?;
    let animation: AnimationDescriptor = read_animation(&mut reader)?;

    let mut group = BoneGroup::new(SceneNode::new(root_name).with_transform(root_transform));

    let child_count = reader.read_u16()? as usize;
    for _ in 0..child_count {
        let name = reader.read_string()?;
        let transform = reader.read_transform()?;
        let id = group.add_root_child(&name, transform)?;

        if reader.read_u8()? != 1 {
            continue;
        }
        let decoded = read_skin(&mut reader)?;
        if decoded.node_name != name {
            debug!(
                "Skin of '{}' was recorded for node '{}'",
                name, decoded.node_name
            );
        }
        group.resolve_bones(&decoded.skin.bones)?;
        group.node_mut(id).materials = Some(vec![skinned_material(context.registry)]);
        group.set_skin(id, decoded.skin);
    }

    let color = reader.read_blob()?;
    let alpha = reader.read_blob()?;
    let thumbnail = join_alpha(color, alpha)?;

    if !reader.is_empty() {
        debug!("Ignoring {} trailing bytes", reader.remaining());
    }

    group.reconcile()?;
    let controller = synthesize_controller(&animation, context.naming, context.resolver);
    let mut root = group.into_tree()?;
    root.animation = Some(animation);

    Ok(AvatarModel {
        root,
        thumbnail,
        controller,
    })
}

/// Skinned meshes are always drawn with the shared vertex-color material
fn skinned_material(registry: &dyn MaterialRegistry) -> MaterialDescriptor {
    MaterialDescriptor {
        binding: Some(MaterialBinding::Shared(
            registry.shared(MaterialType::VertexColor),
        )),
        ..MaterialDescriptor::new(MaterialType::VertexColor)
    }
}
