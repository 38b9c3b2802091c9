//! Material slots (MeshRender payload) and the host material registry
//!
//! Files store a material type, two texture ids and three quantized
//! parameters. On decode each slot is bound to a host material:
//! - wind or pulse non-zero: a private instance carrying the parameters
//! - Lit with a texture: a private instance carrying the textures
//! - otherwise: the registry's shared default for the type, never mutated

use std::sync::Arc;

use hashbrown::HashMap;
use scene_common::formats::io::{write_i32, write_u8};
use scene_common::{
    ByteReader, FormatError, INTENSITY_MAX, MATERIAL_PARAM_COUNT, MaterialBinding,
    MaterialDescriptor, MaterialParams, MaterialSet, MaterialType, PULSE_MAX, SurfaceMaterial,
    THUMBNAIL_TEXTURE_ID, TextureRef, WIND_MAX, dequantize_unorm8, quantize_unorm8,
};
use tracing::{debug, warn};

use crate::container::TextureTable;

/// Source of host materials for decoded slots
///
/// Implementations must hand out the same shared material for a type every
/// time; callers never mutate it.
pub trait MaterialRegistry: Send + Sync {
    /// Shared default material for `kind`
    fn shared(&self, kind: MaterialType) -> Arc<SurfaceMaterial>;

    /// Fresh private material for `kind`, safe to modify
    fn instance(&self, kind: MaterialType) -> SurfaceMaterial {
        (*self.shared(kind)).clone()
    }
}

/// Registry with one default material per type (intensity 1, no wind or pulse)
#[derive(Debug, Clone)]
pub struct DefaultMaterialRegistry {
    defaults: HashMap<MaterialType, Arc<SurfaceMaterial>>,
}

impl Default for DefaultMaterialRegistry {
    fn default() -> Self {
        let defaults = MaterialType::ALL
            .into_iter()
            .map(|kind| {
                let material = SurfaceMaterial {
                    kind,
                    params: MaterialParams {
                        intensity: 1.0,
                        wind: 0.0,
                        pulse: 0.0,
                    },
                    ..Default::default()
                };
                (kind, Arc::new(material))
            })
            .collect();
        Self { defaults }
    }
}

impl MaterialRegistry for DefaultMaterialRegistry {
    fn shared(&self, kind: MaterialType) -> Arc<SurfaceMaterial> {
        match self.defaults.get(&kind) {
            Some(material) => Arc::clone(material),
            None => Arc::new(SurfaceMaterial {
                kind,
                ..Default::default()
            }),
        }
    }
}

/// Parameter bytes as stored in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuantizedParams {
    pub intensity: u8,
    pub wind: u8,
    pub pulse: u8,
}

impl QuantizedParams {
    pub fn quantize(params: &MaterialParams) -> Self {
        Self {
            intensity: quantize_unorm8(params.intensity, INTENSITY_MAX),
            wind: quantize_unorm8(params.wind, WIND_MAX),
            pulse: quantize_unorm8(params.pulse, PULSE_MAX),
        }
    }

    pub fn dequantize(self) -> MaterialParams {
        MaterialParams {
            intensity: dequantize_unorm8(self.intensity, INTENSITY_MAX),
            wind: dequantize_unorm8(self.wind, WIND_MAX),
            pulse: dequantize_unorm8(self.pulse, PULSE_MAX),
        }
    }

    /// Missing trailing bytes read as zero; extra bytes are ignored
    fn from_bytes(bytes: &[u8]) -> Self {
        let at = |i: usize| bytes.get(i).copied().unwrap_or(0);
        Self {
            intensity: at(0),
            wind: at(1),
            pulse: at(2),
        }
    }

    fn is_animated(self) -> bool {
        self.wind != 0 || self.pulse != 0
    }
}

/// Pick the host material for one decoded slot
pub fn bind_material(
    registry: &dyn MaterialRegistry,
    descriptor: &MaterialDescriptor,
    quantized: QuantizedParams,
) -> MaterialBinding {
    let kind = descriptor.kind();
    let textured = descriptor.base_color_map.is_some() || descriptor.normal_map.is_some();

    if quantized.is_animated() || (kind == MaterialType::Lit && textured) {
        let mut material = registry.instance(kind);
        material.params = descriptor.params;
        material.base_color_map = descriptor.base_color_map.clone();
        material.normal_map = descriptor.normal_map.clone();
        MaterialBinding::Instance(Arc::new(material))
    } else {
        MaterialBinding::Shared(registry.shared(kind))
    }
}

/// Write a material set payload
pub fn write_materials(
    output: &mut Vec<u8>,
    materials: &[MaterialDescriptor],
    textures: &TextureTable,
) {
    let count = if materials.len() > u8::MAX as usize {
        warn!(
            "{} material slots exceed the u8 count field, writing the first {}",
            materials.len(),
            u8::MAX
        );
        u8::MAX as usize
    } else {
        materials.len()
    };

    write_u8(output, count as u8);
    for material in &materials[..count] {
        let kind = material.kind();
        if MaterialType::from_shader_name(&material.shader).is_none() {
            debug!("Unknown shader '{}' stored as {:?}", material.shader, kind);
        }
        write_u8(output, kind as u8);
        write_i32(output, texture_id(textures, material.base_color_map.as_ref()));
        write_i32(output, texture_id(textures, material.normal_map.as_ref()));

        let params = QuantizedParams::quantize(&material.params);
        write_u8(output, MATERIAL_PARAM_COUNT);
        write_u8(output, params.intensity);
        write_u8(output, params.wind);
        write_u8(output, params.pulse);
    }
}

fn texture_id(textures: &TextureTable, texture: Option<&TextureRef>) -> i32 {
    texture
        .and_then(|texture| textures.id_of(texture))
        .unwrap_or(THUMBNAIL_TEXTURE_ID)
}

/// Read a material set payload and bind every slot through `registry`
pub fn read_materials(
    reader: &mut ByteReader<'_>,
    textures: &HashMap<i32, TextureRef>,
    registry: &dyn MaterialRegistry,
) -> Result<MaterialSet, FormatError> {
    let count = reader.read_u8()? as usize;
    let mut materials = Vec::with_capacity(count);
    for _ in 0..count {
        let tag = reader.read_u8()?;
        let kind = MaterialType::from_u8(tag).unwrap_or_else(|| {
            debug!("Unknown material type {} read as Lit", tag);
            MaterialType::Lit
        });
        let base_id = reader.read_i32()?;
        let normal_id = reader.read_i32()?;
        let param_count = reader.read_u8()? as usize;
        let quantized = QuantizedParams::from_bytes(reader.read_bytes(param_count)?);

        let mut descriptor = MaterialDescriptor {
            shader: kind.shader_name().to_string(),
            base_color_map: lookup_texture(textures, base_id),
            normal_map: lookup_texture(textures, normal_id),
            params: quantized.dequantize(),
            binding: None,
        };
        descriptor.binding = Some(bind_material(registry, &descriptor, quantized));
        materials.push(descriptor);
    }
    Ok(materials)
}

fn lookup_texture(textures: &HashMap<i32, TextureRef>, id: i32) -> Option<TextureRef> {
    if id == THUMBNAIL_TEXTURE_ID {
        return None;
    }
    let texture = textures.get(&id).cloned();
    if texture.is_none() {
        warn!("Material references texture {} missing from the table", id);
    }
    texture
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn roundtrip(materials: &[MaterialDescriptor]) -> MaterialSet {
        let mut table = TextureTable::default();
        for material in materials {
            table.collect_material(material);
        }
        let mut out = Vec::new();
        write_materials(&mut out, materials, &table);

        let decoded: HashMap<i32, TextureRef> = table
            .entries()
            .map(|(id, texture)| (id, Arc::clone(texture)))
            .collect();
        let registry = DefaultMaterialRegistry::default();
        read_materials(&mut ByteReader::new(&out), &decoded, &registry).unwrap()
    }

    #[test]
    fn test_params_are_quantized() {
        let params = MaterialParams {
            intensity: 1.5,
            wind: 0.25,
            pulse: 1.0,
        };
        let decoded =
            roundtrip(&[MaterialDescriptor::new(MaterialType::Metal).with_params(params)]);
        let restored = decoded[0].params;
        assert!((restored.intensity - 1.5).abs() <= INTENSITY_MAX / 255.0);
        assert!((restored.wind - 0.25).abs() <= WIND_MAX / 255.0);
        assert_eq!(restored.pulse, 1.0);
        assert_eq!(decoded[0].kind(), MaterialType::Metal);
    }

    #[test]
    fn test_still_material_is_shared() {
        let registry = DefaultMaterialRegistry::default();
        let params = MaterialParams {
            intensity: 1.0,
            ..Default::default()
        };
        let decoded = roundtrip(&[
            MaterialDescriptor::new(MaterialType::Glass).with_params(params),
            MaterialDescriptor::new(MaterialType::Glass).with_params(params),
        ]);

        let shared = registry.shared(MaterialType::Glass);
        for slot in &decoded {
            match slot.binding.as_ref().unwrap() {
                MaterialBinding::Shared(material) => assert!(Arc::ptr_eq(material, &shared)),
                other => panic!("expected shared binding, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_wind_makes_an_instance() {
        let registry = DefaultMaterialRegistry::default();
        let params = MaterialParams {
            intensity: 1.0,
            wind: 40.0 / 255.0,
            pulse: 0.0,
        };
        let decoded =
            roundtrip(&[MaterialDescriptor::new(MaterialType::VertexColor).with_params(params)]);

        let binding = decoded[0].binding.as_ref().unwrap();
        assert!(!binding.is_shared());
        let MaterialBinding::Instance(material) = binding else {
            unreachable!()
        };
        assert!(!Arc::ptr_eq(material, &registry.shared(MaterialType::VertexColor)));
        assert!((material.params.wind - 40.0 / 255.0).abs() < 1e-6);
        // The shared default is untouched
        assert_eq!(registry.shared(MaterialType::VertexColor).params.wind, 0.0);
    }

    #[test]
    fn test_textured_lit_is_an_instance() {
        let texture: TextureRef = Arc::new(RgbaImage::new(2, 2));
        let decoded = roundtrip(&[
            MaterialDescriptor::new(MaterialType::Lit).with_base_color_map(Arc::clone(&texture))
        ]);
        let binding = decoded[0].binding.as_ref().unwrap();
        assert!(!binding.is_shared());
        assert!(binding.material().base_color_map.is_some());
        assert!(decoded[0].normal_map.is_none());
    }

    #[test]
    fn test_unknown_shader_is_lit() {
        let custom = MaterialDescriptor {
            shader: "Foo/Bar".into(),
            ..Default::default()
        };
        let decoded = roundtrip(&[custom]);
        assert_eq!(decoded[0].kind(), MaterialType::Lit);
        assert_eq!(decoded[0].shader, "HDRP/Lit");
    }

    #[test]
    fn test_unknown_tag_and_short_params() {
        let mut out = Vec::new();
        write_u8(&mut out, 1); // one slot
        write_u8(&mut out, 9); // unknown type
        write_i32(&mut out, 0);
        write_i32(&mut out, 0);
        write_u8(&mut out, 1); // only intensity
        write_u8(&mut out, 255);

        let registry = DefaultMaterialRegistry::default();
        let decoded =
            read_materials(&mut ByteReader::new(&out), &HashMap::new(), &registry).unwrap();
        assert_eq!(decoded[0].kind(), MaterialType::Lit);
        assert_eq!(decoded[0].params.intensity, INTENSITY_MAX);
        assert_eq!(decoded[0].params.wind, 0.0);
        assert!(decoded[0].binding.as_ref().unwrap().is_shared());
    }

    #[test]
    fn test_payload_layout() {
        let mut out = Vec::new();
        let material = MaterialDescriptor::new(MaterialType::Emission).with_params(MaterialParams {
            intensity: 2.0,
            wind: 0.0,
            pulse: 0.0,
        });
        write_materials(&mut out, &[material], &TextureTable::default());
        assert_eq!(out, [1, 5, 0, 0, 0, 0, 0, 0, 0, 0, 3, 255, 0, 0]);
    }
}
