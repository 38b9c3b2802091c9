//! Material descriptor tags and parameter ranges
//!
//! # Layout (MeshRender component payload)
//! ```text
//! material_count u8
//!   type u8
//!   base_color_texture_id i32   (0 = none)
//!   normal_texture_id i32       (0 = none)
//!   param_count u8              (always 3 when written)
//!   intensity u8, wind u8, pulse u8
//! ```

/// Number of quantized parameters written per material
pub const MATERIAL_PARAM_COUNT: u8 = 3;

/// Upper bound of the intensity range
pub const INTENSITY_MAX: f32 = 2.0;

/// Upper bound of the wind range
pub const WIND_MAX: f32 = 1.0;

/// Upper bound of the pulse range
pub const PULSE_MAX: f32 = 1.0;

/// Material family stored in the file
///
/// Tag 0 is never written; unknown tags decode as [`MaterialType::Lit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MaterialType {
    #[default]
    Lit = 1,
    VertexColor = 2,
    Glass = 3,
    Metal = 4,
    Emission = 5,
}

/// Recognized shader names. Anything else is stored as [`MaterialType::Lit`].
pub const SHADER_TABLE: [(&str, MaterialType); 5] = [
    ("HDRP/Lit", MaterialType::Lit),
    ("Shader Graphs/VC", MaterialType::VertexColor),
    ("Shader Graphs/Metal", MaterialType::Metal),
    ("Shader Graphs/Glass", MaterialType::Glass),
    ("Shader Graphs/Emission", MaterialType::Emission),
];

impl MaterialType {
    pub const ALL: [MaterialType; 5] = [
        MaterialType::Lit,
        MaterialType::VertexColor,
        MaterialType::Glass,
        MaterialType::Metal,
        MaterialType::Emission,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Lit),
            2 => Some(Self::VertexColor),
            3 => Some(Self::Glass),
            4 => Some(Self::Metal),
            5 => Some(Self::Emission),
            _ => None,
        }
    }

    /// Exact lookup in [`SHADER_TABLE`]
    pub fn from_shader_name(name: &str) -> Option<Self> {
        SHADER_TABLE
            .iter()
            .find(|(shader, _)| *shader == name)
            .map(|&(_, kind)| kind)
    }

    /// Canonical shader name for this type
    pub fn shader_name(self) -> &'static str {
        match self {
            Self::Lit => "HDRP/Lit",
            Self::VertexColor => "Shader Graphs/VC",
            Self::Glass => "Shader Graphs/Glass",
            Self::Metal => "Shader Graphs/Metal",
            Self::Emission => "Shader Graphs/Emission",
        }
    }
}
