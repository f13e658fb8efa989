//! MT2 material definitions.
//!
//! An MT2 file is an XML tree of render flags, `<Texture>` and `<Constant>`
//! elements, texture coordinate sources and samplers. Files naming a
//! `<BasedOffOf Name=".."/>` are additionally resolved against the table of
//! known base materials.

use crate::cursor::Vec3;
use indexmap::IndexMap;
use log::{debug, info, warn};
use quick_xml::{events::Event, Reader};
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaterialError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("<{element}> is missing attribute {attribute}")]
    MissingAttribute { element: String, attribute: String },
    #[error("Unknown Attribute: {attribute} on <{element}>")]
    UnknownAttribute {
        element: &'static str,
        attribute: String,
    },
    #[error("Unknown Type: {0}")]
    UnsupportedType(String),
    #[error("Invalid value for {attribute}: {value}")]
    InvalidValue { attribute: String, value: String },
    #[error("Unknown base material: {0}")]
    UnknownBaseMaterial(String),
}

// ============================================================================
// XML access
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: IndexMap<String, String>,
}

impl XmlElement {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str, MaterialError> {
        self.attribute(key).ok_or_else(|| MaterialError::MissingAttribute {
            element: self.name.clone(),
            attribute: key.to_string(),
        })
    }

    /// Reads a `Value="true"` style flag element.
    fn flag(&self) -> Result<bool, MaterialError> {
        Ok(is_true(self.require("Value")?))
    }
}

/// Every element of a material document, in document order.
#[derive(Debug, Clone, Default)]
pub struct MaterialXml {
    elements: Vec<XmlElement>,
}

impl MaterialXml {
    pub fn parse(xml: &str) -> Result<Self, MaterialError> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut elements = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    let mut attributes = IndexMap::new();
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| MaterialError::Xml(e.to_string()))?;
                        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                        let value = attr
                            .unescape_value()
                            .map_err(|e| MaterialError::Xml(e.to_string()))?
                            .into_owned();
                        attributes.insert(key, value);
                    }
                    elements.push(XmlElement { name, attributes });
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(MaterialError::Xml(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { elements })
    }

    pub fn descendants<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a XmlElement> + 'n
    where
        'a: 'n,
    {
        self.elements.iter().filter(move |e| e.name == name)
    }

    pub fn first(&self, name: &str) -> Option<&XmlElement> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// First `name` element whose `Alias` attribute equals `alias`.
    pub fn aliased(&self, name: &str, alias: &str) -> Option<&XmlElement> {
        self.elements
            .iter()
            .find(|e| e.name == name && e.attribute("Alias") == Some(alias))
    }

    fn texture_file(&self, alias: &str) -> Result<Option<String>, MaterialError> {
        match self.aliased("Texture", alias) {
            Some(texture) => Ok(Some(texture.require("FileName")?.to_string())),
            None => Ok(None),
        }
    }
}

fn is_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn parse_attr<T: FromStr>(attribute: &str, value: &str) -> Result<T, MaterialError> {
    value.parse().map_err(|_| MaterialError::InvalidValue {
        attribute: attribute.to_string(),
        value: value.to_string(),
    })
}

/// Decodes a `<Constant Type=".." Value=".."/>` into a vector.
///
/// `float3` takes three space separated components (any other count repeats
/// the first one); `float` broadcasts its single value.
pub fn read_constant(constant: &XmlElement) -> Result<Vec3, MaterialError> {
    let kind = constant.require("Type")?;
    let value = constant.require("Value")?;

    match kind.to_lowercase().as_str() {
        "float3" => {
            let parts: Vec<&str> = value.split(' ').collect();
            let stride = if parts.len() == 3 { 1 } else { 0 };
            Ok([
                parse_attr("Value", parts[0])?,
                parse_attr("Value", parts[stride])?,
                parse_attr("Value", parts[2 * stride])?,
            ])
        }
        "float" => {
            let v = parse_attr("Value", value)?;
            Ok([v, v, v])
        }
        _ => Err(MaterialError::UnsupportedType(kind.to_string())),
    }
}

// ============================================================================
// Texture coordinate sources and samplers
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextureCoordSource {
    pub alias: Option<String>,
    pub uv_stream: i32,
    pub scrolling: bool,
    pub scroll: Vec3,
    pub flip_book: bool,
    pub frames_x: i32,
    pub frames_y: i32,
    pub frame_rate: f32,
    pub flip_book_select: bool,
    pub flip_book_select_frame: i32,
    pub waving: bool,
    pub wave_frequency_u: f32,
    pub wave_frequency_v: f32,
    pub wave_amplitude_u: f32,
    pub wave_amplitude_v: f32,
}

impl TextureCoordSource {
    pub fn from_element(element: &XmlElement) -> Result<Self, MaterialError> {
        let mut tcs = Self::default();

        for (key, value) in &element.attributes {
            match key.as_str() {
                "Alias" => tcs.alias = Some(value.clone()),
                "UVStream" => tcs.uv_stream = parse_attr(key, value)?,
                "Scrolling" => tcs.scrolling = is_true(value),
                "ScrollX" => tcs.scroll[0] = parse_attr(key, value)?,
                "ScrollY" => tcs.scroll[1] = parse_attr(key, value)?,
                "ScrollZ" => tcs.scroll[2] = parse_attr(key, value)?,
                "FlipBook" => tcs.flip_book = is_true(value),
                "FramesX" => tcs.frames_x = parse_attr(key, value)?,
                "FramesY" => tcs.frames_y = parse_attr(key, value)?,
                "FrameRate" => tcs.frame_rate = parse_attr(key, value)?,
                "FlipBookSelect" => tcs.flip_book_select = is_true(value),
                "FlipBookSelectFrame" => tcs.flip_book_select_frame = parse_attr(key, value)?,
                "Waving" => tcs.waving = is_true(value),
                "WaveFrequenceU" => tcs.wave_frequency_u = parse_attr(key, value)?,
                "WaveFrequenceV" => tcs.wave_frequency_v = parse_attr(key, value)?,
                "WaveAmplitudeU" => tcs.wave_amplitude_u = parse_attr(key, value)?,
                "WaveAmplitudeV" => tcs.wave_amplitude_v = parse_attr(key, value)?,
                _ => {
                    return Err(MaterialError::UnknownAttribute {
                        element: "TextureCoordSource",
                        attribute: key.clone(),
                    })
                }
            }
        }

        Ok(tcs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Filter {
    #[default]
    Anisotropic,
    Linear,
    Point,
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Address {
    #[default]
    Clamp,
    Wrap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Usage {
    #[default]
    DiffuseAlbedo,
    TangentSpaceNormals,
    SpecAlbedo,
    SpecColour,
    SpecMask,
    SpecPower,
}

impl FromStr for Filter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Filter::Anisotropic, Filter::Linear, Filter::Point, Filter::None]
            .into_iter()
            .find(|f| format!("{:?}", f).eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl FromStr for Address {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Address::Clamp, Address::Wrap]
            .into_iter()
            .find(|a| format!("{:?}", a).eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl FromStr for Usage {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Usage::DiffuseAlbedo,
            Usage::TangentSpaceNormals,
            Usage::SpecAlbedo,
            Usage::SpecColour,
            Usage::SpecMask,
            Usage::SpecPower,
        ]
        .into_iter()
        .find(|u| format!("{:?}", u).eq_ignore_ascii_case(s))
        .ok_or(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sampler {
    pub alias: Option<String>,
    pub sampler_type: Option<String>,
    pub min_filter: Filter,
    pub max_anisotropy: i32,
    pub mip_filter: Filter,
    pub mag_filter: Filter,
    pub mip_level_bias: i32,
    pub address_u: Address,
    pub address_v: Address,
    pub address_w: Address,
    pub srgb_read: bool,
    pub usage_rgb: Usage,
    pub usage_alpha: Usage,
}

impl Sampler {
    pub fn from_element(element: &XmlElement) -> Result<Self, MaterialError> {
        let mut s = Self::default();

        for (key, value) in &element.attributes {
            match key.as_str() {
                "Alias" => s.alias = Some(value.clone()),
                "Type" => s.sampler_type = Some(value.clone()),
                "MinFilter" => s.min_filter = parse_attr(key, value)?,
                "MaxAnisotropy" => s.max_anisotropy = parse_attr(key, value)?,
                "MipFilter" => s.mip_filter = parse_attr(key, value)?,
                "MipLevelBias" => s.mip_level_bias = parse_attr(key, value)?,
                "MagFilter" => s.mag_filter = parse_attr(key, value)?,
                "AddressU" => s.address_u = parse_attr(key, value)?,
                "AddressV" => s.address_v = parse_attr(key, value)?,
                "AddressW" => s.address_w = parse_attr(key, value)?,
                "sRGBRead" => s.srgb_read = is_true(value),
                "UsageRGB" => s.usage_rgb = parse_attr(key, value)?,
                "UsageAlpha" => s.usage_alpha = parse_attr(key, value)?,
                _ => {
                    return Err(MaterialError::UnknownAttribute {
                        element: "Sampler",
                        attribute: key.clone(),
                    })
                }
            }
        }

        Ok(s)
    }
}

// ============================================================================
// Base materials
// ============================================================================

/// Extra texture slots read by the lit base materials.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurfaceMaps {
    pub normal_map: Option<String>,
    pub spec_map: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BaseMaterial {
    GlowSimpleNormSpecEnv(SurfaceMaps),
    Unlit1Bit(SurfaceMaps),
}

type BaseConstructor = fn(&MaterialXml, &mut Mt2) -> Result<BaseMaterial, MaterialError>;

const BASE_MATERIALS: &[(&str, BaseConstructor)] = &[
    ("glow_simple_norm_spec_env_base", glow_simple_norm_spec_env_base),
    ("unlit_1bit_base", unlit_1bit_base),
];

fn read_surface_maps(xml: &MaterialXml, mt2: &mut Mt2) -> Result<SurfaceMaps, MaterialError> {
    if let Some(diffuse) = xml.texture_file("DiffuseColour")? {
        mt2.diffuse_colour = Some(diffuse);
    }
    Ok(SurfaceMaps {
        normal_map: xml.texture_file("Normal_Map")?,
        spec_map: xml.texture_file("Spec_Map")?,
    })
}

fn glow_simple_norm_spec_env_base(xml: &MaterialXml, mt2: &mut Mt2) -> Result<BaseMaterial, MaterialError> {
    Ok(BaseMaterial::GlowSimpleNormSpecEnv(read_surface_maps(xml, mt2)?))
}

fn unlit_1bit_base(xml: &MaterialXml, mt2: &mut Mt2) -> Result<BaseMaterial, MaterialError> {
    Ok(BaseMaterial::Unlit1Bit(read_surface_maps(xml, mt2)?))
}

impl BaseMaterial {
    pub fn name(&self) -> &'static str {
        match self {
            BaseMaterial::GlowSimpleNormSpecEnv(_) => "glow_simple_norm_spec_env_base",
            BaseMaterial::Unlit1Bit(_) => "unlit_1bit_base",
        }
    }

    pub fn maps(&self) -> &SurfaceMaps {
        match self {
            BaseMaterial::GlowSimpleNormSpecEnv(maps) | BaseMaterial::Unlit1Bit(maps) => maps,
        }
    }

    /// Builds the named base material (case-insensitive) from the same document.
    pub fn instantiate(name: &str, xml: &MaterialXml, mt2: &mut Mt2) -> Result<Self, MaterialError> {
        let (_, constructor) = BASE_MATERIALS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .ok_or_else(|| MaterialError::UnknownBaseMaterial(name.to_string()))?;
        constructor(xml, mt2)
    }
}

// ============================================================================
// Material
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderFlags {
    pub double_sided: bool,
    pub casts_shadows: bool,
    pub receives_shadows: bool,
    pub fog_enabled: bool,
    pub walkable: bool,
    pub panickable: bool,
    pub needs_world_light_dir: bool,
    pub needs_world_space_vertex_normal: bool,
    pub needs_world_eye_pos: bool,
    pub needs_world_vertex_pos: bool,
    pub needs_lighting_space_vertex_normal: bool,
    pub needs_vertex_colour: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mt2 {
    pub flags: RenderFlags,
    pub diffuse_colour: Option<String>,
    pub substance: Option<String>,
    pub multiplier: Option<Vec3>,
    /// Texture file names by alias, in document order.
    pub textures: IndexMap<String, String>,
    pub texture_coord_sources: Vec<TextureCoordSource>,
    pub samplers: Vec<Sampler>,
    pub base: Option<BaseMaterial>,
}

impl Mt2 {
    /// Reads the properties shared by every material, without base lookup.
    pub fn from_xml(xml: &MaterialXml) -> Result<Self, MaterialError> {
        let mut mt2 = Mt2::default();

        let f = &mut mt2.flags;
        let flags: [(&str, &mut bool); 12] = [
            ("DoubleSided", &mut f.double_sided),
            ("CastsShadows", &mut f.casts_shadows),
            ("ReceivesShadows", &mut f.receives_shadows),
            ("FogEnabled", &mut f.fog_enabled),
            ("Walkable", &mut f.walkable),
            ("Panickable", &mut f.panickable),
            ("NeedsWorldSpaceVertexNormal", &mut f.needs_world_space_vertex_normal),
            ("NeedsWorldEyePos", &mut f.needs_world_eye_pos),
            ("NeedsWorldVertexPos", &mut f.needs_world_vertex_pos),
            ("NeedsWorldLightDir", &mut f.needs_world_light_dir),
            ("NeedsLightingSpaceVertexNormal", &mut f.needs_lighting_space_vertex_normal),
            ("NeedsVertexColour", &mut f.needs_vertex_colour),
        ];
        for (element, slot) in flags {
            if let Some(e) = xml.first(element) {
                *slot = e.flag()?;
            }
        }

        if let Some(multiplier) = xml.aliased("Constant", "Multiplier") {
            mt2.multiplier = Some(read_constant(multiplier)?);
        }

        for texture in xml.descendants("Texture") {
            if let (Some(alias), Some(file)) = (texture.attribute("Alias"), texture.attribute("FileName")) {
                mt2.textures.insert(alias.to_string(), file.to_string());
            }
        }

        for element in xml.descendants("TextureCoordSource") {
            mt2.texture_coord_sources.push(TextureCoordSource::from_element(element)?);
        }
        for element in xml.descendants("Sampler") {
            mt2.samplers.push(Sampler::from_element(element)?);
        }

        if let Some(substance) = xml.first("Substance") {
            mt2.substance = Some(substance.require("Name")?.to_string());
        }

        Ok(mt2)
    }

    /// Parses a material document.
    ///
    /// Returns `Ok(None)` when the document names a base material that cannot
    /// be instantiated; every other failure is an error.
    pub fn parse(text: &str) -> Result<Option<Self>, MaterialError> {
        let xml = MaterialXml::parse(text)?;
        let mut mt2 = Mt2::from_xml(&xml)?;

        if let Some(based_off_of) = xml.first("BasedOffOf") {
            let name = based_off_of.require("Name")?;
            match BaseMaterial::instantiate(name, &xml, &mut mt2) {
                Ok(base) => {
                    info!("material based off {}", base.name());
                    mt2.base = Some(base);
                }
                Err(e) => {
                    warn!("could not build base material {}: {}", name, e);
                    return Ok(None);
                }
            }
        }

        Ok(Some(mt2))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, MaterialError> {
        let path = path.as_ref();
        debug!("loading {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}
