//! Record types for the sections of a vehicle setup file.
//!
//! Each record is read from a cursor positioned just after its `[header]` and
//! consumes lines until the next header or the end of input. Writers are the
//! inverse and only emit fields that carry a value.

use crate::cursor::{split_vector, DocumentCursor, ParseError, Vec3};
use crate::writer::{format_vec3, SectionWriter};
use serde::Serialize;

/// A structured section that can be read from and written back to text.
pub trait SectionRecord: Sized {
    /// Header name without the surrounding brackets.
    const SECTION: &'static str;

    fn read(doc: &mut DocumentCursor) -> Result<Self, ParseError>;

    fn write(&self, out: &mut SectionWriter);
}

fn unknown_field(record: &'static str, key: impl Into<String>) -> ParseError {
    ParseError::UnknownField {
        record,
        key: key.into(),
    }
}

/// Reads a `key value` line whose key is fixed by the format.
fn read_single(doc: &mut DocumentCursor, record: &'static str, key: &str) -> Result<String, ParseError> {
    let (k, v) = doc.read_key_value()?;
    if k != key {
        return Err(unknown_field(record, k));
    }
    Ok(v)
}

/// Consumes the next line if it is exactly `flag`.
fn read_flag(doc: &mut DocumentCursor, flag: &str) -> Result<bool, ParseError> {
    match doc.read_next_line() {
        Some(line) if line == flag => Ok(true),
        Some(_) => {
            doc.rewind()?;
            Ok(false)
        }
        None => Ok(false),
    }
}

// ============================================================================
// Wheel folders
// ============================================================================

/// Wheel asset folders for the four corners plus the extra D4-D11 slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WheelFolders {
    pub fl: Option<String>,
    pub fr: Option<String>,
    pub rl: Option<String>,
    pub rr: Option<String>,
    /// Slots D4 to D11, in order.
    pub extra: [Option<String>; 8],
    pub garage_set: Option<String>,
}

fn extra_slot(key: &str) -> Option<usize> {
    key.strip_prefix('D')?
        .strip_suffix("_wheel_folder_name")?
        .parse::<usize>()
        .ok()
        .filter(|n| (4..=11).contains(n))
}

impl WheelFolders {
    pub fn set_all(&mut self, folder: &str) {
        for slot in [&mut self.fl, &mut self.fr, &mut self.rl, &mut self.rr] {
            *slot = Some(folder.to_string());
        }
    }

    /// Applies a wheel folder key. Returns false when the key is not part of the schema.
    pub fn apply(&mut self, key: &str, value: &str) -> bool {
        let slot = match key {
            "wheel_folder_name" => {
                self.set_all(value);
                return true;
            }
            "fl_wheel_folder_name" => &mut self.fl,
            "fr_wheel_folder_name" => &mut self.fr,
            "rl_wheel_folder_name" => &mut self.rl,
            "rr_wheel_folder_name" => &mut self.rr,
            "garage_set" => &mut self.garage_set,
            _ => match extra_slot(key) {
                Some(n) => &mut self.extra[n - 4],
                None => return false,
            },
        };
        *slot = Some(value.to_string());
        true
    }

    pub fn write_fields(&self, out: &mut SectionWriter) {
        // Four equal corners collapse to one line. Otherwise each corner is
        // written on its own line, and unset corners are left out.
        if self.fl == self.fr && self.rl == self.rr && self.fl == self.rl {
            out.field_opt("wheel_folder_name", self.fl.as_ref());
        } else {
            out.field_opt("fl_wheel_folder_name", self.fl.as_ref());
            out.field_opt("fr_wheel_folder_name", self.fr.as_ref());
            out.field_opt("rl_wheel_folder_name", self.rl.as_ref());
            out.field_opt("rr_wheel_folder_name", self.rr.as_ref());
        }

        for (i, slot) in self.extra.iter().enumerate() {
            if let Some(folder) = slot {
                out.field(&format!("D{}_wheel_folder_name", i + 4), folder);
            }
        }
        out.field_opt("garage_set", self.garage_set.as_ref());
    }
}

// ============================================================================
// Attachments
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FModEngine {
    pub engine: Option<String>,
    pub rpm_smooth: f32,
    pub on_load_smooth: f32,
    pub off_load_smooth: f32,
    pub max_revs: i32,
    pub min_revs: i32,
    pub max_speed: i32,
    pub load_min: f32,
}

impl FModEngine {
    fn read_fields(doc: &mut DocumentCursor) -> Result<Self, ParseError> {
        let mut engine = Self::default();
        while !doc.at_record_end() {
            let (key, value) = doc.read_key_value()?;
            match key.as_str() {
                "engine" => engine.engine = Some(value),
                "rpmsmooth" => engine.rpm_smooth = doc.parse_token(&value)?,
                "onloadsmooth" => engine.on_load_smooth = doc.parse_token(&value)?,
                "offloadsmooth" => engine.off_load_smooth = doc.parse_token(&value)?,
                "max_revs" => engine.max_revs = doc.parse_token(&value)?,
                "min_revs" => engine.min_revs = doc.parse_token(&value)?,
                "max_speed" => engine.max_speed = doc.parse_token(&value)?,
                "loadmin" => engine.load_min = doc.parse_token(&value)?,
                _ => return Err(unknown_field("DynamicsFmodEngine", key)),
            }
        }
        Ok(engine)
    }

    fn write_fields(&self, out: &mut SectionWriter) {
        out.field_opt("engine", self.engine.as_ref());
        out.field_nonzero_f32("rpmsmooth", self.rpm_smooth);
        out.field_nonzero_f32("onloadsmooth", self.on_load_smooth);
        out.field_nonzero_f32("offloadsmooth", self.off_load_smooth);
        out.field_nonzero_i32("max_revs", self.max_revs);
        out.field_nonzero_i32("min_revs", self.min_revs);
        out.field_nonzero_i32("max_speed", self.max_speed);
        out.field_nonzero_f32("loadmin", self.load_min);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExhaustParticles {
    pub vfx: Option<String>,
    pub underwater_vfx: Option<String>,
    pub anchor: Option<String>,
    pub multiplier: f32,
    pub neutral_multiplier: f32,
}

impl ExhaustParticles {
    fn read_fields(doc: &mut DocumentCursor) -> Result<Self, ParseError> {
        let mut exhaust = Self::default();
        while !doc.at_record_end() {
            let (key, value) = doc.read_key_value()?;
            match key.as_str() {
                "vfx" => exhaust.vfx = Some(value),
                "underwater_vfx" => exhaust.underwater_vfx = Some(value),
                "anchor" => exhaust.anchor = Some(value),
                "multiplier" => exhaust.multiplier = doc.parse_token(&value)?,
                "neutral_multiplier" => exhaust.neutral_multiplier = doc.parse_token(&value)?,
                _ => return Err(unknown_field("ExhaustParticles", key)),
            }
        }
        Ok(exhaust)
    }

    fn write_fields(&self, out: &mut SectionWriter) {
        out.field_opt("vfx", self.vfx.as_ref());
        out.field_opt("underwater_vfx", self.underwater_vfx.as_ref());
        out.field_opt("anchor", self.anchor.as_ref());
        out.field_nonzero_f32("multiplier", self.multiplier);
        out.field_nonzero_f32("neutral_multiplier", self.neutral_multiplier);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContinuousSound {
    pub sound: Option<String>,
    pub lump: Option<String>,
}

/// An `[attachment]` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Attachment {
    ComplicatedWheels(WheelFolders),
    DynamicsFmodEngine(FModEngine),
    DynamicsWheels,
    ExhaustParticles(ExhaustParticles),
    Horn { event: String },
    ReverseLightSound { event: String },
    ContinuousSound(ContinuousSound),
}

impl Attachment {
    /// The type line written directly under the header.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Attachment::ComplicatedWheels(_) => "ComplicatedWheels",
            Attachment::DynamicsFmodEngine(_) => "DynamicsFmodEngine",
            Attachment::DynamicsWheels => "DynamicsWheels",
            Attachment::ExhaustParticles(_) => "ExhaustParticles",
            Attachment::Horn { .. } => "Horn",
            Attachment::ReverseLightSound { .. } => "ReverseLightSound",
            Attachment::ContinuousSound(_) => "ContinuousSound",
        }
    }
}

impl SectionRecord for Attachment {
    const SECTION: &'static str = "attachment";

    fn read(doc: &mut DocumentCursor) -> Result<Self, ParseError> {
        let kind = doc.expect_line("attachment type")?;

        let attachment = match kind.as_str() {
            "DynamicsWheels" => Attachment::DynamicsWheels,
            "ComplicatedWheels" => {
                let mut wheels = WheelFolders::default();
                while !doc.at_record_end() {
                    let (key, value) = doc.read_key_value()?;
                    if !wheels.apply(&key, &value) {
                        return Err(unknown_field("ComplicatedWheels", key));
                    }
                }
                Attachment::ComplicatedWheels(wheels)
            }
            "DynamicsFmodEngine" => Attachment::DynamicsFmodEngine(FModEngine::read_fields(doc)?),
            "ExhaustParticles" => Attachment::ExhaustParticles(ExhaustParticles::read_fields(doc)?),
            "Horn" => Attachment::Horn {
                event: read_single(doc, "Horn", "event")?,
            },
            "ReverseLightSound" => Attachment::ReverseLightSound {
                event: read_single(doc, "ReverseLightSound", "event")?,
            },
            "ContinuousSound" => {
                let mut sound = ContinuousSound::default();
                while !doc.at_record_end() {
                    let (key, value) = doc.read_key_value()?;
                    match key.as_str() {
                        "sound" => sound.sound = Some(value),
                        "lump" => sound.lump = Some(value),
                        _ => return Err(unknown_field("ContinuousSound", key)),
                    }
                }
                Attachment::ContinuousSound(sound)
            }
            _ => return Err(ParseError::UnknownKind { record: "attachment", kind }),
        };

        Ok(attachment)
    }

    fn write(&self, out: &mut SectionWriter) {
        out.header(Self::SECTION);
        out.line(self.kind_name());

        match self {
            Attachment::ComplicatedWheels(wheels) => wheels.write_fields(out),
            Attachment::DynamicsFmodEngine(engine) => engine.write_fields(out),
            Attachment::DynamicsWheels => {}
            Attachment::ExhaustParticles(exhaust) => exhaust.write_fields(out),
            Attachment::Horn { event } | Attachment::ReverseLightSound { event } => {
                out.field("event", event)
            }
            Attachment::ContinuousSound(sound) => {
                out.field_opt("sound", sound.sound.as_ref());
                out.field_opt("lump", sound.lump.as_ref());
            }
        }

        out.end_section();
    }
}

// ============================================================================
// Wheel modules
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkidNoise {
    Sounds(String),
    ScrapeSounds { index: i32, volume: i32 },
}

/// A `[wheel_module]` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WheelModule {
    SkidMarks { image: String, only_trails: bool },
    SkidNoise(SkidNoise),
    TyreParticles { vfx: String },
}

impl WheelModule {
    pub fn kind_name(&self) -> &'static str {
        match self {
            WheelModule::SkidMarks { .. } => "SkidMarks",
            WheelModule::SkidNoise(_) => "SkidNoise",
            WheelModule::TyreParticles { .. } => "TyreParticles",
        }
    }
}

impl SectionRecord for WheelModule {
    const SECTION: &'static str = "wheel_module";

    fn read(doc: &mut DocumentCursor) -> Result<Self, ParseError> {
        let kind = doc.expect_line("wheel module type")?;

        match kind.as_str() {
            "SkidMarks" => {
                let image = read_single(doc, "SkidMarks", "image")?;
                let only_trails = read_flag(doc, "only_trails")?;
                Ok(WheelModule::SkidMarks { image, only_trails })
            }
            "TyreParticles" | "TyreSmokeVFX" => Ok(WheelModule::TyreParticles {
                vfx: read_single(doc, "TyreParticles", "vfx")?,
            }),
            "SkidNoise" => {
                let noise = if read_flag(doc, "use_scrape_sounds")? {
                    let index = read_single(doc, "SkidNoise", "scrape_sound_index")?;
                    let index = doc.parse_token(&index)?;
                    let volume = read_single(doc, "SkidNoise", "volume")?;
                    let volume = doc.parse_token(&volume)?;
                    SkidNoise::ScrapeSounds { index, volume }
                } else {
                    SkidNoise::Sounds(read_single(doc, "SkidNoise", "sounds")?)
                };
                Ok(WheelModule::SkidNoise(noise))
            }
            _ => Err(ParseError::UnknownKind { record: "wheel_module", kind }),
        }
    }

    fn write(&self, out: &mut SectionWriter) {
        out.header(Self::SECTION);
        out.line(self.kind_name());

        match self {
            WheelModule::SkidMarks { image, only_trails } => {
                out.field("image", image);
                if *only_trails {
                    out.line("only_trails");
                }
            }
            WheelModule::SkidNoise(SkidNoise::Sounds(sound)) => out.field("sounds", sound),
            WheelModule::SkidNoise(SkidNoise::ScrapeSounds { index, volume }) => {
                out.line("use_scrape_sounds");
                out.field("scrape_sound_index", index);
                out.field("volume", volume);
            }
            WheelModule::TyreParticles { vfx } => out.field("vfx", vfx),
        }

        out.end_section();
    }
}

// ============================================================================
// Material maps
// ============================================================================

/// A value line of the form `key tag value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedValue {
    pub tag: String,
    pub value: String,
}

/// A `[material_map]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialMap {
    pub name: String,
    pub shrapnel: Option<Vec3>,
    pub localisation: Option<String>,
    pub paint: Option<TaggedValue>,
    pub product_id: i32,
    /// `paintfiberdam_1` to `paintfiberdam_5`.
    pub paint_fibre_damage: [Option<TaggedValue>; 5],
}

fn paint_fibre_slot(key: &str) -> Option<usize> {
    key.strip_prefix("paintfiberdam_")?
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=5).contains(n))
        .map(|n| n - 1)
}

fn read_tagged(doc: &DocumentCursor, tokens: &[String]) -> Result<TaggedValue, ParseError> {
    match tokens {
        [_, tag, value] => Ok(TaggedValue {
            tag: tag.clone(),
            value: value.clone(),
        }),
        _ => Err(doc.format_error(format!("expected 3 values, found {}", tokens.len()))),
    }
}

fn read_single_token(doc: &DocumentCursor, tokens: &[String]) -> Result<String, ParseError> {
    match tokens {
        [_, value] => Ok(value.clone()),
        _ => Err(doc.format_error(format!("expected 2 values, found {}", tokens.len()))),
    }
}

impl SectionRecord for MaterialMap {
    const SECTION: &'static str = "material_map";

    fn read(doc: &mut DocumentCursor) -> Result<Self, ParseError> {
        let mut map = MaterialMap {
            name: doc.expect_line("material map name")?,
            ..Default::default()
        };

        while !doc.at_record_end() {
            let tokens = doc.read_string_array_any()?;
            let key = tokens.first().map(|k| k.to_lowercase()).unwrap_or_default();

            match key.as_str() {
                "shrapnel" => {
                    let joined = tokens[1..].join(" ");
                    let parts = split_vector(&joined);
                    if parts.len() != 3 {
                        return Err(doc.format_error(format!("expected 3 shrapnel components, found {}", parts.len())));
                    }
                    map.shrapnel = Some([
                        doc.parse_token(parts[0])?,
                        doc.parse_token(parts[1])?,
                        doc.parse_token(parts[2])?,
                    ]);
                }
                "localise" => map.localisation = Some(read_single_token(doc, &tokens)?),
                "paint" => map.paint = Some(read_tagged(doc, &tokens)?),
                "material_map_product_id" => {
                    let id = read_single_token(doc, &tokens)?;
                    map.product_id = doc.parse_token(&id)?;
                }
                _ => match paint_fibre_slot(&key) {
                    Some(slot) => map.paint_fibre_damage[slot] = Some(read_tagged(doc, &tokens)?),
                    None => return Err(unknown_field("MaterialMap", key)),
                },
            }
        }

        Ok(map)
    }

    fn write(&self, out: &mut SectionWriter) {
        out.header(Self::SECTION);
        out.line(&self.name);

        if let Some(shrapnel) = &self.shrapnel {
            out.field("shrapnel", format_vec3(shrapnel));
        }
        out.field_opt("localise", self.localisation.as_ref());
        if let Some(paint) = &self.paint {
            out.field("paint", format!("{} {}", paint.tag, paint.value));
        }
        out.field_nonzero_i32("material_map_product_id", self.product_id);
        for (i, damage) in self.paint_fibre_damage.iter().enumerate() {
            if let Some(damage) = damage {
                out.field(
                    &format!("paintfiberdam_{}", i + 1),
                    format!("{} {}", damage.tag, damage.value),
                );
            }
        }

        out.end_section();
    }
}

// ============================================================================
// Wheel maps
// ============================================================================

/// A `[wheel_map]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WheelMap {
    pub name: String,
    pub localisation: Option<String>,
    pub wheels: WheelFolders,
}

impl SectionRecord for WheelMap {
    const SECTION: &'static str = "wheel_map";

    fn read(doc: &mut DocumentCursor) -> Result<Self, ParseError> {
        let mut map = WheelMap {
            name: doc.expect_line("wheel map name")?,
            ..Default::default()
        };

        while !doc.at_record_end() {
            let (key, value) = doc.read_key_value()?;
            if key == "localise" {
                map.localisation = Some(value);
            } else if !map.wheels.apply(&key, &value) {
                return Err(unknown_field("WheelMap", key));
            }
        }

        Ok(map)
    }

    fn write(&self, out: &mut SectionWriter) {
        out.header(Self::SECTION);
        out.line(&self.name);
        out.field_opt("localise", self.localisation.as_ref());
        self.wheels.write_fields(out);
        out.end_section();
    }
}

// ============================================================================
// Suspension and stats
// ============================================================================

/// The `[suspension_factors]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuspensionFactors {
    pub max_compression: f32,
    pub ride_height: f32,
    pub max_steering_lock: i32,
    pub max_extension: f32,
}

impl SectionRecord for SuspensionFactors {
    const SECTION: &'static str = "suspension_factors";

    fn read(doc: &mut DocumentCursor) -> Result<Self, ParseError> {
        let mut factors = Self::default();

        while !doc.at_record_end() {
            let (key, value) = doc.read_key_value()?;
            match key.as_str() {
                "max_compression" => factors.max_compression = doc.parse_token(&value)?,
                "ride_height" => factors.ride_height = doc.parse_token(&value)?,
                "max_steering_lock" => factors.max_steering_lock = doc.parse_token(&value)?,
                "max_extension" => factors.max_extension = doc.parse_token(&value)?,
                _ => return Err(unknown_field("SuspensionFactors", key)),
            }
        }

        Ok(factors)
    }

    fn write(&self, out: &mut SectionWriter) {
        out.header(Self::SECTION);
        out.field_nonzero_f32("max_compression", self.max_compression);
        out.field_nonzero_f32("ride_height", self.ride_height);
        out.field_nonzero_i32("max_steering_lock", self.max_steering_lock);
        out.field_nonzero_f32("max_extension", self.max_extension);
        out.end_section();
    }
}

/// Unlock level value meaning "not set".
pub const UNSET_UNLOCK_LEVEL: f32 = -1.0;

/// The `[stats]` section: positional values, one per line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub top_speed: i32,
    pub time: f32,
    pub weight: f32,
    pub toughness: f32,
    pub unlock_level: f32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            top_speed: 0,
            time: 0.0,
            weight: 0.0,
            toughness: 0.0,
            unlock_level: UNSET_UNLOCK_LEVEL,
        }
    }
}

impl SectionRecord for Stats {
    const SECTION: &'static str = "stats";

    fn read(doc: &mut DocumentCursor) -> Result<Self, ParseError> {
        let mut stats = Stats {
            top_speed: doc.read_int()?,
            time: doc.read_float()?,
            weight: doc.read_float()?,
            toughness: doc.read_float()?,
            ..Default::default()
        };
        if !doc.at_record_end() {
            stats.unlock_level = doc.read_float()?;
        }
        Ok(stats)
    }

    fn write(&self, out: &mut SectionWriter) {
        out.header(Self::SECTION);
        out.line(&format!(
            "{}// top speed; they must be in this order and not have spaces before the comments",
            self.top_speed
        ));
        out.line(&format!("{}// time 0 -60", self.time));
        out.line(&format!("{}// weight", self.weight));
        out.line(&format!("{}// toughness", self.toughness));
        if self.unlock_level != UNSET_UNLOCK_LEVEL {
            out.line(&format!("{}// unlock level", self.unlock_level));
        }
        out.end_section();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: SectionRecord>(text: &str) -> String {
        let mut doc = DocumentCursor::new(text);
        let header = doc.read_first_line().unwrap();
        assert_eq!(header, format!("[{}]", T::SECTION));
        let record = T::read(&mut doc).unwrap();
        assert!(doc.eof());
        let mut out = SectionWriter::new();
        record.write(&mut out);
        out.finish()
    }

    fn read<T: SectionRecord>(text: &str) -> Result<T, ParseError> {
        let mut doc = DocumentCursor::new(text);
        doc.read_first_line();
        T::read(&mut doc)
    }

    #[test]
    fn test_wheel_folders_collapse() {
        let mut wheels = WheelFolders::default();
        wheels.set_all("x");
        let mut out = SectionWriter::new();
        wheels.write_fields(&mut out);
        assert_eq!(out.finish(), "wheel_folder_name x\n");

        wheels.rr = Some("y".to_string());
        let mut out = SectionWriter::new();
        wheels.write_fields(&mut out);
        assert_eq!(
            out.finish(),
            "fl_wheel_folder_name x\nfr_wheel_folder_name x\nrl_wheel_folder_name x\nrr_wheel_folder_name y\n"
        );
    }

    #[test]
    fn test_wheel_folders_skip_unset_corner() {
        let mut wheels = WheelFolders::default();
        wheels.fl = Some("a".to_string());
        wheels.fr = Some("a".to_string());
        wheels.rl = Some("b".to_string());
        let mut out = SectionWriter::new();
        wheels.write_fields(&mut out);
        assert_eq!(
            out.finish(),
            "fl_wheel_folder_name a\nfr_wheel_folder_name a\nrl_wheel_folder_name b\n"
        );
    }

    #[test]
    fn test_wheel_folder_extra_slots() {
        let mut wheels = WheelFolders::default();
        assert!(wheels.apply("D4_wheel_folder_name", "a"));
        assert!(wheels.apply("D11_wheel_folder_name", "b"));
        assert!(!wheels.apply("D12_wheel_folder_name", "c"));
        assert!(!wheels.apply("D3_wheel_folder_name", "c"));
        assert_eq!(wheels.extra[0].as_deref(), Some("a"));
        assert_eq!(wheels.extra[7].as_deref(), Some("b"));
    }

    #[test]
    fn test_attachment_round_trips() {
        let texts = [
            "[attachment]\nComplicatedWheels\nwheel_folder_name eagle_wheels\n\n",
            "[attachment]\nComplicatedWheels\nfl_wheel_folder_name a\nfr_wheel_folder_name a\nrl_wheel_folder_name b\nrr_wheel_folder_name b\n\n",
            "[attachment]\nDynamicsFmodEngine\nengine eagle_v8\nrpmsmooth 0.2\nonloadsmooth 0.05\nmax_revs 7000\nloadmin 0.1\n\n",
            "[attachment]\nDynamicsWheels\n\n",
            "[attachment]\nExhaustParticles\nvfx exhaust_smoke\nanchor exhaust_l\nmultiplier 1.5\n\n",
            "[attachment]\nHorn\nevent horn_truck\n\n",
            "[attachment]\nReverseLightSound\nevent reverse_beep\n\n",
            "[attachment]\nContinuousSound\nsound siren\nlump bodywork\n\n",
        ];
        for text in texts {
            assert_eq!(round_trip::<Attachment>(text), text);
        }
    }

    #[test]
    fn test_attachment_unknown_field() {
        let err = read::<Attachment>("[attachment]\nDynamicsFmodEngine\nturbo yes\n").unwrap_err();
        match err {
            ParseError::UnknownField { record, key } => {
                assert_eq!(record, "DynamicsFmodEngine");
                assert_eq!(key, "turbo");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_attachment_unknown_kind() {
        let err = read::<Attachment>("[attachment]\nJetPack\n").unwrap_err();
        assert!(matches!(err, ParseError::UnknownKind { record: "attachment", .. }));
    }

    #[test]
    fn test_wheel_module_round_trips() {
        let texts = [
            "[wheel_module]\nSkidMarks\nimage skid_tarmac\n\n",
            "[wheel_module]\nSkidMarks\nimage skid_tarmac\nonly_trails\n\n",
            "[wheel_module]\nSkidNoise\nsounds skid_loop\n\n",
            "[wheel_module]\nSkidNoise\nuse_scrape_sounds\nscrape_sound_index 2\nvolume 80\n\n",
            "[wheel_module]\nTyreParticles\nvfx tyre_smoke\n\n",
        ];
        for text in texts {
            assert_eq!(round_trip::<WheelModule>(text), text);
        }
    }

    #[test]
    fn test_skid_marks_rewinds_onto_next_section() {
        let mut doc = DocumentCursor::new("[wheel_module]\nSkidMarks\nimage a\n[stats]\n");
        doc.read_first_line();
        let module = WheelModule::read(&mut doc).unwrap();
        assert_eq!(module, WheelModule::SkidMarks { image: "a".to_string(), only_trails: false });
        assert_eq!(doc.read_next_line().as_deref(), Some("[stats]"));
    }

    #[test]
    fn test_tyre_smoke_alias() {
        let module = read::<WheelModule>("[wheel_module]\nTyreSmokeVFX\nvfx smoke\n").unwrap();
        assert_eq!(module, WheelModule::TyreParticles { vfx: "smoke".to_string() });
    }

    #[test]
    fn test_material_map_round_trip() {
        let text = "[material_map]\nred\nshrapnel 1,0,0.5\nlocalise FE_PAINT_RED\npaint 0 red_paint\nmaterial_map_product_id 12\npaintfiberdam_1 0 dam_a\npaintfiberdam_5 0 dam_e\n\n";
        assert_eq!(round_trip::<MaterialMap>(text), text);
    }

    #[test]
    fn test_material_map_keys_are_case_insensitive() {
        let map = read::<MaterialMap>("[material_map]\nblue\nLocalise FE_BLUE\nPaintFiberDam_3 1 dam\n").unwrap();
        assert_eq!(map.localisation.as_deref(), Some("FE_BLUE"));
        assert_eq!(map.paint_fibre_damage[2], Some(TaggedValue { tag: "1".to_string(), value: "dam".to_string() }));
    }

    #[test]
    fn test_material_map_unknown_field() {
        let err = read::<MaterialMap>("[material_map]\nblue\nglitter 1\n").unwrap_err();
        assert!(matches!(err, ParseError::UnknownField { record: "MaterialMap", .. }));
    }

    #[test]
    fn test_wheel_map_round_trip() {
        let text = "[wheel_map]\nstock\nlocalise FE_WHEELS_STOCK\nwheel_folder_name stock_wheels\nD4_wheel_folder_name stock_d4\ngarage_set stock_garage\n\n";
        assert_eq!(round_trip::<WheelMap>(text), text);
    }

    #[test]
    fn test_suspension_round_trip() {
        let text = "[suspension_factors]\nmax_compression 0.3\nride_height 0.12\nmax_steering_lock 35\nmax_extension 0.2\n\n";
        assert_eq!(round_trip::<SuspensionFactors>(text), text);
    }

    #[test]
    fn test_stats_round_trip() {
        let text = "[stats]\n180// top speed; they must be in this order and not have spaces before the comments\n4.5// time 0 -60\n1500// weight\n0.8// toughness\n\n";
        assert_eq!(round_trip::<Stats>(text), text);

        let with_unlock = "[stats]\n180// top speed; they must be in this order and not have spaces before the comments\n4.5// time 0 -60\n1500// weight\n0.8// toughness\n3// unlock level\n\n";
        assert_eq!(round_trip::<Stats>(with_unlock), with_unlock);
    }

    #[test]
    fn test_stats_unlock_defaults_to_unset() {
        let stats = read::<Stats>("[stats]\n200\n3.9\n1200\n0.5\n[small_driver]\n").unwrap();
        assert_eq!(stats.top_speed, 200);
        assert_eq!(stats.unlock_level, UNSET_UNLOCK_LEVEL);
    }

    #[test]
    fn test_stats_missing_values() {
        let err = read::<Stats>("[stats]\n200\n3.9\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEndOfInput(_)));
    }
}
