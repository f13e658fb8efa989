//! The vehicle setup document (`vehicle_setup.cfg`).

use crate::cursor::{DocumentCursor, ParseError, Vec3};
use crate::records::{
    Attachment, MaterialMap, SectionRecord, Stats, SuspensionFactors, WheelMap, WheelModule,
};
use crate::writer::{format_vec3, SectionWriter};
use log::debug;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// File name used when saving a setup into a directory.
pub const SETUP_FILE_NAME: &str = "vehicle_setup.cfg";

/// Every section header a setup file may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    DefaultDriver,
    DriverSuffix,
    Attachment,
    WheelModule,
    SuspensionFactors,
    AiScript,
    MaterialMap,
    WheelMap,
    DisableEjection,
    Stats,
    DecalPoints,
    InCarCamOffset,
    GarageCameraOffset,
    SmallDriver,
    HumanTrailer,
    AiTrailer,
    MpTrailer,
}

impl Section {
    pub const ALL: [Section; 17] = [
        Section::DefaultDriver,
        Section::DriverSuffix,
        Section::Attachment,
        Section::WheelModule,
        Section::SuspensionFactors,
        Section::AiScript,
        Section::MaterialMap,
        Section::WheelMap,
        Section::DisableEjection,
        Section::Stats,
        Section::DecalPoints,
        Section::InCarCamOffset,
        Section::GarageCameraOffset,
        Section::SmallDriver,
        Section::HumanTrailer,
        Section::AiTrailer,
        Section::MpTrailer,
    ];

    /// Header name without brackets.
    pub fn name(self) -> &'static str {
        match self {
            Section::DefaultDriver => "default_driver",
            Section::DriverSuffix => "driver_suffix",
            Section::Attachment => Attachment::SECTION,
            Section::WheelModule => WheelModule::SECTION,
            Section::SuspensionFactors => SuspensionFactors::SECTION,
            Section::AiScript => "ai_script",
            Section::MaterialMap => MaterialMap::SECTION,
            Section::WheelMap => WheelMap::SECTION,
            Section::DisableEjection => "disable_ejection",
            Section::Stats => Stats::SECTION,
            Section::DecalPoints => "decal_points",
            Section::InCarCamOffset => "in_car_cam_offset",
            Section::GarageCameraOffset => "garage_camera_offset",
            Section::SmallDriver => "small_driver",
            Section::HumanTrailer => "Human_Trailer",
            Section::AiTrailer => "AI_Trailer",
            Section::MpTrailer => "MP_Trailer",
        }
    }

    /// Matches a full `[name]` header line.
    pub fn from_header(line: &str) -> Option<Section> {
        let name = line.strip_prefix('[')?.strip_suffix(']')?;
        Section::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// Controls which sections [`VehicleSetup::to_text`] emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Also write the sections outside the canonical seven when they hold
    /// non-default values.
    pub extended_sections: bool,
}

impl WriteOptions {
    /// Only default_driver, attachments, wheel modules, suspension factors,
    /// material maps, wheel maps and stats.
    pub fn legacy() -> Self {
        Self {
            extended_sections: false,
        }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            extended_sections: true,
        }
    }
}

/// A parsed vehicle setup file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSetup {
    pub drivers: Vec<String>,
    pub driver_suffix: Option<String>,
    pub ai_script: Option<String>,
    pub eject_driver: bool,
    pub in_car_cam_offset: Vec3,
    pub garage_camera_offset: Vec3,
    pub attachments: Vec<Attachment>,
    pub wheel_modules: Vec<WheelModule>,
    pub material_maps: Vec<MaterialMap>,
    pub wheel_maps: Vec<WheelMap>,
    pub decal_points: Vec<Vec3>,
    pub suspension_factors: Option<SuspensionFactors>,
    pub stats: Stats,
    pub small_driver: bool,
    pub human_trailers: Vec<String>,
    pub ai_trailers: Vec<String>,
    pub mp_trailers: Vec<String>,
}

impl Default for VehicleSetup {
    fn default() -> Self {
        Self {
            drivers: Vec::new(),
            driver_suffix: None,
            ai_script: None,
            eject_driver: true,
            in_car_cam_offset: [0.0; 3],
            garage_camera_offset: [0.0; 3],
            attachments: Vec::new(),
            wheel_modules: Vec::new(),
            material_maps: Vec::new(),
            wheel_maps: Vec::new(),
            decal_points: Vec::new(),
            suspension_factors: None,
            stats: Stats::default(),
            small_driver: false,
            human_trailers: Vec::new(),
            ai_trailers: Vec::new(),
            mp_trailers: Vec::new(),
        }
    }
}

fn read_lines_until_section(doc: &mut DocumentCursor, into: &mut Vec<String>) {
    while !doc.at_record_end() {
        if let Some(line) = doc.read_next_line() {
            into.push(line);
        }
    }
}

impl VehicleSetup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(content: &str) -> Result<Self, ParseError> {
        Self::read(&mut DocumentCursor::new(content))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        debug!("loading {}", path.display());
        Self::read(&mut DocumentCursor::from_path(path)?)
    }

    /// Dispatches every section of the document to its reader.
    pub fn read(doc: &mut DocumentCursor) -> Result<Self, ParseError> {
        let mut setup = VehicleSetup::new();
        let mut line = doc.read_first_line();

        while let Some(header) = line {
            let section = Section::from_header(&header)
                .ok_or_else(|| ParseError::UnknownSection(header.clone()))?;
            debug!("line {}: {}", doc.line_number(), header);

            match section {
                Section::DefaultDriver => read_lines_until_section(doc, &mut setup.drivers),
                Section::DriverSuffix => {
                    setup.driver_suffix = Some(doc.expect_line("driver suffix")?)
                }
                Section::Attachment => setup.attachments.push(Attachment::read(doc)?),
                Section::WheelModule => setup.wheel_modules.push(WheelModule::read(doc)?),
                Section::SuspensionFactors => {
                    setup.suspension_factors = Some(SuspensionFactors::read(doc)?)
                }
                Section::AiScript => setup.ai_script = Some(doc.expect_line("ai script")?),
                Section::MaterialMap => setup.material_maps.push(MaterialMap::read(doc)?),
                Section::WheelMap => setup.wheel_maps.push(WheelMap::read(doc)?),
                Section::DisableEjection => setup.eject_driver = false,
                Section::Stats => setup.stats = Stats::read(doc)?,
                Section::DecalPoints => {
                    while !doc.at_record_end() {
                        setup.decal_points.push(doc.read_vector3()?);
                    }
                }
                Section::InCarCamOffset => setup.in_car_cam_offset = doc.read_vector3()?,
                Section::GarageCameraOffset => setup.garage_camera_offset = doc.read_vector3()?,
                Section::SmallDriver => setup.small_driver = true,
                Section::HumanTrailer => read_lines_until_section(doc, &mut setup.human_trailers),
                Section::AiTrailer => read_lines_until_section(doc, &mut setup.ai_trailers),
                Section::MpTrailer => read_lines_until_section(doc, &mut setup.mp_trailers),
            }

            line = doc.read_next_line();
        }

        Ok(setup)
    }

    pub fn to_text(&self, options: &WriteOptions) -> String {
        let mut out = SectionWriter::new();

        if !self.drivers.is_empty() {
            out.header(Section::DefaultDriver.name());
            for driver in &self.drivers {
                out.line(driver);
            }
            out.end_section();
        }

        for attachment in &self.attachments {
            attachment.write(&mut out);
        }
        for module in &self.wheel_modules {
            module.write(&mut out);
        }
        if let Some(factors) = &self.suspension_factors {
            factors.write(&mut out);
        }
        for map in &self.material_maps {
            map.write(&mut out);
        }
        for map in &self.wheel_maps {
            map.write(&mut out);
        }
        self.stats.write(&mut out);

        if options.extended_sections {
            self.write_extended(&mut out);
        }

        out.finish()
    }

    fn write_extended(&self, out: &mut SectionWriter) {
        let single = |out: &mut SectionWriter, section: Section, value: &str| {
            out.header(section.name());
            out.line(value);
            out.end_section();
        };

        if let Some(suffix) = &self.driver_suffix {
            single(out, Section::DriverSuffix, suffix);
        }
        if let Some(script) = &self.ai_script {
            single(out, Section::AiScript, script);
        }
        if !self.eject_driver {
            out.header(Section::DisableEjection.name());
            out.end_section();
        }
        if self.small_driver {
            out.header(Section::SmallDriver.name());
            out.end_section();
        }
        if self.in_car_cam_offset != [0.0; 3] {
            single(out, Section::InCarCamOffset, &format_vec3(&self.in_car_cam_offset));
        }
        if self.garage_camera_offset != [0.0; 3] {
            single(out, Section::GarageCameraOffset, &format_vec3(&self.garage_camera_offset));
        }
        if !self.decal_points.is_empty() {
            out.header(Section::DecalPoints.name());
            for point in &self.decal_points {
                out.line(&format_vec3(point));
            }
            out.end_section();
        }

        for (section, trailers) in [
            (Section::HumanTrailer, &self.human_trailers),
            (Section::AiTrailer, &self.ai_trailers),
            (Section::MpTrailer, &self.mp_trailers),
        ] {
            if !trailers.is_empty() {
                out.header(section.name());
                for trailer in trailers {
                    out.line(trailer);
                }
                out.end_section();
            }
        }
    }

    /// Writes the whole document to `dir/vehicle_setup.cfg` and returns that path.
    pub fn save(&self, dir: impl AsRef<Path>, options: &WriteOptions) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(SETUP_FILE_NAME);
        std::fs::write(&path, self.to_text(options))?;
        debug!("saved {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::WheelFolders;

    const CANONICAL: &str = "\
[default_driver]
max_damage

[attachment]
DynamicsFmodEngine
engine eagle_v8
rpmsmooth 0.2

[attachment]
ComplicatedWheels
wheel_folder_name eagle_wheels

[wheel_module]
SkidMarks
image skid_tarmac
only_trails

[suspension_factors]
max_compression 0.3
ride_height 0.12

[material_map]
red
localise FE_RED
paint 0 red_paint

[wheel_map]
stock
localise FE_STOCK
wheel_folder_name stock_wheels

[stats]
180// top speed; they must be in this order and not have spaces before the comments
4.5// time 0 -60
1500// weight
0.8// toughness
2// unlock level

";

    const EXTENDED: &str = "\
[driver_suffix]
_b

[ai_script]
ai_aggressive

[disable_ejection]

[small_driver]

[in_car_cam_offset]
0,0.5,-0.25

[garage_camera_offset]
1,2,3

[decal_points]
0,1,2
3,4,5

[Human_Trailer]
trailer_a

[AI_Trailer]
trailer_b
trailer_c

[MP_Trailer]
trailer_d

";

    #[test]
    fn test_canonical_round_trip() {
        let setup = VehicleSetup::parse(CANONICAL).unwrap();
        assert_eq!(setup.to_text(&WriteOptions::default()), CANONICAL);
        assert_eq!(setup.to_text(&WriteOptions::legacy()), CANONICAL);
    }

    #[test]
    fn test_extended_round_trip() {
        let text = format!("{}{}", CANONICAL, EXTENDED);
        let setup = VehicleSetup::parse(&text).unwrap();
        assert_eq!(setup.to_text(&WriteOptions::default()), text);
        assert_eq!(setup.to_text(&WriteOptions::legacy()), CANONICAL);
    }

    #[test]
    fn test_parsed_values() {
        let text = format!("{}{}", CANONICAL, EXTENDED);
        let setup = VehicleSetup::parse(&text).unwrap();

        assert_eq!(setup.drivers, vec!["max_damage".to_string()]);
        assert_eq!(setup.driver_suffix.as_deref(), Some("_b"));
        assert!(!setup.eject_driver);
        assert!(setup.small_driver);
        assert_eq!(setup.attachments.len(), 2);
        let mut wheels = WheelFolders::default();
        wheels.set_all("eagle_wheels");
        assert_eq!(setup.attachments[1], Attachment::ComplicatedWheels(wheels));
        assert_eq!(setup.in_car_cam_offset, [0.0, 0.5, -0.25]);
        assert_eq!(setup.decal_points, vec![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        assert_eq!(setup.ai_trailers.len(), 2);
        assert_eq!(setup.stats.unlock_level, 2.0);
    }

    #[test]
    fn test_defaults() {
        let setup = VehicleSetup::parse("").unwrap();
        assert!(setup.eject_driver);
        assert!(!setup.small_driver);
        assert_eq!(setup.in_car_cam_offset, [0.0; 3]);
        assert_eq!(setup, VehicleSetup::default());
    }

    #[test]
    fn test_unknown_section_fails() {
        let err = VehicleSetup::parse("[default_driver]\nmax\n[bogus]\nvalue\n").unwrap_err();
        match err {
            ParseError::UnknownSection(header) => assert_eq!(header, "[bogus]"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_stray_line_between_sections_fails() {
        let err = VehicleSetup::parse("[disable_ejection]\nsurprise\n").unwrap_err();
        assert!(matches!(err, ParseError::UnknownSection(_)));
    }

    #[test]
    fn test_section_table() {
        for section in Section::ALL {
            let header = format!("[{}]", section.name());
            assert_eq!(Section::from_header(&header), Some(section));
        }
        assert_eq!(Section::from_header("default_driver"), None);
    }

    #[test]
    fn test_save_writes_fixed_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let setup = VehicleSetup::parse(CANONICAL).unwrap();
        let path = setup.save(dir.path(), &WriteOptions::default()).unwrap();
        assert_eq!(path, dir.path().join(SETUP_FILE_NAME));

        let reloaded = VehicleSetup::load(&path).unwrap();
        assert_eq!(reloaded, setup);
    }
}
