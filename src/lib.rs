//! # crformats
//!
//! A Rust library for reading and writing Carmageddon: Reincarnation vehicle
//! content formats.
//!
//! This library provides support for:
//! - **Vehicle setup** (`vehicle_setup.cfg`): Section-based text describing drivers,
//!   attachments, wheel modules, material maps, suspension and stats
//! - **Code blocks**: Schema-driven `prefix:Set_name( args )` call text
//! - **MT2 materials**: XML material definitions and their base materials
//!
//! ## Quick Start
//!
//! ```no_run
//! use crformats::setup::{VehicleSetup, WriteOptions};
//!
//! let mut setup = VehicleSetup::load("vehicle_setup.cfg")?;
//! setup.stats.top_speed = 200;
//!
//! let path = setup.save("out", &WriteOptions::default())?;
//! println!("wrote {}", path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Code Blocks
//!
//! ```
//! use crformats::codeblock::{CodeBlock, MethodKind, Parameter};
//!
//! let mut block = CodeBlock::new("car");
//! block.add_method(MethodKind::Set, "mass", vec![Parameter::float("mass")]);
//! block.parse_text("car:Set_mass( 1400.5 )")?;
//!
//! assert_eq!(block.to_text(), "car:Set_mass( 1400.5 )");
//! # Ok::<(), crformats::codeblock::CodeBlockError>(())
//! ```
//!
//! ## Materials
//!
//! ```no_run
//! use crformats::mt2::Mt2;
//!
//! // None means the material names a base material that could not be built
//! if let Some(material) = Mt2::load("body.mt2")? {
//!     println!("diffuse: {:?}", material.diffuse_colour);
//! }
//! # Ok::<(), crformats::mt2::MaterialError>(())
//! ```

pub mod cursor;
pub mod writer;
pub mod records;
pub mod setup;
pub mod codeblock;
pub mod mt2;

pub use codeblock::CodeBlock;
pub use cursor::{DocumentCursor, ParseError};
pub use mt2::Mt2;
pub use setup::{VehicleSetup, WriteOptions};
