//! Example: Build a code block
//!
//! This example declares a block schema, fills it in from code and from text,
//! and prints the resulting calls.

use crformats::codeblock::{BlockSchema, CodeBlock, MethodKind, Parameter};
use std::error::Error;

struct Structure;

impl BlockSchema for Structure {
    fn declare() -> CodeBlock {
        let mut block = CodeBlock::new("structure");
        block.add_method(MethodKind::Set, "mass", vec![Parameter::float("mass")]);
        block.add_method(
            MethodKind::Add,
            "weld",
            vec![
                Parameter::string("part").with_pretty_name("Welded part"),
                Parameter::float("strength"),
            ],
        );
        block.add_method(
            MethodKind::Set,
            "crushable",
            vec![Parameter::boolean("enabled").forced()],
        );
        block
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("Declaring a structure block...");
    let mut block = Structure::declare();

    block.set_parameter("mass", "mass", 1250.0f32)?;
    block.set_parameter("weld", "part", "bonnet")?;
    block.set_parameter("weld", "strength", 0.75f32)?;
    // A second assignment to an Add method creates another call
    block.set_parameter("weld", "part", "boot")?;
    block.set_parameter("weld", "strength", -0.125f32)?;

    println!("\n=== Built from code ===");
    println!("{}", block);

    let text = "structure:Set_mass( 900 )\nstructure:Add_weld( \"door_l\", 1 )\n";
    let parsed = crformats::codeblock::parse::<Structure>(text)?;

    println!("\n=== Parsed from text ===");
    println!("{}", parsed);

    if let Some(mass) = parsed.method("mass").and_then(|m| m.parameter("mass")) {
        println!("\nmass = {}", mass.formatted_value());
    }

    Ok(())
}
