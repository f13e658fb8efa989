//! Basic example: Read a vehicle setup file
//!
//! This example shows how to read a `vehicle_setup.cfg` and access its records.

use crformats::records::{Attachment, WheelModule};
use crformats::setup::VehicleSetup;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <vehicle_setup.cfg>", args[0]);
        eprintln!("\nExample:");
        eprintln!("  cargo run --example read_setup -- path/to/vehicle_setup.cfg");
        std::process::exit(1);
    }

    let path = &args[1];
    println!("Reading setup file: {}", path);

    let setup = VehicleSetup::load(path)?;

    println!("\n=== Drivers ===");
    for driver in &setup.drivers {
        println!("  - {}", driver);
    }

    println!("\n=== Attachments ===");
    for attachment in &setup.attachments {
        match attachment {
            Attachment::Horn { event } => println!("  - Horn ({})", event),
            other => println!("  - {}", other.kind_name()),
        }
    }

    println!("\n=== Wheel Modules ===");
    for module in &setup.wheel_modules {
        if let WheelModule::SkidMarks { image, .. } = module {
            println!("  - SkidMarks ({})", image);
        } else {
            println!("  - {}", module.kind_name());
        }
    }

    println!("\n=== Stats ===");
    println!("Top speed: {}", setup.stats.top_speed);
    println!("Weight: {}", setup.stats.weight);

    println!("\n✓ Successfully read setup file");
    Ok(())
}
