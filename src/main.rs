use clap::{Parser, Subcommand};
use crformats::mt2::Mt2;
use crformats::setup::{VehicleSetup, WriteOptions, SETUP_FILE_NAME};
use log::{debug, info};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a vehicle setup file and print or rewrite it
    Setup {
        /// Input vehicle_setup.cfg
        input: PathBuf,

        /// Directory to write a normalized vehicle_setup.cfg into
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the parsed setup as JSON
        #[arg(long)]
        json: bool,

        /// Only write the sections older tools understand
        #[arg(long)]
        legacy_layout: bool,
    },

    /// Show information about an MT2 material
    Material {
        /// Input .mt2 file
        input: PathBuf,

        /// Print the parsed material as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate setup and material files
    Validate {
        /// Input file or directory
        input: PathBuf,

        /// Recursive directory validation
        #[arg(short, long)]
        recursive: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match &cli.command {
        Commands::Setup {
            input,
            output,
            json,
            legacy_layout,
        } => {
            let options = if *legacy_layout {
                WriteOptions::legacy()
            } else {
                WriteOptions::default()
            };
            setup_command(input, output.as_deref(), *json, &options)?;
        }
        Commands::Material { input, json } => {
            material_command(input, *json)?;
        }
        Commands::Validate { input, recursive } => {
            validate_command(input, *recursive)?;
        }
    }

    Ok(())
}

fn setup_command(
    input: &Path,
    output: Option<&Path>,
    json: bool,
    options: &WriteOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let setup = VehicleSetup::load(input)?;
    info!("read {}", input.display());

    if json {
        println!("{}", serde_json::to_string_pretty(&setup)?);
    } else if output.is_none() {
        print!("{}", setup.to_text(options));
    }

    if let Some(dir) = output {
        std::fs::create_dir_all(dir)?;
        let path = setup.save(dir, options)?;
        println!("✓ Wrote {}", path.display());
    }

    Ok(())
}

fn material_command(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let material = Mt2::load(input)?
        .ok_or_else(|| format!("{}: base material could not be built", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&material)?);
        return Ok(());
    }

    println!("=== Material Information ===");
    println!("File: {}", input.display());
    if let Some(base) = &material.base {
        println!("Based off: {}", base.name());
    }
    if let Some(diffuse) = &material.diffuse_colour {
        println!("Diffuse: {}", diffuse);
    }
    if let Some(substance) = &material.substance {
        println!("Substance: {}", substance);
    }
    if let Some(m) = material.multiplier {
        println!("Multiplier: {} {} {}", m[0], m[1], m[2]);
    }
    println!();

    println!("=== Textures ===");
    for (alias, file) in &material.textures {
        println!("  {}: {}", alias, file);
    }
    println!("Texture coordinate sources: {}", material.texture_coord_sources.len());
    println!("Samplers: {}", material.samplers.len());

    Ok(())
}

fn validate_command(input: &Path, recursive: bool) -> Result<(), Box<dyn std::error::Error>> {
    if input.is_dir() {
        if !recursive {
            return Err("Input is a directory but --recursive is not specified".into());
        }
        validate_directory(input)?;
    } else {
        validate_single_file(input)?;
        println!("✓ {}", input.display());
    }
    Ok(())
}

fn is_validated_file(path: &Path) -> bool {
    path.file_name().and_then(|s| s.to_str()) == Some(SETUP_FILE_NAME)
        || path.extension().and_then(|s| s.to_str()) == Some("mt2")
}

fn validate_directory(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut total = 0;
    let mut valid = 0;
    let mut invalid = 0;

    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || !is_validated_file(path) {
            continue;
        }
        total += 1;
        match validate_single_file(path) {
            Ok(()) => {
                valid += 1;
                debug!("✓ {}", path.display());
            }
            Err(e) => {
                invalid += 1;
                eprintln!("✗ {}: {}", path.display(), e);
            }
        }
    }

    println!("\n=== Validation Summary ===");
    println!("Total files: {}", total);
    println!("Valid: {}", valid);
    println!("Invalid: {}", invalid);

    if invalid > 0 {
        return Err(format!("{} file(s) failed validation", invalid).into());
    }

    Ok(())
}

fn validate_single_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.extension().and_then(|s| s.to_str()) == Some("mt2") {
        if Mt2::load(path)?.is_none() {
            return Err("base material could not be built".into());
        }
    } else {
        VehicleSetup::load(path)?;
    }
    Ok(())
}
