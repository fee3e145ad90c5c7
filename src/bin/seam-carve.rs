use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use seam_carving::{default_output_path, process_file, CarveOptions, CarveVariant};

#[derive(Parser)]
#[command(
    name = "seam-carve",
    about = "Content-aware image resizing via seam carving",
    version,
    after_help = "Simple usage: seam-carve -c 100 photo.jpg  (writes photo_carved.jpg)\n\n\
                  Carving removes vertical seams only: the output keeps its height\n\
                  and loses one column of width per seam."
)]
struct Cli {
    /// Input image file
    input: String,

    /// Output file (default: {name}_carved.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Number of seams to remove
    #[arg(short, long, default_value = "100")]
    crop: u32,

    /// Suppress progress output
    #[arg(short, long)]
    silent: bool,

    /// Rebuild the energy field from scratch for every seam
    #[arg(short = 'O', long)]
    non_optimized: bool,

    /// Protection mask image; its bright pixels are carved out first
    #[arg(short, long)]
    mask: Option<String>,

    /// Write a copy of the input with the removed seams painted red
    #[arg(long)]
    seam_overlay: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    if cli.mask.is_some() && cli.non_optimized {
        eprintln!("Error: --mask requires the optimized engine; drop --non-optimized");
        process::exit(1);
    }

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    let variant = if cli.non_optimized {
        CarveVariant::FullRebuild
    } else {
        CarveVariant::Incremental
    };
    let options = CarveOptions {
        crop: cli.crop,
        variant,
        mask: cli.mask.map(PathBuf::from),
        seam_overlay: cli.seam_overlay.map(PathBuf::from),
        silent: cli.silent,
    };

    let output = cli.output.map(PathBuf::from);
    let output_path = output
        .clone()
        .unwrap_or_else(|| default_output_path(input_path));

    if !options.silent {
        let engine = if cli.non_optimized {
            "full-rebuild"
        } else {
            "incremental"
        };
        eprintln!("Carving {} seams from {} ({engine} engine)", options.crop, cli.input);
    }

    match process_file(input_path, output.as_deref(), &options) {
        Ok(summary) => {
            if !options.silent {
                eprintln!(
                    "[OK] {} {}x{} -> {}x{} -> {}",
                    cli.input,
                    summary.original_width,
                    summary.height,
                    summary.final_width,
                    summary.height,
                    output_path.display()
                );
            }
        }
        Err(e) => {
            eprintln!("[FAIL] {}: {e}", cli.input);
            process::exit(1);
        }
    }
}
