//! vcad-quote CLI - print quotes for STL files
//!
//! Quotes a part, checks whether it needs supports, or finds its best print
//! orientation. Logging goes to stderr and is controlled by `RUST_LOG`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vcad_quote::{
    analyze, detect_supports, optimize_orientation, AnalysisRequest, AnalysisResult,
    InMemoryDataSource, OverhangSettings, QuoteDataSource, QuoteSettings,
};
use vcad_quote_mesh::{parse_stl, write_binary_stl};

#[derive(Parser)]
#[command(name = "vcad-quote")]
#[command(about = "Estimate 3D print cost and time from STL files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote an STL file
    Analyze {
        /// Input STL file (binary or ASCII)
        file: PathBuf,
        /// Settings and calibration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Material name
        #[arg(short, long, default_value = "PLA")]
        material: String,
        /// Number of units
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// Print with supports
        #[arg(long)]
        supports: bool,
        /// Keep the uploaded orientation
        #[arg(long)]
        no_orient: bool,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check whether an STL file needs supports
    Supports {
        /// Input STL file
        file: PathBuf,
        /// Settings and calibration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Material name
        #[arg(short, long, default_value = "PLA")]
        material: String,
    },
    /// Rank print orientations for an STL file
    Orient {
        /// Input STL file
        file: PathBuf,
        /// Write the best-oriented mesh here (binary STL)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            file,
            config,
            material,
            quantity,
            supports,
            no_orient,
            json,
        } => {
            let source = load_source(config.as_deref())?;
            let stl = read_stl(&file)?;
            let request = AnalysisRequest {
                material,
                quantity,
                supports,
                auto_orient: !no_orient,
            };
            let result = analyze(&stl, &request, &source)
                .with_context(|| format!("failed to quote {}", file.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_quote(&file, &result);
            }
        }
        Commands::Supports {
            file,
            config,
            material,
        } => {
            let source = load_source(config.as_deref())?;
            let stl = read_stl(&file)?;
            let result = detect_supports(&stl, &material, &source);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Orient { file, output } => {
            orient_file(&file, output.as_deref())?;
        }
    }

    Ok(())
}

fn read_stl(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_source(config: Option<&Path>) -> Result<InMemoryDataSource> {
    match config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let source = InMemoryDataSource::from_toml(&text)
                .with_context(|| format!("invalid settings in {}", path.display()))?;
            info!(
                path = %path.display(),
                records = source.calibration_records().len(),
                profiles = source.profiles.len(),
                "loaded settings"
            );
            Ok(source)
        }
        None => Ok(InMemoryDataSource::with_settings(QuoteSettings::default())),
    }
}

fn print_quote(file: &Path, q: &AnalysisResult) {
    let d = &q.dimensions;
    let b = &q.breakdown;

    println!("Quote: {}", file.display());
    println!("  Material: {}", q.material);
    println!("  Geometry: {}", q.geometry_type);
    println!(
        "  Size: {:.1} x {:.1} x {:.1} cm",
        d.width, d.depth, d.height
    );
    println!("  Volume: {:.2} cm³", q.volume_cm3);
    println!("  Weight: {:.1} g", q.weight_grams);
    println!("  Time: {:.2} h", q.estimated_time_hours);
    if let Some(o) = &b.orientation {
        println!(
            "  Orientation: {} (score {:.1}, overhang {:.1}%)",
            o.source, o.score, o.overhang_percentage
        );
    }

    println!("\nCosts per unit:");
    println!("  Material:     {:>8.2} €", q.material_cost);
    println!("  Electricity:  {:>8.2} €", q.electricity_cost);
    println!("  Machine:      {:>8.2} €", q.machine_cost);
    println!("  Error margin: {:>8.2} €", q.error_margin_cost);
    println!("  Supplies:     {:>8.2} €", q.supplies_cost);
    println!("  Price:        {:>8.2} €", q.subtotal);

    println!("\nTotal for {}: {:.2} €", q.quantity, q.estimated_total);
}

fn orient_file(input: &Path, output: Option<&Path>) -> Result<()> {
    let bytes = read_stl(input)?;
    let mesh = parse_stl(&bytes).with_context(|| format!("failed to parse {}", input.display()))?;
    let result = optimize_orientation(&mesh, &OverhangSettings::default());

    println!("Orientations for {}:", input.display());
    for (i, c) in result.candidates.iter().enumerate() {
        println!(
            "  {}: {:<12} score {:>5.1}  overhang {:>5.1}%  support {:>6.2} cm³  height {:>6.1} mm  stability {:>5.1}",
            i + 1,
            c.source.to_string(),
            c.score,
            c.overhang_percentage,
            c.support_volume,
            c.print_height,
            c.base_stability
        );
    }

    if let Some(path) = output {
        fs::write(path, write_binary_stl(&result.oriented_mesh))
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("\nWrote oriented mesh to {}", path.display());
    }

    Ok(())
}
