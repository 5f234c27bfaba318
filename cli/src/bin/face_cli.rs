use clap::{Parser, Subcommand};
use cli::{ConfigOverrides, load_config, render_config, write_report};
use color_eyre::eyre::Result;
use reconstruct::{FaceReconstructor, create_sample_image};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Reconstruct white-occluded regions of face images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct a single image
    Process {
        /// Path to the input image
        image: PathBuf,
        /// Directory for the reconstructed image and diagnostics
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
        /// Luminance above which pixels count as occluded (0-255)
        #[arg(short, long)]
        threshold: Option<i32>,
        /// Resize the input before processing
        #[arg(short, long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
        size: Option<Vec<u32>>,
        /// TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Reconstruct every image in a directory
    Batch {
        /// Directory containing the input images
        input_dir: PathBuf,
        /// Directory for the results
        output_dir: PathBuf,
        /// Luminance above which pixels count as occluded (0-255)
        #[arg(short, long)]
        threshold: Option<i32>,
        /// Resize inputs before processing
        #[arg(short, long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
        size: Option<Vec<u32>>,
        /// File extensions to pick up, e.g. `-e .jpg .png`
        #[arg(short, long, num_args = 1..)]
        extensions: Option<Vec<String>>,
        /// TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write a JSON summary of the batch to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Create a synthetic face with a white occlusion for testing
    Sample {
        /// Where to write the sample image
        #[arg(short, long, default_value = "sample_face.jpg")]
        output: PathBuf,
        /// Width and height of the square image
        #[arg(long, default_value = "256")]
        size: u32,
    },
    /// Print the default configuration as TOML
    Config {
        /// Print the JSON schema of the configuration instead
        #[arg(long)]
        schema: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process { image, output, threshold, size, config } => {
            let overrides = ConfigOverrides::default()
                .with_threshold(threshold)
                .with_size(size.as_deref())?;
            process_image(&image, &output, config.as_deref(), &overrides)?;
        }
        Commands::Batch { input_dir, output_dir, threshold, size, extensions, config, report } => {
            let overrides = ConfigOverrides::default()
                .with_threshold(threshold)
                .with_size(size.as_deref())?
                .with_extensions(extensions);
            batch_process(&input_dir, &output_dir, config.as_deref(), &overrides, report.as_deref())?;
        }
        Commands::Sample { output, size } => {
            create_sample_image(size, &output)?;
            info!("Sample image created: {}", output.display());
        }
        Commands::Config { schema } => {
            println!("{}", render_config(schema)?);
        }
    }

    Ok(())
}

fn process_image(
    image: &Path,
    output: &Path,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<()> {
    let config = load_config(config_path, overrides)?;
    let reconstructor = FaceReconstructor::new(config)?;
    info!("Processing {}", image.display());

    let reconstruction = reconstructor.process_image(image, output)?;
    info!(
        "Reconstructed {} occluded pixels, results in {}",
        reconstruction.mask.occluded_count(),
        output.display()
    );
    Ok(())
}

fn batch_process(
    input_dir: &Path,
    output_dir: &Path,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
    report_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path, overrides)?;
    let reconstructor = FaceReconstructor::new(config)?;

    let report = reconstructor.batch_process(input_dir, output_dir)?;
    for failure in &report.failures {
        warn!("{} [{}]: {}", failure.path.display(), failure.kind, failure.message);
    }
    info!(
        "Batch finished: {} of {} images reconstructed",
        report.processed.len(),
        report.total()
    );

    if let Some(path) = report_path {
        write_report(&report, path)?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}
