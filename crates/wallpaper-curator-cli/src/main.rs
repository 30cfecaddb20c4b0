use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{info, warn};

use wallpaper_curator_core::fetch::{CandidateSource, DirectorySource, UrlListSource};
use wallpaper_curator_core::persist::index::{index_category, load_pool};
use wallpaper_curator_core::rank::select_best;
use wallpaper_curator_core::{Config, Curator};

#[derive(Parser)]
#[command(name = "wallpaper-curator")]
#[command(about = "Build and curate a mobile wallpaper collection")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect images from a source into a category directory
    Collect {
        /// Category to collect into
        #[arg(long)]
        category: String,

        /// Finer-grained label recorded for diversity-aware selection
        #[arg(long)]
        subcategory: Option<String>,

        /// Stop after this many accepted images
        #[arg(long, default_value_t = 40)]
        limit: usize,

        /// Root output directory
        #[arg(long, default_value = "wallpapers")]
        output: PathBuf,

        /// Directory of candidate image files
        #[arg(long, conflicts_with = "urls")]
        input: Option<PathBuf>,

        /// File with one image URL per line
        #[arg(long)]
        urls: Option<PathBuf>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Promote the best N wallpapers from a pool into a final directory
    Select {
        /// Directory holding candidate wallpapers and their sidecars
        #[arg(long)]
        pool: PathBuf,

        /// Destination directory for the selected wallpapers
        #[arg(long)]
        output: PathBuf,

        /// Number of wallpapers to select
        #[arg(long, default_value_t = 40)]
        total: usize,

        /// Per-subcategory targets, e.g. "nature=10,abstract=5"
        #[arg(long)]
        distribution: Option<String>,
    },

    /// Regenerate the index file for a category directory
    Index {
        /// Category directory to scan
        directory: PathBuf,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "wallpaper-curator.json")]
        path: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    // Initialize logger
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            category,
            subcategory,
            limit,
            output,
            input,
            urls,
            config,
        } => run_collect(category, subcategory, limit, output, input, urls, config),

        Commands::Select {
            pool,
            output,
            total,
            distribution,
        } => run_select(&pool, &output, total, distribution.as_deref()),

        Commands::Index { directory } => {
            let index = index_category(&directory)
                .with_context(|| format!("failed to index {}", directory.display()))?;
            println!(
                "Indexed {} wallpapers in category '{}'",
                index.count, index.category
            );
            Ok(())
        }

        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }
    }
}

fn run_collect(
    category: String,
    subcategory: Option<String>,
    limit: usize,
    output: PathBuf,
    input: Option<PathBuf>,
    urls: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    // Set up configuration; command line arguments override the file
    let mut config = if let Some(path) = &config_path {
        Config::from_file(path)?
    } else {
        let mut config = Config::default();
        config.seen_hashes_path = output.join("seen_hashes.json");
        config
    };
    config.output_dir = output;

    let fetch_retries = config.fetch_retries;
    let curator = Curator::new(config).context("failed to initialize collection run")?;

    // Stop cleanly on Ctrl-C between candidates
    let shutdown = curator.shutdown_flag();
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::SeqCst);
    })
    .context("failed to install signal handler")?;

    let source: Box<dyn CandidateSource> = if let Some(dir) = input {
        Box::new(DirectorySource::new(&dir)?)
    } else if let Some(list) = urls {
        Box::new(UrlListSource::from_file(&list, fetch_retries)?)
    } else {
        anyhow::bail!("either --input or --urls is required");
    };

    info!("Starting collection run for category '{category}'...");
    let report = curator.run(source, &category, subcategory.as_deref(), limit)?;

    // Partial completion is still a completion; only setup failures exit non-zero
    println!("{report}");
    Ok(())
}

fn run_select(
    pool_dir: &Path,
    output: &Path,
    total: usize,
    distribution: Option<&str>,
) -> Result<(), anyhow::Error> {
    let pairs = load_pool(pool_dir)
        .with_context(|| format!("failed to read pool at {}", pool_dir.display()))?;
    let records: Vec<_> = pairs.iter().map(|(_, record)| record.clone()).collect();

    let distribution = parse_distribution(distribution)?;
    let selection = select_best(&records, &distribution, total);
    if selection.partial {
        warn!(
            "Pool holds only {} wallpapers; selected {} of the requested {}",
            records.len(),
            selection.records.len(),
            total
        );
    }

    fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    // Hashes are unique within a deduplicated pool, so they key the copies
    let sidecar_by_hash: HashMap<_, _> = pairs
        .iter()
        .map(|(path, record)| (record.hash, path.clone()))
        .collect();

    let mut copied = 0;
    for record in &selection.records {
        let Some(sidecar) = sidecar_by_hash.get(&record.hash) else {
            continue;
        };
        let Some(image) = image_for_sidecar(sidecar) else {
            warn!("No image file next to {}, skipping", sidecar.display());
            continue;
        };
        if !copy_into(&image, output)? {
            continue;
        }
        copy_into(sidecar, output)?;
        copied += 1;
    }

    println!(
        "Selected {copied} wallpapers into {}{}",
        output.display(),
        if selection.partial { " (partial)" } else { "" }
    );
    Ok(())
}

/// Parse "a=2,b=3" into subcategory targets
fn parse_distribution(arg: Option<&str>) -> Result<HashMap<String, usize>, anyhow::Error> {
    let mut distribution = HashMap::new();
    let Some(arg) = arg else {
        return Ok(distribution);
    };
    for part in arg.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, count) = part
            .split_once('=')
            .with_context(|| format!("invalid distribution entry '{part}', expected name=count"))?;
        let count: usize = count
            .trim()
            .parse()
            .with_context(|| format!("invalid count in distribution entry '{part}'"))?;
        distribution.insert(name.trim().to_string(), count);
    }
    Ok(distribution)
}

/// Find the image file matching a sidecar's stem
fn image_for_sidecar(sidecar: &Path) -> Option<PathBuf> {
    for ext in ["jpg", "jpeg", "png", "webp"] {
        let candidate = sidecar.with_extension(ext);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Copy a file into `dir`, returning false when the destination already
/// exists. Existing files are never overwritten, matching the persister's
/// collision behavior.
fn copy_into(file: &Path, dir: &Path) -> Result<bool, anyhow::Error> {
    let name = file
        .file_name()
        .with_context(|| format!("{} has no file name", file.display()))?;
    let destination = dir.join(name);
    if destination.exists() {
        warn!(
            "{} already exists, not overwriting",
            destination.display()
        );
        return Ok(false);
    }
    fs::copy(file, &destination)
        .with_context(|| format!("failed to copy {}", file.display()))?;
    Ok(true)
}

// -- Tests --
