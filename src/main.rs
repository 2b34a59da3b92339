//! Fractal Engine - CLI
//!
//! CLI commands:
//! - render: Render one fractal to PNG
//! - randomize: Render a batch of randomized fractals with an index.json
//! - state: Print a randomized fractal state as YAML
//! - list: List families and their current parameters

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use fractal_engine::config::{self, Config, Settings};
use fractal_engine::logging;
use fractal_engine::{Family, FractalEngine, FractalState, RenderWorker};

#[derive(Parser)]
#[command(name = "fractal_engine")]
#[command(about = "Procedural fractal generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to fractal.yaml config
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Random seed (falls back to FRACTAL_SEED, then OS entropy)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one fractal to PNG
    Render {
        /// Switch to this family before rendering
        #[arg(short, long)]
        family: Option<Family>,

        /// Render the state stored in this YAML file
        #[arg(long)]
        state: Option<PathBuf>,

        /// Output PNG path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a batch of randomized fractals
    Randomize {
        /// Number of renders
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a randomized fractal state as YAML
    State,

    /// List families and their current parameters
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();
    logging::init_logging(&settings.log_dir)?;
    tracing::info!("Fractal Engine starting up");

    let cli = Cli::parse();
    tracing::debug!("CLI args parsed: config={:?}", cli.config);

    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }

    let seed = cli.seed.or(settings.seed);
    let mut engine = build_engine(&config, seed);

    match cli.command {
        Commands::Render {
            family,
            state,
            output,
        } => {
            if let Some(path) = state {
                engine = FractalEngine::with_state(
                    config.render_settings(),
                    load_state(&path)?,
                    rng_for(seed),
                );
            }
            if let Some(family) = family {
                engine.select_family(family);
            }
            let output = output.unwrap_or_else(|| {
                Path::new(&settings.output_dir).join(format!("{}.png", engine.state().family))
            });
            render_batch(&mut engine, &config, &[output], false).await?;
        }

        Commands::Randomize { count, output } => {
            let output_dir = output.unwrap_or_else(|| PathBuf::from(&settings.output_dir));
            let outputs: Vec<PathBuf> = (0..count)
                .map(|i| output_dir.join(format!("fractal_{:03}.png", i + 1)))
                .collect();
            let entries = render_batch(&mut engine, &config, &outputs, true).await?;
            write_index(&output_dir, entries)?;
        }

        Commands::State => {
            print!("{}", serde_yaml::to_string(engine.state())?);
        }

        Commands::List => {
            let state = engine.state();
            for family in Family::ALL {
                let marker = if family == state.family { "*" } else { " " };
                println!("{} {:<12} {}", marker, family, state.describe(family));
            }
        }
    }

    Ok(())
}

fn rng_for(seed: Option<u64>) -> rand::rngs::StdRng {
    use rand::SeedableRng;
    match seed {
        Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
        None => rand::rngs::StdRng::from_entropy(),
    }
}

fn build_engine(config: &Config, seed: Option<u64>) -> FractalEngine {
    let settings = config.render_settings();
    match &config.initial {
        Some(state) => FractalEngine::with_state(settings, state.clone(), rng_for(seed)),
        None => FractalEngine::new(settings, rng_for(seed)),
    }
}

fn load_state(path: &Path) -> Result<FractalState> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state {}", path.display()))?;
    let state: FractalState = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse state {}", path.display()))?;
    tracing::info!("Loaded {} state from {}", state.family, path.display());
    Ok(state)
}

/// Render one frame per output path through the background worker
async fn render_batch(
    engine: &mut FractalEngine,
    config: &Config,
    outputs: &[PathBuf],
    randomize: bool,
) -> Result<Vec<serde_json::Value>> {
    let worker = RenderWorker::spawn(config.render_settings());
    let mut entries = Vec::with_capacity(outputs.len());

    for (i, output) in outputs.iter().enumerate() {
        if randomize {
            engine.randomize();
        }
        let generation = worker.submit(engine.job(config.width, config.height));
        let frame = worker
            .wait_for(generation)
            .await
            .with_context(|| format!("Render {} failed", output.display()))?;

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        frame
            .canvas
            .save_png(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        println!(
            "[{}/{}] {} {} -> {}",
            i + 1,
            outputs.len(),
            frame.state.family,
            frame.state.describe(frame.state.family),
            output.display()
        );
        tracing::info!("Wrote {}", output.display());

        let file = output
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        entries.push(serde_json::json!({
            "file": file,
            "family": frame.state.family,
            "params": frame.state.describe(frame.state.family),
            "state": serde_json::to_value(&frame.state)?,
        }));
    }

    worker.shutdown().await;
    Ok(entries)
}

fn write_index(output_dir: &Path, entries: Vec<serde_json::Value>) -> Result<()> {
    let count = entries.len();
    let index = serde_json::json!({
        "generated": chrono::Local::now().to_rfc3339(),
        "renders": entries,
    });
    let index_path = output_dir.join("index.json");
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    std::fs::write(&index_path, serde_json::to_string_pretty(&index)?)
        .with_context(|| format!("Failed to write {}", index_path.display()))?;
    tracing::info!("Wrote {}", index_path.display());
    println!("\nDone! Generated {} renders in {}", count, output_dir.display());
    Ok(())
}
