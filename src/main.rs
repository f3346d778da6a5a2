use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use shmup_autopilot::benchmark::{run_benchmark, BenchmarkConfig};
use shmup_autopilot::controller::AiController;
use shmup_autopilot::snapshot::ScreenBounds;
use shmup_autopilot::util::{load_config, read_snapshots, resolve_seeds, seed_to_hex};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "shmup-autopilot")]
#[command(about = "Tactical decision engine for a scrolling-shooter bot")]
struct Cli {
    /// Tuning file (JSON); falls back to $AUTOPILOT_CONFIG, then built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Feed recorded snapshots through one controller and emit its intents
    Decide {
        /// One snapshot or a JSON array of consecutive snapshots
        #[arg(long)]
        input: PathBuf,
        /// Ticks to hold each snapshot for
        #[arg(long, default_value_t = 1)]
        ticks: u32,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Emit the full per-tick reasoning instead of bare intents
        #[arg(long, default_value_t = false)]
        diagnostics: bool,
    },
    /// Drive the controller through seeded synthetic battlefields
    Bench {
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[arg(long, default_value_t = 3_600)]
        ticks: u32,
        #[arg(long, default_value_t = 800.0)]
        width: f32,
        #[arg(long, default_value_t = 600.0)]
        height: f32,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Print the effective configuration after file and environment overrides
    PrintConfig {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli { config, command } = Cli::parse();
    let tactics = load_config(config.as_deref())?;

    match command {
        Commands::Decide {
            input,
            ticks,
            output,
            diagnostics,
        } => {
            if ticks == 0 {
                return Err(anyhow!("decide --ticks must be >= 1"));
            }
            let snapshots = read_snapshots(&input)?;
            let mut controller = AiController::new(tactics);
            let mut decisions = Vec::with_capacity(snapshots.len() * ticks as usize);
            for snapshot in &snapshots {
                for _ in 0..ticks {
                    decisions.push(controller.step(snapshot));
                }
            }

            let encoded = if diagnostics {
                serde_json::to_vec_pretty(&decisions)?
            } else {
                let intents: Vec<_> = decisions.iter().map(|d| d.intent).collect();
                serde_json::to_vec_pretty(&intents)?
            };
            let dropped: usize = decisions.iter().map(|d| d.dropped_entities).sum();

            match output {
                Some(path) => {
                    write_output(&path, &encoded)?;
                    println!("snapshots={}", snapshots.len());
                    println!("ticks={}", decisions.len());
                    println!("dropped_entities={dropped}");
                    println!("output={}", path.display());
                }
                None => println!("{}", String::from_utf8_lossy(&encoded)),
            }
        }
        Commands::Bench {
            seeds,
            seed_file,
            seed_start,
            seed_count,
            ticks,
            width,
            height,
            out_dir,
            jobs,
        } => {
            let seeds = resolve_seeds(
                seeds.as_deref(),
                seed_file.as_deref(),
                seed_start.as_deref(),
                seed_count,
            )?;
            let screen = ScreenBounds::new(width, height);
            if !screen.is_valid() {
                return Err(anyhow!("invalid screen size {width}x{height}"));
            }
            let out_dir = out_dir.unwrap_or_else(|| {
                PathBuf::from(format!("benchmarks/autopilot-{}", timestamp_suffix()))
            });

            let report = run_benchmark(BenchmarkConfig {
                seeds,
                ticks,
                screen,
                tactics,
                out_dir: Some(out_dir.clone()),
                jobs,
            })?;

            println!("runs={}", report.run_count);
            println!("ticks_per_run={}", report.ticks_per_run);
            println!("mean_tick_us={:.2}", report.mean_tick_us);
            println!("max_tick_us={:.2}", report.max_tick_us);
            println!("violations={}", report.total_violations);
            if let Some(slowest) = report
                .runs
                .iter()
                .max_by(|a, b| a.max_tick_us.total_cmp(&b.max_tick_us))
            {
                println!("slowest_seed={}", seed_to_hex(slowest.seed));
            }
            println!("summary={}", out_dir.join("summary.json").display());

            if report.total_violations > 0 {
                return Err(anyhow!(
                    "{} ticks produced out-of-bounds intents",
                    report.total_violations
                ));
            }
        }
        Commands::PrintConfig { output } => {
            let encoded = serde_json::to_vec_pretty(&tactics)?;
            match output {
                Some(path) => {
                    write_output(&path, &encoded)?;
                    println!("wrote={}", path.display());
                }
                None => println!("{}", String::from_utf8_lossy(&encoded)),
            }
        }
    }

    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

fn timestamp_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{now}")
}
