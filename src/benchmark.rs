use crate::config::TacticsConfig;
use crate::controller::{AiController, ControlIntent};
use crate::scenario::Scenario;
use crate::snapshot::ScreenBounds;
use crate::util::seed_to_hex;
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub seeds: Vec<u32>,
    pub ticks: u32,
    pub screen: ScreenBounds,
    pub tactics: TacticsConfig,
    pub out_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub seed: u32,
    pub seed_hex: String,
    pub ticks: u32,
    pub mean_tick_us: f64,
    pub max_tick_us: f64,
    /// Ticks whose intent broke a bound (non-finite field or oversized movement).
    pub violations: u32,
    pub shield_requests: u32,
    pub time_slow_requests: u32,
    pub bomb_requests: u32,
    pub peak_entities: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub ticks_per_run: u32,
    pub jobs: Option<usize>,
    pub run_count: usize,
    pub mean_tick_us: f64,
    pub max_tick_us: f64,
    pub total_violations: u32,
    pub runs: Vec<RunRecord>,
}

/// Whether `intent` stays inside the bounds every consumer relies on.
pub fn intent_is_bounded(intent: &ControlIntent, max_move_scale: f32) -> bool {
    intent.aim_angle.is_finite()
        && intent.aim_angle.abs() <= PI + 1e-4
        && intent.movement.is_finite()
        && intent.movement.length() <= max_move_scale + 1e-4
}

pub fn run_seed(seed: u32, ticks: u32, screen: ScreenBounds, tactics: &TacticsConfig) -> RunRecord {
    let mut controller = AiController::new(tactics.clone());
    let mut scenario = Scenario::generate(seed, screen, tactics.tick_rate.0);
    let max_scale = tactics.steering.max_move_scale;
    let agent_speed = tactics.steering.agent_speed;

    let mut record = RunRecord {
        seed,
        seed_hex: seed_to_hex(seed),
        ticks,
        mean_tick_us: 0.0,
        max_tick_us: 0.0,
        violations: 0,
        shield_requests: 0,
        time_slow_requests: 0,
        bomb_requests: 0,
        peak_entities: 0,
    };
    let mut total_us = 0.0;

    for _ in 0..ticks {
        record.peak_entities = record.peak_entities.max(scenario.snapshot().entities.len());
        let started = Instant::now();
        let intent = controller.tick(scenario.snapshot());
        let elapsed_us = started.elapsed().as_secs_f64() * 1e6;
        total_us += elapsed_us;
        record.max_tick_us = record.max_tick_us.max(elapsed_us);

        if !intent_is_bounded(&intent, max_scale) {
            record.violations += 1;
        }
        record.shield_requests += u32::from(intent.shield);
        record.time_slow_requests += u32::from(intent.time_slow);
        record.bomb_requests += u32::from(intent.bomb);
        scenario.advance(&intent, agent_speed);
    }

    if ticks > 0 {
        record.mean_tick_us = total_us / ticks as f64;
    }
    record
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.ticks == 0 {
        return Err(anyhow!("benchmark --ticks must be >= 1"));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }
    config
        .tactics
        .validate()
        .context("benchmark config failed validation")?;

    let run_one = |seed: &u32| run_seed(*seed, config.ticks, config.screen, &config.tactics);
    let runs: Vec<RunRecord> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| config.seeds.par_iter().map(run_one).collect())
    } else {
        config.seeds.par_iter().map(run_one).collect()
    };

    let total_ticks: u64 = runs.iter().map(|r| r.ticks as u64).sum();
    let weighted_us: f64 = runs.iter().map(|r| r.mean_tick_us * r.ticks as f64).sum();
    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        ticks_per_run: config.ticks,
        jobs: config.jobs,
        run_count: runs.len(),
        mean_tick_us: if total_ticks > 0 {
            weighted_us / total_ticks as f64
        } else {
            0.0
        },
        max_tick_us: runs.iter().map(|r| r.max_tick_us).fold(0.0, f64::max),
        total_violations: runs.iter().map(|r| r.violations).sum(),
        runs,
    };

    if report.total_violations > 0 {
        tracing::warn!(
            "{} ticks produced out-of-bounds intents",
            report.total_violations
        );
    }
    if let Some(out_dir) = &config.out_dir {
        write_report(out_dir, &report)?;
    }
    Ok(report)
}

fn write_report(out_dir: &Path, report: &BenchmarkReport) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed creating {}", out_dir.display()))?;

    let summary_path = out_dir.join("summary.json");
    fs::write(
        &summary_path,
        serde_json::to_vec_pretty(report).context("failed to serialize summary json")?,
    )
    .with_context(|| format!("failed writing {}", summary_path.display()))?;

    let mut csv = String::from(
        "seed_hex,seed,ticks,mean_tick_us,max_tick_us,violations,shield_requests,time_slow_requests,bomb_requests,peak_entities\n",
    );
    for run in &report.runs {
        csv.push_str(&format!(
            "{},{},{},{:.2},{:.2},{},{},{},{},{}\n",
            run.seed_hex,
            run.seed,
            run.ticks,
            run.mean_tick_us,
            run.max_tick_us,
            run.violations,
            run.shield_requests,
            run.time_slow_requests,
            run.bomb_requests,
            run.peak_entities
        ));
    }
    let csv_path = out_dir.join("runs.csv");
    fs::write(&csv_path, csv).with_context(|| format!("failed writing {}", csv_path.display()))
}
