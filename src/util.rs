use crate::config::{TacticsConfig, ENV_CONFIG_PATH};
use crate::snapshot::WorldSnapshot;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Seed used when neither `--seeds`, `--seed-file` nor `--seed-start` is given.
pub const DEFAULT_SEED_START: u32 = 0xA57E_0001;

pub fn parse_seed(seed: &str) -> Result<u32> {
    let s = seed.trim();
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {s}")),
        None => s
            .parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {s}")),
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

fn collect_seeds<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Vec<u32>> {
    tokens
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.starts_with('#'))
        .map(parse_seed)
        .collect()
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u32>> {
    let seeds = collect_seeds(input.split(','))?;
    if seeds.is_empty() {
        return Err(anyhow!("no seeds parsed from --seeds"));
    }
    Ok(seeds)
}

pub fn parse_seed_file(path: &Path) -> Result<Vec<u32>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading seed file {}", path.display()))?;
    let seeds = collect_seeds(data.lines())?;
    if seeds.is_empty() {
        return Err(anyhow!("seed file {} had no seeds", path.display()));
    }
    Ok(seeds)
}

/// Explicit seeds win; otherwise `count` seeds stepped from `start` with an LCG.
pub fn resolve_seeds(
    seeds: Option<&str>,
    seed_file: Option<&Path>,
    seed_start: Option<&str>,
    count: u32,
) -> Result<Vec<u32>> {
    if let Some(path) = seed_file {
        return parse_seed_file(path);
    }
    if let Some(csv) = seeds {
        return parse_seed_csv(csv);
    }
    let mut cur = match seed_start {
        Some(start) => parse_seed(start)?,
        None => DEFAULT_SEED_START,
    };
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(cur);
        cur = cur.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    }
    Ok(out)
}

/// `--config`, else `AUTOPILOT_CONFIG`, else defaults; env overrides last.
pub fn load_config(path: Option<&Path>) -> Result<TacticsConfig> {
    let path: Option<PathBuf> = path
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(ENV_CONFIG_PATH).map(PathBuf::from));
    let config = match path {
        Some(path) => TacticsConfig::from_file(&path)
            .with_context(|| format!("failed loading config {}", path.display()))?,
        None => TacticsConfig::default(),
    };
    let config = config.with_env_overrides();
    config
        .validate()
        .context("config invalid after environment overrides")?;
    Ok(config)
}

/// A file holding either one snapshot or a JSON array of consecutive ones.
pub fn read_snapshots(path: &Path) -> Result<Vec<WorldSnapshot>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading snapshot file {}", path.display()))?;
    let trimmed = raw.trim_start();
    let snapshots = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<WorldSnapshot>>(trimmed)
            .with_context(|| format!("invalid snapshot array in {}", path.display()))?
    } else {
        vec![serde_json::from_str::<WorldSnapshot>(trimmed)
            .with_context(|| format!("invalid snapshot in {}", path.display()))?]
    };
    if snapshots.is_empty() {
        return Err(anyhow!("{} contained no snapshots", path.display()));
    }
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_parse_in_both_radixes() {
        assert_eq!(parse_seed("0x10").ok(), Some(16));
        assert_eq!(parse_seed(" 42 ").ok(), Some(42));
        assert!(parse_seed("").is_err());
        assert!(parse_seed("0xZZ").is_err());
    }

    #[test]
    fn csv_skips_blanks() {
        assert_eq!(parse_seed_csv("1, ,0x2,").ok(), Some(vec![1, 2]));
        assert!(parse_seed_csv(" , ").is_err());
    }

    #[test]
    fn generated_seeds_are_deterministic() {
        let a = resolve_seeds(None, None, None, 4).expect("default seeds");
        let b = resolve_seeds(None, None, Some("0xA57E0001"), 4).expect("explicit start");
        assert_eq!(a, b);
        assert_eq!(a[0], DEFAULT_SEED_START);
        assert_eq!(a.len(), 4);
    }
}
