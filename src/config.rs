//! Tunables for every planner stage.
//!
//! Each section deserializes with `#[serde(default)]`, so a JSON file only
//! needs the values it overrides.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_TICK_RATE: f32 = 60.0;
pub const ENV_CONFIG_PATH: &str = "AUTOPILOT_CONFIG";
pub const ENV_MAX_MOVE_SCALE: &str = "AUTOPILOT_MAX_MOVE_SCALE";
pub const ENV_TICK_RATE: &str = "AUTOPILOT_TICK_RATE";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticsConfig {
    pub tick_rate: TickRate,
    pub aim: AimConfig,
    pub threats: ThreatProfiles,
    pub danger: DangerConfig,
    pub planner: PlannerConfig,
    pub pocket: PocketConfig,
    pub steering: SteeringConfig,
    pub abilities: AbilityConfig,
}

/// Simulation ticks per second; converts per-second velocities at ingestion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickRate(pub f32);

impl Default for TickRate {
    fn default() -> Self {
        Self(DEFAULT_TICK_RATE)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    /// Intercepts further out than this many ticks are rejected.
    pub max_intercept_ticks: f32,
    pub max_intercept_distance: f32,
    pub lead_refine_passes: u32,
    /// Facing used when nothing can be aimed at (radians).
    pub default_facing: f32,
    pub close_target_radius: f32,
    pub speed_ratio_penalty: f32,
    pub no_solution_factor: f32,
    pub stationary_speed: f32,
    pub stationary_bonus: f32,
    pub tangential_penalty: f32,
    pub linear_bonus: f32,
    pub sinusoidal_penalty: f32,
    pub erratic_penalty: f32,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            max_intercept_ticks: 180.0,
            max_intercept_distance: 2400.0,
            lead_refine_passes: 3,
            default_facing: 0.0,
            close_target_radius: 200.0,
            speed_ratio_penalty: 0.5,
            no_solution_factor: 0.15,
            stationary_speed: 0.5,
            stationary_bonus: 0.2,
            tangential_penalty: 0.4,
            linear_bonus: 0.1,
            sinusoidal_penalty: 0.15,
            erratic_penalty: 0.2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub radius: f32,
    pub priority: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatProfiles {
    pub bullet: CategoryProfile,
    pub laser: CategoryProfile,
    pub enemy: CategoryProfile,
    pub charging_laser: CategoryProfile,
    pub asteroid: CategoryProfile,
    pub boss: CategoryProfile,
    /// Ticks between predicted path samples.
    pub path_stride_ticks: f32,
}

impl Default for ThreatProfiles {
    fn default() -> Self {
        Self {
            bullet: CategoryProfile {
                radius: 40.0,
                priority: 1.0,
            },
            laser: CategoryProfile {
                radius: 48.0,
                priority: 1.0,
            },
            enemy: CategoryProfile {
                radius: 45.0,
                priority: 0.6,
            },
            charging_laser: CategoryProfile {
                radius: 90.0,
                priority: 0.95,
            },
            asteroid: CategoryProfile {
                radius: 55.0,
                priority: 0.4,
            },
            boss: CategoryProfile {
                radius: 120.0,
                priority: 0.5,
            },
            path_stride_ticks: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DangerTerm {
    pub radius: f32,
    pub weight: f32,
    pub cap: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DangerConfig {
    pub bullet: DangerTerm,
    pub laser: DangerTerm,
    pub charging_laser: DangerTerm,
    pub enemy: DangerTerm,
    pub asteroid: DangerTerm,
    pub boss_radius: f32,
    pub boss_cap: f32,
    /// Projectiles packed inside this radius add a crowding term on top of
    /// the capped bullet/laser subtotals.
    pub swarm_radius: f32,
    pub swarm_weight: f32,
    pub swarm_cap: f32,
}

impl Default for DangerConfig {
    fn default() -> Self {
        Self {
            bullet: DangerTerm {
                radius: 250.0,
                weight: 0.2,
                cap: 0.6,
            },
            laser: DangerTerm {
                radius: 250.0,
                weight: 0.2,
                cap: 0.4,
            },
            charging_laser: DangerTerm {
                radius: 300.0,
                weight: 0.25,
                cap: 0.5,
            },
            enemy: DangerTerm {
                radius: 250.0,
                weight: 0.1,
                cap: 0.3,
            },
            asteroid: DangerTerm {
                radius: 200.0,
                weight: 0.08,
                cap: 0.2,
            },
            boss_radius: 450.0,
            boss_cap: 0.3,
            swarm_radius: 60.0,
            swarm_weight: 0.02,
            swarm_cap: 0.4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollAxis {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub scroll_axis: ScrollAxis,
    /// Objective points are kept this far inside the screen edges.
    pub screen_margin: f32,
    pub center_bias: f32,
    pub laser_danger_margin: f32,
    pub laser_escape_distance: f32,
    pub bolt_trajectory_ticks: f32,
    pub charging_laser_radius: f32,
    pub dodge_time_ticks: f32,
    pub dodge_escape_distance: f32,
    pub powerup_radius: f32,
    pub powerup_safety_radius: f32,
    pub density_radius: f32,
    pub density_threshold: f32,
    pub escape_ring_radius: f32,
    pub escape_ring_samples: u32,
    pub bombardment_projectiles: usize,
    /// Fraction of the scroll axis kept between the agent and the screen edge
    /// when spacing away from a boss.
    pub boss_edge_offset: f32,
    pub weight_bullet: f32,
    pub weight_laser: f32,
    pub weight_enemy: f32,
    pub weight_asteroid: f32,
    pub weight_boss: f32,
    pub weight_charging_bonus: f32,
    pub priority_laser: f32,
    pub priority_charging: f32,
    pub priority_bullet: f32,
    pub priority_powerup: f32,
    pub priority_cluster: f32,
    pub priority_pocket: f32,
    pub priority_boss: f32,
    pub priority_center_min: f32,
    pub priority_center_max: f32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            scroll_axis: ScrollAxis::Horizontal,
            screen_margin: 40.0,
            center_bias: 0.25,
            laser_danger_margin: 30.0,
            laser_escape_distance: 140.0,
            bolt_trajectory_ticks: 60.0,
            charging_laser_radius: 260.0,
            dodge_time_ticks: 20.0,
            dodge_escape_distance: 90.0,
            powerup_radius: 350.0,
            powerup_safety_radius: 60.0,
            density_radius: 150.0,
            density_threshold: 2.0,
            escape_ring_radius: 120.0,
            escape_ring_samples: 12,
            bombardment_projectiles: 12,
            boss_edge_offset: 0.18,
            weight_bullet: 1.0,
            weight_laser: 1.2,
            weight_enemy: 0.7,
            weight_asteroid: 0.5,
            weight_boss: 0.8,
            weight_charging_bonus: 0.5,
            priority_laser: 1.0,
            priority_charging: 0.95,
            priority_bullet: 0.9,
            priority_powerup: 0.7,
            priority_cluster: 0.8,
            priority_pocket: 0.75,
            priority_boss: 0.5,
            priority_center_min: 0.2,
            priority_center_max: 0.6,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PocketConfig {
    pub columns: u32,
    pub rows: u32,
    /// Cells within this distance of two edges at once are never returned.
    pub corner_margin: f32,
    pub pocket_radius: f32,
    pub safety_buffer: f32,
    pub horizon_steps: u32,
    pub stride_ticks: f32,
    pub static_weight: f32,
    pub center_bonus: f32,
    pub min_improvement: f32,
}

impl Default for PocketConfig {
    fn default() -> Self {
        Self {
            columns: 10,
            rows: 7,
            corner_margin: 90.0,
            pocket_radius: 70.0,
            safety_buffer: 15.0,
            horizon_steps: 6,
            stride_ticks: 5.0,
            static_weight: 2.0,
            center_bonus: 0.5,
            min_improvement: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Assumed agent travel per tick while forward-simulating a heading.
    pub agent_speed: f32,
    pub max_move_scale: f32,
    pub aggressiveness: f32,
    pub min_scale: f32,
    pub angle_step_deg: f32,
    pub max_spread_deg: f32,
    pub lookahead_samples: u32,
    pub collision_weight: f32,
    pub near_miss_band: f32,
    pub near_miss_weight: f32,
    pub mult_bullet: f32,
    pub mult_laser: f32,
    pub mult_enemy: f32,
    pub mult_asteroid: f32,
    pub mult_boss: f32,
    pub corner_margin: f32,
    pub corner_penalty: f32,
    pub offscreen_penalty: f32,
    pub center_weight: f32,
    pub alignment_weight: f32,
    pub arrive_radius: f32,
    pub surround_radius: f32,
    pub surround_count: usize,
    pub surround_boost: f32,
    pub damping_radius: f32,
    pub damping_factor: f32,
    pub immediate_radius: f32,
    pub immediate_ticks: f32,
    pub immediate_center_bias: f32,
    pub safety_floor: f32,
    pub emergency_samples: u32,
    pub emergency_probe: f32,
    pub emergency_scale: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            agent_speed: 5.0,
            max_move_scale: 1.0,
            aggressiveness: 0.9,
            min_scale: 0.35,
            angle_step_deg: 6.0,
            max_spread_deg: 90.0,
            lookahead_samples: 45,
            collision_weight: 10.0,
            near_miss_band: 25.0,
            near_miss_weight: 1.5,
            mult_bullet: 1.5,
            mult_laser: 1.6,
            mult_enemy: 1.0,
            mult_asteroid: 0.8,
            mult_boss: 1.2,
            corner_margin: 60.0,
            corner_penalty: 3.0,
            offscreen_penalty: 8.0,
            center_weight: 0.3,
            alignment_weight: 0.5,
            arrive_radius: 6.0,
            surround_radius: 200.0,
            surround_count: 6,
            surround_boost: 1.3,
            damping_radius: 50.0,
            damping_factor: 0.7,
            immediate_radius: 120.0,
            immediate_ticks: 25.0,
            immediate_center_bias: 0.15,
            safety_floor: -6.0,
            emergency_samples: 16,
            emergency_probe: 60.0,
            emergency_scale: 0.35,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerThresholds {
    pub level: f32,
    pub boss_level: f32,
    /// `close + 2 * very_close` projectile count that triggers on its own.
    pub crowd_score: u32,
    pub boss_crowd_score: u32,
    pub cornered_level: f32,
    pub boss_cornered_level: f32,
    pub min_interval_ticks: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BombThresholds {
    pub extreme_level: f32,
    pub flood_count: usize,
    pub final_phase_level: f32,
    pub cornered_close_count: usize,
    pub min_interval_ticks: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    pub close_radius: f32,
    pub very_close_radius: f32,
    pub cornered_margin: f32,
    pub shield: TriggerThresholds,
    pub time_slow: TriggerThresholds,
    pub time_slow_phase_level: f32,
    pub bomb: BombThresholds,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            close_radius: 150.0,
            very_close_radius: 70.0,
            cornered_margin: 80.0,
            shield: TriggerThresholds {
                level: 0.7,
                boss_level: 0.6,
                crowd_score: 8,
                boss_crowd_score: 6,
                cornered_level: 0.45,
                boss_cornered_level: 0.4,
                min_interval_ticks: 90,
            },
            time_slow: TriggerThresholds {
                level: 0.8,
                boss_level: 0.7,
                crowd_score: 11,
                boss_crowd_score: 9,
                cornered_level: 0.6,
                boss_cornered_level: 0.55,
                min_interval_ticks: 240,
            },
            time_slow_phase_level: 0.4,
            bomb: BombThresholds {
                extreme_level: 0.95,
                flood_count: 30,
                final_phase_level: 0.5,
                cornered_close_count: 8,
                min_interval_ticks: 300,
            },
        }
    }
}

// ── Loading and validation ──────────────────────────────────────────

impl TacticsConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let cfg: TacticsConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies `AUTOPILOT_MAX_MOVE_SCALE` and `AUTOPILOT_TICK_RATE`.
    pub fn with_env_overrides(mut self) -> Self {
        self.steering.max_move_scale =
            read_env_f32(ENV_MAX_MOVE_SCALE, self.steering.max_move_scale);
        self.tick_rate = TickRate(read_env_f32(ENV_TICK_RATE, self.tick_rate.0));
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tick_rate", self.tick_rate.0)?;

        let aim = &self.aim;
        positive("aim.max_intercept_ticks", aim.max_intercept_ticks)?;
        positive("aim.max_intercept_distance", aim.max_intercept_distance)?;
        positive("aim.close_target_radius", aim.close_target_radius)?;
        finite("aim.default_facing", aim.default_facing)?;
        in_range("aim.no_solution_factor", aim.no_solution_factor, 0.0, 1.0)?;

        let t = &self.threats;
        for (field, profile) in [
            ("threats.bullet", t.bullet),
            ("threats.laser", t.laser),
            ("threats.enemy", t.enemy),
            ("threats.charging_laser", t.charging_laser),
            ("threats.asteroid", t.asteroid),
            ("threats.boss", t.boss),
        ] {
            positive(field, profile.radius)?;
            unit_interval(field, profile.priority)?;
        }
        positive("threats.path_stride_ticks", t.path_stride_ticks)?;

        let d = &self.danger;
        for (field, term) in [
            ("danger.bullet", d.bullet),
            ("danger.laser", d.laser),
            ("danger.charging_laser", d.charging_laser),
            ("danger.enemy", d.enemy),
            ("danger.asteroid", d.asteroid),
        ] {
            positive(field, term.radius)?;
            finite(field, term.weight)?;
            unit_interval(field, term.cap)?;
        }
        positive("danger.boss_radius", d.boss_radius)?;
        unit_interval("danger.boss_cap", d.boss_cap)?;
        unit_interval("danger.swarm_cap", d.swarm_cap)?;

        let p = &self.planner;
        in_range("planner.center_bias", p.center_bias, 0.0, 1.0)?;
        positive("planner.density_radius", p.density_radius)?;
        positive("planner.powerup_radius", p.powerup_radius)?;
        positive("planner.escape_ring_radius", p.escape_ring_radius)?;
        if p.escape_ring_samples == 0 {
            return Err(ConfigError::OutOfRange {
                field: "planner.escape_ring_samples",
                value: 0.0,
                min: 1.0,
                max: f32::MAX,
            });
        }
        in_range("planner.boss_edge_offset", p.boss_edge_offset, 0.0, 0.5)?;

        let k = &self.pocket;
        if k.columns < 2 || k.rows < 2 {
            return Err(ConfigError::InvalidGrid {
                columns: k.columns,
                rows: k.rows,
            });
        }
        positive("pocket.pocket_radius", k.pocket_radius)?;
        positive("pocket.stride_ticks", k.stride_ticks)?;
        finite("pocket.corner_margin", k.corner_margin)?;
        finite("pocket.min_improvement", k.min_improvement)?;

        let s = &self.steering;
        positive("steering.agent_speed", s.agent_speed)?;
        positive("steering.max_move_scale", s.max_move_scale)?;
        in_range("steering.min_scale", s.min_scale, 0.0, 1.0)?;
        in_range("steering.angle_step_deg", s.angle_step_deg, 0.5, 90.0)?;
        in_range("steering.max_spread_deg", s.max_spread_deg, 0.0, 180.0)?;
        if s.lookahead_samples == 0 || s.emergency_samples == 0 {
            return Err(ConfigError::OutOfRange {
                field: "steering.lookahead_samples",
                value: 0.0,
                min: 1.0,
                max: f32::MAX,
            });
        }
        finite("steering.safety_floor", s.safety_floor)?;
        in_range("steering.emergency_scale", s.emergency_scale, 0.0, 1.0)?;

        let a = &self.abilities;
        positive("abilities.close_radius", a.close_radius)?;
        positive("abilities.very_close_radius", a.very_close_radius)?;
        finite("abilities.cornered_margin", a.cornered_margin)?;
        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: f32::MIN_POSITIVE,
            max: f32::MAX,
        })
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

pub fn read_env_f32(name: &str, default: f32) -> f32 {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<f32>() {
            Ok(value) if value.is_finite() && value > 0.0 => value,
            _ => {
                tracing::warn!("{name}={raw:?} is not a positive number; using {default}");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        TacticsConfig::default()
            .validate()
            .expect("default config must validate");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg: TacticsConfig =
            serde_json::from_str(r#"{"steering": {"max_move_scale": 2.5}, "tick_rate": 30}"#)
                .expect("partial config parses");
        assert_eq!(cfg.steering.max_move_scale, 2.5);
        assert_eq!(cfg.tick_rate, TickRate(30.0));
        assert_eq!(cfg.steering.lookahead_samples, 45);
        assert_eq!(cfg.pocket, PocketConfig::default());
    }

    #[test]
    fn degenerate_grid_is_rejected() {
        let mut cfg = TacticsConfig::default();
        cfg.pocket.columns = 1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidGrid { columns: 1, .. })
        ));
    }

    #[test]
    fn priority_outside_unit_interval_is_rejected() {
        let mut cfg = TacticsConfig::default();
        cfg.threats.bullet.priority = 1.5;
        let err = cfg.validate().expect_err("priority > 1 must fail");
        assert!(err.to_string().contains("threats.bullet"), "{err}");
    }

    #[test]
    fn non_finite_move_scale_is_rejected() {
        let mut cfg = TacticsConfig::default();
        cfg.steering.max_move_scale = f32::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonFinite {
                field: "steering.max_move_scale"
            })
        ));
    }
}
