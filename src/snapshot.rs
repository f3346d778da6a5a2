//! Per-tick world snapshot as delivered by the simulation layer, and the
//! ingestion adapter that turns raw entities into canonical movers.

use crate::geometry::Vec2;
use crate::intercept::ProjectileSpeed;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoverState {
    pub position: Vec2,
    /// Pixels per tick.
    pub velocity: Vec2,
}

impl MoverState {
    pub const fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }

    pub const fn stationary(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Constant-velocity extrapolation `ticks` into the future.
    pub fn at_tick(&self, ticks: f32) -> Vec2 {
        self.position + self.velocity * ticks
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub width: f32,
    pub height: f32,
}

impl ScreenBounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn half_diagonal(&self) -> f32 {
        self.center().length().max(1.0)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width && p.y <= self.height
    }

    pub fn contains_inset(&self, p: Vec2, margin: f32) -> bool {
        p.x >= margin && p.y >= margin && p.x <= self.width - margin && p.y <= self.height - margin
    }

    /// True when `p` is within `margin` of a vertical edge AND of a
    /// horizontal edge at the same time.
    pub fn in_corner(&self, p: Vec2, margin: f32) -> bool {
        let near_x = p.x < margin || p.x > self.width - margin;
        let near_y = p.y < margin || p.y > self.height - margin;
        near_x && near_y
    }

    /// Pulls `p` inside the screen, `margin` away from every edge. The margin
    /// shrinks on axes too small to honor it.
    pub fn clamp_inset(&self, p: Vec2, margin: f32) -> Vec2 {
        let mx = margin.min(self.width * 0.5).max(0.0);
        let my = margin.min(self.height * 0.5).max(0.0);
        Vec2::new(
            p.x.clamp(mx, self.width - mx),
            p.y.clamp(my, self.height - my),
        )
    }
}

impl Default for ScreenBounds {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

// ── Raw input ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Enemy,
    Asteroid,
    BossPart,
    EnemyBullet,
    EnemyLaser,
}

impl EntityCategory {
    pub fn is_projectile(self) -> bool {
        matches!(self, Self::EnemyBullet | Self::EnemyLaser)
    }
}

/// Movement pattern / role of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Linear,
    Sinusoidal,
    Erratic,
    Gunner,
    Laser,
    Elite,
}

impl EnemyKind {
    pub fn is_shooter(self) -> bool {
        matches!(self, Self::Gunner | Self::Laser | Self::Elite)
    }
}

/// One entity as reported by the simulation. Velocity arrives either per
/// tick (`vx`/`vy`) or per second (`dx`/`dy`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vx: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vy: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dx: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dy: Option<f32>,
    pub category: EntityCategory,
    #[serde(default = "default_true")]
    pub vulnerable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EnemyKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    /// Beam-charging enemy about to fire.
    #[serde(default)]
    pub charging: bool,
    /// Far end of a locked laser beam starting at `(x, y)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beam_end: Option<Vec2>,
}

impl RawEntity {
    pub fn per_tick(category: EntityCategory, position: Vec2, velocity: Vec2) -> Self {
        Self {
            x: position.x,
            y: position.y,
            vx: Some(velocity.x),
            vy: Some(velocity.y),
            dx: None,
            dy: None,
            category,
            vulnerable: true,
            kind: None,
            radius: None,
            charging: false,
            beam_end: None,
        }
    }

    pub fn with_kind(mut self, kind: EnemyKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_dilation() -> f32 {
    1.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerupKind {
    Health,
    Shield,
    Bomb,
    Weapon,
    Score,
}

impl PowerupKind {
    pub fn priority(self) -> f32 {
        match self {
            Self::Health => 1.0,
            Self::Shield => 0.9,
            Self::Bomb => 0.8,
            Self::Weapon => 0.7,
            Self::Score => 0.4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Powerup {
    pub position: Vec2,
    pub kind: PowerupKind,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub projectile_speed: ProjectileSpeed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossInfo {
    pub active_phase_id: u32,
    #[serde(default)]
    pub final_phase: bool,
    #[serde(default)]
    pub destroyed_part_count: u32,
}

/// Cooldown state owned by the ability code; read-only here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityReadouts {
    pub shield_active: bool,
    pub shield_available: bool,
    pub time_slow_active: bool,
    pub time_slow_available: bool,
    pub bomb_available: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualControl {
    pub auto_aim: bool,
    pub auto_play: bool,
    pub pointer_target: Option<Vec2>,
}

impl Default for ManualControl {
    fn default() -> Self {
        Self {
            auto_aim: true,
            auto_play: true,
            pointer_target: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub agent: MoverState,
    #[serde(default)]
    pub entities: Vec<RawEntity>,
    #[serde(default)]
    pub powerups: Vec<Powerup>,
    #[serde(default)]
    pub screen: ScreenBounds,
    #[serde(default)]
    pub weapon: WeaponSpec,
    #[serde(default)]
    pub boss: Option<BossInfo>,
    #[serde(default)]
    pub abilities: AbilityReadouts,
    #[serde(default = "default_dilation")]
    pub time_dilation: f32,
    #[serde(default)]
    pub manual: ManualControl,
}

impl WorldSnapshot {
    pub fn empty(agent: MoverState, screen: ScreenBounds) -> Self {
        Self {
            agent,
            entities: Vec::new(),
            powerups: Vec::new(),
            screen,
            weapon: WeaponSpec::default(),
            boss: None,
            abilities: AbilityReadouts::default(),
            time_dilation: 1.0,
            manual: ManualControl::default(),
        }
    }

    /// Whether the agent and playfield are sane enough to plan against.
    pub fn is_usable(&self) -> bool {
        self.agent.is_finite() && self.screen.is_valid()
    }

    pub fn effective_dilation(&self) -> f32 {
        if self.time_dilation.is_finite() && self.time_dilation >= 0.0 {
            self.time_dilation
        } else {
            1.0
        }
    }
}

// ── Ingestion ───────────────────────────────────────────────────────

/// An entity normalized to per-tick, dilation-scaled kinematics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub category: EntityCategory,
    pub mover: MoverState,
    pub vulnerable: bool,
    pub kind: Option<EnemyKind>,
    pub radius: f32,
    pub charging: bool,
    pub beam_end: Option<Vec2>,
}

impl Contact {
    pub fn is_elite(&self) -> bool {
        self.category == EntityCategory::Enemy && self.kind == Some(EnemyKind::Elite)
    }

    pub fn is_charging_laser(&self) -> bool {
        self.category == EntityCategory::Enemy
            && self.charging
            && matches!(self.kind, Some(EnemyKind::Laser) | None)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub accepted: usize,
    pub dropped: usize,
}

pub fn normalize_velocity(raw: &RawEntity, tick_rate: f32) -> Vec2 {
    if raw.vx.is_some() || raw.vy.is_some() {
        return Vec2::new(raw.vx.unwrap_or(0.0), raw.vy.unwrap_or(0.0));
    }
    if (raw.dx.is_some() || raw.dy.is_some()) && tick_rate > 0.0 {
        return Vec2::new(raw.dx.unwrap_or(0.0), raw.dy.unwrap_or(0.0)) * (1.0 / tick_rate);
    }
    Vec2::ZERO
}

/// Normalizes every raw entity into `out` (cleared first). Entities with
/// non-finite kinematics are dropped.
pub fn ingest(snapshot: &WorldSnapshot, tick_rate: f32, out: &mut Vec<Contact>) -> IngestReport {
    out.clear();
    let dilation = snapshot.effective_dilation();
    let mut report = IngestReport::default();

    for raw in &snapshot.entities {
        let mover = MoverState::new(
            Vec2::new(raw.x, raw.y),
            normalize_velocity(raw, tick_rate) * dilation,
        );
        let radius = raw.radius.unwrap_or(0.0);
        let beam_ok = raw.beam_end.map_or(true, Vec2::is_finite);
        if !mover.is_finite() || !radius.is_finite() || !beam_ok {
            report.dropped += 1;
            continue;
        }
        out.push(Contact {
            category: raw.category,
            mover,
            vulnerable: raw.vulnerable,
            kind: raw.kind,
            radius: radius.max(0.0),
            charging: raw.charging,
            beam_end: raw.beam_end,
        });
        report.accepted += 1;
    }

    if report.dropped > 0 {
        tracing::warn!(
            "dropped {} of {} snapshot entities with non-finite kinematics",
            report.dropped,
            snapshot.entities.len()
        );
    }
    report
}
