//! Picks the single movement objective for this tick.
//!
//! The ladder is evaluated top to bottom and the first rung that applies
//! wins: laser escape, bullet dodge, powerup, cluster escape, safety pocket,
//! boss spacing, then screen center.

use crate::config::{PlannerConfig, PocketConfig, ScrollAxis};
use crate::geometry::{distance_to_segment, Vec2, EPSILON};
use crate::pocket::find_pocket;
use crate::snapshot::{BossInfo, Contact, EntityCategory, Powerup, ScreenBounds};
use crate::threat::{Threat, ThreatCategory};
use serde::Serialize;
use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    LaserDodge,
    ChargingRetreat,
    BulletDodge,
    Powerup,
    ClusterEscape,
    SafetyPocket,
    BossSpacing,
    Center,
}

impl ObjectiveKind {
    /// Dodges are evasive; the steering stage never slows down to arrive on them.
    pub fn is_dodge(self) -> bool {
        matches!(
            self,
            Self::LaserDodge | Self::ChargingRetreat | Self::BulletDodge
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Objective {
    pub point: Vec2,
    pub kind: ObjectiveKind,
    pub priority: f32,
}

/// Read-only view of the tick's world, as the planner needs it.
#[derive(Clone, Copy, Debug)]
pub struct Battlefield<'a> {
    pub agent: Vec2,
    pub agent_velocity: Vec2,
    pub screen: ScreenBounds,
    pub contacts: &'a [Contact],
    pub threats: &'a [Threat],
    pub powerups: &'a [Powerup],
    pub boss: Option<BossInfo>,
}

impl Battlefield<'_> {
    /// A boss encounter is running or an elite enemy is on the field.
    pub fn boss_active(&self) -> bool {
        self.boss.is_some()
            || self
                .contacts
                .iter()
                .any(|c| c.category == EntityCategory::BossPart || c.is_elite())
    }

    pub fn projectile_count(&self) -> usize {
        self.threats.iter().filter(|t| t.is_projectile()).count()
    }

    /// Centroid of the boss parts, or the nearest elite when there are none.
    pub fn boss_position(&self) -> Option<Vec2> {
        let mut sum = Vec2::ZERO;
        let mut parts = 0usize;
        for contact in self.contacts {
            if contact.category == EntityCategory::BossPart {
                sum += contact.mover.position;
                parts += 1;
            }
        }
        if parts > 0 {
            return Some(sum * (1.0 / parts as f32));
        }

        let mut nearest: Option<(Vec2, f32)> = None;
        for contact in self.contacts.iter().filter(|c| c.is_elite()) {
            let distance = self.agent.distance(contact.mover.position);
            if nearest.map_or(true, |(_, d)| distance < d) {
                nearest = Some((contact.mover.position, distance));
            }
        }
        nearest.map(|(position, _)| position)
    }
}

pub fn plan_objective(
    field: &Battlefield<'_>,
    cfg: &PlannerConfig,
    pocket_cfg: &PocketConfig,
) -> Objective {
    laser_escape(field, cfg)
        .or_else(|| charging_retreat(field, cfg))
        .or_else(|| bullet_dodge(field, cfg))
        .or_else(|| powerup_pickup(field, cfg))
        .or_else(|| cluster_escape(field, cfg))
        .or_else(|| safety_pocket(field, cfg, pocket_cfg))
        .or_else(|| boss_spacing(field, cfg))
        .unwrap_or_else(|| center(field, cfg))
}

fn laser_escape(field: &Battlefield<'_>, cfg: &PlannerConfig) -> Option<Objective> {
    let mut worst: Option<(Vec2, Vec2, f32)> = None;
    for threat in field.threats {
        if threat.category != ThreatCategory::Laser {
            continue;
        }
        let (start, end) = match threat.beam {
            Some(segment) => segment,
            None => {
                let origin = threat.source.position;
                (origin, origin + threat.source.velocity * cfg.bolt_trajectory_ticks)
            }
        };
        if start.distance(end) <= EPSILON {
            continue;
        }
        let distance = distance_to_segment(field.agent, start, end);
        if distance >= threat.radius + cfg.laser_danger_margin {
            continue;
        }
        if worst.map_or(true, |(_, _, d)| distance < d) {
            worst = Some((start, end, distance));
        }
    }

    let (start, end, _) = worst?;
    let along = (end - start).normalized();
    let mut away = along.perp();
    let side = along.cross(field.agent - start);
    if side.abs() <= EPSILON {
        away = toward_center_side(away, field);
    } else if side < 0.0 {
        away = -away;
    }
    Some(Objective {
        point: escape_point(field, away, cfg.laser_escape_distance, cfg),
        kind: ObjectiveKind::LaserDodge,
        priority: cfg.priority_laser,
    })
}

fn charging_retreat(field: &Battlefield<'_>, cfg: &PlannerConfig) -> Option<Objective> {
    let mut nearest: Option<(Vec2, f32)> = None;
    for threat in field.threats.iter().filter(|t| t.charging) {
        let distance = threat.distance_now(field.agent);
        if distance < cfg.charging_laser_radius && nearest.map_or(true, |(_, d)| distance < d) {
            nearest = Some((threat.source.position, distance));
        }
    }

    let (enemy, _) = nearest?;
    let line = (field.agent - enemy).normalized();
    let away = toward_center_side(line.perp(), field);
    Some(Objective {
        point: escape_point(field, away, cfg.laser_escape_distance, cfg),
        kind: ObjectiveKind::ChargingRetreat,
        priority: cfg.priority_charging,
    })
}

fn bullet_dodge(field: &Battlefield<'_>, cfg: &PlannerConfig) -> Option<Objective> {
    let mut urgent: Option<(&Threat, f32)> = None;
    for threat in field.threats.iter().filter(|t| t.is_projectile()) {
        // Locked beams are handled by the laser rung.
        if threat.beam.is_some() {
            continue;
        }
        let rel_pos = threat.source.position - field.agent;
        let rel_vel = threat.source.velocity - field.agent_velocity;
        let speed_sq = rel_vel.length_sq();
        let t = if speed_sq > EPSILON {
            (-rel_pos.dot(rel_vel) / speed_sq).clamp(0.0, cfg.dodge_time_ticks)
        } else {
            0.0
        };
        let closest = (rel_pos + rel_vel * t).length();
        if closest >= threat.radius {
            continue;
        }
        if urgent.map_or(true, |(_, best)| t < best) {
            urgent = Some((threat, t));
        }
    }

    let (threat, _) = urgent?;
    let heading = threat.source.velocity.normalized();
    let away = if heading.length() > EPSILON {
        toward_center_side(heading.perp(), field)
    } else {
        (field.agent - threat.source.position).normalized()
    };
    Some(Objective {
        point: escape_point(field, away, cfg.dodge_escape_distance, cfg),
        kind: ObjectiveKind::BulletDodge,
        priority: cfg.priority_bullet,
    })
}

fn powerup_pickup(field: &Battlefield<'_>, cfg: &PlannerConfig) -> Option<Objective> {
    let mut best: Option<(Vec2, f32)> = None;
    for powerup in field.powerups {
        if !powerup.position.is_finite() || !field.screen.contains(powerup.position) {
            continue;
        }
        let distance = field.agent.distance(powerup.position);
        if distance >= cfg.powerup_radius {
            continue;
        }
        let contested = field.threats.iter().any(|t| {
            t.is_projectile() && t.distance_now(powerup.position) < cfg.powerup_safety_radius
        });
        if contested {
            continue;
        }
        let score = powerup.kind.priority() * (1.0 - distance / cfg.powerup_radius);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((powerup.position, score));
        }
    }

    best.map(|(point, _)| Objective {
        point,
        kind: ObjectiveKind::Powerup,
        priority: cfg.priority_powerup,
    })
}

/// Proximity- and category-weighted threat count around `point`.
pub fn local_density(point: Vec2, threats: &[Threat], cfg: &PlannerConfig) -> f32 {
    let radius = cfg.density_radius;
    let mut density = 0.0;
    for threat in threats {
        let distance = threat.distance_now(point);
        if distance >= radius {
            continue;
        }
        let mut weight = match threat.category {
            ThreatCategory::Bullet => cfg.weight_bullet,
            ThreatCategory::Laser => cfg.weight_laser,
            ThreatCategory::Enemy => cfg.weight_enemy,
            ThreatCategory::Asteroid => cfg.weight_asteroid,
            ThreatCategory::Boss => cfg.weight_boss,
        };
        if threat.charging {
            weight += cfg.weight_charging_bonus;
        }
        density += weight * (radius - distance) / radius;
    }
    density
}

fn cluster_escape(field: &Battlefield<'_>, cfg: &PlannerConfig) -> Option<Objective> {
    let current = local_density(field.agent, field.threats, cfg);
    if current <= cfg.density_threshold {
        return None;
    }

    let samples = cfg.escape_ring_samples.max(1);
    let mut best: Option<(Vec2, f32)> = None;
    for i in 0..samples {
        let angle = TAU * i as f32 / samples as f32;
        let point = field.agent + Vec2::from_angle(angle) * cfg.escape_ring_radius;
        if !field.screen.contains_inset(point, cfg.screen_margin) {
            continue;
        }
        let density = local_density(point, field.threats, cfg);
        if best.map_or(true, |(_, d)| density < d) {
            best = Some((point, density));
        }
    }

    match best {
        Some((point, density)) if density < current => Some(Objective {
            point,
            kind: ObjectiveKind::ClusterEscape,
            priority: cfg.priority_cluster,
        }),
        _ => None,
    }
}

fn safety_pocket(
    field: &Battlefield<'_>,
    cfg: &PlannerConfig,
    pocket_cfg: &PocketConfig,
) -> Option<Objective> {
    if !field.boss_active() || field.projectile_count() < cfg.bombardment_projectiles {
        return None;
    }
    let pocket = find_pocket(field.agent, field.threats, &field.screen, pocket_cfg)?;
    Some(Objective {
        point: pocket.point,
        kind: ObjectiveKind::SafetyPocket,
        priority: cfg.priority_pocket,
    })
}

fn boss_spacing(field: &Battlefield<'_>, cfg: &PlannerConfig) -> Option<Objective> {
    if !field.boss_active() {
        return None;
    }
    let boss = field.boss_position()?;
    let screen = field.screen;
    let center = screen.center();
    let far_side = |boss_coord: f32, mid: f32, extent: f32| {
        if boss_coord >= mid {
            extent * cfg.boss_edge_offset
        } else {
            extent * (1.0 - cfg.boss_edge_offset)
        }
    };
    let point = match cfg.scroll_axis {
        ScrollAxis::Horizontal => Vec2::new(far_side(boss.x, center.x, screen.width), center.y),
        ScrollAxis::Vertical => Vec2::new(center.x, far_side(boss.y, center.y, screen.height)),
    };
    Some(Objective {
        point: screen.clamp_inset(point, cfg.screen_margin),
        kind: ObjectiveKind::BossSpacing,
        priority: cfg.priority_boss,
    })
}

fn center(field: &Battlefield<'_>, cfg: &PlannerConfig) -> Objective {
    let point = field.screen.center();
    let offset = (field.agent.distance(point) / field.screen.half_diagonal()).min(1.0);
    Objective {
        point,
        kind: ObjectiveKind::Center,
        priority: cfg.priority_center_min
            + (cfg.priority_center_max - cfg.priority_center_min) * offset,
    }
}

/// Flips `dir` so it does not point away from the screen center. A
/// perpendicular tie keeps `dir` as given.
fn toward_center_side(dir: Vec2, field: &Battlefield<'_>) -> Vec2 {
    if dir.dot(field.screen.center() - field.agent) < 0.0 {
        -dir
    } else {
        dir
    }
}

fn escape_point(
    field: &Battlefield<'_>,
    away: Vec2,
    distance: f32,
    cfg: &PlannerConfig,
) -> Vec2 {
    let raw = field.agent + away * distance;
    let biased = raw.lerp(field.screen.center(), cfg.center_bias);
    field.screen.clamp_inset(biased, cfg.screen_margin)
}
