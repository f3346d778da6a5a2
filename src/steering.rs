//! Turns the tick's objective into a bounded movement vector.
//!
//! Three modes, checked in order:
//! * immediate danger: a threat is about to land, so skip sampling and
//!   break perpendicular to it at full scale;
//! * sampled: a fan of headings around the objective direction is
//!   forward-simulated against every threat's predicted path and the
//!   safest heading wins;
//! * emergency: every sampled heading scored below the safety floor, so
//!   probe a coarse ring and crawl toward the least crowded side.

use crate::config::SteeringConfig;
use crate::geometry::{closest_point_on_segment, Vec2, EPSILON};
use crate::objective::Objective;
use crate::snapshot::{MoverState, ScreenBounds};
use crate::threat::{Threat, ThreatCategory};
use serde::Serialize;
use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SteeringMode {
    /// Already at the objective with nothing bearing down.
    Hold,
    Immediate,
    Sampled,
    Emergency,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SteeringOutcome {
    pub movement: Vec2,
    pub mode: SteeringMode,
    /// Score of the winning heading; zero outside sampled mode.
    pub score: f32,
    /// `1 / (1 + danger)` of the winning heading.
    pub safety: f32,
}

impl SteeringOutcome {
    fn fixed(movement: Vec2, mode: SteeringMode) -> Self {
        Self {
            movement,
            mode,
            score: 0.0,
            safety: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct HeadingScore {
    score: f32,
    danger: f32,
}

pub fn steer(
    agent: &MoverState,
    objective: &Objective,
    threats: &[Threat],
    screen: &ScreenBounds,
    cfg: &SteeringConfig,
    candidates: &mut Vec<Vec2>,
) -> SteeringOutcome {
    let origin = agent.position;

    if let Some(movement) = immediate_escape(agent, threats, screen, cfg) {
        return SteeringOutcome::fixed(movement, SteeringMode::Immediate);
    }

    let to_objective = objective.point - origin;
    let distance = to_objective.length();
    if distance <= cfg.arrive_radius && hold_danger(origin, threats, cfg) <= 0.0 {
        return SteeringOutcome::fixed(Vec2::ZERO, SteeringMode::Hold);
    }

    let base = to_objective.normalized();
    fill_candidates(base, cfg, candidates);

    let mut best: Option<(usize, HeadingScore)> = None;
    for (index, dir) in candidates.iter().enumerate() {
        let scored = score_heading(origin, *dir, base, threats, screen, cfg);
        if best.map_or(true, |(_, b)| scored.score > b.score) {
            best = Some((index, scored));
        }
    }
    let Some((index, scored)) = best else {
        return SteeringOutcome::fixed(Vec2::ZERO, SteeringMode::Hold);
    };
    tracing::trace!(
        "heading {} of {} won with score {:.3} (danger {:.3})",
        index,
        candidates.len(),
        scored.score,
        scored.danger
    );

    if scored.score < cfg.safety_floor {
        let movement = emergency_escape(origin, threats, screen, cfg);
        return SteeringOutcome {
            movement,
            mode: SteeringMode::Emergency,
            score: scored.score,
            safety: 1.0 / (1.0 + scored.danger),
        };
    }

    let safety = 1.0 / (1.0 + scored.danger);
    let mut scale = cfg.aggressiveness * cfg.min_scale.max(objective.priority * safety);
    if surrounded(origin, threats, cfg) {
        scale *= cfg.surround_boost;
    }
    if dangerous_contact_close(origin, threats, cfg) {
        scale *= cfg.damping_factor;
    }
    scale *= cfg.max_move_scale;

    let mut movement = (candidates[index] * scale).clamp_length(cfg.max_move_scale);
    // Heading straight in: do not overshoot a point we are about to reach.
    if index == 0 && !objective.kind.is_dodge() && cfg.agent_speed > EPSILON {
        let reach = (distance / cfg.agent_speed).min(1.0);
        movement = movement.clamp_length(cfg.max_move_scale * reach);
    }

    SteeringOutcome {
        movement,
        mode: SteeringMode::Sampled,
        score: scored.score,
        safety,
    }
}

/// The straight heading first, then symmetric pairs out to the spread limit.
pub fn fill_candidates(base: Vec2, cfg: &SteeringConfig, out: &mut Vec<Vec2>) {
    out.clear();
    let base_angle = if base.length() > EPSILON { base.angle() } else { 0.0 };
    out.push(Vec2::from_angle(base_angle));

    if cfg.angle_step_deg <= 0.0 {
        return;
    }
    let step = cfg.angle_step_deg.to_radians();
    let pairs = (cfg.max_spread_deg / cfg.angle_step_deg).floor() as u32;
    for k in 1..=pairs {
        let offset = step * k as f32;
        out.push(Vec2::from_angle(base_angle + offset));
        out.push(Vec2::from_angle(base_angle - offset));
    }
}

fn category_multiplier(category: ThreatCategory, cfg: &SteeringConfig) -> f32 {
    match category {
        ThreatCategory::Bullet => cfg.mult_bullet,
        ThreatCategory::Laser => cfg.mult_laser,
        ThreatCategory::Enemy => cfg.mult_enemy,
        ThreatCategory::Asteroid => cfg.mult_asteroid,
        ThreatCategory::Boss => cfg.mult_boss,
    }
}

/// Collision and near-miss penalty for standing at `point` at `ticks` ahead.
fn intrusion(
    point: Vec2,
    ticks: f32,
    time_weight: f32,
    threats: &[Threat],
    cfg: &SteeringConfig,
) -> f32 {
    let mut penalty = 0.0;
    for threat in threats {
        let distance = threat.distance_at(point, ticks);
        let radius = threat.radius.max(EPSILON);
        let scale = threat.priority * time_weight * category_multiplier(threat.category, cfg);
        if distance < radius {
            penalty += cfg.collision_weight * ((radius - distance) / radius) * scale;
        } else if cfg.near_miss_band > 0.0 && distance < radius + cfg.near_miss_band {
            let depth = (radius + cfg.near_miss_band - distance) / cfg.near_miss_band;
            penalty += cfg.near_miss_weight * depth * scale;
        }
    }
    penalty
}

fn score_heading(
    origin: Vec2,
    dir: Vec2,
    base: Vec2,
    threats: &[Threat],
    screen: &ScreenBounds,
    cfg: &SteeringConfig,
) -> HeadingScore {
    let samples = cfg.lookahead_samples.max(1);
    let horizon = samples as f32;
    let mut danger = 0.0;
    let mut cornered = false;
    let mut offscreen = false;

    for frame in 1..=samples {
        let ticks = frame as f32;
        let point = origin + dir * (cfg.agent_speed * ticks);
        let time_weight = (horizon - ticks + 1.0) / horizon;
        danger += intrusion(point, ticks, time_weight, threats, cfg);
        cornered |= screen.in_corner(point, cfg.corner_margin);
        offscreen |= !screen.contains(point);
    }

    let mut score = -danger;
    if cornered {
        score -= cfg.corner_penalty;
    }
    if offscreen {
        score -= cfg.offscreen_penalty;
    }

    let travel = cfg.agent_speed * horizon;
    if travel > EPSILON {
        let center = screen.center();
        let end = origin + dir * travel;
        let gain = (origin.distance(center) - end.distance(center)) / travel;
        score += cfg.center_weight * gain;
    }
    score += cfg.alignment_weight * dir.dot(base);

    HeadingScore { score, danger }
}

fn hold_danger(origin: Vec2, threats: &[Threat], cfg: &SteeringConfig) -> f32 {
    let samples = cfg.lookahead_samples.max(1);
    let horizon = samples as f32;
    (1..=samples)
        .map(|frame| {
            let ticks = frame as f32;
            intrusion(origin, ticks, (horizon - ticks + 1.0) / horizon, threats, cfg)
        })
        .sum()
}

/// Ticks until `threat` reaches the agent's danger radius, if its relative
/// path ever comes within that radius.
fn time_to_impact(agent: &MoverState, threat: &Threat) -> Option<f32> {
    let distance = threat.distance_now(agent.position);
    if distance < threat.radius {
        return Some(0.0);
    }
    if threat.beam.is_some() {
        return None;
    }
    let rel_pos = threat.source.position - agent.position;
    let rel_vel = threat.source.velocity - agent.velocity;
    let speed_sq = rel_vel.length_sq();
    if speed_sq <= EPSILON {
        return None;
    }
    let t_closest = -rel_pos.dot(rel_vel) / speed_sq;
    if t_closest <= 0.0 {
        return None;
    }
    let closest = (rel_pos + rel_vel * t_closest).length();
    if closest >= threat.radius {
        return None;
    }
    let inside = (threat.radius * threat.radius - closest * closest).sqrt();
    Some((t_closest - inside / speed_sq.sqrt()).max(0.0))
}

fn immediate_escape(
    agent: &MoverState,
    threats: &[Threat],
    screen: &ScreenBounds,
    cfg: &SteeringConfig,
) -> Option<Vec2> {
    let origin = agent.position;
    let mut urgent: Option<(&Threat, f32)> = None;
    for threat in threats {
        if threat.distance_now(origin) >= cfg.immediate_radius {
            continue;
        }
        let Some(tti) = time_to_impact(agent, threat) else {
            continue;
        };
        if tti < cfg.immediate_ticks && urgent.map_or(true, |(_, best)| tti < best) {
            urgent = Some((threat, tti));
        }
    }

    let (threat, tti) = urgent?;
    let to_center = (screen.center() - origin).normalized();
    let heading = threat.source.velocity.normalized();
    let escape = if let Some((start, end)) = threat.beam {
        away_from(origin, closest_point_on_segment(origin, start, end), to_center)
    } else if heading.length() > EPSILON {
        let perp = heading.perp();
        if perp.dot(to_center) < 0.0 {
            -perp
        } else {
            perp
        }
    } else {
        away_from(origin, threat.source.position, to_center)
    };

    let bias = cfg.immediate_center_bias;
    let biased = escape * (1.0 - bias) + to_center * bias;
    let dir = if biased.length() > EPSILON {
        biased.normalized()
    } else {
        escape
    };
    tracing::debug!(
        "immediate escape from {:?} threat, impact in {:.1} ticks",
        threat.category,
        tti
    );
    Some(dir * cfg.max_move_scale)
}

fn away_from(origin: Vec2, danger: Vec2, fallback: Vec2) -> Vec2 {
    let away = (origin - danger).normalized();
    if away.length() > EPSILON {
        away
    } else if fallback.length() > EPSILON {
        fallback
    } else {
        Vec2::new(1.0, 0.0)
    }
}

fn surrounded(origin: Vec2, threats: &[Threat], cfg: &SteeringConfig) -> bool {
    let nearby = threats
        .iter()
        .filter(|t| t.distance_now(origin) < cfg.surround_radius)
        .count();
    cfg.surround_count > 0 && nearby >= cfg.surround_count
}

fn dangerous_contact_close(origin: Vec2, threats: &[Threat], cfg: &SteeringConfig) -> bool {
    threats.iter().any(|t| {
        matches!(
            t.category,
            ThreatCategory::Bullet | ThreatCategory::Laser | ThreatCategory::Enemy
        ) && t.distance_now(origin) < cfg.damping_radius
    })
}

/// Coarse ring probe used when no sampled heading is acceptable.
fn emergency_escape(
    origin: Vec2,
    threats: &[Threat],
    screen: &ScreenBounds,
    cfg: &SteeringConfig,
) -> Vec2 {
    let samples = cfg.emergency_samples.max(1);
    let mut best: Option<(Vec2, f32)> = None;
    for i in 0..samples {
        let dir = Vec2::from_angle(TAU * i as f32 / samples as f32);
        let probe = origin + dir * cfg.emergency_probe;
        let mut danger = 0.0;
        for threat in threats {
            let reach = threat.radius + cfg.emergency_probe;
            let distance = threat.distance_now(probe);
            if distance < reach {
                danger += threat.priority
                    * category_multiplier(threat.category, cfg)
                    * (reach - distance)
                    / reach;
            }
        }
        if !screen.contains(probe) {
            danger += cfg.offscreen_penalty;
        }
        if best.map_or(true, |(_, d)| danger < d) {
            best = Some((dir, danger));
        }
    }
    tracing::debug!("no safe heading; emergency crawl");
    best.map_or(Vec2::ZERO, |(dir, _)| {
        (dir * (cfg.emergency_scale * cfg.max_move_scale)).clamp_length(cfg.max_move_scale)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::angle_between;
    use crate::objective::ObjectiveKind;
    use std::f32::consts::FRAC_PI_2;

    fn objective(x: f32, y: f32, kind: ObjectiveKind) -> Objective {
        Objective {
            point: Vec2::new(x, y),
            kind,
            priority: 0.6,
        }
    }

    fn run(
        agent: Vec2,
        goal: Objective,
        threats: &[Threat],
        cfg: &SteeringConfig,
    ) -> SteeringOutcome {
        let mut scratch = Vec::new();
        steer(
            &MoverState::stationary(agent),
            &goal,
            threats,
            &ScreenBounds::default(),
            cfg,
            &mut scratch,
        )
    }

    #[test]
    fn fan_is_symmetric_with_straight_heading_first() {
        let mut out = Vec::new();
        fill_candidates(Vec2::new(1.0, 0.0), &SteeringConfig::default(), &mut out);
        assert_eq!(out.len(), 31);
        assert!(out[0].distance(Vec2::new(1.0, 0.0)) < 1e-6);
        assert!((out[1].y + out[2].y).abs() < 1e-5);
    }

    #[test]
    fn incoming_bullet_triggers_perpendicular_break() {
        let agent = Vec2::new(400.0, 300.0);
        let bullet = Threat::new(
            MoverState::new(Vec2::new(500.0, 300.0), Vec2::new(-5.0, 0.0)),
            ThreatCategory::Bullet,
            40.0,
            1.0,
            3.0,
        );
        let outcome = run(
            agent,
            objective(400.0, 300.0, ObjectiveKind::Center),
            &[bullet],
            &SteeringConfig::default(),
        );
        assert_eq!(outcome.mode, SteeringMode::Immediate);
        assert!(outcome.movement.length() > 0.0);
        let off_perpendicular =
            (angle_between(outcome.movement, Vec2::new(-5.0, 0.0)) - FRAC_PI_2).abs();
        assert!(off_perpendicular < 15f32.to_radians(), "{off_perpendicular}");
    }

    #[test]
    fn crossing_bullet_that_misses_does_not_force_a_break() {
        let bullet = Threat::new(
            MoverState::new(Vec2::new(500.0, 300.0), Vec2::new(-5.0, 5.0)),
            ThreatCategory::Bullet,
            40.0,
            1.0,
            3.0,
        );
        let agent = MoverState::stationary(Vec2::new(400.0, 300.0));
        assert_eq!(time_to_impact(&agent, &bullet), None);

        let outcome = run(
            agent.position,
            objective(400.0, 300.0, ObjectiveKind::Center),
            &[bullet],
            &SteeringConfig::default(),
        );
        assert_ne!(outcome.mode, SteeringMode::Immediate);
    }

    #[test]
    fn head_on_impact_time_counts_to_the_danger_edge() {
        let bullet = Threat::new(
            MoverState::new(Vec2::new(500.0, 300.0), Vec2::new(-5.0, 0.0)),
            ThreatCategory::Bullet,
            40.0,
            1.0,
            3.0,
        );
        let agent = MoverState::stationary(Vec2::new(400.0, 300.0));
        let tti = time_to_impact(&agent, &bullet).unwrap_or(f32::NAN);
        assert!((tti - 12.0).abs() < 1e-3, "{tti}");
    }

    #[test]
    fn open_field_heads_straight_for_the_objective() {
        let outcome = run(
            Vec2::new(200.0, 300.0),
            objective(600.0, 300.0, ObjectiveKind::Powerup),
            &[],
            &SteeringConfig::default(),
        );
        assert_eq!(outcome.mode, SteeringMode::Sampled);
        assert!(outcome.movement.x > 0.0);
        assert!(outcome.movement.y.abs() < 1e-4);
    }

    #[test]
    fn obstacle_in_the_way_is_skirted() {
        let rock = Threat::new(
            MoverState::stationary(Vec2::new(300.0, 300.0)),
            ThreatCategory::Asteroid,
            55.0,
            0.4,
            3.0,
        );
        let outcome = run(
            Vec2::new(200.0, 300.0),
            objective(600.0, 300.0, ObjectiveKind::Center),
            &[rock],
            &SteeringConfig::default(),
        );
        assert_eq!(outcome.mode, SteeringMode::Sampled);
        assert!(outcome.movement.y.abs() > 0.1 * outcome.movement.length());
    }

    #[test]
    fn resting_on_objective_holds_still() {
        let outcome = run(
            Vec2::new(400.0, 300.0),
            objective(402.0, 300.0, ObjectiveKind::Center),
            &[],
            &SteeringConfig::default(),
        );
        assert_eq!(outcome.mode, SteeringMode::Hold);
        assert_eq!(outcome.movement, Vec2::ZERO);
    }

    #[test]
    fn movement_never_exceeds_max_scale() {
        let cfg = SteeringConfig {
            max_move_scale: 0.5,
            aggressiveness: 3.0,
            surround_boost: 4.0,
            ..SteeringConfig::default()
        };
        let agent = Vec2::new(400.0, 300.0);
        let threats: Vec<Threat> = (0..40)
            .map(|i| {
                let dir = Vec2::from_angle(TAU * i as f32 / 40.0);
                Threat::new(
                    MoverState::new(agent + dir * 150.0, Vec2::ZERO),
                    ThreatCategory::Asteroid,
                    20.0,
                    0.4,
                    3.0,
                )
            })
            .collect();
        for goal in [
            objective(700.0, 300.0, ObjectiveKind::Center),
            objective(400.0, 300.0, ObjectiveKind::BulletDodge),
        ] {
            let outcome = run(agent, goal, &threats, &cfg);
            assert!(outcome.movement.length() <= cfg.max_move_scale + 1e-5);
        }
    }

    #[test]
    fn boxed_in_agent_falls_back_to_emergency_crawl() {
        let cfg = SteeringConfig::default();
        let agent = Vec2::new(400.0, 300.0);
        // A dense wall of slow rocks everywhere the fan can reach.
        let mut threats = Vec::new();
        for ring in 1..=6 {
            let radius = 70.0 * ring as f32;
            for i in 0..48 {
                let dir = Vec2::from_angle(TAU * i as f32 / 48.0);
                threats.push(Threat::new(
                    MoverState::stationary(agent + dir * radius),
                    ThreatCategory::Boss,
                    60.0,
                    1.0,
                    3.0,
                ));
            }
        }
        let goal = objective(700.0, 300.0, ObjectiveKind::Center);
        let outcome = run(agent, goal, &threats, &cfg);
        assert_eq!(outcome.mode, SteeringMode::Emergency);
        assert!(outcome.movement.length() <= cfg.emergency_scale * cfg.max_move_scale + 1e-5);
    }
}
