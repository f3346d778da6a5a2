//! Closed-form ballistic lead solving plus the fallback ladder used when no
//! exact intercept exists.

use crate::config::AimConfig;
use crate::geometry::{wrap_angle, Vec2, EPSILON};
use crate::snapshot::MoverState;
use serde::{Deserialize, Serialize};

const LINEAR_EPSILON: f32 = 1e-4;
const DEFAULT_PROJECTILE_SPEED: f32 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileSpeed {
    /// Hitscan: the shot lands the tick it is fired.
    Instant,
    /// Pixels per tick.
    Finite(f32),
}

impl Default for ProjectileSpeed {
    fn default() -> Self {
        Self::Finite(DEFAULT_PROJECTILE_SPEED)
    }
}

impl ProjectileSpeed {
    /// Finite, positive per-tick speed; `None` for hitscan or a degenerate speed.
    pub fn per_tick(self) -> Option<f32> {
        match self {
            Self::Instant => None,
            Self::Finite(speed) if speed.is_finite() && speed > EPSILON => Some(speed),
            Self::Finite(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterceptSolution {
    pub point: Vec2,
    /// Ticks until the projectile meets the target.
    pub time: f32,
}

impl InterceptSolution {
    pub fn is_within(&self, origin: Vec2, max_ticks: f32, max_distance: f32) -> bool {
        self.time >= 0.0 && self.time <= max_ticks && origin.distance(self.point) <= max_distance
    }
}

/// Solves `a*t^2 + b*t + c = 0` for the earliest strictly-positive meeting
/// time. Returns `None` when no such time exists; never returns NaN.
pub fn solve_intercept(
    shooter: &MoverState,
    target: &MoverState,
    speed: ProjectileSpeed,
) -> Option<InterceptSolution> {
    if !shooter.is_finite() || !target.is_finite() {
        return None;
    }
    let speed = match speed {
        ProjectileSpeed::Instant => {
            return Some(InterceptSolution {
                point: target.position,
                time: 0.0,
            })
        }
        other => other.per_tick()?,
    };

    let rel_pos = target.position - shooter.position;
    let rel_vel = target.velocity - shooter.velocity;
    let a = rel_vel.length_sq() - speed * speed;
    let b = 2.0 * rel_pos.dot(rel_vel);
    let c = rel_pos.length_sq();

    let time = if a.abs() < LINEAR_EPSILON {
        let t = if b.abs() > EPSILON { -c / b } else { 0.0 };
        if t < 0.0 {
            return None;
        }
        t
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);
        match (t1 > 0.0, t2 > 0.0) {
            (true, true) => t1.min(t2),
            (true, false) => t1,
            (false, true) => t2,
            (false, false) => return None,
        }
    };

    let point = target.at_tick(time);
    if !time.is_finite() || !point.is_finite() {
        return None;
    }
    Some(InterceptSolution { point, time })
}

/// Fixed-point lead: re-estimates flight time against the previous
/// predicted position for `passes` rounds.
pub fn simple_lead(
    shooter: &MoverState,
    target: &MoverState,
    speed: ProjectileSpeed,
    passes: u32,
) -> Vec2 {
    let Some(speed) = speed.per_tick() else {
        return target.position;
    };
    let mut predicted = target.position;
    for _ in 0..passes {
        let flight = shooter.position.distance(predicted) / speed;
        predicted = target.at_tick(flight);
    }
    predicted
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AimMethod {
    Exact,
    SimpleLead,
    Direct,
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AimSolution {
    pub angle: f32,
    pub point: Vec2,
    pub method: AimMethod,
    pub time: Option<f32>,
}

/// Aim angle toward `target`, walking the ladder
/// exact intercept → simple lead → current position.
pub fn aim_at(
    shooter: &MoverState,
    target: &MoverState,
    speed: ProjectileSpeed,
    cfg: &AimConfig,
) -> AimSolution {
    let origin = shooter.position;

    if let Some(solution) = solve_intercept(shooter, target, speed) {
        if solution.is_within(origin, cfg.max_intercept_ticks, cfg.max_intercept_distance) {
            if let Some(angle) = angle_to(origin, solution.point) {
                return AimSolution {
                    angle,
                    point: solution.point,
                    method: AimMethod::Exact,
                    time: Some(solution.time),
                };
            }
        }
    }

    if speed.per_tick().is_some() {
        let lead = simple_lead(shooter, target, speed, cfg.lead_refine_passes);
        if lead.is_finite() && origin.distance(lead) <= cfg.max_intercept_distance {
            if let Some(angle) = angle_to(origin, lead) {
                return AimSolution {
                    angle,
                    point: lead,
                    method: AimMethod::SimpleLead,
                    time: None,
                };
            }
        }
    }

    match angle_to(origin, target.position) {
        Some(angle) => AimSolution {
            angle,
            point: target.position,
            method: AimMethod::Direct,
            time: None,
        },
        None => AimSolution {
            angle: wrap_angle(cfg.default_facing),
            point: target.position,
            method: AimMethod::Default,
            time: None,
        },
    }
}

fn angle_to(from: Vec2, to: Vec2) -> Option<f32> {
    let delta = to - from;
    if delta.length() <= EPSILON || !delta.is_finite() {
        return None;
    }
    Some(wrap_angle(delta.angle()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32) -> MoverState {
        MoverState::stationary(Vec2::new(x, y))
    }

    #[test]
    fn stationary_target_time_is_distance_over_speed() {
        let solution = solve_intercept(&at(0.0, 0.0), &at(240.0, 0.0), ProjectileSpeed::Finite(8.0))
            .expect("stationary target is always reachable");
        assert!((solution.time - 30.0).abs() < 1e-3);
        assert!(solution.point.distance(Vec2::new(240.0, 0.0)) < 1e-3);
    }

    #[test]
    fn receding_faster_than_projectile_has_no_solution() {
        let target = MoverState::new(Vec2::new(100.0, 0.0), Vec2::new(10.0, 0.0));
        let result = solve_intercept(&at(0.0, 0.0), &target, ProjectileSpeed::Finite(8.0));
        assert!(result.is_none());
    }

    #[test]
    fn equal_speed_head_on_uses_linear_branch() {
        let target = MoverState::new(Vec2::new(100.0, 0.0), Vec2::new(-8.0, 0.0));
        let solution = solve_intercept(&at(0.0, 0.0), &target, ProjectileSpeed::Finite(8.0))
            .expect("closing target is reachable");
        assert!((solution.time - 6.25).abs() < 1e-3);
        assert!(solution.point.distance(Vec2::new(50.0, 0.0)) < 1e-2);
    }

    #[test]
    fn instant_weapon_aims_at_current_position() {
        let target = MoverState::new(Vec2::new(0.0, 50.0), Vec2::new(30.0, 0.0));
        let solution = solve_intercept(&at(0.0, 0.0), &target, ProjectileSpeed::Instant)
            .expect("hitscan always resolves");
        assert_eq!(solution.time, 0.0);
        assert_eq!(solution.point, target.position);
    }

    #[test]
    fn crossing_target_is_led() {
        let target = MoverState::new(Vec2::new(200.0, 0.0), Vec2::new(0.0, 2.0));
        let aim = aim_at(
            &at(0.0, 0.0),
            &target,
            ProjectileSpeed::Finite(8.0),
            &AimConfig::default(),
        );
        assert_eq!(aim.method, AimMethod::Exact);
        assert!(aim.angle > 0.0, "lead must point ahead of the target");
        assert!(aim.point.y > 0.0);
    }

    #[test]
    fn scenario_target_straight_ahead_aims_at_zero() {
        let aim = aim_at(
            &at(0.0, 0.0),
            &at(200.0, 0.0),
            ProjectileSpeed::Finite(8.0),
            &AimConfig::default(),
        );
        assert!(aim.angle.abs() < 1e-4);
    }

    #[test]
    fn receding_target_falls_back_to_simple_lead() {
        let target = MoverState::new(Vec2::new(100.0, 0.0), Vec2::new(10.0, 0.0));
        let aim = aim_at(
            &at(0.0, 0.0),
            &target,
            ProjectileSpeed::Finite(8.0),
            &AimConfig::default(),
        );
        assert_eq!(aim.method, AimMethod::SimpleLead);
        assert!(aim.angle.is_finite());
        assert!(aim.point.x > target.position.x);
    }

    #[test]
    fn coincident_positions_never_produce_nan() {
        let aim = aim_at(
            &at(5.0, 5.0),
            &at(5.0, 5.0),
            ProjectileSpeed::Finite(8.0),
            &AimConfig::default(),
        );
        assert!(aim.angle.is_finite());
        assert_eq!(aim.method, AimMethod::Default);
    }

    #[test]
    fn zero_speed_weapon_is_rejected() {
        assert!(
            solve_intercept(&at(0.0, 0.0), &at(10.0, 0.0), ProjectileSpeed::Finite(0.0)).is_none()
        );
    }
}
