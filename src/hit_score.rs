use crate::config::AimConfig;
use crate::geometry::EPSILON;
use crate::intercept::{solve_intercept, ProjectileSpeed};
use crate::snapshot::{EnemyKind, MoverState};

pub const MIN_HIT_SCORE: f32 = 0.1;
pub const MAX_HIT_SCORE: f32 = 1.0;

/// Heuristic probability that a shot fired now connects, in `[0.1, 1.0]`.
pub fn hit_score(
    shooter: &MoverState,
    target: &MoverState,
    kind: Option<EnemyKind>,
    speed: ProjectileSpeed,
    cfg: &AimConfig,
) -> f32 {
    let target_speed = target.speed();
    let mut score = 1.0;

    // Hitscan shots do not care how fast the target moves.
    if let Some(projectile_speed) = speed.per_tick() {
        score -= (target_speed / projectile_speed) * cfg.speed_ratio_penalty;

        let los = (target.position - shooter.position).normalized();
        if los.length() > EPSILON {
            let radial = target.velocity.dot(los).abs();
            let tangential = (target_speed - radial).max(0.0);
            score -= (tangential / projectile_speed) * cfg.tangential_penalty;
        }
    }

    if solve_intercept(shooter, target, speed).is_none() {
        score *= cfg.no_solution_factor;
    }

    if target_speed < cfg.stationary_speed {
        score += cfg.stationary_bonus;
    }

    match kind {
        Some(EnemyKind::Linear) => score += cfg.linear_bonus,
        Some(EnemyKind::Sinusoidal) => score -= cfg.sinusoidal_penalty,
        Some(EnemyKind::Erratic) => score -= cfg.erratic_penalty,
        _ => {}
    }

    if score.is_finite() {
        score.clamp(MIN_HIT_SCORE, MAX_HIT_SCORE)
    } else {
        MIN_HIT_SCORE
    }
}
