//! Coarse grid search for a low-risk region of the screen.
//!
//! Only consulted under heavy bombardment. The result is returned only when
//! it beats the agent's current spot by `min_improvement`, which keeps the
//! objective from flickering between near-equal cells.

use crate::config::PocketConfig;
use crate::geometry::Vec2;
use crate::snapshot::ScreenBounds;
use crate::threat::Threat;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PocketCandidate {
    pub point: Vec2,
    pub score: f32,
}

/// Higher is safer: center bonus minus projected danger.
pub fn score_point(
    point: Vec2,
    threats: &[Threat],
    screen: &ScreenBounds,
    cfg: &PocketConfig,
) -> f32 {
    let center_distance = point.distance(screen.center());
    let bonus = cfg.center_bonus * (1.0 - center_distance / screen.half_diagonal()).max(0.0);
    bonus - danger_at(point, threats, cfg)
}

fn danger_at(point: Vec2, threats: &[Threat], cfg: &PocketConfig) -> f32 {
    let horizon = cfg.horizon_steps.max(1) as f32;
    let mut danger = 0.0;

    for threat in threats {
        if threat.is_projectile() {
            let reach = cfg.pocket_radius + threat.radius;
            for k in 0..cfg.horizon_steps.max(1) {
                let distance = threat.distance_at(point, k as f32 * cfg.stride_ticks);
                if distance < reach {
                    let recency = 1.0 + (horizon - k as f32) / horizon;
                    danger += recency * threat.priority * (1.0 - distance / reach);
                }
            }
        } else {
            let reach = cfg.pocket_radius + threat.radius + cfg.safety_buffer;
            let distance = threat.distance_now(point);
            if distance < reach {
                danger += cfg.static_weight * threat.priority * (1.0 - distance / reach);
            }
        }
    }
    danger
}

/// Best grid cell outside the corner-exclusion margin, if it is meaningfully
/// safer than staying at `agent`.
pub fn find_pocket(
    agent: Vec2,
    threats: &[Threat],
    screen: &ScreenBounds,
    cfg: &PocketConfig,
) -> Option<PocketCandidate> {
    if cfg.columns == 0 || cfg.rows == 0 || !screen.is_valid() {
        return None;
    }
    let cell_w = screen.width / cfg.columns as f32;
    let cell_h = screen.height / cfg.rows as f32;

    let mut best: Option<PocketCandidate> = None;
    for row in 0..cfg.rows {
        for col in 0..cfg.columns {
            let point = Vec2::new((col as f32 + 0.5) * cell_w, (row as f32 + 0.5) * cell_h);
            if screen.in_corner(point, cfg.corner_margin) {
                continue;
            }
            let score = score_point(point, threats, screen, cfg);
            if best.map_or(true, |b| score > b.score) {
                best = Some(PocketCandidate { point, score });
            }
        }
    }

    let best = best?;
    let current = score_point(agent, threats, screen, cfg);
    if best.score > current + cfg.min_improvement {
        tracing::trace!(
            "pocket at ({:.0}, {:.0}) scores {:.2} vs {:.2} in place",
            best.point.x,
            best.point.y,
            best.score,
            current
        );
        Some(best)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MoverState;
    use crate::threat::ThreatCategory;
    use std::f32::consts::TAU;

    fn converging_ring(center: Vec2, count: usize, distance: f32, speed: f32) -> Vec<Threat> {
        (0..count)
            .map(|i| {
                let dir = Vec2::from_angle(TAU * i as f32 / count as f32);
                let mover = MoverState::new(center + dir * distance, -dir * speed);
                Threat::new(mover, ThreatCategory::Bullet, 40.0, 1.0, 3.0)
            })
            .collect()
    }

    #[test]
    fn calm_field_at_center_stays_put() {
        let screen = ScreenBounds::default();
        let pocket = find_pocket(screen.center(), &[], &screen, &PocketConfig::default());
        assert_eq!(pocket, None);
    }

    #[test]
    fn converging_fire_moves_pocket_away() {
        let screen = ScreenBounds::default();
        let cfg = PocketConfig::default();
        let agent = screen.center();
        let threats = converging_ring(agent, 12, 140.0, 2.0);
        let pocket = find_pocket(agent, &threats, &screen, &cfg).expect("a safer cell exists");
        assert!(!screen.in_corner(pocket.point, cfg.corner_margin));
        assert!(pocket.score > score_point(agent, &threats, &screen, &cfg) + cfg.min_improvement);
    }

    #[test]
    fn corner_cells_are_never_returned() {
        let screen = ScreenBounds::default();
        let cfg = PocketConfig::default();
        // Saturate the interior so only the corners look attractive.
        let mut threats = Vec::new();
        for x in (150..=650).step_by(50) {
            for y in (100..=500).step_by(50) {
                threats.push(Threat::new(
                    MoverState::stationary(Vec2::new(x as f32, y as f32)),
                    ThreatCategory::Asteroid,
                    55.0,
                    0.4,
                    3.0,
                ));
            }
        }
        if let Some(pocket) = find_pocket(screen.center(), &threats, &screen, &cfg) {
            assert!(!screen.in_corner(pocket.point, cfg.corner_margin));
        }
    }

    #[test]
    fn grid_entirely_in_corners_yields_nothing() {
        let screen = ScreenBounds::new(100.0, 100.0);
        let cfg = PocketConfig::default();
        let threats = converging_ring(screen.center(), 8, 10.0, 0.0);
        assert_eq!(find_pocket(screen.center(), &threats, &screen, &cfg), None);
    }
}
