use crate::config::{DangerConfig, DangerTerm};
use crate::geometry::Vec2;
use crate::threat::{Threat, ThreatCategory};
use serde::Serialize;

/// Per-category contributions to the scalar danger level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ThreatBreakdown {
    pub bullets: f32,
    pub lasers: f32,
    pub charging: f32,
    pub enemies: f32,
    pub asteroids: f32,
    pub boss: f32,
    pub swarm: f32,
    /// Sum of the capped terms, clamped to `[0, 1]`.
    pub total: f32,
}

pub fn assess(agent: Vec2, threats: &[Threat], cfg: &DangerConfig) -> ThreatBreakdown {
    let mut b = ThreatBreakdown::default();
    let mut nearest_boss = f32::INFINITY;
    let mut swarm_count = 0usize;

    for threat in threats {
        let distance = threat.distance_now(agent);
        if !distance.is_finite() {
            continue;
        }
        if threat.is_projectile() && distance < cfg.swarm_radius {
            swarm_count += 1;
        }
        match threat.category {
            ThreatCategory::Bullet => b.bullets += proximity(cfg.bullet, distance),
            ThreatCategory::Laser => b.lasers += proximity(cfg.laser, distance),
            ThreatCategory::Enemy if threat.charging => {
                b.charging += proximity(cfg.charging_laser, distance)
            }
            ThreatCategory::Enemy => b.enemies += proximity(cfg.enemy, distance),
            ThreatCategory::Asteroid => b.asteroids += proximity(cfg.asteroid, distance),
            ThreatCategory::Boss => nearest_boss = nearest_boss.min(distance),
        }
    }

    b.bullets = b.bullets.min(cfg.bullet.cap);
    b.lasers = b.lasers.min(cfg.laser.cap);
    b.charging = b.charging.min(cfg.charging_laser.cap);
    b.enemies = b.enemies.min(cfg.enemy.cap);
    b.asteroids = b.asteroids.min(cfg.asteroid.cap);
    if nearest_boss < cfg.boss_radius {
        b.boss = (cfg.boss_cap * (cfg.boss_radius - nearest_boss) / cfg.boss_radius)
            .clamp(0.0, cfg.boss_cap);
    }
    b.swarm = (swarm_count as f32 * cfg.swarm_weight).min(cfg.swarm_cap);

    let sum = b.bullets + b.lasers + b.charging + b.enemies + b.asteroids + b.boss + b.swarm;
    b.total = if sum.is_finite() {
        sum.clamp(0.0, 1.0)
    } else {
        0.0
    };
    b
}

/// Scalar danger in `[0, 1]`.
pub fn threat_level(agent: Vec2, threats: &[Threat], cfg: &DangerConfig) -> f32 {
    assess(agent, threats, cfg).total
}

fn proximity(term: DangerTerm, distance: f32) -> f32 {
    if distance >= term.radius {
        return 0.0;
    }
    term.weight * (term.radius - distance) / term.radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThreatProfiles;
    use crate::snapshot::MoverState;
    use std::f32::consts::TAU;

    fn ring(category: ThreatCategory, count: usize, radius: f32) -> Vec<Threat> {
        let profiles = ThreatProfiles::default();
        (0..count)
            .map(|i| {
                let offset = Vec2::from_angle(TAU * i as f32 / count as f32) * radius;
                Threat::new(
                    MoverState::stationary(offset),
                    category,
                    profiles.bullet.radius,
                    1.0,
                    profiles.path_stride_ticks,
                )
            })
            .collect()
    }

    #[test]
    fn empty_field_is_zero() {
        assert_eq!(threat_level(Vec2::ZERO, &[], &DangerConfig::default()), 0.0);
    }

    #[test]
    fn ten_close_threats_exceed_half() {
        let threats = ring(ThreatCategory::Bullet, 10, 100.0);
        let level = threat_level(Vec2::ZERO, &threats, &DangerConfig::default());
        assert!(level > 0.5, "level={level}");
    }

    #[test]
    fn ten_threats_at_the_edge_of_150px_exceed_half() {
        let cfg = DangerConfig::default();
        for radius in [130.0, 140.0, 145.0, 149.9] {
            let level = threat_level(Vec2::ZERO, &ring(ThreatCategory::Bullet, 10, radius), &cfg);
            assert!(level > 0.5, "radius={radius} level={level}");
        }

        let mut mixed = ring(ThreatCategory::Bullet, 5, 149.0);
        for laser in ring(ThreatCategory::Laser, 5, 149.0) {
            let MoverState { position, .. } = laser.source;
            mixed.push(Threat::new(
                MoverState::stationary(position.rotated(0.3)),
                ThreatCategory::Laser,
                laser.radius,
                1.0,
                laser.path_stride,
            ));
        }
        let level = threat_level(Vec2::ZERO, &mixed, &cfg);
        assert!(level > 0.5, "mixed level={level}");
    }

    #[test]
    fn extreme_bullet_swarm_clamps_to_one() {
        let mut threats = ring(ThreatCategory::Bullet, 200, 20.0);
        threats.extend(ring(ThreatCategory::Bullet, 200, 45.0));
        let level = threat_level(Vec2::ZERO, &threats, &DangerConfig::default());
        assert_eq!(level, 1.0);
    }

    #[test]
    fn category_subtotals_are_capped() {
        let cfg = DangerConfig::default();
        let threats = ring(ThreatCategory::Asteroid, 50, 10.0);
        let breakdown = assess(Vec2::ZERO, &threats, &cfg);
        assert_eq!(breakdown.asteroids, cfg.asteroid.cap);
        assert_eq!(breakdown.total, cfg.asteroid.cap);
    }

    #[test]
    fn boss_proximity_adds_capped_term() {
        let cfg = DangerConfig::default();
        let threats = ring(ThreatCategory::Boss, 1, 0.0);
        let breakdown = assess(Vec2::ZERO, &threats, &cfg);
        assert!((breakdown.boss - cfg.boss_cap).abs() < 1e-6);
        let far = ring(ThreatCategory::Boss, 1, cfg.boss_radius + 1.0);
        assert_eq!(assess(Vec2::ZERO, &far, &cfg).boss, 0.0);
    }
}
