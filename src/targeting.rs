//! Tiered firing-target selection.

use crate::config::AimConfig;
use crate::geometry::Vec2;
use crate::hit_score::hit_score;
use crate::intercept::ProjectileSpeed;
use crate::snapshot::{Contact, EnemyKind, EntityCategory, MoverState, ScreenBounds};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetBody {
    pub mover: MoverState,
    pub vulnerable: bool,
    pub kind: Option<EnemyKind>,
    pub on_screen: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Target {
    Enemy(TargetBody),
    Asteroid(TargetBody),
    BossPart(TargetBody),
}

impl Target {
    pub fn body(&self) -> &TargetBody {
        match self {
            Self::Enemy(body) | Self::Asteroid(body) | Self::BossPart(body) => body,
        }
    }

    pub fn mover(&self) -> &MoverState {
        &self.body().mover
    }

    pub fn is_asteroid(&self) -> bool {
        matches!(self, Self::Asteroid(_))
    }

    pub fn is_shooter(&self) -> bool {
        self.body().kind.is_some_and(EnemyKind::is_shooter)
    }
}

/// Rebuilds `out` with every shootable contact, resolving screen visibility once.
pub fn collect_targets(contacts: &[Contact], bounds: &ScreenBounds, out: &mut Vec<Target>) {
    out.clear();
    for contact in contacts {
        let body = TargetBody {
            mover: contact.mover,
            vulnerable: contact.vulnerable,
            kind: contact.kind,
            on_screen: bounds.contains(contact.mover.position),
        };
        let target = match contact.category {
            EntityCategory::Enemy => Target::Enemy(body),
            EntityCategory::Asteroid => Target::Asteroid(body),
            EntityCategory::BossPart => Target::BossPart(body),
            EntityCategory::EnemyBullet | EntityCategory::EnemyLaser => continue,
        };
        out.push(target);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionTier {
    CloseRange,
    Shooter,
    OnScreen,
    Asteroid,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Selection {
    /// Index into the target slice passed to [`select_target`].
    pub index: usize,
    pub tier: SelectionTier,
}

/// First non-empty tier wins; ties keep the first-encountered target.
pub fn select_target(
    shooter: &MoverState,
    targets: &[Target],
    speed: ProjectileSpeed,
    cfg: &AimConfig,
) -> Option<Selection> {
    let origin = shooter.position;
    let radius = cfg.close_target_radius;

    let mut best_close: Option<(usize, f32)> = None;
    for (index, target) in targets.iter().enumerate() {
        let body = target.body();
        if !body.vulnerable || !body.on_screen {
            continue;
        }
        let distance = origin.distance(body.mover.position);
        if distance >= radius {
            continue;
        }
        let score =
            hit_score(shooter, &body.mover, body.kind, speed, cfg) * (1.0 - distance / radius);
        if best_close.map_or(true, |(_, best)| score > best) {
            best_close = Some((index, score));
        }
    }
    if let Some((index, _)) = best_close {
        return Some(Selection {
            index,
            tier: SelectionTier::CloseRange,
        });
    }

    let tiers: [(SelectionTier, fn(&Target) -> bool); 3] = [
        (SelectionTier::Shooter, |t: &Target| {
            t.body().on_screen && t.is_shooter()
        }),
        (SelectionTier::OnScreen, |t: &Target| t.body().on_screen),
        (SelectionTier::Asteroid, Target::is_asteroid),
    ];
    for (tier, eligible) in tiers {
        if let Some(index) = nearest(origin, targets, eligible) {
            return Some(Selection { index, tier });
        }
    }
    None
}

fn nearest(origin: Vec2, targets: &[Target], eligible: fn(&Target) -> bool) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, target) in targets.iter().enumerate() {
        if !target.body().vulnerable || !eligible(target) {
            continue;
        }
        let distance = origin.distance(target.mover().position);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}
