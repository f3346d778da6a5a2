//! Builds the per-tick threat list from normalized contacts.

use crate::config::{CategoryProfile, ThreatProfiles};
use crate::geometry::{distance_to_segment, Vec2};
use crate::snapshot::{Contact, EntityCategory, MoverState};
use serde::Serialize;

/// Predicted-path samples carried by every threat.
pub const PATH_SAMPLES: usize = 19;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    Bullet,
    Laser,
    Enemy,
    Asteroid,
    Boss,
}

impl ThreatCategory {
    pub fn is_projectile(self) -> bool {
        matches!(self, Self::Bullet | Self::Laser)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threat {
    pub source: MoverState,
    pub category: ThreatCategory,
    /// Danger radius around the threat's center (or around the beam).
    pub radius: f32,
    pub priority: f32,
    /// Beam-charging enemy; mapped with elevated radius and priority.
    pub charging: bool,
    /// Locked beam segment, if this is a laser beam rather than a bolt.
    pub beam: Option<(Vec2, Vec2)>,
    pub predicted_path: [Vec2; PATH_SAMPLES],
    pub path_stride: f32,
}

impl Threat {
    pub fn new(
        source: MoverState,
        category: ThreatCategory,
        radius: f32,
        priority: f32,
        path_stride: f32,
    ) -> Self {
        let mut predicted_path = [source.position; PATH_SAMPLES];
        for (i, sample) in predicted_path.iter_mut().enumerate() {
            *sample = source.at_tick(i as f32 * path_stride);
        }
        Self {
            source,
            category,
            radius,
            priority,
            charging: false,
            beam: None,
            predicted_path,
            path_stride,
        }
    }

    pub fn is_projectile(&self) -> bool {
        self.category.is_projectile()
    }

    pub fn horizon_ticks(&self) -> f32 {
        (PATH_SAMPLES - 1) as f32 * self.path_stride
    }

    /// Predicted center `ticks` ahead, read from the sampled path.
    pub fn position_at(&self, ticks: f32) -> Vec2 {
        if ticks <= 0.0 || self.path_stride <= 0.0 {
            return self.predicted_path[0];
        }
        let horizon = self.horizon_ticks();
        if ticks >= horizon {
            let last = self.predicted_path[PATH_SAMPLES - 1];
            return last + self.source.velocity * (ticks - horizon);
        }
        // Float rounding can push `slot` onto the last sample just below the horizon.
        let slot = ticks / self.path_stride;
        let index = (slot.floor() as usize).min(PATH_SAMPLES - 2);
        let frac = (slot - index as f32).clamp(0.0, 1.0);
        self.predicted_path[index].lerp(self.predicted_path[index + 1], frac)
    }

    /// Distance from `point` to this threat's danger core `ticks` ahead.
    pub fn distance_at(&self, point: Vec2, ticks: f32) -> f32 {
        match self.beam {
            Some((start, end)) => distance_to_segment(point, start, end),
            None => point.distance(self.position_at(ticks)),
        }
    }

    pub fn distance_now(&self, point: Vec2) -> f32 {
        self.distance_at(point, 0.0)
    }
}

/// Rebuilds `out` from `contacts`. Threats are never mutated afterwards.
pub fn map_threats(contacts: &[Contact], profiles: &ThreatProfiles, out: &mut Vec<Threat>) {
    out.clear();
    for contact in contacts {
        out.push(map_contact(contact, profiles));
    }
}

pub fn map_contact(contact: &Contact, profiles: &ThreatProfiles) -> Threat {
    let charging = contact.is_charging_laser();
    let (category, profile): (ThreatCategory, CategoryProfile) = match contact.category {
        EntityCategory::EnemyBullet => (ThreatCategory::Bullet, profiles.bullet),
        EntityCategory::EnemyLaser => (ThreatCategory::Laser, profiles.laser),
        EntityCategory::Enemy if charging => (ThreatCategory::Enemy, profiles.charging_laser),
        EntityCategory::Enemy => (ThreatCategory::Enemy, profiles.enemy),
        EntityCategory::Asteroid => (ThreatCategory::Asteroid, profiles.asteroid),
        EntityCategory::BossPart => (ThreatCategory::Boss, profiles.boss),
    };

    let mut threat = Threat::new(
        contact.mover,
        category,
        profile.radius + contact.radius,
        profile.priority,
        profiles.path_stride_ticks,
    );
    threat.charging = charging;
    if category == ThreatCategory::Laser {
        threat.beam = contact
            .beam_end
            .map(|end| (contact.mover.position, end));
    }
    threat
}
