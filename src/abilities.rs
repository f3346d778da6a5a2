//! Shield, time-slow and bomb triggers.
//!
//! Decisions are pure: they read the external cooldown readouts and the
//! controller's own re-trigger timers but never change either. The
//! controller commits timer resets after the tick.

use crate::config::{AbilityConfig, TriggerThresholds};
use crate::geometry::Vec2;
use crate::snapshot::{AbilityReadouts, BossInfo, ScreenBounds};
use crate::threat::Threat;
use serde::Serialize;

/// Ticks since each ability was last requested by this controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AbilityTimers {
    pub shield: u32,
    pub time_slow: u32,
    pub bomb: u32,
}

impl AbilityTimers {
    /// Advances every timer by one tick, restarting the ones that fired.
    pub fn commit(&mut self, fired: &AbilityIntents) {
        step(&mut self.shield, fired.shield);
        step(&mut self.time_slow, fired.time_slow);
        step(&mut self.bomb, fired.bomb);
    }
}

fn step(timer: &mut u32, fired: bool) {
    *timer = if fired { 0 } else { timer.saturating_add(1) };
}

/// Last boss phase seen, for edge-triggered phase-change detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseMemory {
    last: Option<(u32, u32)>,
}

impl PhaseMemory {
    /// True once per transition: the phase id or destroyed-part count differs
    /// from the stored value. The first boss sighting is not a transition.
    pub fn detect_change(&self, boss: Option<&BossInfo>) -> bool {
        match (self.last, boss) {
            (Some((phase, destroyed)), Some(info)) => {
                info.active_phase_id != phase || info.destroyed_part_count != destroyed
            }
            _ => false,
        }
    }

    pub fn commit(&mut self, boss: Option<&BossInfo>) {
        self.last = boss.map(|info| (info.active_phase_id, info.destroyed_part_count));
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AbilityIntents {
    pub shield: bool,
    pub time_slow: bool,
    pub bomb: bool,
}

impl AbilityIntents {
    pub fn any(&self) -> bool {
        self.shield || self.time_slow || self.bomb
    }
}

/// Projectile pressure around the agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Crowding {
    /// Projectiles within `close_radius` (includes the very close ones).
    pub close: usize,
    pub very_close: usize,
    pub total: usize,
}

impl Crowding {
    pub fn measure(agent: Vec2, threats: &[Threat], cfg: &AbilityConfig) -> Self {
        let mut crowd = Self::default();
        for threat in threats.iter().filter(|t| t.is_projectile()) {
            crowd.total += 1;
            let distance = threat.distance_now(agent);
            if distance < cfg.close_radius {
                crowd.close += 1;
            }
            if distance < cfg.very_close_radius {
                crowd.very_close += 1;
            }
        }
        crowd
    }

    pub fn score(&self) -> usize {
        self.close + 2 * self.very_close
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbilityInputs {
    pub level: f32,
    pub crowd: Crowding,
    pub cornered: bool,
    pub boss_active: bool,
    pub final_phase: bool,
    pub phase_changed: bool,
    pub readouts: AbilityReadouts,
    pub timers: AbilityTimers,
}

pub fn is_cornered(agent: Vec2, screen: &ScreenBounds, cfg: &AbilityConfig) -> bool {
    screen.in_corner(agent, cfg.cornered_margin)
}

fn pressure_trigger(inputs: &AbilityInputs, t: &TriggerThresholds) -> bool {
    let (level, crowd, cornered) = if inputs.boss_active {
        (t.boss_level, t.boss_crowd_score, t.boss_cornered_level)
    } else {
        (t.level, t.crowd_score, t.cornered_level)
    };
    inputs.level >= level
        || inputs.crowd.score() >= crowd as usize
        || (inputs.cornered && inputs.level >= cornered)
}

pub fn decide_abilities(inputs: &AbilityInputs, cfg: &AbilityConfig) -> AbilityIntents {
    let r = &inputs.readouts;
    let timers = &inputs.timers;

    let shield = pressure_trigger(inputs, &cfg.shield)
        && !r.shield_active
        && r.shield_available
        && timers.shield >= cfg.shield.min_interval_ticks;

    let phase_slow = inputs.phase_changed && inputs.level >= cfg.time_slow_phase_level;
    let time_slow = (pressure_trigger(inputs, &cfg.time_slow) || phase_slow)
        && !r.time_slow_active
        && r.time_slow_available
        && timers.time_slow >= cfg.time_slow.min_interval_ticks;

    let b = &cfg.bomb;
    let bomb_wanted = inputs.level >= b.extreme_level
        || inputs.crowd.total >= b.flood_count
        || (inputs.final_phase && inputs.level >= b.final_phase_level)
        || (inputs.cornered && inputs.crowd.close >= b.cornered_close_count);
    let bomb = bomb_wanted && r.bomb_available && timers.bomb >= b.min_interval_ticks;

    AbilityIntents {
        shield,
        time_slow,
        bomb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> AbilityInputs {
        AbilityInputs {
            level: 0.0,
            crowd: Crowding::default(),
            cornered: false,
            boss_active: false,
            final_phase: false,
            phase_changed: false,
            readouts: AbilityReadouts {
                shield_active: false,
                shield_available: true,
                time_slow_active: false,
                time_slow_available: true,
                bomb_available: true,
            },
            timers: AbilityTimers {
                shield: 1_000,
                time_slow: 1_000,
                bomb: 1_000,
            },
        }
    }

    fn decide(inputs: &AbilityInputs) -> AbilityIntents {
        decide_abilities(inputs, &AbilityConfig::default())
    }

    #[test]
    fn calm_field_fires_nothing() {
        assert!(!decide(&ready()).any());
    }

    #[test]
    fn boss_lowers_shield_threshold() {
        let mut inputs = ready();
        inputs.level = 0.65;
        assert!(!decide(&inputs).shield);
        inputs.boss_active = true;
        assert!(decide(&inputs).shield);
    }

    #[test]
    fn crowd_alone_can_raise_shield() {
        let mut inputs = ready();
        inputs.crowd = Crowding {
            close: 4,
            very_close: 2,
            total: 4,
        };
        let intents = decide(&inputs);
        assert!(intents.shield);
        assert!(!intents.time_slow);
    }

    #[test]
    fn active_or_cooling_shield_is_not_requested() {
        let mut inputs = ready();
        inputs.level = 0.9;
        inputs.readouts.shield_active = true;
        assert!(!decide(&inputs).shield);

        let mut inputs = ready();
        inputs.level = 0.9;
        inputs.readouts.shield_available = false;
        assert!(!decide(&inputs).shield);

        let mut inputs = ready();
        inputs.level = 0.9;
        inputs.timers.shield = 10;
        assert!(!decide(&inputs).shield);
    }

    #[test]
    fn phase_change_slows_time_at_moderate_danger() {
        let mut inputs = ready();
        inputs.level = 0.45;
        inputs.boss_active = true;
        assert!(!decide(&inputs).time_slow);
        inputs.phase_changed = true;
        assert!(decide(&inputs).time_slow);
    }

    #[test]
    fn bomb_needs_extreme_pressure_and_a_charge() {
        let mut inputs = ready();
        inputs.level = 0.9;
        assert!(!decide(&inputs).bomb);
        inputs.level = 0.96;
        assert!(decide(&inputs).bomb);
        inputs.readouts.bomb_available = false;
        assert!(!decide(&inputs).bomb);

        let mut flooded = ready();
        flooded.crowd.total = 30;
        assert!(decide(&flooded).bomb);

        let mut finale = ready();
        finale.final_phase = true;
        finale.level = 0.5;
        assert!(decide(&finale).bomb);
    }

    #[test]
    fn cornered_agent_shields_earlier() {
        let mut inputs = ready();
        inputs.level = 0.5;
        assert!(!decide(&inputs).shield);
        inputs.cornered = true;
        assert!(decide(&inputs).shield);
    }

    #[test]
    fn phase_changes_are_edge_triggered() {
        let mut memory = PhaseMemory::default();
        let first = BossInfo {
            active_phase_id: 1,
            final_phase: false,
            destroyed_part_count: 0,
        };
        assert!(!memory.detect_change(Some(&first)));
        memory.commit(Some(&first));
        assert!(!memory.detect_change(Some(&first)));

        let arm_down = BossInfo {
            destroyed_part_count: 1,
            ..first
        };
        assert!(memory.detect_change(Some(&arm_down)));
        memory.commit(Some(&arm_down));
        assert!(!memory.detect_change(Some(&arm_down)));

        memory.commit(None);
        assert!(!memory.detect_change(Some(&first)));
    }

    #[test]
    fn timers_restart_only_for_fired_abilities() {
        let mut timers = AbilityTimers::default();
        timers.commit(&AbilityIntents::default());
        assert_eq!((timers.shield, timers.time_slow, timers.bomb), (1, 1, 1));
        timers.commit(&AbilityIntents {
            shield: true,
            ..AbilityIntents::default()
        });
        assert_eq!((timers.shield, timers.time_slow, timers.bomb), (0, 2, 2));
    }
}
