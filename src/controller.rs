//! Per-agent orchestration of the tick pipeline.
//!
//! `AiController` is the only stateful unit. [`AiController::plan`] reads the
//! state and reuses scratch buffers but leaves the state untouched, so the
//! same snapshot always produces the same decision;
//! [`AiController::tick`] plans and then commits the timer and phase-memory
//! transitions.

use crate::abilities::{
    decide_abilities, is_cornered, AbilityInputs, AbilityIntents, AbilityTimers, Crowding,
    PhaseMemory,
};
use crate::config::TacticsConfig;
use crate::geometry::{wrap_angle, Vec2, EPSILON};
use crate::intercept::{aim_at, AimMethod};
use crate::objective::{plan_objective, Battlefield, Objective};
use crate::snapshot::{ingest, Contact, IngestReport, WorldSnapshot};
use crate::steering::{steer, SteeringMode, SteeringOutcome};
use crate::targeting::{collect_targets, select_target, Selection, Target};
use crate::threat::{map_threats, Threat};
use crate::threat_level::{assess, ThreatBreakdown};
use serde::Serialize;

/// The engine's sole output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ControlIntent {
    /// Radians, wrapped into `(-PI, PI]`.
    pub aim_angle: f32,
    pub movement: Vec2,
    pub shield: bool,
    pub time_slow: bool,
    pub bomb: bool,
}

impl ControlIntent {
    /// Face `aim_angle`, stand still, fire nothing.
    pub fn passive(aim_angle: f32) -> Self {
        Self {
            aim_angle: wrap_angle(aim_angle),
            movement: Vec2::ZERO,
            shield: false,
            time_slow: false,
            bomb: false,
        }
    }

    /// Replaces any non-finite field with its passive default.
    pub fn sanitized(mut self, default_facing: f32) -> Self {
        if !self.aim_angle.is_finite() {
            self.aim_angle = wrap_angle(default_facing);
        }
        if !self.movement.is_finite() {
            self.movement = Vec2::ZERO;
        }
        self
    }

    pub fn abilities(&self) -> AbilityIntents {
        AbilityIntents {
            shield: self.shield,
            time_slow: self.time_slow,
            bomb: self.bomb,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AiControllerState {
    pub timers: AbilityTimers,
    pub phase: PhaseMemory,
    pub ticks: u64,
}

/// Buffers cleared and refilled every tick.
#[derive(Debug, Default)]
pub struct TickScratch {
    pub contacts: Vec<Contact>,
    pub threats: Vec<Threat>,
    pub targets: Vec<Target>,
    pub candidates: Vec<Vec2>,
}

/// One tick's intent plus the reasoning behind it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TickDecision {
    pub intent: ControlIntent,
    pub objective: Option<Objective>,
    pub target: Option<Selection>,
    pub aim_method: Option<AimMethod>,
    pub threat: ThreatBreakdown,
    pub steering: Option<SteeringMode>,
    pub phase_changed: bool,
    pub dropped_entities: usize,
}

impl TickDecision {
    fn passive(intent: ControlIntent, report: IngestReport) -> Self {
        Self {
            intent,
            objective: None,
            target: None,
            aim_method: None,
            threat: ThreatBreakdown::default(),
            steering: None,
            phase_changed: false,
            dropped_entities: report.dropped,
        }
    }
}

#[derive(Debug)]
pub struct AiController {
    config: TacticsConfig,
    state: AiControllerState,
    scratch: TickScratch,
}

impl AiController {
    pub fn new(config: TacticsConfig) -> Self {
        Self {
            config,
            state: AiControllerState::default(),
            scratch: TickScratch::default(),
        }
    }

    pub fn config(&self) -> &TacticsConfig {
        &self.config
    }

    pub fn state(&self) -> &AiControllerState {
        &self.state
    }

    /// Fresh state for a respawn or restart; scratch capacity is kept.
    pub fn reset(&mut self) {
        self.state = AiControllerState::default();
    }

    /// Plans, then commits timers and phase memory.
    pub fn tick(&mut self, snapshot: &WorldSnapshot) -> ControlIntent {
        self.step(snapshot).intent
    }

    /// [`AiController::tick`] that also hands back the diagnostics.
    pub fn step(&mut self, snapshot: &WorldSnapshot) -> TickDecision {
        let decision = self.plan(snapshot);
        self.state.timers.commit(&decision.intent.abilities());
        self.state.phase.commit(snapshot.boss.as_ref());
        self.state.ticks += 1;

        if decision.intent.abilities().any() {
            tracing::debug!(
                tick = self.state.ticks,
                shield = decision.intent.shield,
                time_slow = decision.intent.time_slow,
                bomb = decision.intent.bomb,
                level = decision.threat.total,
                "abilities requested"
            );
        }
        decision
    }

    pub fn plan(&mut self, snapshot: &WorldSnapshot) -> TickDecision {
        let Self {
            config,
            state,
            scratch,
        } = self;
        let default_facing = config.aim.default_facing;

        if !snapshot.is_usable() {
            tracing::warn!("unusable snapshot; holding passive intent");
            return TickDecision::passive(
                ControlIntent::passive(default_facing),
                IngestReport::default(),
            );
        }

        let report = ingest(snapshot, config.tick_rate.0, &mut scratch.contacts);
        map_threats(&scratch.contacts, &config.threats, &mut scratch.threats);
        collect_targets(&scratch.contacts, &snapshot.screen, &mut scratch.targets);

        let agent = snapshot.agent;
        let speed = snapshot.weapon.projectile_speed;

        let mut target = None;
        let mut aim_method = None;
        let aim_angle = if snapshot.manual.auto_aim {
            target = select_target(&agent, &scratch.targets, speed, &config.aim);
            match target {
                Some(selection) => {
                    let mover = scratch.targets[selection.index].mover();
                    let aim = aim_at(&agent, mover, speed, &config.aim);
                    aim_method = Some(aim.method);
                    aim.angle
                }
                None => default_facing,
            }
        } else {
            pointer_angle(agent.position, snapshot.manual.pointer_target)
                .unwrap_or(default_facing)
        };

        if !snapshot.manual.auto_play {
            let mut decision = TickDecision::passive(
                ControlIntent::passive(aim_angle).sanitized(default_facing),
                report,
            );
            decision.target = target;
            decision.aim_method = aim_method;
            return decision;
        }

        let threat = assess(agent.position, &scratch.threats, &config.danger);
        let field = Battlefield {
            agent: agent.position,
            agent_velocity: agent.velocity,
            screen: snapshot.screen,
            contacts: &scratch.contacts,
            threats: &scratch.threats,
            powerups: &snapshot.powerups,
            boss: snapshot.boss,
        };
        let objective = plan_objective(&field, &config.planner, &config.pocket);
        let SteeringOutcome { movement, mode, .. } = steer(
            &agent,
            &objective,
            &scratch.threats,
            &snapshot.screen,
            &config.steering,
            &mut scratch.candidates,
        );

        let phase_changed = state.phase.detect_change(snapshot.boss.as_ref());
        let inputs = AbilityInputs {
            level: threat.total,
            crowd: Crowding::measure(agent.position, &scratch.threats, &config.abilities),
            cornered: is_cornered(agent.position, &snapshot.screen, &config.abilities),
            boss_active: field.boss_active(),
            final_phase: snapshot.boss.is_some_and(|b| b.final_phase),
            phase_changed,
            readouts: snapshot.abilities,
            timers: state.timers,
        };
        let abilities = decide_abilities(&inputs, &config.abilities);

        let intent = ControlIntent {
            aim_angle: wrap_angle(aim_angle),
            movement: movement.clamp_length(config.steering.max_move_scale),
            shield: abilities.shield,
            time_slow: abilities.time_slow,
            bomb: abilities.bomb,
        }
        .sanitized(default_facing);

        tracing::debug!(
            objective = ?objective.kind,
            steering = ?mode,
            tier = ?target.map(|t| t.tier),
            aim = ?aim_method,
            level = threat.total,
            "planned tick"
        );

        TickDecision {
            intent,
            objective: Some(objective),
            target,
            aim_method,
            threat,
            steering: Some(mode),
            phase_changed,
            dropped_entities: report.dropped,
        }
    }
}

fn pointer_angle(origin: Vec2, pointer: Option<Vec2>) -> Option<f32> {
    let delta = pointer? - origin;
    if delta.length() <= EPSILON || !delta.is_finite() {
        return None;
    }
    Some(wrap_angle(delta.angle()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{MoverState, ScreenBounds};

    #[test]
    fn sanitize_replaces_non_finite_fields() {
        let intent = ControlIntent {
            aim_angle: f32::NAN,
            movement: Vec2::new(f32::INFINITY, 0.0),
            shield: true,
            time_slow: false,
            bomb: false,
        }
        .sanitized(0.5);
        assert_eq!(intent.aim_angle, 0.5);
        assert_eq!(intent.movement, Vec2::ZERO);
        assert!(intent.shield);
    }

    #[test]
    fn unusable_snapshot_is_passive() {
        let mut controller = AiController::new(TacticsConfig::default());
        let snapshot = WorldSnapshot::empty(
            MoverState::stationary(Vec2::new(f32::NAN, 0.0)),
            ScreenBounds::default(),
        );
        let decision = controller.plan(&snapshot);
        assert_eq!(decision.intent, ControlIntent::passive(0.0));
        assert_eq!(decision.objective, None);
    }

    #[test]
    fn manual_aim_follows_pointer() {
        let mut controller = AiController::new(TacticsConfig::default());
        let mut snapshot = WorldSnapshot::empty(
            MoverState::stationary(Vec2::new(100.0, 100.0)),
            ScreenBounds::default(),
        );
        snapshot.manual.auto_aim = false;
        snapshot.manual.pointer_target = Some(Vec2::new(100.0, 200.0));
        let intent = controller.tick(&snapshot);
        assert!((intent.aim_angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn reset_clears_timers() {
        let mut controller = AiController::new(TacticsConfig::default());
        let snapshot = WorldSnapshot::empty(
            MoverState::stationary(Vec2::new(400.0, 300.0)),
            ScreenBounds::default(),
        );
        controller.tick(&snapshot);
        controller.tick(&snapshot);
        assert_eq!(controller.state().timers.shield, 2);
        controller.reset();
        assert_eq!(controller.state(), &AiControllerState::default());
    }
}
