use shmup_autopilot::benchmark::{intent_is_bounded, run_seed};
use shmup_autopilot::config::TacticsConfig;
use shmup_autopilot::controller::{AiController, ControlIntent};
use shmup_autopilot::geometry::{angle_between, Vec2};
use shmup_autopilot::scenario::Scenario;
use shmup_autopilot::snapshot::{
    EnemyKind, EntityCategory, MoverState, RawEntity, ScreenBounds, WorldSnapshot,
};
use shmup_autopilot::steering::SteeringMode;
use std::f32::consts::FRAC_PI_2;

fn field_with(entities: Vec<RawEntity>) -> WorldSnapshot {
    let mut snapshot = WorldSnapshot::empty(
        MoverState::stationary(Vec2::new(400.0, 300.0)),
        ScreenBounds::default(),
    );
    snapshot.entities = entities;
    snapshot
}

fn incoming_bullet() -> RawEntity {
    RawEntity::per_tick(
        EntityCategory::EnemyBullet,
        Vec2::new(500.0, 300.0),
        Vec2::new(-5.0, 0.0),
    )
}

#[test]
fn bullet_about_to_hit_forces_a_sideways_break() {
    let mut controller = AiController::new(TacticsConfig::default());
    let decision = controller.step(&field_with(vec![incoming_bullet()]));

    assert_eq!(decision.steering, Some(SteeringMode::Immediate));
    let movement = decision.intent.movement;
    assert!((movement.length() - 1.0).abs() < 1e-4, "{movement:?}");
    let off_perpendicular = (angle_between(movement, Vec2::new(-1.0, 0.0)) - FRAC_PI_2).abs();
    assert!(off_perpendicular < 1e-3, "{off_perpendicular}");
}

#[test]
fn stationary_target_dead_ahead_is_aimed_at_directly() {
    let enemy = RawEntity::per_tick(EntityCategory::Enemy, Vec2::new(600.0, 300.0), Vec2::ZERO)
        .with_kind(EnemyKind::Linear);
    let mut controller = AiController::new(TacticsConfig::default());
    let decision = controller.step(&field_with(vec![enemy]));

    assert!(decision.target.is_some());
    assert!(decision.intent.aim_angle.abs() < 1e-3, "{}", decision.intent.aim_angle);
}

#[test]
fn planning_leaves_state_untouched() {
    let scenario = Scenario::generate(0xC0FF_EE11, ScreenBounds::default(), 60.0);
    let mut controller = AiController::new(TacticsConfig::default());

    let before = *controller.state();
    let first = controller.plan(scenario.snapshot());
    let second = controller.plan(scenario.snapshot());
    assert_eq!(first, second);
    assert_eq!(*controller.state(), before);

    controller.step(scenario.snapshot());
    assert_eq!(controller.state().ticks, before.ticks + 1);
}

#[test]
fn manual_modes_fall_back_to_passive_defaults() {
    let mut snapshot = field_with(vec![incoming_bullet()]);
    snapshot.manual.auto_aim = false;
    snapshot.manual.auto_play = false;
    snapshot.manual.pointer_target = None;

    let mut controller = AiController::new(TacticsConfig::default());
    let intent = controller.tick(&snapshot);
    assert_eq!(intent, ControlIntent::passive(0.0));
}

#[test]
fn per_second_velocities_are_normalized_before_planning() {
    // 300 px/s at 60 ticks/s is the same bullet as `incoming_bullet`.
    let mut bullet = incoming_bullet();
    bullet.vx = None;
    bullet.vy = None;
    bullet.dx = Some(-300.0);
    bullet.dy = Some(0.0);

    let mut a = AiController::new(TacticsConfig::default());
    let mut b = AiController::new(TacticsConfig::default());
    let per_second = a.step(&field_with(vec![bullet]));
    let per_tick = b.step(&field_with(vec![incoming_bullet()]));
    assert_eq!(per_second.steering, per_tick.steering);
    assert!(per_second.intent.movement.distance(per_tick.intent.movement) < 1e-4);
}

#[test]
fn intents_stay_bounded_across_seeded_battlefields() {
    let config = TacticsConfig::default();
    for seed in [1, 0xDEAD_BEEF, 0x1234_5678, 0xA57E_0001] {
        let record = run_seed(seed, 240, ScreenBounds::default(), &config);
        assert_eq!(record.violations, 0, "seed={seed:#010x}");
        assert_eq!(record.ticks, 240);
    }
}

#[test]
fn shrunken_move_scale_is_respected() {
    let mut config = TacticsConfig::default();
    config.steering.max_move_scale = 0.4;
    let mut controller = AiController::new(config);
    let mut scenario = Scenario::generate(7, ScreenBounds::default(), 60.0);
    for _ in 0..120 {
        let intent = controller.tick(scenario.snapshot());
        assert!(intent_is_bounded(&intent, 0.4), "{intent:?}");
        scenario.advance(&intent, 5.0);
    }
}

#[test]
fn any_validated_path_stride_plans_without_panicking() {
    let mut config = TacticsConfig::default();
    config.threats.path_stride_ticks = 0.833_333_4;
    assert!(config.validate().is_ok());

    let rock = RawEntity::per_tick(
        EntityCategory::Asteroid,
        Vec2::new(520.0, 330.0),
        Vec2::new(-1.5, 0.4),
    );
    let mut controller = AiController::new(config.clone());
    let intent = controller.tick(&field_with(vec![rock]));
    assert!(intent_is_bounded(&intent, config.steering.max_move_scale));

    let record = run_seed(0xA57E_0001, 120, ScreenBounds::default(), &config);
    assert_eq!(record.violations, 0);
}
