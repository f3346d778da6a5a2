//! Deterministic synthetic battlefields for benchmarking and smoke tests.
//!
//! Entities fly at constant velocity; projectiles that leave the screen are
//! re-fired from a random edge toward the agent. Nothing here is a game
//! simulation: there are no collisions, no damage, no spawning waves.

use crate::controller::ControlIntent;
use crate::geometry::Vec2;
use crate::intercept::ProjectileSpeed;
use crate::snapshot::{
    normalize_velocity, AbilityReadouts, BossInfo, EnemyKind, EntityCategory, MoverState,
    Powerup, PowerupKind, RawEntity, ScreenBounds, WeaponSpec, WorldSnapshot,
};

/// xorshift32; seed 0 is remapped so the generator never sticks at zero.
#[derive(Clone, Copy, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0xDEAD_BEEF } else { seed },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    pub fn below(&mut self, max: u32) -> u32 {
        if max == 0 {
            0
        } else {
            self.next_u32() % max
        }
    }

    /// Uniform in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.unit()
    }

    pub fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }
}

const ENEMY_KINDS: [EnemyKind; 6] = [
    EnemyKind::Linear,
    EnemyKind::Sinusoidal,
    EnemyKind::Erratic,
    EnemyKind::Gunner,
    EnemyKind::Laser,
    EnemyKind::Elite,
];

const POWERUP_KINDS: [PowerupKind; 5] = [
    PowerupKind::Health,
    PowerupKind::Shield,
    PowerupKind::Bomb,
    PowerupKind::Weapon,
    PowerupKind::Score,
];

/// Seconds between boss arm losses once a boss is on screen.
const BOSS_PHASE_SECONDS: f32 = 8.0;
const RESPAWN_MARGIN: f32 = 60.0;

/// A seeded battlefield that can be stepped forward one tick at a time.
#[derive(Clone, Debug)]
pub struct Scenario {
    rng: SeededRng,
    snapshot: WorldSnapshot,
    tick_rate: f32,
    ticks: u32,
}

impl Scenario {
    pub fn generate(seed: u32, screen: ScreenBounds, tick_rate: f32) -> Self {
        let mut rng = SeededRng::new(seed);
        let agent = MoverState::stationary(Vec2::new(screen.width * 0.25, screen.height * 0.5));
        let mut snapshot = WorldSnapshot::empty(agent, screen);

        snapshot.weapon = WeaponSpec {
            projectile_speed: if rng.chance(0.1) {
                ProjectileSpeed::Instant
            } else {
                ProjectileSpeed::Finite(rng.range(6.0, 12.0))
            },
        };
        snapshot.abilities = AbilityReadouts {
            shield_active: false,
            shield_available: true,
            time_slow_active: false,
            time_slow_available: true,
            bomb_available: rng.chance(0.7),
        };
        snapshot.time_dilation = if rng.chance(0.2) { 0.5 } else { 1.0 };

        let enemies = 3 + rng.below(8);
        for _ in 0..enemies {
            let kind = ENEMY_KINDS[rng.below(ENEMY_KINDS.len() as u32) as usize];
            let position = Vec2::new(
                rng.range(screen.width * 0.5, screen.width),
                rng.range(0.0, screen.height),
            );
            let mut enemy = RawEntity::per_tick(
                EntityCategory::Enemy,
                position,
                Vec2::new(rng.range(-2.0, -0.5), rng.range(-1.0, 1.0)),
            )
            .with_kind(kind);
            enemy.charging = kind == EnemyKind::Laser && rng.chance(0.3);
            enemy.radius = Some(rng.range(10.0, 24.0));
            snapshot.entities.push(enemy);
        }

        let asteroids = rng.below(6);
        for _ in 0..asteroids {
            // Per-second kinematics, as some feeds report them.
            let mut rock = RawEntity::per_tick(
                EntityCategory::Asteroid,
                Vec2::new(rng.range(0.0, screen.width), rng.range(0.0, screen.height)),
                Vec2::ZERO,
            );
            rock.vx = None;
            rock.vy = None;
            rock.dx = Some(rng.range(-90.0, 90.0));
            rock.dy = Some(rng.range(-90.0, 90.0));
            rock.radius = Some(rng.range(15.0, 40.0));
            snapshot.entities.push(rock);
        }

        if rng.chance(0.35) {
            let core = Vec2::new(screen.width * 0.8, screen.height * 0.5);
            for offset in [-90.0, 0.0, 90.0] {
                let part = RawEntity::per_tick(
                    EntityCategory::BossPart,
                    core + Vec2::new(0.0, offset),
                    Vec2::ZERO,
                );
                snapshot.entities.push(part);
            }
            snapshot.boss = Some(BossInfo {
                active_phase_id: 1,
                final_phase: false,
                destroyed_part_count: 0,
            });
        }

        let mut scenario = Self {
            rng,
            snapshot,
            tick_rate,
            ticks: 0,
        };
        let bullets = 4 + scenario.rng.below(24);
        for _ in 0..bullets {
            let bullet = scenario.fire_projectile(EntityCategory::EnemyBullet);
            scenario.snapshot.entities.push(bullet);
        }
        if scenario.rng.chance(0.4) {
            let laser = scenario.fire_projectile(EntityCategory::EnemyLaser);
            scenario.snapshot.entities.push(laser);
        }

        let powerups = scenario.rng.below(3);
        for _ in 0..powerups {
            let kind = POWERUP_KINDS[scenario.rng.below(POWERUP_KINDS.len() as u32) as usize];
            let position = Vec2::new(
                scenario.rng.range(40.0, screen.width - 40.0),
                scenario.rng.range(40.0, screen.height - 40.0),
            );
            scenario.snapshot.powerups.push(Powerup { position, kind });
        }
        scenario
    }

    pub fn snapshot(&self) -> &WorldSnapshot {
        &self.snapshot
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Moves everything one tick, applying `intent` to the agent at
    /// `agent_speed` pixels per tick.
    pub fn advance(&mut self, intent: &ControlIntent, agent_speed: f32) {
        let screen = self.snapshot.screen;
        let dilation = self.snapshot.effective_dilation();
        let tick_rate = self.tick_rate;

        let agent = &mut self.snapshot.agent;
        agent.velocity = intent.movement * agent_speed;
        agent.position = screen.clamp_inset(agent.position + agent.velocity, 0.0);

        let mut refire = Vec::new();
        for (index, entity) in self.snapshot.entities.iter_mut().enumerate() {
            let per_tick = normalize_velocity(entity, tick_rate) * dilation;
            entity.x += per_tick.x;
            entity.y += per_tick.y;
            if let Some(end) = entity.beam_end.as_mut() {
                *end += per_tick;
            }
            let inside = entity.x > -RESPAWN_MARGIN
                && entity.y > -RESPAWN_MARGIN
                && entity.x < screen.width + RESPAWN_MARGIN
                && entity.y < screen.height + RESPAWN_MARGIN;
            if !inside {
                refire.push(index);
            }
        }
        for index in refire {
            let category = self.snapshot.entities[index].category;
            let replacement = if category.is_projectile() {
                self.fire_projectile(category)
            } else {
                self.wrap_entity(index)
            };
            self.snapshot.entities[index] = replacement;
        }

        self.ticks += 1;
        let phase_ticks = (BOSS_PHASE_SECONDS * tick_rate).max(1.0) as u32;
        if self.ticks % phase_ticks == 0 {
            if let Some(boss) = self.snapshot.boss.as_mut() {
                boss.destroyed_part_count += 1;
                if boss.destroyed_part_count % 2 == 0 {
                    boss.active_phase_id += 1;
                }
                boss.final_phase = boss.active_phase_id >= 3;
            }
        }
    }

    /// A projectile entering from a random edge, aimed near the agent.
    fn fire_projectile(&mut self, category: EntityCategory) -> RawEntity {
        let screen = self.snapshot.screen;
        let rng = &mut self.rng;
        let origin = match rng.below(3) {
            0 => Vec2::new(screen.width, rng.range(0.0, screen.height)),
            1 => Vec2::new(rng.range(screen.width * 0.3, screen.width), 0.0),
            _ => Vec2::new(rng.range(screen.width * 0.3, screen.width), screen.height),
        };
        let aim = self.snapshot.agent.position
            + Vec2::new(rng.range(-80.0, 80.0), rng.range(-80.0, 80.0));
        let speed = rng.range(2.5, 6.0);
        let velocity = (aim - origin).normalized() * speed;
        let mut projectile = RawEntity::per_tick(category, origin, velocity);
        projectile.radius = Some(if category == EntityCategory::EnemyLaser {
            6.0
        } else {
            rng.range(3.0, 8.0)
        });
        projectile
    }

    /// Re-enters a drifting body from the opposite side of the screen.
    fn wrap_entity(&self, index: usize) -> RawEntity {
        let screen = self.snapshot.screen;
        let mut entity = self.snapshot.entities[index].clone();
        let reentry = RESPAWN_MARGIN * 0.5;
        if entity.x < -RESPAWN_MARGIN {
            entity.x = screen.width + reentry;
        } else if entity.x > screen.width + RESPAWN_MARGIN {
            entity.x = -reentry;
        }
        if entity.y < -RESPAWN_MARGIN {
            entity.y = screen.height + reentry;
        } else if entity.y > screen.height + RESPAWN_MARGIN {
            entity.y = -reentry;
        }
        entity
    }
}
