/// Side-view boss fight.
///
/// A self-contained round: countdown, foe entry, free play, resolution.
/// Every timer is an absolute timestamp compared against the `now_ms`
/// handed to [`BattleEngine::tick`]; follow-up shots of a burst sit in a
/// generation-guarded [`DeferredQueue`] so nothing scheduled by one round
/// can fire in the next.

use std::f32::consts::TAU;

use rand::Rng;

use crate::clock::MAX_FRAME_DT;
use crate::config::BattleConfig;
use crate::deferred::DeferredQueue;
use crate::entities::{
    BattleAmmo, Combatant, Facing, FoeBrain, Outcome, Particle, PickupCounts, Projectile,
    ProjectileKind, ProjectileOwner, RoundState, Vec2,
};
use crate::events::GameEvent;

/// Exploration pickups → battle specials, one charge per bonus eaten.
pub fn ammo_from_pickups(counts: &PickupCounts) -> BattleAmmo {
    BattleAmmo {
        coffee: counts.coffee,
        roll: counts.roll,
        pastry: counts.pastry,
        stars: counts.star,
    }
}

/// Held controls. Attacks are edge-triggered through
/// [`BattleEngine::press_attack`] / [`BattleEngine::press_special`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BattleInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum BattleAction {
    FoeZap,
    PlayerShot { damage: i32, pierce: u8 },
}

/// Debris burst played when the foe goes down.
#[derive(Clone, Debug, PartialEq)]
pub struct FoeDeath {
    pub t: f32,
    /// Foe sprite opacity, `1` → `0`.
    pub fade: f32,
    pub particles: Vec<Particle>,
    pub done: bool,
}

impl FoeDeath {
    fn spawn(origin: Vec2, count: usize, rng: &mut impl Rng) -> Self {
        let particles = (0..count)
            .map(|_| {
                let angle = rng.gen::<f32>() * TAU;
                let speed = 220.0 + rng.gen::<f32>() * 260.0;
                Particle {
                    position: origin,
                    velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
                    life: 0.6 + rng.gen::<f32>() * 0.5,
                    radius: 2.0 + rng.gen::<f32>() * 3.0,
                }
            })
            .collect();
        Self {
            t: 0.0,
            fade: 1.0,
            particles,
            done: false,
        }
    }

    fn tick(&mut self, dt: f32, gravity: f32, fade_per_s: f32) {
        if self.done {
            return;
        }
        self.t += dt;
        self.fade = (1.0 - self.t * fade_per_s).max(0.0);
        self.particles.retain_mut(|p| {
            p.velocity.y += gravity * dt;
            p.position += p.velocity * dt;
            p.life -= dt;
            p.life > 0.0
        });
        if self.fade <= 0.0 && self.particles.is_empty() {
            self.done = true;
        }
    }
}

#[derive(Clone, Debug)]
pub struct BattleEngine {
    pub player: Combatant,
    pub foe: Combatant,
    pub brain: FoeBrain,
    pub projectiles: Vec<Projectile>,
    pub ammo: BattleAmmo,
    pub state: RoundState,
    pub started_at_ms: f64,
    /// End of the countdown.
    pub go_at_ms: f64,
    /// Hits before this time change no hit points.
    pub grace_until_ms: f64,
    pub slow_until_ms: f64,
    pub shake: f32,
    pub death: Option<FoeDeath>,
    pending_attack: bool,
    pending_special: bool,
    deferred: DeferredQueue<BattleAction>,
    cfg: BattleConfig,
}

fn apply_gravity(body: &mut Combatant, gravity: f32, dt: f32) {
    body.velocity.y += gravity * dt;
    body.position.y += body.velocity.y * dt;
    if body.position.y >= 0.0 {
        body.position.y = 0.0;
        body.velocity.y = 0.0;
        body.on_ground = true;
    }
}

impl BattleEngine {
    pub fn new(cfg: BattleConfig, ammo: BattleAmmo, now_ms: f64) -> Self {
        let mut engine = Self {
            player: Combatant::new(cfg.player_start_x, cfg.player_hp, Facing::Right),
            foe: Combatant::new(cfg.arena_width + cfg.foe_start_offset, cfg.foe_hp, Facing::Left),
            brain: FoeBrain {
                fire_at_ms: f64::INFINITY,
                fire_block_until_ms: f64::INFINITY,
                jump_ready_at_ms: f64::INFINITY,
                wander_until_ms: 0.0,
                wander_dir: -1,
                entry_until_ms: 0.0,
            },
            projectiles: Vec::new(),
            ammo,
            state: RoundState::Countdown,
            started_at_ms: now_ms,
            go_at_ms: now_ms,
            grace_until_ms: now_ms,
            slow_until_ms: 0.0,
            shake: 0.0,
            death: None,
            pending_attack: false,
            pending_special: false,
            deferred: DeferredQueue::new(),
            cfg,
        };
        engine.reset(ammo, now_ms);
        engine
    }

    /// Start a fresh round. Anything still scheduled from the previous one
    /// is dropped.
    pub fn reset(&mut self, ammo: BattleAmmo, now_ms: f64) {
        let cfg = &self.cfg;
        self.player = Combatant::new(cfg.player_start_x, cfg.player_hp, Facing::Right);
        self.foe = Combatant::new(cfg.arena_width + cfg.foe_start_offset, cfg.foe_hp, Facing::Left);

        self.started_at_ms = now_ms;
        self.go_at_ms = now_ms + cfg.countdown_ms;
        self.grace_until_ms = self.go_at_ms + cfg.grace_ms;

        let entry_until = self.go_at_ms + cfg.foe_entry_delay_ms;
        self.brain = FoeBrain {
            fire_at_ms: entry_until + cfg.foe_first_fire_after_entry_ms,
            fire_block_until_ms: entry_until + cfg.foe_fire_block_after_entry_ms,
            jump_ready_at_ms: entry_until + cfg.foe_jump_ready_after_entry_ms,
            wander_until_ms: entry_until,
            wander_dir: -1,
            entry_until_ms: entry_until,
        };

        self.projectiles.clear();
        self.ammo = ammo;
        self.state = RoundState::Countdown;
        self.slow_until_ms = 0.0;
        self.shake = 0.0;
        self.death = None;
        self.pending_attack = false;
        self.pending_special = false;
        self.deferred.invalidate();
        log::debug!("battle reset, go at {:.0}ms, ammo {:?}", self.go_at_ms, self.ammo);
    }

    pub fn config(&self) -> &BattleConfig {
        &self.cfg
    }

    pub fn in_grace(&self, now_ms: f64) -> bool {
        now_ms < self.grace_until_ms
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            RoundState::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome().is_some()
    }

    /// The victory debris has settled (or there is none to wait for).
    pub fn is_effect_finished(&self) -> bool {
        self.death.as_ref().map_or(true, |d| d.done)
    }

    /// Resolved and nothing left to animate: the screen may be left.
    pub fn can_leave(&self) -> bool {
        self.is_resolved() && self.is_effect_finished()
    }

    /// Queue one normal attack for the next tick. Repeated presses before
    /// that tick collapse into one shot.
    pub fn press_attack(&mut self) {
        if !self.is_resolved() {
            self.pending_attack = true;
        }
    }

    pub fn press_special(&mut self) {
        if !self.is_resolved() {
            self.pending_special = true;
        }
    }

    // ── Tick ──────────────────────────────────────────────────────────────────

    pub fn tick(
        &mut self,
        input: BattleInput,
        dt: f32,
        now_ms: f64,
        rng: &mut impl Rng,
    ) -> Vec<GameEvent> {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        let mut events = Vec::new();

        if self.is_resolved() {
            let cfg = &self.cfg;
            if let Some(death) = self.death.as_mut() {
                death.tick(dt, cfg.death_gravity, cfg.death_fade_per_s);
            }
            return events;
        }

        self.advance_round_state(now_ms, &mut events);
        let ready = self.state == RoundState::Countdown;

        self.shake = (self.shake - dt * self.cfg.shake_decay_per_s).max(0.0);
        apply_gravity(&mut self.player, self.cfg.gravity, dt);
        apply_gravity(&mut self.foe, self.cfg.gravity, dt);

        self.move_player(input, ready, dt, now_ms);

        if ready {
            // No attack buffering through the countdown.
            self.pending_attack = false;
            self.pending_special = false;
        } else {
            if std::mem::take(&mut self.pending_attack) {
                self.fire_normal(&mut events);
            }
            if std::mem::take(&mut self.pending_special) {
                self.fire_special(now_ms, &mut events);
            }
            self.run_deferred(now_ms, &mut events);
            self.update_foe(dt, now_ms, rng, &mut events);
        }

        self.update_projectiles(dt, now_ms, &mut events);
        self.check_resolution(now_ms, rng, &mut events);

        log::trace!(
            "battle {:?}: hp {}/{} shots={}",
            self.state,
            self.player.hp,
            self.foe.hp,
            self.projectiles.len()
        );
        events
    }

    fn advance_round_state(&mut self, now_ms: f64, events: &mut Vec<GameEvent>) {
        if self.state == RoundState::Countdown && now_ms >= self.go_at_ms {
            self.state = RoundState::ActiveEntry;
            events.push(GameEvent::RoundGo);
            log::debug!("battle: go");
        }
        if self.state == RoundState::ActiveEntry && now_ms >= self.brain.entry_until_ms {
            self.state = RoundState::Active;
            log::debug!("battle: foe in position");
        }
    }

    fn move_player(&mut self, input: BattleInput, ready: bool, dt: f32, now_ms: f64) {
        let cfg = &self.cfg;
        let p = &mut self.player;
        let slow = if now_ms < self.slow_until_ms {
            cfg.hit_slow_factor
        } else {
            1.0
        };

        p.velocity.x = 0.0;
        if !ready {
            if input.left {
                p.velocity.x = -cfg.player_speed * slow;
                p.facing = Facing::Left;
            }
            if input.right {
                p.velocity.x = cfg.player_speed * slow;
                p.facing = Facing::Right;
            }
            if input.up && p.on_ground {
                p.velocity.y = cfg.player_jump_vy;
                p.on_ground = false;
            }
        }
        p.position.x = (p.position.x + p.velocity.x * dt)
            .clamp(cfg.arena_margin, cfg.arena_width - cfg.arena_margin);
    }

    // ── Player attacks ────────────────────────────────────────────────────────

    fn spawn_bolt(&mut self, damage: i32, pierce: u8) {
        let p = &self.player;
        let dir = p.facing.sign();
        self.projectiles.push(Projectile {
            position: Vec2::new(p.position.x + dir * self.cfg.muzzle_offset, p.position.y),
            velocity: Vec2::new(self.cfg.shot_speed * dir, 0.0),
            damage,
            owner: ProjectileOwner::Player,
            kind: ProjectileKind::Bolt,
            remaining_life: None,
            pierce,
            inside_target: false,
        });
    }

    fn fire_normal(&mut self, events: &mut Vec<GameEvent>) {
        self.spawn_bolt(self.cfg.normal_damage, 0);
        events.push(GameEvent::PlayerFired { special: None });
    }

    /// Spend the best special charge; with none left this is a normal shot.
    fn fire_special(&mut self, now_ms: f64, events: &mut Vec<GameEvent>) {
        let Some(kind) = self.ammo.take_special() else {
            self.fire_normal(events);
            return;
        };
        let spec = self.cfg.special(kind);
        self.spawn_bolt(spec.damage, spec.pierce);
        for i in 1..spec.burst {
            self.deferred.schedule(
                now_ms + i as f64 * spec.burst_gap_ms,
                BattleAction::PlayerShot {
                    damage: spec.damage,
                    pierce: spec.pierce,
                },
            );
        }
        log::debug!("special {:?}, {} charges left", kind, self.ammo.total());
        events.push(GameEvent::PlayerFired {
            special: Some(kind),
        });
    }

    fn run_deferred(&mut self, now_ms: f64, events: &mut Vec<GameEvent>) {
        for action in self.deferred.take_due(now_ms) {
            match action {
                BattleAction::FoeZap => self.fire_zap(events),
                BattleAction::PlayerShot { damage, pierce } => self.spawn_bolt(damage, pierce),
            }
        }
    }

    // ── Foe AI ────────────────────────────────────────────────────────────────

    fn fire_zap(&mut self, events: &mut Vec<GameEvent>) {
        let foe = &self.foe;
        let fallback = Vec2::new(foe.facing.sign(), 0.0);
        let to_player = self.player.position - foe.position;
        let dir = to_player.normalized_or(fallback);
        if to_player.length() <= 1e-4 {
            log::warn!("zap aimed at zero distance, firing straight ahead");
        }
        self.projectiles.push(Projectile {
            position: Vec2::new(
                foe.position.x + foe.facing.sign() * self.cfg.muzzle_offset,
                foe.position.y,
            ),
            velocity: dir * self.cfg.zap_speed,
            damage: self.cfg.zap_damage,
            owner: ProjectileOwner::Foe,
            kind: ProjectileKind::Zap,
            remaining_life: Some(self.cfg.zap_life_s),
            pierce: 0,
            inside_target: false,
        });
        events.push(GameEvent::FoeFired);
    }

    fn update_foe(&mut self, dt: f32, now_ms: f64, rng: &mut impl Rng, events: &mut Vec<GameEvent>) {
        let cfg = &self.cfg;
        let w = cfg.arena_width;

        if now_ms < self.brain.entry_until_ms {
            let target_x = w - cfg.foe_target_margin;
            self.foe.velocity.x = -cfg.foe_entry_speed;
            self.foe.position.x = (self.foe.position.x + self.foe.velocity.x * dt).max(target_x);
            return;
        }

        let dist = self.foe.position.x - self.player.position.x;

        // Patrol the right-hand side of the arena.
        if now_ms >= self.brain.wander_until_ms {
            let toward: i8 = if dist > 0.0 { -1 } else { 1 };
            let r: f32 = rng.gen();
            self.brain.wander_dir = if r < cfg.foe_pause_prob {
                0
            } else if r < cfg.foe_pause_prob + cfg.foe_toward_prob {
                toward
            } else if rng.gen_bool(0.5) {
                -1
            } else {
                1
            };
            self.brain.wander_until_ms =
                now_ms + cfg.foe_wander_min_ms + rng.gen::<f64>() * cfg.foe_wander_rand_ms;
        }

        let min_x = cfg.arena_margin.max(w - cfg.foe_patrol_width);
        let max_x = w - cfg.arena_margin;
        self.foe.velocity.x = cfg.foe_wander_speed * self.brain.wander_dir as f32;
        self.foe.position.x += self.foe.velocity.x * dt;
        if self.foe.position.x < min_x {
            self.foe.position.x = min_x;
            self.brain.wander_dir = 1;
            self.brain.wander_until_ms = now_ms + cfg.foe_wander_bounce_ms;
        }
        if self.foe.position.x > max_x {
            self.foe.position.x = max_x;
            self.brain.wander_dir = -1;
            self.brain.wander_until_ms = now_ms + cfg.foe_wander_bounce_ms;
        }
        self.foe.facing = if self.player.position.x < self.foe.position.x {
            Facing::Left
        } else {
            Facing::Right
        };

        if now_ms >= self.brain.jump_ready_at_ms && self.foe.on_ground {
            if dist.abs() <= cfg.foe_jump_radius && rng.gen_bool(cfg.foe_jump_prob) {
                self.foe.velocity.y = cfg.foe_jump_vy;
                self.foe.on_ground = false;
                self.brain.jump_ready_at_ms = now_ms + cfg.foe_jump_cooldown_ms;
            } else {
                self.brain.jump_ready_at_ms = now_ms + cfg.foe_jump_recheck_ms;
            }
        }

        if now_ms >= self.brain.fire_at_ms && now_ms >= self.brain.fire_block_until_ms {
            let (burst, gap) = (cfg.foe_burst_count, cfg.foe_burst_gap_ms);
            let next = rng.gen_range(cfg.foe_fire_ms_min..=cfg.foe_fire_ms_max);
            self.brain.fire_at_ms = now_ms + next;
            self.fire_zap(events);
            for i in 1..burst {
                self.deferred.schedule(now_ms + i as f64 * gap, BattleAction::FoeZap);
            }
        }
    }

    // ── Projectiles & resolution ──────────────────────────────────────────────

    fn update_projectiles(&mut self, dt: f32, now_ms: f64, events: &mut Vec<GameEvent>) {
        let in_grace = self.in_grace(now_ms);
        let cfg = &self.cfg;
        let margin = cfg.out_of_bounds_margin;
        let mut kept = Vec::with_capacity(self.projectiles.len());

        for mut shot in std::mem::take(&mut self.projectiles) {
            shot.position += shot.velocity * dt;
            if let Some(life) = shot.remaining_life.as_mut() {
                *life -= dt;
            }

            let target = match shot.owner {
                ProjectileOwner::Player => &mut self.foe,
                ProjectileOwner::Foe => &mut self.player,
            };
            let touching = shot.position.distance(target.position) <= cfg.hit_radius;
            if touching && !shot.inside_target {
                if !in_grace {
                    target.take_damage(shot.damage);
                    if shot.owner == ProjectileOwner::Foe {
                        self.slow_until_ms = now_ms + cfg.hit_slow_ms;
                        self.shake = (self.shake + cfg.shake_per_hit).min(cfg.shake_max);
                    }
                }
                events.push(GameEvent::ProjectileHit {
                    owner: shot.owner,
                    damage: shot.damage,
                    absorbed: in_grace,
                });
                if shot.pierce == 0 {
                    continue;
                }
                shot.pierce -= 1;
            }
            shot.inside_target = touching;

            let out = shot.position.x < -margin
                || shot.position.x > cfg.arena_width + margin
                || shot.position.y > margin
                || shot.position.y < -(cfg.arena_height + margin);
            let expired = shot.remaining_life.map_or(false, |life| life <= 0.0);
            if !out && !expired {
                kept.push(shot);
            }
        }
        self.projectiles = kept;
    }

    /// Foe checked first: a double knock-out is a win.
    fn check_resolution(&mut self, now_ms: f64, rng: &mut impl Rng, events: &mut Vec<GameEvent>) {
        if self.in_grace(now_ms) {
            return;
        }
        let outcome = if self.foe.is_down() {
            Outcome::Win
        } else if self.player.is_down() {
            Outcome::Lose
        } else {
            return;
        };

        self.state = RoundState::Resolved(outcome);
        self.pending_attack = false;
        self.pending_special = false;
        self.deferred.invalidate();
        if outcome == Outcome::Win {
            let origin = self.foe.position + Vec2::new(0.0, -60.0);
            self.death = Some(FoeDeath::spawn(origin, self.cfg.death_particles, rng));
        }
        log::debug!("battle resolved: {:?}", outcome);
        events.push(GameEvent::RoundResolved { outcome });
    }
}
