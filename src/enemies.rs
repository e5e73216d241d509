/// Roaming enemies and pickup bonuses of the exploration map.
///
/// The pool owns both collections and their spawn timers, moves them every
/// frame and tests them against the player's screen position. It reports
/// what touched the player; turning that into energy and score is the
/// caller's job.

use std::f32::consts::TAU;

use rand::Rng;

use crate::config::{BonusConfig, EnemyConfig};
use crate::entities::{Bonus, BonusKind, EnemyKind, EnemyState, RoamingEnemy, Vec2, Viewport};

/// What happened to the player during one pool update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoolReport {
    /// One entry per enemy that registered a hit this tick.
    pub hits: Vec<EnemyKind>,
    /// Bonuses collected this tick, already removed from the pool.
    pub pickups: Vec<Bonus>,
}

impl PoolReport {
    pub fn collided(&self) -> bool {
        !self.hits.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct EntityPool {
    pub enemies: Vec<RoamingEnemy>,
    pub bonuses: Vec<Bonus>,
    pub enemy_spawn_at_ms: f64,
    pub bonus_spawn_at_ms: f64,
    /// Seconds of reduced player speed left.
    pub slow_timer: f32,
    /// Decaying visual shake, in seconds.
    pub shake: f32,
    pub collisions: u32,
    pub pickups: u32,
    enemy_cfg: EnemyConfig,
    bonus_cfg: BonusConfig,
    heal_amount: i32,
}

fn jitter(rng: &mut impl Rng, max: f64) -> f64 {
    if max > 0.0 {
        rng.gen_range(0.0..max)
    } else {
        0.0
    }
}

/// Enemies appear away from the edges; bonuses may land anywhere.
fn inset_map_point(rng: &mut impl Rng) -> Vec2 {
    Vec2::new(rng.gen::<f32>() * 0.9 + 0.05, rng.gen::<f32>() * 0.9 + 0.05)
}

impl EntityPool {
    pub fn new(enemy_cfg: EnemyConfig, bonus_cfg: BonusConfig, heal_amount: i32, now_ms: f64) -> Self {
        let mut pool = Self {
            enemies: Vec::new(),
            bonuses: Vec::new(),
            enemy_spawn_at_ms: 0.0,
            bonus_spawn_at_ms: 0.0,
            slow_timer: 0.0,
            shake: 0.0,
            collisions: 0,
            pickups: 0,
            enemy_cfg,
            bonus_cfg,
            heal_amount,
        };
        pool.reset(now_ms);
        pool
    }

    /// Empty both collections and re-arm the first spawns.
    pub fn reset(&mut self, now_ms: f64) {
        self.enemies.clear();
        self.bonuses.clear();
        self.enemy_spawn_at_ms = now_ms + self.enemy_cfg.first_spawn_ms;
        self.bonus_spawn_at_ms = now_ms + self.bonus_cfg.first_spawn_ms;
        self.slow_timer = 0.0;
        self.shake = 0.0;
        self.collisions = 0;
        self.pickups = 0;
    }

    pub fn enemy_config(&self) -> &EnemyConfig {
        &self.enemy_cfg
    }

    /// Multiplier for the player's speed: reduced while the slow timer runs.
    pub fn speed_factor(&self) -> f32 {
        if self.slow_timer > 0.0 {
            self.enemy_cfg.slow_factor
        } else {
            1.0
        }
    }

    // ── Spawning ──────────────────────────────────────────────────────────────

    /// Add one enemy unless the cap is reached. Returns whether it spawned.
    pub fn spawn_enemy(&mut self, now_ms: f64, rng: &mut impl Rng) -> bool {
        if self.enemies.len() >= self.enemy_cfg.max_on_screen {
            return false;
        }
        let kind = if rng.gen_bool(0.5) {
            EnemyKind::Jelly
        } else {
            EnemyKind::Crow
        };
        let position = inset_map_point(rng);
        let heading = rng.gen::<f32>() * TAU;
        let speed = self.enemy_cfg.speed_for(kind);
        self.enemies.push(RoamingEnemy {
            kind,
            position,
            velocity: Vec2::new(heading.cos(), heading.sin()) * speed,
            age: 0.0,
            born_at_ms: now_ms,
            state: EnemyState::Normal,
        });
        log::debug!("spawned {:?} at ({:.2}, {:.2})", kind, position.x, position.y);
        true
    }

    pub fn spawn_bonus(&mut self, now_ms: f64, rng: &mut impl Rng) {
        let kind = BonusKind::ALL[rng.gen_range(0..BonusKind::ALL.len())];
        let position = Vec2::new(rng.gen(), rng.gen());
        self.bonuses.push(Bonus {
            kind,
            position,
            age: 0.0,
            lifetime: self.bonus_cfg.lifetime_s,
            born_at_ms: now_ms,
            score_value: self.bonus_cfg.score_value,
            heal_amount: self.heal_amount,
        });
        log::debug!("spawned bonus {:?} at ({:.2}, {:.2})", kind, position.x, position.y);
    }

    fn run_spawn_timers(&mut self, now_ms: f64, rng: &mut impl Rng) {
        if now_ms >= self.enemy_spawn_at_ms {
            self.spawn_enemy(now_ms, rng);
            self.enemy_spawn_at_ms =
                now_ms + self.enemy_cfg.base_spawn_ms + jitter(rng, self.enemy_cfg.spawn_jitter_ms);
        }
        if now_ms >= self.bonus_spawn_at_ms {
            self.spawn_bonus(now_ms, rng);
            self.bonus_spawn_at_ms =
                now_ms + self.bonus_cfg.base_spawn_ms + jitter(rng, self.bonus_cfg.spawn_jitter_ms);
        }
    }

    // ── Per-frame update ──────────────────────────────────────────────────────

    /// Spawn, age, move and collide everything for one frame. Enemies pass
    /// through an invulnerable player untouched; bonuses are still picked.
    pub fn update(
        &mut self,
        dt: f32,
        now_ms: f64,
        viewport: &Viewport,
        player_px: Vec2,
        player_invulnerable: bool,
        rng: &mut impl Rng,
    ) -> PoolReport {
        self.run_spawn_timers(now_ms, rng);
        self.expire_old_enemies(now_ms);
        self.tick_modifiers(dt);
        self.move_enemies(dt, now_ms);

        let mut report = PoolReport::default();
        if !player_invulnerable {
            self.collide_enemies(now_ms, viewport, player_px, rng, &mut report);
        }
        self.update_bonuses(now_ms, viewport, player_px, &mut report);

        log::trace!(
            "pool: enemies={} bonuses={} slow={:.2} shake={:.2}",
            self.enemies.len(),
            self.bonuses.len(),
            self.slow_timer,
            self.shake
        );
        report
    }

    /// Normal enemies leave after their lifetime; fleeing ones are only
    /// removed by their flee timer.
    fn expire_old_enemies(&mut self, now_ms: f64) {
        let lifetime_ms = self.enemy_cfg.lifetime_s as f64 * 1000.0;
        self.enemies.retain(|e| {
            let keep = e.is_fleeing() || now_ms - e.born_at_ms < lifetime_ms;
            if !keep {
                log::debug!("{:?} aged out", e.kind);
            }
            keep
        });
    }

    fn tick_modifiers(&mut self, dt: f32) {
        self.slow_timer = (self.slow_timer - dt).max(0.0);
        self.shake = (self.shake - dt * self.enemy_cfg.shake_decay_per_s).max(0.0);
    }

    fn move_enemies(&mut self, dt: f32, now_ms: f64) {
        let cfg = &self.enemy_cfg;
        let pad = cfg.wall_pad;
        self.enemies.retain_mut(|e| {
            e.age += dt;
            match e.state {
                EnemyState::Fleeing { until_ms } if now_ms >= until_ms => return false,
                EnemyState::Fleeing { .. } => {
                    e.velocity = e.velocity * cfg.flee_friction;
                }
                EnemyState::Normal if e.kind == EnemyKind::Jelly => {
                    e.velocity.x += (e.age * 1.7).sin() * cfg.wobble_amplitude;
                    e.velocity.y += (e.age * 1.3).cos() * cfg.wobble_amplitude;
                }
                EnemyState::Normal => {}
            }

            e.position += e.velocity * dt;

            if e.position.x < pad || e.position.x > 1.0 - pad {
                e.velocity.x = -e.velocity.x;
                e.position.x = e.position.x.clamp(pad, 1.0 - pad);
            }
            if e.position.y < pad || e.position.y > 1.0 - pad {
                e.velocity.y = -e.velocity.y;
                e.position.y = e.position.y.clamp(pad, 1.0 - pad);
            }
            true
        });
    }

    fn collide_enemies(
        &mut self,
        now_ms: f64,
        viewport: &Viewport,
        player_px: Vec2,
        rng: &mut impl Rng,
        report: &mut PoolReport,
    ) {
        let cfg = &self.enemy_cfg;
        for e in self.enemies.iter_mut() {
            if e.is_fleeing() {
                continue;
            }
            let enemy_px = viewport.to_px(e.position);
            if enemy_px.distance(player_px) >= cfg.collide_radius_px {
                continue;
            }

            self.collisions += 1;
            self.slow_timer = self.slow_timer.max(cfg.slow_after_hit_s);
            self.shake = (self.shake + cfg.shake_per_hit).min(cfg.shake_max);

            let away = (enemy_px - player_px).normalized_or(Vec2::new(1.0, 0.0));
            e.velocity = away * cfg.flee_speed;
            let until_ms = now_ms + cfg.flee_min_ms + jitter(rng, cfg.flee_rand_ms);
            e.state = EnemyState::Fleeing { until_ms };
            log::debug!("{:?} hit the player, fleeing until {:.0}ms", e.kind, until_ms);

            report.hits.push(e.kind);
        }
    }

    fn update_bonuses(
        &mut self,
        now_ms: f64,
        viewport: &Viewport,
        player_px: Vec2,
        report: &mut PoolReport,
    ) {
        let pick_radius = self.bonus_cfg.pick_radius_px;
        let mut picked: Vec<Bonus> = Vec::new();
        self.bonuses.retain_mut(|b| {
            b.age = ((now_ms - b.born_at_ms) / 1000.0).max(0.0) as f32;
            if b.age >= b.lifetime {
                return false;
            }
            if viewport.to_px(b.position).distance(player_px) < pick_radius {
                picked.push(b.clone());
                return false;
            }
            true
        });

        for b in picked {
            self.pickups += 1;
            // A snack cancels the post-collision slowdown.
            self.slow_timer = 0.0;
            self.shake = (self.shake + self.enemy_cfg.shake_per_pickup).min(self.enemy_cfg.shake_max);
            log::debug!("picked {:?}", b.kind);
            report.pickups.push(b);
        }
    }
}
