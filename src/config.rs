/// Tuning tables.
///
/// Every struct deserializes with `#[serde(default)]`, so a JSON file only
/// has to name the values it overrides. Times ending in `_ms` are
/// milliseconds, `_s` seconds; distances ending in `_px` are screen pixels,
/// speeds without a suffix are map widths per second (exploration) or
/// arena pixels per second (battle).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{EnemyKind, Poi, SpecialKind, Vec2};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ── Exploration ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub start: Vec2,
    pub base_speed: f32,
    pub size: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start: Vec2::new(0.55, 0.25),
            base_speed: 0.288,
            size: 0.11,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub max: i32,
    pub start: i32,
    pub hit_damage: i32,
    pub heal_amount: i32,
    pub invuln_after_hit_s: f32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max: 100,
            start: 100,
            hit_damage: 18,
            heal_amount: 14,
            invuln_after_hit_s: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub max_on_screen: usize,
    pub lifetime_s: f32,
    pub first_spawn_ms: f64,
    pub base_spawn_ms: f64,
    pub spawn_jitter_ms: f64,
    pub collide_radius_px: f32,
    pub jelly_speed: f32,
    pub crow_speed: f32,
    pub wall_pad: f32,
    pub wobble_amplitude: f32,
    pub flee_speed: f32,
    pub flee_min_ms: f64,
    pub flee_rand_ms: f64,
    /// Velocity multiplier applied once per frame while fleeing.
    pub flee_friction: f32,
    pub slow_after_hit_s: f32,
    pub slow_factor: f32,
    pub shake_per_hit: f32,
    pub shake_per_pickup: f32,
    pub shake_max: f32,
    pub shake_decay_per_s: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            max_on_screen: 4,
            lifetime_s: 14.0,
            first_spawn_ms: 800.0,
            base_spawn_ms: 4200.0,
            spawn_jitter_ms: 2600.0,
            collide_radius_px: 36.0,
            jelly_speed: 0.06,
            crow_speed: 0.10,
            wall_pad: 0.02,
            wobble_amplitude: 0.0008,
            flee_speed: 0.38,
            flee_min_ms: 1600.0,
            flee_rand_ms: 700.0,
            flee_friction: 0.995,
            slow_after_hit_s: 1.25,
            slow_factor: 0.45,
            shake_per_hit: 0.6,
            shake_per_pickup: 0.2,
            shake_max: 2.4,
            shake_decay_per_s: 1.0,
        }
    }
}

impl EnemyConfig {
    pub fn speed_for(&self, kind: EnemyKind) -> f32 {
        match kind {
            EnemyKind::Jelly => self.jelly_speed,
            EnemyKind::Crow => self.crow_speed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    pub lifetime_s: f32,
    pub first_spawn_ms: f64,
    pub base_spawn_ms: f64,
    pub spawn_jitter_ms: f64,
    pub pick_radius_px: f32,
    pub score_value: u32,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            lifetime_s: 4.0,
            first_spawn_ms: 1400.0,
            base_spawn_ms: 4200.0,
            spawn_jitter_ms: 3000.0,
            pick_radius_px: 36.0,
            score_value: 25,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestConfig {
    pub reach_radius_px: f32,
    pub relock_ms: f64,
    pub ask_delay_ms: f64,
    pub pois: Vec<Poi>,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            reach_radius_px: 44.0,
            relock_ms: 900.0,
            ask_delay_ms: 900.0,
            pois: default_pois(),
        }
    }
}

/// The ten harbour and town markers of the stock map.
pub fn default_pois() -> Vec<Poi> {
    const EAST: f32 = 0.04;
    const COAST_X: f32 = 0.045;
    const COAST_Y: f32 = 0.026;
    vec![
        Poi::new("otranto", 0.86 + EAST + COAST_X, 0.48 + COAST_Y),
        Poi::new("portobadisco", 0.80 + EAST + COAST_X, 0.56 + COAST_Y),
        Poi::new("santacesarea", 0.74 + EAST + COAST_X + 0.010, 0.60 + COAST_Y + 0.008),
        Poi::new("castro", 0.72 + EAST + COAST_X + 0.012, 0.65 + COAST_Y + 0.008),
        Poi::new("ciolo", 0.66 + EAST + COAST_X + 0.070, 0.78 + COAST_Y + 0.006),
        Poi::new("leuca", 0.64 + COAST_X + 0.10, 0.90 + COAST_Y),
        Poi::new("gallipoli", 0.27, 0.62),
        Poi::new("portocesareo", 0.22, 0.46),
        Poi::new("nardo", 0.38, 0.50),
        Poi::new("lecce", 0.53, 0.28),
    ]
}

// ── Battle ────────────────────────────────────────────────────────────────────

/// One special-attack profile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecialSpec {
    pub damage: i32,
    pub pierce: u8,
    /// Shots per trigger; `1` is a single shot.
    pub burst: u32,
    pub burst_gap_ms: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub arena_width: f32,
    pub arena_height: f32,
    pub arena_margin: f32,
    pub out_of_bounds_margin: f32,
    pub gravity: f32,
    pub player_speed: f32,
    pub player_jump_vy: f32,
    pub player_start_x: f32,
    pub player_hp: i32,
    pub foe_hp: i32,
    pub muzzle_offset: f32,
    pub shot_speed: f32,
    pub normal_damage: i32,
    pub countdown_ms: f64,
    pub go_flash_ms: f64,
    /// Damage-free window after the countdown ends.
    pub grace_ms: f64,
    pub hit_radius: f32,
    pub hit_slow_ms: f64,
    pub hit_slow_factor: f32,
    pub shake_per_hit: f32,
    pub shake_max: f32,
    pub shake_decay_per_s: f32,
    pub foe_entry_delay_ms: f64,
    pub foe_entry_speed: f32,
    pub foe_start_offset: f32,
    pub foe_target_margin: f32,
    pub foe_wander_speed: f32,
    pub foe_patrol_width: f32,
    pub foe_wander_min_ms: f64,
    pub foe_wander_rand_ms: f64,
    pub foe_wander_bounce_ms: f64,
    pub foe_pause_prob: f32,
    pub foe_toward_prob: f32,
    pub foe_fire_block_after_entry_ms: f64,
    pub foe_first_fire_after_entry_ms: f64,
    pub foe_fire_ms_min: f64,
    pub foe_fire_ms_max: f64,
    pub foe_burst_count: u32,
    pub foe_burst_gap_ms: f64,
    pub zap_speed: f32,
    pub zap_damage: i32,
    pub zap_life_s: f32,
    pub foe_jump_vy: f32,
    pub foe_jump_ready_after_entry_ms: f64,
    pub foe_jump_cooldown_ms: f64,
    pub foe_jump_recheck_ms: f64,
    pub foe_jump_radius: f32,
    pub foe_jump_prob: f64,
    pub death_particles: usize,
    pub death_gravity: f32,
    pub death_fade_per_s: f32,
    pub coffee: SpecialSpec,
    pub roll: SpecialSpec,
    pub pastry: SpecialSpec,
    pub star: SpecialSpec,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            arena_width: 960.0,
            arena_height: 540.0,
            arena_margin: 60.0,
            out_of_bounds_margin: 80.0,
            gravity: 1200.0,
            player_speed: 300.0,
            player_jump_vy: -620.0,
            player_start_x: 160.0,
            player_hp: 120,
            foe_hp: 100,
            muzzle_offset: 36.0,
            shot_speed: 760.0,
            normal_damage: 12,
            countdown_ms: 900.0,
            go_flash_ms: 500.0,
            grace_ms: 1000.0,
            hit_radius: 32.0,
            hit_slow_ms: 450.0,
            hit_slow_factor: 0.45,
            shake_per_hit: 0.35,
            shake_max: 0.5,
            shake_decay_per_s: 1.8,
            foe_entry_delay_ms: 1200.0,
            foe_entry_speed: 260.0,
            foe_start_offset: 160.0,
            foe_target_margin: 100.0,
            foe_wander_speed: 160.0,
            foe_patrol_width: 260.0,
            foe_wander_min_ms: 500.0,
            foe_wander_rand_ms: 900.0,
            foe_wander_bounce_ms: 600.0,
            foe_pause_prob: 0.10,
            foe_toward_prob: 0.45,
            foe_fire_block_after_entry_ms: 300.0,
            foe_first_fire_after_entry_ms: 600.0,
            foe_fire_ms_min: 1200.0,
            foe_fire_ms_max: 2000.0,
            foe_burst_count: 2,
            foe_burst_gap_ms: 120.0,
            zap_speed: 640.0,
            zap_damage: 14,
            zap_life_s: 1.2,
            foe_jump_vy: -520.0,
            foe_jump_ready_after_entry_ms: 500.0,
            foe_jump_cooldown_ms: 900.0,
            foe_jump_recheck_ms: 180.0,
            foe_jump_radius: 320.0,
            foe_jump_prob: 0.5,
            death_particles: 28,
            death_gravity: 700.0,
            death_fade_per_s: 1.6,
            coffee: SpecialSpec { damage: 26, pierce: 1, burst: 1, burst_gap_ms: 0.0 },
            roll: SpecialSpec { damage: 18, pierce: 0, burst: 2, burst_gap_ms: 140.0 },
            pastry: SpecialSpec { damage: 22, pierce: 0, burst: 1, burst_gap_ms: 0.0 },
            star: SpecialSpec { damage: 14, pierce: 0, burst: 1, burst_gap_ms: 0.0 },
        }
    }
}

impl BattleConfig {
    pub fn special(&self, kind: SpecialKind) -> SpecialSpec {
        match kind {
            SpecialKind::Coffee => self.coffee,
            SpecialKind::Roll => self.roll,
            SpecialKind::Pastry => self.pastry,
            SpecialKind::Star => self.star,
        }
    }
}

// ── Score ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub poi_points: u32,
    pub hit_penalty: u32,
    pub battle_hit_points: u32,
    pub win_points: u32,
    pub win_points_per_hp: u32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            poi_points: 100,
            hit_penalty: 10,
            battle_hit_points: 10,
            win_points: 500,
            win_points_per_hp: 2,
        }
    }
}

// ── Root ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub energy: EnergyConfig,
    pub enemies: EnemyConfig,
    pub bonuses: BonusConfig,
    pub quest: QuestConfig,
    pub battle: BattleConfig,
    pub score: ScoreConfig,
}

impl GameConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject tuning the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.energy.max <= 0 {
            return Err(invalid("energy.max", "must be positive"));
        }
        if !(0..=self.energy.max).contains(&self.energy.start) {
            return Err(invalid("energy.start", format!("must lie in 0..={}", self.energy.max)));
        }
        if self.enemies.max_on_screen == 0 {
            return Err(invalid("enemies.max_on_screen", "must be at least 1"));
        }
        if self.enemies.lifetime_s <= 0.0 {
            return Err(invalid("enemies.lifetime_s", "must be positive"));
        }
        if self.enemies.collide_radius_px <= 0.0 {
            return Err(invalid("enemies.collide_radius_px", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.enemies.slow_factor) {
            return Err(invalid("enemies.slow_factor", "must lie in 0..=1"));
        }
        if self.bonuses.lifetime_s <= 0.0 {
            return Err(invalid("bonuses.lifetime_s", "must be positive"));
        }
        if self.bonuses.pick_radius_px <= 0.0 {
            return Err(invalid("bonuses.pick_radius_px", "must be positive"));
        }
        if self.quest.pois.is_empty() {
            return Err(invalid("quest.pois", "needs at least one point of interest"));
        }
        if self.quest.reach_radius_px <= 0.0 {
            return Err(invalid("quest.reach_radius_px", "must be positive"));
        }
        let b = &self.battle;
        if b.player_hp <= 0 || b.foe_hp <= 0 {
            return Err(invalid("battle.player_hp", "hit points must be positive"));
        }
        if b.hit_radius <= 0.0 {
            return Err(invalid("battle.hit_radius", "must be positive"));
        }
        if b.foe_fire_ms_min > b.foe_fire_ms_max {
            return Err(invalid(
                "battle.foe_fire_ms_min",
                format!("{} exceeds foe_fire_ms_max {}", b.foe_fire_ms_min, b.foe_fire_ms_max),
            ));
        }
        if !(0.0..=1.0).contains(&b.foe_jump_prob) {
            return Err(invalid("battle.foe_jump_prob", "must lie in 0..=1"));
        }
        if b.foe_pause_prob < 0.0 || b.foe_toward_prob < 0.0 || b.foe_pause_prob + b.foe_toward_prob > 1.0 {
            return Err(invalid(
                "battle.foe_toward_prob",
                "pause and toward probabilities must be non-negative and sum to at most 1",
            ));
        }
        if b.arena_width <= 2.0 * b.arena_margin {
            return Err(invalid("battle.arena_width", "arena narrower than its margins"));
        }
        Ok(())
    }
}
