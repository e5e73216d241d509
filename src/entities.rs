/// All game entity types: pure data, plus the clamping helpers that keep
/// them inside their documented ranges.

use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Scalar pair. Normalized map coordinates (`0..1`) during exploration,
/// arena pixels during battle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or `fallback` when the length is
    /// too small to divide by.
    pub fn normalized_or(self, fallback: Vec2) -> Vec2 {
        let len = self.length();
        if len > 1e-4 {
            Vec2::new(self.x / len, self.y / len)
        } else {
            fallback
        }
    }

    /// Both axes clamped to `[0, 1]`.
    pub fn clamp_unit(self) -> Vec2 {
        Vec2::new(self.x.clamp(0.0, 1.0), self.y.clamp(0.0, 1.0))
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Screen rectangle the map is drawn into, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub ox: f32,
    pub oy: f32,
    pub dw: f32,
    pub dh: f32,
}

impl Viewport {
    pub const fn new(ox: f32, oy: f32, dw: f32, dh: f32) -> Self {
        Self { ox, oy, dw, dh }
    }

    /// Normalized map position → pixel position.
    pub fn to_px(&self, p: Vec2) -> Vec2 {
        Vec2::new(self.ox + p.x * self.dw, self.oy + p.y * self.dh)
    }
}

// ── Exploration ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    /// Always inside `[0,1]²`.
    pub position: Vec2,
    /// Map widths per second.
    pub speed: f32,
    /// Sprite size relative to the map width.
    pub size: f32,
    pub energy: i32,
    pub energy_max: i32,
    /// Seconds left during which enemy contact does no damage.
    pub invuln_timer: f32,
}

impl Player {
    /// Add (or with a negative delta, remove) energy, clamped to `[0, energy_max]`.
    pub fn change_energy(&mut self, delta: i32) {
        self.energy = (self.energy.saturating_add(delta)).clamp(0, self.energy_max);
    }

    pub fn is_exhausted(&self) -> bool {
        self.energy <= 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Slow, wobbling drifter.
    Jelly,
    /// Fast straight flyer.
    Crow,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EnemyState {
    Normal,
    /// Knocked away after touching the player; cannot hit again and is
    /// removed once `until_ms` has passed.
    Fleeing { until_ms: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoamingEnemy {
    pub kind: EnemyKind,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Seconds since spawn, drives the jelly wobble phase.
    pub age: f32,
    pub born_at_ms: f64,
    pub state: EnemyState,
}

impl RoamingEnemy {
    pub fn is_fleeing(&self) -> bool {
        matches!(self.state, EnemyState::Fleeing { .. })
    }
}

/// Edible pickups. Each kind turns into one battle special at handoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BonusKind {
    Pastry,
    Roll,
    Coffee,
    Star,
}

impl BonusKind {
    pub const ALL: [BonusKind; 4] = [
        BonusKind::Pastry,
        BonusKind::Roll,
        BonusKind::Coffee,
        BonusKind::Star,
    ];
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bonus {
    pub kind: BonusKind,
    pub position: Vec2,
    /// Seconds since `born_at_ms`.
    pub age: f32,
    pub lifetime: f32,
    pub born_at_ms: f64,
    pub score_value: u32,
    pub heal_amount: i32,
}

/// A map location the quest sends the player to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub key: String,
    pub position: Vec2,
}

impl Poi {
    pub fn new(key: &str, x: f32, y: f32) -> Self {
        Self {
            key: key.to_string(),
            position: Vec2::new(x, y),
        }
    }
}

/// Bonuses collected during exploration, per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupCounts {
    pub pastry: u32,
    pub roll: u32,
    pub coffee: u32,
    pub star: u32,
}

impl PickupCounts {
    pub fn record(&mut self, kind: BonusKind) {
        match kind {
            BonusKind::Pastry => self.pastry += 1,
            BonusKind::Roll => self.roll += 1,
            BonusKind::Coffee => self.coffee += 1,
            BonusKind::Star => self.star += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.pastry + self.roll + self.coffee + self.star
    }
}

// ── Battle ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Either side of the boss fight. `position.y` is foot-relative: `0` is the
/// arena floor and jumping makes it negative.
#[derive(Clone, Debug, PartialEq)]
pub struct Combatant {
    pub position: Vec2,
    pub velocity: Vec2,
    pub hp: i32,
    pub hp_max: i32,
    pub on_ground: bool,
    pub facing: Facing,
}

impl Combatant {
    pub fn new(x: f32, hp_max: i32, facing: Facing) -> Self {
        Self {
            position: Vec2::new(x, 0.0),
            velocity: Vec2::ZERO,
            hp: hp_max,
            hp_max,
            on_ground: false,
            facing,
        }
    }

    /// Subtract `damage`, never going below zero.
    pub fn take_damage(&mut self, damage: i32) {
        self.hp = (self.hp - damage.max(0)).clamp(0, self.hp_max);
    }

    pub fn is_down(&self) -> bool {
        self.hp <= 0
    }
}

/// Foe AI bookkeeping; all fields are absolute timestamps in ms except
/// `wander_dir`.
#[derive(Clone, Debug, PartialEq)]
pub struct FoeBrain {
    pub fire_at_ms: f64,
    pub fire_block_until_ms: f64,
    pub jump_ready_at_ms: f64,
    pub wander_until_ms: f64,
    /// `-1` left, `0` pause, `1` right.
    pub wander_dir: i8,
    pub entry_until_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileOwner {
    Player,
    Foe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Player shot, straight along the facing direction.
    Bolt,
    /// Foe shot, aimed at the player and short-lived.
    Zap,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: i32,
    pub owner: ProjectileOwner,
    pub kind: ProjectileKind,
    /// Seconds left for finite-life projectiles.
    pub remaining_life: Option<f32>,
    /// Extra hits the projectile survives.
    pub pierce: u8,
    /// Set while a piercing shot is still passing through the combatant it struck.
    pub inside_target: bool,
}

/// Special-attack charges, consumed highest priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialKind {
    Coffee,
    Roll,
    Pastry,
    Star,
}

impl SpecialKind {
    /// Consumption order.
    pub const PRIORITY: [SpecialKind; 4] = [
        SpecialKind::Coffee,
        SpecialKind::Roll,
        SpecialKind::Pastry,
        SpecialKind::Star,
    ];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleAmmo {
    pub coffee: u32,
    pub roll: u32,
    pub pastry: u32,
    pub stars: u32,
}

impl BattleAmmo {
    pub fn count(&self, kind: SpecialKind) -> u32 {
        match kind {
            SpecialKind::Coffee => self.coffee,
            SpecialKind::Roll => self.roll,
            SpecialKind::Pastry => self.pastry,
            SpecialKind::Star => self.stars,
        }
    }

    /// Remove one charge of the highest-priority kind still available.
    pub fn take_special(&mut self) -> Option<SpecialKind> {
        let kind = SpecialKind::PRIORITY
            .into_iter()
            .find(|&k| self.count(k) > 0)?;
        let slot = match kind {
            SpecialKind::Coffee => &mut self.coffee,
            SpecialKind::Roll => &mut self.roll,
            SpecialKind::Pastry => &mut self.pastry,
            SpecialKind::Star => &mut self.stars,
        };
        *slot -= 1;
        Some(kind)
    }

    pub fn total(&self) -> u32 {
        self.coffee + self.roll + self.pastry + self.stars
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    /// "READY…": no input, no AI.
    Countdown,
    /// Foe slides in; the player can already move and shoot.
    ActiveEntry,
    Active,
    /// Terminal. Gameplay is frozen.
    Resolved(Outcome),
}

/// One debris fragment of the foe's death burst.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub life: f32,
    pub radius: f32,
}
