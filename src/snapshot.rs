/// Read-only views of the running session, one per frame, for whatever
/// draws the game. Nothing in here can change the simulation.

use crate::battle::BattleEngine;
use crate::entities::{
    BattleAmmo, BonusKind, Combatant, EnemyKind, PickupCounts, ProjectileKind, ProjectileOwner,
    RoundState, Vec2,
};
use crate::exploration::Exploration;
use crate::score::RunRecord;
use crate::session::{GameSession, Phase};

#[derive(Clone, Debug, PartialEq)]
pub struct EnemyView {
    pub kind: EnemyKind,
    pub position: Vec2,
    pub fleeing: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BonusView {
    pub kind: BonusKind,
    pub position: Vec2,
    /// `0` fresh → `1` about to vanish.
    pub fade: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExplorationSnapshot {
    pub player: Vec2,
    pub energy: i32,
    pub energy_max: i32,
    pub invulnerable: bool,
    pub slowed: bool,
    pub shake: f32,
    pub enemies: Vec<EnemyView>,
    pub bonuses: Vec<BonusView>,
    pub target_key: Option<String>,
    pub target: Option<Vec2>,
    pub collected: usize,
    pub total: usize,
    pub pickups: PickupCounts,
}

impl ExplorationSnapshot {
    pub fn capture(ex: &Exploration) -> Self {
        let target = ex.quest.current_target();
        Self {
            player: ex.player.position,
            energy: ex.player.energy,
            energy_max: ex.player.energy_max,
            invulnerable: ex.player.invuln_timer > 0.0,
            slowed: ex.pool.slow_timer > 0.0,
            shake: ex.pool.shake,
            enemies: ex
                .pool
                .enemies
                .iter()
                .map(|e| EnemyView {
                    kind: e.kind,
                    position: e.position,
                    fleeing: e.is_fleeing(),
                })
                .collect(),
            bonuses: ex
                .pool
                .bonuses
                .iter()
                .map(|b| BonusView {
                    kind: b.kind,
                    position: b.position,
                    fade: (b.age / b.lifetime).clamp(0.0, 1.0),
                })
                .collect(),
            target_key: target.map(|p| p.key.clone()),
            target: target.map(|p| p.position),
            collected: ex.quest.collected_count(),
            total: ex.quest.total(),
            pickups: ex.pickups,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CombatantView {
    pub position: Vec2,
    pub hp: i32,
    pub hp_max: i32,
    pub facing_right: bool,
}

impl From<&Combatant> for CombatantView {
    fn from(c: &Combatant) -> Self {
        Self {
            position: c.position,
            hp: c.hp,
            hp_max: c.hp_max,
            facing_right: c.facing.sign() > 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileView {
    pub position: Vec2,
    pub owner: ProjectileOwner,
    pub kind: ProjectileKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BattleSnapshot {
    pub arena: Vec2,
    pub player: CombatantView,
    pub foe: CombatantView,
    pub projectiles: Vec<ProjectileView>,
    pub state: RoundState,
    /// Still inside the GO flash after the countdown.
    pub show_go: bool,
    pub in_grace: bool,
    pub ammo: BattleAmmo,
    pub shake: f32,
    /// Foe sprite opacity; drops to `0` after a win.
    pub foe_alpha: f32,
    pub particles: Vec<Vec2>,
}

impl BattleSnapshot {
    pub fn capture(battle: &BattleEngine, now_ms: f64) -> Self {
        let cfg = battle.config();
        let (foe_alpha, particles) = match &battle.death {
            Some(death) => (
                death.fade,
                death.particles.iter().map(|p| p.position).collect(),
            ),
            None => (1.0, Vec::new()),
        };
        Self {
            arena: Vec2::new(cfg.arena_width, cfg.arena_height),
            player: (&battle.player).into(),
            foe: (&battle.foe).into(),
            projectiles: battle
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    position: p.position,
                    owner: p.owner,
                    kind: p.kind,
                })
                .collect(),
            state: battle.state,
            show_go: battle.state != RoundState::Countdown
                && now_ms < battle.go_at_ms + cfg.go_flash_ms,
            in_grace: battle.in_grace(now_ms),
            ammo: battle.ammo,
            shake: battle.shake,
            foe_alpha,
            particles,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PhaseSnapshot {
    Exploration(ExplorationSnapshot),
    Battle(BattleSnapshot),
    Finished(RunRecord),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub score: u32,
    pub phase: PhaseSnapshot,
}

impl Snapshot {
    pub fn capture(session: &GameSession, now_ms: f64) -> Self {
        let phase = match &session.phase {
            Phase::Exploration(ex) => PhaseSnapshot::Exploration(ExplorationSnapshot::capture(ex)),
            Phase::Battle(battle) => {
                PhaseSnapshot::Battle(BattleSnapshot::capture(battle, now_ms))
            }
            Phase::Finished(record) => PhaseSnapshot::Finished(record.clone()),
        };
        Self {
            score: session.score.score,
            phase,
        }
    }
}
