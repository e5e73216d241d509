/// Discrete things that happened during a tick.
///
/// The presentation layer maps these to sounds, flashes and text; the
/// score aggregator maps them to points. The core never looks at them
/// again once emitted.

use serde::Serialize;

use crate::entities::{BonusKind, EnemyKind, Outcome, ProjectileOwner, SpecialKind};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum GameEvent {
    // ── Exploration ─────────────────────────────────────────────
    /// A roaming enemy touched the player and started fleeing.
    EnemyHit { kind: EnemyKind },

    /// Energy actually removed by an enemy hit (not sent while invulnerable).
    EnergyLost { amount: i32, energy: i32 },

    BonusPicked {
        kind: BonusKind,
        score: u32,
        heal: i32,
    },

    /// Show the "where is …?" prompt for the next target.
    AskPrompt { key: String },

    PoiReached { key: String, score: u32 },

    QuestComplete,

    EnergyDepleted,

    // ── Battle ──────────────────────────────────────────────────
    BattleStarted,

    /// The countdown is over; controls are live.
    RoundGo,

    PlayerFired { special: Option<SpecialKind> },

    FoeFired,

    /// A projectile reached its target. `absorbed` hits landed during the
    /// grace period and changed no hit points.
    ProjectileHit {
        owner: ProjectileOwner,
        damage: i32,
        absorbed: bool,
    },

    RoundResolved { outcome: Outcome },
}
