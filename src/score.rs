/// Score and run statistics.
///
/// The board only listens: it folds the event stream of both phases into
/// a running score and [`RunStats`]. At the end of a run it produces the
/// [`RunRecord`] an external leaderboard would store.

use serde::{Deserialize, Serialize};

use crate::config::ScoreConfig;
use crate::entities::{Outcome, PickupCounts, ProjectileOwner};
use crate::events::GameEvent;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Enemy contacts, including those absorbed by invulnerability.
    pub collisions: u32,
    pub energy_lost: u32,
    pub bonuses: PickupCounts,
    pub pois_reached: u32,
    pub shots_fired: u32,
    pub specials_used: u32,
    /// Battle hits that did damage; grace-period hits are not counted.
    pub hits_landed: u32,
    pub hits_taken: u32,
}

/// Final result of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub score: u32,
    pub stats: RunStats,
    pub won: bool,
    pub elapsed_ms: f64,
}

impl RunRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Clone, Debug)]
pub struct ScoreBoard {
    pub score: u32,
    pub stats: RunStats,
    cfg: ScoreConfig,
}

impl ScoreBoard {
    pub fn new(cfg: ScoreConfig) -> Self {
        Self {
            score: 0,
            stats: RunStats::default(),
            cfg,
        }
    }

    pub fn reset(&mut self) {
        self.score = 0;
        self.stats = RunStats::default();
    }

    fn add(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Fold one event into the score. Events that carry no points are
    /// only counted.
    pub fn apply(&mut self, event: &GameEvent) {
        match event {
            GameEvent::EnemyHit { .. } => self.stats.collisions += 1,
            GameEvent::EnergyLost { amount, .. } => {
                self.stats.energy_lost += (*amount).max(0) as u32;
                self.score = self.score.saturating_sub(self.cfg.hit_penalty);
            }
            GameEvent::BonusPicked { kind, score, .. } => {
                self.stats.bonuses.record(*kind);
                self.add(*score);
            }
            GameEvent::PoiReached { score, .. } => {
                self.stats.pois_reached += 1;
                self.add(*score);
            }
            GameEvent::PlayerFired { special } => {
                self.stats.shots_fired += 1;
                if special.is_some() {
                    self.stats.specials_used += 1;
                }
            }
            GameEvent::ProjectileHit { absorbed: true, .. } => {}
            GameEvent::ProjectileHit {
                owner: ProjectileOwner::Player,
                ..
            } => {
                self.stats.hits_landed += 1;
                self.add(self.cfg.battle_hit_points);
            }
            GameEvent::ProjectileHit {
                owner: ProjectileOwner::Foe,
                ..
            } => self.stats.hits_taken += 1,
            GameEvent::AskPrompt { .. }
            | GameEvent::QuestComplete
            | GameEvent::EnergyDepleted
            | GameEvent::BattleStarted
            | GameEvent::RoundGo
            | GameEvent::FoeFired
            | GameEvent::RoundResolved { .. } => {}
        }
    }

    /// Victory bonus, scaled by the hit points the player kept.
    pub fn settle_battle(&mut self, outcome: Outcome, player_hp_left: i32) {
        if outcome == Outcome::Win {
            let bonus = self.cfg.win_points
                + self.cfg.win_points_per_hp * player_hp_left.max(0) as u32;
            log::debug!("win bonus {}", bonus);
            self.add(bonus);
        }
    }

    pub fn record(&self, won: bool, elapsed_ms: f64) -> RunRecord {
        RunRecord {
            score: self.score,
            stats: self.stats,
            won,
            elapsed_ms: elapsed_ms.max(0.0),
        }
    }
}
