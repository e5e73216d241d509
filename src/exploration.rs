/// One frame of the map phase: move the player, run the entity pool, apply
/// energy changes and advance the quest.

use rand::Rng;

use crate::config::{EnergyConfig, GameConfig};
use crate::enemies::EntityPool;
use crate::entities::{PickupCounts, Player, Viewport};
use crate::events::GameEvent;
use crate::movement::{init_player, step_player, tick_invulnerability, Direction};
use crate::quest::QuestTracker;

#[derive(Clone, Debug)]
pub struct Exploration {
    pub player: Player,
    pub pool: EntityPool,
    pub quest: QuestTracker,
    /// Bonuses eaten so far; becomes battle ammo at handoff.
    pub pickups: PickupCounts,
    energy_cfg: EnergyConfig,
    depleted: bool,
}

impl Exploration {
    pub fn new(cfg: &GameConfig, now_ms: f64, rng: &mut impl Rng) -> Self {
        let mut quest = QuestTracker::new(cfg.quest.clone(), cfg.score.poi_points);
        quest.reset(now_ms, rng);
        Self {
            player: init_player(&cfg.player, cfg.energy.start, cfg.energy.max),
            pool: EntityPool::new(
                cfg.enemies.clone(),
                cfg.bonuses.clone(),
                cfg.energy.heal_amount,
                now_ms,
            ),
            quest,
            pickups: PickupCounts::default(),
            energy_cfg: cfg.energy.clone(),
            depleted: false,
        }
    }

    pub fn is_quest_complete(&self) -> bool {
        self.quest.is_complete()
    }

    pub fn is_depleted(&self) -> bool {
        self.depleted
    }

    /// Advance the map phase by one frame.
    pub fn tick(
        &mut self,
        direction: Direction,
        dt: f32,
        now_ms: f64,
        viewport: &Viewport,
        rng: &mut impl Rng,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.quest.is_complete() || self.depleted {
            return events;
        }

        let moved = step_player(&self.player, direction, dt, self.pool.speed_factor(), false);
        self.player = tick_invulnerability(&moved, dt);

        let player_px = viewport.to_px(self.player.position);
        let invulnerable = self.player.invuln_timer > 0.0;
        let report = self.pool.update(dt, now_ms, viewport, player_px, invulnerable, rng);

        for kind in report.hits {
            events.push(GameEvent::EnemyHit { kind });
            // Enemies meeting the player in the same frame flee, but only the first one costs energy.
            if self.player.invuln_timer > 0.0 {
                continue;
            }
            self.player.change_energy(-self.energy_cfg.hit_damage);
            self.player.invuln_timer = self.energy_cfg.invuln_after_hit_s;
            events.push(GameEvent::EnergyLost {
                amount: self.energy_cfg.hit_damage,
                energy: self.player.energy,
            });
        }

        for bonus in report.pickups {
            self.player.change_energy(bonus.heal_amount);
            self.pickups.record(bonus.kind);
            events.push(GameEvent::BonusPicked {
                kind: bonus.kind,
                score: bonus.score_value,
                heal: bonus.heal_amount,
            });
        }

        if self.player.is_exhausted() {
            log::debug!("player out of energy");
            self.depleted = true;
            events.push(GameEvent::EnergyDepleted);
            return events;
        }

        self.quest.update(now_ms, viewport, player_px, &mut events);
        events
    }
}
