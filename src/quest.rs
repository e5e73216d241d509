/// The "find the next place on the map" quest.
///
/// On reset the points of interest are shuffled once; the player then has
/// to reach them in that order. Reaching the last one completes the quest,
/// which is what opens the boss battle.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::QuestConfig;
use crate::deferred::DeferredQueue;
use crate::entities::{Poi, Vec2, Viewport};
use crate::events::GameEvent;

#[derive(Clone, Debug)]
pub struct QuestTracker {
    /// Visiting order, fixed for the whole run.
    pub order: Vec<Poi>,
    pub cursor: usize,
    pub collected: HashSet<String>,
    /// Proximity is ignored until this time, so one visit cannot count twice.
    pub locked_until_ms: f64,
    /// Index into `order` of the target to announce.
    prompts: DeferredQueue<usize>,
    cfg: QuestConfig,
    points: u32,
}

impl QuestTracker {
    pub fn new(cfg: QuestConfig, points: u32) -> Self {
        Self {
            order: Vec::new(),
            cursor: 0,
            collected: HashSet::new(),
            locked_until_ms: 0.0,
            prompts: DeferredQueue::new(),
            cfg,
            points,
        }
    }

    /// Shuffle the POIs and rewind. The first target is announced on the
    /// next update.
    pub fn reset(&mut self, now_ms: f64, rng: &mut impl Rng) {
        let mut seen = HashSet::new();
        self.order = self
            .cfg
            .pois
            .iter()
            .filter(|p| seen.insert(p.key.clone()))
            .cloned()
            .collect();
        self.order.shuffle(rng);
        self.cursor = 0;
        self.collected.clear();
        self.locked_until_ms = now_ms;
        self.prompts.invalidate();
        if !self.order.is_empty() {
            self.prompts.schedule(now_ms, 0);
        }
        log::debug!("quest reset with {} targets", self.order.len());
    }

    pub fn current_target(&self) -> Option<&Poi> {
        self.order.get(self.cursor)
    }

    pub fn is_complete(&self) -> bool {
        !self.order.is_empty() && self.cursor >= self.order.len()
    }

    pub fn total(&self) -> usize {
        self.order.len()
    }

    pub fn collected_count(&self) -> usize {
        self.collected.len()
    }

    /// Record `key` as collected. `false` if it already was.
    pub fn collect(&mut self, key: &str) -> bool {
        self.collected.insert(key.to_string())
    }

    /// Announce due prompts and test the player against the current target.
    /// Returns `true` on the tick the quest completes.
    pub fn update(
        &mut self,
        now_ms: f64,
        viewport: &Viewport,
        player_px: Vec2,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        for index in self.prompts.take_due(now_ms) {
            if index == self.cursor {
                if let Some(poi) = self.order.get(index) {
                    events.push(GameEvent::AskPrompt { key: poi.key.clone() });
                }
            }
        }

        if self.is_complete() || now_ms < self.locked_until_ms {
            return false;
        }
        let Some(target) = self.order.get(self.cursor) else {
            return false;
        };
        if viewport.to_px(target.position).distance(player_px) >= self.cfg.reach_radius_px {
            return false;
        }

        let key = target.key.clone();
        if !self.collect(&key) {
            return false;
        }
        log::debug!("reached {} ({}/{})", key, self.cursor + 1, self.order.len());
        events.push(GameEvent::PoiReached {
            key,
            score: self.points,
        });
        self.locked_until_ms = now_ms + self.cfg.relock_ms;
        self.cursor += 1;

        if self.is_complete() {
            self.prompts.invalidate();
            events.push(GameEvent::QuestComplete);
            return true;
        }
        self.prompts.schedule(now_ms + self.cfg.ask_delay_ms, self.cursor);
        false
    }
}
