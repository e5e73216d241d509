/// One run of the game: map exploration, then the boss battle, then the
/// final record.
///
/// `Phase` is the only place the run's mode lives, so a battle can't tick
/// while the run is finished and the map can't tick during the battle.

use rand::Rng;

use crate::battle::{ammo_from_pickups, BattleEngine, BattleInput};
use crate::clock::MAX_FRAME_DT;
use crate::config::GameConfig;
use crate::entities::{Outcome, Viewport};
use crate::events::GameEvent;
use crate::exploration::Exploration;
use crate::movement::Direction;
use crate::score::{RunRecord, ScoreBoard};

/// Everything the host read from the controls this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionInput {
    /// Map movement.
    pub direction: Direction,
    /// Held battle controls.
    pub battle: BattleInput,
    /// Edge-triggered: set only on the frame the key went down.
    pub attack: bool,
    pub special: bool,
}

#[derive(Clone, Debug)]
pub enum Phase {
    Exploration(Exploration),
    Battle(BattleEngine),
    Finished(RunRecord),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Exploration(_) => "exploration",
            Phase::Battle(_) => "battle",
            Phase::Finished(_) => "finished",
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameSession {
    pub phase: Phase,
    pub score: ScoreBoard,
    pub started_at_ms: f64,
    generation: u64,
    cfg: GameConfig,
}

impl GameSession {
    pub fn new(cfg: GameConfig, now_ms: f64, rng: &mut impl Rng) -> Self {
        let mut session = Self {
            phase: Phase::Exploration(Exploration::new(&cfg, now_ms, rng)),
            score: ScoreBoard::new(cfg.score.clone()),
            started_at_ms: now_ms,
            generation: 0,
            cfg,
        };
        session.reset(now_ms, rng);
        session
    }

    /// Throw the current run away and start over on the map. Calling it
    /// twice in a row leaves the same state as calling it once.
    pub fn reset(&mut self, now_ms: f64, rng: &mut impl Rng) {
        self.generation += 1;
        self.phase = Phase::Exploration(Exploration::new(&self.cfg, now_ms, rng));
        self.score.reset();
        self.started_at_ms = now_ms;
        log::debug!("session reset, generation {}", self.generation);
    }

    /// Bumped by every reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn record(&self) -> Option<&RunRecord> {
        match &self.phase {
            Phase::Finished(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.record().is_some()
    }

    /// Advance whichever phase is running and feed its events to the score.
    pub fn tick(
        &mut self,
        input: SessionInput,
        dt: f32,
        now_ms: f64,
        viewport: &Viewport,
        rng: &mut impl Rng,
    ) -> Vec<GameEvent> {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        let mut events = match &mut self.phase {
            Phase::Exploration(ex) => ex.tick(input.direction, dt, now_ms, viewport, rng),
            Phase::Battle(battle) => {
                if input.attack {
                    battle.press_attack();
                }
                if input.special {
                    battle.press_special();
                }
                battle.tick(input.battle, dt, now_ms, rng)
            }
            Phase::Finished(_) => Vec::new(),
        };

        for event in &events {
            self.score.apply(event);
        }
        self.advance_phase(now_ms, &mut events);

        log::trace!(
            "session {} dt={:.3} events={} score={}",
            self.phase.name(),
            dt,
            events.len(),
            self.score.score
        );
        events
    }

    fn advance_phase(&mut self, now_ms: f64, events: &mut Vec<GameEvent>) {
        let next = match &self.phase {
            Phase::Exploration(ex) if ex.is_depleted() => {
                Phase::Finished(self.score.record(false, now_ms - self.started_at_ms))
            }
            Phase::Exploration(ex) if ex.is_quest_complete() => {
                let ammo = ammo_from_pickups(&ex.pickups);
                events.push(GameEvent::BattleStarted);
                Phase::Battle(BattleEngine::new(self.cfg.battle.clone(), ammo, now_ms))
            }
            Phase::Battle(battle) => {
                if let Some(outcome) = events.iter().find_map(|e| match e {
                    GameEvent::RoundResolved { outcome } => Some(*outcome),
                    _ => None,
                }) {
                    self.score.settle_battle(outcome, battle.player.hp);
                }
                match battle.outcome() {
                    Some(outcome) if battle.can_leave() => Phase::Finished(
                        self.score
                            .record(outcome == Outcome::Win, now_ms - self.started_at_ms),
                    ),
                    _ => return,
                }
            }
            _ => return,
        };
        log::debug!("session: {} -> {}", self.phase.name(), next.name());
        self.phase = next;
    }
}
