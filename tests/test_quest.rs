use std::collections::HashSet;

use star_quest::config::QuestConfig;
use star_quest::entities::*;
use star_quest::events::GameEvent;
use star_quest::quest::*;

use rand::rngs::StdRng;
use rand::SeedableRng;

const VIEWPORT: Viewport = Viewport::new(0.0, 0.0, 960.0, 540.0);
const NOWHERE: Vec2 = Vec2::new(-1000.0, -1000.0);

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn three_stops() -> QuestConfig {
    QuestConfig {
        pois: vec![
            Poi::new("north", 0.1, 0.1),
            Poi::new("middle", 0.5, 0.5),
            Poi::new("south", 0.9, 0.9),
        ],
        ..QuestConfig::default()
    }
}

fn fresh_tracker(cfg: QuestConfig) -> QuestTracker {
    let mut q = QuestTracker::new(cfg, 100);
    q.reset(0.0, &mut seeded_rng());
    q
}

fn target_px(q: &QuestTracker) -> Vec2 {
    VIEWPORT.to_px(q.current_target().expect("a target").position)
}

// ── reset ─────────────────────────────────────────────────────────────────────

#[test]
fn reset_keeps_every_poi_once() {
    let q = fresh_tracker(QuestConfig::default());
    assert_eq!(q.total(), 10);
    let keys: HashSet<&str> = q.order.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys.len(), 10);
    assert_eq!(q.cursor, 0);
    assert!(!q.is_complete());
}

#[test]
fn duplicate_keys_are_dropped() {
    let mut cfg = three_stops();
    cfg.pois.push(Poi::new("north", 0.2, 0.2));
    let q = fresh_tracker(cfg);
    assert_eq!(q.total(), 3);
}

#[test]
fn shuffle_depends_on_seed() {
    let orders: HashSet<Vec<String>> = (0..16)
        .map(|seed| {
            let mut q = QuestTracker::new(QuestConfig::default(), 100);
            q.reset(0.0, &mut StdRng::seed_from_u64(seed));
            q.order.iter().map(|p| p.key.clone()).collect()
        })
        .collect();
    assert!(orders.len() > 1);
}

#[test]
fn first_prompt_comes_on_first_update() {
    let mut q = fresh_tracker(three_stops());
    let mut events = Vec::new();
    q.update(0.0, &VIEWPORT, NOWHERE, &mut events);
    let key = q.current_target().map(|p| p.key.clone()).unwrap_or_default();
    assert_eq!(events, vec![GameEvent::AskPrompt { key }]);

    let mut again = Vec::new();
    q.update(16.0, &VIEWPORT, NOWHERE, &mut again);
    assert!(again.is_empty());
}

// ── reaching targets ──────────────────────────────────────────────────────────

#[test]
fn reaching_target_scores_and_advances() {
    let mut q = fresh_tracker(three_stops());
    let first = q.order[0].key.clone();
    let mut events = Vec::new();

    let done = q.update(0.0, &VIEWPORT, target_px(&q), &mut events);

    assert!(!done);
    assert!(events.contains(&GameEvent::PoiReached {
        key: first.clone(),
        score: 100
    }));
    assert_eq!(q.cursor, 1);
    assert!(q.collected.contains(&first));
    assert_eq!(q.locked_until_ms, 900.0);
}

#[test]
fn far_from_target_nothing_happens() {
    let mut q = fresh_tracker(three_stops());
    let mut events = Vec::new();
    let px = target_px(&q) + Vec2::new(50.0, 0.0);
    q.update(0.0, &VIEWPORT, px, &mut events);
    assert_eq!(q.cursor, 0);
    assert!(!events.iter().any(|e| matches!(e, GameEvent::PoiReached { .. })));
}

#[test]
fn relock_blocks_the_next_target_briefly() {
    let mut q = fresh_tracker(three_stops());
    let mut events = Vec::new();
    q.update(0.0, &VIEWPORT, target_px(&q), &mut events);

    let next = target_px(&q);
    q.update(100.0, &VIEWPORT, next, &mut events);
    assert_eq!(q.cursor, 1);

    q.update(900.0, &VIEWPORT, next, &mut events);
    assert_eq!(q.cursor, 2);
}

#[test]
fn next_prompt_waits_for_ask_delay() {
    let mut q = fresh_tracker(three_stops());
    let mut events = Vec::new();
    q.update(0.0, &VIEWPORT, target_px(&q), &mut events);
    let next_key = q.order[1].key.clone();

    let mut early = Vec::new();
    q.update(800.0, &VIEWPORT, NOWHERE, &mut early);
    assert!(early.is_empty());

    let mut due = Vec::new();
    q.update(900.0, &VIEWPORT, NOWHERE, &mut due);
    assert_eq!(due, vec![GameEvent::AskPrompt { key: next_key }]);
}

#[test]
fn collect_is_idempotent() {
    let mut q = fresh_tracker(three_stops());
    assert!(q.collect("north"));
    assert!(!q.collect("north"));
    assert_eq!(q.collected_count(), 1);
}

#[test]
fn completing_every_stop_signals_once() {
    let mut q = fresh_tracker(three_stops());
    let mut events = Vec::new();
    let mut completions = 0;
    let mut now = 0.0;

    for _ in 0..3 {
        if q.update(now, &VIEWPORT, target_px(&q), &mut events) {
            completions += 1;
        }
        now += 1000.0;
    }
    assert!(q.is_complete());
    assert!(q.current_target().is_none());

    // Standing around afterwards changes nothing.
    for _ in 0..5 {
        if q.update(now, &VIEWPORT, VIEWPORT.to_px(Vec2::new(0.5, 0.5)), &mut events) {
            completions += 1;
        }
        now += 1000.0;
    }

    assert_eq!(completions, 1);
    let reached = events
        .iter()
        .filter(|e| matches!(e, GameEvent::PoiReached { .. }))
        .count();
    assert_eq!(reached, 3);
    assert_eq!(
        events.iter().filter(|e| **e == GameEvent::QuestComplete).count(),
        1
    );
    assert_eq!(q.collected_count(), 3);
}

#[test]
fn reset_discards_pending_prompts() {
    let mut q = fresh_tracker(three_stops());
    let mut events = Vec::new();
    q.update(0.0, &VIEWPORT, target_px(&q), &mut events);

    q.reset(100.0, &mut seeded_rng());
    let mut after = Vec::new();
    q.update(100.0, &VIEWPORT, NOWHERE, &mut after);
    q.update(2000.0, &VIEWPORT, NOWHERE, &mut after);

    let key = q.order[0].key.clone();
    assert_eq!(after, vec![GameEvent::AskPrompt { key }]);
    assert_eq!(q.cursor, 0);
    assert_eq!(q.collected_count(), 0);
}
