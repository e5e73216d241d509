use star_quest::battle::*;
use star_quest::config::BattleConfig;
use star_quest::entities::*;
use star_quest::events::GameEvent;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn make_battle(ammo: BattleAmmo) -> BattleEngine {
    BattleEngine::new(BattleConfig::default(), ammo, 0.0)
}

const IDLE: BattleInput = BattleInput {
    left: false,
    right: false,
    up: false,
};

/// A motionless player shot sitting on the foe.
fn bolt_on(target: &Combatant, damage: i32) -> Projectile {
    Projectile {
        position: target.position,
        velocity: Vec2::ZERO,
        damage,
        owner: ProjectileOwner::Player,
        kind: ProjectileKind::Bolt,
        remaining_life: None,
        pierce: 0,
        inside_target: false,
    }
}

/// Active round from `cfg`, foe parked at x=860 with every AI timer
/// disarmed, player 200 px to its left. Returns the round and the time.
fn still_round(cfg: BattleConfig, ammo: BattleAmmo, rng: &mut StdRng) -> (BattleEngine, f64) {
    let mut b = BattleEngine::new(cfg, ammo, 0.0);
    b.tick(IDLE, 0.016, 900.0, rng);
    b.brain.entry_until_ms = 0.0;
    b.brain.fire_at_ms = f64::INFINITY;
    b.brain.jump_ready_at_ms = f64::INFINITY;
    b.brain.wander_until_ms = f64::INFINITY;
    b.brain.wander_dir = 0;
    b.tick(IDLE, 0.016, 2000.0, rng);
    assert_eq!(b.state, RoundState::Active);
    b.foe.position.x = 860.0;
    b.player.position.x = 660.0;
    b.player.facing = Facing::Right;
    (b, 2000.0)
}

fn has(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> bool {
    events.iter().any(pred)
}

// ── Setup ─────────────────────────────────────────────────────────────────────

#[test]
fn new_round_starts_in_countdown() {
    let b = make_battle(BattleAmmo::default());
    assert_eq!(b.state, RoundState::Countdown);
    assert_eq!(b.player.position.x, 160.0);
    assert_eq!(b.foe.position.x, 960.0 + 160.0);
    assert_eq!(b.go_at_ms, 900.0);
    assert_eq!(b.grace_until_ms, 1900.0);
    assert_eq!(b.brain.entry_until_ms, 2100.0);
    assert!(b.projectiles.is_empty());
    assert!(!b.is_resolved());
}

#[test]
fn ammo_from_pickups_maps_each_kind() {
    let counts = PickupCounts {
        pastry: 1,
        roll: 2,
        coffee: 3,
        star: 4,
    };
    assert_eq!(
        ammo_from_pickups(&counts),
        BattleAmmo {
            coffee: 3,
            roll: 2,
            pastry: 1,
            stars: 4
        }
    );
}

// ── Round states ──────────────────────────────────────────────────────────────

#[test]
fn countdown_ignores_input_and_purges_attacks() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.press_attack();
    let held = BattleInput {
        left: false,
        right: true,
        up: true,
    };
    b.tick(held, 0.016, 100.0, &mut rng);
    assert!(b.projectiles.is_empty());
    assert_eq!(b.player.position.x, 160.0);

    // The purged press must not fire once the round goes live.
    let events = b.tick(IDLE, 0.016, 900.0, &mut rng);
    assert!(b.projectiles.is_empty());
    assert!(events.contains(&GameEvent::RoundGo));
    assert_eq!(b.state, RoundState::ActiveEntry);
}

#[test]
fn entry_ends_into_active() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.tick(IDLE, 0.016, 2100.0, &mut rng);
    assert_eq!(b.state, RoundState::Active);
}

#[test]
fn foe_slides_in_and_stops_at_target() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    let mut now = 900.0;
    while now < 2100.0 {
        b.tick(IDLE, 0.05, now, &mut rng);
        assert!(b.foe.position.x >= 860.0);
        now += 50.0;
    }
    assert_eq!(b.foe.position.x, 860.0);
}

// ── Player control ────────────────────────────────────────────────────────────

#[test]
fn player_is_clamped_to_the_arena() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    let left = BattleInput {
        left: true,
        ..IDLE
    };
    let mut now = 900.0;
    for _ in 0..40 {
        b.tick(left, 0.05, now, &mut rng);
        now += 50.0;
    }
    assert_eq!(b.player.position.x, 60.0);
    assert_eq!(b.player.facing, Facing::Left);
}

#[test]
fn jump_only_from_the_ground() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    let up = BattleInput { up: true, ..IDLE };

    b.tick(IDLE, 0.016, 900.0, &mut rng);
    assert!(b.player.on_ground);

    b.tick(up, 0.016, 916.0, &mut rng);
    assert_eq!(b.player.velocity.y, -620.0);
    assert!(!b.player.on_ground);

    b.tick(up, 0.016, 932.0, &mut rng);
    assert!(b.player.position.y < 0.0);
    assert!(b.player.velocity.y > -620.0);
}

#[test]
fn normal_attack_fires_one_bolt_forward() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.press_attack();
    b.press_attack();
    let events = b.tick(IDLE, 0.016, 916.0, &mut rng);

    assert_eq!(b.projectiles.len(), 1);
    let shot = &b.projectiles[0];
    assert_eq!(shot.damage, 12);
    assert_eq!(shot.velocity, Vec2::new(760.0, 0.0));
    assert_eq!(shot.owner, ProjectileOwner::Player);
    assert!(events.contains(&GameEvent::PlayerFired { special: None }));
}

// ── Specials ──────────────────────────────────────────────────────────────────

#[test]
fn special_without_ammo_equals_normal_attack() {
    let mut rng_a = seeded_rng();
    let mut rng_b = seeded_rng();
    let mut normal = make_battle(BattleAmmo::default());
    let mut special = make_battle(BattleAmmo::default());

    normal.tick(IDLE, 0.016, 900.0, &mut rng_a);
    special.tick(IDLE, 0.016, 900.0, &mut rng_b);
    normal.press_attack();
    special.press_special();
    normal.tick(IDLE, 0.016, 916.0, &mut rng_a);
    let events = special.tick(IDLE, 0.016, 916.0, &mut rng_b);

    assert_eq!(special.projectiles.len(), 1);
    assert_eq!(normal.projectiles, special.projectiles);
    assert!(events.contains(&GameEvent::PlayerFired { special: None }));
}

#[test]
fn coffee_is_spent_first_and_pierces() {
    let mut b = make_battle(BattleAmmo {
        coffee: 1,
        stars: 1,
        ..BattleAmmo::default()
    });
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.press_special();
    let events = b.tick(IDLE, 0.016, 916.0, &mut rng);

    assert!(events.contains(&GameEvent::PlayerFired {
        special: Some(SpecialKind::Coffee)
    }));
    assert_eq!(b.ammo.coffee, 0);
    assert_eq!(b.ammo.stars, 1);
    assert_eq!(b.projectiles[0].damage, 26);
    assert_eq!(b.projectiles[0].pierce, 1);
}

#[test]
fn roll_fires_a_delayed_second_shot() {
    let mut b = make_battle(BattleAmmo {
        roll: 1,
        ..BattleAmmo::default()
    });
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.press_special();
    b.tick(IDLE, 0.016, 1000.0, &mut rng);
    assert_eq!(b.projectiles.len(), 1);

    b.tick(IDLE, 0.016, 1100.0, &mut rng);
    assert_eq!(b.projectiles.len(), 1);

    b.tick(IDLE, 0.016, 1140.0, &mut rng);
    assert_eq!(b.projectiles.len(), 2);
    assert!(b.projectiles.iter().all(|p| p.damage == 18));
}

#[test]
fn reset_drops_pending_burst_shots() {
    let mut b = make_battle(BattleAmmo {
        roll: 1,
        ..BattleAmmo::default()
    });
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.press_special();
    b.tick(IDLE, 0.016, 1000.0, &mut rng);

    b.reset(BattleAmmo::default(), 1050.0);
    b.tick(IDLE, 0.016, 1950.0, &mut rng);
    b.tick(IDLE, 0.016, 2000.0, &mut rng);
    assert!(b.projectiles.is_empty());
}

#[test]
fn coffee_shot_passes_through_the_foe_once() {
    let ammo = BattleAmmo {
        coffee: 1,
        ..BattleAmmo::default()
    };
    let mut rng = seeded_rng();
    let (mut b, mut now) = still_round(BattleConfig::default(), ammo, &mut rng);
    let mut hits = 0;

    b.press_special();
    for _ in 0..60 {
        now += 1000.0 / 60.0;
        let events = b.tick(IDLE, 1.0 / 60.0, now, &mut rng);
        hits += events
            .iter()
            .filter(|e| matches!(e, GameEvent::ProjectileHit { .. }))
            .count();
        if let Some(shot) = b.projectiles.first() {
            if shot.position.x > 860.0 + 40.0 {
                // Through the foe with its pierce spent, still flying.
                assert_eq!(shot.pierce, 0);
            }
        }
    }

    assert_eq!(hits, 1);
    assert_eq!(b.foe.hp, 100 - 26);
    assert!(b.projectiles.is_empty());
    assert_eq!(b.ammo.coffee, 0);
}

#[test]
fn piercing_shot_survives_its_first_hit() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    // Inside the arena, so the surviving shot is not culled as out of bounds.
    b.foe.position.x = 860.0;

    let mut shot = bolt_on(&b.foe, 26);
    shot.pierce = 1;
    b.projectiles.push(shot);

    b.tick(IDLE, 0.0, 2000.0, &mut rng);
    assert_eq!(b.foe.hp, 74);
    assert_eq!(b.projectiles.len(), 1);
    assert_eq!(b.projectiles[0].pierce, 0);
    assert!(b.projectiles[0].inside_target);

    // Still overlapping the same foe: no second hit.
    b.tick(IDLE, 0.0, 2001.0, &mut rng);
    assert_eq!(b.foe.hp, 74);
    assert_eq!(b.projectiles.len(), 1);
}

// ── Grace & hits ──────────────────────────────────────────────────────────────

#[test]
fn grace_period_absorbs_damage_but_consumes_shot() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.projectiles.push(bolt_on(&b.foe, 50));

    let events = b.tick(IDLE, 0.0, 1500.0, &mut rng);

    assert_eq!(b.foe.hp, 100);
    assert!(b.projectiles.is_empty());
    assert!(events.contains(&GameEvent::ProjectileHit {
        owner: ProjectileOwner::Player,
        damage: 50,
        absorbed: true
    }));
}

#[test]
fn no_resolution_during_grace() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.player.hp = 0;
    b.tick(IDLE, 0.016, 1200.0, &mut rng);
    assert!(!b.is_resolved());
}

#[test]
fn foe_hit_slows_the_player() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.projectiles.push(Projectile {
        owner: ProjectileOwner::Foe,
        kind: ProjectileKind::Zap,
        remaining_life: Some(1.0),
        ..bolt_on(&b.player, 14)
    });

    b.tick(IDLE, 0.0, 2000.0, &mut rng);
    assert_eq!(b.player.hp, 106);
    assert_eq!(b.slow_until_ms, 2450.0);
    assert!(b.shake > 0.0);

    let x = b.player.position.x;
    let right = BattleInput {
        right: true,
        ..IDLE
    };
    b.tick(right, 0.05, 2050.0, &mut rng);
    assert!((b.player.position.x - (x + 300.0 * 0.45 * 0.05)).abs() < 1e-3);
}

#[test]
fn shots_leaving_the_arena_expire() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.projectiles.push(Projectile {
        position: Vec2::new(-70.0, -20.0),
        velocity: Vec2::new(-400.0, 0.0),
        ..bolt_on(&b.foe, 1)
    });
    b.tick(IDLE, 0.05, 950.0, &mut rng);
    assert!(b.projectiles.is_empty());
}

#[test]
fn zap_life_runs_out() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.projectiles.push(Projectile {
        position: Vec2::new(480.0, -300.0),
        velocity: Vec2::ZERO,
        owner: ProjectileOwner::Foe,
        kind: ProjectileKind::Zap,
        remaining_life: Some(0.1),
        ..bolt_on(&b.player, 14)
    });
    b.tick(IDLE, 0.05, 950.0, &mut rng);
    assert_eq!(b.projectiles.len(), 1);
    b.tick(IDLE, 0.05, 1000.0, &mut rng);
    assert!(b.projectiles.is_empty());
}

// ── Foe AI ────────────────────────────────────────────────────────────────────

#[test]
fn foe_jumps_when_the_player_is_close() {
    let cfg = BattleConfig {
        foe_jump_prob: 1.0,
        ..BattleConfig::default()
    };
    let mut rng = seeded_rng();
    let (mut b, now) = still_round(cfg, BattleAmmo::default(), &mut rng);
    b.brain.jump_ready_at_ms = now;

    b.tick(IDLE, 0.016, now + 16.0, &mut rng);

    assert!(!b.foe.on_ground);
    assert_eq!(b.foe.velocity.y, -520.0);
    assert_eq!(b.brain.jump_ready_at_ms, now + 16.0 + 900.0);
}

#[test]
fn foe_stays_grounded_out_of_reach() {
    let cfg = BattleConfig {
        foe_jump_prob: 1.0,
        ..BattleConfig::default()
    };
    let mut rng = seeded_rng();
    let (mut b, now) = still_round(cfg, BattleAmmo::default(), &mut rng);
    // 760 px away, well past the 320 px jump radius.
    b.player.position.x = 100.0;
    b.brain.jump_ready_at_ms = now;

    b.tick(IDLE, 0.016, now + 16.0, &mut rng);

    assert!(b.foe.on_ground);
    assert_eq!(b.foe.velocity.y, 0.0);
    assert_eq!(b.brain.jump_ready_at_ms, now + 16.0 + 180.0);
}

#[test]
fn foe_never_jumps_at_zero_probability() {
    let cfg = BattleConfig {
        foe_jump_prob: 0.0,
        ..BattleConfig::default()
    };
    let mut rng = seeded_rng();
    let (mut b, mut now) = still_round(cfg, BattleAmmo::default(), &mut rng);
    b.brain.jump_ready_at_ms = now;

    for _ in 0..30 {
        now += 50.0;
        b.tick(IDLE, 0.05, now, &mut rng);
        assert!(b.foe.on_ground);
    }
    // Re-checked on the 180 ms cadence the whole time.
    assert!(b.brain.jump_ready_at_ms > now);
    assert!(b.brain.jump_ready_at_ms <= now + 180.0);
}

#[test]
fn zap_at_zero_distance_fires_along_facing() {
    let mut rng = seeded_rng();
    let (mut b, now) = still_round(BattleConfig::default(), BattleAmmo::default(), &mut rng);
    b.player.position = b.foe.position;
    b.brain.fire_at_ms = now;
    b.brain.fire_block_until_ms = 0.0;

    let events = b.tick(IDLE, 0.016, now + 16.0, &mut rng);

    assert!(events.contains(&GameEvent::FoeFired));
    let zap = b
        .projectiles
        .iter()
        .find(|p| p.kind == ProjectileKind::Zap)
        .expect("zap fired");
    let sign = b.foe.facing.sign();
    assert!(zap.velocity.x.is_finite() && zap.velocity.y.is_finite());
    assert!((zap.velocity.x - sign * 640.0).abs() < 1e-3);
    assert_eq!(zap.velocity.y, 0.0);
    assert_eq!(b.player.hp, 120);
}

#[test]
fn foe_fires_aimed_zaps_after_entry() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    let mut now = 900.0;
    let mut first_zap = None;

    while now <= 3000.0 {
        let events = b.tick(IDLE, 0.05, now, &mut rng);
        if has(&events, |e| *e == GameEvent::FoeFired) {
            assert!(now >= 2700.0, "fired at {}", now);
            first_zap = b
                .projectiles
                .iter()
                .find(|p| p.kind == ProjectileKind::Zap)
                .cloned();
            break;
        }
        now += 50.0;
    }

    let zap = first_zap.expect("foe should fire");
    assert_eq!(zap.owner, ProjectileOwner::Foe);
    assert_eq!(zap.damage, 14);
    assert!((zap.velocity.length() - 640.0).abs() < 0.5);
    assert!(zap.velocity.x < 0.0);
}

#[test]
fn foe_stays_in_its_patrol_zone() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    let mut now = 900.0;
    while now < 12_000.0 {
        b.tick(IDLE, 0.05, now, &mut rng);
        if now >= 2100.0 {
            assert!(b.foe.position.x >= 700.0 && b.foe.position.x <= 900.0);
        }
        if b.is_resolved() {
            break;
        }
        now += 50.0;
    }
}

// ── Resolution ────────────────────────────────────────────────────────────────

#[test]
fn nine_normal_hits_win_on_the_ninth() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.01, 900.0, &mut rng);

    for i in 0..9 {
        b.projectiles.push(bolt_on(&b.foe, 12));
        let events = b.tick(IDLE, 0.01, 2000.0 + i as f64 * 10.0, &mut rng);
        if i < 8 {
            assert!(!b.is_resolved(), "resolved after {} hits", i + 1);
        } else {
            assert!(events.contains(&GameEvent::RoundResolved {
                outcome: Outcome::Win
            }));
        }
    }
    assert_eq!(b.foe.hp, 0);
    assert_eq!(b.outcome(), Some(Outcome::Win));
}

#[test]
fn player_down_loses() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.player.hp = 0;
    let events = b.tick(IDLE, 0.016, 2000.0, &mut rng);
    assert!(events.contains(&GameEvent::RoundResolved {
        outcome: Outcome::Lose
    }));
    assert!(b.death.is_none());
    assert!(b.can_leave());
}

#[test]
fn double_knockout_is_a_win() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.player.hp = 0;
    b.foe.hp = 0;
    b.tick(IDLE, 0.016, 2000.0, &mut rng);
    assert_eq!(b.outcome(), Some(Outcome::Win));
}

#[test]
fn resolved_round_is_frozen() {
    let mut b = make_battle(BattleAmmo {
        roll: 1,
        ..BattleAmmo::default()
    });
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.foe.hp = 0;
    b.tick(IDLE, 0.016, 2000.0, &mut rng);
    assert!(b.is_resolved());

    let player = b.player.clone();
    let foe = b.foe.clone();
    let shots = b.projectiles.len();
    let held = BattleInput {
        left: true,
        right: false,
        up: true,
    };

    let mut now = 2016.0;
    for _ in 0..60 {
        b.press_attack();
        b.press_special();
        let events = b.tick(held, 0.05, now, &mut rng);
        assert!(events.is_empty());
        now += 50.0;
    }

    assert_eq!(b.player, player);
    assert_eq!(b.foe, foe);
    assert_eq!(b.projectiles.len(), shots);
    assert_eq!(b.ammo.roll, 1);
    assert_eq!(b.outcome(), Some(Outcome::Win));
}

#[test]
fn death_effect_plays_then_finishes() {
    let mut b = make_battle(BattleAmmo::default());
    let mut rng = seeded_rng();
    b.tick(IDLE, 0.016, 900.0, &mut rng);
    b.foe.hp = 0;
    b.tick(IDLE, 0.016, 2000.0, &mut rng);

    let death = b.death.as_ref().expect("death effect");
    assert_eq!(death.particles.len(), 28);
    assert!(!b.is_effect_finished());
    assert!(!b.can_leave());

    let mut now = 2016.0;
    for _ in 0..30 {
        b.tick(IDLE, 0.05, now, &mut rng);
        now += 50.0;
    }
    assert!(b.is_effect_finished());
    assert!(b.can_leave());
    assert_eq!(b.death.as_ref().map(|d| d.fade), Some(0.0));
}
