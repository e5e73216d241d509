/// Rendering layer: all terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable snapshot of the
/// session.  No game logic is performed; this module only translates
/// snapshots into terminal commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use star_quest::entities::{
    BonusKind, EnemyKind, Outcome, ProjectileKind, ProjectileOwner, RoundState, SpecialKind, Vec2,
};
use star_quest::score::RunRecord;
use star_quest::snapshot::{
    BattleSnapshot, CombatantView, ExplorationSnapshot, PhaseSnapshot, Snapshot,
};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_ENERGY: Color = Color::Green;
const C_HUD_LOW: Color = Color::Red;
const C_PLAYER: Color = Color::White;
const C_PLAYER_BLINK: Color = Color::DarkGrey;
const C_JELLY: Color = Color::Magenta;
const C_CROW: Color = Color::DarkGrey;
const C_FLEEING: Color = Color::DarkYellow;
const C_TARGET: Color = Color::Cyan;
const C_FOE: Color = Color::Red;
const C_BOLT: Color = Color::Cyan;
const C_ZAP: Color = Color::Magenta;
const C_DEBRIS: Color = Color::DarkRed;
const C_FLOOR: Color = Color::DarkGreen;
const C_HINT: Color = Color::DarkGrey;

/// Terminal area the play field is drawn into.
#[derive(Clone, Copy, Debug)]
pub struct Screen {
    pub width: u16,
    pub height: u16,
}

impl Screen {
    fn field_cols(self) -> f32 {
        self.width.saturating_sub(3).max(1) as f32
    }

    fn field_rows(self) -> f32 {
        self.height.saturating_sub(5).max(1) as f32
    }

    /// Normalized map position → terminal cell.
    fn map_cell(self, p: Vec2) -> (u16, u16) {
        let col = 1.0 + p.x.clamp(0.0, 1.0) * self.field_cols();
        let row = 2.0 + p.y.clamp(0.0, 1.0) * self.field_rows();
        (col as u16, row as u16)
    }

    fn floor_row(self) -> u16 {
        self.height.saturating_sub(4)
    }

    /// Arena pixels (foot-relative y) → terminal cell.
    fn arena_cell(self, p: Vec2, arena: Vec2) -> (u16, u16) {
        let col = 1.0 + (p.x / arena.x).clamp(0.0, 1.0) * self.field_cols();
        let rise = (-p.y / arena.y).clamp(0.0, 1.0) * (self.field_rows() - 1.0);
        let row = (self.floor_row() as f32 - 1.0 - rise).max(2.0);
        (col as u16, row as u16)
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(
    out: &mut W,
    screen: Screen,
    snap: &Snapshot,
    best_score: u32,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, screen)?;
    match &snap.phase {
        PhaseSnapshot::Exploration(ex) => {
            draw_exploration_hud(out, screen, snap.score, ex)?;
            draw_map(out, screen, ex)?;
        }
        PhaseSnapshot::Battle(b) => {
            draw_battle_hud(out, screen, snap.score, b)?;
            draw_arena(out, screen, b)?;
        }
        PhaseSnapshot::Finished(record) => draw_end_screen(out, screen, record, best_score)?,
    }
    draw_controls_hint(out, screen, &snap.phase)?;

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, screen.height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, screen: Screen) -> std::io::Result<()> {
    let w = screen.width as usize;
    let h = screen.height;

    out.queue(style::SetForegroundColor(C_BORDER))?;
    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;
    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(screen.width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }
    Ok(())
}

fn put<W: Write>(out: &mut W, (col, row): (u16, u16), color: Color, text: &str) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

fn bar(value: i32, max: i32, cells: usize) -> String {
    let filled = if max > 0 {
        (value.clamp(0, max) as usize * cells) / max as usize
    } else {
        0
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(cells - filled))
}

// ── Exploration ───────────────────────────────────────────────────────────────

fn draw_exploration_hud<W: Write>(
    out: &mut W,
    screen: Screen,
    score: u32,
    ex: &ExplorationSnapshot,
) -> std::io::Result<()> {
    put(out, (1, 0), C_HUD_SCORE, &format!("Score:{:>6}", score))?;

    let energy_color = if ex.energy * 4 <= ex.energy_max {
        C_HUD_LOW
    } else {
        C_HUD_ENERGY
    };
    put(
        out,
        (16, 0),
        energy_color,
        &format!("Energy {} {:>3}", bar(ex.energy, ex.energy_max, 10), ex.energy),
    )?;

    let quest = match &ex.target_key {
        Some(key) => format!("★ {}/{}  Find: {}", ex.collected, ex.total, key),
        None => format!("★ {}/{}", ex.collected, ex.total),
    };
    let qx = screen.width.saturating_sub(quest.chars().count() as u16 + 1);
    put(out, (qx, 0), C_TARGET, &quest)
}

fn draw_map<W: Write>(out: &mut W, screen: Screen, ex: &ExplorationSnapshot) -> std::io::Result<()> {
    if let Some(target) = ex.target {
        put(out, screen.map_cell(target), C_TARGET, "✦")?;
    }

    for bonus in &ex.bonuses {
        // Flicker during the last quarter of the lifetime.
        if bonus.fade > 0.75 && ((bonus.fade * 40.0) as u32) % 2 == 1 {
            continue;
        }
        let (glyph, color) = match bonus.kind {
            BonusKind::Pastry => ("o", Color::DarkYellow),
            BonusKind::Roll => ("@", Color::Yellow),
            BonusKind::Coffee => ("c", Color::DarkRed),
            BonusKind::Star => ("*", Color::Yellow),
        };
        put(out, screen.map_cell(bonus.position), color, glyph)?;
    }

    for enemy in &ex.enemies {
        let (glyph, color) = match enemy.kind {
            EnemyKind::Jelly => ("ѫ", C_JELLY),
            EnemyKind::Crow => ("v", C_CROW),
        };
        let color = if enemy.fleeing { C_FLEEING } else { color };
        put(out, screen.map_cell(enemy.position), color, glyph)?;
    }

    let color = if ex.invulnerable { C_PLAYER_BLINK } else { C_PLAYER };
    let glyph = if ex.slowed { "☻" } else { "☺" };
    put(out, screen.map_cell(ex.player), color, glyph)
}

// ── Battle ────────────────────────────────────────────────────────────────────

fn ammo_tag(b: &BattleSnapshot) -> String {
    SpecialKind::PRIORITY
        .iter()
        .map(|&k| {
            let label = match k {
                SpecialKind::Coffee => "c",
                SpecialKind::Roll => "@",
                SpecialKind::Pastry => "o",
                SpecialKind::Star => "*",
            };
            format!("{}{}", label, b.ammo.count(k))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn draw_battle_hud<W: Write>(
    out: &mut W,
    screen: Screen,
    score: u32,
    b: &BattleSnapshot,
) -> std::io::Result<()> {
    put(out, (1, 0), C_HUD_SCORE, &format!("Score:{:>6}", score))?;
    put(
        out,
        (16, 0),
        C_PLAYER,
        &format!("You {}", bar(b.player.hp, b.player.hp_max, 10)),
    )?;
    put(out, (33, 0), C_HUD_SCORE, &format!("[{}]", ammo_tag(b)))?;

    let foe = format!("Boss {}", bar(b.foe.hp, b.foe.hp_max, 10));
    let fx = screen.width.saturating_sub(foe.chars().count() as u16 + 1);
    put(out, (fx, 0), C_FOE, &foe)
}

fn draw_combatant<W: Write>(
    out: &mut W,
    screen: Screen,
    arena: Vec2,
    who: &CombatantView,
    head: &str,
    color: Color,
) -> std::io::Result<()> {
    let (col, row) = screen.arena_cell(who.position, arena);
    let body = if who.facing_right { "/█>" } else { "<█\\" };
    put(out, (col.saturating_sub(1).max(1), row.saturating_sub(1)), color, head)?;
    put(out, (col.saturating_sub(1).max(1), row), color, body)
}

fn draw_arena<W: Write>(out: &mut W, screen: Screen, b: &BattleSnapshot) -> std::io::Result<()> {
    let floor = screen.floor_row();
    put(
        out,
        (1, floor),
        C_FLOOR,
        &"▀".repeat(screen.width.saturating_sub(2) as usize),
    )?;

    draw_combatant(out, screen, b.arena, &b.player, " ☺ ", C_PLAYER)?;
    if b.foe_alpha > 0.0 {
        let color = if b.foe_alpha < 0.5 { C_DEBRIS } else { C_FOE };
        draw_combatant(out, screen, b.arena, &b.foe, "(Ö)", color)?;
    }

    for shot in &b.projectiles {
        let (glyph, color) = match (shot.owner, shot.kind) {
            (ProjectileOwner::Player, ProjectileKind::Bolt) => ("─", C_BOLT),
            (_, ProjectileKind::Zap) | (ProjectileOwner::Foe, _) => ("•", C_ZAP),
        };
        put(out, screen.arena_cell(shot.position, b.arena), color, glyph)?;
    }
    for p in &b.particles {
        put(out, screen.arena_cell(*p, b.arena), C_DEBRIS, "·")?;
    }

    let banner = match b.state {
        RoundState::Countdown => Some(("READY…", Color::White)),
        _ if b.show_go => Some(("GO!", Color::Yellow)),
        RoundState::Resolved(Outcome::Win) => Some(("VICTORY", Color::Yellow)),
        RoundState::Resolved(Outcome::Lose) => Some(("DEFEAT", Color::Red)),
        _ => None,
    };
    if let Some((text, color)) = banner {
        let col = (screen.width / 2).saturating_sub(text.chars().count() as u16 / 2);
        put(out, (col, screen.height / 3), color, text)?;
    }
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(
    out: &mut W,
    screen: Screen,
    phase: &PhaseSnapshot,
) -> std::io::Result<()> {
    let hint = match phase {
        PhaseSnapshot::Exploration(_) => "←↑↓→ / WASD : Move   Q : Quit",
        PhaseSnapshot::Battle(_) => "← → / A D : Move   ↑ / W : Jump   SPACE : Attack   X : Special   Q : Quit",
        PhaseSnapshot::Finished(_) => "R : Play Again   Q : Quit",
    };
    put(out, (1, screen.height.saturating_sub(1)), C_HINT, hint)
}

// ── End screen ────────────────────────────────────────────────────────────────

fn draw_end_screen<W: Write>(
    out: &mut W,
    screen: Screen,
    record: &RunRecord,
    best_score: u32,
) -> std::io::Result<()> {
    let (title, title_color) = if record.won {
        ("║    YOU  WON!       ║", Color::Yellow)
    } else {
        ("║    GAME  OVER      ║", Color::Red)
    };
    let new_best = record.score > best_score;
    let stats = &record.stats;

    let lines: Vec<(String, Color)> = vec![
        ("╔════════════════════╗".to_string(), title_color),
        (title.to_string(), title_color),
        ("╚════════════════════╝".to_string(), title_color),
        (format!("Final Score: {:>6}", record.score), Color::Yellow),
        if new_best {
            (format!("★ NEW BEST: {:>6} ★", record.score), Color::Yellow)
        } else {
            (format!("Best Score:  {:>6}", best_score), Color::DarkGrey)
        },
        (
            format!(
                "Places {}  Snacks {}  Bumps {}",
                stats.pois_reached,
                stats.bonuses.total(),
                stats.collisions
            ),
            Color::White,
        ),
        (
            format!(
                "Shots {}  Hits {}  Taken {}  Time {:.0}s",
                stats.shots_fired,
                stats.hits_landed,
                stats.hits_taken,
                record.elapsed_ms / 1000.0
            ),
            Color::White,
        ),
    ];

    let cx = screen.width / 2;
    let start_row = (screen.height / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        put(out, (col, start_row + i as u16), *color, msg)?;
    }
    Ok(())
}
