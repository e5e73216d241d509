mod display;

use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal,
    ExecutableCommand, QueueableCommand,
};
use rand::thread_rng;
use serde::{Deserialize, Serialize};

use star_quest::battle::BattleInput;
use star_quest::clock::{Clock, FrameTimer, SystemClock};
use star_quest::config::GameConfig;
use star_quest::entities::Viewport;
use star_quest::movement::Direction;
use star_quest::score::RunRecord;
use star_quest::session::{GameSession, SessionInput};
use star_quest::snapshot::Snapshot;

use display::Screen;

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS

/// Virtual pixel rectangle the map is simulated in. Proximity radii are
/// tuned for it, independent of the terminal size.
const MAP_VIEWPORT: Viewport = Viewport::new(0.0, 0.0, 960.0, 540.0);

// ── Simultaneous-input constants ──────────────────────────────────────────────

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is ≥ 15 Hz, so a window of 4 frames (≈133 ms) is
/// always refreshed before expiry.
const HOLD_WINDOW: u64 = 4;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

/// Edge-triggered actions collected from one frame's worth of input.
#[derive(Debug, Default, PartialEq)]
struct FrameKeys {
    attack: bool,
    special: bool,
    /// `Some(true)` quits the program, `Some(false)` returns to the menu.
    leave: Option<bool>,
}

/// Drain every pending event without blocking. Non-key events (resize,
/// focus, mouse) are skipped so the keys queued behind them still count
/// this frame.
fn drain_input(
    rx: &mpsc::Receiver<Event>,
    key_frame: &mut HashMap<KeyCode, u64>,
    frame: u64,
    finished: bool,
) -> FrameKeys {
    let mut keys = FrameKeys::default();
    while let Ok(ev) = rx.try_recv() {
        let Event::Key(KeyEvent { code, kind, modifiers, .. }) = ev else {
            continue;
        };
        match kind {
            KeyEventKind::Press => {
                key_frame.insert(code, frame);
                match code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                        keys.leave = Some(true);
                        return keys;
                    }
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        keys.leave = Some(true);
                        return keys;
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') if finished => {
                        keys.leave = Some(false);
                        return keys;
                    }
                    KeyCode::Char(' ') | KeyCode::Char('j') | KeyCode::Char('J') => {
                        keys.attack = true;
                    }
                    KeyCode::Char('x') | KeyCode::Char('X') | KeyCode::Char('k')
                    | KeyCode::Char('K') => {
                        keys.special = true;
                    }
                    _ => {}
                }
            }
            KeyEventKind::Repeat => {
                key_frame.insert(code, frame);
            }
            KeyEventKind::Release => {
                key_frame.remove(&code);
            }
        }
    }
    keys
}

// ── Best-score persistence ────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct BestScore {
    score: u32,
    record: Option<RunRecord>,
}

fn best_score_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".star_quest_best.json")
}

fn load_best_score() -> BestScore {
    std::fs::read_to_string(best_score_path())
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

fn save_best_score(best: &BestScore) {
    match serde_json::to_string_pretty(best) {
        Ok(text) => {
            if let Err(err) = std::fs::write(best_score_path(), text) {
                log::warn!("cannot save best score: {}", err);
            }
        }
        Err(err) => log::warn!("cannot encode best score: {}", err),
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Defaults, or the JSON file named by `STAR_QUEST_CONFIG`.
fn load_config() -> std::io::Result<GameConfig> {
    match std::env::var_os("STAR_QUEST_CONFIG") {
        None => Ok(GameConfig::default()),
        Some(path) => GameConfig::load(&path).map_err(|err| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{}: {}", PathBuf::from(path).display(), err),
            )
        }),
    }
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start,
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    best_score: u32,
) -> std::io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "★  STAR  QUEST  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(6),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    if best_score > 0 {
        let hs_str = format!("Best Score: {}", best_score);
        out.queue(cursor::MoveTo(
            cx.saturating_sub(hs_str.chars().count() as u16 / 2),
            cy.saturating_sub(5),
        ))?;
        out.queue(style::SetForegroundColor(Color::Yellow))?;
        out.queue(Print(&hs_str))?;
    }

    let lines: &[(&str, Color)] = &[
        ("Reach every ✦ on the map, in the order asked.", Color::White),
        ("Dodge the jellies and crows, they drain energy.", Color::White),
        ("Snacks heal you and become special attacks:", Color::DarkGrey),
        ("  c coffee  @ roll  o pastry  * star", Color::Yellow),
        ("Then beat the boss.", Color::White),
    ];
    for (i, (text, color)) in lines.iter().enumerate() {
        out.queue(cursor::MoveTo(cx.saturating_sub(24), cy.saturating_sub(3) + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*text))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(24), cy + 4))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("ENTER / SPACE : Start   Q : Quit"))?;

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Block until the user makes a choice
    loop {
        match rx.recv() {
            Ok(Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            })) => match code {
                KeyCode::Enter | KeyCode::Char(' ') => return Ok(MenuResult::Start),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            },
            Ok(_) => {}
            Err(_) => return Ok(MenuResult::Quit),
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Returns `true` → quit program,  `false` → back to menu.
///
/// Held keys live in `key_frame` (frame number of the last press/repeat)
/// and are sampled every frame, so moving and jumping combine freely.
/// Attack and special are edge-triggered: only a `Press` event fires them,
/// key-repeat never does.
fn game_loop<W: Write>(
    out: &mut W,
    session: &mut GameSession,
    rx: &mpsc::Receiver<Event>,
    clock: &SystemClock,
    best_score: u32,
) -> std::io::Result<bool> {
    let mut rng = thread_rng();
    let mut timer = FrameTimer::new();
    timer.step(clock.now_ms());

    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        frame += 1;

        let keys = drain_input(rx, &mut key_frame, frame, session.is_finished());
        if let Some(quit) = keys.leave {
            return Ok(quit);
        }

        let up = any_held(&key_frame, &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')], frame);
        let down = any_held(&key_frame, &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')], frame);
        let left = any_held(&key_frame, &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')], frame);
        let right = any_held(&key_frame, &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')], frame);

        let input = SessionInput {
            direction: Direction::from_held(up, down, left, right),
            battle: BattleInput { left, right, up },
            attack: keys.attack,
            special: keys.special,
        };

        let now = clock.now_ms();
        let dt = timer.step(now);
        let events = session.tick(input, dt, now, &MAP_VIEWPORT, &mut rng);
        for event in &events {
            match serde_json::to_string(event) {
                Ok(json) => log::debug!("event {}", json),
                Err(err) => log::warn!("could not encode {:?}: {}", event, err),
            }
        }

        let (width, height) = terminal::size()?;
        let snap = Snapshot::capture(session, now);
        display::render(out, Screen { width, height }, &snap, best_score)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> std::io::Result<()> {
    // Silent unless RUST_LOG is set; the terminal belongs to the game.
    let _ = env_logger::Builder::from_default_env().try_init();

    let config = load_config()?;

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Ghostty / kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx, config);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: GameConfig,
) -> std::io::Result<()> {
    let clock = SystemClock::new();
    let mut best = load_best_score();

    loop {
        match show_menu(out, rx, best.score)? {
            MenuResult::Quit => break,
            MenuResult::Start => {
                let mut session = GameSession::new(config.clone(), clock.now_ms(), &mut thread_rng());
                let quit = game_loop(out, &mut session, rx, &clock, best.score)?;

                if let Some(record) = session.record() {
                    log::info!("run finished: {}", record.to_json().unwrap_or_default());
                    if record.score > best.score {
                        best = BestScore {
                            score: record.score,
                            record: Some(record.clone()),
                        };
                        save_best_score(&best);
                    }
                }

                if quit {
                    break;
                }
            }
        }
    }
    Ok(())
}
