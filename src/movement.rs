/// Player movement on the exploration map.
///
/// Pure functions: take the current player by reference, return the moved
/// copy. Damage and energy are handled elsewhere.

use crate::config::PlayerConfig;
use crate::entities::{Player, Vec2};

/// Held-direction input, one of the eight compass directions or none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Direction {
    pub dx: i8,
    pub dy: i8,
}

impl Direction {
    pub const NONE: Direction = Direction { dx: 0, dy: 0 };

    /// Opposite keys cancel out.
    pub fn from_held(up: bool, down: bool, left: bool, right: bool) -> Self {
        let axis = |neg: bool, pos: bool| -> i8 { (pos as i8) - (neg as i8) };
        Self {
            dx: axis(left, right),
            dy: axis(up, down),
        }
    }

    pub fn is_none(self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Unit vector; diagonals are as fast as straight moves.
    pub fn unit(self) -> Vec2 {
        Vec2::new(self.dx as f32, self.dy as f32).normalized_or(Vec2::ZERO)
    }
}

/// Fresh player at the configured start with full energy.
pub fn init_player(cfg: &PlayerConfig, energy_start: i32, energy_max: i32) -> Player {
    Player {
        position: cfg.start.clamp_unit(),
        speed: cfg.base_speed,
        size: cfg.size,
        energy: energy_start.clamp(0, energy_max),
        energy_max,
        invuln_timer: 0.0,
    }
}

/// Whether input may move the player at all.
pub fn can_move(player: &Player, quest_complete: bool) -> bool {
    !quest_complete && !player.is_exhausted()
}

/// Advance by `direction * speed * speed_factor * dt`, clamped to the map.
pub fn step_player(
    player: &Player,
    direction: Direction,
    dt: f32,
    speed_factor: f32,
    quest_complete: bool,
) -> Player {
    if direction.is_none() || !can_move(player, quest_complete) {
        return player.clone();
    }
    let delta = direction.unit() * (player.speed * speed_factor * dt);
    Player {
        position: (player.position + delta).clamp_unit(),
        ..player.clone()
    }
}

/// Count down the post-hit invulnerability.
pub fn tick_invulnerability(player: &Player, dt: f32) -> Player {
    Player {
        invuln_timer: (player.invuln_timer - dt).max(0.0),
        ..player.clone()
    }
}
