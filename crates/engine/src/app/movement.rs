use glam::Vec2;
use tracing::debug;

use super::audio::{AudioSink, SfxHandle};
use super::input::{InputAction, InputSnapshot};
use super::map::{ContactFlags, Tilemap};

pub const GRAVITY: f32 = -9.81;
const TERMINAL_FALL_SPEED: f32 = 20.0;
const DEFAULT_SPEED: f32 = 2.5;
const DEFAULT_JUMP_POWER: f32 = 5.0;
const DEFAULT_HALF_EXTENTS: Vec2 = Vec2::new(0.35, 0.5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Horizontal intent for this frame. Left is checked first and wins outright
/// when both directions are held.
pub fn movement_intent(input: &InputSnapshot) -> Vec2 {
    let x = if input.is_down(InputAction::MoveLeft) {
        -1.0
    } else if input.is_down(InputAction::MoveRight) {
        1.0
    } else {
        0.0
    };
    clamp_intent(Vec2::new(x, 0.0))
}

/// Rescales intents longer than one to unit length, keeping direction.
pub fn clamp_intent(intent: Vec2) -> Vec2 {
    if intent.length() > 1.0 {
        intent.normalize()
    } else {
        intent
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    position: Vec2,
    velocity: Vec2,
    movement: Vec2,
    facing: Facing,
    is_jumping: bool,
    contacts: ContactFlags,
    speed: f32,
    jump_power: f32,
    half_extents: Vec2,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl Player {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            movement: Vec2::ZERO,
            facing: Facing::default(),
            is_jumping: false,
            contacts: ContactFlags::default(),
            speed: DEFAULT_SPEED,
            jump_power: DEFAULT_JUMP_POWER,
            half_extents: DEFAULT_HALF_EXTENTS,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn movement(&self) -> Vec2 {
        self.movement
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    /// Ground contact as last reported by the collision step.
    pub fn collided_bottom(&self) -> bool {
        self.contacts.bottom
    }

    pub fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    /// Places the player at `position` at rest with no pending jump.
    pub fn respawn(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.movement = Vec2::ZERO;
        self.facing = Facing::default();
        self.is_jumping = false;
        self.contacts = ContactFlags::default();
    }

    /// Moves the player without touching velocity or contact state.
    pub fn teleport(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn set_movement(&mut self, intent: Vec2) {
        self.movement = clamp_intent(intent);
        if self.movement.x < 0.0 {
            self.facing = Facing::Left;
        } else if self.movement.x > 0.0 {
            self.facing = Facing::Right;
        }
    }

    /// Recomputes the movement intent from scratch for this frame.
    pub fn apply_input(&mut self, input: &InputSnapshot) {
        self.movement = Vec2::ZERO;
        self.set_movement(movement_intent(input));
    }

    /// Arms a jump if the player is standing on something. Vertical motion is
    /// applied by the next fixed tick.
    pub fn request_jump(&mut self, audio: &mut dyn AudioSink, sfx: SfxHandle) -> bool {
        if !self.contacts.bottom {
            return false;
        }
        self.is_jumping = true;
        audio.play(sfx);
        debug!(x = self.position.x, y = self.position.y, "jump_accepted");
        true
    }

    /// One fixed tick of motion resolved against `map`.
    pub fn step(&mut self, fixed_dt_seconds: f32, map: &Tilemap) {
        self.velocity.x = self.movement.x * self.speed;
        self.velocity.y = (self.velocity.y + GRAVITY * fixed_dt_seconds).max(-TERMINAL_FALL_SPEED);
        if self.is_jumping {
            self.is_jumping = false;
            self.velocity.y += self.jump_power;
        }

        let outcome =
            map.resolve_motion(self.position, self.half_extents, self.velocity * fixed_dt_seconds);
        self.position = outcome.position;
        self.contacts = outcome.contacts;

        if (outcome.contacts.bottom && self.velocity.y < 0.0)
            || (outcome.contacts.top && self.velocity.y > 0.0)
        {
            self.velocity.y = 0.0;
        }
        if outcome.contacts.left || outcome.contacts.right {
            self.velocity.x = 0.0;
        }
    }
}
