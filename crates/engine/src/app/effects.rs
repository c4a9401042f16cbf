//! Time-boxed camera perturbations.
//!
//! Shake and Dip push the view by an offset; Shrink scales it about the
//! screen centre, starting zoomed in and relaxing back to 1.
//!
//! A single slot holds the active effect. Starting a new effect while one is
//! running replaces it outright; the old one is not queued and gets no
//! completion notice.

use std::f32::consts::TAU;

use glam::Vec2;
use tracing::debug;

const SHAKE_CYCLES_PER_SECOND: f32 = 12.0;
const COMPLETION_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Offset vector spinning around the origin while its length decays
    /// linearly to zero.
    Shake,
    /// Downward push that recovers linearly to zero.
    Dip,
    /// Zoom that starts at `1 + magnitude` and shrinks linearly back to 1.
    Shrink,
}

impl EffectKind {
    pub fn default_magnitude(self) -> f32 {
        match self {
            EffectKind::Shake => 0.12,
            EffectKind::Dip => 0.3,
            EffectKind::Shrink => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effect {
    pub kind: EffectKind,
    pub elapsed: f32,
    pub duration: f32,
    pub magnitude: f32,
}

impl Effect {
    pub fn view_offset(&self) -> Vec2 {
        effect_offset(self.kind, self.elapsed, self.duration, self.magnitude)
    }

    pub fn view_scale(&self) -> f32 {
        effect_scale(self.kind, self.elapsed, self.duration, self.magnitude)
    }
}

fn remaining_fraction(elapsed: f32, duration: f32) -> f32 {
    1.0 - (elapsed / duration).clamp(0.0, 1.0)
}

/// Offset of an effect at `elapsed` seconds into a run of `duration` seconds.
/// Zero once `elapsed >= duration`.
pub fn effect_offset(kind: EffectKind, elapsed: f32, duration: f32, magnitude: f32) -> Vec2 {
    if duration <= 0.0 || elapsed >= duration {
        return Vec2::ZERO;
    }
    let envelope = magnitude * remaining_fraction(elapsed, duration);
    match kind {
        EffectKind::Shake => {
            let angle = TAU * SHAKE_CYCLES_PER_SECOND * elapsed;
            Vec2::new(angle.cos(), angle.sin()) * envelope
        }
        EffectKind::Dip => Vec2::new(0.0, -envelope),
        EffectKind::Shrink => Vec2::ZERO,
    }
}

/// Uniform view scale of an effect. Exactly 1 for kinds that only offset and
/// once `elapsed >= duration`.
pub fn effect_scale(kind: EffectKind, elapsed: f32, duration: f32, magnitude: f32) -> f32 {
    if kind != EffectKind::Shrink || duration <= 0.0 || elapsed >= duration {
        return 1.0;
    }
    1.0 + magnitude * remaining_fraction(elapsed, duration)
}

#[derive(Debug, Default)]
pub struct EffectController {
    active: Option<Effect>,
}

impl EffectController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, kind: EffectKind, duration: f32) {
        self.start_with_magnitude(kind, duration, kind.default_magnitude());
    }

    pub fn start_with_magnitude(&mut self, kind: EffectKind, duration: f32, magnitude: f32) {
        let replaced = self.active.map(|effect| effect.kind);
        if !(duration.is_finite() && duration > 0.0) {
            self.active = None;
            debug!(?kind, duration, "effect_ignored");
            return;
        }
        self.active = Some(Effect {
            kind,
            elapsed: 0.0,
            duration,
            magnitude,
        });
        debug!(?kind, duration, magnitude, ?replaced, "effect_started");
    }

    pub fn update(&mut self, fixed_dt_seconds: f32) {
        let Some(effect) = self.active.as_mut() else {
            return;
        };
        effect.elapsed += fixed_dt_seconds;
        if effect.elapsed + COMPLETION_EPSILON >= effect.duration {
            debug!(kind = ?effect.kind, "effect_finished");
            self.active = None;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&Effect> {
        self.active.as_ref()
    }

    pub fn view_offset(&self) -> Vec2 {
        self.active
            .as_ref()
            .map_or(Vec2::ZERO, Effect::view_offset)
    }

    pub fn view_scale(&self) -> f32 {
        self.active.as_ref().map_or(1.0, Effect::view_scale)
    }
}
