//! Arrival celebrations layered over another strategy.

use delivery_domain::Vector3;

use super::Strategy;
use crate::entity::EntityCore;

/// Seconds spent celebrating once the inner strategy finishes
pub const CELEBRATION_SECS: f64 = 2.0;

const JUMP_HEIGHT: f64 = 5.0;
const JUMPS_PER_SEC: f64 = 1.5;
const SPIN_RADIANS_PER_SEC: f64 = 10.0;

/// How the entity celebrates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Celebration {
    Jump,
    Spin,
}

#[derive(Debug, Clone)]
pub struct CelebrationStrategy {
    inner: Box<Strategy>,
    style: Celebration,
    remaining: f64,
    /// Altitude when the celebration started, restored at the end
    ground: Option<f64>,
}

impl CelebrationStrategy {
    #[must_use]
    pub fn wrap(inner: Strategy, style: Celebration) -> Strategy {
        Strategy::Celebration(Self {
            inner: Box::new(inner),
            style,
            remaining: CELEBRATION_SECS,
            ground: None,
        })
    }

    pub fn advance(&mut self, entity: &mut EntityCore, dt: f64) {
        if !self.inner.is_completed() {
            self.inner.advance(entity, dt);
            return;
        }
        if self.is_completed() {
            return;
        }

        self.celebrate(entity, dt);
        self.remaining -= dt;

        if self.is_completed() {
            if let Some(ground) = self.ground.take() {
                entity.position.y = ground;
            }
        }
    }

    fn celebrate(&mut self, entity: &mut EntityCore, dt: f64) {
        match self.style {
            Celebration::Spin => entity.rotate(dt * SPIN_RADIANS_PER_SEC),
            Celebration::Jump => {
                let ground = *self.ground.get_or_insert(entity.position.y);
                let elapsed = CELEBRATION_SECS - self.remaining + dt;
                let phase = elapsed * JUMPS_PER_SEC * std::f64::consts::PI;
                entity.position.y = ground + JUMP_HEIGHT * phase.sin().abs();
            }
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.inner.is_completed() && self.remaining <= 0.0
    }

    #[must_use]
    pub fn current_path_distance(&self, from: Vector3) -> f64 {
        self.inner.current_path_distance(from)
    }

    #[must_use]
    pub fn total_path_distance(&self, from: Vector3) -> f64 {
        self.inner.total_path_distance(from)
    }

    #[must_use]
    pub fn destination(&self) -> Option<Vector3> {
        self.inner.destination()
    }
}
