//! Follow camera: centres the viewport on a target entity.
//!
//! The camera never owns its target. It holds an [`EntityId`] handle and a
//! cached copy of the target's position, refreshed once per frame through
//! [`Camera::resolve_target`]. A handle that no longer resolves behaves
//! exactly like having no target: no centering shift, zero displacement.

use crate::error::EntityId;
use crate::vector2::Vector2;

#[derive(Debug, Clone)]
pub struct Camera {
    pub viewport_size: Vector2,
    target: Option<EntityId>,
    target_position: Option<Vector2>,
    previous_target_position: Vector2,
}

impl Camera {
    pub fn new(viewport_size: Vector2) -> Self {
        Self {
            viewport_size,
            target: None,
            target_position: None,
            previous_target_position: Vector2::ZERO,
        }
    }

    /// Start following `id`, currently at `position`. The previous position is
    /// seeded so the first displacement after retargeting is zero.
    pub fn follow(&mut self, id: EntityId, position: Vector2) {
        self.target = Some(id);
        self.target_position = Some(position);
        self.previous_target_position = position;
    }

    pub fn clear_target(&mut self) {
        self.target = None;
        self.target_position = None;
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Target position as of the last resolve, `None` if untargeted or stale.
    pub fn target_position(&self) -> Option<Vector2> {
        self.target_position
    }

    /// Refresh the cached target position. `lookup` returns the position of an
    /// active entity, or `None` if the handle is stale.
    pub fn resolve_target(&mut self, lookup: impl FnOnce(EntityId) -> Option<Vector2>) {
        let Some(id) = self.target else {
            return;
        };
        let resolved = lookup(id);
        match (self.target_position, resolved) {
            (Some(_), None) => {
                log::warn!("Camera target {id} is no longer active; treating as untargeted")
            }
            // Target came back: no jump in displacement.
            (None, Some(position)) => self.previous_target_position = position,
            _ => {}
        }
        self.target_position = resolved;
    }

    /// World to surface: the target lands on the viewport centre.
    pub fn to_surface_position(&self, world: Vector2) -> Vector2 {
        match self.target_position {
            Some(target) => world - target + self.viewport_size / 2.0,
            None => world,
        }
    }

    /// How far the target moved since the last call. Consumes the reading:
    /// a second call in the same frame returns zero. Call once per frame and
    /// cache the result.
    pub fn compute_target_displacement(&mut self) -> Vector2 {
        let Some(target) = self.target_position else {
            return Vector2::ZERO;
        };
        let displacement = target - self.previous_target_position;
        self.previous_target_position = target;
        displacement
    }
}
