//! Entities: a positioned, z-ordered record plus one boxed behavior.
//!
//! An entity is built detached, handed to [`crate::Scene::activate`], and
//! handed back by [`crate::Scene::deactivate`]. Behavior is a single trait
//! object; [`FnBehavior`] builds one from closures.

use std::sync::atomic::{AtomicU64, Ordering};

use easel_core::{EaselError, EntityId, InputState, Vector2};
use easel_render::DrawSurface;

use crate::frame::FrameInfo;

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Which per-frame calls a behavior wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub steps: bool,
    pub draws: bool,
}

impl Capabilities {
    pub const ALL: Self = Self {
        steps: true,
        draws: true,
    };
    pub const NONE: Self = Self {
        steps: false,
        draws: false,
    };
}

/// The data half of an entity. Behaviors read and write it; the scene reads
/// `z_index` to keep the draw order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: EntityId,
    pub position: Vector2,
    pub z_index: f32,
}

/// Passed to `Behavior::step`.
pub struct StepContext<'a> {
    /// Seconds covered by this step.
    pub dt: f64,
    pub frame: u64,
    pub input: &'a InputState,
    pub commands: &'a mut Commands,
}

/// Passed to `Behavior::draw` and to the scene's draw hooks.
pub struct DrawContext<'a> {
    pub surface: &'a mut DrawSurface,
    pub frame: &'a FrameInfo,
}

pub trait Behavior {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn step(&mut self, _body: &mut Body, _ctx: &mut StepContext<'_>) -> Result<(), EaselError> {
        Ok(())
    }

    fn draw(&self, _body: &Body, _ctx: &mut DrawContext<'_>) -> Result<(), EaselError> {
        Ok(())
    }
}

type StepFn = Box<dyn FnMut(&mut Body, &mut StepContext<'_>) -> Result<(), EaselError>>;
type DrawFn = Box<dyn Fn(&Body, &mut DrawContext<'_>) -> Result<(), EaselError>>;

/// A behavior assembled from closures. Capabilities follow from which
/// closures were supplied.
#[derive(Default)]
pub struct FnBehavior {
    step: Option<StepFn>,
    draw: Option<DrawFn>,
}

impl FnBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_step(
        mut self,
        f: impl FnMut(&mut Body, &mut StepContext<'_>) -> Result<(), EaselError> + 'static,
    ) -> Self {
        self.step = Some(Box::new(f));
        self
    }

    pub fn on_draw(
        mut self,
        f: impl Fn(&Body, &mut DrawContext<'_>) -> Result<(), EaselError> + 'static,
    ) -> Self {
        self.draw = Some(Box::new(f));
        self
    }
}

impl Behavior for FnBehavior {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            steps: self.step.is_some(),
            draws: self.draw.is_some(),
        }
    }

    fn step(&mut self, body: &mut Body, ctx: &mut StepContext<'_>) -> Result<(), EaselError> {
        match self.step.as_mut() {
            Some(step) => step(body, ctx),
            None => Ok(()),
        }
    }

    fn draw(&self, body: &Body, ctx: &mut DrawContext<'_>) -> Result<(), EaselError> {
        match self.draw.as_ref() {
            Some(draw) => draw(body, ctx),
            None => Ok(()),
        }
    }
}

pub struct Entity {
    pub(crate) body: Body,
    pub(crate) behavior: Box<dyn Behavior>,
}

impl Entity {
    /// A detached entity at `position`. Its z-index starts at `position.y`.
    pub fn new(position: Vector2, behavior: impl Behavior + 'static) -> Self {
        Self::boxed(position, Box::new(behavior))
    }

    pub fn boxed(position: Vector2, behavior: Box<dyn Behavior>) -> Self {
        let id = EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            body: Body {
                id,
                position,
                z_index: position.y,
            },
            behavior,
        }
    }

    pub fn with_z_index(mut self, z_index: f32) -> Self {
        self.body.z_index = z_index;
        self
    }

    pub fn id(&self) -> EntityId {
        self.body.id
    }

    pub fn position(&self) -> Vector2 {
        self.body.position
    }

    pub fn set_position(&mut self, position: Vector2) {
        self.body.position = position;
    }

    pub fn z_index(&self) -> f32 {
        self.body.z_index
    }

    /// Takes effect in the draw order from the next draw pass.
    pub fn set_z_index(&mut self, z_index: f32) {
        self.body.z_index = z_index;
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn capabilities(&self) -> Capabilities {
        self.behavior.capabilities()
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("body", &self.body)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Membership changes requested while the scene is mid-pass. Applied in
/// request order once the pass is over.
#[derive(Default)]
pub struct Commands {
    queue: Vec<Command>,
}

pub(crate) enum Command {
    Activate(Entity),
    Deactivate(EntityId),
    Follow(EntityId),
    Unfollow,
}

impl Commands {
    /// Activate after the current pass. The new entity draws this frame.
    pub fn activate(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        self.queue.push(Command::Activate(entity));
        id
    }

    /// Deactivate after the current pass. The entity is skipped for the rest
    /// of the pass.
    pub fn deactivate(&mut self, id: EntityId) {
        self.queue.push(Command::Deactivate(id));
    }

    pub fn follow(&mut self, id: EntityId) {
        self.queue.push(Command::Follow(id));
    }

    pub fn unfollow(&mut self) {
        self.queue.push(Command::Unfollow);
    }

    pub fn is_pending_removal(&self, id: EntityId) -> bool {
        self.queue
            .iter()
            .any(|c| matches!(c, Command::Deactivate(pending) if *pending == id))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }
}
