//! The scene owns the active entities and the draw surface, and runs one
//! frame at a time:
//!
//! 1. the scheduler decides the frame (advance, hold, single step, halt)
//! 2. zero or more step passes over a snapshot of the draw order; membership
//!    changes requested mid-pass land after the pass
//! 3. the camera target is resolved and its displacement read once
//! 4. clear, `before_draw`, entities in ascending z, `after_draw`
//!
//! A behavior that errors or panics in step or draw is logged and counted as
//! a fault; the paint state stack is repaired and the frame carries on.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use easel_core::config::{EngineConfig, TimingConfig};
use easel_core::{Camera, EaselError, EntityId, FramePhase, InputState, TimeState, Vector2};
use easel_render::{DrawSurface, SurfaceOptions};

use crate::entity::{Command, Commands, DrawContext, Entity, StepContext};
use crate::frame::{FrameInfo, FrameStats};
use crate::scheduler::{FrameDecision, Scheduler, SchedulerState};

pub type DrawHook = Box<dyn FnMut(&mut DrawContext<'_>) -> Result<(), EaselError>>;

#[derive(Debug, Clone, Copy)]
struct OrderEntry {
    id: EntityId,
    z: f32,
    /// Activation sequence; breaks z ties.
    seq: u64,
}

fn compare_entries(a: &OrderEntry, b: &OrderEntry) -> std::cmp::Ordering {
    a.z.total_cmp(&b.z).then(a.seq.cmp(&b.seq))
}

pub struct Scene {
    entities: HashMap<EntityId, Entity>,
    /// Always sorted by (z, seq).
    order: Vec<OrderEntry>,
    next_seq: u64,
    surface: DrawSurface,
    time: TimeState,
    scheduler: Scheduler,
    before_draw: Option<DrawHook>,
    after_draw: Option<DrawHook>,
    pending: Commands,
    collect_deactivated: bool,
    deactivated: Vec<Entity>,
    faults: Vec<EaselError>,
    stats: FrameStats,
    last_frame: FrameInfo,
}

impl Scene {
    pub fn new(surface: SurfaceOptions, timing: &TimingConfig) -> Self {
        Self {
            entities: HashMap::new(),
            order: Vec::new(),
            next_seq: 0,
            surface: DrawSurface::new(surface),
            time: TimeState::from_config(timing),
            scheduler: Scheduler::new(timing.target_fps),
            before_draw: None,
            after_draw: None,
            pending: Commands::default(),
            collect_deactivated: false,
            deactivated: Vec::new(),
            faults: Vec::new(),
            stats: FrameStats::default(),
            last_frame: FrameInfo::default(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(SurfaceOptions::from(&config.surface), &config.timing)
    }

    /// Hot-apply surface and timing settings. Entities, camera and FPS
    /// history are kept.
    pub fn apply_config(&mut self, config: &EngineConfig) {
        self.surface
            .set_options(SurfaceOptions::from(&config.surface));
        self.time.apply_config(&config.timing);
        self.scheduler.set_target_fps(config.timing.target_fps);
    }

    pub fn surface(&self) -> &DrawSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut DrawSurface {
        &mut self.surface
    }

    pub fn time(&self) -> &TimeState {
        &self.time
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Shorthand for `scheduler_mut().start()`.
    pub fn start(&mut self) {
        self.scheduler.start();
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn last_frame(&self) -> &FrameInfo {
        &self.last_frame
    }

    /// Faults isolated during the most recent frame.
    pub fn frame_faults(&self) -> &[EaselError] {
        &self.faults
    }

    pub fn set_before_draw(
        &mut self,
        hook: impl FnMut(&mut DrawContext<'_>) -> Result<(), EaselError> + 'static,
    ) {
        self.before_draw = Some(Box::new(hook));
    }

    pub fn set_after_draw(
        &mut self,
        hook: impl FnMut(&mut DrawContext<'_>) -> Result<(), EaselError> + 'static,
    ) {
        self.after_draw = Some(Box::new(hook));
    }

    // -- membership ------------------------------------------------------

    /// Take ownership of `entity` and slot it into the draw order after any
    /// entity with the same z. Activating an id that is already active does
    /// nothing.
    pub fn activate(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        if self.entities.contains_key(&id) {
            log::debug!("Entity {id} is already active");
            return id;
        }
        let entry = OrderEntry {
            id,
            z: entity.z_index(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let at = self
            .order
            .partition_point(|e| compare_entries(e, &entry).is_lt());
        self.order.insert(at, entry);
        self.entities.insert(id, entity);
        log::debug!("Activated entity {id} at z {}", entry.z);
        id
    }

    /// Remove `id` and hand the entity back. The scene keeps no reference;
    /// a camera following it sees a stale handle from the next frame.
    pub fn deactivate(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        self.order.retain(|e| e.id != id);
        log::debug!("Deactivated entity {id}");
        Some(entity)
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Active ids in draw order.
    pub fn draw_order(&self) -> Vec<EntityId> {
        self.order.iter().map(|e| e.id).collect()
    }

    pub fn set_position(&mut self, id: EntityId, position: Vector2) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.set_position(position);
                true
            }
            None => false,
        }
    }

    pub fn set_z_index(&mut self, id: EntityId, z_index: f32) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.set_z_index(z_index);
                self.refresh_order();
                true
            }
            None => false,
        }
    }

    /// Keep entities removed by behaviors for `take_deactivated` instead of
    /// dropping them as soon as the removal is applied. Off by default.
    pub fn set_collect_deactivated(&mut self, collect: bool) {
        self.collect_deactivated = collect;
        if !collect {
            self.deactivated.clear();
        }
    }

    /// Entities removed by behaviors during the last frame, when collection
    /// is on. Anything not taken is dropped when the next frame starts.
    pub fn take_deactivated(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.deactivated)
    }

    // -- camera ----------------------------------------------------------

    /// Centre the view on `id`. Attaches a camera if the surface has none.
    pub fn set_camera_target(&mut self, id: EntityId) -> Result<(), EaselError> {
        let position = self
            .entities
            .get(&id)
            .map(Entity::position)
            .ok_or_else(|| EaselError::invalid_input(format!("entity {id} is not active")))?;
        if self.surface.camera().is_none() {
            self.surface
                .attach_camera(Camera::new(self.surface.options().logical_size()));
        }
        if let Some(camera) = self.surface.camera_mut() {
            camera.follow(id, position);
        }
        Ok(())
    }

    pub fn clear_camera_target(&mut self) {
        if let Some(camera) = self.surface.camera_mut() {
            camera.clear_target();
        }
    }

    // -- frame -----------------------------------------------------------

    /// Run one frame against the wall clock.
    pub fn frame(&mut self, input: &InputState) -> FrameDecision {
        let starting = self.scheduler.state() == SchedulerState::Idle;
        let decision = self.scheduler.begin_frame();
        if decision == FrameDecision::Halt {
            return decision;
        }
        if starting {
            self.time.reset_clock();
        }
        self.time.begin_frame();
        self.run_frame(decision, input);
        decision
    }

    /// Run one frame as if `real_dt` seconds had passed since the last one.
    pub fn frame_with(&mut self, real_dt: f64, input: &InputState) -> FrameDecision {
        let decision = self.scheduler.begin_frame();
        if decision == FrameDecision::Halt {
            return decision;
        }
        self.time.begin_frame_with(real_dt);
        self.run_frame(decision, input);
        decision
    }

    fn run_frame(&mut self, decision: FrameDecision, input: &InputState) {
        if !self.deactivated.is_empty() {
            log::debug!(
                "Dropping {} deactivated entities nobody collected",
                self.deactivated.len()
            );
            self.deactivated.clear();
        }
        self.faults.clear();
        self.stats.begin_frame();

        match decision {
            FrameDecision::Hold => self.time.drop_pending_steps(),
            FrameDecision::SingleStep => {
                self.time.drop_pending_steps();
                self.time.grant_single_step();
            }
            FrameDecision::Advance | FrameDecision::Halt => {}
        }

        while self.time.should_step() {
            let dt = self.time.step_dt();
            self.step_pass(dt, input);
            self.apply_commands();
            self.refresh_order();
        }
        self.time.end_frame();

        let entities = &self.entities;
        let camera_displacement = match self.surface.camera_mut() {
            Some(camera) => {
                camera.resolve_target(|id| entities.get(&id).map(Entity::position));
                camera.compute_target_displacement()
            }
            None => Vector2::ZERO,
        };

        let info = FrameInfo {
            frame: self.time.frame_count,
            real_dt: self.time.real_dt,
            total_time: self.time.total_time,
            fps: self.time.smoothed_fps,
            frame_time_ms: self.time.smoothed_frame_time_ms,
            camera_displacement,
            interpolation_alpha: self.time.interpolation_alpha,
            paused: decision != FrameDecision::Advance,
        };
        self.last_frame = info;

        self.surface.clear();
        run_hook(self.before_draw.as_mut(), &mut self.surface, &info, "before_draw");
        self.draw_pass(&info);
        run_hook(self.after_draw.as_mut(), &mut self.surface, &info, "after_draw");

        self.stats.steps = self.time.steps_this_frame;
        self.stats.entities = self.entities.len();
        self.stats.draw_commands = self.surface.draw_list().len();
    }

    fn step_pass(&mut self, dt: f64, input: &InputState) {
        let snapshot = self.draw_order();
        let frame = self.time.frame_count;
        for id in snapshot {
            if self.pending.is_pending_removal(id) {
                continue;
            }
            let Some(entity) = self.entities.get_mut(&id) else {
                continue;
            };
            if !entity.behavior.capabilities().steps {
                continue;
            }
            let mut ctx = StepContext {
                dt,
                frame,
                input,
                commands: &mut self.pending,
            };
            let Entity { body, behavior } = entity;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| behavior.step(body, &mut ctx)));
            if let Some(fault) = fault_from(id, FramePhase::Step, outcome) {
                self.report_fault(fault);
            }
        }
    }

    fn draw_pass(&mut self, info: &FrameInfo) {
        for index in 0..self.order.len() {
            let id = self.order[index].id;
            let Some(entity) = self.entities.get(&id) else {
                continue;
            };
            if !entity.behavior.capabilities().draws {
                continue;
            }
            let depth = self.surface.state_depth();
            let mut ctx = DrawContext {
                surface: &mut self.surface,
                frame: info,
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                entity.behavior.draw(&entity.body, &mut ctx)
            }));
            self.surface.restore_to(depth);
            if let Some(fault) = fault_from(id, FramePhase::Draw, outcome) {
                self.report_fault(fault);
            }
        }
    }

    fn apply_commands(&mut self) {
        for command in self.pending.take() {
            match command {
                Command::Activate(entity) => {
                    self.activate(entity);
                }
                Command::Deactivate(id) => {
                    match self.deactivate(id) {
                        Some(entity) if self.collect_deactivated => {
                            self.deactivated.push(entity)
                        }
                        Some(entity) => drop(entity),
                        None => {}
                    }
                }
                Command::Follow(id) => {
                    if let Err(err) = self.set_camera_target(id) {
                        log::warn!("Camera follow ignored: {err}");
                    }
                }
                Command::Unfollow => self.clear_camera_target(),
            }
        }
    }

    /// Pick up z changes made by behaviors or callers.
    fn refresh_order(&mut self) {
        let mut changed = false;
        for entry in &mut self.order {
            if let Some(entity) = self.entities.get(&entry.id) {
                let z = entity.z_index();
                if z.to_bits() != entry.z.to_bits() {
                    entry.z = z;
                    changed = true;
                }
            }
        }
        if changed {
            self.order.sort_by(compare_entries);
        }
    }

    fn report_fault(&mut self, fault: EaselError) {
        log::error!("{fault}");
        self.stats.record_fault();
        self.faults.push(fault);
    }
}

fn run_hook(
    hook: Option<&mut DrawHook>,
    surface: &mut DrawSurface,
    info: &FrameInfo,
    name: &str,
) {
    let Some(hook) = hook else {
        return;
    };
    let depth = surface.state_depth();
    let mut ctx = DrawContext {
        surface: &mut *surface,
        frame: info,
    };
    match panic::catch_unwind(AssertUnwindSafe(|| hook(&mut ctx))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::warn!("{name} hook failed: {err}"),
        Err(payload) => log::error!(
            "{name} hook panicked: {}",
            panic_message(payload.as_ref())
        ),
    }
    surface.restore_to(depth);
}

/// `None` for success and for resources that are still loading.
fn fault_from(
    id: EntityId,
    phase: FramePhase,
    outcome: std::thread::Result<Result<(), EaselError>>,
) -> Option<EaselError> {
    let reason = match outcome {
        Ok(Ok(())) => return None,
        Ok(Err(EaselError::ResourceNotReady(what))) => {
            log::trace!("Entity {id} {phase}: {what} not ready");
            return None;
        }
        Ok(Err(err)) => err.to_string(),
        Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
    };
    Some(EaselError::EntityFault { id, phase, reason })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use easel_core::config::StepMode;
    use easel_render::{Color, DrawCommand, DrawStyle, ImageHandle};

    use super::*;
    use crate::entity::{Behavior, Body, FnBehavior};

    const DT: f64 = 1.0 / 60.0;

    fn timing() -> TimingConfig {
        TimingConfig {
            target_fps: 60.0,
            step_mode: StepMode::Fixed,
            fixed_dt: DT,
            max_accumulator: 0.25,
        }
    }

    fn running_scene() -> Scene {
        let mut scene = Scene::new(
            SurfaceOptions {
                width: 480,
                height: 320,
                scale: 2.0,
                background: Color::BLACK,
            },
            &timing(),
        );
        scene.start();
        scene
    }

    /// Draws a 1x1 rect at its position and logs its id to `log`.
    fn marker(log: &Rc<RefCell<Vec<EntityId>>>) -> FnBehavior {
        let log = Rc::clone(log);
        FnBehavior::new().on_draw(move |body, ctx| {
            log.borrow_mut().push(body.id);
            ctx.surface
                .draw_rect(body.position, Vector2::new(1.0, 1.0), &DrawStyle::new());
            Ok(())
        })
    }

    fn one_step() -> f64 {
        // 1.5 steps owed: exactly one runs, never two.
        DT * 1.5
    }

    #[test]
    fn draw_order_follows_z() {
        let mut scene = running_scene();
        let drawn = Rc::new(RefCell::new(Vec::new()));
        let five = scene.activate(Entity::new(Vector2::ZERO, marker(&drawn)).with_z_index(5.0));
        let one = scene.activate(Entity::new(Vector2::ZERO, marker(&drawn)).with_z_index(1.0));
        let three = scene.activate(Entity::new(Vector2::ZERO, marker(&drawn)).with_z_index(3.0));

        assert_eq!(scene.draw_order(), vec![one, three, five]);
        scene.frame_with(one_step(), &InputState::new());
        assert_eq!(*drawn.borrow(), vec![one, three, five]);
    }

    #[test]
    fn equal_z_draws_in_activation_order() {
        let mut scene = running_scene();
        let drawn = Rc::new(RefCell::new(Vec::new()));
        let a = scene.activate(Entity::new(Vector2::new(0.0, 10.0), marker(&drawn)));
        let b = scene.activate(Entity::new(Vector2::new(5.0, 10.0), marker(&drawn)));
        let c = scene.activate(Entity::new(Vector2::new(9.0, 10.0), marker(&drawn)));
        assert_eq!(scene.draw_order(), vec![a, b, c]);

        // Re-activation counts as a new activation.
        let entity = scene.deactivate(a).expect("active");
        scene.activate(entity);
        assert_eq!(scene.draw_order(), vec![b, c, a]);
    }

    #[test]
    fn z_change_during_step_reorders_the_same_frame() {
        let mut scene = running_scene();
        let drawn = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&drawn);
        let sinker = scene.activate(
            Entity::new(
                Vector2::ZERO,
                FnBehavior::new()
                    .on_step(|body, _| {
                        body.z_index = 100.0;
                        Ok(())
                    })
                    .on_draw(move |body, _| {
                        log.borrow_mut().push(body.id);
                        Ok(())
                    }),
            )
            .with_z_index(0.0),
        );
        let other = scene.activate(Entity::new(Vector2::ZERO, marker(&drawn)).with_z_index(50.0));

        scene.frame_with(one_step(), &InputState::new());
        assert_eq!(*drawn.borrow(), vec![other, sinker]);
        assert_eq!(scene.draw_order(), vec![other, sinker]);
    }

    #[test]
    fn deactivated_mid_pass_is_skipped_and_returned() {
        let mut scene = running_scene();
        scene.set_collect_deactivated(true);
        let stepped = Rc::new(Cell::new(0u32));
        let drawn = Rc::new(RefCell::new(Vec::new()));

        let count = Rc::clone(&stepped);
        let log = Rc::clone(&drawn);
        let victim = Entity::new(
            Vector2::ZERO,
            FnBehavior::new()
                .on_step(move |_, _| {
                    count.set(count.get() + 1);
                    Ok(())
                })
                .on_draw(move |body, _| {
                    log.borrow_mut().push(body.id);
                    Ok(())
                }),
        )
        .with_z_index(1.0);
        let victim_id = victim.id();

        scene.activate(
            Entity::new(
                Vector2::ZERO,
                FnBehavior::new().on_step(move |_, ctx| {
                    ctx.commands.deactivate(victim_id);
                    Ok(())
                }),
            )
            .with_z_index(0.0),
        );
        scene.activate(victim);

        scene.frame_with(one_step(), &InputState::new());
        assert_eq!(stepped.get(), 0, "pending removal is not stepped");
        assert!(drawn.borrow().is_empty(), "removed before the draw pass");
        assert!(!scene.is_active(victim_id));

        let returned = scene.take_deactivated();
        assert_eq!(returned.len(), 1);
        assert_eq!(returned[0].id(), victim_id);
    }

    struct DropFlag(Rc<Cell<bool>>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    #[test]
    fn self_deactivated_entity_is_dropped_when_not_collected() {
        let mut scene = running_scene();
        let dropped = Rc::new(Cell::new(false));
        let flag = DropFlag(Rc::clone(&dropped));
        let id = scene.activate(Entity::new(
            Vector2::ZERO,
            FnBehavior::new().on_step(move |body, ctx| {
                let _held = &flag;
                ctx.commands.deactivate(body.id);
                Ok(())
            }),
        ));

        scene.frame_with(one_step(), &InputState::new());
        assert!(!scene.is_active(id));
        assert!(dropped.get(), "released once the removal is applied");
        assert!(scene.take_deactivated().is_empty());
    }

    #[test]
    fn spawned_mid_pass_draws_this_frame_and_steps_next() {
        let mut scene = running_scene();
        let spawned_steps = Rc::new(Cell::new(0u32));
        let drawn = Rc::new(RefCell::new(Vec::new()));
        let spawned_id = Rc::new(Cell::new(None));

        let steps = Rc::clone(&spawned_steps);
        let log = Rc::clone(&drawn);
        let id_slot = Rc::clone(&spawned_id);
        let mut pending_child = Some(Entity::new(
            Vector2::ZERO,
            FnBehavior::new()
                .on_step(move |_, _| {
                    steps.set(steps.get() + 1);
                    Ok(())
                })
                .on_draw(move |body, _| {
                    log.borrow_mut().push(body.id);
                    Ok(())
                }),
        ));
        scene.activate(Entity::new(
            Vector2::ZERO,
            FnBehavior::new().on_step(move |_, ctx| {
                if let Some(child) = pending_child.take() {
                    id_slot.set(Some(ctx.commands.activate(child)));
                }
                Ok(())
            }),
        ));

        scene.frame_with(one_step(), &InputState::new());
        let child = spawned_id.get().expect("spawned");
        assert!(scene.is_active(child));
        assert_eq!(spawned_steps.get(), 0);
        assert_eq!(*drawn.borrow(), vec![child]);

        scene.frame_with(DT, &InputState::new());
        assert_eq!(spawned_steps.get(), 1);
    }

    struct Faulty;

    impl Behavior for Faulty {
        fn step(&mut self, _: &mut Body, _: &mut StepContext<'_>) -> Result<(), EaselError> {
            panic!("step exploded");
        }

        fn draw(&self, _: &Body, ctx: &mut DrawContext<'_>) -> Result<(), EaselError> {
            ctx.surface
                .with_style(&DrawStyle::new().fill(Color::rgb(255, 0, 0)), |_| {
                    Err(EaselError::invalid_input("bad geometry"))
                })
        }
    }

    struct PanicsInsideStyle;

    impl Behavior for PanicsInsideStyle {
        fn draw(&self, _: &Body, ctx: &mut DrawContext<'_>) -> Result<(), EaselError> {
            ctx.surface
                .with_style(
                    &DrawStyle::new().fill(Color::rgb(0, 255, 0)),
                    |_| -> Result<(), EaselError> { panic!("draw exploded") },
                )
        }
    }

    #[test]
    fn faults_are_isolated_and_paint_state_is_repaired() {
        let mut scene = running_scene();
        let drawn = Rc::new(RefCell::new(Vec::new()));
        let faulty = scene.activate(Entity::new(Vector2::ZERO, Faulty).with_z_index(0.0));
        let panicky =
            scene.activate(Entity::new(Vector2::ZERO, PanicsInsideStyle).with_z_index(1.0));
        let healthy =
            scene.activate(Entity::new(Vector2::new(4.0, 4.0), marker(&drawn)).with_z_index(2.0));

        scene.frame_with(one_step(), &InputState::new());

        assert_eq!(*drawn.borrow(), vec![healthy]);
        assert_eq!(scene.stats().faults, 3);
        let faulted: Vec<(EntityId, FramePhase)> = scene
            .frame_faults()
            .iter()
            .filter_map(|f| match f {
                EaselError::EntityFault { id, phase, .. } => Some((*id, *phase)),
                _ => None,
            })
            .collect();
        assert_eq!(
            faulted,
            vec![
                (faulty, FramePhase::Step),
                (faulty, FramePhase::Draw),
                (panicky, FramePhase::Draw)
            ]
        );

        assert_eq!(scene.surface().state_depth(), 0);
        match scene.surface().draw_list().last() {
            Some(DrawCommand::Rect { fill, .. }) => {
                assert_eq!(*fill, Some(easel_render::style::FOREGROUND))
            }
            other => panic!("expected the healthy rect, got {other:?}"),
        }
        assert!(scene.is_active(faulty), "faulting does not deactivate");
    }

    #[test]
    fn panicking_hook_is_contained_and_drawing_continues() {
        let mut scene = running_scene();
        let drawn = Rc::new(RefCell::new(Vec::new()));
        let healthy = scene.activate(Entity::new(Vector2::ZERO, marker(&drawn)));
        scene.set_before_draw(|ctx| {
            ctx.surface.with_style(
                &DrawStyle::new().fill(Color::rgb(0, 255, 0)),
                |_| -> Result<(), EaselError> { panic!("grid exploded") },
            )
        });
        scene.set_after_draw(|_| -> Result<(), EaselError> { panic!("hud exploded") });

        scene.frame_with(one_step(), &InputState::new());
        assert_eq!(*drawn.borrow(), vec![healthy]);
        assert_eq!(scene.surface().state_depth(), 0);
        match scene.surface().draw_list().last() {
            Some(DrawCommand::Rect { fill, .. }) => {
                assert_eq!(*fill, Some(easel_render::style::FOREGROUND))
            }
            other => panic!("expected the entity rect, got {other:?}"),
        }

        assert_eq!(
            scene.frame_with(one_step(), &InputState::new()),
            FrameDecision::Advance
        );
    }

    #[test]
    fn unloaded_image_is_not_a_fault() {
        let mut scene = running_scene();
        let image = ImageHandle::pending("later.png");
        scene.activate(Entity::new(
            Vector2::ZERO,
            FnBehavior::new().on_draw(move |body, ctx| {
                image.require_loaded()?;
                ctx.surface
                    .draw_image(&image, body.position, 1.0, &DrawStyle::new());
                Ok(())
            }),
        ));
        scene.frame_with(one_step(), &InputState::new());
        assert_eq!(scene.stats().faults, 0);
        assert!(scene.surface().draw_list().is_empty());
    }

    #[test]
    fn camera_centres_target_at_scale_two() {
        let mut scene = running_scene();
        let player = scene.activate(Entity::new(
            Vector2::new(100.0, 250.0),
            FnBehavior::new().on_draw(|body, ctx| {
                ctx.surface
                    .draw_rect(body.position, Vector2::new(8.0, 8.0), &DrawStyle::new());
                Ok(())
            }),
        ));
        scene.set_camera_target(player).expect("active");
        scene.set_after_draw(|ctx| {
            ctx.surface.draw_text(
                "hud",
                Vector2::new(2.0, 2.0),
                &DrawStyle::new().overlay(),
            );
            Ok(())
        });

        scene.frame_with(one_step(), &InputState::new());

        let commands = scene.surface().draw_list().commands();
        match &commands[0] {
            DrawCommand::Rect { pos, .. } => assert_eq!(*pos, Vector2::new(240.0, 160.0)),
            other => panic!("expected rect, got {other:?}"),
        }
        match &commands[1] {
            DrawCommand::Text { pos, .. } => assert_eq!(*pos, Vector2::new(2.0, 2.0)),
            other => panic!("expected text, got {other:?}"),
        }
        assert_eq!(scene.surface().physical_size(), (960, 640));
    }

    #[test]
    fn displacement_is_read_once_per_frame() {
        let mut scene = running_scene();
        let player = scene.activate(Entity::new(
            Vector2::ZERO,
            FnBehavior::new().on_step(|body, _| {
                body.position.x += 5.0;
                Ok(())
            }),
        ));
        scene.set_camera_target(player).expect("active");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let before = Rc::clone(&seen);
        let after = Rc::clone(&seen);
        scene.set_before_draw(move |ctx| {
            before.borrow_mut().push(ctx.frame.camera_displacement);
            Ok(())
        });
        scene.set_after_draw(move |ctx| {
            after.borrow_mut().push(ctx.frame.camera_displacement);
            Ok(())
        });

        scene.frame_with(one_step(), &InputState::new());
        assert_eq!(
            *seen.borrow(),
            vec![Vector2::new(5.0, 0.0), Vector2::new(5.0, 0.0)]
        );
        assert_eq!(scene.last_frame().camera_displacement, Vector2::new(5.0, 0.0));
    }

    #[test]
    fn deactivated_camera_target_means_no_shift() {
        let mut scene = running_scene();
        let target = scene.activate(Entity::new(Vector2::new(100.0, 250.0), FnBehavior::new()));
        scene.set_camera_target(target).expect("active");
        scene.deactivate(target);

        scene.set_after_draw(|ctx| {
            ctx.surface
                .draw_rect(Vector2::new(7.0, 9.0), Vector2::new(1.0, 1.0), &DrawStyle::new());
            Ok(())
        });
        scene.frame_with(one_step(), &InputState::new());

        match scene.surface().draw_list().last() {
            Some(DrawCommand::Rect { pos, .. }) => assert_eq!(*pos, Vector2::new(7.0, 9.0)),
            other => panic!("expected rect, got {other:?}"),
        }
        assert_eq!(scene.last_frame().camera_displacement, Vector2::ZERO);
        assert!(scene.set_camera_target(target).is_err());
    }

    #[test]
    fn paused_frames_draw_without_stepping() {
        let mut scene = running_scene();
        let steps = Rc::new(Cell::new(0u32));
        let count = Rc::clone(&steps);
        let drawn = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&drawn);
        scene.activate(Entity::new(
            Vector2::ZERO,
            FnBehavior::new()
                .on_step(move |_, _| {
                    count.set(count.get() + 1);
                    Ok(())
                })
                .on_draw(move |body, _| {
                    log.borrow_mut().push(body.id);
                    Ok(())
                }),
        ));

        scene.scheduler_mut().pause();
        assert_eq!(scene.frame_with(0.1, &InputState::new()), FrameDecision::Hold);
        assert_eq!(steps.get(), 0);
        assert_eq!(drawn.borrow().len(), 1);
        assert!(scene.last_frame().paused);

        scene.scheduler_mut().request_single_step();
        assert_eq!(
            scene.frame_with(0.1, &InputState::new()),
            FrameDecision::SingleStep
        );
        assert_eq!(steps.get(), 1);

        scene.scheduler_mut().resume();
        scene.frame_with(one_step(), &InputState::new());
        assert_eq!(steps.get(), 2, "no catch-up for paused time");
    }

    #[test]
    fn idle_and_stopped_scenes_do_nothing() {
        let mut scene = Scene::new(SurfaceOptions::default(), &timing());
        let drawn = Rc::new(RefCell::new(Vec::new()));
        scene.activate(Entity::new(Vector2::ZERO, marker(&drawn)));
        assert_eq!(scene.frame_with(DT, &InputState::new()), FrameDecision::Halt);

        scene.start();
        scene.frame_with(one_step(), &InputState::new());
        scene.scheduler_mut().stop();
        assert_eq!(scene.frame_with(DT, &InputState::new()), FrameDecision::Halt);
        assert_eq!(drawn.borrow().len(), 1);
    }

    #[test]
    fn fixed_step_catches_up_and_reports_stats() {
        let mut scene = running_scene();
        let steps = Rc::new(Cell::new(0u32));
        let count = Rc::clone(&steps);
        scene.activate(Entity::new(
            Vector2::ZERO,
            FnBehavior::new().on_step(move |_, ctx| {
                assert!((ctx.dt - DT).abs() < 1e-12);
                count.set(count.get() + 1);
                Ok(())
            }),
        ));

        scene.frame_with(DT * 3.5, &InputState::new());
        assert_eq!(steps.get(), 3);
        assert_eq!(scene.stats().steps, 3);
        assert_eq!(scene.stats().entities, 1);
        assert_eq!(scene.stats().draw_commands, 0);
    }

    #[test]
    fn fps_tracks_frame_rate() {
        let mut scene = running_scene();
        for _ in 0..120 {
            scene.frame_with(1.0 / 30.0, &InputState::new());
        }
        assert!((scene.last_frame().fps - 30.0).abs() < 0.5);
    }

    #[test]
    fn behaviors_can_follow_through_commands() {
        let mut scene = running_scene();
        let target = scene.activate(Entity::new(Vector2::new(10.0, 10.0), FnBehavior::new()));
        scene.activate(Entity::new(
            Vector2::ZERO,
            FnBehavior::new().on_step(move |_, ctx| {
                ctx.commands.follow(target);
                Ok(())
            }),
        ));
        scene.frame_with(one_step(), &InputState::new());
        let camera = scene.surface().camera().expect("camera attached");
        assert_eq!(camera.target(), Some(target));
    }

    #[test]
    fn apply_config_keeps_entities_and_camera() {
        let mut scene = running_scene();
        let id = scene.activate(Entity::new(Vector2::new(1.0, 1.0), FnBehavior::new()));
        scene.set_camera_target(id).expect("active");

        let mut config = EngineConfig::default();
        config.surface.width = 640;
        config.surface.height = 360;
        config.timing.target_fps = 30.0;
        scene.apply_config(&config);

        assert!(scene.is_active(id));
        let camera = scene.surface().camera().expect("camera");
        assert_eq!(camera.viewport_size, Vector2::new(640.0, 360.0));
        assert_eq!(scene.time().target_fps, 30.0);
    }
}
