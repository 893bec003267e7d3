//! Demo content: a player the camera follows, y-sorted props, short-lived
//! sparks spawned with Space, a world grid under everything and a HUD on top.

use easel_core::{EaselError, EntityId, InputState, Key, Vector2};
use easel_render::{Color, DrawStyle, ImageHandle, LineOptions};
use easel_scene::{Behavior, Body, DrawContext, Entity, FnBehavior, Scene, StepContext};

const PLAYER_SPEED: f32 = 90.0;
const SPRITE_SIZE: u32 = 8;
const SPRITE_SCALE: f32 = 2.0;
const GRID_STEP: f32 = 32.0;
const SPARK_LIFETIME: f64 = 0.6;

const GRID_COLOR: Color = Color::rgba(255, 255, 255, 24);
const PROP_COLOR: Color = Color::rgb(70, 140, 90);
const TRUNK_COLOR: Color = Color::rgb(110, 80, 50);
const SPARK_COLOR: Color = Color::rgb(255, 210, 90);
const SHADOW_COLOR: Color = Color::rgba(0, 0, 0, 90);

struct Player {
    sprite: ImageHandle,
}

impl Player {
    fn heading(input: &InputState) -> Vector2 {
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        let x = axis(
            input.key("ArrowLeft") || input.key("KeyA"),
            input.key("ArrowRight") || input.key("KeyD"),
        );
        let y = axis(
            input.key("ArrowUp") || input.key("KeyW"),
            input.key("ArrowDown") || input.key("KeyS"),
        );
        let heading = Vector2::new(x, y);
        match heading.length() {
            len if len > 0.0 => heading / len,
            _ => Vector2::ZERO,
        }
    }
}

impl Behavior for Player {
    fn step(&mut self, body: &mut Body, ctx: &mut StepContext<'_>) -> Result<(), EaselError> {
        let heading = Self::heading(ctx.input);
        body.position += heading * (PLAYER_SPEED * ctx.dt as f32);
        body.z_index = body.position.y;

        if ctx.input.is_just_pressed(Key::Space) {
            ctx.commands.activate(spark(body.position));
        }
        Ok(())
    }

    fn draw(&self, body: &Body, ctx: &mut DrawContext<'_>) -> Result<(), EaselError> {
        let half = SPRITE_SIZE as f32 * SPRITE_SCALE / 2.0;
        ctx.surface.draw_circle(
            half * 0.8,
            body.position + Vector2::new(0.0, half),
            &DrawStyle::new().fill(SHADOW_COLOR),
        );
        ctx.surface.draw_image(
            &self.sprite,
            body.position - Vector2::new(half, half),
            SPRITE_SCALE,
            &DrawStyle::new(),
        );
        Ok(())
    }
}

/// 8x8 two-tone checker used as the player sprite.
fn player_sprite() -> Result<ImageHandle, EaselError> {
    let mut rgba = Vec::with_capacity((SPRITE_SIZE * SPRITE_SIZE * 4) as usize);
    for y in 0..SPRITE_SIZE {
        for x in 0..SPRITE_SIZE {
            let border = x == 0 || y == 0 || x == SPRITE_SIZE - 1 || y == SPRITE_SIZE - 1;
            let px = match (border, (x + y) % 2 == 0) {
                (true, _) => [20, 20, 30, 255],
                (false, true) => [230, 90, 80, 255],
                (false, false) => [250, 160, 120, 255],
            };
            rgba.extend_from_slice(&px);
        }
    }
    ImageHandle::from_rgba("player", SPRITE_SIZE, SPRITE_SIZE, rgba)
}

fn prop(position: Vector2) -> Entity {
    Entity::new(
        position,
        FnBehavior::new().on_draw(|body, ctx| {
            ctx.surface.draw_rect(
                body.position - Vector2::new(2.0, 6.0),
                Vector2::new(4.0, 8.0),
                &DrawStyle::new().fill(TRUNK_COLOR),
            );
            ctx.surface.draw_circle(
                9.0,
                body.position - Vector2::new(0.0, 12.0),
                &DrawStyle::new()
                    .fill(PROP_COLOR)
                    .stroke(Color::BLACK)
                    .line_width(1.0),
            );
            Ok(())
        }),
    )
}

/// A spark that drifts upward and removes itself after `SPARK_LIFETIME`.
fn spark(origin: Vector2) -> Entity {
    let mut age = 0.0;
    Entity::new(
        origin,
        FnBehavior::new()
            .on_step(move |body, ctx| {
                age += ctx.dt;
                body.position.y -= 40.0 * ctx.dt as f32;
                if age >= SPARK_LIFETIME {
                    ctx.commands.deactivate(body.id);
                }
                Ok(())
            })
            .on_draw(|body, ctx| {
                ctx.surface.draw_circle(
                    2.0,
                    body.position,
                    &DrawStyle::new().fill(SPARK_COLOR),
                );
                Ok(())
            }),
    )
    // Sparks float above everything in the world.
    .with_z_index(f32::MAX)
}

fn draw_grid(ctx: &mut DrawContext<'_>) -> Result<(), EaselError> {
    let style = DrawStyle::new().stroke(GRID_COLOR);
    let straight = LineOptions::new();
    for i in -10..=10 {
        let offset = i as f32 * GRID_STEP;
        let extent = 10.0 * GRID_STEP;
        ctx.surface.draw_line(
            Vector2::new(offset, -extent),
            Vector2::new(offset, extent),
            &straight,
            &style,
        );
        ctx.surface.draw_line(
            Vector2::new(-extent, offset),
            Vector2::new(extent, offset),
            &straight,
            &style,
        );
    }
    Ok(())
}

fn draw_hud(ctx: &mut DrawContext<'_>) -> Result<(), EaselError> {
    let (width, height) = {
        let size = ctx.surface.options().logical_size();
        (size.x, size.y)
    };
    let hud = DrawStyle::new().overlay();
    ctx.surface.draw_text(
        &format!("{:.0} fps", ctx.frame.fps),
        Vector2::new(4.0, 4.0),
        &hud,
    );
    if ctx.frame.paused {
        ctx.surface.draw_text(
            "paused (P to resume, N to step)",
            Vector2::new(4.0, 14.0),
            &hud.clone().fill(SPARK_COLOR),
        );
    }
    // Frame border, drawn as a closed path in surface space.
    ctx.surface.draw_path(
        &[
            Vector2::new(0.5, 0.5),
            Vector2::new(width - 0.5, 0.5),
            Vector2::new(width - 0.5, height - 0.5),
            Vector2::new(0.5, height - 0.5),
            Vector2::new(0.5, 0.5),
        ],
        &DrawStyle::new().overlay().stroke(GRID_COLOR),
    )
}

/// Fill `scene` with the demo content. Returns the player's id.
pub fn populate(scene: &mut Scene) -> Result<EntityId, EaselError> {
    let player = scene.activate(Entity::new(
        Vector2::ZERO,
        Player {
            sprite: player_sprite()?,
        },
    ));

    for row in -3..=3 {
        for col in -4..=4 {
            if (row + col) % 3 != 0 || (row == 0 && col == 0) {
                continue;
            }
            let jitter = Vector2::new((col * 7 % 5) as f32, (row * 11 % 7) as f32);
            let position = Vector2::new(col as f32, row as f32) * (GRID_STEP * 2.0) + jitter;
            scene.activate(prop(position.snap(1.0)));
        }
    }

    scene.set_before_draw(draw_grid);
    scene.set_after_draw(draw_hud);
    scene.set_camera_target(player)?;
    log::info!("Demo scene: {} entities, following {}", scene.len(), player);
    Ok(player)
}
