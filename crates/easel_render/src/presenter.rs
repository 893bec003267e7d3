//! Puts a frame's draw list on screen through egui + egui-wgpu.
//!
//! egui requires a split render because `egui_wgpu::Renderer::render()` needs
//! a `RenderPass<'static>` while `begin_render_pass` borrows the encoder:
//!
//!   1. `prepare()` -- paint the draw list on egui's background layer, run any
//!      extra UI (debug windows), tessellate
//!   2. `upload()`  -- textures and GPU buffers (borrows the encoder mutably)
//!   3. `paint()`   -- render into a pass made with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! `present()` runs 2-4 against a `GpuContext` with the surface background as
//! the clear colour.

use winit::window::Window;

use crate::draw_list::DrawList;
use crate::gpu_context::GpuContext;
use crate::painter::{paint_draw_list, TextureCache};
use crate::style::Color;

pub struct PreparedFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
}

pub struct Presenter {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    textures: TextureCache,
}

impl Presenter {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            textures: TextureCache::new(),
        }
    }

    /// Feed a window event to egui. Returns true if egui consumed it.
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        list: &DrawList,
        render_scale: f32,
        mut ui: impl FnMut(&egui::Context),
    ) -> PreparedFrame {
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let textures = &mut self.textures;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::background());
            paint_draw_list(ctx, &painter, list, render_scale, textures);
            ui(ctx);
        });
        self.textures.end_frame();

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        PreparedFrame {
            primitives,
            textures_delta: full_output.textures_delta,
        }
    }

    /// Upload textures and update buffers. Call before creating the render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        frame: &PreparedFrame,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &frame.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &frame.primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        frame: &PreparedFrame,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, &frame.primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, frame: &PreparedFrame) {
        for id in &frame.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }

    /// Clear to `background`, paint the prepared frame, present.
    pub fn present(
        &mut self,
        gpu: &GpuContext,
        window: &Window,
        frame: PreparedFrame,
        background: Color,
    ) {
        let Some((output, view)) = gpu.begin_frame() else {
            self.cleanup(&frame);
            return;
        };

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.size.0, gpu.size.1],
            pixels_per_point: window.scale_factor() as f32,
        };

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Surface Encoder"),
            });

        self.upload(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &frame,
            &screen_descriptor,
        );

        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Surface Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(background.into()),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.paint(&mut pass, &frame, &screen_descriptor);
        }

        self.cleanup(&frame);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}
