//! Interactive viewer window
//!
//! Hosts a [`ViewerController`] in a winit window: the scene is drawn with
//! the wgpu scene renderer and an egui overlay carries the color picker
//! (free-orbit mode) or the loading indicator and toggle button (pick mode).

use std::sync::Arc;

use instant::Instant;
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

use modelview_core::{Color, Error, Result, Scene};
use modelview_gpu::{Frame, GpuContext, SceneRenderConfig, SceneRenderer};

use crate::camera::Camera;
use crate::config::{InteractionMode, ViewerConfig};
use crate::controller::ViewerController;
use crate::surface::{PickNotifier, RenderSurface};

/// Pointer travel in pixels below which a press and release count as a click
const CLICK_SLOP: f64 = 4.0;

/// Shows a native message box when the pickable node is clicked
pub struct DialogNotifier {
    title: String,
}

impl DialogNotifier {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

impl PickNotifier for DialogNotifier {
    fn acknowledge(&mut self, node_name: &str) {
        let _ = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title(self.title.as_str())
            .set_description(format!("You clicked {}", node_name))
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

struct UiFrame {
    paint_jobs: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    pixels_per_point: f32,
}

/// Input collected from the overlay during one frame
#[derive(Debug, Default)]
struct UiActions {
    color: Option<Color>,
    toggle: bool,
}

struct EguiOverlay {
    context: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    frame: Option<UiFrame>,
}

impl EguiOverlay {
    fn new(window: &Window, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let context = egui::Context::default();
        let state = egui_winit::State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
        );
        let renderer = egui_wgpu::Renderer::new(device, format, None, 1);
        Self {
            context,
            state,
            renderer,
            frame: None,
        }
    }

    /// Returns true if egui wants the event for itself
    fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    fn prepare(&mut self, window: &Window, build: impl FnMut(&egui::Context)) {
        let input = self.state.take_egui_input(window);
        let output = self.context.run(input, build);
        self.state.handle_platform_output(window, output.platform_output);
        let paint_jobs = self.context.tessellate(output.shapes, output.pixels_per_point);
        self.frame = Some(UiFrame {
            paint_jobs,
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        });
    }

    /// Record the prepared UI on top of the frame
    fn paint(&mut self, gpu: &GpuContext, frame: &mut Frame, size: (u32, u32)) {
        let Some(ui) = self.frame.take() else {
            return;
        };
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.0, size.1],
            pixels_per_point: ui.pixels_per_point,
        };

        for (id, delta) in &ui.textures_delta.set {
            self.renderer.update_texture(&gpu.device, &gpu.queue, *id, delta);
        }
        let callback_buffers = self
            .renderer
            .update_buffers(&gpu.device, &gpu.queue, &mut frame.encoder, &ui.paint_jobs, &screen);
        frame.command_buffers.extend(callback_buffers);

        {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.renderer.render(&mut pass, &ui.paint_jobs, &screen);
        }

        for id in &ui.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

/// Window-backed render surface
struct WindowSurface {
    window: Arc<Window>,
    renderer: SceneRenderer,
    overlay: EguiOverlay,
}

impl WindowSurface {
    async fn new(window: Arc<Window>) -> Result<Self> {
        let renderer = SceneRenderer::new(window.clone(), SceneRenderConfig::default()).await?;
        let overlay = EguiOverlay::new(&window, &renderer.gpu_context.device, renderer.surface_format());
        Ok(Self {
            window,
            renderer,
            overlay,
        })
    }

    /// Build this frame's overlay and report what the user did with it
    fn prepare_ui(&mut self, controller: &ViewerController) -> UiActions {
        let mut actions = UiActions::default();
        self.overlay.prepare(&self.window, |ctx| build_ui(ctx, controller, &mut actions));
        actions
    }
}

impl RenderSurface for WindowSurface {
    fn display_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn buffer_size(&self) -> (u32, u32) {
        self.renderer.size()
    }

    fn resize_buffer(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
    }

    fn draw(&mut self, scene: &Scene, camera: &Camera) -> Result<()> {
        let mut frame = self.renderer.begin_frame()?;
        self.renderer
            .draw_scene(&mut frame, scene, camera.view_projection(), camera.position);
        let size = self.renderer.size();
        self.overlay.paint(&self.renderer.gpu_context, &mut frame, size);
        self.renderer.finish_frame(frame);
        Ok(())
    }
}

fn build_ui(ctx: &egui::Context, controller: &ViewerController, actions: &mut UiActions) {
    match controller.mode() {
        InteractionMode::FreeOrbit => {
            egui::Window::new("Model").resizable(false).show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("color");
                    let mut rgb = controller.color().to_rgb8();
                    if ui.color_edit_button_srgb(&mut rgb).changed() {
                        actions.color = Some(Color::from_rgb8(rgb));
                    }
                });
            });
        }
        InteractionMode::PickAndHighlight => {
            egui::Area::new(egui::Id::new("toggle"))
                .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
                .show(ctx, |ui| {
                    if ui.button("Toggle part").clicked() {
                        actions.toggle = true;
                    }
                });
            let status = controller.status();
            if status.visible {
                egui::Area::new(egui::Id::new("loading"))
                    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                    .show(ctx, |ui| {
                        ui.heading(status.text.as_str());
                    });
            }
        }
    }
}

#[derive(Debug, Default)]
struct PointerState {
    position: Option<PhysicalPosition<f64>>,
    pressed_at: Option<PhysicalPosition<f64>>,
    rotating: bool,
    panning: bool,
}

/// Windowed viewer driving a [`ViewerController`]
pub struct InteractiveViewer {
    config: ViewerConfig,
    title: String,
}

impl InteractiveViewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            title: "modelview".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Open the window and run until it is closed
    pub fn run(self) -> Result<()> {
        let event_loop =
            EventLoop::new().map_err(|e| Error::Visualization(format!("Failed to create event loop: {}", e)))?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(self.title.as_str())
                .with_inner_size(LogicalSize::new(1200.0, 800.0))
                .build(&event_loop)
                .map_err(|e| Error::Visualization(format!("Failed to create window: {}", e)))?,
        );

        let mut surface = pollster::block_on(WindowSurface::new(window.clone()))?;
        let Some(mut controller) = ViewerController::initialize(Some(&surface), self.config) else {
            return Ok(());
        };
        let mut notifier = DialogNotifier::new(self.title.as_str());
        let mut pointer = PointerState::default();
        let start = Instant::now();

        event_loop
            .run(move |event, target| {
                target.set_control_flow(ControlFlow::Poll);
                let Event::WindowEvent { event, .. } = event else {
                    return;
                };
                let consumed = surface.overlay.on_window_event(&window, &event);

                match event {
                    WindowEvent::CloseRequested => {
                        controller.stop();
                        target.exit();
                    }
                    WindowEvent::Resized(_) => window.request_redraw(),
                    WindowEvent::MouseInput { state, button, .. } => {
                        let pressed = state == ElementState::Pressed;
                        match button {
                            MouseButton::Left if pressed && !consumed => {
                                pointer.rotating = true;
                                pointer.pressed_at = pointer.position;
                            }
                            MouseButton::Left if !pressed => {
                                pointer.rotating = false;
                                if let (Some(from), Some(to)) = (pointer.pressed_at.take(), pointer.position) {
                                    let travel = ((to.x - from.x).powi(2) + (to.y - from.y).powi(2)).sqrt();
                                    if travel < CLICK_SLOP {
                                        controller.on_click(&surface, to.x, to.y, &mut notifier);
                                    }
                                }
                            }
                            MouseButton::Right => pointer.panning = pressed && !consumed,
                            _ => {}
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        if let Some(last) = pointer.position {
                            let dx = (position.x - last.x) as f32;
                            let dy = (position.y - last.y) as f32;
                            let height = window.inner_size().height as f32;
                            let (controls, camera) = controller.controls_mut();
                            if pointer.rotating {
                                controls.rotate(dx, dy, height);
                            } else if pointer.panning {
                                controls.pan(dx, dy, camera, height);
                            }
                        }
                        pointer.position = Some(position);
                    }
                    WindowEvent::MouseWheel { delta, .. } if !consumed => {
                        let amount = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                        };
                        let (controls, _) = controller.controls_mut();
                        controls.zoom(amount);
                    }
                    WindowEvent::KeyboardInput { event, .. } if !consumed && event.state == ElementState::Pressed => {
                        match &event.logical_key {
                            Key::Character(c) if c.eq_ignore_ascii_case("t") => controller.toggle_visibility(),
                            Key::Named(NamedKey::Escape) => {
                                controller.stop();
                                target.exit();
                            }
                            _ => {}
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let actions = surface.prepare_ui(&controller);
                        if let Some(color) = actions.color {
                            controller.change_color(color);
                        }
                        if actions.toggle {
                            controller.toggle_visibility();
                        }

                        let time_ms = start.elapsed().as_secs_f64() * 1000.0;
                        if controller.tick(&mut surface, time_ms) {
                            window.request_redraw();
                        } else {
                            target.exit();
                        }
                    }
                    _ => {}
                }
            })
            .map_err(|e| Error::Visualization(format!("Event loop error: {}", e)))?;

        Ok(())
    }
}
