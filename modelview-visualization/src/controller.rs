//! The viewer controller
//!
//! Owns the scene, camera, orbit controls and the in-flight model load, and
//! advances them one frame at a time from [`ViewerController::tick`]. The
//! host (a winit window, or a fake surface in tests) only forwards input and
//! drives the frame loop.

use std::path::Path;

use modelview_core::{intersect_nodes, Color, Light, Material, NodeId, Point3f, Result, Scene, SceneNode, Vector3f};
use modelview_io::{spawn_load, LoadEvent, LoadHandle};

use crate::camera::{screen_to_ndc, Camera};
use crate::config::{InteractionMode, ViewerConfig};
use crate::controls::OrbitControls;
use crate::surface::{PickNotifier, RenderSurface};

pub const CAMERA_FOV: f32 = 45.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;
pub const CAMERA_POSITION: [f32; 3] = [10.0, 10.0, 25.0];
pub const DAMPING_FACTOR: f32 = 0.05;

/// `#eeeeee`
pub const BACKGROUND: Color = Color::new(0.933_333, 0.933_333, 0.933_333);
/// `#aaaaaa`
pub const AMBIENT: Color = Color::new(0.666_667, 0.666_667, 0.666_667);

pub const LOADING_TEXT: &str = "Loading...";
pub const LOAD_FAILED_TEXT: &str = "Failed to load model";

/// Text for a load progress report
pub fn progress_text(loaded: u64, total: u64) -> String {
    if total == 0 {
        return LOADING_TEXT.to_string();
    }
    let percent = loaded as f64 / total as f64 * 100.0;
    format!("{:.0}% loaded", percent)
}

/// State of the loading indicator shown in pick mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingStatus {
    pub text: String,
    pub visible: bool,
}

/// Scale `root` uniformly and move it so its bounding box is centered on
/// the origin in X and Z and rests on Y = 0
pub fn place_model(root: &mut SceneNode, scale: f32) {
    root.transform.set_uniform_scale(scale);
    let bounds = root.world_bounding_box();
    if bounds.is_empty() {
        return;
    }
    let center = bounds.center();
    root.transform.translation.x -= center.x;
    root.transform.translation.z -= center.z;
    root.transform.translation.y -= bounds.min.y;
}

pub struct ViewerController {
    config: ViewerConfig,
    scene: Scene,
    camera: Camera,
    controls: OrbitControls,
    model: Option<NodeId>,
    loader: Option<LoadHandle>,
    color: Color,
    status: LoadingStatus,
    elapsed: f32,
    running: bool,
}

impl ViewerController {
    /// Set up the scene for `surface`. Returns `None` when there is no
    /// surface to draw on.
    pub fn initialize<S: RenderSurface>(surface: Option<&S>, config: ViewerConfig) -> Option<Self> {
        let Some(surface) = surface else {
            tracing::debug!("No render surface, viewer not started");
            return None;
        };

        let (width, height) = surface.display_size();
        let aspect = if height > 0 { width as f32 / height as f32 } else { 1.0 };
        let camera = Camera::new(
            Point3f::from(CAMERA_POSITION),
            Point3f::origin(),
            Vector3f::y(),
            CAMERA_FOV,
            aspect,
            CAMERA_NEAR,
            CAMERA_FAR,
        );
        let controls = OrbitControls::damped(&camera, DAMPING_FACTOR);

        let mut scene = Scene::new(BACKGROUND);
        scene.add_light(Light::Ambient {
            color: AMBIENT,
            intensity: 1.0,
        });
        scene.add_light(Light::Directional {
            color: Color::WHITE,
            intensity: 1.0,
            position: Point3f::new(5.0, 10.0, 7.5),
            cast_shadow: true,
        });
        scene.add_light(Light::Directional {
            color: Color::WHITE,
            intensity: 1.0,
            position: Point3f::new(-5.0, 10.0, -7.5),
            cast_shadow: false,
        });

        let status = LoadingStatus {
            text: LOADING_TEXT.to_string(),
            visible: config.mode == InteractionMode::PickAndHighlight,
        };

        let mut controller = Self {
            color: config.color,
            config,
            scene,
            camera,
            controls,
            model: None,
            loader: None,
            status,
            elapsed: 0.0,
            running: true,
        };

        if let Some(path) = controller.config.model_path.clone() {
            controller.load_model(path);
        }
        tracing::info!("Viewer initialized in {} mode ({}x{})", controller.config.mode, width, height);
        Some(controller)
    }

    /// Start loading a model in the background. Events are picked up by the
    /// next [`tick`](Self::tick).
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) {
        tracing::info!("Loading model from {}", path.as_ref().display());
        self.loader = Some(spawn_load(path));
    }

    /// Whether a load has been started and has not finished
    pub fn is_loading(&self) -> bool {
        self.loader.as_ref().is_some_and(|l| !l.is_finished())
    }

    /// Drain ready loader events
    pub fn poll_loader(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        let events = loader.poll();
        if loader.is_finished() {
            self.loader = None;
        }
        for event in events {
            self.handle_load_event(event);
        }
    }

    pub fn handle_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Progress { loaded, total } => {
                let text = progress_text(loaded, total);
                tracing::debug!("{}", text);
                self.status.text = text;
            }
            LoadEvent::Loaded(root) => self.attach_model(root),
            LoadEvent::Failed(e) => match self.config.mode {
                InteractionMode::FreeOrbit => {
                    tracing::error!("An error occurred while loading the model: {}", e);
                }
                InteractionMode::PickAndHighlight => {
                    tracing::debug!("Model load failed: {}", e);
                    self.status.text = LOAD_FAILED_TEXT.to_string();
                }
            },
        }
    }

    /// Place a loaded model in the scene, replacing any previous one
    pub fn attach_model(&mut self, mut root: SceneNode) {
        if let Some(previous) = self.model.take() {
            self.scene.remove(previous);
        }

        place_model(&mut root, self.config.scale);
        self.apply_materials(&mut root);
        tracing::info!("Model '{}' loaded with {} meshes", root.name, root.mesh_count());

        self.model = Some(self.scene.add(root));
        self.controls.update(&mut self.camera);
        if self.config.mode == InteractionMode::PickAndHighlight {
            self.status.visible = false;
        }
    }

    fn apply_materials(&self, root: &mut SceneNode) {
        match self.config.mode {
            InteractionMode::FreeOrbit => {
                let color = self.color;
                root.for_each_mesh_mut(&mut |_, mesh| mesh.material.set_color(color));
            }
            InteractionMode::PickAndHighlight => {
                let style = &self.config.highlight;
                let roles = &self.config.roles;
                let highlight = Material::standard(style.highlight_color, style.roughness).with_name("highlight");
                let accent = Material::standard(style.accent_color, style.roughness).with_name("accent");
                root.for_each_mesh_mut(&mut |name, mesh| {
                    if roles.highlight.iter().any(|h| h == name) {
                        mesh.material = highlight.clone();
                    }
                });
                root.for_each_mesh_mut(&mut |name, mesh| {
                    if name == roles.accent {
                        mesh.material = accent.clone();
                    }
                });
            }
        }
    }

    /// Set the model color. Only acts in free-orbit mode; the stored color
    /// is used by later loads even when no model is present yet.
    pub fn change_color(&mut self, color: Color) {
        if self.config.mode != InteractionMode::FreeOrbit {
            return;
        }
        self.color = color;
        let Some(root) = self.model.and_then(|id| self.scene.node_mut(id)) else {
            tracing::debug!("No model loaded, color stored for the next load");
            return;
        };
        root.for_each_mesh_mut(&mut |_, mesh| mesh.material.set_color(color));
    }

    /// [`change_color`](Self::change_color) from a `#rrggbb` string
    pub fn change_color_hex(&mut self, hex: &str) -> Result<()> {
        let color = Color::from_hex(hex)?;
        self.change_color(color);
        Ok(())
    }

    /// Flip visibility of the toggle node. Only acts in pick mode.
    pub fn toggle_visibility(&mut self) {
        if self.config.mode != InteractionMode::PickAndHighlight {
            return;
        }
        let name = &self.config.roles.toggle;
        let Some(node) = self
            .model
            .and_then(|id| self.scene.node_mut(id))
            .and_then(|root| root.find_mut(name))
        else {
            tracing::debug!("Nothing to toggle: '{}' not loaded", name);
            return;
        };
        node.visible = !node.visible;
        tracing::debug!("'{}' visible: {}", name, node.visible);
    }

    /// Handle a click at pixel `(x, y)` on `surface`. Returns true if the
    /// pickable node was hit and `notifier` was called.
    pub fn on_click<S: RenderSurface, N: PickNotifier>(&self, surface: &S, x: f64, y: f64, notifier: &mut N) -> bool {
        if self.config.mode != InteractionMode::PickAndHighlight {
            return false;
        }
        let (width, height) = surface.display_size();
        let (ndc_x, ndc_y) = screen_to_ndc(x, y, width, height);
        let ray = self.camera.ray_from_ndc(ndc_x, ndc_y);
        let hits = intersect_nodes(&ray, self.scene.nodes());

        match hits.first() {
            Some(hit) if hit.node_name == self.config.roles.pickable => {
                tracing::info!("Picked '{}' at distance {:.3}", hit.node_name, hit.distance);
                notifier.acknowledge(&hit.node_name);
                true
            }
            _ => false,
        }
    }

    /// Advance one frame: drain the loader, track time, follow surface
    /// resizes, update the controls and draw. Returns false once stopped.
    pub fn tick<S: RenderSurface>(&mut self, surface: &mut S, time_ms: f64) -> bool {
        if !self.running {
            return false;
        }

        self.poll_loader();
        self.elapsed = (time_ms * 0.001) as f32;

        let display_size = surface.display_size();
        if display_size != surface.buffer_size() && display_size.0 > 0 && display_size.1 > 0 {
            tracing::info!("Resizing drawing buffer to {}x{}", display_size.0, display_size.1);
            surface.resize_buffer(display_size.0, display_size.1);
            self.camera.aspect_ratio = display_size.0 as f32 / display_size.1 as f32;
            self.camera.update_projection_matrix();
        }

        self.controls.update(&mut self.camera);

        if let Err(e) = surface.draw(&self.scene, &self.camera) {
            tracing::warn!("Render error: {}", e);
        }
        true
    }

    /// Stop the frame loop for good
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InteractionMode {
        self.config.mode
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    /// Controls and camera together, for input handlers that need both
    pub fn controls_mut(&mut self) -> (&mut OrbitControls, &Camera) {
        (&mut self.controls, &self.camera)
    }

    /// Root of the loaded model
    pub fn model(&self) -> Option<&SceneNode> {
        self.model.and_then(|id| self.scene.node(id))
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn status(&self) -> &LoadingStatus {
        &self.status
    }

    /// Seconds since the frame loop started, as of the last tick
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
