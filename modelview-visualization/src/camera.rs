//! Perspective camera

use modelview_core::{Point3f, Ray, Vector3f};
use nalgebra::{Matrix4, Perspective3};

/// Maps OpenGL clip depth [-1, 1] to the [0, 1] range wgpu expects
#[rustfmt::skip]
const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// A perspective camera looking at a target point
///
/// The projection matrix is cached; call
/// [`update_projection_matrix`](Self::update_projection_matrix) after
/// changing `fov`, `aspect_ratio`, `near` or `far`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3f,
    pub target: Point3f,
    pub up: Vector3f,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    projection: Matrix4<f32>,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3f,
        target: Point3f,
        up: Vector3f,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let mut camera = Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn look_at(&mut self, target: Point3f) {
        self.target = target;
    }

    pub fn update_projection_matrix(&mut self) {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov.to_radians(), self.near, self.far);
        self.projection = OPENGL_TO_WGPU_MATRIX * perspective.into_inner();
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the cached projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    /// Unit vector from the camera toward its target
    pub fn forward(&self) -> Vector3f {
        (self.target - self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vector3f::z())
    }

    /// Camera-space X axis in world coordinates
    pub fn right(&self) -> Vector3f {
        self.forward()
            .cross(&self.up)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3f::x)
    }

    /// Camera-space Y axis in world coordinates
    pub fn camera_up(&self) -> Vector3f {
        self.right().cross(&self.forward())
    }

    /// Ray from the camera through a point in normalized device coordinates
    /// (`[-1, 1]` on both axes, +Y up)
    pub fn ray_from_ndc(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let through = self
            .view_projection()
            .try_inverse()
            .map(|inv| inv.transform_point(&Point3f::new(ndc_x, ndc_y, 0.5)))
            .unwrap_or(self.target);
        Ray::new(self.position, through - self.position)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3f::new(0.0, 0.0, 5.0),
            Point3f::new(0.0, 0.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
            45.0,
            16.0 / 9.0,
            0.1,
            100.0,
        )
    }
}

/// Convert a pixel position on a `width` x `height` surface to normalized
/// device coordinates, flipping Y
pub fn screen_to_ndc(x: f64, y: f64, width: u32, height: u32) -> (f32, f32) {
    let w = width.max(1) as f64;
    let h = height.max(1) as f64;
    ((x / w * 2.0 - 1.0) as f32, (-(y / h) * 2.0 + 1.0) as f32)
}
