//! Damped orbit controls
//!
//! Rotates the camera around a target on a sphere, zooms by scaling the
//! sphere radius and pans by moving the target in the camera plane. Input
//! accumulates deltas; [`OrbitControls::update`] applies them once per frame.

use std::f32::consts::PI;

use modelview_core::{Point3f, Vector3f};

use crate::camera::Camera;

const EPS: f32 = 1e-6;

/// Orbit camera controller with inertia
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Point3f,
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per update when damping is on
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vector3f,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Point3f::origin(),
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vector3f::zeros(),
        }
    }
}

impl OrbitControls {
    /// Controls orbiting the camera's current target with damping enabled
    pub fn damped(camera: &Camera, damping_factor: f32) -> Self {
        Self {
            target: camera.target,
            enable_damping: true,
            damping_factor,
            ..Self::default()
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Rotate from a pointer drag of `(dx, dy)` pixels on a surface
    /// `viewport_height` pixels tall
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
        self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// Zoom from a wheel delta; positive moves toward the target
    pub fn zoom(&mut self, delta: f32) {
        if delta > 0.0 {
            self.scale *= self.zoom_scale();
        } else if delta < 0.0 {
            self.scale /= self.zoom_scale();
        }
    }

    /// Pan from a pointer drag of `(dx, dy)` pixels
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &Camera, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let distance = (camera.position - self.target).norm() * (camera.fov.to_radians() / 2.0).tan();
        let left = -camera.right() * (2.0 * dx * distance / height * self.pan_speed);
        let up = camera.camera_up() * (2.0 * dy * distance / height * self.pan_speed);
        self.pan_offset += left + up;
    }

    /// Whether any rotation, zoom or pan is still pending
    pub fn is_moving(&self) -> bool {
        self.delta_theta.abs() > EPS
            || self.delta_phi.abs() > EPS
            || (self.scale - 1.0).abs() > EPS
            || self.pan_offset.norm_squared() > EPS
    }

    /// Apply pending motion to the camera. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let previous = camera.position;
        let offset = camera.position - self.target;

        let mut radius = offset.norm();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        if self.enable_damping {
            theta += self.delta_theta * self.damping_factor;
            phi += self.delta_phi * self.damping_factor;
        } else {
            theta += self.delta_theta;
            phi += self.delta_phi;
        }

        phi = phi.clamp(self.min_polar_angle.max(EPS), self.max_polar_angle.min(PI - EPS));
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        if self.enable_damping {
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        let sin_phi = phi.sin();
        let offset = Vector3f::new(radius * sin_phi * theta.sin(), radius * phi.cos(), radius * sin_phi * theta.cos());
        camera.position = self.target + offset;
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vector3f::zeros();
        }
        self.scale = 1.0;

        (camera.position - previous).norm_squared() > EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera::new(
            Point3f::new(10.0, 10.0, 25.0),
            Point3f::origin(),
            Vector3f::y(),
            45.0,
            1.0,
            0.1,
            100.0,
        )
    }

    #[test]
    fn test_update_without_input_keeps_camera() {
        let mut camera = camera();
        let mut controls = OrbitControls::damped(&camera, 0.05);
        assert!(!controls.update(&mut camera));
        assert_relative_eq!(camera.position, Point3f::new(10.0, 10.0, 25.0), epsilon = 1e-4);
    }

    #[test]
    fn test_damped_rotation_decays() {
        let mut camera = camera();
        let mut controls = OrbitControls::damped(&camera, 0.05);
        controls.rotate_left(0.5);

        let start = camera.position;
        assert!(controls.update(&mut camera));
        let first_step = (camera.position - start).norm();

        let mid = camera.position;
        assert!(controls.update(&mut camera));
        let second_step = (camera.position - mid).norm();

        assert!(second_step < first_step);
        assert!(controls.is_moving());

        for _ in 0..2000 {
            controls.update(&mut camera);
        }
        assert!(!controls.is_moving());
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn test_rotation_preserves_distance() {
        let mut camera = camera();
        let distance = camera.position.coords.norm();
        let mut controls = OrbitControls::default();
        controls.rotate_left(1.0);
        controls.rotate_up(0.2);
        controls.update(&mut camera);
        assert_relative_eq!(camera.position.coords.norm(), distance, epsilon = 1e-3);
        assert_relative_eq!(camera.target, Point3f::origin());
    }

    #[test]
    fn test_zoom_in_moves_closer() {
        let mut camera = camera();
        let distance = camera.position.coords.norm();
        let mut controls = OrbitControls::default();
        controls.zoom(1.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.position.coords.norm(), distance * 0.95, epsilon = 1e-3);

        controls.zoom(-1.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.position.coords.norm(), distance, epsilon = 1e-3);
    }

    #[test]
    fn test_pan_moves_target_with_camera() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        let before = camera.position - controls.target;
        controls.pan(50.0, 0.0, &camera, 600.0);
        controls.update(&mut camera);
        assert!(controls.target.coords.norm() > 0.0);
        assert_relative_eq!(camera.position - controls.target, before, epsilon = 1e-3);
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        assert!(camera.position.y > 0.0);
        assert!(camera.position.x.is_finite() && camera.position.z.is_finite());
    }
}
