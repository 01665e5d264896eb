//! Camera, projection and orbit controls.
//!
//! The [`Camera`] looks from `position` at `target`. It is shared by the renderer
//! (view/projection uniform) and the pick resolver (ray generation), and the
//! [`OrbitController`] moves it around the target in response to mouse input.

use std::{
    f32::consts::PI,
    sync::atomic::{AtomicU64, Ordering},
};

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};

use crate::scene::{CameraSettings, OrbitSettings};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the camera from flipping over at the poles.
const POLAR_EPSILON: f32 = 1e-6;

static NEXT_CAMERA_KEY: AtomicU64 = AtomicU64::new(0);

/// Identity of a camera. Clones share a key, a newly constructed camera gets a fresh one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CameraKey(u64);

#[derive(Clone, Debug)]
pub struct Camera {
    key: CameraKey,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, T: Into<Point3<f32>>>(position: P, target: T) -> Self {
        Self {
            key: CameraKey(NEXT_CAMERA_KEY.fetch_add(1, Ordering::Relaxed)),
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn key(&self) -> CameraKey {
        self.key
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

impl From<&CameraSettings> for Camera {
    fn from(settings: &CameraSettings) -> Self {
        Camera::new(settings.position, settings.target)
    }
}

#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn from_settings(width: u32, height: u32, settings: &CameraSettings) -> Self {
        Self::new(width, height, cgmath::Deg(settings.fov), settings.near, settings.far)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn znear(&self) -> f32 {
        self.znear
    }

    pub fn zfar(&self) -> f32 {
        self.zfar
    }

    /// Projection in OpenGL clip space (z in [-1, 1]), as used for unprojection.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    /// Map a point given in normalized device coordinates back into world space.
    /// `z = -1` is the near plane, `z = 1` the far plane.
    pub fn unproject(&self, camera: &Camera, ndc: cgmath::Vector3<f32>) -> Option<Point3<f32>> {
        let inverse = (self.calc_matrix() * camera.calc_matrix()).invert()?;
        let world = inverse * ndc.extend(1.0);
        if world.w.abs() <= f32::EPSILON {
            return None;
        }
        Some(Point3::from_vec(world.truncate() / world.w))
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    position: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            view: Matrix4::identity().into(),
            position: [0.0; 4],
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        let view = camera.calc_matrix();
        self.view_proj = (OPENGL_TO_WGPU_MATRIX * projection.calc_matrix() * view).into();
        self.view = view.into();
        self.position = camera.position.to_homogeneous().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
}

/// Orbit-style camera controls: left drag rotates around the target, right drag
/// pans, the wheel zooms. With damping enabled, motion eases out over several
/// frames.
#[derive(Debug)]
pub struct OrbitController {
    settings: OrbitSettings,
    drag: Option<Drag>,
    last_cursor: Option<(f64, f64)>,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
}

impl OrbitController {
    pub fn new(settings: OrbitSettings) -> Self {
        Self {
            settings,
            drag: None,
            last_cursor: None,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    pub fn settings(&self) -> &OrbitSettings {
        &self.settings
    }

    pub fn start_rotate(&mut self) {
        self.drag = Some(Drag::Rotate);
    }

    pub fn start_pan(&mut self) {
        self.drag = Some(Drag::Pan);
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Feed the cursor position in physical pixels.
    pub fn handle_cursor(&mut self, x: f64, y: f64, camera: &Camera, projection: &Projection, viewport_height: u32) {
        let previous = self.last_cursor.replace((x, y));
        let (Some(drag), Some((last_x, last_y))) = (self.drag, previous) else {
            return;
        };
        let dx = (x - last_x) as f32;
        let dy = (y - last_y) as f32;
        let height = viewport_height.max(1) as f32;
        match drag {
            Drag::Rotate => {
                self.theta_delta -= 2.0 * PI * dx / height * self.settings.rotate_speed;
                self.phi_delta -= 2.0 * PI * dy / height * self.settings.rotate_speed;
            }
            Drag::Pan => self.pan(dx, dy, camera, projection, height),
        }
    }

    fn pan(&mut self, dx: f32, dy: f32, camera: &Camera, projection: &Projection, height: f32) {
        let offset = camera.position - camera.target;
        // the visible half height at the target's distance
        let target_distance = offset.magnitude() * (projection.fovy().0 / 2.0).tan();
        let forward = -offset.normalize();
        let right = forward.cross(camera.up).normalize();
        let up = right.cross(forward);
        let speed = self.settings.pan_speed;
        self.pan_offset -= right * (2.0 * dx * target_distance / height * speed);
        self.pan_offset += up * (2.0 * dy * target_distance / height * speed);
    }

    /// Positive `delta` scrolls towards the user (zoom out), negative zooms in.
    pub fn handle_scroll(&mut self, delta: f32) {
        let zoom_scale = 0.95f32.powf(self.settings.zoom_speed);
        if delta < 0.0 {
            self.scale *= zoom_scale;
        } else if delta > 0.0 {
            self.scale /= zoom_scale;
        }
    }

    /// Apply pending input to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let s = &self.settings;
        let offset = camera.position - camera.target;
        let radius = offset.magnitude();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let factor = if s.enable_damping { s.damping_factor } else { 1.0 };
        theta += self.theta_delta * factor;
        phi += self.phi_delta * factor;
        phi = phi
            .clamp(s.min_polar_angle, s.max_polar_angle)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        let radius = (radius * self.scale).clamp(s.min_distance, s.max_distance);
        let target = camera.target + self.pan_offset * factor;
        let offset = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        let position = target + offset;

        if s.enable_damping {
            self.theta_delta *= 1.0 - s.damping_factor;
            self.phi_delta *= 1.0 - s.damping_factor;
            self.pan_offset *= 1.0 - s.damping_factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vector3::new(0.0, 0.0, 0.0);
        }
        self.scale = 1.0;

        let moved = (position - camera.position).magnitude2() > 1e-12
            || (target - camera.target).magnitude2() > 1e-12;
        camera.position = position;
        camera.target = target;
        moved
    }
}

pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::MetricSpace;

    fn default_camera() -> (Camera, Projection) {
        let settings = CameraSettings::default();
        (Camera::from(&settings), Projection::from_settings(800, 600, &settings))
    }

    #[test]
    fn clones_share_a_key() {
        let (camera, _) = default_camera();
        let other = Camera::new([0.0, 0.0, 5.0], [0.0, 0.0, 0.0]);
        assert_eq!(camera.clone().key(), camera.key());
        assert_ne!(other.key(), camera.key());
    }

    #[test]
    fn unproject_centre_lies_on_view_axis() {
        let (camera, projection) = default_camera();
        let near = projection
            .unproject(&camera, Vector3::new(0.0, 0.0, -1.0))
            .unwrap();
        assert!(near.x.abs() < 1e-4);
        assert!(near.y.abs() < 1e-4);
        assert!((near.z - (5.0 - 0.1)).abs() < 1e-3);
    }

    #[test]
    fn update_without_input_keeps_camera() {
        let (mut camera, _) = default_camera();
        let mut controller = OrbitController::new(OrbitSettings::default());
        let before = camera.position;
        assert!(!controller.update(&mut camera));
        assert!(camera.position.distance(before) < 1e-5);
    }

    #[test]
    fn zooming_in_moves_closer() {
        let (mut camera, _) = default_camera();
        let mut controller = OrbitController::new(OrbitSettings {
            enable_damping: false,
            ..Default::default()
        });
        controller.handle_scroll(-1.0);
        assert!(controller.update(&mut camera));
        let distance = camera.position.distance(camera.target);
        assert!((distance - 5.0 * 0.95).abs() < 1e-4);
    }

    #[test]
    fn rotating_keeps_distance() {
        let (mut camera, projection) = default_camera();
        let mut controller = OrbitController::new(OrbitSettings {
            enable_damping: false,
            ..Default::default()
        });
        controller.start_rotate();
        controller.handle_cursor(400.0, 300.0, &camera, &projection, 600);
        controller.handle_cursor(450.0, 320.0, &camera, &projection, 600);
        controller.update(&mut camera);
        assert!((camera.position.distance(camera.target) - 5.0).abs() < 1e-4);
        assert!(camera.position.x.abs() > 1e-3);
    }

    #[test]
    fn damping_eases_out() {
        let (mut camera, projection) = default_camera();
        let mut controller = OrbitController::new(OrbitSettings::default());
        controller.start_rotate();
        controller.handle_cursor(0.0, 0.0, &camera, &projection, 600);
        controller.handle_cursor(100.0, 0.0, &camera, &projection, 600);
        controller.end_drag();
        let first = camera.position;
        controller.update(&mut camera);
        let step1 = camera.position.distance(first);
        let second = camera.position;
        controller.update(&mut camera);
        let step2 = camera.position.distance(second);
        assert!(step1 > 0.0);
        assert!(step2 < step1);
    }
}
