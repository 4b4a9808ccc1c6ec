/// Orbit camera controls.
///
/// The camera circles its target on a sphere. Input accumulates deltas
/// (azimuth, polar angle, distance scale, pan offset); [`OrbitControls::update`]
/// applies them once per frame, clamping distance and polar angle. With
/// damping enabled only a fraction of each delta is applied per frame and the
/// rest decays, which gives the camera its glide.

use nalgebra::{Point3, Vector3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::projection::Camera;

/// Keeps the polar angle off the poles where the view would flip
const POLE_EPSILON: f32 = 1e-6;
const MOVE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSettings {
    pub enable_damping: bool,
    pub damping_factor: f32,
    /// Pan in the screen plane instead of the ground plane
    pub screen_space_panning: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            screen_space_panning: false,
            min_distance: 8.0,
            max_distance: 50.0,
            min_polar_angle: 0.0,
            max_polar_angle: FRAC_PI_2,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

/// Radius, polar angle from +Y, azimuth around +Y measured from +Z
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: &Vector3<f32>) -> Self {
        let radius = offset.norm();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let ring = self.phi.sin() * self.radius;
        Vector3::new(
            ring * self.theta.sin(),
            self.phi.cos() * self.radius,
            ring * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub settings: OrbitSettings,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
}

impl OrbitControls {
    pub fn new(settings: OrbitSettings) -> Self {
        Self {
            settings,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vector3::zeros(),
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Move closer by `factor` (< 1 zooms in further)
    pub fn dolly_in(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale *= factor;
        }
    }

    pub fn dolly_out(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale /= factor;
        }
    }

    fn zoom_factor(&self) -> f32 {
        0.95f32.powf(self.settings.zoom_speed)
    }

    /// Drag by `(dx, dy)` pixels in a viewport `viewport_height` tall
    pub fn pointer_rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let speed = self.settings.rotate_speed;
        self.rotate_left(TAU * dx / viewport_height * speed);
        self.rotate_up(TAU * dy / viewport_height * speed);
    }

    /// Scroll wheel; negative `delta_y` zooms in
    pub fn wheel(&mut self, delta_y: f32) {
        let factor = self.zoom_factor();
        if delta_y < 0.0 {
            self.dolly_in(factor);
        } else if delta_y > 0.0 {
            self.dolly_out(factor);
        }
    }

    /// Drag-pan by `(dx, dy)` pixels; the scene follows the pointer.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, camera: &Camera) {
        if viewport_height <= 0.0 {
            return;
        }
        let speed = self.settings.pan_speed;
        // world units visible across half the viewport at the target's depth
        let target_distance = camera.distance() * (camera.fov / 2.0).tan();
        let left = 2.0 * dx * speed * target_distance / viewport_height;
        let up = 2.0 * dy * speed * target_distance / viewport_height;

        let right = camera.right();
        self.pan_offset -= right * left;

        let upward = if self.settings.screen_space_panning {
            right.cross(&camera.forward())
        } else {
            camera.up.cross(&right)
        };
        self.pan_offset += upward * up;
    }

    /// Apply pending input to `camera`; returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let settings = self.settings;
        let before = (camera.position, camera.target);
        let step = if settings.enable_damping {
            settings.damping_factor
        } else {
            1.0
        };

        let mut spherical = Spherical::from_offset(&(camera.position - camera.target));
        spherical.theta += self.delta_theta * step;
        spherical.phi += self.delta_phi * step;
        // limits may cross when set directly
        spherical.phi = spherical
            .phi
            .max(settings.min_polar_angle)
            .min(settings.max_polar_angle)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);
        spherical.radius = (spherical.radius * self.scale)
            .max(settings.min_distance)
            .min(settings.max_distance);

        camera.target += self.pan_offset * step;
        camera.position = camera.target + spherical.to_offset();

        if settings.enable_damping {
            let decay = 1.0 - settings.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
            self.scale = 1.0;
        } else {
            self.stop();
        }

        moved(&before.0, &camera.position) || moved(&before.1, &camera.target)
    }

    /// Drop all pending motion
    pub fn stop(&mut self) {
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vector3::zeros();
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(OrbitSettings::default())
    }
}

fn moved(a: &Point3<f32>, b: &Point3<f32>) -> bool {
    (a - b).norm_squared() > MOVE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spherical_round_trip() {
        let offset = Vector3::new(3.0, 8.0, -4.0);
        let back = Spherical::from_offset(&offset).to_offset();
        assert_relative_eq!(back, offset, epsilon = 1e-5);
    }

    #[test]
    fn test_idle_update_keeps_camera() {
        let mut camera = Camera::new(800, 600);
        let mut controls = OrbitControls::default();
        assert!(!controls.update(&mut camera));
        assert_relative_eq!(camera.position, Point3::new(0.0, 8.0, 15.0), epsilon = 1e-4);
    }

    #[test]
    fn test_distance_is_clamped() {
        let mut camera = Camera::new(800, 600);
        let mut controls = OrbitControls::default();
        controls.dolly_in(0.01);
        controls.update(&mut camera);
        assert_relative_eq!(camera.distance(), 8.0, epsilon = 1e-4);

        controls.dolly_out(0.01);
        controls.update(&mut camera);
        assert_relative_eq!(camera.distance(), 50.0, epsilon = 1e-3);
    }

    #[test]
    fn test_cannot_orbit_below_ground() {
        let mut camera = Camera::new(800, 600);
        let mut controls = OrbitControls::new(OrbitSettings {
            enable_damping: false,
            ..OrbitSettings::default()
        });
        // dragging up tilts the camera down towards the horizon and past it
        controls.rotate_up(-3.0);
        controls.update(&mut camera);
        assert!(camera.position.y >= -1e-4);
        assert_relative_eq!(camera.position.y, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_damping_glides() {
        let mut camera = Camera::new(800, 600);
        let mut controls = OrbitControls::default();
        controls.rotate_left(1.0);
        assert!(controls.update(&mut camera));
        let first = camera.position;
        // residual motion keeps the camera going without new input
        assert!(controls.update(&mut camera));
        assert!((camera.position - first).norm() > 0.0);
    }

    #[test]
    fn test_ground_pan_keeps_height() {
        let mut camera = Camera::new(800, 600);
        let mut controls = OrbitControls::new(OrbitSettings {
            enable_damping: false,
            ..OrbitSettings::default()
        });
        controls.pan(0.0, 100.0, 600.0, &camera.clone());
        controls.update(&mut camera);
        assert_relative_eq!(camera.target.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.target.x, 0.0, epsilon = 1e-5);
        // dragging down pushes the target away from the viewer
        assert!(camera.target.z < 0.0);
    }

    #[test]
    fn test_pointer_rotate() {
        let mut camera = Camera::new(800, 600);
        let mut controls = OrbitControls::new(OrbitSettings {
            enable_damping: false,
            ..OrbitSettings::default()
        });
        // a zero-height viewport is ignored
        controls.pointer_rotate(50.0, 0.0, 0.0);
        assert!(!controls.update(&mut camera));

        // dragging right swings the camera to the left of the target
        controls.pointer_rotate(50.0, 0.0, 600.0);
        assert!(controls.update(&mut camera));
        assert!(camera.position.x < 0.0);
        assert_relative_eq!(camera.distance(), 17.0, epsilon = 1e-3);
    }

    #[test]
    fn test_wheel_zooms_both_ways() {
        let mut camera = Camera::new(800, 600);
        let mut controls = OrbitControls::new(OrbitSettings {
            enable_damping: false,
            ..OrbitSettings::default()
        });
        controls.wheel(-100.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.distance(), 17.0 * 0.95, epsilon = 1e-3);

        controls.wheel(100.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.distance(), 17.0, epsilon = 1e-3);

        controls.wheel(0.0);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn test_screen_space_pan_moves_up() {
        let mut camera = Camera::new(800, 600);
        let mut controls = OrbitControls::new(OrbitSettings {
            enable_damping: false,
            screen_space_panning: true,
            ..OrbitSettings::default()
        });
        controls.pan(0.0, 100.0, 600.0, &camera.clone());
        controls.update(&mut camera);
        // dragging down lifts the target along the view's up direction
        assert!(camera.target.y > 0.0);
        assert!(camera.target.z < 0.0);
        assert_relative_eq!(camera.target.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_crossed_limits_do_not_panic() {
        let mut camera = Camera::new(800, 600);
        let mut controls = OrbitControls::new(OrbitSettings {
            min_distance: 60.0,
            max_distance: 50.0,
            min_polar_angle: 1.0,
            max_polar_angle: 0.5,
            ..OrbitSettings::default()
        });
        controls.update(&mut camera);
        assert!(camera.position.coords.iter().all(|c| c.is_finite()));
        assert_relative_eq!(camera.distance(), 50.0, epsilon = 1e-3);
    }
}
