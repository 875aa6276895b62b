//! Orbit-style camera controls: the eye rides a sphere around a fixed
//! target, driven by pointer drags with velocity damping and an optional
//! constant auto-rotation. Pitch stays clamped away from the poles so the
//! up vector never degenerates.

use glam::{Mat4, Vec3};

/// Radians of yaw/pitch velocity added per pixel of drag.
const DRAG_SENSITIVITY: f32 = 0.005;
/// Exponential decay rate for drag velocity, per second.
const DAMPING_RATE: f32 = 6.0;
/// Keep the pitch off the exact poles.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.05;
/// Ignore velocities below this threshold instead of decaying forever.
const VELOCITY_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    min_distance: f32,
    max_distance: f32,
    auto_rotate_speed: f32,
}

impl OrbitControls {
    pub fn new(
        eye: Vec3,
        target: Vec3,
        min_distance: f32,
        max_distance: f32,
        auto_rotate_speed: f32,
    ) -> Self {
        let mut controls = Self {
            target,
            yaw: 0.0,
            pitch: 0.0,
            distance: min_distance,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            min_distance,
            max_distance,
            auto_rotate_speed,
        };
        controls.sync_to_eye(eye);
        controls
    }

    /// Re-derive the spherical state from a world-space eye position. Used at
    /// startup and when a fly-to animation hands the camera back.
    pub fn sync_to_eye(&mut self, eye: Vec3) {
        let offset = eye - self.target;
        let distance = offset.length().max(1e-4);
        self.distance = distance.clamp(self.min_distance, self.max_distance);
        self.pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        self.yaw = offset.x.atan2(offset.z);
    }

    /// Feed a pointer drag, in pixels. Velocity is consumed by `update`.
    pub fn apply_drag(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw_velocity -= delta_x * DRAG_SENSITIVITY;
        self.pitch_velocity += delta_y * DRAG_SENSITIVITY;
    }

    /// Scale the orbit distance, clamped to the configured bounds.
    pub fn zoom_by(&mut self, factor: f32) {
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Advance damping and auto-rotation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.yaw += (self.yaw_velocity + self.auto_rotate_speed) * dt;
        self.pitch = (self.pitch + self.pitch_velocity * dt).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let decay = (-DAMPING_RATE * dt).exp();
        self.yaw_velocity *= decay;
        self.pitch_velocity *= decay;
        if self.yaw_velocity.abs() < VELOCITY_EPSILON {
            self.yaw_velocity = 0.0;
        }
        if self.pitch_velocity.abs() < VELOCITY_EPSILON {
            self.pitch_velocity = 0.0;
        }
    }

    pub fn eye(&self) -> Vec3 {
        let direction = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + direction * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }
}
