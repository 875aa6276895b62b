//! Label visibility: fade the popup out as its anchor rolls past the globe's
//! horizon. The facing coefficient is the dot product between the camera-space
//! surface normal and the direction back toward the camera, pushed through a
//! smoothstep window so the fade starts before the exact silhouette edge.

use glam::{Mat3, Mat4, Vec3};

/// Facing window: fully hidden at or below the lower edge, fully opaque at or
/// above the upper edge.
const FADE_MIN: f32 = 0.2;
const FADE_MAX: f32 = 0.7;

/// Cubic smoothstep, `x*x*(3 - 2*x)` after clamping the normalized input.
pub fn smoothstep(min: f32, max: f32, value: f32) -> f32 {
    let x = ((value - min) / (max - min)).clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Opacity in [0, 1] for a label anchored at `label_position` on the globe
/// surface (globe-local coordinates). `globe_model` carries the globe's world
/// transform, `view` the camera's world-to-camera transform. Evaluated once
/// per frame, after the 3D pass and before the overlay pass.
pub fn label_opacity(label_position: Vec3, globe_model: Mat4, view: Mat4) -> f32 {
    let model_view = view * globe_model;

    // Surface normal for a sphere centered at the origin is just the
    // normalized position; take it to camera space via the normal matrix.
    let normal_matrix = Mat3::from_mat4(model_view).inverse().transpose();
    let camera_normal = (normal_matrix * label_position.normalize()).normalize();

    let camera_position = model_view.transform_point3(label_position);
    let toward_camera = (-camera_position).normalize();

    smoothstep(FADE_MIN, FADE_MAX, toward_camera.dot(camera_normal))
}

#[cfg(test)]
mod smoothstep_tests {
    use super::*;

    #[test]
    fn clamps_to_exact_bounds() {
        assert_eq!(smoothstep(0.2, 0.7, 0.2), 0.0);
        assert_eq!(smoothstep(0.2, 0.7, 0.0), 0.0);
        assert_eq!(smoothstep(0.2, 0.7, -1.0), 0.0);
        assert_eq!(smoothstep(0.2, 0.7, 0.7), 1.0);
        assert_eq!(smoothstep(0.2, 0.7, 1.0), 1.0);
    }

    #[test]
    fn is_monotonically_non_decreasing() {
        let mut previous = 0.0f32;
        for step in 0..=200 {
            let value = -0.5 + step as f32 * 0.01;
            let current = smoothstep(0.2, 0.7, value);
            assert!(
                current >= previous,
                "smoothstep decreased between {} and {}",
                value - 0.01,
                value
            );
            previous = current;
        }
    }

    #[test]
    fn is_continuous_at_the_window_edges() {
        let eps = 1e-4;
        assert!(smoothstep(0.2, 0.7, 0.2 + eps) < 1e-3);
        assert!(smoothstep(0.2, 0.7, 0.7 - eps) > 1.0 - 1e-3);
    }

    #[test]
    fn midpoint_evaluates_to_half() {
        let mid = smoothstep(0.2, 0.7, 0.45);
        assert!((mid - 0.5).abs() < 1e-6);
    }
}

#[cfg(test)]
mod label_opacity_tests {
    use super::*;

    fn view_from(eye: Vec3) -> Mat4 {
        Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y)
    }

    #[test]
    fn label_facing_the_camera_is_fully_opaque() {
        // Camera straight down +Z, label on the near side of the globe.
        let view = view_from(Vec3::new(0.0, 0.0, 14.0));
        let opacity = label_opacity(Vec3::new(0.0, 0.0, 5.0), Mat4::IDENTITY, view);
        assert_eq!(opacity, 1.0);
    }

    #[test]
    fn label_behind_the_globe_is_fully_hidden() {
        let view = view_from(Vec3::new(0.0, 0.0, 14.0));
        let opacity = label_opacity(Vec3::new(0.0, 0.0, -5.0), Mat4::IDENTITY, view);
        assert_eq!(opacity, 0.0);
    }

    #[test]
    fn label_near_the_silhouette_fades_partially() {
        let view = view_from(Vec3::new(0.0, 0.0, 14.0));
        // A point well toward the limb faces the camera obliquely.
        let limb = Vec3::new(4.0, 0.0, 3.0);
        let opacity = label_opacity(limb, Mat4::IDENTITY, view);
        assert!(
            opacity > 0.0 && opacity < 1.0,
            "limb label should be mid-fade, got {opacity}"
        );
    }

    #[test]
    fn globe_rotation_carries_the_label_through_the_fade() {
        let view = view_from(Vec3::new(0.0, 0.0, 14.0));
        let label = Vec3::new(0.0, 0.0, 5.0);

        let facing = label_opacity(label, Mat4::IDENTITY, view);
        let rotated_away =
            label_opacity(label, Mat4::from_rotation_y(std::f32::consts::PI), view);

        assert_eq!(facing, 1.0);
        assert_eq!(rotated_away, 0.0);
    }
}
