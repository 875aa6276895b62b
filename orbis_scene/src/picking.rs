//! Pointer picking: client coordinates to normalized device coordinates, NDC
//! to a world-space ray, and ray tests against the marker batch. Markers are
//! unit quads oriented by their instance transforms, so the intersection runs
//! in marker-local space against the z=0 plane.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Marker quads are unit-sized planes centered on the instance origin.
const MARKER_HALF_EXTENT: f32 = 0.5;

/// Canvas bounding box in client pixels.
#[derive(Debug, Clone, Copy)]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left
            && x <= self.left + self.width
            && y >= self.top
            && y <= self.top + self.height
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PickRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub instance: u32,
    pub distance: f32,
}

/// Rescale client coordinates into [-1, 1] on both axes, y up.
pub fn pointer_ndc(client_x: f32, client_y: f32, rect: ScreenRect) -> Vec2 {
    Vec2::new(
        ((client_x - rect.left) / rect.width) * 2.0 - 1.0,
        -((client_y - rect.top) / rect.height) * 2.0 + 1.0,
    )
}

/// Cast a ray from the camera through an NDC point. Unprojects the point at
/// the near and far planes (depth 0 and 1, wgpu convention) for the
/// direction, with the camera position itself as the origin so hit
/// distances are eye-relative. Returns `None` for degenerate projections.
pub fn unproject_ray(ndc: Vec2, inverse_view_proj: Mat4) -> Option<PickRay> {
    let near = inverse_view_proj * ndc.extend(0.0).extend(1.0);
    let far = inverse_view_proj * ndc.extend(1.0).extend(1.0);
    if near.w.abs() <= f32::EPSILON || far.w.abs() <= f32::EPSILON {
        return None;
    }

    let near_point = near.truncate() / near.w;
    let span = far.truncate() / far.w - near_point;
    if span.length_squared() <= f32::EPSILON {
        return None;
    }

    // Perspective rays converge at the camera position, the one point that
    // projects to clip w = 0. An orthographic projection has no such point
    // and keeps the near-plane origin.
    let center = inverse_view_proj * Vec4::new(0.0, 0.0, 1.0, 0.0);
    let origin = if center.w.abs() > f32::EPSILON {
        center.truncate() / center.w
    } else {
        near_point
    };

    Some(PickRay {
        origin,
        direction: span.normalize(),
    })
}

/// Test the ray against every marker quad and return the nearest hit, if
/// any. A miss is a normal outcome, not an error.
pub fn pick(ndc: Vec2, inverse_view_proj: Mat4, transforms: &[Mat4]) -> Option<PickHit> {
    let ray = unproject_ray(ndc, inverse_view_proj)?;
    let mut nearest: Option<PickHit> = None;

    for (index, transform) in transforms.iter().enumerate() {
        let Some(distance) = intersect_marker_quad(&ray, transform) else {
            continue;
        };
        if nearest.map_or(true, |hit| distance < hit.distance) {
            nearest = Some(PickHit {
                instance: index as u32,
                distance,
            });
        }
    }

    nearest
}

/// Ray vs one marker quad: transform the ray into marker-local space (the
/// instance transforms are rigid, so direction lengths survive), intersect
/// the z=0 plane, and accept hits inside the quad bounds in front of the
/// ray origin.
fn intersect_marker_quad(ray: &PickRay, transform: &Mat4) -> Option<f32> {
    let inverse = transform.inverse();
    let origin = inverse.transform_point3(ray.origin);
    let direction = inverse.transform_vector3(ray.direction);

    if direction.z.abs() <= f32::EPSILON {
        return None;
    }

    let t = -origin.z / direction.z;
    if t <= 0.0 {
        return None;
    }

    let point = origin + direction * t;
    if point.x.abs() <= MARKER_HALF_EXTENT && point.y.abs() <= MARKER_HALF_EXTENT {
        Some(t)
    } else {
        None
    }
}

#[cfg(test)]
mod pointer_ndc_tests {
    use super::*;

    const RECT: ScreenRect = ScreenRect {
        left: 100.0,
        top: 50.0,
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn rect_center_maps_to_origin() {
        let ndc = pointer_ndc(500.0, 350.0, RECT);
        assert!(ndc.abs_diff_eq(Vec2::ZERO, 1e-6));
    }

    #[test]
    fn rect_corners_map_to_unit_extremes() {
        let top_left = pointer_ndc(100.0, 50.0, RECT);
        assert!(top_left.abs_diff_eq(Vec2::new(-1.0, 1.0), 1e-6));

        let bottom_right = pointer_ndc(900.0, 650.0, RECT);
        assert!(bottom_right.abs_diff_eq(Vec2::new(1.0, -1.0), 1e-6));
    }

    #[test]
    fn contains_respects_rect_bounds() {
        assert!(RECT.contains(100.0, 50.0));
        assert!(RECT.contains(900.0, 650.0));
        assert!(!RECT.contains(99.0, 300.0));
        assert!(!RECT.contains(500.0, 651.0));
    }
}

#[cfg(test)]
mod pick_tests {
    use super::*;
    use glam::Quat;

    fn camera_inverse(eye: Vec3) -> Mat4 {
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(50f32.to_radians(), 1.0, 1.0, 2000.0);
        (proj * view).inverse()
    }

    fn marker_transform(position: Vec3) -> Mat4 {
        let rotation = Quat::from_rotation_arc(Vec3::Z, position.normalize());
        Mat4::from_rotation_translation(rotation, position)
    }

    #[test]
    fn ray_through_screen_center_hits_the_facing_marker() {
        let inverse = camera_inverse(Vec3::new(0.0, 0.0, 14.0));
        let transforms = vec![marker_transform(Vec3::new(0.0, 0.0, 5.0))];

        let hit = pick(Vec2::ZERO, inverse, &transforms).expect("expected a hit");
        assert_eq!(hit.instance, 0);
        assert!(
            (hit.distance - 9.0).abs() < 1e-3,
            "hit distance {} should be eye-to-marker distance",
            hit.distance
        );
    }

    #[test]
    fn projected_marker_position_picks_that_marker() {
        let eye = Vec3::new(4.0, 3.0, 12.0);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(50f32.to_radians(), 1.0, 1.0, 2000.0);
        let view_proj = proj * view;

        let positions = [
            Vec3::new(1.7, -0.45, 4.95).normalize() * 5.0,
            Vec3::new(-1.0, 2.8, 4.95).normalize() * 5.0,
        ];
        let transforms: Vec<Mat4> = positions.iter().map(|p| marker_transform(*p)).collect();

        for (index, position) in positions.iter().enumerate() {
            let clip = view_proj * position.extend(1.0);
            let ndc = Vec2::new(clip.x / clip.w, clip.y / clip.w);

            let hit = pick(ndc, view_proj.inverse(), &transforms)
                .unwrap_or_else(|| panic!("marker {index} should be under its projection"));
            assert_eq!(hit.instance, index as u32);
        }
    }

    #[test]
    fn ray_aimed_away_from_all_markers_misses() {
        let inverse = camera_inverse(Vec3::new(0.0, 0.0, 14.0));
        let transforms = vec![marker_transform(Vec3::new(0.0, 0.0, 5.0))];

        assert_eq!(pick(Vec2::new(0.9, 0.9), inverse, &transforms), None);
    }

    #[test]
    fn nearest_of_two_stacked_markers_wins() {
        let inverse = camera_inverse(Vec3::new(0.0, 0.0, 14.0));
        // Both quads sit on the camera axis; the far one faces away but its
        // plane still intersects the ray.
        let transforms = vec![
            marker_transform(Vec3::new(0.0, 0.0, -5.0)),
            marker_transform(Vec3::new(0.0, 0.0, 5.0)),
        ];

        let hit = pick(Vec2::ZERO, inverse, &transforms).expect("expected a hit");
        assert_eq!(hit.instance, 1, "front marker should win the distance sort");
    }

    #[test]
    fn pick_ray_originates_at_the_camera_position() {
        let eye = Vec3::new(4.0, 3.0, 12.0);
        let ray = unproject_ray(Vec2::new(0.3, -0.2), camera_inverse(eye)).expect("ray");
        assert!(
            ray.origin.abs_diff_eq(eye, 1e-2),
            "ray origin {:?} should be the eye {eye:?}, not the near plane",
            ray.origin
        );
    }

    #[test]
    fn degenerate_projection_yields_no_ray() {
        assert!(unproject_ray(Vec2::ZERO, Mat4::ZERO).is_none());
    }
}
