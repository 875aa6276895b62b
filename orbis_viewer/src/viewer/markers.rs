//! GPU-side marker batch data. Instances carry the registry's placement
//! matrices plus a per-instance phase that de-synchronises the ripple
//! animation across markers.

use bytemuck::{Pod, Zeroable};
use orbis_scene::MarkerRegistry;

use super::mesh::matrix_columns;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MarkerQuadVertex {
    pub position: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MarkerInstance {
    pub model: [[f32; 4]; 4],
    pub phase: f32,
    pub _padding: [f32; 3],
}

/// Unit quad, two triangles, matching the original plane geometry the picker
/// tests against.
pub const MARKER_QUAD_VERTICES: [MarkerQuadVertex; 6] = [
    MarkerQuadVertex {
        position: [-0.5, -0.5],
    },
    MarkerQuadVertex {
        position: [0.5, -0.5],
    },
    MarkerQuadVertex {
        position: [-0.5, 0.5],
    },
    MarkerQuadVertex {
        position: [-0.5, 0.5],
    },
    MarkerQuadVertex {
        position: [0.5, -0.5],
    },
    MarkerQuadVertex {
        position: [0.5, 0.5],
    },
];

/// Decorrelated but deterministic ripple phase for an instance slot.
pub fn ripple_phase(index: u32) -> f32 {
    let hashed = index
        .wrapping_mul(0x9E37_79B9)
        .rotate_left(13)
        .wrapping_mul(0x85EB_CA6B);
    (hashed >> 8) as f32 / (1u32 << 24) as f32
}

pub fn build_marker_instances(registry: &MarkerRegistry) -> Vec<MarkerInstance> {
    registry
        .instance_transforms()
        .iter()
        .enumerate()
        .map(|(index, transform)| MarkerInstance {
            model: matrix_columns(*transform),
            phase: ripple_phase(index as u32),
            _padding: [0.0; 3],
        })
        .collect()
}

#[cfg(test)]
mod marker_batch_tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn phases_stay_in_unit_range_and_differ_between_slots() {
        let phases: Vec<f32> = (0..16).map(ripple_phase).collect();
        assert!(phases.iter().all(|&p| (0.0..1.0).contains(&p)));

        let mut distinct = phases.clone();
        distinct.sort_by(f32::total_cmp);
        distinct.dedup();
        assert!(
            distinct.len() > 12,
            "phases should be decorrelated, got {phases:?}"
        );
    }

    #[test]
    fn instances_mirror_the_registry_order() {
        let mut registry = MarkerRegistry::new(5.0);
        registry
            .add_marker(Vec3::new(1.0, 0.0, 0.0), "a", "1", None)
            .expect("add");
        registry
            .add_marker(Vec3::new(0.0, 1.0, 0.0), "b", "2", None)
            .expect("add");

        let instances = build_marker_instances(&registry);
        assert_eq!(instances.len(), registry.len());

        // Translation column of each instance matches the marker position.
        for (instance, marker) in instances.iter().zip(registry.markers()) {
            let translation = instance.model[3];
            assert!((translation[0] - marker.position.x).abs() < 1e-5);
            assert!((translation[1] - marker.position.y).abs() < 1e-5);
            assert!((translation[2] - marker.position.z).abs() < 1e-5);
        }
    }
}
