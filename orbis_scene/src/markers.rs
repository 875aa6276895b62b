//! Marker registry: the owning store for clickable globe locations. The
//! render batch only ever sees the derived per-instance transforms; marker
//! records stay here and are resolved back from instance indices after a
//! pick.

use glam::{Mat4, Quat, Vec3};
use thiserror::Error;

use crate::config::MarkerSeed;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("marker id {0:?} is already registered")]
    DuplicateId(String),
    #[error("no marker registered for instance index {0}")]
    UnknownInstance(u32),
}

#[derive(Debug, Clone)]
pub struct Marker {
    pub id: String,
    pub magnitude: String,
    pub country: Option<String>,
    /// Point on the globe surface; length equals the globe radius.
    pub position: Vec3,
}

/// Append-only store mapping render-batch instance indices to marker
/// records. Fully populated before the frame loop starts; markers are never
/// moved or removed during a session.
#[derive(Debug)]
pub struct MarkerRegistry {
    globe_radius: f32,
    markers: Vec<Marker>,
    transforms: Vec<Mat4>,
}

impl MarkerRegistry {
    pub fn new(globe_radius: f32) -> Self {
        Self {
            globe_radius,
            markers: Vec::new(),
            transforms: Vec::new(),
        }
    }

    /// Build a registry from preset seeds. Seed order fixes the instance
    /// indices for the lifetime of the session.
    pub fn from_seeds(globe_radius: f32, seeds: &[MarkerSeed]) -> Result<Self, RegistryError> {
        let mut registry = Self::new(globe_radius);
        for seed in seeds {
            registry.add_marker(
                Vec3::from_array(seed.direction),
                &seed.id,
                &seed.magnitude,
                seed.country.as_deref(),
            )?;
        }
        Ok(registry)
    }

    /// Project `direction` onto the globe surface, derive the outward-facing
    /// instance transform, and append the record. Returns the instance index
    /// assigned to the new marker.
    pub fn add_marker(
        &mut self,
        direction: Vec3,
        id: &str,
        magnitude: &str,
        country: Option<&str>,
    ) -> Result<u32, RegistryError> {
        if self.find_by_id(id).is_some() {
            return Err(RegistryError::DuplicateId(id.to_string()));
        }

        let position = direction.normalize() * self.globe_radius;
        let index = self.markers.len() as u32;

        self.transforms.push(outward_transform(position));
        self.markers.push(Marker {
            id: id.to_string(),
            magnitude: magnitude.to_string(),
            country: country.map(str::to_string),
            position,
        });

        Ok(index)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.id == id)
    }

    /// Resolve a render-batch instance index back to its marker. An index
    /// the registry never issued is reported as an error rather than assumed
    /// impossible, so picking stays well-defined if removal ever lands.
    pub fn resolve_instance(&self, index: u32) -> Result<&Marker, RegistryError> {
        self.markers
            .get(index as usize)
            .ok_or(RegistryError::UnknownInstance(index))
    }

    pub fn instance_transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn globe_radius(&self) -> f32 {
        self.globe_radius
    }
}

/// Placement transform for a surface point: translate to the point and
/// rotate local +Z onto the outward radius direction, i.e. a look-at toward
/// a point one unit further out along the same radius line.
fn outward_transform(position: Vec3) -> Mat4 {
    let outward = position.normalize();
    let rotation = Quat::from_rotation_arc(Vec3::Z, outward);
    Mat4::from_rotation_translation(rotation, position)
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    const RADIUS: f32 = 5.0;

    fn registry_with(seeds: &[(&str, [f32; 3])]) -> MarkerRegistry {
        let mut registry = MarkerRegistry::new(RADIUS);
        for (id, direction) in seeds {
            registry
                .add_marker(Vec3::from_array(*direction), id, "+00 123 4567 891", None)
                .expect("add marker");
        }
        registry
    }

    #[test]
    fn added_markers_land_exactly_on_the_globe_surface() {
        let registry = registry_with(&[
            ("a", [1.7, -0.45, 4.95]),
            ("b", [-1.0, 2.8, 4.95]),
            ("c", [18.5, 11.5, 4.95]),
        ]);

        for marker in registry.markers() {
            assert!(
                (marker.position.length() - RADIUS).abs() < 1e-5,
                "marker {} sits at distance {} instead of {}",
                marker.id,
                marker.position.length(),
                RADIUS
            );
        }
    }

    #[test]
    fn venezuela_seed_normalizes_direction() {
        let mut registry = MarkerRegistry::new(RADIUS);
        let index = registry
            .add_marker(
                Vec3::new(2.0, -0.6, 4.95),
                "Venezuela",
                "+00 123 4567 891",
                None,
            )
            .expect("add marker");
        assert_eq!(index, 0);

        let marker = registry.find_by_id("Venezuela").expect("marker exists");
        assert!((marker.position.length() - RADIUS).abs() < 1e-5);

        let expected = Vec3::new(2.0, -0.6, 4.95).normalize();
        let actual = marker.position.normalize();
        assert!(
            actual.abs_diff_eq(expected, 1e-6),
            "stored direction {actual:?} diverges from normalized input {expected:?}"
        );
    }

    #[test]
    fn instance_indices_are_sequential_and_resolve_to_distinct_ids() {
        let registry = registry_with(&[
            ("a", [1.0, 0.0, 0.0]),
            ("b", [0.0, 1.0, 0.0]),
            ("c", [0.0, 0.0, 1.0]),
        ]);

        assert_eq!(registry.len(), registry.instance_transforms().len());

        let mut seen = Vec::new();
        for index in 0..registry.len() as u32 {
            let marker = registry.resolve_instance(index).expect("resolve");
            assert!(
                !seen.contains(&marker.id),
                "instance {index} resolved to duplicate id {}",
                marker.id
            );
            seen.push(marker.id.clone());
        }
    }

    #[test]
    fn duplicate_id_is_rejected_without_mutating_the_registry() {
        let mut registry = registry_with(&[("a", [1.0, 0.0, 0.0])]);
        let error = registry
            .add_marker(Vec3::new(0.0, 1.0, 0.0), "a", "other", None)
            .expect_err("duplicate id must fail");

        assert_eq!(error, RegistryError::DuplicateId(String::from("a")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.instance_transforms().len(), 1);
    }

    #[test]
    fn unknown_instance_index_is_a_not_found_error() {
        let registry = registry_with(&[("a", [1.0, 0.0, 0.0])]);
        let error = registry.resolve_instance(7).expect_err("out of range");
        assert_eq!(error, RegistryError::UnknownInstance(7));
    }

    #[test]
    fn instance_transform_points_local_z_outward() {
        let registry = registry_with(&[("a", [3.0, 4.0, 0.0])]);
        let transform = registry.instance_transforms()[0];

        let outward = Vec3::new(3.0, 4.0, 0.0).normalize();
        let local_z = transform.transform_vector3(Vec3::Z);
        assert!(
            local_z.abs_diff_eq(outward, 1e-5),
            "local +Z {local_z:?} should align with outward {outward:?}"
        );

        let origin = transform.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(outward * RADIUS, 1e-5));
    }

    #[test]
    fn from_seeds_preserves_seed_order() {
        let seeds = vec![
            MarkerSeed {
                id: String::from("first"),
                magnitude: String::from("1"),
                country: Some(String::from("X")),
                direction: [1.0, 0.0, 0.0],
            },
            MarkerSeed {
                id: String::from("second"),
                magnitude: String::from("2"),
                country: None,
                direction: [0.0, 1.0, 0.0],
            },
        ];

        let registry = MarkerRegistry::from_seeds(RADIUS, &seeds).expect("seed registry");
        assert_eq!(registry.resolve_instance(0).expect("first").id, "first");
        assert_eq!(registry.resolve_instance(1).expect("second").id, "second");
        assert_eq!(
            registry.resolve_instance(0).expect("first").country.as_deref(),
            Some("X")
        );
    }
}
