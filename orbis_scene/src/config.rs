//! Scene presets. The two upstream globe demos differed only in a handful of
//! constants (background color, auto-rotate speed, texture path, whether
//! markers carry a country line, whether clicking a marker flies the camera
//! in). A preset captures exactly that surface so one binary serves both.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScenePreset {
    /// Linear RGB clear color.
    pub background: [f32; 3],
    /// Globe radius in world units; marker seeds are normalized onto it.
    pub globe_radius: f32,
    /// Globe texture on disk. Missing file falls back to the placeholder.
    pub texture: Option<String>,
    /// Auto-rotation rate in radians per second applied to the orbit yaw.
    pub auto_rotate_speed: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    /// Initial eye direction; scaled to `camera_distance` at startup.
    pub eye_direction: [f32; 3],
    pub camera_distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Scroll-wheel zoom. Both upstream variants kept this off.
    pub enable_zoom: bool,
    /// Render the marker's country line in the popup when present.
    pub show_country: bool,
    /// Fly the camera toward a marker when it is picked.
    pub fly_to_enabled: bool,
    pub markers: Vec<MarkerSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkerSeed {
    pub id: String,
    pub magnitude: String,
    #[serde(default)]
    pub country: Option<String>,
    /// Direction from the globe center; any magnitude, normalized on add.
    pub direction: [f32; 3],
}

impl Default for ScenePreset {
    fn default() -> Self {
        Self {
            background: [0.976, 0.976, 0.976],
            globe_radius: 5.0,
            texture: Some(String::from("assets/earth.jpg")),
            auto_rotate_speed: 0.02,
            fov_degrees: 50.0,
            near_clip: 1.0,
            far_clip: 2000.0,
            eye_direction: [0.5, -0.2, 1.0],
            camera_distance: 14.0,
            min_distance: 6.0,
            max_distance: 15.0,
            enable_zoom: false,
            show_country: false,
            fly_to_enabled: true,
            markers: default_markers(),
        }
    }
}

/// The seed roster shipped with the original demo.
fn default_markers() -> Vec<MarkerSeed> {
    let seed = |id: &str, direction: [f32; 3]| MarkerSeed {
        id: id.to_string(),
        magnitude: String::from("+00 123 4567 891"),
        country: None,
        direction,
    };
    vec![
        seed("Venezuela", [1.7, -0.45, 4.95]),
        seed("Estados Unidos", [-1.0, 2.8, 4.95]),
        seed("Mexico", [-1.3, 1.0, 4.95]),
        seed("Espana", [18.5, 11.5, 4.95]),
    ]
}

pub fn load_scene_preset(path: &Path) -> Result<ScenePreset> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading scene preset {}", path.display()))?;
    let preset: ScenePreset = serde_json::from_str(&data)
        .with_context(|| format!("parsing scene preset {}", path.display()))?;
    log::debug!(
        "loaded scene preset {} ({} markers)",
        path.display(),
        preset.markers.len()
    );
    Ok(preset)
}

#[cfg(test)]
mod preset_tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_preset_matches_canonical_variant() {
        let preset = ScenePreset::default();
        assert_eq!(preset.globe_radius, 5.0);
        assert_eq!(preset.camera_distance, 14.0);
        assert!(preset.fly_to_enabled);
        assert!(!preset.show_country);
        assert_eq!(preset.markers.len(), 4);
        assert_eq!(preset.markers[0].id, "Venezuela");
    }

    #[test]
    fn partial_preset_fills_missing_fields_from_defaults() {
        let mut temp = NamedTempFile::new().expect("temp file");
        writeln!(
            temp,
            r#"{{"auto_rotate_speed": 0.05, "show_country": true, "fly_to_enabled": false}}"#
        )
        .expect("write preset");

        let preset = load_scene_preset(temp.path()).expect("load preset");
        assert!((preset.auto_rotate_speed - 0.05).abs() < 1e-6);
        assert!(preset.show_country);
        assert!(!preset.fly_to_enabled);
        assert_eq!(preset.globe_radius, 5.0, "untouched fields keep defaults");
        assert_eq!(preset.markers.len(), 4);
    }

    #[test]
    fn invalid_preset_surfaces_parse_error() {
        let mut temp = NamedTempFile::new().expect("temp file");
        writeln!(temp, "not json at all").expect("write invalid content");

        let error = load_scene_preset(temp.path()).expect_err("expected parse failure");
        assert!(format!("{error}").contains("parsing scene preset"));
    }

    #[test]
    fn marker_seed_country_defaults_to_none() {
        let seed: MarkerSeed = serde_json::from_str(
            r#"{"id": "Chile", "magnitude": "+56 2 1234 5678", "direction": [0.0, -3.0, 4.0]}"#,
        )
        .expect("parse seed");
        assert!(seed.country.is_none());
    }
}
