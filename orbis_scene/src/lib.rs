//! GPU-free logic for the orbis globe viewer: marker bookkeeping, label
//! visibility math, pointer picking, orbit camera state, the fly-to camera
//! animation, and the popup state machine. Everything here is pure data and
//! math so `orbis_viewer` can stay a thin wgpu/winit shell and the behavior
//! remains testable without a window.

pub mod animation;
pub mod config;
pub mod markers;
pub mod orbit;
pub mod picking;
pub mod popup;
pub mod visibility;

pub use animation::FlyTo;
pub use config::{MarkerSeed, ScenePreset, load_scene_preset};
pub use markers::{Marker, MarkerRegistry, RegistryError};
pub use orbit::OrbitControls;
pub use picking::{PickHit, ScreenRect, pick, pointer_ndc, unproject_ray};
pub use popup::PopupState;
pub use visibility::{label_opacity, smoothstep};
