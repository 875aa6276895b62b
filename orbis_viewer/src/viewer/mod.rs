mod markers;
mod mesh;
mod overlays;
mod shaders;
mod state;

pub use state::ViewerState;
