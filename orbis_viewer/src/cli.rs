use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Interactive 3D globe viewer with clickable markers", version)]
pub struct Args {
    /// Scene preset JSON; omitted fields fall back to the built-in defaults
    #[arg(long)]
    pub preset: Option<PathBuf>,

    /// Globe texture override, replacing the preset's texture path
    #[arg(long)]
    pub texture: Option<PathBuf>,

    /// Print the marker roster and preset summary without opening a window
    #[arg(long)]
    pub headless: bool,
}
