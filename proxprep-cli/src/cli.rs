use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "proxprep", about = "Proximity analysis data preparation", version)]
pub struct Cli {
    /// Load a full configuration from a JSON file; flags below override
    /// its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Workspace directory holding the community and building layers
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Scratch directory for intermediates and the final output
    #[arg(long)]
    pub scratch: Option<PathBuf>,

    /// Primary site-definition polygon layer (GeoJSON file)
    #[arg(long)]
    pub site_a: Option<PathBuf>,

    /// Advisory site-definition polygon layer (GeoJSON file)
    #[arg(long)]
    pub adv_pd: Option<PathBuf>,

    /// Canonical site registry point layer (GeoJSON file)
    #[arg(long)]
    pub site_p: Option<PathBuf>,

    /// Community polygon layer name inside the workspace
    #[arg(long)]
    pub community_layer: Option<String>,

    /// Building point layer name inside the workspace
    #[arg(long)]
    pub building_layer: Option<String>,

    /// Name of the output layer written to the scratch directory
    #[arg(long)]
    pub out_name: Option<String>,

    /// Expected well-known spatial reference id of the input layers
    #[arg(long)]
    pub wkid: Option<i32>,

    /// Keep scratch intermediates after the run instead of deleting them
    #[arg(long)]
    pub keep_artifacts: bool,

    /// Directory for the dated run log file
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long)]
    pub no_color: bool,
}
