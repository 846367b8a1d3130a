use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// Road buffering CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "lanebuffer", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build road and sidewalk polygon layers from a lane-attributed line layer
    Buffer(BufferArgs),

    /// Print a layer's schema and geometry summary
    Info(InfoArgs),
}

#[derive(Args, Debug)]
pub struct BufferArgs {
    /// Input line layer (.geojson/.json or .shp) with FT_LANES and TF_LANES fields
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output road polygon layer
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub road: PathBuf,

    /// Output sidewalk polygon layer
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub sidewalk: PathBuf,

    /// Distance each lane contributes to its side of the road
    #[arg(long, default_value_t = 2.5)]
    pub lane_weight: f64,

    /// Width of the sidewalk ring around the road
    #[arg(long, default_value_t = 2.5)]
    pub sidewalk_width: f64,

    /// Overwrite output files if they already exist (off by default)
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Layer to describe
    #[arg(value_hint = ValueHint::FilePath)]
    pub layer: PathBuf,
}
