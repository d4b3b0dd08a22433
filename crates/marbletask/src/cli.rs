use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_MARBLE_CONFIG: &str = "demo";
pub const DEFAULT_WEDGE_CONFIG: &str = "wedge_demo";

#[derive(Parser, Debug)]
#[command(
    name = "marbletask",
    author,
    version,
    about = "Marble-in-trough motor-control task",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration profile name, resolved to `<NAME>.toml` in the config search path.
    #[arg(short, long, value_name = "NAME", default_value = DEFAULT_MARBLE_CONFIG)]
    pub config: String,

    /// Fill the whole display instead of a window of the configured size.
    #[arg(short, long)]
    pub fullscreen: bool,

    /// Turn the perspective warp off and draw straight onto the screen.
    #[arg(short, long)]
    pub perspective: bool,

    #[command(flatten)]
    pub pacing: PacingArgs,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PacingArgs {
    /// Target frame rate for the headless frame loop.
    #[arg(long, hide = true, value_name = "HZ", default_value_t = 60.0, value_parser = parse_frame_rate)]
    pub fps: f64,

    /// Stop after this many frames instead of waiting for `q` or end of input.
    #[arg(long, hide = true, value_name = "N")]
    pub frames: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the keyboard-steered wedge task (`a` turns left, `d` turns right).
    Wedge(WedgeArgs),
    /// Build the perspective warp grid and write it as a TSV asset.
    Warp(WarpArgs),
}

#[derive(Args, Debug)]
pub struct WedgeArgs {
    /// Configuration profile name, resolved to `<NAME>.toml` in the config search path.
    #[arg(short, long, value_name = "NAME", default_value = DEFAULT_WEDGE_CONFIG)]
    pub config: String,

    /// Fill the whole display instead of a window of the configured size.
    #[arg(short, long)]
    pub fullscreen: bool,

    #[command(flatten)]
    pub pacing: PacingArgs,
}

#[derive(Args, Debug)]
pub struct WarpArgs {
    /// Perspective profile name; the built-in stable profile is used when omitted.
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Where to write the grid (defaults to `perspective.data` in the config directory).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_frame_rate(value: &str) -> Result<f64, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("frame rate must not be empty".to_string());
    }
    let rate: f64 = trimmed
        .parse()
        .map_err(|_| format!("invalid frame rate '{trimmed}'"))?;
    if !(rate.is_finite() && rate > 0.0) {
        return Err(format!("frame rate must be positive, got {trimmed}"));
    }
    Ok(rate)
}
