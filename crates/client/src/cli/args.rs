pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "pseudonym")]
#[command(about = "Register pseudonymized personal data and recover it with the right key")]
pub struct Args {
    /// Account API root (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<Url>,

    /// Key directory root (overrides config)
    #[arg(long, global = true)]
    pub directory_url: Option<Url>,

    /// Path to the pseudonym state directory (defaults to ~/.pseudonym)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
