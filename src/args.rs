use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, DEFAULT_SITE_OWNER};

#[derive(Parser, Debug)]
#[command(name = "carousel-agent", about = "Portfolio site and photo carousel agent")]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the portfolio web server
    Serve(ServeArgs),

    /// Generate one carousel and publish it
    Agent {
        /// Run without calling APIs or uploading
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    #[arg(long, env = "TEMPLATES_DIR", default_value = "templates")]
    pub templates: PathBuf,

    #[arg(long, env = "SITE_OWNER", default_value = DEFAULT_SITE_OWNER)]
    pub owner: String,

    /// Answer the demo endpoint with 503 instead of running the agent
    #[arg(long, env = "DEMO_DISABLED")]
    pub demo_disabled: bool,
}
