use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "onmd", about = "Host in-memory onm data stores over HTTP", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP host
    Serve(ServeArgs),
    /// List the models found in a directory
    Models(ModelsArgs),
    /// Compile one model file and summarize its address space
    Check(CheckArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on, overriding the config file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Directory of model declarations, overriding the config file
    #[arg(long)]
    pub models: Option<PathBuf>,
    /// Path prefix for every route, overriding the config file
    #[arg(long)]
    pub prefix: Option<String>,
    /// Route DELETE /remove/stores
    #[arg(long)]
    pub enable_bulk_delete: bool,
}

#[derive(Args)]
pub struct ModelsArgs {
    #[arg(long, default_value = "models")]
    pub models: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {
    pub file: PathBuf,
}
