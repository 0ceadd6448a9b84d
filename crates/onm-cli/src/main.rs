use clap::Parser;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    commands::init_tracing(cli.verbose);
    commands::run_command(cli)
}
