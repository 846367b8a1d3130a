
mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{buffer, info};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    match &cli.command {
        Commands::Buffer(args) => buffer::run(&cli, args),
        Commands::Info(args) => info::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
