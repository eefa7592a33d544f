use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    match cli.command {
        Command::Spin(args) => args.run(),
        Command::Simulate(args) => args.run(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Parser)]
#[command(name = "reel", about = "Drive a casino-style spinning reel from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Spin the reel in real time and report where it lands.
    Spin(cli::spin::SpinArgs),
    /// Run a spin on a virtual clock and print its sampled trajectory.
    Simulate(cli::simulate::SimulateArgs),
}
