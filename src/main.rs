use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use foodwebs::manager::Manager;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Generate,

    Render {
        #[arg(long)]
        net_idx: usize,

        #[arg(long)]
        levels: PathBuf,
    },

    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(&args.out_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Generate => mgr.generate_networks()?,
        Command::Render { net_idx, levels } => mgr.render_network(net_idx, &levels)?,
        Command::Clean => mgr.clean()?,
    }

    Ok(())
}
