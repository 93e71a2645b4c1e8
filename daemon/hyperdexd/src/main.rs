//! `hyperdexd`: a single physical daemon hosting zero or more virtual
//! servers (spec §2, §6). Parses its CLI, loads the initial
//! coordinator-published configuration, and either serves traffic or
//! inspects a shard file offline.

mod cli;
mod config_source;
mod daemon;
mod dispatch;
mod hashing;
mod search_wire;
mod serve;
mod shard_cmd;

use clap::Parser;
use cli::{Cli, Command, ServeArgs};
use daemon::Daemon;
use hyperdex_config::ConfigVersion;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => run_serve(args),
        Command::Shard(args) => shard_cmd::run(args),
    }
}

fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    std::fs::create_dir_all(&args.data)?;
    let config = config_source::load(&args.connect, ConfigVersion(1), None)?;
    tracing::info!(host_id = args.host_id, version = %config.version, data = %args.data.display(), "starting hyperdexd");

    let daemon = Arc::new(Daemon::new(args.host_id, args.data, config));
    serve::run(daemon, args.listen, args.listen_port, args.workers, args.connect)
}
