use std::net::IpAddr;
use std::path::PathBuf;

/// `hyperdexd`: a single physical daemon hosting zero or more virtual
/// servers (spec §2, §6).
#[derive(clap::Parser)]
#[command(name = "hyperdexd")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand)]
#[clap(subcommand_required = true, arg_required_else_help = true)]
pub enum Command {
    /// Run the daemon: bind the listening port, load the cluster
    /// configuration, and serve chain/transfer/search/client traffic.
    Serve(ServeArgs),
    /// Inspect a shard file on disk without starting the daemon,
    /// printing its header geometry and live record count.
    Shard(ShardArgs),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Directory holding this host's region replicas.
    #[arg(long)]
    pub data: PathBuf,

    /// Address to listen on for chain, transfer, search, and client
    /// traffic.
    #[arg(long, default_value = "0.0.0.0")]
    pub listen: IpAddr,

    /// Port to listen on.
    #[arg(long)]
    pub listen_port: u16,

    /// Path to the coordinator-published configuration this host should
    /// load at startup (spec §6: "`--connect`" names where the current
    /// configuration is obtained; the coordinator's own publish protocol
    /// is out of scope, so this reads the most recently published
    /// configuration text from a file at that path).
    #[arg(long)]
    pub connect: PathBuf,

    /// This host's id within the configuration's `host` records.
    #[arg(long)]
    pub host_id: u32,

    /// Number of worker threads draining inbound messages.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Detach from the controlling terminal after startup.
    #[arg(long, conflicts_with = "foreground")]
    pub daemon: bool,

    /// Stay attached to the controlling terminal (default).
    #[arg(long)]
    pub foreground: bool,
}

#[derive(clap::Args)]
pub struct ShardArgs {
    /// Path to the shard file to inspect.
    pub path: PathBuf,
}
