use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use ranko_server::config::RankoConfig;
use ranko_server::server;

#[derive(Parser)]
#[command(name = "ranko-server", about = "ranked anime list service")]
struct Args {
    /// path to TOML configuration file
    #[arg(short = 'c', long, env = "RANKO_CONFIG")]
    config: Option<PathBuf>,

    /// print default configuration as TOML and exit
    #[arg(long)]
    config_template: bool,

    /// address to bind to
    #[arg(long, env = "RANKO_HOST")]
    host: Option<String>,

    /// port to listen on
    #[arg(short, long, env = "RANKO_PORT")]
    port: Option<u16>,

    /// number of shards (worker tasks). defaults to available CPU cores
    #[arg(long, env = "RANKO_SHARDS")]
    shards: Option<usize>,
}

/// Lays CLI overrides on top of a `RankoConfig`. Flags the user never
/// passed stay `None` and leave the file/env values alone, which is
/// what keeps the resolution order intact.
fn apply_args(cfg: &mut RankoConfig, args: &Args) {
    if let Some(ref host) = args.host {
        cfg.bind = host.clone();
    }
    if let Some(port) = args.port {
        cfg.port = port;
    }
    if let Some(n) = args.shards {
        cfg.shards = n;
    }
}

/// Prints the message to stderr and exits nonzero.
fn exit_err(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

/// Builds the listen address from `host` and `port`, exiting on a
/// malformed pair.
fn parse_bind_addr(host: &str, port: u16) -> SocketAddr {
    match format!("{host}:{port}").parse() {
        Ok(a) => a,
        Err(e) => exit_err(format!("invalid bind address '{host}:{port}': {e}")),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ranko_core=info,ranko_server=info".into()),
        )
        .init();

    let args = Args::parse();

    // template mode prints the defaults and never starts the server
    if args.config_template {
        let cfg = RankoConfig::default();
        match cfg.to_toml() {
            Ok(toml) => {
                println!("{toml}");
                std::process::exit(0);
            }
            Err(e) => exit_err(format!("failed to generate config template: {e}")),
        }
    }

    // defaults first, then the file, then flag/env overrides
    let mut cfg = match &args.config {
        Some(path) => RankoConfig::from_file(path).unwrap_or_else(|e| exit_err(e)),
        None => RankoConfig::default(),
    };
    apply_args(&mut cfg, &args);

    let addr = parse_bind_addr(&cfg.bind, cfg.port);
    let shard_count = cfg.resolved_shard_count();

    if let Err(e) = server::run(addr, shard_count).await {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}
