use std::path::PathBuf;

use async_std::task;
use clap::Parser;

use rustynet::config::ServerConfig;
use rustynet::handler::Router;
use rustynet::logging;
use rustynet::net::server::Server;

#[derive(Debug, Parser)]
#[command(name = "rustynet", version, about = "Minimal HTTP/1.1 server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    logging::init();

    let config = match args.config {
        Some(path) => ServerConfig::from_file(&path),
        None => ServerConfig::default(),
    };
    tracing::info!(
        address = %config.socket_addr(),
        unframed_body = ?config.unframed_body,
        chunked_requests = config.chunked_requests,
        static_files_root = %config.static_files_root.display(),
        "configuration loaded"
    );

    let server = Server::new(config.clone(), Router::new(&config.server_name, &config.static_files_root));
    task::block_on(server.run())
}
