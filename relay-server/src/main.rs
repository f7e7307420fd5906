use std::io::{self, IsTerminal};

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Local relay: replays `{url, method, headers, body}` envelopes on behalf of
/// callers that cannot reach the target themselves.
#[derive(Parser, Debug)]
#[command(name = "relay-server", version)]
struct Args {
    /// Address to bind.
    #[arg(long, env = "RELAY_BIND", default_value = "127.0.0.1")]
    bind: String,
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = relay_server::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let args = Args::parse();
    init_tracing();

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "relay listening");
    relay_server::run(listener).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}
