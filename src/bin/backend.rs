//! Demo backends for trying the load balancer by hand.
//!
//! Each port serves `Hello World from :<port>` on every path and `OK` on
//! `/health`.

use std::net::SocketAddr;

use axum::{routing::get, Router};
use clap::Parser;
use tokio::net::TcpListener;

use loadbalancer::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "backend")]
#[command(about = "Fixed-response HTTP servers used as load balancer targets", long_about = None)]
struct Cli {
    /// Port to serve on; repeat for several servers.
    #[arg(short, long = "port", default_values_t = [8081u16, 8082, 8083])]
    ports: Vec<u16>,

    /// Interface to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

fn app(port: u16) -> Router {
    let greeting = format!("Hello World from :{}\n", port);
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .fallback(move || {
            let greeting = greeting.clone();
            async move { greeting }
        })
}

async fn serve(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Backend listening");
    axum::serve(listener, app(addr.port())).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_filter("backend=info");
    let cli = Cli::parse();

    let mut servers = tokio::task::JoinSet::new();
    for port in cli.ports {
        let addr: SocketAddr = format!("{}:{}", cli.host, port).parse()?;
        servers.spawn(serve(addr));
    }

    // Any server stopping (usually a bind failure) stops the process.
    if let Some(result) = servers.join_next().await {
        result??;
    }
    Ok(())
}
