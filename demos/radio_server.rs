//! Minimal internet radio built on the broadcast engine
//!
//! Run with: cargo run --example radio_server [SOURCE] [FX_DIR] [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example radio_server
//!   cargo run --example radio_server audio/songs/talk.mp3 audio/fx 0.0.0.0:3000
//!
//! ## Listening
//!
//!   ffplay http://localhost:3000/stream
//!   curl -s http://localhost:3000/stream | mpv -
//!
//! ## Operating
//!
//! Type commands on stdin: `start`, `stop`, or an effect name such as
//! `applause`. Requires `sox` with mp3 support on the PATH.

use std::net::SocketAddr;
use std::sync::Arc;

use airwave::{BroadcastEngine, EngineConfig};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

const RESPONSE_HEADER: &[u8] =
    b"HTTP/1.0 200 OK\r\nContent-Type: audio/mpeg\r\nCache-Control: no-cache\r\n\r\n";

async fn serve_listener(engine: Arc<BroadcastEngine>, mut socket: TcpStream, peer: SocketAddr) {
    // The request itself is irrelevant: every path gets the live stream
    let mut request = [0u8; 1024];
    if socket.read(&mut request).await.is_err() {
        return;
    }

    let (id, mut stream) = engine.register().await;
    tracing::info!(client = %id, peer = %peer, "Listener connected");

    if socket.write_all(RESPONSE_HEADER).await.is_ok() {
        while let Some(chunk) = stream.recv().await {
            if socket.write_all(&chunk).await.is_err() {
                break;
            }
        }
    }

    engine.unregister(id).await;
    tracing::info!(client = %id, peer = %peer, "Listener disconnected");
}

async fn operator_console(engine: Arc<BroadcastEngine>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        match engine.handle_command(&line).await {
            Ok(outcome) => println!("{}", outcome),
            Err(e) => println!("error: {}", e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("airwave=debug".parse()?)
                .add_directive("radio_server=debug".parse()?),
        )
        .init();

    let mut config = EngineConfig::default();
    if let Some(source) = args.get(1) {
        config = config.source(source);
    }
    if let Some(fx_dir) = args.get(2) {
        config = config.effects_dir(fx_dir);
    }
    let bind_addr: SocketAddr = args
        .get(3)
        .map(String::as_str)
        .unwrap_or("0.0.0.0:3000")
        .parse()?;

    println!("Broadcasting {}", config.source_path.display());
    println!("Effects from {}", config.effects_dir.display());
    println!("Listen at http://{}/stream", bind_addr);
    println!("Commands: start | stop | <effect name>");

    let engine = Arc::new(BroadcastEngine::new(config));
    let listener = TcpListener::bind(bind_addr).await?;

    tokio::spawn(operator_console(Arc::clone(&engine)));

    let accept_loop = async {
        loop {
            match listener.accept().await {
                Ok((socket, peer)) => {
                    let _ = socket.set_nodelay(true);
                    tokio::spawn(serve_listener(Arc::clone(&engine), socket, peer));
                }
                Err(e) => tracing::error!(error = %e, "Failed to accept connection"),
            }
        }
    };

    tokio::select! {
        _ = accept_loop => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
            engine.stop().await;
        }
    }

    Ok(())
}
