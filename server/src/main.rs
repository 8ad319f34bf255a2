use clap::Parser;
use std::sync::Arc;
use tokio::time::Duration;

use server::lobby::Lobby;
use server::manager::GameManager;
use server::network::WsServer;
use server::question::{OpenTdbSource, DEFAULT_QUESTION_API};

/// Main-method of the application.
/// Parses command-line arguments, then starts the WebSocket listener and the
/// game manager loop.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "9999")]
        port: u16,
        /// Players required to start a game
        #[clap(short = 'n', long, default_value = "2")]
        players_per_game: usize,
        /// Seconds players get to answer each question
        #[clap(short, long, default_value = "10")]
        round_duration: u64,
        /// Question API endpoint (opentdb.com-compatible)
        #[clap(long, default_value = DEFAULT_QUESTION_API)]
        question_api: String,
    }

    env_logger::init();
    let args = Args::parse();

    let lobby = Arc::new(Lobby::new(args.players_per_game));
    let source = Arc::new(OpenTdbSource::new(args.question_api)?);
    let manager = Arc::new(GameManager::new(
        lobby,
        source,
        Duration::from_secs(args.round_duration),
    ));

    let address = format!("{}:{}", args.host, args.port);
    let server = WsServer::bind(&address).await?;

    // Spawn the connection acceptor
    let network_handle = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            if let Err(e) = server.run(manager).await {
                eprintln!("WebSocket server failed: {}", e);
            }
        })
    };

    // Spawn the batch-to-session loop
    let manager_handle = tokio::spawn(async move { manager.run().await });

    // Handle shutdown gracefully
    tokio::select! {
        result = network_handle => {
            if let Err(e) = result {
                eprintln!("Network task panicked: {}", e);
            }
        }
        result = manager_handle => {
            if let Err(e) = result {
                eprintln!("Manager task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
