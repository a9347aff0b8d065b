//! Standalone web server binary
//!
//! Usage: cargo run -p blackjack-web --bin blackjack-web-server

use blackjack_web::{ServerConfig, WebServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    blackjack_web::init_logging();

    let args: Vec<String> = std::env::args().collect();
    let mut host = "127.0.0.1".to_string();
    let mut port = 8080u16;
    let mut token_secret: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--host" | "-h" => {
                if i + 1 < args.len() {
                    host = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --host requires a value");
                    std::process::exit(1);
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("Error: invalid port number");
                        std::process::exit(1);
                    });
                    i += 2;
                } else {
                    eprintln!("Error: --port requires a value");
                    std::process::exit(1);
                }
            }
            "--token-secret" | "-s" => {
                if i + 1 < args.len() {
                    token_secret = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    eprintln!("Error: --token-secret requires a value");
                    std::process::exit(1);
                }
            }
            "--help" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    let token_secret = token_secret
        .or_else(|| std::env::var("BLACKJACK_TOKEN_SECRET").ok())
        .unwrap_or_else(|| {
            eprintln!("Error: no token secret configured.");
            eprintln!("Pass --token-secret or set BLACKJACK_TOKEN_SECRET.");
            std::process::exit(1);
        });

    let config = ServerConfig::new(host, port, token_secret);

    tracing::info!("Starting Blackjack Web Server");
    tracing::info!("  Host: {}", config.host());
    tracing::info!("  Port: {}", config.port());

    let server = WebServer::new(config);
    let handle = server.start().await?;

    tracing::info!("Server running at http://{}", handle.address());
    println!("Server running at http://{}", handle.address());
    println!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down server");
    handle.shutdown().await?;
    tracing::info!("Server stopped cleanly");

    Ok(())
}

fn print_help() {
    println!("Blackjack Web Server");
    println!();
    println!("Usage: blackjack-web-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --host, -h <HOST>            Host to bind to (default: 127.0.0.1)");
    println!("  --port, -p <PORT>            Port to bind to (default: 8080)");
    println!("  --token-secret, -s <SECRET>  HMAC secret for session tokens");
    println!("                               (or BLACKJACK_TOKEN_SECRET env var)");
    println!("  --help                       Show this help message");
}
