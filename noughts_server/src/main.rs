// CLI entry point for the Noughts match coordinator.
//
// Starts a standalone server that two game clients connect to. The server
// owns the authoritative match state; clients mirror it from the broadcast
// outcome envelopes. See `server.rs` for the networking architecture and
// `coordinator.rs` for the action pipeline.
//
// Usage:
//   noughts-server [OPTIONS]
//     --port <PORT>     Listen port (default: 5000)
//     --random-first    Pick the opening player at random
//     --help, -h        Show this help

use noughts_server::server::{ServerConfig, start_server};

fn main() {
    let config = parse_args();

    let (_handle, addr) = match start_server(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to start server: {e}");
            std::process::exit(1);
        }
    };

    println!("Match coordinator listening on {addr}");
    println!("Press Ctrl+C to stop.");

    // The process exits on SIGINT/SIGTERM by default, tearing down the
    // listener and reader threads with it. A graceful-shutdown handler
    // (the `ctrlc` crate) can be added if embedding ever needs one.
    loop {
        std::thread::sleep(std::time::Duration::from_secs(1));
    }
}

/// Parse command-line arguments into a `ServerConfig`. Uses simple
/// `std::env::args()` matching — no clap dependency.
fn parse_args() -> ServerConfig {
    let mut config = ServerConfig::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                config.port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                });
            }
            "--random-first" => {
                config.random_first_player = true;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn print_usage() {
    println!("Usage: noughts-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --port <PORT>     Listen port (default: 5000)");
    println!("  --random-first    Pick the opening player at random");
    println!("  --help, -h        Show this help");
}
