use clap::Parser;
use log::{error, info, warn};
use server::{HostSession, ServerConfig, SessionEvent};
use shared::input::{parse_command, InputCommand};
use shared::{GameConfig, MatchView};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};

/// Dedicated host: the local player steers from stdin while peers join over TCP.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "5555")]
    port: u16,

    /// Remote players to wait for before the match starts
    #[arg(short = 'm', long, default_value = "1")]
    max_peers: usize,

    /// Tick rate (updates per second)
    #[arg(short, long, default_value = "10")]
    tick_rate: u32,

    /// Board width in cells
    #[arg(long, default_value = "40")]
    width: i32,

    /// Board height in cells
    #[arg(long, default_value = "30")]
    height: i32,

    /// Cell size in pixels
    #[arg(long, default_value = "20")]
    grid_size: i32,

    /// Segments each snake starts with
    #[arg(long, default_value = "1")]
    initial_length: usize,

    /// Seed for reproducible food placement
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let game_config = GameConfig {
        grid_size: args.grid_size,
        board_width: args.width,
        board_height: args.height,
        tick_rate: args.tick_rate,
        initial_length: args.initial_length,
        rng_seed: args.seed,
    };
    game_config.validate()?;

    let bind_addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let server_config = ServerConfig {
        bind_addr,
        max_peers: args.max_peers,
        ..ServerConfig::default()
    };

    let mut session = HostSession::host(game_config.clone(), server_config)?;
    info!("Hosting on {}", bind_addr);
    info!("Controls: w/a/s/d then Enter to steer, r to reset, q to quit");

    let mut ticker = interval(game_config.tick_duration());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut waiting = true;
    let mut last_summary = String::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if waiting {
                    log_events(&session.accept_joins());
                    if session.is_full() {
                        info!("All {} players joined, starting match", session.peer_count() + 1);
                        session.reset();
                        waiting = false;
                    }
                    continue;
                }

                let events = session.tick();
                log_events(&events);
                if events.iter().any(|e| matches!(e, SessionEvent::PlayerLeft(_))) {
                    warn!("A player left, waiting for the roster to fill again");
                    waiting = true;
                }

                let summary = session.game().summary();
                if summary != last_summary {
                    println!("{}", summary);
                    last_summary = summary;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => match parse_command(&line) {
                        Some(InputCommand::Steer(direction)) => {
                            session.handle_local_input(direction)
                        }
                        Some(InputCommand::Reset) => session.reset(),
                        Some(InputCommand::Quit) => break,
                        Some(other) => warn!("{:?} is not available on a dedicated host", other),
                        None => warn!("Unrecognised command: {}", line.trim()),
                    },
                    Ok(None) => {
                        info!("stdin closed, local player keeps its current direction");
                        stdin_open = false;
                    }
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C");
                break;
            }
        }
    }

    session.close();
    info!("Server stopped");
    Ok(())
}

fn log_events(events: &[SessionEvent]) {
    for event in events {
        match event {
            SessionEvent::PlayerJoined(id) => info!("{} joined", id),
            SessionEvent::PlayerLeft(id) => info!("{} left", id),
            SessionEvent::GameOver => info!("Game over, press r to play again"),
        }
    }
}
