use clap::Parser;
use client::App;
use log::{error, info, warn};
use server::ServerConfig;
use shared::input::parse_command;
use shared::GameConfig;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on when hosting
    #[arg(short, long, default_value = "5555")]
    port: u16,

    /// Remote players to wait for when hosting
    #[arg(short = 'm', long, default_value = "1")]
    max_peers: usize,

    /// Tick rate (updates per second)
    #[arg(short, long, default_value = "10")]
    tick_rate: u32,

    /// Board width in cells
    #[arg(long, default_value = "40")]
    width: i32,

    /// Board height in cells (no short flag to avoid conflict with --help)
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

    /// Command to run on start, e.g. `single`, `host` or `join 10.0.0.5:5555`
    command: Vec<String>,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            grid_size: self.grid_size,
            board_width: self.width,
            board_height: self.height,
            tick_rate: self.tick_rate,
            initial_length: self.initial_length,
            rng_seed: self.seed,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let game_config = args.game_config();
    game_config.validate()?;

    let server_config = ServerConfig {
        bind_addr: SocketAddr::from(([0, 0, 0, 0], args.port)),
        max_peers: args.max_peers,
        ..ServerConfig::default()
    };

    info!("Starting client...");
    info!("Commands: single, host, join <addr>, w/a/s/d to steer, r to reset, menu, quit");

    let mut app = App::new(game_config.clone(), server_config);
    if !args.command.is_empty() {
        let line = args.command.join(" ");
        match parse_command(&line) {
            Some(command) => app.handle_command(command),
            None => warn!("Unrecognised start command: {}", line),
        }
    }

    let mut ticker = interval(game_config.tick_duration());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last_screen = String::new();

    while !app.should_quit() {
        tokio::select! {
            _ = ticker.tick() => {
                app.on_tick();

                let screen = match (app.view(), app.status()) {
                    (Some(view), _) => view.summary(),
                    (None, Some(status)) => status.to_string(),
                    (None, None) => "Waiting for players...".to_string(),
                };
                if screen != last_screen {
                    println!("{}", screen);
                    last_screen = screen;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => match parse_command(&line) {
                        Some(command) => app.handle_command(command),
                        None => warn!("Unrecognised command: {}", line.trim()),
                    },
                    Ok(None) => {
                        info!("stdin closed");
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
                app.handle_command(shared::input::InputCommand::Quit);
            }
        }
    }

    info!("Client stopped");
    Ok(())
}
