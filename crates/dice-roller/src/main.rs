use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use dice_roller::config::AppConfig;
use dice_roller::logging;

mod commands;

/// dice-roller: a shared dice, text field and rotating cube.
///
/// Runs participants of one shared session in-process and shows how their
/// views stay in step.
#[derive(Parser)]
#[command(name = "dice-roller", version, about, long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides the config.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Page address the session is created under, without a `#<id>`
    /// fragment. Overrides `session.base_url`.
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session with one originator and some joiners, animate it and
    /// print what every participant ends up showing.
    Demo {
        /// Number of joining participants.
        #[arg(long, default_value = "2")]
        joiners: usize,

        /// Frames to render; 0 renders until interrupted.
        #[arg(long, default_value = "120")]
        frames: u64,

        /// Roll the dice every N frames (0 disables rolling).
        #[arg(long, default_value = "30")]
        roll_every: u64,

        /// Text the originator types, one character per frame.
        #[arg(long, default_value = "hello from the originator")]
        text: String,
    },

    /// Print the six dice faces with their colors.
    Faces,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match AppConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        },
        None => AppConfig::default(),
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    let _logger = match logging::init(level) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Demo {
            joiners,
            frames,
            roll_every,
            text,
        } => {
            let options = commands::DemoOptions {
                joiners,
                frames: (frames > 0).then_some(frames),
                roll_every,
                text,
            };
            commands::demo(&config, cli.url.as_deref(), &options).await
        }
        Commands::Faces => commands::faces(),
    };

    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("error: {e}");
        process::exit(1);
    }
}
