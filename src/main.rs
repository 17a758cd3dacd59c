// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "obstacle-feedback")]
#[command(about = "Haptic and spoken obstacle warnings from depth frames")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/obstacle-feedback/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Haptic output
    #[arg(long, value_enum, default_value_t = HapticsBackend::Log, global = true)]
    haptics: HapticsBackend,

    /// Voice output
    #[arg(long, value_enum, default_value_t = VoiceBackend::Log, global = true)]
    voice: VoiceBackend,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HapticsBackend {
    /// Kernel vibrator under /sys/class/leds
    Sysfs,
    /// Write haptic events to the log
    Log,
    /// No haptic output
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VoiceBackend {
    /// Speak through spd-say
    Speech,
    /// Write phrases to the log
    Log,
    /// No spoken output
    Off,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session over a sensor recording
    Replay {
        /// Recording file (JSON lines)
        path: PathBuf,

        /// Play back at recorded speed instead of as fast as possible
        #[arg(long)]
        realtime: bool,
    },

    /// Run a session over a simulated walk towards a wall
    Simulate {
        /// Starting distance in meters
        #[arg(long, default_value = "3.0")]
        start_m: f32,

        /// Walking speed in meters per second
        #[arg(long, default_value = "0.5")]
        speed: f32,

        /// Frames per second
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Scenario length in seconds
        #[arg(long, default_value = "8")]
        seconds: u64,

        /// Inject a sensor interruption at this many seconds
        #[arg(long)]
        interrupt_at: Option<f32>,

        /// Interruption length in seconds
        #[arg(long, default_value = "1.5")]
        interrupt_for: f32,

        /// Record the simulated input (default: ~/.local/share/obstacle-feedback/recording_TIMESTAMP.jsonl)
        #[arg(long, num_args = 0..=1)]
        record: Option<Option<PathBuf>>,

        /// Generate frames as fast as possible
        #[arg(long)]
        fast: bool,
    },

    /// Print the distance estimate of every frame in a recording
    Sample {
        /// Recording file (JSON lines)
        path: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Write the defaults to the config file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=obstacle_feedback=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let outputs = cli::Outputs {
        haptics: cli.haptics,
        voice: cli.voice,
    };
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Replay { path, realtime } => {
            cli::replay(config_path, outputs, &path, realtime)
        }
        Commands::Simulate {
            start_m,
            speed,
            fps,
            seconds,
            interrupt_at,
            interrupt_for,
            record,
            fast,
        } => cli::simulate(
            config_path,
            outputs,
            cli::SimulateOptions {
                start_m,
                speed,
                fps,
                seconds,
                interrupt_at,
                interrupt_for,
                record,
                fast,
            },
        ),
        Commands::Sample { path } => cli::sample(config_path, &path),
        Commands::Config { write } => cli::show_config(config_path, write),
    }
}
