//! metrognome - visual metronome
//!
//! Run with: cargo run -- --terminal

#[cfg(feature = "gui")]
mod gui;
mod tui;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use tracing_subscriber::EnvFilter;

use metrognome::{engine::Sound, Output, Session, SessionConfig};

#[derive(Parser, Debug)]
#[command(author, about = "A metronome with a gnome", disable_version_flag = true)]
struct Cli {
    /// Use the terminal UI instead of the desktop window
    #[arg(short, long)]
    terminal: bool,

    /// Tempo BPM to start with
    #[arg(long, default_value_t = 60)]
    tempo: i32,

    /// BPM step when going up or down in tempo
    #[arg(long, default_value_t = 10)]
    delta: i32,

    /// Beats per measure to start with
    #[arg(long, default_value_t = 4)]
    beats: i32,

    /// Starting sound (Woodblock, Maracas)
    #[arg(long, default_value = "Woodblock")]
    sound: Sound,

    /// Tick without making any sound
    #[arg(long)]
    silent: bool,

    /// Display version information and exit
    #[arg(short = 'v', long)]
    version: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    if cli.version {
        print_version();
        return Ok(());
    }

    let terminal = cli.terminal || cfg!(not(feature = "gui"));
    init_tracing(terminal);

    let config = SessionConfig::new()
        .tempo(cli.tempo)
        .delta(cli.delta)
        .beats(cli.beats)
        .sound(cli.sound);

    let (session, ticks) = Session::connect(&config, output_for(cli.silent))
        .wrap_err("failed to set up the metronome")?;

    #[cfg(feature = "gui")]
    if !terminal {
        return gui::run(session, ticks);
    }

    tui::run(session, ticks)
}

#[cfg(feature = "audio")]
fn output_for(silent: bool) -> Output {
    if silent {
        Output::Silent
    } else {
        Output::Audio
    }
}

#[cfg(not(feature = "audio"))]
fn output_for(_silent: bool) -> Output {
    Output::Silent
}

/// Logs go to stderr. The terminal UI owns the screen, so it stays quiet
/// unless RUST_LOG asks otherwise (redirect stderr to a file to read them).
fn init_tracing(terminal: bool) {
    let default = if terminal { "off" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_version() {
    println!("MetroGnome version: v{}", env!("CARGO_PKG_VERSION"));
    println!("    Terminal UI: ratatui");
    if cfg!(feature = "gui") {
        println!("     Desktop UI: eframe");
    }
    if cfg!(feature = "audio") {
        println!("          Audio: cpal");
    }
}
