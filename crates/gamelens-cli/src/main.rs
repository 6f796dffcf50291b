use std::fs;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use gamelens_core::{PcapFileSource, Settings, SettingsError, Sniffer, format_table};

#[derive(Parser, Debug)]
#[command(name = "gamelens")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("GAMELENS_BUILD_COMMIT"), " ", env!("GAMELENS_BUILD_DATE"), ")"
))]
#[command(
    about = "Schema-driven dissector for captured game-protocol traffic.",
    long_about = None,
    after_help = "Examples:\n  gamelens pcap dissect capture.pcapng -s settings.yml\n  gamelens pcap dissect capture.pcap -s settings.yml --no-color\n  gamelens palette"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs (offline-first).
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
    /// Print the ANSI style/color grid used to pick palette entries.
    Palette,
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Dissect the game traffic of a capture file into annotated text.
    #[command(
        after_help = "Examples:\n  gamelens pcap dissect capture.pcapng -s settings.yml\n  gamelens pcap dissect capture.pcap --settings settings.yml --quiet"
    )]
    Dissect {
        /// Path to a .pcap or .pcapng file
        input: PathBuf,

        /// Settings file with the server identity and the game schema (YAML)
        #[arg(short = 's', long)]
        settings: PathBuf,

        /// Disable ANSI styling (automatic when stdout is not a terminal)
        #[arg(long)]
        no_color: bool,

        /// Suppress the closing summary line
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Pcap { command } => match command {
            PcapCommands::Dissect {
                input,
                settings,
                no_color,
                quiet,
            } => cmd_pcap_dissect(input, settings, no_color, quiet),
        },
        Commands::Palette => cmd_palette(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None)
    }
}

fn cmd_pcap_dissect(
    input: PathBuf,
    settings_path: PathBuf,
    no_color: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let settings = Settings::load(&settings_path).map_err(|err| {
        let hint = match err {
            SettingsError::Io { .. } => "check the settings file path",
            SettingsError::Parse { .. } => "check the settings YAML syntax",
            SettingsError::Empty { .. } => "the settings file has no content",
        };
        CliError::new(err.to_string(), Some(hint.to_string()))
    })?;

    let meta = fs::metadata(&input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }

    let mut source = PcapFileSource::open(&input)
        .with_context(|| format!("Failed to open capture: {}", input.display()))?;

    let stdout = std::io::stdout();
    let color = !no_color && stdout.is_terminal();
    let mut out = stdout.lock();
    let stats = Sniffer::new(settings)
        .with_color(color)
        .run(&mut source, &mut out)
        .context("capture dissection failed")?;

    if !quiet {
        eprintln!(
            "OK: {} packets read, {} game payloads dissected",
            stats.packets_total, stats.payloads_dissected
        );
    }
    Ok(())
}

fn cmd_palette() -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in format_table() {
        writeln!(out, "{line}").context("failed to write palette")?;
    }
    Ok(())
}
