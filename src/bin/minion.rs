use std::net::TcpStream;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mutmatrix::ProgramImage;
use mutmatrix::Verbosity;
use mutmatrix::minion::{MemoryWatchdog, run_minion};

/// Isolated mutation executor.
///
/// Spawned by the coordinator, never invoked by hand: connects to the
/// control port, receives its arguments over the protocol stream, applies
/// mutants to the shipped image, runs tests, and exits with the protocol
/// exit code.
#[derive(Debug, Parser)]
#[command(name = "mutmatrix-minion")]
struct Cli {
    /// Coordinator control port on 127.0.0.1.
    #[arg(long)]
    port: u16,
    /// Serialized program image to load.
    #[arg(long)]
    image: PathBuf,
    /// Memory limit in MiB; the watchdog trips at 90%.
    #[arg(long, default_value_t = 4096)]
    memory_limit_mb: u64,
    /// Logging verbosity: default, verbose, or silent.
    #[arg(long, default_value = "default")]
    verbosity: String,
}

fn init_tracing(verbosity: Verbosity) {
    let filter = match verbosity {
        Verbosity::Verbose => "debug",
        Verbosity::Default => "info",
        Verbosity::Silent => "error",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<i32> {
    let verbosity = Verbosity::parse(&cli.verbosity)
        .with_context(|| format!("unknown verbosity: {}", cli.verbosity))?;
    init_tracing(verbosity);

    let bytes = std::fs::read(&cli.image)
        .with_context(|| format!("cannot read image {}", cli.image.display()))?;
    let image = ProgramImage::from_bytes(&bytes).context("cannot decode image")?;

    let mut stream = TcpStream::connect(("127.0.0.1", cli.port))
        .with_context(|| format!("cannot reach coordinator on port {}", cli.port))?;

    let watchdog = MemoryWatchdog::start(cli.memory_limit_mb * 1024 * 1024);
    Ok(run_minion(&mut stream, &image, Some(&watchdog)).code())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(code.clamp(0, u8::MAX as i32) as u8),
        Err(err) => {
            eprintln!("mutmatrix-minion: {err:#}");
            ExitCode::from(mutmatrix::ExitKind::UnknownError.code() as u8)
        }
    }
}
