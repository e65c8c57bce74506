//! `cancel-lines` command line (feature `cli`).

use cancel_lines::config::{ConfigLoader, DemoConfig};
use cancel_lines::demo::{self, RaceReport};
use cancel_lines::observability::init_subscriber;
use clap::{ArgAction, Args, Parser, Subcommand};
use parking_lot::Mutex;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "cancel-lines",
    version,
    about = "Deadline-bounded and cancellable file reading demos"
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// File to read
    #[arg(long = "file", global = true)]
    file: Option<PathBuf>,

    /// Leading lines to discard
    #[arg(long = "skip", global = true)]
    skip: Option<usize>,

    /// TOML configuration file
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbosity: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Race a delay against a deadline, then print the file or the deadline error
    Deadline {
        /// Delay before reading, in milliseconds
        #[arg(long = "delay-ms")]
        delay_ms: Option<u64>,
        /// Deadline, in milliseconds
        #[arg(long = "deadline-ms")]
        deadline_ms: Option<u64>,
    },
    /// Read the file in the background and cancel it shortly after
    Cancel {
        /// Wait before cancelling, in milliseconds
        #[arg(long = "cancel-after-ms")]
        cancel_after_ms: Option<u64>,
        /// Let the read run without firing cancellation
        #[arg(long = "no-cancel", action = ArgAction::SetTrue)]
        no_cancel: bool,
    },
}

impl Cli {
    fn loader(&self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.common.config {
            loader = loader.file(path);
        }
        if let Some(file) = &self.common.file {
            loader = loader.override_value("file", file.to_string_lossy());
        }
        if let Some(skip) = self.common.skip {
            loader = loader.override_value("skip_lines", skip.to_string());
        }
        match &self.command {
            Command::Deadline {
                delay_ms,
                deadline_ms,
            } => {
                if let Some(ms) = delay_ms {
                    loader = loader.override_value("delay_ms", ms.to_string());
                }
                if let Some(ms) = deadline_ms {
                    loader = loader.override_value("deadline_ms", ms.to_string());
                }
            }
            Command::Cancel {
                cancel_after_ms, ..
            } => {
                if let Some(ms) = cancel_after_ms {
                    loader = loader.override_value("cancel_after_ms", ms.to_string());
                }
            }
        }
        loader
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match cli.loader().load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("cancel-lines: {err}");
            return ExitCode::from(2);
        }
    };
    init_subscriber(config.log_level.more_verbose(cli.common.verbosity));

    match run(&cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            eprintln!("cancel-lines: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Command, config: &DemoConfig) -> cancel_lines::Result<()> {
    match command {
        Command::Deadline { .. } => {
            let report = demo::deadline_race(config, &mut io::stdout().lock())?;
            if let RaceReport::ReadFailed(err) = &report {
                tracing::warn!(error = %err, "file could not be read");
            }
            Ok(())
        }
        Command::Cancel { no_cancel, .. } => {
            let no_cancel = *no_cancel;
            let sink = Arc::new(Mutex::new(io::stdout()));
            let report = demo::cancel_read(config, sink, move || !no_cancel)?;
            tracing::debug!(cancelled = report.cancelled, ok = report.outcome.is_ok(), "done");
            Ok(())
        }
    }
}
