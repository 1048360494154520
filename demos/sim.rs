//! Demo harness for `vqueue`: feeds command lines from stdin (or a script
//! file) into a [`Scheduler`] wired to in-memory mock adapters and prints
//! the resulting dispatch trace. Exists to exercise the library standalone;
//! it is not the host's real CLI/command binding (spec.md §1).

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use vqueue::audio::{AudioError, AuFileReader, CaptureAdapter, PlayHandle, PlayerAdapter, RecordHandle};
use vqueue::clock::SystemClock;
use vqueue::config::{CaptureConfig, SchedulerConfig};
use vqueue::scheduler::{CompletionOutcome, Scheduler};

#[derive(Parser, Debug)]
#[command(name = "vqueue-sim", about = "Drives a Scheduler from a command script")]
struct Cli {
    /// Read commands from this file instead of stdin.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Config file for SchedulerConfig (audio path, capture defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report length, in milliseconds, used for every Play atom (a stand-in
    /// for real file metadata).
    #[arg(long, default_value_t = 2000)]
    play_length_ms: u64,
}

/// Reports a fixed length for every file, so the demo doesn't need real
/// audio assets on disk.
struct FixedLenReader(u64);

impl AuFileReader for FixedLenReader {
    fn open(&self, _path: &Path) -> Result<u64, AudioError> {
        Ok(self.0)
    }
}

/// Prints every start/release instead of touching real hardware.
struct LoggingPlayer {
    next_handle: u64,
}

impl PlayerAdapter for LoggingPlayer {
    fn start(
        &mut self,
        path: &Path,
        offset_ms: u64,
        module: Option<&str>,
        device: Option<&str>,
    ) -> Result<PlayHandle, AudioError> {
        self.next_handle += 1;
        println!(
            "play start  handle={} path={} offset_ms={offset_ms} module={module:?} device={device:?}",
            self.next_handle,
            path.display()
        );
        Ok(PlayHandle(self.next_handle))
    }

    fn release(&mut self, handle: PlayHandle) {
        println!("play release handle={}", handle.0);
    }
}

struct LoggingCapture {
    next_handle: u64,
}

impl CaptureAdapter for LoggingCapture {
    fn start(
        &mut self,
        params: &CaptureConfig,
        path: &Path,
        max_silence_ms: u64,
    ) -> Result<RecordHandle, AudioError> {
        self.next_handle += 1;
        println!(
            "record start handle={} path={} max_silence_ms={max_silence_ms} sample_rate_hz={}",
            self.next_handle,
            path.display(),
            params.sample_rate_hz
        );
        Ok(RecordHandle(self.next_handle))
    }

    fn release(&mut self, handle: RecordHandle) {
        println!("record release handle={}", handle.0);
    }
}

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SchedulerConfig::load(path).unwrap_or_else(|err| {
            log::warn!("could not load config from {}: {err}; using defaults", path.display());
            SchedulerConfig::default()
        }),
        None => SchedulerConfig::default(),
    };

    let mut scheduler = Scheduler::new(
        LoggingPlayer { next_handle: 0 },
        LoggingCapture { next_handle: 0 },
        SystemClock::new(),
        FixedLenReader(cli.play_length_ms),
        config,
    );

    let lines: Box<dyn Iterator<Item = io::Result<String>>> = match &cli.script {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            Box::new(io::BufReader::new(file).lines())
        }
        None => Box::new(io::stdin().lock().lines()),
    };

    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        run_command(&mut scheduler, line);
        io::stdout().flush()?;
    }

    Ok(())
}

fn run_command(
    scheduler: &mut Scheduler<LoggingPlayer, LoggingCapture, SystemClock, FixedLenReader>,
    line: &str,
) {
    let mut parts = line.splitn(2, char::is_whitespace);
    match parts.next() {
        Some("vqueue_enqueue") => {
            let rest = parts.next().unwrap_or_default();
            let id = scheduler.enqueue_command(rest);
            println!("enqueue -> id={id}");
        }
        Some("vqueue_stop") => {
            if let Some(id) = parts.next().and_then(|s| s.trim().parse().ok()) {
                scheduler.cancel(id);
                println!("stop {id}");
            }
        }
        Some("vqueue_cancel") => {
            if let Some(priority) = parts.next().and_then(|s| s.trim().parse().ok()) {
                let removed = scheduler.cancel_priority(priority);
                println!("cancel priority={priority} removed={removed}");
            }
        }
        Some("vqueue_complete") => {
            scheduler.on_complete(CompletionOutcome::Finished);
            println!("complete");
        }
        Some("vqueue_dtmf") => {
            if let Some(digit) = parts.next().and_then(|s| s.trim().chars().next()) {
                scheduler.on_incoming_dtmf_digit(digit);
                println!("dtmf {digit}");
            }
        }
        _ => eprintln!("unrecognized command: {line:?}"),
    }
}
