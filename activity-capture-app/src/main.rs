mod cli;
#[cfg_attr(not(feature = "devices"), allow(dead_code))]
mod delegate;
mod handoff;
mod recorder;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use activity_capture_core::analysis::summary;
use activity_capture_core::{AnalysisRequest, CaptureConfiguration, CaptureError, SessionOutcome, VideoAnalyzer};

use cli::{Cli, Command};

const DEFAULT_LOG: &str = "activity_log.csv";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().into_command() {
        Command::Analyze { log } => analyze(&log.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG))),
        Command::Record { config } => record(config.as_deref()),
    }
}

fn record(config_path: Option<&Path>) -> ExitCode {
    let config = match config_path {
        Some(path) => CaptureConfiguration::load(path),
        None => Ok(CaptureConfiguration::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst)) {
        error!("Failed to install Ctrl+C handler: {}", e);
        return ExitCode::FAILURE;
    }
    info!("Recording on activity changes, press Ctrl+C to stop");

    match recorder::record(config, stop) {
        Ok(outcome) => {
            match &outcome {
                SessionOutcome::Saved(result) => println!("{}", result.file_path.display()),
                SessionOutcome::NothingToSave => info!("No frames captured, nothing saved"),
            }
            // TODO: wire an HTTP client for the video-understanding service here.
            let analyzer: Option<&dyn VideoAnalyzer> = None;
            if let Some(report) = handoff::hand_off(&outcome, analyzer, &AnalysisRequest::default()) {
                println!("{}", report);
            }
            ExitCode::SUCCESS
        }
        Err(e @ CaptureError::EncodeFailure(_)) => {
            // raw artifacts stay on disk for manual recovery
            error!("{}", e);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn analyze(log: &Path) -> ExitCode {
    match summary::summarize(log) {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
