pub mod cli;
pub mod console;

use anyhow::Context;
use clap::Parser;
use clap::error::ErrorKind;
use log::{Level, error, log};
use std::process::ExitCode;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;

use nmce::{Coordinator, ExitDirective, StopHandle};

use crate::cli::Args;
use crate::console::ConsoleFrontend;

// Quiet by default; RUST_LOG=debug shows the bus handshake.
const DEFAULT_LOG_FILTER: &str = "warn";

// Shutdown on a signal is reported even with the default filter.
const SIGNAL_LOG_LEVEL: Level = Level::Warn;

pub fn run() -> ExitCode {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER),
    )
    .try_init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Failed to parse options: {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(start(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Failed to initialize the UI, exiting...");
            ExitCode::FAILURE
        }
    }
}

async fn start(args: Args) -> anyhow::Result<()> {
    let request = args.to_request();
    let mut coordinator = Coordinator::connect(args.config()).await;

    // Check for an existing instance on the bus, and if there is one, send
    // the arguments to it and exit instead of opening a second editor.
    if coordinator.try_delegate_to_existing_instance(&request).await {
        coordinator.shutdown().await;
        return Ok(());
    }

    let mut frontend = ConsoleFrontend::new(coordinator.ui_events(), args.keep_above);
    let signals = watch_signals(coordinator.stop_handle()).context("install signal handlers")?;

    let directive = coordinator
        .become_active_instance(&request, &mut frontend)
        .await;
    if directive != ExitDirective::ExitNow {
        coordinator.run(&mut frontend, directive).await;
    }

    signals.abort();
    coordinator.shutdown().await;
    Ok(())
}

/// Stops the editor on SIGTERM or SIGINT.
fn watch_signals(stop: StopHandle) -> std::io::Result<JoinHandle<()>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        log!(SIGNAL_LOG_LEVEL, "Caught signal {name}, shutting down...");
        stop.stop();
    }))
}
