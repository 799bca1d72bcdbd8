//! drivemon - live driver-behavior monitor
//!
//! Reads commands from stdin while the capture loop runs:
//! `start`, `stop`, `report`, `events`, `exit`. Any input line counts as a
//! user gesture and unlocks audible alarms. Ctrl-C stops capture and exits.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::sync::mpsc::{self, Sender};

use driver_monitor::monitor::{Command, Monitor, MonitorObserver};
use driver_monitor::ui::{StatusBoard, Ui, UiMode};
use driver_monitor::MonitorConfig;

const HELP: &str = "commands: start | stop | report | events | exit | help";

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// How to draw the status display.
    #[arg(long, env = "DRIVEMON_UI", value_enum, default_value_t = UiMode::Auto)]
    ui: UiMode,
    /// Start capture immediately instead of waiting for `start`.
    #[arg(long)]
    autostart: bool,
    /// Write an incident report when the monitor exits.
    #[arg(long)]
    report_on_exit: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = Ui::detect(args.ui);

    let config = {
        let _step = ui.startup("Load configuration");
        MonitorConfig::load()?
    };
    let mut monitor = {
        let _step = ui.startup("Prepare camera and classifier");
        Monitor::from_config(&config)?
    };
    log::info!(
        "drivemon {} classifier={} camera={} tick={}ms",
        env!("CARGO_PKG_VERSION"),
        config.classifier.url,
        config.camera.source,
        config.camera.tick.as_millis()
    );

    let (tx, rx) = mpsc::channel();
    let signal_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = signal_tx.send(Command::Quit);
    })
    .context("error setting Ctrl-C handler")?;

    let mut board = StatusBoard::new(&ui);
    if args.autostart {
        // Not a gesture: alarms stay muted until the user types something.
        monitor.start(&mut board);
    }
    spawn_stdin_reader(tx);
    println!("{HELP}");
    monitor.run(rx, &mut board);

    if args.report_on_exit {
        match monitor.export_report() {
            Ok(path) => board.on_report(&path),
            Err(err) => board.on_report_error(&err),
        }
    }
    Ok(())
}

fn spawn_stdin_reader(tx: Sender<Command>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let input = line.trim();
            let command = match input {
                "" => Command::Interaction,
                "help" | "?" => {
                    println!("{HELP}");
                    Command::Interaction
                }
                other => Command::parse(other).unwrap_or_else(|| {
                    println!("unknown command {other:?}; {HELP}");
                    Command::Interaction
                }),
            };
            let leaving = matches!(command, Command::Exit | Command::Quit);
            if tx.send(command).is_err() || leaving {
                break;
            }
        }
        log::debug!("stdin closed; waiting for Ctrl-C or exit");
    });
}
