use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use roundctl_core::gate::Mode;

use crate::commands::connect;
use crate::config::Config;
use crate::control::panel::{parse_operator_input, render};
use crate::control::{DriverSettings, OperatorCommand, RoundDriver};
use crate::platform::NativeClock;
use crate::storage::SqliteMeta;

/// Run the live Game Control panel until the operator quits.
///
/// 1. Opens the round counter store and connects to the backend
/// 2. Synchronises with the server clock (fails if the time endpoint does)
/// 3. Reads operator lines from stdin while the round timer ticks
/// 4. Prints a summary of the last commit on exit
pub async fn run_control(config: &Config, mode: Mode) -> Result<(), Box<dyn std::error::Error>> {
    let storage = SqliteMeta::open(&config.state_db)?;
    let transport = connect(config)?;
    let clock = NativeClock::new();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::channel(32);

    // Operator input.
    let stdin_tx = command_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_operator_input(&line) {
                Some(command) => {
                    if stdin_tx.send(command).await.is_err() {
                        break;
                    }
                }
                None => println!("Unknown input '{}'. Use 0-9, m, s or q.", line.trim()),
            }
        }
        debug!("stdin closed");
    });

    // Ctrl-C tears the loop down like `q`.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = command_tx.send(OperatorCommand::Quit).await;
        }
    });

    let renderer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if let Some(line) = render(&event) {
                println!("{line}");
            }
        }
    });

    println!("Synchronising with server clock at {}...", transport.base_url());
    println!("Controls: 0-9 select, m toggle auto/manual, s submit, q quit");

    let settings = DriverSettings {
        tick_interval: config.tick_interval,
        resync_interval: config.resync_interval,
    };
    let driver = RoundDriver::new(&clock, &transport, &storage, settings, event_tx);
    let result = driver.run(mode, command_rx).await;

    // Dropping the driver closes the event channel so the renderer drains and exits.
    drop(driver);
    let _ = renderer.await;

    let snapshot = result?;
    println!();
    println!("Round:          {}", snapshot.round);
    println!("Mode:           {}", snapshot.mode);
    println!("Last submission: {}", snapshot.status);
    if let Some(number) = snapshot.latest_winning_number {
        println!("Winning number: {number}");
    }
    if let Some(message) = &snapshot.last_error {
        println!("Last error:     {message}");
    }

    info!("Game control closed");
    Ok(())
}
