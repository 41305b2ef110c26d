use tracing::info;

use roundctl_core::clock_sync::ClockOffset;
use roundctl_core::constants::{ROUND_SECONDS, SUBMIT_WINDOW_START};
use roundctl_core::gate::can_submit;
use roundctl_core::traits::clock::Clock;
use roundctl_core::traits::transport::GameTransport;

use crate::commands::connect;
use crate::config::Config;
use crate::platform::NativeClock;

/// Fetch the server time once and show where the current round stands.
pub async fn run_time(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let transport = connect(config)?;
    let clock = NativeClock::new();

    let server_millis = transport.fetch_server_time().await?;
    let local_millis = clock.now_millis()?;
    let offset = ClockOffset::from_samples(server_millis, local_millis);
    let second = offset.server_second(local_millis);

    println!("Server:        {}", transport.base_url());
    println!("Clock offset:  {:+} ms", offset.millis());
    println!("Server second: {second:02}");
    println!("Round ends in: {}s", ROUND_SECONDS - second);
    if can_submit(second) {
        println!("Submission window: OPEN");
    } else {
        println!(
            "Submission window: closed (opens in {}s)",
            SUBMIT_WINDOW_START - second
        );
    }

    info!(offset_ms = offset.millis(), second, "server time displayed");
    Ok(())
}
