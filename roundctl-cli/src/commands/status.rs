use tracing::info;

use roundctl_core::round::store::load_round;

use crate::config::Config;
use crate::storage::SqliteMeta;

/// Show the persisted round counter and the configured backend.
pub async fn run_status(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Round Control Status");
    println!("====================");
    println!("  API:        {}", config.api_url);
    println!(
        "  Auth token: {}",
        if config.api_token.is_some() { "set" } else { "none" }
    );
    println!("  Tick:       {} ms", config.tick_interval.as_millis());
    match config.resync_interval {
        Some(period) => println!("  Re-sync:    every {}s", period.as_secs()),
        None => println!("  Re-sync:    off"),
    }

    if !config.state_db.exists() {
        println!("  Round:      1 (no saved state at {})", config.state_db.display());
        return Ok(());
    }

    let storage = SqliteMeta::open(&config.state_db)?;
    let round = load_round(&storage).await?;
    println!("  Round:      {round}");
    println!("  State DB:   {}", config.state_db.display());

    info!("Status displayed");
    Ok(())
}
